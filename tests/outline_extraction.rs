mod common;

use slidesmith::markdown::{MarkdownParser, to_markdown};

#[test]
fn extracts_sections_from_styles() {
    let outline = slidesmith::extract_outline_bytes(&common::sample_docx()).unwrap();

    let titles: Vec<(&str, u8)> = outline
        .sections
        .iter()
        .map(|s| (s.title.as_str(), s.level))
        .collect();
    assert_eq!(
        titles,
        [
            ("Annual Project Review", 1),
            ("Progress", 1),
            ("Milestones", 2),
            ("Risks", 1),
            ("Supply", 2),
        ]
    );

    // Cover key-value lines stay paragraphs under the title section.
    assert_eq!(outline.sections[0].blocks.len(), 2);

    // Consecutive list paragraphs merge into one list block.
    let milestones = &outline.sections[2];
    match &milestones.blocks[0] {
        slidesmith::model::OutlineBlock::List { items } => {
            assert_eq!(items, &["SMT assembly done", "Driver stack booting"]);
        }
        other => panic!("expected a list block, got {other:?}"),
    }
}

#[test]
fn outline_json_uses_tagged_blocks() {
    let dir = tempfile::tempdir().unwrap();
    let json_path = dir.path().join("build/outline.json");

    let outline = slidesmith::extract_outline_bytes(&common::sample_docx()).unwrap();
    outline.save_json(&json_path).unwrap();

    let raw = std::fs::read_to_string(&json_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["sections"][0]["blocks"][0]["type"], "paragraph");
    assert_eq!(value["sections"][2]["blocks"][0]["type"], "list");

    // And it deserializes back.
    let roundtripped: slidesmith::Outline = serde_json::from_str(&raw).unwrap();
    assert_eq!(roundtripped.sections.len(), outline.sections.len());
}

#[test]
fn markdown_serialization_follows_the_slide_convention() {
    let outline = slidesmith::extract_outline_bytes(&common::sample_docx()).unwrap();
    let md = to_markdown(&outline);

    assert!(md.starts_with("# Annual Project Review"));
    assert!(md.contains("Project: Orion"));
    assert!(md.contains("## Progress"));
    assert!(md.contains("### Milestones"));
    assert!(md.contains("- SMT assembly done"));
    // The title section is the cover, not a chapter.
    assert!(!md.contains("## Annual Project Review"));
}

#[test]
fn full_word_to_presentation_path() {
    let outline = slidesmith::extract_outline_bytes(&common::sample_docx()).unwrap();
    let data = MarkdownParser::new().parse_str(&to_markdown(&outline));

    assert_eq!(data.cover_title, "Annual Project Review");
    assert_eq!(data.meta(&["Project"]), Some("Orion"));
    assert_eq!(data.meta(&["Presenter", "汇报人"]), Some("Wu Lei"));

    assert_eq!(data.slides.len(), 2);
    assert_eq!(data.slides[0].title, "Progress");
    assert_eq!(data.slides[0].chapter, 1);
    assert_eq!(
        data.slides[0].description,
        "Hardware bring-up is on track."
    );
    assert_eq!(data.slides[0].blocks[0].subtitle, "Milestones");
    assert_eq!(data.slides[1].blocks[0].bullets, ["MCU lead time is 12 weeks"]);
}
