#![allow(dead_code)]

use std::io::{Cursor, Read, Write};
use std::path::Path;

use slidesmith::{ContentBlock, PresentationData, SlideData};

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

fn docx_paragraph(style: &str, text: &str) -> String {
    format!(
        r#"<w:p><w:pPr><w:pStyle w:val="{style}"/></w:pPr><w:r><w:t>{text}</w:t></w:r></w:p>"#
    )
}

/// Build a small Word document in memory: a title section with cover
/// key-value lines, then two chapters with sub-sections and lists.
pub fn sample_docx() -> Vec<u8> {
    let body = [
        docx_paragraph("Heading1", "Annual Project Review"),
        docx_paragraph("Normal", "Project: Orion"),
        docx_paragraph("Normal", "Presenter: Wu Lei"),
        docx_paragraph("Heading1", "Progress"),
        docx_paragraph("Normal", "Hardware bring-up is on track."),
        docx_paragraph("Heading2", "Milestones"),
        docx_paragraph("ListBullet", "SMT assembly done"),
        docx_paragraph("ListBullet", "Driver stack booting"),
        docx_paragraph("Heading1", "Risks"),
        docx_paragraph("Heading2", "Supply"),
        docx_paragraph("ListBullet", "MCU lead time is 12 weeks"),
    ]
    .concat();

    let document = format!(
        r#"{XML_DECL}<w:document xmlns:w="{WML_NS}"><w:body>{body}<w:sectPr/></w:body></w:document>"#
    );

    let style = |id: &str, name: &str| {
        format!(
            r#"<w:style w:type="paragraph" w:styleId="{id}"><w:name w:val="{name}"/></w:style>"#
        )
    };
    let styles = format!(
        r#"{XML_DECL}<w:styles xmlns:w="{WML_NS}">{}{}{}{}</w:styles>"#,
        style("Normal", "Normal"),
        style("Heading1", "heading 1"),
        style("Heading2", "heading 2"),
        style("ListBullet", "List Bullet"),
    );

    let content_types = format!(
        concat!(
            "{decl}",
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
            r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
            r#"<Default Extension="xml" ContentType="application/xml"/>"#,
            r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
            r#"<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>"#,
            "</Types>"
        ),
        decl = XML_DECL
    );
    let rels = format!(
        concat!(
            "{decl}",
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
            "</Relationships>"
        ),
        decl = XML_DECL
    );

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for (name, content) in [
        ("[Content_Types].xml", content_types),
        ("_rels/.rels", rels),
        ("word/document.xml", document),
        ("word/styles.xml", styles),
    ] {
        writer.start_file(name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Three chapters exercising descriptions, multiple blocks, keywords
/// and unbulleted lines.
pub fn sample_presentation() -> PresentationData {
    PresentationData {
        cover_title: String::from("Annual Project Review"),
        meta_info: vec![
            (String::from("Project"), String::from("Orion")),
            (String::from("Presenter"), String::from("Wu Lei")),
            (String::from("Date"), String::from("2026-08-01")),
        ],
        slides: vec![
            SlideData {
                title: String::from("Progress"),
                description: String::from("Hardware bring-up is on track."),
                blocks: vec![
                    ContentBlock {
                        subtitle: String::from("Milestones"),
                        bullets: vec![
                            String::from("SMT assembly done"),
                            String::from("Driver stack booting"),
                        ],
                        keyword: String::from("bring-up"),
                    },
                    ContentBlock {
                        subtitle: String::from("Next"),
                        bullets: vec![String::from("Software integration")],
                        keyword: String::new(),
                    },
                ],
                chapter: 1,
            },
            SlideData {
                title: String::from("Risks"),
                description: String::from("Two supply risks are being tracked."),
                blocks: vec![ContentBlock {
                    subtitle: String::from("Supply"),
                    bullets: vec![String::from("MCU lead time is 12 weeks")],
                    keyword: String::from("sourcing"),
                }],
                chapter: 2,
            },
            SlideData {
                title: String::from("Plan"),
                description: String::new(),
                blocks: vec![ContentBlock {
                    subtitle: String::from("Q3"),
                    bullets: vec![String::from("Field trial in September")],
                    keyword: String::new(),
                }],
                chapter: 3,
            },
        ],
    }
}

fn load_parts(pptx: &Path) -> Vec<(String, Vec<u8>)> {
    let file = std::fs::File::open(pptx).unwrap();
    let mut zip = zip::ZipArchive::new(file).unwrap();
    let mut parts = Vec::new();
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).unwrap();
        let mut data = Vec::new();
        entry.read_to_end(&mut data).unwrap();
        parts.push((entry.name().to_string(), data));
    }
    parts
}

fn save_parts(pptx: &Path, parts: &[(String, Vec<u8>)]) {
    let mut writer = zip::ZipWriter::new(std::fs::File::create(pptx).unwrap());
    let options = zip::write::SimpleFileOptions::default();
    for (name, data) in parts {
        writer.start_file(name.as_str(), options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap();
}

/// Rename a shape inside one slide part of a template, in place.
pub fn rename_shape(pptx: &Path, part: &str, old: &str, new: &str) {
    let mut parts = load_parts(pptx);
    for (name, data) in &mut parts {
        if name == part {
            let text = String::from_utf8(std::mem::take(data)).unwrap();
            *data = text
                .replace(
                    &format!(r#"name="{old}""#),
                    &format!(r#"name="{new}""#),
                )
                .into_bytes();
        }
    }
    save_parts(pptx, &parts);
}

/// Append a chapter-cover slide (chapter_num + chapter_title boxes) to a
/// template, registering the part, relationship and sldId entry.
pub fn add_chapter_cover(pptx: &Path) {
    const PML_NS: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
    const DML_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
    const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

    let text_box = |id: u32, name: &str, text: &str, y: u32| {
        format!(
            concat!(
                r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"/>"#,
                r#"<p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>"#,
                r#"<p:spPr><a:xfrm><a:off x="914400" y="{y}"/><a:ext cx="7315200" cy="914400"/></a:xfrm>"#,
                r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr>"#,
                r#"<p:txBody><a:bodyPr/><a:lstStyle/>"#,
                r#"<a:p><a:r><a:rPr lang="en-US" sz="3600"/><a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp>"#
            ),
            id = id,
            name = name,
            y = y,
            text = text,
        )
    };
    let slide = format!(
        concat!(
            "{decl}",
            r#"<p:sld xmlns:p="{p}" xmlns:a="{a}" xmlns:r="{r}"><p:cSld><p:spTree>"#,
            r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>"#,
            "{num}{title}",
            r#"</p:spTree></p:cSld></p:sld>"#
        ),
        decl = XML_DECL,
        p = PML_NS,
        a = DML_NS,
        r = REL_NS,
        num = text_box(2, "chapter_num", "00", 1828800),
        title = text_box(3, "chapter_title", "Chapter Title", 2971800),
    );
    let rels = format!(
        concat!(
            "{decl}",
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>"#,
            "</Relationships>"
        ),
        decl = XML_DECL,
    );

    let mut parts = load_parts(pptx);
    for (name, data) in &mut parts {
        let text = String::from_utf8_lossy(data);
        let patched = match name.as_str() {
            "[Content_Types].xml" => text.replace(
                "</Types>",
                concat!(
                    r#"<Override PartName="/ppt/slides/slide5.xml" "#,
                    r#"ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/></Types>"#,
                ),
            ),
            "ppt/_rels/presentation.xml.rels" => text.replace(
                "</Relationships>",
                concat!(
                    r#"<Relationship Id="rId6" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" "#,
                    r#"Target="slides/slide5.xml"/></Relationships>"#,
                ),
            ),
            "ppt/presentation.xml" => text.replace(
                "</p:sldIdLst>",
                r#"<p:sldId id="260" r:id="rId6"/></p:sldIdLst>"#,
            ),
            _ => continue,
        };
        *data = patched.into_bytes();
    }
    parts.push(("ppt/slides/slide5.xml".to_string(), slide.into_bytes()));
    parts.push(("ppt/slides/_rels/slide5.xml.rels".to_string(), rels.into_bytes()));
    save_parts(pptx, &parts);
}

pub fn read_part(pptx: &Path, name: &str) -> String {
    let file = std::fs::File::open(pptx).unwrap();
    let mut zip = zip::ZipArchive::new(file).unwrap();
    let mut part = zip.by_name(name).unwrap();
    let mut content = String::new();
    part.read_to_string(&mut content).unwrap();
    content
}

pub fn has_part(pptx: &Path, name: &str) -> bool {
    let file = std::fs::File::open(pptx).unwrap();
    let mut zip = zip::ZipArchive::new(file).unwrap();
    zip.by_name(name).is_ok()
}

/// Slide part names in presentation order, resolved through sldIdLst
/// and the presentation relationships.
pub fn slides_in_order(pptx: &Path) -> Vec<String> {
    const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
    let rels_xml = read_part(pptx, "ppt/_rels/presentation.xml.rels");
    let rels_doc = roxmltree::Document::parse(&rels_xml).unwrap();
    let rels: Vec<(String, String)> = rels_doc
        .descendants()
        .filter(|n| n.tag_name().name() == "Relationship")
        .map(|n| {
            (
                n.attribute("Id").unwrap().to_string(),
                n.attribute("Target").unwrap().to_string(),
            )
        })
        .collect();

    let pres = read_part(pptx, "ppt/presentation.xml");
    let doc = roxmltree::Document::parse(&pres).unwrap();
    doc.descendants()
        .filter(|n| n.tag_name().name() == "sldId")
        .map(|n| {
            let rid = n.attribute((REL_NS, "id")).unwrap();
            let target = &rels.iter().find(|(id, _)| id.as_str() == rid).unwrap().1;
            format!("ppt/{target}")
        })
        .collect()
}

pub fn shape_names(slide_xml: &str) -> Vec<String> {
    let doc = roxmltree::Document::parse(slide_xml).unwrap();
    doc.descendants()
        .filter(|n| n.tag_name().name() == "cNvPr")
        .filter_map(|n| n.attribute("name"))
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn shape_texts(slide_xml: &str) -> Vec<String> {
    let doc = roxmltree::Document::parse(slide_xml).unwrap();
    doc.descendants()
        .filter(|n| n.tag_name().name() == "t")
        .filter_map(|n| n.text())
        .map(str::to_string)
        .collect()
}

/// Text of the shape with the given name, paragraphs joined by \n.
pub fn text_of(slide_xml: &str, shape_name: &str) -> Option<String> {
    const PML_NS: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
    let doc = roxmltree::Document::parse(slide_xml).unwrap();
    let cnvpr = doc
        .descendants()
        .find(|n| n.tag_name().name() == "cNvPr" && n.attribute("name") == Some(shape_name))?;
    let shape = cnvpr.ancestors().find(|n| {
        n.tag_name().namespace() == Some(PML_NS)
            && matches!(n.tag_name().name(), "sp" | "pic" | "graphicFrame")
    })?;
    let texts: Vec<&str> = shape
        .descendants()
        .filter(|n| n.tag_name().name() == "t")
        .filter_map(|n| n.text())
        .collect();
    Some(texts.join("\n"))
}
