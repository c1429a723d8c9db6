use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use crate::error::Error;
use crate::model::{Outline, OutlineBlock, OutlineMeta, OutlineSection};

pub(super) const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

pub(super) fn read_zip_text<R: Read + Seek>(
    zip: &mut zip::ZipArchive<R>,
    name: &str,
) -> Option<String> {
    let mut file = zip.by_name(name).ok()?;
    let mut content = String::new();
    file.read_to_string(&mut content).ok()?;
    Some(content)
}

pub(super) fn wml<'a>(node: roxmltree::Node<'a, 'a>, name: &str) -> Option<roxmltree::Node<'a, 'a>> {
    node.children()
        .find(|n| n.tag_name().name() == name && n.tag_name().namespace() == Some(WML_NS))
}

pub(super) fn wml_attr<'a>(node: roxmltree::Node<'a, 'a>, child: &str) -> Option<&'a str> {
    wml(node, child).and_then(|n| n.attribute((WML_NS, "val")))
}

/// Parse word/styles.xml into a styleId → display name map.
/// Display names are what Word shows ("Heading 1", "List Bullet");
/// ids are the compact aliases ("Heading1", "ListBullet") used by w:pStyle.
fn parse_style_names(xml_content: &str) -> HashMap<String, String> {
    let mut names = HashMap::new();
    let Ok(xml) = roxmltree::Document::parse(xml_content) else {
        return names;
    };
    for style in xml
        .root_element()
        .children()
        .filter(|n| n.tag_name().name() == "style")
    {
        if let (Some(id), Some(name)) = (style.attribute((WML_NS, "styleId")), wml_attr(style, "name"))
        {
            names.insert(id.to_string(), name.to_string());
        }
    }
    names
}

/// Heading level from a style name like "Heading 1" or id like "Heading3".
fn heading_level(style_name: &str) -> Option<u8> {
    let rest = style_name.strip_prefix("Heading").or_else(|| style_name.strip_prefix("heading"))?;
    let digits: String = rest.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Some(1);
    }
    digits.parse().ok()
}

fn is_list_style(style_name: &str) -> bool {
    style_name.contains("List Bullet") || style_name.starts_with("List")
}

/// Collect the visible text of a paragraph (all w:t descendants, in order).
fn paragraph_text(para: roxmltree::Node) -> String {
    let mut text = String::new();
    for node in para.descendants() {
        if node.tag_name().name() == "t" && node.tag_name().namespace() == Some(WML_NS) {
            if let Some(t) = node.text() {
                text.push_str(t);
            }
        }
    }
    text
}

pub fn parse(path: &Path) -> Result<Outline, Error> {
    if !path.exists() {
        return Err(Error::NotFound(path.to_path_buf()));
    }
    let file = std::fs::File::open(path)?;
    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    parse_archive(zip::ZipArchive::new(file)?, source)
}

pub fn parse_bytes(input: &[u8]) -> Result<Outline, Error> {
    parse_archive(
        zip::ZipArchive::new(Cursor::new(input))?,
        String::from("uploaded_file"),
    )
}

/// Scan the document paragraph by paragraph, branching on paragraph style:
/// headings open a new section, list paragraphs merge into the trailing
/// list block, everything else is a plain paragraph block.
fn parse_archive<R: Read + Seek>(
    mut zip: zip::ZipArchive<R>,
    source: String,
) -> Result<Outline, Error> {
    let style_names = read_zip_text(&mut zip, "word/styles.xml")
        .map(|xml| parse_style_names(&xml))
        .unwrap_or_default();

    let document_xml = read_zip_text(&mut zip, "word/document.xml")
        .ok_or_else(|| Error::MissingPart(String::from("word/document.xml")))?;
    let xml = roxmltree::Document::parse(&document_xml)?;

    let body = xml
        .root_element()
        .children()
        .find(|n| n.tag_name().name() == "body" && n.tag_name().namespace() == Some(WML_NS))
        .ok_or_else(|| Error::MissingPart(String::from("w:body")))?;

    let mut outline = Outline {
        meta: OutlineMeta { source },
        sections: Vec::new(),
    };

    // Content before the first heading lands in a synthetic preamble
    // section, dropped at the end if nothing accumulated.
    outline.sections.push(OutlineSection {
        level: 0,
        title: String::from("Preamble"),
        blocks: Vec::new(),
    });

    for para in body
        .children()
        .filter(|n| n.tag_name().name() == "p" && n.tag_name().namespace() == Some(WML_NS))
    {
        let text = paragraph_text(para);
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        let style_id = wml(para, "pPr")
            .and_then(|ppr| wml_attr(ppr, "pStyle"))
            .unwrap_or("Normal");
        let style_name = style_names
            .get(style_id)
            .map(String::as_str)
            .unwrap_or(style_id);

        if let Some(level) = heading_level(style_name) {
            outline.sections.push(OutlineSection {
                level,
                title: text.to_string(),
                blocks: Vec::new(),
            });
            continue;
        }

        let current = outline.sections.last_mut().unwrap();
        if is_list_style(style_name) {
            if let Some(OutlineBlock::List { items }) = current.blocks.last_mut() {
                items.push(text.to_string());
            } else {
                current.blocks.push(OutlineBlock::List {
                    items: vec![text.to_string()],
                });
            }
        } else {
            current.blocks.push(OutlineBlock::Paragraph {
                text: text.to_string(),
            });
        }
    }

    if outline.sections.len() > 1 && outline.sections[0].blocks.is_empty() {
        outline.sections.remove(0);
    }

    log::debug!(
        "Parsed {} with {} sections",
        outline.meta.source,
        outline.sections.len()
    );
    Ok(outline)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_levels() {
        assert_eq!(heading_level("Heading 1"), Some(1));
        assert_eq!(heading_level("Heading3"), Some(3));
        assert_eq!(heading_level("Heading"), Some(1));
        assert_eq!(heading_level("Normal"), None);
        assert_eq!(heading_level("List Bullet"), None);
    }

    #[test]
    fn list_styles() {
        assert!(is_list_style("List Bullet"));
        assert!(is_list_style("List Bullet 2"));
        assert!(is_list_style("ListParagraph"));
        assert!(!is_list_style("Normal"));
    }
}
