use std::path::Path;

use regex::Regex;

use crate::error::Error;
use crate::model::{ContentBlock, Outline, OutlineBlock, PresentationData, SlideData};

const DEFAULT_TITLE: &str = "Project Report";

/// Serialize an outline to the Markdown convention the deck generator
/// consumes: `#` cover title, cover `Key: Value` lines, `---` + `##` per
/// chapter, `###` sub-blocks, `-` bullets.
pub fn to_markdown(outline: &Outline) -> String {
    let mut lines: Vec<String> = Vec::new();

    let main_title = outline
        .sections
        .first()
        .filter(|s| s.level == 1)
        .map(|s| s.title.as_str())
        .unwrap_or(DEFAULT_TITLE);
    lines.push(format!("# {main_title}\n"));

    for (i, section) in outline.sections.iter().enumerate() {
        match section.level {
            // Preamble paragraphs are expected to be "Key: Value" cover lines.
            0 => {
                for block in &section.blocks {
                    if let OutlineBlock::Paragraph { text } = block {
                        lines.push(text.clone());
                    }
                }
                lines.push(String::new());
                continue;
            }
            1 => {
                // The first level-1 section doubles as the cover; its blocks
                // are emitted without a chapter heading.
                if i != 0 {
                    lines.push(String::from("\n---\n"));
                    lines.push(format!("## {}\n", section.title));
                }
            }
            2 => lines.push(format!("\n### {}\n", section.title)),
            deeper => {
                let prefix = "#".repeat(deeper as usize + 1);
                lines.push(format!("\n{prefix} {}\n", section.title));
            }
        }

        for block in &section.blocks {
            match block {
                OutlineBlock::Paragraph { text } => lines.push(format!("{text}\n")),
                OutlineBlock::List { items } => {
                    for item in items {
                        lines.push(format!("- {item}"));
                    }
                    lines.push(String::new());
                }
            }
        }
    }

    lines.push(String::from("\n---\n"));
    lines.join("\n")
}

/// Line-oriented Markdown parser producing `PresentationData`.
///
/// Only the conventions emitted by `to_markdown` (and hand-edited
/// variants of them) are recognized; anything else falls through to the
/// description / plain-line rules.
pub struct MarkdownParser {
    re_h1: Regex,
    re_h2: Regex,
    re_h3: Regex,
    re_bullet: Regex,
    re_key_value: Regex,
    re_keyword: Regex,
}

impl Default for MarkdownParser {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownParser {
    pub fn new() -> Self {
        Self {
            re_h1: Regex::new(r"^#\s+(.+)$").unwrap(),
            re_h2: Regex::new(r"^##\s+(.+)$").unwrap(),
            re_h3: Regex::new(r"^###\s+(.+)$").unwrap(),
            re_bullet: Regex::new(r"^-\s+(.+)$").unwrap(),
            re_key_value: Regex::new(r"^([^：:]+)[：:]\s*(.+)$").unwrap(),
            re_keyword: Regex::new(r"^\*\*\s*(?:[Kk]eywords?|关键词)\s*[：:]\s*(.+?)\s*\*\*$")
                .unwrap(),
        }
    }

    pub fn parse_file(&self, path: &Path) -> Result<PresentationData, Error> {
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Ok(self.parse_str(&content))
    }

    pub fn parse_str(&self, content: &str) -> PresentationData {
        let mut data = PresentationData::default();
        let mut in_cover = true;

        for raw in content.lines() {
            let line = raw.trim();
            if line.is_empty() || line == "---" || line.starts_with("<!--") {
                continue;
            }

            // Order matters: ### before ## before #.
            if let Some(m) = self.re_h3.captures(line) {
                let Some(slide) = data.slides.last_mut() else {
                    log::warn!("Sub-heading before any chapter heading: {line}");
                    continue;
                };
                slide.blocks.push(ContentBlock {
                    subtitle: m[1].trim().to_string(),
                    ..Default::default()
                });
                continue;
            }

            if let Some(m) = self.re_h2.captures(line) {
                in_cover = false;
                let chapter = data.slides.len() + 1;
                data.slides.push(SlideData {
                    title: m[1].trim().to_string(),
                    chapter,
                    ..Default::default()
                });
                continue;
            }

            if let Some(m) = self.re_h1.captures(line) {
                data.cover_title = m[1].trim().to_string();
                continue;
            }

            if let Some(m) = self.re_keyword.captures(line) {
                if let Some(block) = data.slides.last_mut().and_then(|s| s.blocks.last_mut()) {
                    block.keyword = m[1].to_string();
                }
                continue;
            }

            if let Some(m) = self.re_bullet.captures(line) {
                let content = m[1].trim().to_string();
                if let Some(slide) = data.slides.last_mut() {
                    if slide.blocks.is_empty() {
                        // Bullet straight under the chapter heading: open an
                        // anonymous block for it.
                        slide.blocks.push(ContentBlock::default());
                    }
                    slide.blocks.last_mut().unwrap().bullets.push(content);
                }
                continue;
            }

            if in_cover {
                if let Some(m) = self.re_key_value.captures(line) {
                    data.meta_info
                        .push((m[1].trim().to_string(), m[2].trim().to_string()));
                }
                continue;
            }

            // Plain text: slide description until the first block opens,
            // then an unbulleted line inside the current block.
            if let Some(slide) = data.slides.last_mut() {
                match slide.blocks.last_mut() {
                    None => {
                        if slide.description.is_empty() {
                            slide.description = line.to_string();
                        } else {
                            slide.description.push('\n');
                            slide.description.push_str(line);
                        }
                    }
                    Some(block) => block.bullets.push(line.to_string()),
                }
            }
        }

        data
    }
}
