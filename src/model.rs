use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Structured outline extracted from a Word document.
///
/// This is the JSON intermediate between the docx scanner and the
/// Markdown serializer: a flat list of sections in document order,
/// each carrying its heading level and the blocks beneath it.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Outline {
    pub meta: OutlineMeta,
    pub sections: Vec<OutlineSection>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OutlineMeta {
    pub source: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutlineSection {
    pub level: u8,
    pub title: String,
    pub blocks: Vec<OutlineBlock>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutlineBlock {
    Paragraph { text: String },
    List { items: Vec<String> },
}

impl Outline {
    pub fn save_json(&self, path: &Path) -> Result<(), Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("Outline saved to {}", path.display());
        Ok(())
    }
}

/// Everything the deck generator needs: cover title, cover metadata,
/// and one `SlideData` per chapter.
#[derive(Clone, Debug, Default)]
pub struct PresentationData {
    pub cover_title: String,
    /// Cover key-value metadata in input order (project name, presenter, ...).
    pub meta_info: Vec<(String, String)>,
    pub slides: Vec<SlideData>,
}

impl PresentationData {
    /// Look up a cover metadata value by any of the given key labels.
    pub fn meta(&self, keys: &[&str]) -> Option<&str> {
        self.meta_info
            .iter()
            .find(|(k, _)| keys.iter().any(|want| k == want))
            .map(|(_, v)| v.as_str())
    }
}

/// One chapter of the deck: a page title, an optional description
/// paragraph, and the content blocks beneath it.
#[derive(Clone, Debug, Default)]
pub struct SlideData {
    pub title: String,
    pub description: String,
    pub blocks: Vec<ContentBlock>,
    /// 1-based chapter number; drives the `page{N}_...` shape names.
    pub chapter: usize,
}

/// A content block: subtitle, bullet lines, and an optional keyword tag.
#[derive(Clone, Debug, Default)]
pub struct ContentBlock {
    pub subtitle: String,
    pub bullets: Vec<String>,
    pub keyword: String,
}
