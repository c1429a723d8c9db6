//! OpenAI-compatible chat client used to restructure an outline into
//! slide-ready Markdown. The model is treated as an opaque text-to-text
//! function; everything slide-specific lives in the prompts.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::{Outline, OutlineBlock};

pub const DEFAULT_API_URL: &str =
    "https://dashscope.aliyuncs.com/compatible-mode/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "qwen-plus";

const RESTRUCTURE_PROMPT: &str = "\
You are a presentation content planner. Rewrite the provided document text \
as a slide outline in Markdown, using exactly this structure: a single \
'# Title' line, then 'Key: Value' cover lines (project, presenter, date and \
similar, when present in the source), then up to 8 chapters each starting \
with '## Chapter Title'. Inside a chapter use an optional one-line \
description, '### Sub-point' headings, '- bullet' lines, and at most one \
'**Keywords: ...**' line per sub-point. Be drastically concise: slides are a \
teleprompter, not a transcript. Keep 30-50% of the source length, prefer \
phrases over sentences, and drop connective filler. Output only the Markdown.";

const CONDENSE_PROMPT: &str = "\
You are a presentation content planner. Rewrite the user's text as terse \
slide bullet points: keep only the core facts, use phrases instead of full \
sentences, and cut the length to 30-50% of the original. Output only the \
rewritten text with no preamble.";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

pub struct LlmClient {
    api_key: String,
    api_url: String,
    model: String,
    http: reqwest::blocking::Client,
}

impl LlmClient {
    /// Build a client from `SLIDESMITH_API_KEY` / `SLIDESMITH_API_URL` /
    /// `SLIDESMITH_MODEL`. Only the key is required.
    pub fn from_env() -> Result<Self, Error> {
        let api_key = std::env::var("SLIDESMITH_API_KEY")
            .map_err(|_| Error::Llm(String::from("SLIDESMITH_API_KEY is not set")))?;
        let api_url =
            std::env::var("SLIDESMITH_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let model =
            std::env::var("SLIDESMITH_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Ok(Self::new(api_key, api_url, model))
    }

    pub fn new(api_key: String, api_url: String, model: String) -> Self {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_default();
        Self {
            api_key,
            api_url,
            model,
            http,
        }
    }

    /// Restructure a whole outline into slide Markdown.
    pub fn restructure_outline(&self, outline: &Outline) -> Result<String, Error> {
        log::info!("Restructuring outline with {}", self.model);
        let markdown = self.chat(&[
            Message {
                role: "system",
                content: RESTRUCTURE_PROMPT.to_string(),
            },
            Message {
                role: "user",
                content: flatten_outline(outline),
            },
        ])?;
        log::info!("Restructuring completed ({} bytes)", markdown.len());
        Ok(markdown)
    }

    /// Condense one text block to bullet-sized phrases. Falls back to the
    /// input on failure so callers can treat it as best-effort.
    pub fn condense(&self, text: &str) -> String {
        let messages = [
            Message {
                role: "system",
                content: CONDENSE_PROMPT.to_string(),
            },
            Message {
                role: "user",
                content: text.to_string(),
            },
        ];
        match self.chat(&messages) {
            Ok(out) => out,
            Err(e) => {
                log::warn!("Condense request failed, keeping original text: {e}");
                text.to_string()
            }
        }
    }

    fn chat(&self, messages: &[Message]) -> Result<String, Error> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: 0.7,
        };
        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .map_err(|e| Error::Llm(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::Llm(e.to_string()))?;
        let parsed: ChatResponse = response.json().map_err(|e| Error::Llm(e.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Llm(String::from("response contained no choices")))
    }
}

/// Flatten the outline to tagged plain text so the model sees the source
/// structure without having to parse JSON.
pub fn flatten_outline(outline: &Outline) -> String {
    let mut buffer: Vec<String> = Vec::new();
    if !outline.meta.source.is_empty() {
        buffer.push(format!("[document source: {}]\n", outline.meta.source));
    }
    for section in &outline.sections {
        buffer.push(format!(
            "\n[section (level {}): {}]",
            section.level, section.title
        ));
        for block in &section.blocks {
            match block {
                OutlineBlock::Paragraph { text } => buffer.push(text.clone()),
                OutlineBlock::List { items } => {
                    for item in items {
                        buffer.push(format!("- {item}"));
                    }
                }
            }
        }
    }
    buffer.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OutlineMeta, OutlineSection};

    #[test]
    fn flatten_tags_sections_and_items() {
        let outline = Outline {
            meta: OutlineMeta {
                source: String::from("report.docx"),
            },
            sections: vec![OutlineSection {
                level: 1,
                title: String::from("Status"),
                blocks: vec![
                    OutlineBlock::Paragraph {
                        text: String::from("On schedule."),
                    },
                    OutlineBlock::List {
                        items: vec![String::from("CI green")],
                    },
                ],
            }],
        };
        let flat = flatten_outline(&outline);
        assert!(flat.contains("[document source: report.docx]"));
        assert!(flat.contains("[section (level 1): Status]"));
        assert!(flat.contains("On schedule."));
        assert!(flat.contains("- CI green"));
    }
}
