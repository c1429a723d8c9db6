use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("xml error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("file not found: {0}")]
    NotFound(PathBuf),

    #[error("missing package part: {0}")]
    MissingPart(String),

    #[error("invalid template: {0}")]
    BadTemplate(String),

    #[error("llm request failed: {0}")]
    Llm(String),
}
