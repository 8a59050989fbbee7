use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StampError {
    #[error("template not found: {0}")]
    TemplateNotFound(PathBuf),

    #[error("{0} must not be empty")]
    EmptyText(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid docx archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("invalid document XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("invalid stamp state: {0}")]
    State(#[from] serde_json::Error),
}
