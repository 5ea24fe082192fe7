//! Error types for document parsing.
//!
//! Parsers skip malformed rows and blocks instead of failing. A
//! [`DocumentError`] is only returned when nothing meaningful can be extracted
//! from a document: it announces its own failure, it is not well-formed, or it
//! lacks the anchor every record hangs off.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    /// The document carries an explicit error banner from the upstream system.
    #[error("Upstream reported an error: {banner}")]
    Upstream { banner: String },

    /// The audit document is not well-formed XML.
    #[error("Malformed audit document: {0}")]
    Xml(#[from] quick_xml::Error),

    /// A structural anchor required to interpret the document is absent.
    #[error("Document is missing the expected {element}")]
    MissingElement { element: &'static str },

    /// A saved document could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A cached course snapshot could not be decoded.
    #[error("Failed to decode {path}: {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Settings are missing or invalid.
    #[error("Invalid configuration: {message}")]
    Config { message: String },
}

pub type Result<T> = std::result::Result<T, DocumentError>;
