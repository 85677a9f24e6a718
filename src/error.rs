//! Error types for epubseed operations.

use thiserror::Error;

/// Errors that can occur while converting an EPUB into seed records.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot find rootfile in container.xml")]
    MissingRootfile,

    /// An href that could not be located inside the archive. Callers that
    /// walk the spine treat this as "skip the item".
    #[error("unresolvable reference: {0}")]
    UnresolvableReference(String),

    #[error("no chapters extracted from epub")]
    NoChaptersExtracted,

    #[error("cover image not found")]
    CoverNotFound,

    #[error("Invalid EPUB: {0}")]
    InvalidEpub(String),
}

pub type Result<T> = std::result::Result<T, Error>;
