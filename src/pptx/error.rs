/// Error types for presentation operations.
use thiserror::Error;

/// Result type for presentation operations.
pub type Result<T> = std::result::Result<T, PptxError>;

/// Classified template validation failures.
///
/// These are produced by the fail-fast checks that run before any package
/// decoding is attempted, plus `Corrupted` for archives that pass the cheap
/// checks but cannot be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateInvalid {
    /// The byte sequence is empty
    #[error("template is empty")]
    Empty,

    /// The byte sequence does not begin with the ZIP container signature
    #[error("template is not a ZIP-packaged document")]
    InvalidFormat,

    /// The byte sequence exceeds the configured size ceiling
    #[error("template is {size} bytes, over the {limit}-byte ceiling")]
    TooLarge { size: u64, limit: u64 },

    /// The container signature matched but the package cannot be decoded
    #[error("corrupted package: {0}")]
    Corrupted(String),
}

/// Error types for presentation operations.
#[derive(Error, Debug)]
pub enum PptxError {
    /// Template failed validation
    #[error("invalid template: {0}")]
    Template(#[from] TemplateInvalid),

    /// OPC package error
    #[error("OPC error: {0}")]
    Opc(#[from] crate::opc::OpcError),

    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(String),

    /// Part not found
    #[error("part not found: {0}")]
    PartNotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<quick_xml::Error> for PptxError {
    fn from(err: quick_xml::Error) -> Self {
        PptxError::Xml(err.to_string())
    }
}
