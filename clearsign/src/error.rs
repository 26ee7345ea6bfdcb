use thiserror::Error;

/// Errors produced by the clearsign engine.
///
/// Most resolution failures are not errors: a path that does not match
/// the transaction shape yields [`crate::Resolution::Unresolved`] and
/// renders as the `"[unmapped]"` sentinel. An `Err` is reserved for
/// genuinely unsupported syntax and must be caught at the field
/// boundary so one bad field cannot blank an entire screen.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClearSignError {
    /// The path's leading selector is not `#`, `$` or `@`.
    #[error("unsupported root node: {0}")]
    UnsupportedRootNode(char),

    /// A metadata document failed structural validation at the input
    /// boundary.
    #[error("invalid metadata document: {0}")]
    InvalidDocument(String),

    /// Transaction JSON rejected at the input boundary.
    #[error("invalid transaction data: {0}")]
    InvalidTransaction(String),
}
