use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageFilterError {
    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("PDF operation failed: {0}")]
    OperationError(String),
}
