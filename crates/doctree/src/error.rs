#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Not a PDF file: {0}")]
    NotAPdf(String),

    #[error("No text found in {0}; the document may be scanned or image-only")]
    NoText(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
