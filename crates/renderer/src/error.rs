use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("PDF encoding failed: {0}")]
    Pdf(String),

    #[error("Layout references row {0}, which is not in the input")]
    RowOutOfRange(usize),
}
