use analytics::AnalyticsError;
use renderer::RenderError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailerError {
    #[error("Failed to read report data: {0}")]
    Analytics(#[from] AnalyticsError),

    #[error("Failed to render the report: {0}")]
    Render(#[from] RenderError),

    #[error("Invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Failed to build the report email: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP transmission failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Failed to write the report file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transport rejected the report: {0}")]
    Rejected(String),
}
