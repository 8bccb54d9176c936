use crate::error::MailerError;
use async_trait::async_trait;
use configuration::MailConfig;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A rendered report ready to leave the process.
#[derive(Debug, Clone)]
pub struct OutgoingReport {
    pub subject: String,
    pub body: String,
    pub attachment_name: String,
    pub pdf: Vec<u8>,
}

/// The outbound channel for finished reports.
#[async_trait]
pub trait ReportTransport: Send + Sync {
    async fn send(&self, report: OutgoingReport) -> Result<(), MailerError>;
}

/// Sends reports through one SMTP relay to one fixed recipient.
pub struct SmtpTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
    recipient: Mailbox,
    pdf_type: ContentType,
}

impl SmtpTransport {
    /// Builds the transport from the `[mail]` settings.
    ///
    /// `implicit_tls` selects a TLS-wrapped connection (port 465 style);
    /// otherwise the relay is reached in plain text and upgraded with STARTTLS.
    pub fn new(config: &MailConfig) -> Result<Self, MailerError> {
        let builder = if config.implicit_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
        };
        let transport = builder
            .port(config.smtp_port)
            .credentials(Credentials::new(config.username.clone(), config.password.clone()))
            .build();

        let pdf_type = ContentType::parse("application/pdf")
            .map_err(|e| MailerError::Rejected(e.to_string()))?;

        Ok(Self {
            transport,
            sender: config.sender.parse()?,
            recipient: config.recipient.parse()?,
            pdf_type,
        })
    }
}

#[async_trait]
impl ReportTransport for SmtpTransport {
    async fn send(&self, report: OutgoingReport) -> Result<(), MailerError> {
        let attachment = Attachment::new(report.attachment_name).body(report.pdf, self.pdf_type.clone());
        let message = Message::builder()
            .from(self.sender.clone())
            .to(self.recipient.clone())
            .subject(report.subject)
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(report.body))
                    .singlepart(attachment),
            )?;

        self.transport.send(message).await?;
        tracing::info!(recipient = %self.recipient, "Report email sent.");
        Ok(())
    }
}

/// Writes the attachment into a directory instead of mailing it.
#[derive(Debug, Clone)]
pub struct FileDropTransport {
    dir: PathBuf,
}

impl FileDropTransport {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ReportTransport for FileDropTransport {
    async fn send(&self, report: OutgoingReport) -> Result<(), MailerError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(&report.attachment_name);
        tokio::fs::write(&path, &report.pdf).await?;
        tracing::info!(path = %path.display(), subject = %report.subject, "Report written to disk.");
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Recorded {
    reports: Vec<OutgoingReport>,
    failing: bool,
}

/// Keeps every report it is handed. Used in tests across the workspace.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    inner: Arc<Mutex<Recorded>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Rejects every report while set, as an unreachable relay would.
    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    pub fn sent(&self) -> Vec<OutgoingReport> {
        self.lock().reports.clone()
    }
}

#[async_trait]
impl ReportTransport for MemoryTransport {
    async fn send(&self, report: OutgoingReport) -> Result<(), MailerError> {
        let mut recorded = self.lock();
        if recorded.failing {
            return Err(MailerError::Rejected("relay unavailable".to_string()));
        }
        recorded.reports.push(report);
        Ok(())
    }
}
