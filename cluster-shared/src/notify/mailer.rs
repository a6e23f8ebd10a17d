/// Outbound mail transports
///
/// # Transports
///
/// - [`LogMailer`]: writes messages to the log; the default in development
/// - [`HttpMailer`]: posts messages as JSON to an HTTP mail relay
/// - [`RecordingMailer`]: keeps messages in memory, optionally failing, for tests
///
/// # Example
///
/// ```
/// use cluster_shared::notify::mailer::{EmailMessage, LogMailer, Mailer};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mailer = LogMailer::new("Cluster <noreply@cluster.example>");
/// mailer.send(&EmailMessage {
///     to: "ana@empresa.mx".into(),
///     subject: "Hello".into(),
///     html: "<p>Hi</p>".into(),
/// }).await?;
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;

/// Error type for mail delivery
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// Relay could not be reached
    #[error("Mail transport error: {0}")]
    Transport(String),

    /// Relay answered with a non-success status
    #[error("Mail relay rejected message with status {status}")]
    Rejected { status: u16 },

    /// Transport settings are unusable
    #[error("Invalid mail configuration: {0}")]
    InvalidConfig(String),
}

/// A rendered email
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Something that can deliver an email
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Delivers one message
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;

    /// Short transport name for logs
    fn name(&self) -> &'static str;
}

/// Logs messages instead of sending them
#[derive(Debug, Clone)]
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        tracing::info!(
            from = %self.from,
            to = %message.to,
            subject = %message.subject,
            "Email (log transport)"
        );
        tracing::debug!(html = %message.html, "Email body");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

#[derive(Serialize)]
struct RelayRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

/// Sends mail through an HTTP relay
///
/// Each message is a `POST` of `{from, to, subject, html}` with a bearer
/// API key. Any 2xx status counts as delivered.
#[derive(Debug, Clone)]
pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl HttpMailer {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        from: impl Into<String>,
    ) -> Result<Self, MailError> {
        let api_url = api_url.into();
        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            return Err(MailError::InvalidConfig(format!(
                "MAIL_API_URL must be an http(s) URL, got {:?}",
                api_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| MailError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            client,
            api_url,
            api_key: api_key.into(),
            from: from.into(),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let body = RelayRequest {
            from: &self.from,
            to: &message.to,
            subject: &message.subject,
            html: &message.html,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MailError::Rejected {
                status: status.as_u16(),
            });
        }

        tracing::debug!(to = %message.to, subject = %message.subject, "Email accepted by relay");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// In-memory mailer for tests
///
/// Clones share the same outbox. Addresses listed in `fail_for` are
/// rejected, which lets a test exercise partial failures.
#[derive(Debug, Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<EmailMessage>>>,
    fail_for: Arc<Mutex<Vec<String>>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every send to `address` fail
    pub async fn fail_for(&self, address: impl Into<String>) {
        self.fail_for.lock().await.push(address.into());
    }

    /// Messages delivered so far
    pub async fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().await.clone()
    }

    /// Messages delivered to one address
    pub async fn sent_to(&self, address: &str) -> Vec<EmailMessage> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|m| m.to == address)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        if self.fail_for.lock().await.iter().any(|a| a == &message.to) {
            return Err(MailError::Transport(format!("refused {}", message.to)));
        }
        self.sent.lock().await.push(message.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
