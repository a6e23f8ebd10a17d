/// Email notifications
///
/// A [`Notifier`] pairs a [`Mailer`] transport with the [`Templates`] used to
/// render lifecycle emails. Two delivery modes exist:
///
/// - [`Notifier::deliver`] returns the transport error to the caller, for
///   flows where the email is the point of the request (registration,
///   password reset)
/// - [`Notifier::notify`] logs failures and reports success as a bool, for
///   side notifications that must not undo a committed change

pub mod mailer;
pub mod templates;

use std::sync::Arc;

use serde::Deserialize;

pub use mailer::{EmailMessage, HttpMailer, LogMailer, MailError, Mailer, RecordingMailer};
pub use templates::Templates;

/// Which transport to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailProvider {
    #[default]
    Log,
    Http,
}

impl std::str::FromStr for MailProvider {
    type Err = MailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "log" => Ok(Self::Log),
            "http" => Ok(Self::Http),
            other => Err(MailError::InvalidConfig(format!(
                "unknown MAIL_PROVIDER {:?} (expected \"log\" or \"http\")",
                other
            ))),
        }
    }
}

/// Mail settings shared by the API and the worker
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub provider: MailProvider,
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub from: String,
    pub organization: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            provider: MailProvider::Log,
            api_url: None,
            api_key: None,
            from: "noreply@cluster.local".to_string(),
            organization: "Cluster".to_string(),
        }
    }
}

impl MailConfig {
    /// Reads `MAIL_PROVIDER`, `MAIL_API_URL`, `MAIL_API_KEY`, `MAIL_FROM`
    /// and `ORGANIZATION_NAME`, falling back to the defaults
    pub fn from_env() -> Result<Self, MailError> {
        let defaults = Self::default();
        let provider = match std::env::var("MAIL_PROVIDER") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.provider,
        };

        Ok(Self {
            provider,
            api_url: std::env::var("MAIL_API_URL").ok(),
            api_key: std::env::var("MAIL_API_KEY").ok(),
            from: std::env::var("MAIL_FROM").unwrap_or(defaults.from),
            organization: std::env::var("ORGANIZATION_NAME").unwrap_or(defaults.organization),
        })
    }
}

/// Builds the configured transport
pub fn build_mailer(config: &MailConfig) -> Result<Arc<dyn Mailer>, MailError> {
    match config.provider {
        MailProvider::Log => Ok(Arc::new(LogMailer::new(config.from.clone()))),
        MailProvider::Http => {
            let url = config.api_url.clone().ok_or_else(|| {
                MailError::InvalidConfig("MAIL_API_URL is required for the http provider".into())
            })?;
            let key = config.api_key.clone().ok_or_else(|| {
                MailError::InvalidConfig("MAIL_API_KEY is required for the http provider".into())
            })?;
            Ok(Arc::new(HttpMailer::new(url, key, config.from.clone())?))
        }
    }
}

/// Renders and sends lifecycle emails
#[derive(Clone)]
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    templates: Templates,
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("mailer", &self.mailer.name())
            .field("templates", &self.templates)
            .finish()
    }
}

impl Notifier {
    pub fn new(mailer: Arc<dyn Mailer>, templates: Templates) -> Self {
        Self { mailer, templates }
    }

    /// Builds a notifier from mail settings
    pub fn from_config(config: &MailConfig) -> Result<Self, MailError> {
        Ok(Self::new(
            build_mailer(config)?,
            Templates::new(config.organization.clone()),
        ))
    }

    pub fn templates(&self) -> &Templates {
        &self.templates
    }

    pub fn mailer_name(&self) -> &'static str {
        self.mailer.name()
    }

    /// Sends a message and propagates failure
    pub async fn deliver(&self, message: EmailMessage) -> Result<(), MailError> {
        match self.mailer.send(&message).await {
            Ok(()) => {
                tracing::info!(to = %message.to, subject = %message.subject, "Email sent");
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    to = %message.to,
                    subject = %message.subject,
                    transport = self.mailer.name(),
                    error = %e,
                    "Email delivery failed"
                );
                Err(e)
            }
        }
    }

    /// Sends a message, logging failure instead of returning it
    pub async fn notify(&self, message: EmailMessage) -> bool {
        self.deliver(message).await.is_ok()
    }
}
