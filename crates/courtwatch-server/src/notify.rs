//! Email notifications for newly free courts.
//!
//! The [`Notifier`] trait is the seam between the monitor and the outside
//! world. [`EmailNotifier`] sends one plain-text UTF-8 message over SMTP;
//! [`LogNotifier`] only logs the message and backs `--dry-run`.

#[cfg(test)]
use std::sync::Arc;
use std::time::Duration;

use courtwatch_providers::BoxFuture;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, Mailboxes};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
#[cfg(test)]
use tokio::sync::Mutex;
use tracing::{Instrument, debug, info, info_span};

/// Port on which SMTP servers expect an immediate TLS handshake.
pub const SMTPS_PORT: u16 = 465;

/// Errors raised while composing or sending a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// An address in the configuration does not parse.
    #[error("Invalid email address {address:?}: {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    /// The message could not be assembled.
    #[error("Failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    /// The SMTP exchange failed.
    #[error("SMTP error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// TLS parameters were rejected.
    #[error("TLS setup failed for {host}: {source}")]
    Tls {
        host: String,
        #[source]
        source: lettre::transport::smtp::Error,
    },

    /// The send did not finish in time.
    #[error("Notification not delivered within {}s", .0.as_secs())]
    Timeout(Duration),
}

/// Result type for notifier operations.
pub type NotifyResult<T> = Result<T, NotifyError>;

/// SMTP settings and message metadata.
#[derive(Clone)]
pub struct EmailConfig {
    /// Sender address; also the SMTP login.
    pub from: String,
    /// SMTP password, already resolved.
    pub password: String,
    /// Recipients.
    pub to: Vec<String>,
    /// SMTP server host name.
    pub smtp_host: String,
    /// SMTP server port.
    pub smtp_port: u16,
    /// Display name on the `From` header.
    pub sender_name: String,
    /// Message subject.
    pub subject: String,
    /// Accept any server certificate.
    pub accept_invalid_certs: bool,
    /// Upper bound on each SMTP command.
    pub timeout: Duration,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("from", &self.from)
            .field("password", &"[redacted]")
            .field("to", &self.to)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("sender_name", &self.sender_name)
            .field("subject", &self.subject)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl EmailConfig {
    /// Default display name of the sender.
    pub const DEFAULT_SENDER_NAME: &'static str = "CUCBadminton 小助手";

    /// Default subject line.
    pub const DEFAULT_SUBJECT: &'static str = "羽毛球场地空闲提醒";

    /// Default SMTP command timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

    /// Creates a configuration with default name, subject and port.
    pub fn new(
        from: impl Into<String>,
        password: impl Into<String>,
        to: Vec<String>,
        smtp_host: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            password: password.into(),
            to,
            smtp_host: smtp_host.into(),
            smtp_port: SMTPS_PORT,
            sender_name: Self::DEFAULT_SENDER_NAME.to_string(),
            subject: Self::DEFAULT_SUBJECT.to_string(),
            accept_invalid_certs: false,
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Builder: set the SMTP port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.smtp_port = port;
        self
    }

    /// Builder: set the sender display name.
    pub fn with_sender_name(mut self, name: impl Into<String>) -> Self {
        self.sender_name = name.into();
        self
    }

    /// Builder: set the subject.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Builder: accept invalid server certificates.
    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Builder: set the SMTP command timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Delivers availability notifications.
pub trait Notifier: Send + Sync {
    /// Returns a short name for logs.
    fn name(&self) -> &str;

    /// Sends one notification listing today's and tomorrow's free slots.
    fn notify<'a>(
        &'a self,
        today: &'a [String],
        tomorrow: &'a [String],
    ) -> BoxFuture<'a, NotifyResult<()>>;
}

/// Formats the notification body.
///
/// Empty days are left out entirely.
pub fn compose_body(today: &[String], tomorrow: &[String]) -> String {
    let mut body = String::new();
    if !today.is_empty() {
        body.push_str("今天空闲场地:\n");
        body.push_str(&today.join("\n"));
        body.push_str("\n\n");
    }
    if !tomorrow.is_empty() {
        body.push_str("明天空闲场地:\n");
        body.push_str(&tomorrow.join("\n"));
    }
    body
}

fn parse_address(address: &str) -> NotifyResult<Address> {
    address.parse().map_err(|source| NotifyError::Address {
        address: address.to_string(),
        source,
    })
}

/// Sends notifications through an SMTP server.
///
/// Port 465 gets implicit TLS; any other port requires STARTTLS.
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailboxes,
    subject: String,
}

impl EmailNotifier {
    /// Creates a notifier, validating every address up front.
    ///
    /// # Errors
    ///
    /// Returns an error if an address does not parse or the TLS parameters
    /// are rejected.
    pub fn new(config: &EmailConfig) -> NotifyResult<Self> {
        let from = Mailbox::new(
            Some(config.sender_name.clone()),
            parse_address(&config.from)?,
        );
        let to = config
            .to
            .iter()
            .map(|address| parse_address(address).map(|a| Mailbox::new(None, a)))
            .collect::<NotifyResult<Mailboxes>>()?;

        let tls_parameters = TlsParameters::builder(config.smtp_host.clone())
            .dangerous_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|source| NotifyError::Tls {
                host: config.smtp_host.clone(),
                source,
            })?;
        let tls = if config.smtp_port == SMTPS_PORT {
            Tls::Wrapper(tls_parameters)
        } else {
            Tls::Required(tls_parameters)
        };

        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
            .port(config.smtp_port)
            .tls(tls)
            .timeout(Some(config.timeout))
            .credentials(Credentials::new(
                config.from.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from,
            to,
            subject: config.subject.clone(),
        })
    }

    /// Assembles the message for the given slot lists.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be built.
    pub fn build_message(&self, today: &[String], tomorrow: &[String]) -> NotifyResult<Message> {
        let message = Message::builder()
            .from(self.from.clone())
            .mailbox(lettre::message::header::To::from(self.to.clone()))
            .subject(self.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(compose_body(today, tomorrow))?;
        Ok(message)
    }
}

impl Notifier for EmailNotifier {
    fn name(&self) -> &str {
        "email"
    }

    fn notify<'a>(
        &'a self,
        today: &'a [String],
        tomorrow: &'a [String],
    ) -> BoxFuture<'a, NotifyResult<()>> {
        let span = info_span!("email", today = today.len(), tomorrow = tomorrow.len());
        Box::pin(
            async move {
                let message = self.build_message(today, tomorrow)?;
                let response = self.transport.send(message).await?;
                debug!(code = %response.code(), "SMTP server accepted message");
                info!(recipients = self.to.iter().count(), "Notification email sent");
                Ok(())
            }
            .instrument(span),
        )
    }
}

/// Logs notifications instead of sending them.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    fn notify<'a>(
        &'a self,
        today: &'a [String],
        tomorrow: &'a [String],
    ) -> BoxFuture<'a, NotifyResult<()>> {
        Box::pin(async move {
            info!(body = %compose_body(today, tomorrow), "Would send notification");
            Ok(())
        })
    }
}

/// Records notifications in memory.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub(crate) struct RecordingNotifier {
    sent: Arc<Mutex<Vec<(Vec<String>, Vec<String>)>>>,
    fail: bool,
    delay: Option<Duration>,
}

#[cfg(test)]
impl RecordingNotifier {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Records, then fails every send with an address error.
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Records, then waits `delay` before answering.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns every recorded `(today, tomorrow)` pair, oldest first.
    pub(crate) async fn sent(&self) -> Vec<(Vec<String>, Vec<String>)> {
        self.sent.lock().await.clone()
    }
}

#[cfg(test)]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    fn notify<'a>(
        &'a self,
        today: &'a [String],
        tomorrow: &'a [String],
    ) -> BoxFuture<'a, NotifyResult<()>> {
        Box::pin(async move {
            self.sent
                .lock()
                .await
                .push((today.to_vec(), tomorrow.to_vec()));
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return parse_address("not an address").map(|_| ());
            }
            Ok(())
        })
    }
}
