//! SMTP delivery via `lettre`.
//!
//! Port 465 gets an implicit TLS connection. Every other port starts in
//! plaintext and upgrades with STARTTLS when the server offers it. The
//! configured credentials are only presented when the server advertises a
//! supported AUTH mechanism; relays without AUTH accept mail unauthenticated.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::{Credentials, DEFAULT_MECHANISMS};
use lettre::transport::smtp::client::{AsyncSmtpConnection, TlsParameters};
use lettre::transport::smtp::extension::ClientId;
use lettre::Message;
use tracing::debug;

use super::{Notifier, NotifyError};
use crate::config::{defaults, SmtpConfig};

/// How the SMTP connection is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportSecurity {
    /// TLS from the first byte (SMTPS)
    ImplicitTls,
    /// Plaintext, upgraded with STARTTLS if offered
    OpportunisticStartTls,
}

impl TransportSecurity {
    pub fn for_port(port: u16) -> Self {
        if port == defaults::IMPLICIT_TLS_PORT {
            TransportSecurity::ImplicitTls
        } else {
            TransportSecurity::OpportunisticStartTls
        }
    }
}

impl std::fmt::Display for TransportSecurity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportSecurity::ImplicitTls => write!(f, "implicit TLS"),
            TransportSecurity::OpportunisticStartTls => write!(f, "STARTTLS (opportunistic)"),
        }
    }
}

/// Build a plaintext UTF-8 message.
pub(crate) fn compose_message(
    from: &Mailbox,
    to: &Mailbox,
    subject: &str,
    body: &str,
) -> Result<Message, NotifyError> {
    Ok(Message::builder()
        .from(from.clone())
        .to(to.clone())
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())?)
}

/// Notifier that mails the configured recipient.
///
/// Opens one connection per message; alerts are rare enough that pooling
/// buys nothing.
pub struct SmtpNotifier {
    server: String,
    port: u16,
    tls: TlsParameters,
    credentials: Credentials,
    hello_name: ClientId,
    timeout: Duration,
    from: Mailbox,
    recipient: Mailbox,
    security: TransportSecurity,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig) -> Result<Self, NotifyError> {
        Ok(Self {
            server: config.server.clone(),
            port: config.port,
            tls: TlsParameters::new(config.server.clone())?,
            credentials: Credentials::new(
                config.user.clone(),
                config.password.expose().to_string(),
            ),
            hello_name: ClientId::default(),
            timeout: Duration::from_secs(defaults::SMTP_TIMEOUT_SECS),
            from: config.from.clone(),
            recipient: config.recipient.clone(),
            security: TransportSecurity::for_port(config.port),
        })
    }

    pub fn security(&self) -> TransportSecurity {
        self.security
    }

    /// Connect, greet, and secure the session according to the port rule.
    async fn connect(&self) -> Result<AsyncSmtpConnection, NotifyError> {
        let wrapper = match self.security {
            TransportSecurity::ImplicitTls => Some(self.tls.clone()),
            TransportSecurity::OpportunisticStartTls => None,
        };
        let mut conn = AsyncSmtpConnection::connect_tokio1(
            (self.server.as_str(), self.port),
            Some(self.timeout),
            &self.hello_name,
            wrapper,
            None,
        )
        .await?;

        if self.security == TransportSecurity::OpportunisticStartTls && conn.can_starttls() {
            conn.starttls(self.tls.clone(), &self.hello_name).await?;
        }
        Ok(conn)
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        let message = compose_message(&self.from, &self.recipient, subject, body)?;
        let mut conn = self.connect().await?;

        if conn
            .server_info()
            .get_auth_mechanism(DEFAULT_MECHANISMS)
            .is_some()
        {
            conn.auth(DEFAULT_MECHANISMS, &self.credentials).await?;
        } else {
            debug!(server = %self.server, "Server offers no AUTH, sending unauthenticated");
        }

        let response = conn.send(message.envelope(), &message.formatted()).await?;
        debug!(
            code = %response.code(),
            security = %self.security,
            encrypted = conn.is_encrypted(),
            "SMTP server accepted message"
        );

        if let Err(e) = conn.quit().await {
            debug!(error = %e, "SMTP QUIT failed after delivery");
        }
        Ok(())
    }
}
