use crate::config::Config;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{error, info, warn};

/// Best-effort outbound email. Send failures are logged and swallowed; the
/// calling operation still succeeds.
#[derive(Clone)]
pub struct Mailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Option<Mailbox>,
}

impl Mailer {
    pub fn from_config(config: &Config) -> Self {
        let (host, from) = match (&config.smtp_host, &config.smtp_from) {
            (Some(h), Some(f)) => (h, f),
            _ => {
                warn!("SMTP not configured, outbound mail disabled");
                return Self {
                    transport: None,
                    from: None,
                };
            }
        };

        let from: Mailbox = match from.parse() {
            Ok(m) => m,
            Err(e) => {
                error!(error = %e, "Invalid SMTP_FROM address, outbound mail disabled");
                return Self {
                    transport: None,
                    from: None,
                };
            }
        };

        let mut builder = match AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host) {
            Ok(b) => b.port(config.smtp_port),
            Err(e) => {
                error!(error = %e, "Failed to build SMTP transport, outbound mail disabled");
                return Self {
                    transport: None,
                    from: None,
                };
            }
        };

        if let (Some(user), Some(pass)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Self {
            transport: Some(builder.build()),
            from: Some(from),
        }
    }

    pub async fn send(&self, to: &str, subject: &str, body: &str) {
        let (transport, from) = match (&self.transport, &self.from) {
            (Some(t), Some(f)) => (t, f),
            _ => {
                info!(to, subject, "Mail disabled, skipping notification");
                return;
            }
        };

        let recipient: Mailbox = match to.parse() {
            Ok(m) => m,
            Err(e) => {
                error!(error = %e, to, "Invalid recipient address, notification dropped");
                return;
            }
        };

        let message = match Message::builder()
            .from(from.clone())
            .to(recipient)
            .subject(subject)
            .body(body.to_string())
        {
            Ok(m) => m,
            Err(e) => {
                error!(error = %e, to, "Failed to build notification email");
                return;
            }
        };

        match transport.send(message).await {
            Ok(_) => info!(to, subject, "Notification email sent"),
            Err(e) => error!(error = %e, to, "Failed to send notification email"),
        }
    }
}
