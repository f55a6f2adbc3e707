use crate::{Error, Result};
use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use repopulse_core::Settings;
use std::time::Duration;

/// Outbound mail delivery
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<()>;
}

/// SMTP delivery over lettre; STARTTLS, or implicit TLS on port 465
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(
        server: &str,
        port: u16,
        username: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let from: Mailbox = username
            .parse()
            .map_err(|e| Error::InvalidAddress(format!("{}: {}", username, e)))?;

        let builder = if port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(server)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(server)?
        };
        let transport = builder
            .port(port)
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .timeout(Some(timeout))
            .build();

        Ok(Self { transport, from })
    }

    /// Fails with `ConfigurationIncomplete` naming every missing key
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let (server, username, password) = smtp_credentials(settings)?;
        Self::new(
            server,
            settings.smtp_port,
            username,
            password,
            settings.http_timeout(),
        )
    }
}

fn smtp_credentials(settings: &Settings) -> Result<(&str, &str, &str)> {
    fn value(v: &Option<String>) -> Option<&str> {
        v.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    let server = value(&settings.smtp_server);
    let username = value(&settings.smtp_username);
    let password = value(&settings.smtp_password);

    match (server, username, password) {
        (Some(server), Some(username), Some(password)) => Ok((server, username, password)),
        _ => {
            let missing: Vec<&str> = [
                ("SMTP_SERVER", server.is_none()),
                ("SMTP_USERNAME", username.is_none()),
                ("SMTP_PASSWORD", password.is_none()),
            ]
            .into_iter()
            .filter(|(_, absent)| *absent)
            .map(|(key, _)| key)
            .collect();
            Err(Error::ConfigurationIncomplete(format!(
                "missing {}",
                missing.join(", ")
            )))
        }
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<()> {
        let recipient: Mailbox = to
            .parse()
            .map_err(|e| Error::InvalidAddress(format!("{}: {}", to, e)))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())?;

        tracing::info!(to, subject, "Sending mail");
        self.transport.send(email).await?;
        Ok(())
    }
}
