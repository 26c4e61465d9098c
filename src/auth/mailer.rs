// Outbound email delivery
//
// The auth flow only needs a fire-and-forget "send this code" operation, so
// delivery sits behind the Mailer port. The production adapter speaks SMTP
// via lettre; tests plug in recording or failing mailers (memory.rs).

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::auth::otp::OTP_TTL_MINUTES;
use crate::config::SmtpConfig;

#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("could not build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("smtp transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
    #[error("delivery failed: {0}")]
    Failed(String),
}

/// Delivery port for verification codes
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_otp(&self, recipient: &str, code: &str) -> Result<(), MailerError>;
}

/// SMTP mailer (STARTTLS relay)
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailerError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from: format!("Marketplace <{}>", config.from_address).parse()?,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_otp(&self, recipient: &str, code: &str) -> Result<(), MailerError> {
        // The quoted expiry must stay in step with the actual OTP window.
        let body = format!(
            "<p>Your verification OTP is:</p><h2>{}</h2><p>It will expire in {} minutes.</p>",
            code, OTP_TTL_MINUTES
        );

        let message = Message::builder()
            .from(self.from.clone())
            .to(recipient.parse()?)
            .subject("Your Verification OTP")
            .header(ContentType::TEXT_HTML)
            .body(body)?;

        self.transport.send(message).await?;
        Ok(())
    }
}
