use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    transport::smtp::client::{Tls, TlsParameters},
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::info;

use crate::config::MailConfig;
use crate::domain::email_service::{MailAttachment, Mailer, OutgoingMail};

/// Delivers mail through an SMTP relay with STARTTLS
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self> {
        info!("📧 Initializing mailer for SMTP server: {}:{}", config.smtp_server, config.smtp_port);

        let tls_params = TlsParameters::new(config.smtp_server.clone())
            .context("Failed to create TLS parameters")?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_server)
            .context("Failed to create SMTP relay")?
            .port(config.smtp_port)
            .tls(Tls::Required(tls_params))
            .credentials(Credentials::new(config.username.clone(), config.password.clone()))
            .build();

        let from = format!("{} <{}>", config.from_name, config.from_address)
            .parse::<Mailbox>()
            .context("Failed to parse sender address")?;

        Ok(Self { transport, from })
    }

    async fn build_message(&self, mail: &OutgoingMail) -> Result<Message> {
        let builder = Message::builder()
            .from(self.from.clone())
            .to(mail.to.parse::<Mailbox>().with_context(|| format!("Invalid recipient '{}'", mail.to))?)
            .subject(mail.subject.clone());

        if mail.attachments.is_empty() {
            return builder
                .header(ContentType::TEXT_HTML)
                .body(mail.html.clone())
                .context("Failed to build email");
        }

        let mut body = MultiPart::mixed().singlepart(SinglePart::html(mail.html.clone()));
        for attachment in &mail.attachments {
            body = body.singlepart(load_attachment(attachment).await?);
        }

        builder.multipart(body).context("Failed to build email")
    }
}

async fn load_attachment(attachment: &MailAttachment) -> Result<SinglePart> {
    let bytes = tokio::fs::read(&attachment.path)
        .await
        .with_context(|| format!("Failed to read attachment {:?}", attachment.path))?;
    let content_type = ContentType::parse(&attachment.content_type)
        .with_context(|| format!("Invalid content type '{}'", attachment.content_type))?;
    Ok(Attachment::new(attachment.filename.clone()).body(bytes, content_type))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<()> {
        let message = self.build_message(&mail).await?;
        self.transport.send(message).await.context("Failed to send email")?;
        info!("📧 Sent '{}' to {}", mail.subject, mail.to);
        Ok(())
    }
}

/// Used when no SMTP server is configured; every message is only logged
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<()> {
        info!(
            to = %mail.to,
            attachments = mail.attachments.len(),
            "📧 Mail delivery disabled, not sending '{}'",
            mail.subject
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config() -> MailConfig {
        MailConfig {
            smtp_server: "smtp.example.com".to_string(),
            from_name: "Summer Camp".to_string(),
            from_address: "camp@example.com".to_string(),
            ..Default::default()
        }
    }

    fn mail(attachments: Vec<MailAttachment>) -> OutgoingMail {
        OutgoingMail {
            to: "parent@example.com".to_string(),
            subject: "Bill 4".to_string(),
            html: "<p>Hello</p>".to_string(),
            attachments,
        }
    }

    #[tokio::test]
    async fn test_message_with_attachment() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"%PDF-1.3").unwrap();

        let mailer = SmtpMailer::new(&config()).unwrap();
        let message = mailer
            .build_message(&mail(vec![MailAttachment {
                filename: "bill_4.pdf".to_string(),
                content_type: "application/pdf".to_string(),
                path: file.path().to_path_buf(),
            }]))
            .await
            .unwrap();

        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("To: parent@example.com"));
        assert!(raw.contains("bill_4.pdf"));
        assert!(raw.contains("application/pdf"));
    }

    #[tokio::test]
    async fn test_missing_attachment_fails() {
        let mailer = SmtpMailer::new(&config()).unwrap();
        let result = mailer
            .build_message(&mail(vec![MailAttachment {
                filename: "bill_4.pdf".to_string(),
                content_type: "application/pdf".to_string(),
                path: "/nonexistent/4.pdf".into(),
            }]))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_log_mailer_accepts_everything() {
        assert!(LogMailer.send(mail(Vec::new())).await.is_ok());
    }
}
