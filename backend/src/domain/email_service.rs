use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{error, info};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::bill::{BillCamper, ContactCampers};
use crate::domain::models::shift::Shift;

#[derive(Debug, Clone, PartialEq)]
pub struct MailAttachment {
    pub filename: String,
    pub content_type: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub attachments: Vec<MailAttachment>,
}

/// Delivers one message; implementations decide the transport
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<()>;
}

/// A child mentioned in a registration receipt
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptLine {
    pub contact_email: String,
    pub child_name: String,
    pub shift_nr: i32,
}

/// Builds the camp's outgoing messages and hands them to a [`Mailer`]
#[derive(Clone)]
pub struct EmailService {
    mailer: Arc<dyn Mailer>,
    shifts: Arc<Vec<Shift>>,
}

impl EmailService {
    pub fn new(mailer: Arc<dyn Mailer>, shifts: Vec<Shift>) -> Self {
        Self { mailer, shifts: Arc::new(shifts) }
    }

    /// One receipt per contact address listing all of its children.
    ///
    /// Delivery failures are logged and skipped. Returns how many receipts went out.
    pub async fn send_registration_receipts(&self, lines: &[ReceiptLine]) -> usize {
        let mut by_email: BTreeMap<&str, Vec<&ReceiptLine>> = BTreeMap::new();
        for line in lines {
            by_email.entry(line.contact_email.as_str()).or_default().push(line);
        }

        let mut sent = 0;
        for (email, children) in by_email {
            let mail = OutgoingMail {
                to: email.to_string(),
                subject: "Reserve list registration".to_string(),
                html: self.registration_receipt_html(&children),
                attachments: Vec::new(),
            };
            match self.mailer.send(mail).await {
                Ok(()) => {
                    sent += 1;
                    info!(email, children = children.len(), "📧 Registration receipt sent");
                }
                Err(e) => error!(email, "Failed to send registration receipt: {:#}", e),
            }
        }
        sent
    }

    /// Booking confirmation with the bill attached
    pub async fn send_bill(&self, contact: &ContactCampers, bill_nr: i64, bill_path: PathBuf) -> DomainResult<()> {
        let mail = OutgoingMail {
            to: contact.contact_email.clone(),
            subject: "Booking confirmation".to_string(),
            html: self.confirmation_html(contact),
            attachments: vec![MailAttachment {
                filename: format!("bill_{}.pdf", bill_nr),
                content_type: "application/pdf".to_string(),
                path: bill_path,
            }],
        };

        self.mailer.send(mail).await.map_err(|e| {
            error!(email = %contact.contact_email, bill_nr, "Failed to send bill: {:#}", e);
            DomainError::Delivery(e)
        })?;

        info!(email = %contact.contact_email, bill_nr, "📧 Bill sent");
        Ok(())
    }

    fn registration_receipt_html(&self, children: &[&ReceiptLine]) -> String {
        let shifts: BTreeSet<i32> = children.iter().map(|c| c.shift_nr).collect();
        let items: String = children
            .iter()
            .map(|c| format!("<li>{} (shift {})</li>", escape_html(&c.child_name), c.shift_nr))
            .collect();
        let subject = if children.len() > 1 { "children" } else { "child" };

        format!(
            "<p>Hello!</p>\
             <p>We have added the following {} to the reserve list:</p><ul>{}</ul>\
             <p>We will contact you as soon as the shift leader confirms the place or a place on the main list opens up.</p>\
             <p>Best regards</p>{}",
            subject,
            items,
            self.staff_contacts_html(&shifts)
        )
    }

    fn confirmation_html(&self, contact: &ContactCampers) -> String {
        let shifts: BTreeSet<i32> = contact
            .registered
            .iter()
            .chain(&contact.reserve)
            .map(|c| c.shift_nr)
            .collect();
        let list = |campers: &[BillCamper]| -> String {
            campers
                .iter()
                .map(|c| format!("<li>{} (shift {})</li>", escape_html(&c.child_name), c.shift_nr))
                .collect()
        };
        let total: i64 = contact.registered.iter().map(|c| c.price_to_pay).sum();

        let mut html = String::from("<h3>Registration confirmed!</h3>");
        if !contact.registered.is_empty() {
            html.push_str(&format!("<ul>{}</ul><p>have been registered.</p>", list(&contact.registered)));
        }
        if !contact.reserve.is_empty() {
            html.push_str(&format!(
                "<ul>{}</ul><p>are on the reserve list. We will contact you if a place opens up. \
                 Please contact the shift leader if you wish to cancel the registration.</p>",
                list(&contact.reserve)
            ));
        }
        html.push_str(&format!(
            "<p>Please find the bill attached. Total including the booking fee: {} €.</p>\
             <p><b>Please include the bill number, the child's name and the shift in the payment description.</b></p>\
             <p>Best regards</p>{}",
            total,
            self.staff_contacts_html(&shifts)
        ));
        html
    }

    fn staff_contacts_html(&self, shift_nrs: &BTreeSet<i32>) -> String {
        self.shifts
            .iter()
            .filter(|s| shift_nrs.contains(&s.shift_nr))
            .filter_map(|s| {
                let name = s.boss_name.as_deref()?;
                let mut line = format!("{}<br />Shift {} leader", escape_html(name), s.shift_nr);
                if let Some(phone) = &s.boss_phone {
                    line.push_str(&format!("<br />{}", escape_html(phone)));
                }
                if let Some(email) = &s.boss_email {
                    line.push_str(&format!("<br />{}", escape_html(email)));
                }
                Some(format!("<p>{}</p>", line))
            })
            .collect()
    }
}

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{bill_camper, test_shift, FailingMailer, RecordingMailer};

    fn line(email: &str, name: &str, shift_nr: i32) -> ReceiptLine {
        ReceiptLine { contact_email: email.to_string(), child_name: name.to_string(), shift_nr }
    }

    #[tokio::test]
    async fn test_one_receipt_per_contact() {
        let mailer = Arc::new(RecordingMailer::default());
        let service = EmailService::new(mailer.clone(), vec![test_shift(2)]);

        let sent = service
            .send_registration_receipts(&[
                line("a@example.com", "Mari", 2),
                line("b@example.com", "Jaan", 3),
                line("a@example.com", "Anna", 2),
            ])
            .await;

        assert_eq!(sent, 2);
        let mails = mailer.sent();
        assert_eq!(mails.len(), 2);
        assert_eq!(mails[0].to, "a@example.com");
        assert!(mails[0].html.contains("Mari") && mails[0].html.contains("Anna"));
        assert!(mails[0].html.contains("Shift 2 leader"));
        assert!(!mails[1].html.contains("Mari"));
    }

    #[tokio::test]
    async fn test_receipt_failures_are_swallowed() {
        let service = EmailService::new(Arc::new(FailingMailer), Vec::new());
        assert_eq!(service.send_registration_receipts(&[line("a@example.com", "Mari", 2)]).await, 0);
    }

    #[tokio::test]
    async fn test_bill_mail_carries_attachment_and_surfaces_failure() {
        let contact = ContactCampers {
            contact_name: "Kati Kask".to_string(),
            contact_email: "a@example.com".to_string(),
            bill_nr: Some(4),
            registered: vec![bill_camper(1, "Mari <3", 2, false, 360)],
            reserve: vec![],
        };

        let mailer = Arc::new(RecordingMailer::default());
        let service = EmailService::new(mailer.clone(), Vec::new());
        service.send_bill(&contact, 4, PathBuf::from("bills/4.pdf")).await.unwrap();

        let mail = &mailer.sent()[0];
        assert_eq!(mail.attachments[0].filename, "bill_4.pdf");
        assert!(mail.html.contains("Mari &lt;3"));
        assert!(mail.html.contains("360 €"));

        let failing = EmailService::new(Arc::new(FailingMailer), Vec::new());
        let result = failing.send_bill(&contact, 4, PathBuf::from("bills/4.pdf")).await;
        assert!(matches!(result, Err(DomainError::Delivery(_))));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }
}
