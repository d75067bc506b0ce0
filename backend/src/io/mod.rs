//! # IO Module
//!
//! Adapters between the domain and the outside world: the REST API, the SMTP
//! mailer and the PDF bill renderer. Services only see the [`Mailer`] and
//! [`BillRenderer`] traits, so each adapter can be swapped in tests.
//!
//! [`Mailer`]: crate::domain::email_service::Mailer
//! [`BillRenderer`]: crate::domain::bill_document::BillRenderer

pub mod bill_pdf;
pub mod mail;
pub mod rest;
