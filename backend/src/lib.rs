//! # Camp Backend
//!
//! Registration, attendance and billing service for a children's summer camp.
//!
//! The crate is layered the same way top to bottom:
//! ```text
//! IO Layer (REST API, SMTP, PDF rendering)
//!     ↓
//! Domain Layer (services, business rules)
//!     ↓
//! Storage Layer (SQLite repositories)
//! ```
//!
//! [`initialize_backend`] wires every service from an [`AppConfig`] and
//! [`create_router`] exposes them over HTTP.

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_utils;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    http::{header::CONTENT_TYPE, HeaderName, HeaderValue, Method},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::AppConfig;
use crate::domain::bill_document::BillRenderer;
use crate::domain::email_service::Mailer;
use crate::domain::sequence::RegOrder;
use crate::domain::{
    BillingService, ChildService, EmailService, PermissionService, RecordService, RegistrationService,
    ShiftService, TeamService, TentService,
};
use crate::io::bill_pdf::PdfBillRenderer;
use crate::io::mail::{LogMailer, SmtpMailer};
use crate::io::rest::auth::USER_ID_HEADER;
use crate::storage::repositories::{
    BillRepository, ChildRepository, PermissionRepository, RecordRepository, RegistrationRepository,
    ShiftRepository, TeamRepository, TentRepository,
};
use crate::storage::DbConnection;

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub registration_service: RegistrationService,
    pub record_service: RecordService,
    pub billing_service: BillingService,
    pub shift_service: ShiftService,
    pub team_service: TeamService,
    pub tent_service: TentService,
    pub permission_service: PermissionService,
}

impl AppState {
    /// Wire every service on top of one database connection
    pub fn new(
        db: DbConnection,
        config: &AppConfig,
        mailer: Arc<dyn Mailer>,
        renderer: Arc<dyn BillRenderer>,
        reg_order: Arc<RegOrder>,
    ) -> Self {
        let registrations = RegistrationRepository::new(db.clone());
        let records = RecordRepository::new(db.clone());
        let shifts = ShiftRepository::new(db.clone());
        let teams = TeamRepository::new(db.clone());
        let prices = Arc::new(config.pricing.clone());

        let email_service = EmailService::new(mailer, config.shifts.clone());
        let permission_service = PermissionService::new(PermissionRepository::new(db.clone()));
        let record_service =
            RecordService::new(records.clone(), registrations.clone(), shifts.clone(), teams.clone());

        let registration_service = RegistrationService::new(
            registrations.clone(),
            ChildService::new(ChildRepository::new(db.clone())),
            record_service.clone(),
            permission_service.clone(),
            email_service.clone(),
            prices.clone(),
            reg_order,
            config.registration.max_entries,
        );
        let billing_service = BillingService::new(
            registrations.clone(),
            BillRepository::new(db.clone()),
            shifts.clone(),
            renderer,
            email_service,
            prices,
            config.billing.clone(),
        );

        Self {
            registration_service,
            record_service,
            billing_service,
            shift_service: ShiftService::new(shifts, registrations),
            team_service: TeamService::new(teams),
            tent_service: TentService::new(TentRepository::new(db), records),
            permission_service,
        }
    }
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    info!("Setting up database at {}", config.database_url);
    let db = DbConnection::new(&config.database_url).await?;

    let mailer: Arc<dyn Mailer> = if config.mail.is_enabled() {
        info!("📧 Sending mail through {}:{}", config.mail.smtp_server, config.mail.smtp_port);
        Arc::new(SmtpMailer::new(&config.mail)?)
    } else {
        info!("📧 No SMTP server configured, outgoing mail is only logged");
        Arc::new(LogMailer)
    };
    let renderer = Arc::new(PdfBillRenderer::new(config.bills_dir.clone())?);
    let reg_order = Arc::new(RegOrder::seeded_from(&RegistrationRepository::new(db.clone())).await?);

    info!("Setting up domain model");
    let app_state = AppState::new(db, config, mailer, renderer, reg_order);

    app_state.permission_service.ensure_catalogue().await?;
    app_state.shift_service.seed_shifts(&config.shifts).await?;
    info!("Seeded {} shifts from configuration", config.shifts.len());

    Ok(app_state)
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, cors_origin: Option<&str>) -> Result<Router> {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(USER_ID_HEADER)]);
    let cors = match cors_origin {
        Some(origin) => cors.allow_origin(
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin '{}'", origin))?,
        ),
        None => cors.allow_origin(Any),
    };

    Ok(Router::new()
        .nest("/api", io::rest::api_router())
        .layer(cors)
        .with_state(app_state))
}
