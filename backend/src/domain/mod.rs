pub mod age;
pub mod bill_document;
pub mod billing_service;
pub mod child_service;
pub mod commands;
pub mod email_service;
pub mod errors;
pub mod identity;
pub mod models;
pub mod permission_service;
pub mod pricing;
pub mod record_service;
pub mod registration_service;
pub mod sequence;
pub mod shift_service;
pub mod team_service;
pub mod tent_service;

pub use billing_service::BillingService;
pub use child_service::ChildService;
pub use email_service::EmailService;
pub use permission_service::PermissionService;
pub use record_service::RecordService;
pub use registration_service::RegistrationService;
pub use shift_service::ShiftService;
pub use team_service::TeamService;
pub use tent_service::TentService;
