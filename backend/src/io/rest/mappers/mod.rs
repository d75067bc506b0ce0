pub mod billing_mapper;
pub mod record_mapper;
pub mod registration_mapper;
