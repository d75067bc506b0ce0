pub mod bill;
pub mod child;
pub mod permission;
pub mod record;
pub mod registration;
pub mod shift;
