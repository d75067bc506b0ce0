use chrono::NaiveDate;
use serde::Deserialize;

/// A camp session and who leads it
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Shift {
    pub shift_nr: i32,
    pub start_date: NaiveDate,
    #[serde(default = "default_length_days")]
    pub length_days: i32,
    pub boss_name: Option<String>,
    pub boss_email: Option<String>,
    pub boss_phone: Option<String>,
}

fn default_length_days() -> i32 {
    12
}
