use chrono::NaiveDate;
use shared::Sex;

/// One child's booking for one shift, joined with the child's name and sex
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub id: i64,
    pub reg_order: i64,
    pub reg_id: String,
    pub child_id: i64,
    pub child_name: String,
    pub child_sex: Sex,
    pub id_code: Option<String>,
    pub shift_nr: i32,
    pub is_old: bool,
    pub is_registered: bool,
    pub birthday: NaiveDate,
    pub price_to_pay: i64,
    pub price_paid: i64,
    pub shirt_size: String,
    pub addendum: Option<String>,
    pub road: String,
    pub city: String,
    pub county: String,
    pub country: String,
    pub contact_name: String,
    pub contact_number: String,
    pub contact_email: String,
    pub backup_tel: Option<String>,
    pub visible: bool,
    pub notif_sent: bool,
    pub bill_id: Option<i64>,
}

/// A fully resolved row ready for the batch insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewRegistration {
    pub child_id: i64,
    pub id_code: Option<String>,
    pub shift_nr: i32,
    pub is_old: bool,
    pub birthday: NaiveDate,
    pub price_to_pay: i64,
    pub shirt_size: String,
    pub addendum: Option<String>,
    pub road: String,
    pub city: String,
    pub county: String,
    pub country: String,
    pub contact_name: String,
    pub contact_number: String,
    pub contact_email: String,
    pub backup_tel: Option<String>,
    pub visible: bool,
}

/// Registration state needed to reconcile attendance records
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationStatus {
    pub child_id: i64,
    pub is_registered: bool,
    pub birthday: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistrationPatch {
    pub is_registered: Option<bool>,
    pub is_old: Option<bool>,
    pub price_paid: Option<i64>,
    pub price_to_pay: Option<i64>,
}

impl RegistrationPatch {
    pub fn is_empty(&self) -> bool {
        self.is_registered.is_none()
            && self.is_old.is_none()
            && self.price_paid.is_none()
            && self.price_to_pay.is_none()
    }

    pub fn touches_price(&self) -> bool {
        self.price_paid.is_some() || self.price_to_pay.is_some()
    }

    pub fn touches_status(&self) -> bool {
        self.is_registered.is_some() || self.is_old.is_some()
    }
}
