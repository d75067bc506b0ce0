//! Billing units and the contact groups they are issued for.

#[derive(Debug, Clone, PartialEq)]
pub struct Bill {
    pub id: i64,
    pub contact_name: String,
    pub bill_total: i64,
}

/// A registration as it takes part in billing
#[derive(Debug, Clone, PartialEq)]
pub struct BillCamper {
    pub registration_id: i64,
    pub child_name: String,
    pub shift_nr: i32,
    pub is_old: bool,
    pub is_registered: bool,
    pub price_to_pay: i64,
    pub price_paid: i64,
    pub notif_sent: bool,
    pub bill_id: Option<i64>,
    pub contact_name: String,
    pub contact_email: String,
}

/// All campers billed to one contact e-mail
#[derive(Debug, Clone, PartialEq)]
pub struct BillGroup {
    pub contact_name: String,
    pub contact_email: String,
    pub bill_nr: Option<i64>,
    pub campers: Vec<BillCamper>,
}

impl BillGroup {
    /// Sum of `price_to_pay` across the group
    pub fn total(&self) -> i64 {
        self.campers.iter().map(|c| c.price_to_pay).sum()
    }
}

/// A contact's registrations split by approval status
#[derive(Debug, Clone, PartialEq)]
pub struct ContactCampers {
    pub contact_name: String,
    pub contact_email: String,
    pub bill_nr: Option<i64>,
    pub registered: Vec<BillCamper>,
    pub reserve: Vec<BillCamper>,
}
