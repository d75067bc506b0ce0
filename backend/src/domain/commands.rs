//! Domain-level command and result types.
//! The REST layer maps the public DTOs from the `shared` crate into these
//! before calling a service.

pub mod registrations {
    use shared::Sex;

    /// One child's entry in a submission, with text fields already trimmed
    #[derive(Debug, Clone, PartialEq)]
    pub struct RegistrationEntry {
        pub name: String,
        pub id_code: Option<String>,
        pub sex: Option<Sex>,
        pub dob: Option<String>,
        pub addendum: Option<String>,
        pub shift_nr: i32,
        pub is_new: bool,
        pub shirt_size: String,
        pub road: String,
        pub city: String,
        pub county: String,
        pub country: String,
        pub contact_name: String,
        pub contact_email: String,
        pub contact_number: String,
        pub backup_tel: Option<String>,
        pub send_email: bool,
    }

    /// What a persisted submission produced
    #[derive(Debug, Clone, PartialEq)]
    pub struct BatchOutcome {
        pub registration_id: String,
        pub order_nr: i64,
        pub created: usize,
        pub hidden: usize,
    }
}

pub mod records {
    /// Writes performed by one shift reconciliation
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct SyncReport {
        pub created: usize,
        pub activated: usize,
        pub deactivated: usize,
    }

    impl SyncReport {
        pub fn writes(&self) -> usize {
            self.created + self.activated + self.deactivated
        }
    }
}
