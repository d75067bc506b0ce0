use shared::Sex;

/// A child's attendance entry for one shift in one year
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: i64,
    pub child_id: i64,
    pub shift_nr: i32,
    pub year: i32,
    pub is_active: bool,
    pub tent_nr: Option<i32>,
    pub team_id: Option<i64>,
    pub is_present: bool,
    pub age_at_camp: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordDetails {
    pub record: Record,
    pub child_name: String,
    pub child_sex: Sex,
    pub team_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    pub child_id: i64,
    pub shift_nr: i32,
    pub year: i32,
    pub is_active: bool,
    pub age_at_camp: i32,
}

/// Minimal record state used by the shift reconciliation
#[derive(Debug, Clone, PartialEq)]
pub struct RecordStatus {
    pub id: i64,
    pub child_id: i64,
    pub is_active: bool,
}

/// `Some(None)` clears a tent or team assignment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordPatch {
    pub tent_nr: Option<Option<i32>>,
    pub team_id: Option<Option<i64>>,
    pub is_present: Option<bool>,
}

impl RecordPatch {
    pub fn is_empty(&self) -> bool {
        self.tent_nr.is_none() && self.team_id.is_none() && self.is_present.is_none()
    }
}
