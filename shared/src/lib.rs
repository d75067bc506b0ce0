//! Request and response types exchanged between the camp backend and its clients.
//!
//! Every type here is a plain serde DTO. The backend maps them to and from its
//! own domain models, so these can evolve with the wire format independently.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Sex of a camper as stored on the child record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    M,
    F,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::M => "M",
            Sex::F => "F",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "M" => Some(Sex::M),
            "F" => Some(Sex::F),
            _ => None,
        }
    }
}

/// Deserializes a field that distinguishes "absent" from "explicitly null".
///
/// Use together with `#[serde(default)]`: absent -> `None`, null -> `Some(None)`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Uniform error body returned by every failing endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Registrations
// ---------------------------------------------------------------------------

/// One child's entry in a registration submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRegistrationRequest {
    pub name: String,
    /// 11-digit national ID code; takes priority over `sex` and `dob`
    pub id_code: Option<String>,
    pub sex: Option<Sex>,
    /// Birth date as `YYYY-MM-DD` or an RFC 3339 timestamp
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
    pub send_email: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRegistrationsResponse {
    pub registration_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildSummary {
    pub name: String,
    pub sex: Sex,
}

/// A registration as seen by a staff member.
///
/// Optional groups are only present when the caller holds the matching
/// view permission for the shift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationView {
    pub id: i64,
    pub child_id: i64,
    pub child: ChildSummary,
    pub shift_nr: i32,
    pub is_registered: bool,
    pub reg_order: i64,
    pub is_old: bool,
    pub shirt_size: String,
    // personal info
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub road: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addendum: Option<Option<String>>,
    // financial
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_paid: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_to_pay: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notif_sent: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bill_id: Option<Option<i64>>,
    // contact
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_tel: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationListResponse {
    pub registrations: Vec<RegistrationView>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PatchRegistrationRequest {
    pub is_registered: Option<bool>,
    pub is_old: Option<bool>,
    pub price_paid: Option<i64>,
    pub price_to_pay: Option<i64>,
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForceSyncRequest {
    pub shift_nr: i32,
    /// Must be `true`; makes the intent to rewrite records explicit
    pub force_sync: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordView {
    pub id: i64,
    pub child_id: i64,
    pub child_name: String,
    pub child_sex: Sex,
    pub shift_nr: i32,
    pub year: i32,
    pub tent_nr: Option<i32>,
    pub team_id: Option<i64>,
    pub team_name: Option<String>,
    pub is_present: bool,
    pub age_at_camp: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordListResponse {
    pub records: Vec<RecordView>,
}

/// Partial update of a record; `null` clears the tent or team assignment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PatchRecordRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub tent_nr: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub team_id: Option<Option<i64>>,
    pub is_present: Option<bool>,
}

// ---------------------------------------------------------------------------
// Bills
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillContactRequest {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBillResponse {
    pub bill_nr: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildBillView {
    pub child_name: String,
    pub price_paid: i64,
    pub price_to_pay: i64,
    pub shift_nr: i32,
    pub bill_sent: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillGroupView {
    pub name: String,
    pub email: String,
    pub bill_nr: Option<i64>,
    pub records: Vec<ChildBillView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftBillingResponse {
    pub records: Vec<BillGroupView>,
}

// ---------------------------------------------------------------------------
// Shifts, teams and tents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftListResponse {
    pub shifts: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftEmailsResponse {
    pub emails: Vec<String>,
}

/// A staff member's role assignment on a shift
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftUser {
    pub user_id: i64,
    pub name: String,
    pub shift_nr: i32,
    pub role: String,
    pub role_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftUsersResponse {
    pub users: Vec<ShiftUser>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: i64,
    pub shift_nr: i32,
    pub name: String,
    pub year: i32,
    pub place: Option<i32>,
    pub captain_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamListResponse {
    pub teams: Vec<Team>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamRequest {
    pub shift_nr: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TentScore {
    pub id: i64,
    pub score: i32,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TentInfo {
    pub campers: Vec<String>,
    pub scores: Vec<TentScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddTentScoreRequest {
    pub score: i32,
}
