//! National ID code parsing and registration identity resolution.
//!
//! Only codes for children born this century are accepted: the first digit
//! must be `5` (male) or `6` (female) and digits 2-7 hold `YYMMDD` with the
//! year taken as `2000 + YY`. The trailing checksum digit is intentionally
//! not verified since some legitimately issued codes fail it.

use chrono::{DateTime, NaiveDate};
use shared::Sex;
use thiserror::Error;

use crate::domain::commands::registrations::RegistrationEntry;
use crate::domain::errors::FieldErrors;

pub const REQUIRED: &str = "property is required";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IdCodeError {
    #[error("ID code must be 11 digits long")]
    Length,
    #[error("Child's ID code must start with 5 or 6")]
    Century,
    #[error("ID code does not contain a valid date of birth")]
    BirthDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub sex: Sex,
    pub birth_date: NaiveDate,
}

pub fn parse_id_code(code: &str) -> Result<ResolvedIdentity, IdCodeError> {
    if code.len() != 11 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(IdCodeError::Length);
    }

    let sex = match &code[0..1] {
        "5" => Sex::M,
        "6" => Sex::F,
        _ => return Err(IdCodeError::Century),
    };

    let digits = |range: std::ops::Range<usize>| code[range].parse::<u32>().map_err(|_| IdCodeError::BirthDate);
    let year = 2000 + digits(1..3)? as i32;
    let month = digits(3..5)?;
    let day = digits(5..7)?;

    let birth_date = NaiveDate::from_ymd_opt(year, month, day).ok_or(IdCodeError::BirthDate)?;

    Ok(ResolvedIdentity { sex, birth_date })
}

/// Trim and collapse inner whitespace runs to single spaces
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Accepts a calendar date (`2012-05-17`) or an RFC 3339 timestamp
pub fn parse_birth_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

/// Resolve sex and birth date for the entry at `index`.
///
/// An ID code wins over explicitly supplied sex and birth date. Errors are
/// keyed by the entry index so a whole submission can be reported at once.
pub fn resolve_identity(index: usize, entry: &RegistrationEntry) -> Result<ResolvedIdentity, FieldErrors> {
    let mut errors = FieldErrors::new();

    if let Some(code) = entry.id_code.as_deref() {
        return parse_id_code(code).map_err(|e| FieldErrors::single(format!("[{}].idCode", index), e.to_string()));
    }

    if entry.sex.is_none() {
        errors.insert(format!("[{}].sex", index), REQUIRED);
    }

    let birth_date = match entry.dob.as_deref() {
        None => {
            errors.insert(format!("[{}].dob", index), REQUIRED);
            None
        }
        Some(raw) => {
            let parsed = parse_birth_date(raw);
            if parsed.is_none() {
                errors.insert(format!("[{}].dob", index), "must be a valid date");
            }
            parsed
        }
    };

    match (entry.sex, birth_date) {
        (Some(sex), Some(birth_date)) if errors.is_empty() => Ok(ResolvedIdentity { sex, birth_date }),
        _ => Err(errors),
    }
}

/// Required free-text fields of an entry that must not be blank
pub fn check_required_fields(index: usize, entry: &RegistrationEntry, errors: &mut FieldErrors) {
    let required = [
        ("name", entry.name.as_str()),
        ("shirtSize", entry.shirt_size.as_str()),
        ("road", entry.road.as_str()),
        ("city", entry.city.as_str()),
        ("county", entry.county.as_str()),
        ("country", entry.country.as_str()),
        ("contactName", entry.contact_name.as_str()),
        ("contactEmail", entry.contact_email.as_str()),
        ("contactNumber", entry.contact_number.as_str()),
    ];

    for (field, value) in required {
        if value.trim().is_empty() {
            errors.insert(format!("[{}].{}", index, field), REQUIRED);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sample_entry;

    #[test]
    fn test_first_digit_decides_sex() {
        let boy = parse_id_code("50001010006").unwrap();
        assert_eq!(boy.sex, Sex::M);
        assert_eq!(boy.birth_date, NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());

        let girl = parse_id_code("61205170001").unwrap();
        assert_eq!(girl.sex, Sex::F);
        assert_eq!(girl.birth_date, NaiveDate::from_ymd_opt(2012, 5, 17).unwrap());
    }

    #[test]
    fn test_rejects_malformed_codes() {
        assert_eq!(parse_id_code("5000101000"), Err(IdCodeError::Length));
        assert_eq!(parse_id_code("5000101000a"), Err(IdCodeError::Length));
        assert_eq!(parse_id_code("39001010006"), Err(IdCodeError::Century));
        assert_eq!(parse_id_code("50013010006"), Err(IdCodeError::BirthDate));
        assert_eq!(parse_id_code("50004310006"), Err(IdCodeError::BirthDate));
        assert_eq!(parse_id_code("50000010006"), Err(IdCodeError::BirthDate));
    }

    #[test]
    fn test_leap_days_follow_the_calendar() {
        assert!(parse_id_code("61202290001").is_ok());
        assert_eq!(parse_id_code("61302290001"), Err(IdCodeError::BirthDate));
    }

    #[test]
    fn test_checksum_is_not_verified() {
        // Same birth data, every possible last digit.
        for last in 0..10 {
            assert!(parse_id_code(&format!("5100612000{}", last)).is_ok());
        }
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Mari   Liis\tMaasikas "), "Mari Liis Maasikas");
        assert_eq!(normalize_name(""), "");
    }

    #[test]
    fn test_parse_birth_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2013, 7, 4).unwrap();
        assert_eq!(parse_birth_date("2013-07-04"), Some(expected));
        assert_eq!(parse_birth_date("2013-07-04T00:00:00Z"), Some(expected));
        assert_eq!(parse_birth_date("04.07.2013"), None);
    }

    #[test]
    fn test_id_code_overrides_explicit_values() {
        let mut entry = sample_entry("Jaan Tamm", 2);
        entry.id_code = Some("50001010006".to_string());
        entry.sex = Some(Sex::F);
        entry.dob = Some("2010-10-10".to_string());

        let resolved = resolve_identity(0, &entry).unwrap();
        assert_eq!(resolved.sex, Sex::M);
        assert_eq!(resolved.birth_date, NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
    }

    #[test]
    fn test_missing_sex_and_dob_are_reported_per_field() {
        let mut entry = sample_entry("Jaan Tamm", 2);
        entry.id_code = None;
        entry.sex = None;
        entry.dob = None;

        let errors = resolve_identity(3, &entry).unwrap_err();
        assert_eq!(errors.get("[3].sex"), Some(REQUIRED));
        assert_eq!(errors.get("[3].dob"), Some(REQUIRED));
    }

    #[test]
    fn test_bad_id_code_is_keyed_by_index() {
        let mut entry = sample_entry("Jaan Tamm", 2);
        entry.id_code = Some("123".to_string());

        let errors = resolve_identity(1, &entry).unwrap_err();
        assert_eq!(errors.get("[1].idCode"), Some("ID code must be 11 digits long"));
    }

    #[test]
    fn test_blank_required_fields() {
        let mut entry = sample_entry("Jaan Tamm", 2);
        entry.contact_email = "  ".to_string();
        let mut errors = FieldErrors::new();

        check_required_fields(0, &entry, &mut errors);
        assert_eq!(errors.get("[0].contactEmail"), Some(REQUIRED));
        assert_eq!(errors.get("[0].name"), None);
    }
}
