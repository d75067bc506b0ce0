use chrono::{Datelike, NaiveDate, Utc};

/// Full years between `birthday` and `date`
pub fn age_at(birthday: NaiveDate, date: NaiveDate) -> i32 {
    let mut age = date.year() - birthday.year();
    if (date.month(), date.day()) < (birthday.month(), birthday.day()) {
        age -= 1;
    }
    age
}

pub fn current_year() -> i32 {
    Utc::now().year()
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
