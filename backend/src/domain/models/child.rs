use shared::Sex;

/// A camper, shared by every registration that refers to them
#[derive(Debug, Clone, PartialEq)]
pub struct Child {
    pub id: i64,
    pub name: String,
    pub sex: Sex,
    pub birth_year: Option<i32>,
    pub id_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewChild {
    pub name: String,
    pub sex: Sex,
    pub birth_year: i32,
    pub id_code: Option<String>,
}

/// Result of resolving a registration entry to a child row
#[derive(Debug, Clone, PartialEq)]
pub struct ChildMatch {
    pub child: Child,
    /// `true` when the child existed before this registration
    pub known: bool,
}
