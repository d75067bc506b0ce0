//! Capabilities granted through shift-scoped roles.
//!
//! Permission names are stored as dotted strings (`registration.view.full`).
//! Inside the backend they are a closed set of [`Permission`] values, and the
//! "full view implies every partial view" rule lives in [`Permission::implies`]
//! instead of being re-derived from string prefixes at each call site.

use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Permission {
    RegistrationViewFull,
    RegistrationViewPersonalInfo,
    RegistrationViewPrice,
    RegistrationViewContact,
    RegistrationEditPrice,
    RegistrationEditIsRegistered,
}

impl Permission {
    pub const ALL: [Permission; 6] = [
        Permission::RegistrationViewFull,
        Permission::RegistrationViewPersonalInfo,
        Permission::RegistrationViewPrice,
        Permission::RegistrationViewContact,
        Permission::RegistrationEditPrice,
        Permission::RegistrationEditIsRegistered,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Permission::RegistrationViewFull => "registration.view.full",
            Permission::RegistrationViewPersonalInfo => "registration.view.personal-info",
            Permission::RegistrationViewPrice => "registration.view.price",
            Permission::RegistrationViewContact => "registration.view.contact",
            Permission::RegistrationEditPrice => "registration.edit.price",
            Permission::RegistrationEditIsRegistered => "registration.edit.isRegistered",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Whether holding `self` also grants `other`
    pub fn implies(&self, other: Permission) -> bool {
        if *self == other {
            return true;
        }
        matches!(
            (self, other),
            (
                Permission::RegistrationViewFull,
                Permission::RegistrationViewPersonalInfo
                    | Permission::RegistrationViewPrice
                    | Permission::RegistrationViewContact
            )
        )
    }

    pub fn scope(&self) -> PermissionScope {
        match self {
            Permission::RegistrationViewFull
            | Permission::RegistrationViewPersonalInfo
            | Permission::RegistrationViewPrice
            | Permission::RegistrationViewContact => PermissionScope::RegistrationView,
            Permission::RegistrationEditPrice | Permission::RegistrationEditIsRegistered => {
                PermissionScope::RegistrationEdit
            }
        }
    }
}

/// Families of permissions that are looked up together
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionScope {
    RegistrationView,
    RegistrationEdit,
}

impl PermissionScope {
    pub fn prefix(&self) -> &'static str {
        match self {
            PermissionScope::RegistrationView => "registration.view",
            PermissionScope::RegistrationEdit => "registration.edit",
        }
    }
}

/// Permissions a user holds on one shift
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, permission: Permission) {
        self.0.insert(permission);
    }

    /// An empty set means no access at all
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn grants(&self, permission: Permission) -> bool {
        self.0.iter().any(|held| held.implies(permission))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.0.iter()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Roles that make a user a member of a shift's staff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaffRole {
    Boss,
    Instructor,
    Helper,
}

impl StaffRole {
    pub const MEMBER_ROLES: [StaffRole; 3] = [StaffRole::Boss, StaffRole::Instructor, StaffRole::Helper];

    pub fn name(&self) -> &'static str {
        match self {
            StaffRole::Boss => "boss",
            StaffRole::Instructor => "instructor",
            StaffRole::Helper => "helper",
        }
    }
}

/// A user holding a role on a shift
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftStaffMember {
    pub user_id: i64,
    pub name: String,
    pub shift_nr: i32,
    pub role_name: String,
    pub role_id: i64,
}
