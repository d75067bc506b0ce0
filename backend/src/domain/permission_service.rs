use tracing::{debug, info, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::permission::{Permission, PermissionScope, PermissionSet, ShiftStaffMember, StaffRole};
use crate::storage::repositories::PermissionRepository;

/// Answers "may this user do that on this shift" for the rest of the domain
#[derive(Clone)]
pub struct PermissionService {
    repository: PermissionRepository,
}

impl PermissionService {
    pub fn new(repository: PermissionRepository) -> Self {
        Self { repository }
    }

    /// Make sure every known role and permission name has a row
    pub async fn ensure_catalogue(&self) -> DomainResult<()> {
        for role in StaffRole::MEMBER_ROLES {
            self.repository.ensure_role(role.name()).await?;
        }
        for permission in Permission::ALL {
            self.repository.ensure_permission(permission.name()).await?;
        }
        info!("Role and permission catalogue ready");
        Ok(())
    }

    /// Permissions of one scope the user holds on a shift.
    ///
    /// An empty set is the same as no access; callers must not tell the
    /// requester whether the shift or the role was missing.
    pub async fn shift_permissions(
        &self,
        user_id: i64,
        shift_nr: i32,
        scope: PermissionScope,
    ) -> DomainResult<PermissionSet> {
        let names = self
            .repository
            .shift_permission_names(user_id, shift_nr, scope.prefix())
            .await?;

        let mut set = PermissionSet::new();
        for name in names {
            match Permission::from_name(&name) {
                Some(permission) => set.insert(permission),
                None => warn!(user_id, shift_nr, permission = %name, "Ignoring unknown permission name"),
            }
        }

        debug!(user_id, shift_nr, ?set, "Resolved shift permissions");
        Ok(set)
    }

    /// Root, or any staff role on the shift
    pub async fn is_shift_member(&self, user_id: i64, shift_nr: i32) -> DomainResult<bool> {
        if self.repository.is_root(user_id).await? {
            return Ok(true);
        }
        let roles = StaffRole::MEMBER_ROLES.map(|r| r.name());
        Ok(self.repository.has_role_on_shift(user_id, shift_nr, &roles).await?)
    }

    /// Root, or the boss role on the shift
    pub async fn is_shift_boss(&self, user_id: i64, shift_nr: i32) -> DomainResult<bool> {
        if self.repository.is_root(user_id).await? {
            return Ok(true);
        }
        Ok(self
            .repository
            .has_role_on_shift(user_id, shift_nr, &[StaffRole::Boss.name()])
            .await?)
    }

    /// Root, or boss of at least one shift
    pub async fn is_user_boss(&self, user_id: i64) -> DomainResult<bool> {
        if self.repository.is_root(user_id).await? {
            return Ok(true);
        }
        Ok(self.repository.has_role_anywhere(user_id, StaffRole::Boss.name()).await?)
    }

    pub async fn require_shift_member(&self, user_id: i64, shift_nr: i32) -> DomainResult<()> {
        if self.is_shift_member(user_id, shift_nr).await? {
            Ok(())
        } else {
            Err(DomainError::PermissionDenied(format!("user {} is not staff on shift {}", user_id, shift_nr)))
        }
    }

    pub async fn require_shift_boss(&self, user_id: i64, shift_nr: i32) -> DomainResult<()> {
        if self.is_shift_boss(user_id, shift_nr).await? {
            Ok(())
        } else {
            Err(DomainError::PermissionDenied(format!("user {} is not boss of shift {}", user_id, shift_nr)))
        }
    }

    /// Who holds which role on the shift; only the shift's boss may ask
    pub async fn shift_staff(&self, user_id: i64, shift_nr: i32) -> DomainResult<Vec<ShiftStaffMember>> {
        self.require_shift_boss(user_id, shift_nr).await?;
        Ok(self.repository.shift_staff(shift_nr).await?)
    }

    pub async fn require_user_boss(&self, user_id: i64) -> DomainResult<()> {
        if self.is_user_boss(user_id).await? {
            Ok(())
        } else {
            Err(DomainError::PermissionDenied(format!("user {} is not a boss", user_id)))
        }
    }
}
