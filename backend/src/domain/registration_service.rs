use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::child_service::ChildService;
use crate::domain::commands::registrations::{BatchOutcome, RegistrationEntry};
use crate::domain::email_service::{EmailService, ReceiptLine};
use crate::domain::errors::{DomainError, DomainResult, FieldErrors};
use crate::domain::identity::{check_required_fields, normalize_name, resolve_identity, ResolvedIdentity};
use crate::domain::models::permission::{Permission, PermissionScope, PermissionSet};
use crate::domain::models::registration::{NewRegistration, Registration, RegistrationPatch};
use crate::domain::permission_service::PermissionService;
use crate::domain::pricing::PriceTable;
use crate::domain::record_service::RecordService;
use crate::domain::sequence::RegOrder;
use crate::storage::repositories::RegistrationRepository;

/// Registrations of a shift together with what the viewer may see of them
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationListing {
    pub registrations: Vec<Registration>,
    pub permissions: PermissionSet,
}

/// Accepts registration submissions and staff edits to them
#[derive(Clone)]
pub struct RegistrationService {
    registrations: RegistrationRepository,
    children: ChildService,
    records: RecordService,
    permissions: PermissionService,
    email: EmailService,
    prices: Arc<PriceTable>,
    reg_order: Arc<RegOrder>,
    max_entries: usize,
}

impl RegistrationService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registrations: RegistrationRepository,
        children: ChildService,
        records: RecordService,
        permissions: PermissionService,
        email: EmailService,
        prices: Arc<PriceTable>,
        reg_order: Arc<RegOrder>,
        max_entries: usize,
    ) -> Self {
        Self {
            registrations,
            children,
            records,
            permissions,
            email,
            prices,
            reg_order,
            max_entries,
        }
    }

    /// Draw an order number and persist the submission under it
    pub async fn submit_registrations(&self, entries: Vec<RegistrationEntry>) -> DomainResult<BatchOutcome> {
        self.check_batch_size(entries.len())?;
        let order_nr = self.reg_order.next_order();
        self.process_registration_batch(&entries, order_nr).await
    }

    /// Validate, resolve and store one submission.
    ///
    /// Every entry is validated before anything is written. Children are
    /// resolved one by one, then all registration rows go out in a single
    /// insert. Receipts are sent last and never fail the batch.
    pub async fn process_registration_batch(
        &self,
        entries: &[RegistrationEntry],
        order_nr: i64,
    ) -> DomainResult<BatchOutcome> {
        self.check_batch_size(entries.len())?;
        let identities = validate_entries(entries)?;

        let mut rows = Vec::with_capacity(entries.len());
        let mut receipts = Vec::new();

        for (entry, identity) in entries.iter().zip(identities) {
            let name = normalize_name(&entry.name);
            let matched = self
                .children
                .resolve_child(&name, &identity, entry.id_code.as_deref())
                .await?;
            let child_id = matched.child.id;

            let is_old = !entry.is_new;
            let price_to_pay = self.prices.price_or_fallback(entry.shift_nr, is_old);

            // Only rows already stored count; repeats inside this submission stay visible.
            let already_listed = matched.known
                && self.registrations.exists_for_child_shift(child_id, entry.shift_nr).await?;
            let visible = !already_listed;
            if !visible {
                info!(child_id, shift_nr = entry.shift_nr, "Hiding duplicate registration");
            }

            rows.push(NewRegistration {
                child_id,
                id_code: entry.id_code.clone(),
                shift_nr: entry.shift_nr,
                is_old,
                birthday: identity.birth_date,
                price_to_pay,
                shirt_size: entry.shirt_size.clone(),
                addendum: entry.addendum.clone(),
                road: entry.road.clone(),
                city: entry.city.clone(),
                county: entry.county.clone(),
                country: entry.country.clone(),
                contact_name: entry.contact_name.clone(),
                contact_number: entry.contact_number.clone(),
                contact_email: entry.contact_email.clone(),
                backup_tel: entry.backup_tel.clone(),
                visible,
            });

            if entry.send_email {
                receipts.push(ReceiptLine {
                    contact_email: entry.contact_email.clone(),
                    child_name: entry.name.clone(),
                    shift_nr: entry.shift_nr,
                });
            }
        }

        let registration_id = Uuid::new_v4().to_string();
        self.registrations
            .insert_batch(order_nr, &registration_id, &rows)
            .await
            .map_err(|e| {
                error!(order_nr, %registration_id, "Failed to store registrations: {:#}", e);
                DomainError::Persistence(e)
            })?;

        let hidden = rows.iter().filter(|r| !r.visible).count();
        info!(order_nr, %registration_id, created = rows.len(), hidden, "Stored registration batch");

        if !receipts.is_empty() {
            self.email.send_registration_receipts(&receipts).await;
        }

        Ok(BatchOutcome {
            registration_id,
            order_nr,
            created: rows.len(),
            hidden,
        })
    }

    /// A shift's registrations; an empty permission set yields an empty list
    pub async fn list_registrations(&self, user_id: i64, shift_nr: i32) -> DomainResult<RegistrationListing> {
        let permissions = self
            .permissions
            .shift_permissions(user_id, shift_nr, PermissionScope::RegistrationView)
            .await?;

        if permissions.is_empty() {
            return Ok(RegistrationListing { registrations: Vec::new(), permissions });
        }

        let registrations = self.registrations.list_for_shift(shift_nr).await?;
        Ok(RegistrationListing { registrations, permissions })
    }

    /// Apply a staff edit. Every refusal is reported as `PermissionDenied`
    /// and must reach the caller looking like a missing registration.
    pub async fn patch_registration(
        &self,
        user_id: i64,
        registration_id: i64,
        patch: &RegistrationPatch,
    ) -> DomainResult<()> {
        let registration = self
            .registrations
            .get_registration(registration_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("registration {}", registration_id)))?;

        let permissions = self
            .permissions
            .shift_permissions(user_id, registration.shift_nr, PermissionScope::RegistrationEdit)
            .await?;

        let denied = permissions.is_empty()
            || (patch.touches_price() && !permissions.grants(Permission::RegistrationEditPrice))
            || (patch.touches_status() && !permissions.grants(Permission::RegistrationEditIsRegistered));
        if denied {
            warn!(user_id, registration_id, ?patch, "Registration edit refused");
            return Err(DomainError::PermissionDenied(format!(
                "user {} may not edit registration {}",
                user_id, registration_id
            )));
        }

        self.registrations.update_registration(registration_id, patch).await?;
        info!(user_id, registration_id, ?patch, "Updated registration");

        if let Some(is_registered) = patch.is_registered {
            self.records
                .toggle_record(registration.child_id, registration.shift_nr, is_registered)
                .await?;
        }

        Ok(())
    }

    fn check_batch_size(&self, count: usize) -> DomainResult<()> {
        if count > self.max_entries {
            return Err(DomainError::validation(
                "registrations",
                format!("The number of entries must not exceed {}", self.max_entries),
            ));
        }
        Ok(())
    }
}

/// Resolve every entry's identity, collecting all field errors
fn validate_entries(entries: &[RegistrationEntry]) -> DomainResult<Vec<ResolvedIdentity>> {
    let mut errors = FieldErrors::new();
    let mut identities = Vec::with_capacity(entries.len());

    for (index, entry) in entries.iter().enumerate() {
        check_required_fields(index, entry, &mut errors);
        match resolve_identity(index, entry) {
            Ok(identity) => identities.push(identity),
            Err(entry_errors) => {
                for (field, message) in entry_errors.into_inner() {
                    errors.insert(field, message);
                }
            }
        }
    }

    errors.into_result()?;
    Ok(identities)
}
