//! backend/src/io/rest/mappers/registration_mapper.rs

use crate::domain::commands::registrations::RegistrationEntry;
use crate::domain::models::permission::{Permission, PermissionSet};
use crate::domain::models::registration::{Registration, RegistrationPatch};
use crate::domain::registration_service::RegistrationListing;
use crate::storage::connection::format_date;
use shared::{
    ChildSummary, CreateRegistrationRequest, PatchRegistrationRequest, RegistrationListResponse, RegistrationView,
};

/// Mapper between registration DTOs and domain registration types.
pub struct RegistrationMapper;

fn required_text(value: String) -> String {
    value.trim().to_string()
}

/// Trimmed text, or `None` when nothing is left
fn optional_text(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl RegistrationMapper {
    pub fn to_entry(dto: CreateRegistrationRequest) -> RegistrationEntry {
        RegistrationEntry {
            name: required_text(dto.name),
            id_code: optional_text(dto.id_code),
            sex: dto.sex,
            dob: optional_text(dto.dob),
            addendum: optional_text(dto.addendum),
            shift_nr: dto.shift_nr,
            is_new: dto.is_new,
            shirt_size: required_text(dto.shirt_size),
            road: required_text(dto.road),
            city: required_text(dto.city),
            county: required_text(dto.county),
            country: required_text(dto.country),
            contact_name: required_text(dto.contact_name),
            contact_email: required_text(dto.contact_email),
            contact_number: required_text(dto.contact_number),
            backup_tel: optional_text(dto.backup_tel),
            send_email: dto.send_email.unwrap_or(false),
        }
    }

    /// Converts a registration, dropping every field group the viewer may not see.
    pub fn to_view(domain: Registration, permissions: &PermissionSet) -> RegistrationView {
        let personal = permissions.grants(Permission::RegistrationViewPersonalInfo);
        let price = permissions.grants(Permission::RegistrationViewPrice);
        let contact = permissions.grants(Permission::RegistrationViewContact);

        RegistrationView {
            id: domain.id,
            child_id: domain.child_id,
            child: ChildSummary { name: domain.child_name, sex: domain.child_sex },
            shift_nr: domain.shift_nr,
            is_registered: domain.is_registered,
            reg_order: domain.reg_order,
            is_old: domain.is_old,
            shirt_size: domain.shirt_size,
            birthday: personal.then(|| format_date(domain.birthday)),
            road: personal.then_some(domain.road),
            county: personal.then_some(domain.county),
            country: personal.then_some(domain.country),
            addendum: personal.then_some(domain.addendum),
            price_paid: price.then_some(domain.price_paid),
            price_to_pay: price.then_some(domain.price_to_pay),
            notif_sent: price.then_some(domain.notif_sent),
            bill_id: price.then_some(domain.bill_id),
            contact_name: contact.then_some(domain.contact_name),
            contact_number: contact.then_some(domain.contact_number),
            contact_email: contact.then_some(domain.contact_email),
            backup_tel: contact.then_some(domain.backup_tel),
        }
    }

    pub fn to_list_response(listing: RegistrationListing) -> RegistrationListResponse {
        let permissions = listing.permissions;
        RegistrationListResponse {
            registrations: listing
                .registrations
                .into_iter()
                .map(|registration| Self::to_view(registration, &permissions))
                .collect(),
        }
    }

    pub fn to_patch(dto: PatchRegistrationRequest) -> RegistrationPatch {
        RegistrationPatch {
            is_registered: dto.is_registered,
            is_old: dto.is_old,
            price_paid: dto.price_paid,
            price_to_pay: dto.price_to_pay,
        }
    }
}
