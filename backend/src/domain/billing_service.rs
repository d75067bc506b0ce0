use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::domain::age::today;
use crate::domain::bill_document::{BillDocument, BillRenderer, BillingTerms};
use crate::domain::email_service::EmailService;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::bill::{BillCamper, BillGroup, ContactCampers};
use crate::domain::pricing::PriceTable;
use crate::storage::repositories::{BillRepository, RegistrationRepository, ShiftRepository};

/// Group campers by contact e-mail, keeping first-seen order.
///
/// A group's bill number is the first non-null bill id among its members.
pub fn group_by_contact(campers: Vec<BillCamper>) -> Vec<BillGroup> {
    let mut groups: Vec<BillGroup> = Vec::new();
    for camper in campers {
        let idx = match groups.iter().position(|g| g.contact_email == camper.contact_email) {
            Some(idx) => idx,
            None => {
                groups.push(BillGroup {
                    contact_name: camper.contact_name.clone(),
                    contact_email: camper.contact_email.clone(),
                    bill_nr: None,
                    campers: Vec::new(),
                });
                groups.len() - 1
            }
        };
        let group = &mut groups[idx];
        if group.bill_nr.is_none() {
            group.bill_nr = camper.bill_id;
        }
        group.campers.push(camper);
    }
    groups
}

/// Issues bills for contact groups and renders their documents
#[derive(Clone)]
pub struct BillingService {
    registrations: RegistrationRepository,
    bills: BillRepository,
    shifts: ShiftRepository,
    renderer: Arc<dyn BillRenderer>,
    email: EmailService,
    prices: Arc<PriceTable>,
    terms: BillingTerms,
}

impl BillingService {
    pub fn new(
        registrations: RegistrationRepository,
        bills: BillRepository,
        shifts: ShiftRepository,
        renderer: Arc<dyn BillRenderer>,
        email: EmailService,
        prices: Arc<PriceTable>,
        terms: BillingTerms,
    ) -> Self {
        Self { registrations, bills, shifts, renderer, email, prices, terms }
    }

    /// Everything filed under a contact e-mail, split into registered and reserve campers
    pub async fn contact_campers(&self, email: &str) -> DomainResult<ContactCampers> {
        let campers = self.registrations.campers_for_contact(email).await?;
        let first = campers
            .first()
            .ok_or_else(|| DomainError::NotFound(format!("registrations for {}", email)))?;

        let contact_name = first.contact_name.clone();
        let contact_email = first.contact_email.clone();
        let bill_nr = campers.iter().find_map(|c| c.bill_id);
        let (registered, reserve) = campers.into_iter().partition(|c| c.is_registered);

        Ok(ContactCampers { contact_name, contact_email, bill_nr, registered, reserve })
    }

    /// Create the bill unless the group already has one, then render it.
    ///
    /// With `existing_bill_nr` set nothing is written to the database; only
    /// the document is regenerated. Campers that already carry a bill id are
    /// never re-linked. A rendering failure leaves the bill and links in place.
    pub async fn create_and_assign_bill(
        &self,
        existing_bill_nr: Option<i64>,
        bill_total: i64,
        registered_campers: &[BillCamper],
    ) -> DomainResult<i64> {
        let (bill_nr, _) = self.issue_bill(existing_bill_nr, bill_total, registered_campers).await?;
        Ok(bill_nr)
    }

    /// Bill a contact's registered campers
    pub async fn create_bill_for_contact(&self, email: &str) -> DomainResult<i64> {
        let contact = self.registered_contact(email).await?;
        let total = contact.registered.iter().map(|c| c.price_to_pay).sum();
        self.create_and_assign_bill(contact.bill_nr, total, &contact.registered).await
    }

    /// Bill a contact, mail the bill and mark the billed registrations as notified
    pub async fn send_bill(&self, email: &str) -> DomainResult<i64> {
        let contact = self.registered_contact(email).await?;
        let total = contact.registered.iter().map(|c| c.price_to_pay).sum();
        let (bill_nr, path) = self.issue_bill(contact.bill_nr, total, &contact.registered).await?;

        self.email.send_bill(&contact, bill_nr, path).await?;

        let ids: Vec<i64> = contact.registered.iter().map(|c| c.registration_id).collect();
        self.registrations.mark_notified(&ids).await?;
        info!(bill_nr, email, notified = ids.len(), "Bill delivered");
        Ok(bill_nr)
    }

    /// Stored document bytes of an issued bill
    pub async fn bill_document(&self, bill_nr: i64) -> DomainResult<Vec<u8>> {
        if self.bills.get_bill(bill_nr).await?.is_none() {
            return Err(DomainError::NotFound(format!("bill {}", bill_nr)));
        }

        let path = self.renderer.document_path(bill_nr);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(bill_nr, path = %path.display(), "Bill document missing on disk");
                Err(DomainError::NotFound(format!("bill document {}", bill_nr)))
            }
            Err(e) => Err(DomainError::Document(e.into())),
        }
    }

    /// Bill groups of a shift's registered campers.
    ///
    /// Once a group's bill number is known, campers of other shifts on the
    /// same bill are appended to it. They do not take part in finding the
    /// bill number.
    pub async fn shift_billing(&self, shift_nr: i32) -> DomainResult<Vec<BillGroup>> {
        let campers = self.registrations.registered_campers_for_shift(shift_nr).await?;
        let mut groups = group_by_contact(campers);

        for group in groups.iter_mut() {
            let Some(bill_nr) = group.bill_nr else { continue };
            let addendum = self.registrations.campers_for_bill(bill_nr).await?;
            group
                .campers
                .extend(addendum.into_iter().filter(|c| c.shift_nr != shift_nr));
        }

        Ok(groups)
    }

    async fn registered_contact(&self, email: &str) -> DomainResult<ContactCampers> {
        let contact = self.contact_campers(email).await?;
        if contact.registered.is_empty() {
            return Err(DomainError::NotFound(format!("registered campers for {}", email)));
        }
        Ok(contact)
    }

    async fn issue_bill(
        &self,
        existing_bill_nr: Option<i64>,
        bill_total: i64,
        campers: &[BillCamper],
    ) -> DomainResult<(i64, PathBuf)> {
        let first = campers
            .first()
            .ok_or_else(|| DomainError::NotFound("campers to bill".to_string()))?;

        let bill_nr = match existing_bill_nr {
            Some(bill_nr) => {
                info!(bill_nr, "Group already billed, regenerating document");
                bill_nr
            }
            None => {
                let bill_nr = self.bills.insert_bill(&first.contact_name, bill_total).await?;
                let unbilled: Vec<i64> = campers
                    .iter()
                    .filter(|c| c.bill_id.is_none())
                    .map(|c| c.registration_id)
                    .collect();
                let linked = self.registrations.assign_bill(bill_nr, &unbilled).await?;
                info!(bill_nr, bill_total, linked, "Created bill");
                bill_nr
            }
        };

        let document = self.compose_document(bill_nr, campers).await?;
        let path = self.renderer.render(&document).await.map_err(|e| {
            error!(bill_nr, "Failed to render bill: {:#}", e);
            DomainError::Document(e)
        })?;

        Ok((bill_nr, path))
    }

    async fn compose_document(&self, bill_nr: i64, campers: &[BillCamper]) -> DomainResult<BillDocument> {
        let first_shift_start = match campers.iter().map(|c| c.shift_nr).min() {
            Some(shift_nr) => {
                let shift = self.shifts.get_shift(shift_nr).await?;
                if shift.is_none() {
                    warn!(bill_nr, shift_nr, "No calendar entry for shift, printing a single deadline");
                }
                shift.map(|s| s.start_date)
            }
            None => None,
        };

        Ok(BillDocument::compose(
            bill_nr,
            campers,
            &self.prices,
            &self.terms,
            first_shift_start,
            today(),
        ))
    }
}
