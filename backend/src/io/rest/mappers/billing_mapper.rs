use crate::domain::models::bill::{BillCamper, BillGroup};
use shared::{BillGroupView, ChildBillView, ShiftBillingResponse};

/// Mapper from billing groups to the shift billing overview.
pub struct BillingMapper;

impl BillingMapper {
    pub fn to_child_dto(camper: BillCamper) -> ChildBillView {
        ChildBillView {
            child_name: camper.child_name,
            price_paid: camper.price_paid,
            price_to_pay: camper.price_to_pay,
            shift_nr: camper.shift_nr,
            bill_sent: camper.notif_sent,
        }
    }

    pub fn to_group_dto(group: BillGroup) -> BillGroupView {
        BillGroupView {
            name: group.contact_name,
            email: group.contact_email,
            bill_nr: group.bill_nr,
            records: group.campers.into_iter().map(Self::to_child_dto).collect(),
        }
    }

    pub fn to_shift_billing_response(groups: Vec<BillGroup>) -> ShiftBillingResponse {
        ShiftBillingResponse { records: groups.into_iter().map(Self::to_group_dto).collect() }
    }
}
