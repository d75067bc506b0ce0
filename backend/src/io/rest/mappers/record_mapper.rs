use crate::domain::models::record::{RecordDetails, RecordPatch};
use shared::{PatchRecordRequest, RecordListResponse, RecordView};

/// Mapper between record DTOs and domain records.
pub struct RecordMapper;

impl RecordMapper {
    pub fn to_dto(domain: RecordDetails) -> RecordView {
        let record = domain.record;
        RecordView {
            id: record.id,
            child_id: record.child_id,
            child_name: domain.child_name,
            child_sex: domain.child_sex,
            shift_nr: record.shift_nr,
            year: record.year,
            tent_nr: record.tent_nr,
            team_id: record.team_id,
            team_name: domain.team_name,
            is_present: record.is_present,
            age_at_camp: record.age_at_camp,
        }
    }

    pub fn to_list_response(records: Vec<RecordDetails>) -> RecordListResponse {
        RecordListResponse { records: records.into_iter().map(Self::to_dto).collect() }
    }

    pub fn to_patch(dto: PatchRecordRequest) -> RecordPatch {
        RecordPatch { tent_nr: dto.tent_nr, team_id: dto.team_id, is_present: dto.is_present }
    }
}
