use chrono::Datelike;
use tracing::{info, warn};

use crate::domain::errors::DomainResult;
use crate::domain::identity::ResolvedIdentity;
use crate::domain::models::child::{ChildMatch, NewChild};
use crate::storage::repositories::ChildRepository;

/// Finds the child a registration entry refers to, creating it on first sight
#[derive(Clone)]
pub struct ChildService {
    repository: ChildRepository,
}

impl ChildService {
    pub fn new(repository: ChildRepository) -> Self {
        Self { repository }
    }

    /// Match by ID code, then by name and sex, else create.
    ///
    /// `name` must already be normalized. A known child whose stored name
    /// differs from the one supplied under the same ID code is renamed; a
    /// differing birth year is only logged.
    pub async fn resolve_child(
        &self,
        name: &str,
        identity: &ResolvedIdentity,
        id_code: Option<&str>,
    ) -> DomainResult<ChildMatch> {
        let birth_year = identity.birth_date.year();

        if let Some(code) = id_code {
            if let Some(mut child) = self.repository.find_by_id_code(code).await? {
                if child.name != name {
                    info!(child_id = child.id, old = %child.name, new = %name, "Renaming child to match latest registration");
                    self.repository.update_name(child.id, name).await?;
                    child.name = name.to_string();
                }
                warn_on_birth_year_mismatch(child.id, child.birth_year, birth_year);
                return Ok(ChildMatch { child, known: true });
            }
        }

        if let Some(child) = self.repository.find_by_name_and_sex(name, identity.sex).await? {
            warn_on_birth_year_mismatch(child.id, child.birth_year, birth_year);
            return Ok(ChildMatch { child, known: true });
        }

        let child = self
            .repository
            .insert_child(&NewChild {
                name: name.to_string(),
                sex: identity.sex,
                birth_year,
                id_code: id_code.map(str::to_string),
            })
            .await?;
        info!(child_id = child.id, "Created child {}", child.name);

        Ok(ChildMatch { child, known: false })
    }
}

fn warn_on_birth_year_mismatch(child_id: i64, stored: Option<i32>, computed: i32) {
    if let Some(stored) = stored {
        if stored != computed {
            warn!(child_id, stored, computed, "Birth year on file differs from registration");
        }
    }
}
