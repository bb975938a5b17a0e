//! Pending service / case-study mutations submitted as one batch.
//!
//! Clients stage edits against entities that may not exist yet and
//! refer to them by a placeholder key. A batch is planned into phases
//! (service creates first, then everything that may depend on them) and
//! placeholders are resolved to persisted ids between phases, so the
//! storage tier only ever sees real ids.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PitchError, PitchResult};
use crate::models::case_study::{CaseStudyFields, UpdateCaseStudy};

/// Reference to a service or case study inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityRef {
    /// Key assigned by the client to an entity created in the same batch.
    Placeholder(String),
    Persisted(Uuid),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PendingMutation {
    CreateService {
        key: String,
        client_service_name: String,
    },
    RenameService {
        service: EntityRef,
        client_service_name: String,
    },
    DeleteService {
        service: EntityRef,
    },
    CreateCaseStudy {
        key: String,
        service: EntityRef,
        fields: CaseStudyFields,
    },
    UpdateCaseStudy {
        case_study: EntityRef,
        changes: UpdateCaseStudy,
    },
    DeleteCaseStudy {
        case_study: EntityRef,
    },
}

impl PendingMutation {
    /// Execution phase; lower runs first.
    fn phase(&self) -> u8 {
        match self {
            Self::CreateService { .. } => 0,
            Self::RenameService { .. } => 1,
            Self::CreateCaseStudy { .. } => 2,
            Self::UpdateCaseStudy { .. } => 3,
            Self::DeleteCaseStudy { .. } => 4,
            Self::DeleteService { .. } => 5,
        }
    }
}

/// Placeholder → persisted id mappings discovered while applying a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceholderMap {
    pub services: HashMap<String, Uuid>,
    pub case_studies: HashMap<String, Uuid>,
}

impl PlaceholderMap {
    pub fn resolve_service(&self, r: &EntityRef) -> PitchResult<Uuid> {
        resolve(r, &self.services, "service")
    }

    pub fn resolve_case_study(&self, r: &EntityRef) -> PitchResult<Uuid> {
        resolve(r, &self.case_studies, "case study")
    }
}

fn resolve(r: &EntityRef, map: &HashMap<String, Uuid>, what: &str) -> PitchResult<Uuid> {
    match r {
        EntityRef::Persisted(id) => Ok(*id),
        EntityRef::Placeholder(key) => map.get(key).copied().ok_or_else(|| {
            PitchError::validation(format!("unresolved {what} placeholder '{key}'"))
        }),
    }
}

/// A validated batch, sorted into execution order.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchPlan {
    steps: Vec<PendingMutation>,
}

impl BatchPlan {
    pub fn steps(&self) -> &[PendingMutation] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<PendingMutation> {
        self.steps
    }
}

/// Check placeholder keys and order the batch.
///
/// Placeholder keys must be unique per entity kind, and every
/// placeholder reference must name an entity created in the same batch.
/// The sort is stable, so mutations within a phase keep client order.
pub fn plan(mutations: Vec<PendingMutation>) -> PitchResult<BatchPlan> {
    let mut service_keys = HashSet::new();
    let mut case_keys = HashSet::new();

    for m in &mutations {
        match m {
            PendingMutation::CreateService { key, .. } => {
                if !service_keys.insert(key.as_str()) {
                    return Err(PitchError::validation(format!(
                        "duplicate service placeholder '{key}'"
                    )));
                }
            }
            PendingMutation::CreateCaseStudy { key, .. } => {
                if !case_keys.insert(key.as_str()) {
                    return Err(PitchError::validation(format!(
                        "duplicate case study placeholder '{key}'"
                    )));
                }
            }
            _ => {}
        }
    }

    for m in &mutations {
        let (reference, known, what) = match m {
            PendingMutation::RenameService { service, .. }
            | PendingMutation::DeleteService { service }
            | PendingMutation::CreateCaseStudy { service, .. } => (service, &service_keys, "service"),
            PendingMutation::UpdateCaseStudy { case_study, .. }
            | PendingMutation::DeleteCaseStudy { case_study } => {
                (case_study, &case_keys, "case study")
            }
            PendingMutation::CreateService { .. } => continue,
        };
        if let EntityRef::Placeholder(key) = reference {
            if !known.contains(key.as_str()) {
                return Err(PitchError::validation(format!(
                    "{what} placeholder '{key}' is not created in this batch"
                )));
            }
        }
    }

    let mut steps = mutations;
    steps.sort_by_key(PendingMutation::phase);
    Ok(BatchPlan { steps })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_service(key: &str) -> PendingMutation {
        PendingMutation::CreateService {
            key: key.into(),
            client_service_name: format!("service {key}"),
        }
    }

    fn create_case(key: &str, service: EntityRef) -> PendingMutation {
        PendingMutation::CreateCaseStudy {
            key: key.into(),
            service,
            fields: CaseStudyFields {
                case_name: format!("case {key}"),
                ..Default::default()
            },
        }
    }

    #[test]
    fn service_creates_run_before_dependent_case_studies() {
        let batch = vec![
            create_case("c1", EntityRef::Placeholder("s1".into())),
            PendingMutation::DeleteService {
                service: EntityRef::Persisted(Uuid::new_v4()),
            },
            create_service("s1"),
        ];
        let plan = plan(batch).unwrap();
        let phases: Vec<u8> = plan.steps().iter().map(PendingMutation::phase).collect();
        assert_eq!(phases, vec![0, 2, 5]);
    }

    #[test]
    fn dangling_placeholder_is_rejected() {
        let batch = vec![create_case("c1", EntityRef::Placeholder("ghost".into()))];
        let err = plan(batch).unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let batch = vec![create_service("s1"), create_service("s1")];
        assert!(plan(batch).is_err());
    }

    #[test]
    fn resolve_uses_map_for_placeholders() {
        let id = Uuid::new_v4();
        let mut map = PlaceholderMap::default();
        map.services.insert("s1".into(), id);

        assert_eq!(
            map.resolve_service(&EntityRef::Placeholder("s1".into())).unwrap(),
            id
        );
        let persisted = Uuid::new_v4();
        assert_eq!(
            map.resolve_service(&EntityRef::Persisted(persisted)).unwrap(),
            persisted
        );
        assert!(map
            .resolve_case_study(&EntityRef::Placeholder("s1".into()))
            .is_err());
    }

    #[test]
    fn batch_deserializes_from_tagged_json() {
        let json = r#"[
            {"op": "create_service", "key": "s1", "client_service_name": "Design"},
            {"op": "create_case_study", "key": "c1", "service": {"placeholder": "s1"},
             "fields": {"case_name": "Rebrand"}}
        ]"#;
        let batch: Vec<PendingMutation> = serde_json::from_str(json).unwrap();
        assert_eq!(batch.len(), 2);
        assert!(plan(batch).is_ok());
    }
}
