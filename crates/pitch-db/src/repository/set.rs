//! [`RepositorySet`] over a single SurrealDB client.

use pitch_core::repository::RepositorySet;
use surrealdb::{Connection, Surreal};

use super::{
    SurrealCampaignRepository, SurrealCaseStudyRepository, SurrealClientServiceRepository,
    SurrealLeadRepository, SurrealLifecycleRepository, SurrealProjectRepository,
};

/// All content repositories sharing one connection.
#[derive(Clone)]
pub struct SurrealRepositories<C: Connection> {
    projects: SurrealProjectRepository<C>,
    campaigns: SurrealCampaignRepository<C>,
    lifecycle: SurrealLifecycleRepository<C>,
    services: SurrealClientServiceRepository<C>,
    case_studies: SurrealCaseStudyRepository<C>,
    leads: SurrealLeadRepository<C>,
}

impl<C: Connection> SurrealRepositories<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self {
            projects: SurrealProjectRepository::new(db.clone()),
            campaigns: SurrealCampaignRepository::new(db.clone()),
            lifecycle: SurrealLifecycleRepository::new(db.clone()),
            services: SurrealClientServiceRepository::new(db.clone()),
            case_studies: SurrealCaseStudyRepository::new(db.clone()),
            leads: SurrealLeadRepository::new(db),
        }
    }
}

impl<C: Connection> RepositorySet for SurrealRepositories<C> {
    type Projects = SurrealProjectRepository<C>;
    type Campaigns = SurrealCampaignRepository<C>;
    type Lifecycle = SurrealLifecycleRepository<C>;
    type Services = SurrealClientServiceRepository<C>;
    type CaseStudies = SurrealCaseStudyRepository<C>;
    type Leads = SurrealLeadRepository<C>;

    fn projects(&self) -> &Self::Projects {
        &self.projects
    }

    fn campaigns(&self) -> &Self::Campaigns {
        &self.campaigns
    }

    fn lifecycle(&self) -> &Self::Lifecycle {
        &self.lifecycle
    }

    fn services(&self) -> &Self::Services {
        &self.services
    }

    fn case_studies(&self) -> &Self::CaseStudies {
        &self.case_studies
    }

    fn leads(&self) -> &Self::Leads {
        &self.leads
    }
}
