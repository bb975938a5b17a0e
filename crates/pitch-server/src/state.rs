//! Shared application state.

use std::sync::Arc;

use pitch_auth::{AuthService, IdentityResolver};
use pitch_db::repository::{
    SurrealIdentityRepository, SurrealRepositories, SurrealSessionRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;

use crate::campaigns::CampaignService;
use crate::config::ServerConfig;
use crate::leads::LeadCaptureService;

pub type Repositories = SurrealRepositories<Any>;
pub type Auth = AuthService<SurrealIdentityRepository<Any>, SurrealSessionRepository<Any>>;

#[derive(Clone)]
pub struct AppState {
    pub repos: Arc<Repositories>,
    pub campaigns: CampaignService<Repositories>,
    pub leads: Arc<LeadCaptureService<Repositories, Auth>>,
    pub resolver: Arc<IdentityResolver<Auth>>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: Surreal<Any>, config: ServerConfig) -> Self {
        let repos = Arc::new(SurrealRepositories::new(db.clone()));
        let auth = AuthService::new(
            SurrealIdentityRepository::new(db.clone()),
            SurrealSessionRepository::new(db),
            config.auth.clone(),
        );
        let resolver = Arc::new(IdentityResolver::new(auth));

        Self {
            campaigns: CampaignService::new(Arc::clone(&repos)),
            leads: Arc::new(LeadCaptureService::new(
                Arc::clone(&repos),
                Arc::clone(&resolver),
            )),
            repos,
            resolver,
            config: Arc::new(config),
        }
    }

    pub fn auth(&self) -> &Auth {
        self.resolver.provider()
    }
}
