//! Property tests: service positions stay dense under any sequence of
//! appends and deletions.

use pitch_core::models::campaign::CreateCampaign;
use pitch_core::models::client_service::CreateClientService;
use pitch_core::models::project::CreateProject;
use pitch_core::repository::{CampaignRepository, ClientServiceRepository, ProjectRepository};
use pitch_db::repository::{
    SurrealCampaignRepository, SurrealClientServiceRepository, SurrealProjectRepository,
};
use proptest::prelude::*;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

#[derive(Debug, Clone)]
enum Op {
    Append,
    /// Delete the service at this position modulo the current count.
    Delete(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        2 => Just(Op::Append),
        1 => any::<usize>().prop_map(Op::Delete),
    ]
}

async fn run_ops(ops: Vec<Op>) -> Vec<u32> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    pitch_db::run_migrations(&db).await.unwrap();

    let project = SurrealProjectRepository::new(db.clone())
        .create(CreateProject {
            owner_id: Uuid::new_v4(),
            project_name: "Props".into(),
        })
        .await
        .unwrap();
    let campaign = SurrealCampaignRepository::new(db.clone())
        .create(CreateCampaign {
            project_id: project.id,
            campaign_name: "Props".into(),
        })
        .await
        .unwrap();
    let repo = SurrealClientServiceRepository::new(db);

    for (i, op) in ops.into_iter().enumerate() {
        match op {
            Op::Append => {
                repo.create(CreateClientService {
                    campaign_id: campaign.id,
                    client_service_name: format!("Service {i}"),
                })
                .await
                .unwrap();
            }
            Op::Delete(pick) => {
                let current = repo.list_by_campaign(campaign.id).await.unwrap();
                if !current.is_empty() {
                    repo.delete(current[pick % current.len()].id).await.unwrap();
                }
            }
        }
    }

    repo.list_by_campaign(campaign.id)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.order_index)
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn positions_are_dense_from_one(ops in prop::collection::vec(op(), 0..12)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let positions = rt.block_on(run_ops(ops));
        let expected: Vec<u32> = (1..=positions.len() as u32).collect();
        prop_assert_eq!(positions, expected);
    }
}
