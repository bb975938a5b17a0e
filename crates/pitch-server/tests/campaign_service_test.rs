//! Application-service tests: authoring, lifecycle transitions, batch
//! apply, lead capture and the public read path.

mod common;

use common::{TestApp, case_fields, cookie_context};
use futures::future::join_all;
use pitch_auth::RequestContext;
use pitch_core::batch::{EntityRef, PendingMutation};
use pitch_core::error::PitchError;
use pitch_core::models::campaign::{CampaignStatus, UpdateCampaign};
use pitch_core::models::lead::LeadFields;
use pitch_core::repository::Pagination;
use pitch_server::public::{self, PublicCampaign};
use uuid::Uuid;

fn lead_fields() -> LeadFields {
    LeadFields {
        lead_name: Some("Dana Visitor".into()),
        lead_company: Some("Globex".into()),
        lead_email: Some("dana@globex.test".into()),
        ..LeadFields::default()
    }
}

async fn status(app: &TestApp, owner: Uuid, campaign_id: Uuid) -> CampaignStatus {
    app.state
        .campaigns
        .get_campaign(owner, campaign_id)
        .await
        .unwrap()
        .campaign_status
}

#[tokio::test]
async fn publish_assigns_public_url() {
    let app = TestApp::new().await;
    let (owner, _) = app.owner().await;
    let (project_id, c1) = app.publishable_project(owner, "Acme Consulting").await;

    let outcome = app
        .state
        .campaigns
        .publish(owner, project_id, c1)
        .await
        .unwrap();

    assert!(outcome.success);
    let url = outcome.project_url.expect("first publish assigns a slug");
    assert!(url.starts_with("acme-consulting-"));
    assert_eq!(status(&app, owner, c1).await, CampaignStatus::Active);
}

#[tokio::test]
async fn switch_does_not_require_publishability() {
    let app = TestApp::new().await;
    let (owner, _) = app.owner().await;
    let (project_id, c1) = app.publishable_project(owner, "Acme").await;
    let campaigns = &app.state.campaigns;
    let url = campaigns
        .publish(owner, project_id, c1)
        .await
        .unwrap()
        .project_url;

    let c2 = campaigns
        .create_campaign(owner, project_id, "Empty")
        .await
        .unwrap()
        .id;
    let outcome = campaigns.switch(owner, project_id, c2).await.unwrap();

    assert!(outcome.success);
    assert_eq!(status(&app, owner, c1).await, CampaignStatus::Paused);
    assert_eq!(status(&app, owner, c2).await, CampaignStatus::Active);
    let project = campaigns.get_project(owner, project_id).await.unwrap();
    assert_eq!(project.project_url, url);
}

#[tokio::test]
async fn publish_without_services_is_not_publishable() {
    let app = TestApp::new().await;
    let (owner, _) = app.owner().await;
    let campaigns = &app.state.campaigns;
    let project = campaigns.create_project(owner, "Acme").await.unwrap();
    let c1 = campaigns
        .create_campaign(owner, project.id, "Bare")
        .await
        .unwrap();
    campaigns
        .update_campaign(
            owner,
            c1.id,
            UpdateCampaign {
                client_name: Some("Acme".into()),
                client_summary: Some("We build things".into()),
                ..UpdateCampaign::default()
            },
        )
        .await
        .unwrap();

    let err = campaigns.publish(owner, project.id, c1.id).await.unwrap_err();
    match err {
        PitchError::NotPublishable { reasons } => {
            assert!(reasons.iter().any(|r| r.contains("service")));
            assert!(reasons.iter().any(|r| r.contains("call-to-action")));
        }
        other => panic!("expected NotPublishable, got {other:?}"),
    }
    assert_eq!(status(&app, owner, c1.id).await, CampaignStatus::Draft);
}

#[tokio::test]
async fn archive_pauses_active_and_closes_public_page() {
    let app = TestApp::new().await;
    let (owner, _) = app.owner().await;
    let (project_id, c1) = app.publishable_project(owner, "Acme").await;
    let campaigns = &app.state.campaigns;
    let slug = campaigns
        .publish(owner, project_id, c1)
        .await
        .unwrap()
        .project_url
        .unwrap();
    let c2 = campaigns
        .create_campaign(owner, project_id, "Autumn")
        .await
        .unwrap()
        .id;
    campaigns.switch(owner, project_id, c2).await.unwrap();

    let page = public::public_campaign(app.state.repos.as_ref(), &slug)
        .await
        .unwrap();
    assert!(page.is_available());

    let outcome = campaigns.archive(owner, project_id).await.unwrap();
    assert!(outcome.success);
    assert_eq!(status(&app, owner, c2).await, CampaignStatus::Paused);

    let err = campaigns.publish(owner, project_id, c1).await.unwrap_err();
    assert!(matches!(err, PitchError::Archived { .. }));

    let page = public::public_campaign(app.state.repos.as_ref(), &slug)
        .await
        .unwrap();
    assert_eq!(page, PublicCampaign::NotAvailable);
}

#[tokio::test]
async fn archive_is_idempotent() {
    let app = TestApp::new().await;
    let (owner, _) = app.owner().await;
    let (project_id, _) = app.publishable_project(owner, "Acme").await;
    let campaigns = &app.state.campaigns;

    let first = campaigns.archive(owner, project_id).await.unwrap();
    let before = campaigns.get_project(owner, project_id).await.unwrap();
    let second = campaigns.archive(owner, project_id).await.unwrap();
    let after = campaigns.get_project(owner, project_id).await.unwrap();

    assert!(first.success && second.success);
    assert!(after.is_archived);
    assert_eq!(before.updated_at, after.updated_at);
}

#[tokio::test]
async fn archived_project_rejects_every_mutation_but_stays_readable() {
    let app = TestApp::new().await;
    let (owner, _) = app.owner().await;
    let (project_id, c1) = app.publishable_project(owner, "Acme").await;
    let campaigns = &app.state.campaigns;
    let services = campaigns.get_campaign_content(owner, c1).await.unwrap().services;
    let service_id = services[0].service.id;
    campaigns.archive(owner, project_id).await.unwrap();

    let archived = |e: PitchError| matches!(e, PitchError::Archived { .. });
    assert!(archived(
        campaigns
            .create_campaign(owner, project_id, "Late")
            .await
            .unwrap_err()
    ));
    assert!(archived(
        campaigns
            .update_campaign(
                owner,
                c1,
                UpdateCampaign {
                    client_name: Some("Other".into()),
                    ..UpdateCampaign::default()
                },
            )
            .await
            .unwrap_err()
    ));
    assert!(archived(
        campaigns
            .create_service(owner, c1, "Ops")
            .await
            .unwrap_err()
    ));
    assert!(archived(
        campaigns
            .create_case_study(owner, service_id, case_fields("Late case"))
            .await
            .unwrap_err()
    ));
    assert!(archived(
        campaigns.switch(owner, project_id, c1).await.unwrap_err()
    ));
    assert!(archived(
        campaigns
            .update_project_name(owner, project_id, "Renamed")
            .await
            .unwrap_err()
    ));

    assert!(campaigns.get_campaign_content(owner, c1).await.is_ok());
    assert_eq!(campaigns.list_campaigns(owner, project_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn active_campaign_cannot_be_edited() {
    let app = TestApp::new().await;
    let (owner, _) = app.owner().await;
    let (project_id, c1) = app.publishable_project(owner, "Acme").await;
    let campaigns = &app.state.campaigns;
    campaigns.publish(owner, project_id, c1).await.unwrap();

    let err = campaigns
        .update_campaign(
            owner,
            c1,
            UpdateCampaign {
                campaign_name: Some("Renamed".into()),
                ..UpdateCampaign::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PitchError::InvalidState { .. }));

    let err = campaigns.create_service(owner, c1, "Ops").await.unwrap_err();
    assert!(matches!(err, PitchError::InvalidState { .. }));
}

#[tokio::test]
async fn foreign_owner_is_denied() {
    let app = TestApp::new().await;
    let (owner, _) = app.owner().await;
    let (intruder, _) = app.owner().await;
    let (project_id, c1) = app.publishable_project(owner, "Acme").await;
    let campaigns = &app.state.campaigns;

    let denied = |e: PitchError| matches!(e, PitchError::AuthorizationDenied { .. });
    assert!(denied(campaigns.get_project(intruder, project_id).await.unwrap_err()));
    assert!(denied(campaigns.publish(intruder, project_id, c1).await.unwrap_err()));
    assert!(denied(campaigns.archive(intruder, project_id).await.unwrap_err()));
    assert!(denied(
        campaigns
            .list_leads(intruder, c1, Pagination::default())
            .await
            .unwrap_err()
    ));
    assert_eq!(status(&app, owner, c1).await, CampaignStatus::Draft);
}

#[tokio::test]
async fn campaign_of_another_project_is_not_found() {
    let app = TestApp::new().await;
    let (owner, _) = app.owner().await;
    let (p1, _) = app.publishable_project(owner, "First").await;
    let (_, other) = app.publishable_project(owner, "Second").await;

    let err = app
        .state
        .campaigns
        .publish(owner, p1, other)
        .await
        .unwrap_err();
    assert!(matches!(err, PitchError::NotFound { .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_publish_and_switch_leave_one_active() {
    let app = TestApp::new().await;
    let (owner, _) = app.owner().await;
    let project_id = app
        .state
        .campaigns
        .create_project(owner, "Race")
        .await
        .unwrap()
        .id;

    let mut ids = Vec::new();
    for i in 0..6 {
        ids.push(
            app.publishable_draft(owner, project_id, &format!("Wave {i}"))
                .await,
        );
    }

    let handles = ids.iter().enumerate().map(|(i, id)| {
        let campaigns = app.state.campaigns.clone();
        let id = *id;
        tokio::spawn(async move {
            if i % 2 == 0 {
                campaigns.publish(owner, project_id, id).await
            } else {
                campaigns.switch(owner, project_id, id).await
            }
        })
    });
    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();
    assert!(results.iter().any(Result::is_ok));

    let campaigns = &app.state.campaigns;
    let active = campaigns
        .list_campaigns(owner, project_id)
        .await
        .unwrap()
        .into_iter()
        .filter(|c| c.campaign_status == CampaignStatus::Active)
        .count();
    assert_eq!(active, 1);

    let project = campaigns.get_project(owner, project_id).await.unwrap();
    assert!(project.project_url.is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn publish_racing_service_delete_keeps_live_content_complete() {
    let app = TestApp::new().await;
    let (owner, _) = app.owner().await;

    for round in 0..20 {
        let (project_id, campaign_id) = app
            .publishable_project(owner, &format!("Race {round}"))
            .await;
        let campaigns = app.state.campaigns.clone();
        let service = campaigns
            .get_campaign_content(owner, campaign_id)
            .await
            .unwrap()
            .services[0]
            .service
            .id;

        let publisher = {
            let campaigns = campaigns.clone();
            tokio::spawn(async move { campaigns.publish(owner, project_id, campaign_id).await })
        };
        let deleter = {
            let campaigns = campaigns.clone();
            tokio::spawn(async move { campaigns.delete_service(owner, service).await })
        };
        let published = publisher.await.unwrap();
        let deleted = deleter.await.unwrap();

        assert!(
            !(published.is_ok() && deleted.is_ok()),
            "round {round}: publish and delete both committed"
        );
        let content = campaigns
            .get_campaign_content(owner, campaign_id)
            .await
            .unwrap();
        if content.campaign.campaign_status == CampaignStatus::Active {
            assert!(
                pitch_core::lifecycle::is_publishable(&content),
                "round {round}: live campaign is missing content"
            );
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn archive_racing_campaign_create_is_serialized() {
    let app = TestApp::new().await;
    let (owner, _) = app.owner().await;

    for round in 0..20 {
        let project_id = app
            .state
            .campaigns
            .create_project(owner, &format!("Closing {round}"))
            .await
            .unwrap()
            .id;
        let campaigns = app.state.campaigns.clone();

        let archiver = {
            let campaigns = campaigns.clone();
            tokio::spawn(async move { campaigns.archive(owner, project_id).await })
        };
        let creator = {
            let campaigns = campaigns.clone();
            tokio::spawn(async move { campaigns.create_campaign(owner, project_id, "Late").await })
        };
        let archived = archiver.await.unwrap();
        let created = creator.await.unwrap();

        let project = campaigns.get_project(owner, project_id).await.unwrap();
        match created {
            Ok(campaign) if archived.is_ok() && project.is_archived => assert!(
                campaign.created_at <= project.updated_at,
                "round {round}: campaign created after archive"
            ),
            Ok(_) => {}
            Err(err) => assert!(
                matches!(
                    err,
                    PitchError::Archived { .. } | PitchError::TransactionConflict(_)
                ),
                "round {round}: unexpected error {err:?}"
            ),
        }
    }
}

#[tokio::test]
async fn batch_resolves_placeholders_before_dependent_mutations() {
    let app = TestApp::new().await;
    let (owner, _) = app.owner().await;
    let (_, c1) = app.publishable_project(owner, "Acme").await;
    let campaigns = &app.state.campaigns;
    let existing = campaigns.get_campaign_content(owner, c1).await.unwrap().services[0]
        .service
        .id;

    let map = campaigns
        .apply_batch(
            owner,
            c1,
            vec![
                PendingMutation::CreateCaseStudy {
                    key: "case-1".into(),
                    service: EntityRef::Placeholder("svc-1".into()),
                    fields: case_fields("Migration"),
                },
                PendingMutation::CreateService {
                    key: "svc-1".into(),
                    client_service_name: "Cloud".into(),
                },
                PendingMutation::RenameService {
                    service: EntityRef::Persisted(existing),
                    client_service_name: "Strategy & Planning".into(),
                },
            ],
        )
        .await
        .unwrap();

    let service_id = map.services["svc-1"];
    let case_id = map.case_studies["case-1"];
    let content = campaigns.get_campaign_content(owner, c1).await.unwrap();
    assert_eq!(content.services.len(), 2);
    assert_eq!(content.services[0].service.client_service_name, "Strategy & Planning");
    assert_eq!(content.services[1].service.id, service_id);
    assert_eq!(content.services[1].service.order_index, 2);
    assert_eq!(content.services[1].case_studies[0].id, case_id);
}

#[tokio::test]
async fn batch_rejects_references_outside_the_campaign() {
    let app = TestApp::new().await;
    let (owner, _) = app.owner().await;
    let (project_id, c1) = app.publishable_project(owner, "Acme").await;
    let c2 = app.publishable_draft(owner, project_id, "Other").await;
    let campaigns = &app.state.campaigns;
    let foreign = campaigns.get_campaign_content(owner, c2).await.unwrap().services[0]
        .service
        .id;

    let err = campaigns
        .apply_batch(
            owner,
            c1,
            vec![PendingMutation::DeleteService {
                service: EntityRef::Persisted(foreign),
            }],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PitchError::NotFound { .. }));

    let err = campaigns
        .apply_batch(
            owner,
            c1,
            vec![PendingMutation::DeleteService {
                service: EntityRef::Placeholder("never-created".into()),
            }],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PitchError::Validation { .. }));
    assert_eq!(
        campaigns.get_campaign_content(owner, c2).await.unwrap().services.len(),
        1
    );
}

#[tokio::test]
async fn deleting_a_service_keeps_order_dense() {
    let app = TestApp::new().await;
    let (owner, _) = app.owner().await;
    let (_, c1) = app.publishable_project(owner, "Acme").await;
    let campaigns = &app.state.campaigns;
    let second = campaigns.create_service(owner, c1, "Design").await.unwrap();
    campaigns.create_service(owner, c1, "Build").await.unwrap();

    campaigns.delete_service(owner, second.id).await.unwrap();

    let content = campaigns.get_campaign_content(owner, c1).await.unwrap();
    let order: Vec<u32> = content.services.iter().map(|s| s.service.order_index).collect();
    assert_eq!(order, vec![1, 2]);
    assert_eq!(content.services[1].service.client_service_name, "Build");
}

#[tokio::test]
async fn duplicate_copies_content_into_a_new_draft() {
    let app = TestApp::new().await;
    let (owner, _) = app.owner().await;
    let (project_id, c1) = app.publishable_project(owner, "Acme").await;
    let campaigns = &app.state.campaigns;
    campaigns.publish(owner, project_id, c1).await.unwrap();

    let copy = campaigns
        .duplicate_campaign(owner, c1, "Spring copy")
        .await
        .unwrap();

    assert_eq!(copy.campaign_status, CampaignStatus::Draft);
    assert_eq!(copy.campaign_structure.client_name, "Acme");
    assert_eq!(copy.cta_config.mailto.as_deref(), Some("a@b.com"));
    let content = campaigns.get_campaign_content(owner, copy.id).await.unwrap();
    assert_eq!(content.services.len(), 1);
    assert_eq!(content.services[0].case_studies[0].case_name, "Rollout");
    assert_eq!(status(&app, owner, c1).await, CampaignStatus::Active);
}

#[tokio::test]
async fn anonymous_lead_creates_one_identity_across_resubmissions() {
    let app = TestApp::new().await;
    let (owner, _) = app.owner().await;
    let (project_id, c1) = app.publishable_project(owner, "Acme").await;
    let campaigns = &app.state.campaigns;
    campaigns.publish(owner, project_id, c1).await.unwrap();
    let c2 = app.publishable_draft(owner, project_id, "Summer").await;
    campaigns.switch(owner, project_id, c2).await.unwrap();
    let identities_before = app.count("identity").await;

    let first = app
        .state
        .leads
        .submit_lead(&RequestContext::default(), Some(c2), &lead_fields())
        .await
        .unwrap();
    let issued = first.issued.expect("a new visitor gets credentials");
    assert_eq!(first.lead.submitter_identity_id, issued.identity_id);
    assert_eq!(first.lead.campaign_id, c2);
    assert_eq!(app.count("identity").await, identities_before + 1);
    assert_eq!(app.count("lead").await, 1);

    let again = app
        .state
        .leads
        .submit_lead(&cookie_context(&issued.set_cookies), Some(c2), &lead_fields())
        .await
        .unwrap();
    assert!(again.issued.is_none());
    assert_eq!(again.lead.submitter_identity_id, issued.identity_id);
    assert_eq!(app.count("identity").await, identities_before + 1);

    let leads = campaigns
        .list_leads(owner, c2, Pagination::default())
        .await
        .unwrap();
    assert_eq!(leads.total, 2);
}

#[tokio::test]
async fn lead_fields_are_sanitized() {
    let app = TestApp::new().await;
    let (owner, _) = app.owner().await;
    let (_, c1) = app.publishable_project(owner, "Acme").await;

    let fields = LeadFields {
        lead_name: Some("  <b>Dana</b>  ".into()),
        lead_company: Some("javascript:Globex".into()),
        ..lead_fields()
    };
    let receipt = app
        .state
        .leads
        .submit_lead(&RequestContext::default(), Some(c1), &fields)
        .await
        .unwrap();

    assert!(!receipt.lead.lead_name.contains('<'));
    assert!(!receipt.lead.lead_company.contains("javascript:"));
}

#[tokio::test]
async fn invalid_lead_fails_before_touching_identity() {
    let app = TestApp::new().await;
    let (owner, _) = app.owner().await;
    let (_, c1) = app.publishable_project(owner, "Acme").await;
    let identities_before = app.count("identity").await;

    let missing_email = LeadFields {
        lead_email: None,
        ..lead_fields()
    };
    let failure = app
        .state
        .leads
        .submit_lead(&RequestContext::default(), Some(c1), &missing_email)
        .await
        .unwrap_err();
    assert!(matches!(failure.error, PitchError::Validation { .. }));

    let failure = app
        .state
        .leads
        .submit_lead(&RequestContext::default(), None, &lead_fields())
        .await
        .unwrap_err();
    assert!(matches!(failure.error, PitchError::Validation { .. }));

    assert_eq!(app.count("identity").await, identities_before);
    assert_eq!(app.count("lead").await, 0);
}

#[tokio::test]
async fn lead_on_unknown_campaign_is_not_found() {
    let app = TestApp::new().await;

    let failure = app
        .state
        .leads
        .submit_lead(&RequestContext::default(), Some(Uuid::new_v4()), &lead_fields())
        .await
        .unwrap_err();

    assert!(matches!(failure.error, PitchError::NotFound { .. }));
    assert!(failure.issued.is_some());
    assert_eq!(app.count("lead").await, 0);
}

#[tokio::test]
async fn unknown_slug_is_not_available() {
    let app = TestApp::new().await;
    let repos = app.state.repos.as_ref();

    let unknown = public::public_campaign(repos, "no-such-page").await.unwrap();
    assert_eq!(unknown, PublicCampaign::NotAvailable);
}
