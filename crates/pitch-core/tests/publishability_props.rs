//! Property tests for the publishability rules.

use chrono::Utc;
use pitch_core::lifecycle::{is_publishable, publish_blockers};
use pitch_core::models::campaign::{
    Campaign, CampaignContent, CampaignStatus, CampaignStructure, CtaConfig, ServiceWithCases,
};
use pitch_core::models::case_study::CaseStudy;
use pitch_core::models::client_service::ClientService;
use proptest::prelude::*;
use uuid::Uuid;

fn ready_campaign() -> Campaign {
    Campaign {
        id: Uuid::new_v4(),
        project_id: Uuid::new_v4(),
        campaign_name: "Pitch".into(),
        campaign_status: CampaignStatus::Draft,
        campaign_structure: CampaignStructure {
            client_name: "Acme".into(),
            client_summary: "We build things".into(),
        },
        cta_config: CtaConfig {
            mailto: Some("a@b.com".into()),
            ..Default::default()
        },
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn service_with(campaign_id: Uuid, order_index: u32, cases: usize) -> ServiceWithCases {
    let service = ClientService {
        id: Uuid::new_v4(),
        campaign_id,
        client_service_name: format!("Service {order_index}"),
        order_index,
        created_at: Utc::now(),
    };
    let case_studies = (0..cases)
        .map(|i| CaseStudy {
            id: Uuid::new_v4(),
            client_service_id: service.id,
            case_name: format!("Case {i}"),
            case_summary: String::new(),
            case_duration: None,
            case_highlights: None,
            case_study_url: None,
            created_at: Utc::now(),
        })
        .collect();
    ServiceWithCases {
        service,
        case_studies,
    }
}

proptest! {
    /// Adding an empty service breaks publishability; giving every
    /// service a case study restores it.
    #[test]
    fn empty_service_toggles_publishability(case_counts in prop::collection::vec(1usize..4, 1..6)) {
        let campaign = ready_campaign();
        let mut services: Vec<ServiceWithCases> = case_counts
            .iter()
            .enumerate()
            .map(|(i, n)| service_with(campaign.id, i as u32 + 1, *n))
            .collect();

        let content = CampaignContent { campaign: campaign.clone(), services: services.clone() };
        prop_assert!(is_publishable(&content));

        services.push(service_with(campaign.id, services.len() as u32 + 1, 0));
        let content = CampaignContent { campaign: campaign.clone(), services: services.clone() };
        prop_assert!(!is_publishable(&content));
        prop_assert_eq!(publish_blockers(&content).len(), 1);

        let last = services.len() as u32;
        *services.last_mut().unwrap() = service_with(campaign.id, last, 1);
        let content = CampaignContent { campaign, services };
        prop_assert!(is_publishable(&content));
    }

    /// Any single missing CTA/copy field blocks publishing on its own.
    #[test]
    fn blank_copy_blocks_publish(blank_name in any::<bool>(), blank_summary in any::<bool>()) {
        let mut campaign = ready_campaign();
        if blank_name {
            campaign.campaign_structure.client_name = "   ".into();
        }
        if blank_summary {
            campaign.campaign_structure.client_summary.clear();
        }
        let services = vec![service_with(campaign.id, 1, 1)];
        let content = CampaignContent { campaign, services };
        prop_assert_eq!(is_publishable(&content), !blank_name && !blank_summary);
    }
}
