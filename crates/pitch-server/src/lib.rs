//! Pitch Server — application services and HTTP surface.
//!
//! [`campaigns::CampaignService`] covers authoring and the lifecycle
//! transitions, [`leads::LeadCaptureService`] the visitor-facing lead
//! flow and [`public`] the read path behind public project pages.

pub mod batch;
pub mod campaigns;
pub mod config;
pub mod error;
pub mod leads;
pub mod public;
pub mod routes;
pub mod slug;
pub mod state;
