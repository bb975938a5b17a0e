//! HTTP routes.

use axum::extract::{Path, Query, State};
use axum::http::header::{AUTHORIZATION, COOKIE, SET_COOKIE, USER_AGENT};
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use pitch_auth::RequestContext;
use pitch_core::batch::PendingMutation;
use pitch_core::error::PitchError;
use pitch_core::models::campaign::UpdateCampaign;
use pitch_core::models::lead::LeadFields;
use pitch_core::repository::{PaginatedResult, Pagination};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::error::ApiError;
use crate::public::{self, PublicCampaign};
use crate::state::AppState;

type ApiResult<T> = Result<T, ApiError>;

const MAX_PAGE_SIZE: u64 = 100;
const NOT_AVAILABLE_MESSAGE: &str = "This page is no longer available";

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/session", get(session_check))
        .route("/api/auth/anonymous", post(anonymous_sign_in))
        .route("/api/auth/refresh", post(refresh_session))
        .route("/api/auth/sign-out", post(sign_out))
        .route("/api/auth/sign-out-everywhere", post(sign_out_everywhere))
        .route("/api/projects", post(create_project).get(list_projects))
        .route(
            "/api/projects/:project_id",
            get(get_project).patch(rename_project),
        )
        .route(
            "/api/projects/:project_id/campaigns",
            post(create_campaign).get(list_campaigns),
        )
        .route("/api/projects/:project_id/publish", post(publish))
        .route("/api/projects/:project_id/switch", post(switch))
        .route("/api/projects/:project_id/archive", post(archive))
        .route(
            "/api/campaigns/:campaign_id",
            get(get_campaign_content).patch(update_campaign),
        )
        .route("/api/campaigns/:campaign_id/duplicate", post(duplicate_campaign))
        .route("/api/campaigns/:campaign_id/batch", post(apply_batch))
        .route(
            "/api/campaigns/:campaign_id/services/order",
            post(reorder_services),
        )
        .route("/api/campaigns/:campaign_id/leads", get(list_leads))
        .route("/api/leads", post(submit_lead))
        .route("/p/:slug", get(public_page))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request plumbing
// ---------------------------------------------------------------------------

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

pub(crate) fn request_context(headers: &HeaderMap) -> RequestContext {
    let cookie = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect::<Vec<_>>()
        .join("; ");
    let cookie = (!cookie.is_empty()).then_some(cookie);

    let mut ctx = RequestContext::from_headers(cookie.as_deref(), header_str(headers, &AUTHORIZATION));
    ctx.user_agent = header_str(headers, &USER_AGENT).map(str::to_string);
    ctx.ip_address = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    ctx
}

/// The caller's permanent identity. Anonymous sessions cannot own
/// projects.
fn require_owner(state: &AppState, headers: &HeaderMap) -> ApiResult<Uuid> {
    let claims = state.auth().authenticate(&request_context(headers))?;
    if claims.is_anonymous {
        return Err(PitchError::AuthenticationFailed {
            reason: "a signed-in account is required".into(),
        }
        .into());
    }
    Uuid::parse_str(&claims.sub).map_err(|_| {
        PitchError::AuthenticationFailed {
            reason: "token subject is not an identity id".into(),
        }
        .into()
    })
}

fn set_cookies(values: Vec<String>) -> AppendHeaders<Vec<(HeaderName, String)>> {
    AppendHeaders(values.into_iter().map(|v| (SET_COOKIE, v)).collect())
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    offset: Option<u64>,
    limit: Option<u64>,
}

impl From<PageQuery> for Pagination {
    fn from(q: PageQuery) -> Self {
        let default = Pagination::default();
        Self {
            offset: q.offset.unwrap_or(default.offset),
            limit: q.limit.unwrap_or(default.limit).clamp(1, MAX_PAGE_SIZE),
        }
    }
}

#[derive(Debug, Serialize)]
struct Page<T> {
    items: Vec<T>,
    total: u64,
    offset: u64,
    limit: u64,
}

impl<T> From<PaginatedResult<T>> for Page<T> {
    fn from(p: PaginatedResult<T>) -> Self {
        Self {
            items: p.items,
            total: p.total,
            offset: p.offset,
            limit: p.limit,
        }
    }
}

// ---------------------------------------------------------------------------
// Health and sessions
// ---------------------------------------------------------------------------

async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn session_check(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    Json(state.resolver.check_session(&request_context(&headers)).await)
}

/// Page-view bootstrap. Always 200; `success` tells whether a session
/// now exists.
async fn anonymous_sign_in(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let bootstrap = state.resolver.ensure_session(&request_context(&headers)).await;
    let cookies = bootstrap
        .issued
        .map(|issued| issued.set_cookies)
        .unwrap_or_default();
    (set_cookies(cookies), Json(json!({ "success": bootstrap.success })))
}

#[derive(Debug, Deserialize)]
struct RefreshBody {
    refresh_token: String,
}

async fn refresh_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RefreshBody>,
) -> ApiResult<impl IntoResponse> {
    let issued = state
        .auth()
        .refresh(&body.refresh_token, &request_context(&headers))
        .await?;
    Ok((
        set_cookies(issued.set_cookies),
        Json(json!({
            "access_token": issued.access_token,
            "refresh_token": issued.refresh_token,
            "expires_in": issued.expires_in,
        })),
    ))
}

async fn sign_out(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<impl IntoResponse> {
    let cleared = state.auth().sign_out(&request_context(&headers)).await?;
    Ok((StatusCode::NO_CONTENT, set_cookies(cleared)))
}

/// Revoke every session of the caller's identity, then clear this
/// browser's cookies.
async fn sign_out_everywhere(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let ctx = request_context(&headers);
    let claims = state.auth().authenticate(&ctx)?;
    let identity_id = Uuid::parse_str(&claims.sub).map_err(|_| PitchError::AuthenticationFailed {
        reason: "token subject is not an identity id".into(),
    })?;
    let revoked = state.auth().revoke_all_sessions(identity_id).await?;
    let cleared = state.auth().sign_out(&ctx).await?;
    Ok((set_cookies(cleared), Json(json!({ "revoked": revoked }))))
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ProjectBody {
    project_name: String,
}

async fn create_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ProjectBody>,
) -> ApiResult<impl IntoResponse> {
    let owner = require_owner(&state, &headers)?;
    let project = state.campaigns.create_project(owner, &body.project_name).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

async fn list_projects(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(page): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let owner = require_owner(&state, &headers)?;
    let projects = state.campaigns.list_projects(owner, page.into()).await?;
    Ok(Json(Page::from(projects)))
}

async fn get_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(project_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let owner = require_owner(&state, &headers)?;
    Ok(Json(state.campaigns.get_project(owner, project_id).await?))
}

async fn rename_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(project_id): Path<Uuid>,
    Json(body): Json<ProjectBody>,
) -> ApiResult<impl IntoResponse> {
    let owner = require_owner(&state, &headers)?;
    let project = state
        .campaigns
        .update_project_name(owner, project_id, &body.project_name)
        .await?;
    Ok(Json(project))
}

// ---------------------------------------------------------------------------
// Campaigns
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CampaignBody {
    campaign_name: String,
}

#[derive(Debug, Deserialize)]
struct CampaignRef {
    campaign_id: Uuid,
}

async fn create_campaign(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(project_id): Path<Uuid>,
    Json(body): Json<CampaignBody>,
) -> ApiResult<impl IntoResponse> {
    let owner = require_owner(&state, &headers)?;
    let campaign = state
        .campaigns
        .create_campaign(owner, project_id, &body.campaign_name)
        .await?;
    Ok((StatusCode::CREATED, Json(campaign)))
}

async fn list_campaigns(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(project_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let owner = require_owner(&state, &headers)?;
    Ok(Json(state.campaigns.list_campaigns(owner, project_id).await?))
}

async fn get_campaign_content(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(campaign_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let owner = require_owner(&state, &headers)?;
    Ok(Json(
        state.campaigns.get_campaign_content(owner, campaign_id).await?,
    ))
}

async fn update_campaign(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(campaign_id): Path<Uuid>,
    Json(body): Json<UpdateCampaign>,
) -> ApiResult<impl IntoResponse> {
    let owner = require_owner(&state, &headers)?;
    Ok(Json(
        state.campaigns.update_campaign(owner, campaign_id, body).await?,
    ))
}

async fn duplicate_campaign(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(campaign_id): Path<Uuid>,
    Json(body): Json<CampaignBody>,
) -> ApiResult<impl IntoResponse> {
    let owner = require_owner(&state, &headers)?;
    let copy = state
        .campaigns
        .duplicate_campaign(owner, campaign_id, &body.campaign_name)
        .await?;
    Ok((StatusCode::CREATED, Json(copy)))
}

#[derive(Debug, Deserialize)]
struct BatchBody {
    mutations: Vec<PendingMutation>,
}

async fn apply_batch(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(campaign_id): Path<Uuid>,
    Json(body): Json<BatchBody>,
) -> ApiResult<impl IntoResponse> {
    let owner = require_owner(&state, &headers)?;
    let map = state
        .campaigns
        .apply_batch(owner, campaign_id, body.mutations)
        .await?;
    Ok(Json(map))
}

#[derive(Debug, Deserialize)]
struct ReorderBody {
    ordered_ids: Vec<Uuid>,
}

async fn reorder_services(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(campaign_id): Path<Uuid>,
    Json(body): Json<ReorderBody>,
) -> ApiResult<impl IntoResponse> {
    let owner = require_owner(&state, &headers)?;
    let services = state
        .campaigns
        .reorder_services(owner, campaign_id, body.ordered_ids)
        .await?;
    Ok(Json(services))
}

async fn list_leads(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(campaign_id): Path<Uuid>,
    Query(page): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let owner = require_owner(&state, &headers)?;
    let leads = state
        .campaigns
        .list_leads(owner, campaign_id, page.into())
        .await?;
    Ok(Json(Page::from(leads)))
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

async fn publish(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(project_id): Path<Uuid>,
    Json(body): Json<CampaignRef>,
) -> ApiResult<impl IntoResponse> {
    let owner = require_owner(&state, &headers)?;
    let outcome = state
        .campaigns
        .publish(owner, project_id, body.campaign_id)
        .await?;
    let public_url = outcome
        .project_url
        .as_deref()
        .map(|slug| state.config.public_url(slug));
    Ok(Json(json!({
        "success": outcome.success,
        "message": outcome.message,
        "project_url": outcome.project_url,
        "public_url": public_url,
    })))
}

async fn switch(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(project_id): Path<Uuid>,
    Json(body): Json<CampaignRef>,
) -> ApiResult<impl IntoResponse> {
    let owner = require_owner(&state, &headers)?;
    Ok(Json(
        state
            .campaigns
            .switch(owner, project_id, body.campaign_id)
            .await?,
    ))
}

async fn archive(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(project_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let owner = require_owner(&state, &headers)?;
    Ok(Json(state.campaigns.archive(owner, project_id).await?))
}

// ---------------------------------------------------------------------------
// Visitors
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct LeadBody {
    campaign_id: Option<Uuid>,
    #[serde(flatten)]
    fields: LeadFields,
}

async fn submit_lead(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LeadBody>,
) -> Response {
    let ctx = request_context(&headers);
    match state
        .leads
        .submit_lead(&ctx, body.campaign_id, &body.fields)
        .await
    {
        Ok(receipt) => {
            let cookies = receipt
                .issued
                .map(|issued| issued.set_cookies)
                .unwrap_or_default();
            (StatusCode::CREATED, set_cookies(cookies), Json(receipt.lead)).into_response()
        }
        Err(failure) => {
            let cookies = failure
                .issued
                .map(|issued| issued.set_cookies)
                .unwrap_or_default();
            (set_cookies(cookies), ApiError(failure.error)).into_response()
        }
    }
}

/// Public campaign page. Bootstraps a visitor session on the way; a
/// failed bootstrap does not stop the page from rendering, and a failed
/// read still hands out the credentials the bootstrap issued.
async fn public_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
) -> Response {
    let bootstrap = state.resolver.ensure_session(&request_context(&headers)).await;
    let cookies = set_cookies(
        bootstrap
            .issued
            .map(|issued| issued.set_cookies)
            .unwrap_or_default(),
    );

    let page = match public::public_campaign(state.repos.as_ref(), &slug).await {
        Ok(page) => page,
        Err(err) => return (cookies, ApiError(err)).into_response(),
    };
    let body = match &page {
        PublicCampaign::Available { .. } => json!({
            "session": { "success": bootstrap.success },
            "page": page,
        }),
        PublicCampaign::NotAvailable => json!({
            "session": { "success": bootstrap.success },
            "page": page,
            "message": NOT_AVAILABLE_MESSAGE,
        }),
    };
    (cookies, Json(body)).into_response()
}
