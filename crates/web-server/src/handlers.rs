use crate::{AppState, error::AppError, identity::Identity};
use analytics::AggregationEngine;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use core_types::{CycleWithProfiles, Profile, ProfileUpdate, RankingEntry, Role, Scope, Window};
use mailer::DispatchOutcome;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

const RANKING_SIZE: usize = 5;

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
}
fn default_limit() -> i64 { 5 }

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub is_super_admin: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReportResponse {
    pub success: bool,
    pub message: String,
}

impl ReportResponse {
    fn from_outcome(outcome: &DispatchOutcome) -> (StatusCode, Json<Self>) {
        let status = if outcome.is_success() {
            StatusCode::OK
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let body = ReportResponse {
            success: outcome.is_success(),
            message: outcome.message(),
        };
        (status, Json(body))
    }
}

/// # GET /api/me
pub async fn get_me(identity: Identity) -> Json<MeResponse> {
    Json(MeResponse {
        id: identity.user.id,
        username: identity.user.username,
        role: identity.user.role,
        is_super_admin: identity.is_super_admin,
    })
}

/// # GET /api/cycles
/// The caller's cycles, newest first.
pub async fn list_cycles(
    identity: Identity,
    State(state): State<Arc<AppState>>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<CycleWithProfiles>>, AppError> {
    let cycles = state
        .repo
        .list_cycles(identity.user.id, page.skip.max(0), page.limit.clamp(1, 100))
        .await?;
    Ok(Json(cycles))
}

/// # POST /api/cycles
pub async fn create_cycle(
    identity: Identity,
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<CycleWithProfiles>), AppError> {
    let cycle = state.repo.create_cycle(&identity.user).await?;
    Ok((StatusCode::CREATED, Json(cycle)))
}

/// # PUT /api/profiles/:profile_id
pub async fn update_profile(
    identity: Identity,
    Path(profile_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<Profile>, AppError> {
    let profile = state
        .repo
        .update_profile(identity.user.id, profile_id, update)
        .await?;
    Ok(Json(profile))
}

/// # GET /api/ranking
/// All-time profit ranking over every user, top five.
pub async fn get_ranking(
    _identity: Identity,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RankingEntry>>, AppError> {
    let engine = AggregationEngine::new();
    let rows = {
        let mut session = state.sessions.open_session().await?;
        engine
            .aggregate(session.as_mut(), Scope::All, Window::all_time(Utc::now()))
            .await?
    };
    Ok(Json(engine.rank(rows, Some(RANKING_SIZE))))
}

/// # POST /api/reports/me
/// Sends the caller's own report.
pub async fn send_my_report(
    identity: Identity,
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ReportResponse>) {
    let outcome = state.reports.run_for_user(identity.user.id).await;
    ReportResponse::from_outcome(&outcome)
}

/// # POST /api/reports/all
/// Sends the consolidated report. Super-admin only.
pub async fn send_full_report(
    identity: Identity,
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<ReportResponse>), AppError> {
    if !identity.is_super_admin {
        tracing::warn!(user = %identity.user.username, "Consolidated report refused.");
        return Err(AppError::Forbidden(
            "Only the super-admin may request the consolidated report".to_string(),
        ));
    }
    let outcome = state.reports.run_for_everyone().await;
    Ok(ReportResponse::from_outcome(&outcome))
}
