use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path};
use crate::finance::revenue;
use crate::models::{RevenueSharingSettings, UpdateRevenueSharingSettings};

fn validated(input: &UpdateRevenueSharingSettings) -> Result<RevenueSharingSettings> {
    let settings = RevenueSharingSettings {
        designer_share_percent: input.designer_share_percent,
        platform_fee_percent: input.platform_fee_percent,
    };
    if !settings.validate() {
        return Err(AppError::BadRequest(
            "Designer share and platform fee must sum to 100".into(),
        ));
    }
    Ok(settings)
}

pub async fn get_finance_settings(
    State(state): State<AppState>,
) -> Result<Json<RevenueSharingSettings>> {
    let conn = state.db.get()?;
    Ok(Json(queries::get_finance_settings(&conn)?))
}

pub async fn update_finance_settings(
    State(state): State<AppState>,
    Json(input): Json<UpdateRevenueSharingSettings>,
) -> Result<Json<RevenueSharingSettings>> {
    let settings = validated(&input)?;
    let conn = state.db.get()?;
    queries::update_finance_settings(&conn, &settings)?;

    tracing::info!(
        "Global revenue sharing updated: designer={}%, platform={}%",
        settings.designer_share_percent,
        settings.platform_fee_percent,
    );

    Ok(Json(settings))
}

#[derive(Debug, Deserialize)]
pub struct ExamPath {
    pub exam_id: String,
}

pub async fn put_exam_revenue_settings(
    State(state): State<AppState>,
    Path(path): Path<ExamPath>,
    Json(input): Json<UpdateRevenueSharingSettings>,
) -> Result<Json<RevenueSharingSettings>> {
    let settings = validated(&input)?;
    let conn = state.db.get()?;

    queries::get_exam_by_id(&conn, &path.exam_id)?
        .ok_or_else(|| AppError::NotFound("Exam not found".into()))?;

    queries::upsert_exam_revenue_settings(&conn, &path.exam_id, &settings)?;
    Ok(Json(settings))
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub reset: bool,
}

/// Remove the per-exam override. The exam follows the global default from
/// now on, including future changes to it.
pub async fn reset_exam_revenue_settings(
    State(state): State<AppState>,
    Path(path): Path<ExamPath>,
) -> Result<Json<ResetResponse>> {
    let conn = state.db.get()?;

    queries::get_exam_by_id(&conn, &path.exam_id)?
        .ok_or_else(|| AppError::NotFound("Exam not found".into()))?;

    let reset = queries::delete_exam_revenue_settings(&conn, &path.exam_id)?;
    Ok(Json(ResetResponse { reset }))
}

#[derive(Debug, Deserialize)]
pub struct CalculateSharingRequest {
    pub amount: i64,
    #[serde(default)]
    pub exam_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CalculateSharingResponse {
    pub amount: i64,
    pub designer_share: i64,
    pub platform_fee: i64,
    pub designer_share_percent: i64,
    pub platform_fee_percent: i64,
}

pub async fn calculate_sharing(
    State(state): State<AppState>,
    Json(input): Json<CalculateSharingRequest>,
) -> Result<Json<CalculateSharingResponse>> {
    if input.amount <= 0 {
        return Err(AppError::BadRequest("Amount must be positive".into()));
    }

    let conn = state.db.get()?;

    if let Some(exam_id) = input.exam_id.as_deref() {
        queries::get_exam_by_id(&conn, exam_id)?
            .ok_or_else(|| AppError::NotFound("Exam not found".into()))?;
    }

    let settings = queries::resolve_revenue_settings(&conn, input.exam_id.as_deref())?;
    let split = revenue::split_amount(input.amount, &settings);

    Ok(Json(CalculateSharingResponse {
        amount: input.amount,
        designer_share: split.designer_share,
        platform_fee: split.platform_fee,
        designer_share_percent: settings.designer_share_percent,
        platform_fee_percent: settings.platform_fee_percent,
    }))
}
