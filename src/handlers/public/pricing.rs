use std::collections::HashMap;

use axum::extract::State;
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path};
use crate::finance::PricingResult;
use crate::models::UserType;
use crate::util::extract_bearer_token;

const MIN_QUESTION_COUNT: u32 = 10;
const MAX_QUESTION_COUNT: u32 = 50;

#[derive(Debug, Deserialize)]
pub struct CalculatePriceRequest {
    pub question_count: u32,
    #[serde(default)]
    pub user_type: UserType,
    #[serde(default)]
    pub is_first_purchase: bool,
    #[serde(default)]
    pub bulk_count: u32,
}

pub async fn calculate_price(
    State(state): State<AppState>,
    Json(input): Json<CalculatePriceRequest>,
) -> Result<Json<PricingResult>> {
    // Range validation is the caller boundary's job; the engine only
    // selects brackets.
    if !(MIN_QUESTION_COUNT..=MAX_QUESTION_COUNT).contains(&input.question_count) {
        return Err(AppError::BadRequest(
            "Question count must be between 10 and 50".into(),
        ));
    }

    let result = state.pricing.exam_price(
        input.question_count,
        input.user_type,
        input.is_first_purchase,
        input.bulk_count,
    )?;

    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct CalculateFlashcardPriceRequest {
    pub flashcard_ids: Vec<String>,
    #[serde(default)]
    pub user_type: UserType,
    #[serde(default)]
    pub is_first_purchase: bool,
}

pub async fn calculate_flashcard_price(
    State(state): State<AppState>,
    Json(input): Json<CalculateFlashcardPriceRequest>,
) -> Result<Json<PricingResult>> {
    if input.flashcard_ids.is_empty() {
        return Err(AppError::BadRequest(
            "At least one flashcard is required".into(),
        ));
    }

    let conn = state.db.get()?;
    let cards = queries::get_flashcards_by_ids(&conn, &input.flashcard_ids)?;
    let by_id: HashMap<&str, Option<i64>> = cards
        .iter()
        .map(|card| (card.id.as_str(), card.price))
        .collect();

    // Duplicated ids count once each; unknown ids are a 404, while a known
    // card without a price silently falls back to the default inside the
    // engine.
    let prices = input
        .flashcard_ids
        .iter()
        .map(|id| {
            by_id
                .get(id.as_str())
                .copied()
                .ok_or_else(|| AppError::NotFound(format!("Flashcard not found: {}", id)))
        })
        .collect::<Result<Vec<Option<i64>>>>()?;

    let result =
        state
            .pricing
            .flashcard_bulk_price(&prices, input.user_type, input.is_first_purchase);

    Ok(Json(result))
}

#[derive(Debug, Serialize)]
pub struct ExamPriceResponse {
    pub exam_id: String,
    pub question_count: u32,
    pub pricing: PricingResult,
}

#[derive(Debug, Deserialize)]
pub struct ExamPricePath {
    pub exam_id: String,
}

/// Quoted price for a specific exam. With a bearer key the quote is
/// personalized (user type, first-purchase state from the ledger);
/// anonymous callers get the undiscounted regular quote.
pub async fn exam_price(
    State(state): State<AppState>,
    Path(path): Path<ExamPricePath>,
    headers: HeaderMap,
) -> Result<Json<ExamPriceResponse>> {
    let conn = state.db.get()?;

    let exam = queries::get_exam_by_id(&conn, &path.exam_id)?
        .ok_or_else(|| AppError::NotFound("Exam not found".into()))?;

    let (user_type, is_first_purchase) = match extract_bearer_token(&headers)
        .and_then(|key| queries::get_user_by_api_key(&conn, key).transpose())
        .transpose()?
    {
        Some(user) => (
            user.user_type,
            queries::count_completed_purchases(&conn, &user.id)? == 0,
        ),
        None => (UserType::Regular, false),
    };

    let pricing = state
        .pricing
        .exam_price(exam.question_count, user_type, is_first_purchase, 0)?;

    Ok(Json(ExamPriceResponse {
        exam_id: exam.id,
        question_count: exam.question_count,
        pricing,
    }))
}
