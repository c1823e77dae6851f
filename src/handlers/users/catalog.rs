//! Minimal designer-facing catalog CRUD. The pricing core only needs an
//! exam's question count and a flashcard's price; everything else about
//! the catalog lives elsewhere.

use axum::extract::{Extension, State};
use serde::Deserialize;

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path};
use crate::middleware::AuthedUser;
use crate::models::{
    CreateExam, CreateFlashcard, Exam, ExamAccess, Flashcard, UpdateExam, UpdateFlashcard,
};

const MIN_QUESTION_COUNT: u32 = 10;
const MAX_QUESTION_COUNT: u32 = 50;

#[derive(Debug, Deserialize)]
pub struct IdPath {
    pub id: String,
}

fn validate_question_count(question_count: u32) -> Result<()> {
    if !(MIN_QUESTION_COUNT..=MAX_QUESTION_COUNT).contains(&question_count) {
        return Err(AppError::BadRequest(
            "Question count must be between 10 and 50".into(),
        ));
    }
    Ok(())
}

pub async fn create_exam(
    State(state): State<AppState>,
    Extension(AuthedUser(user)): Extension<AuthedUser>,
    Json(input): Json<CreateExam>,
) -> Result<Json<Exam>> {
    validate_question_count(input.question_count)?;
    if input.title.trim().is_empty() {
        return Err(AppError::BadRequest("Title is required".into()));
    }

    let conn = state.db.get()?;
    let exam = queries::create_exam(&conn, &user.id, &input)?;
    Ok(Json(exam))
}

pub async fn list_my_exams(
    State(state): State<AppState>,
    Extension(AuthedUser(user)): Extension<AuthedUser>,
) -> Result<Json<Vec<Exam>>> {
    let conn = state.db.get()?;
    let exams = queries::list_exams_by_designer(&conn, &user.id)?;
    Ok(Json(exams))
}

pub async fn get_exam(
    State(state): State<AppState>,
    Path(path): Path<IdPath>,
) -> Result<Json<Exam>> {
    let conn = state.db.get()?;
    let exam = queries::get_exam_by_id(&conn, &path.id)?
        .ok_or_else(|| AppError::NotFound("Exam not found".into()))?;
    Ok(Json(exam))
}

pub async fn update_exam(
    State(state): State<AppState>,
    Extension(AuthedUser(user)): Extension<AuthedUser>,
    Path(path): Path<IdPath>,
    Json(input): Json<UpdateExam>,
) -> Result<Json<Exam>> {
    if let Some(question_count) = input.question_count {
        validate_question_count(question_count)?;
    }

    let conn = state.db.get()?;
    let exam = queries::get_exam_by_id(&conn, &path.id)?
        .ok_or_else(|| AppError::NotFound("Exam not found".into()))?;
    if exam.designer_id != user.id {
        return Err(AppError::Forbidden("Not your exam".into()));
    }

    queries::update_exam(&conn, &path.id, &input)?;

    let exam = queries::get_exam_by_id(&conn, &path.id)?
        .ok_or_else(|| AppError::NotFound("Exam not found".into()))?;
    Ok(Json(exam))
}

/// Exams the caller has bought and still holds access to.
pub async fn list_library(
    State(state): State<AppState>,
    Extension(AuthedUser(user)): Extension<AuthedUser>,
) -> Result<Json<Vec<ExamAccess>>> {
    let conn = state.db.get()?;
    let access = queries::list_exam_access_for_user(&conn, &user.id)?;
    Ok(Json(access))
}

pub async fn create_flashcard(
    State(state): State<AppState>,
    Extension(AuthedUser(user)): Extension<AuthedUser>,
    Json(input): Json<CreateFlashcard>,
) -> Result<Json<Flashcard>> {
    if input.title.trim().is_empty() {
        return Err(AppError::BadRequest("Title is required".into()));
    }
    if matches!(input.price, Some(price) if price <= 0) {
        return Err(AppError::BadRequest("Price must be positive".into()));
    }

    let conn = state.db.get()?;
    let card = queries::create_flashcard(&conn, &user.id, &input)?;
    Ok(Json(card))
}

pub async fn update_flashcard(
    State(state): State<AppState>,
    Extension(AuthedUser(user)): Extension<AuthedUser>,
    Path(path): Path<IdPath>,
    Json(input): Json<UpdateFlashcard>,
) -> Result<Json<Flashcard>> {
    if matches!(input.price, Some(Some(price)) if price <= 0) {
        return Err(AppError::BadRequest("Price must be positive".into()));
    }

    let conn = state.db.get()?;
    let card = queries::get_flashcard_by_id(&conn, &path.id)?
        .ok_or_else(|| AppError::NotFound("Flashcard not found".into()))?;
    if card.designer_id != user.id {
        return Err(AppError::Forbidden("Not your flashcard".into()));
    }

    queries::update_flashcard(&conn, &path.id, &input)?;

    let card = queries::get_flashcard_by_id(&conn, &path.id)?
        .ok_or_else(|| AppError::NotFound("Flashcard not found".into()))?;
    Ok(Json(card))
}
