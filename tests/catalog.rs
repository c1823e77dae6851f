//! Designer catalog endpoints: the minimal surface the pricing core needs.

use axum::http::StatusCode;
use serde_json::json;

use exampay::models::UserType;

mod common;
use common::*;

#[tokio::test]
async fn exam_creation_enforces_question_count_bounds() {
    let (state, _db) = create_test_state();

    let key = {
        let conn = state.db.get().unwrap();
        create_test_user(&conn, "Designer", UserType::Regular).1
    };

    let app = exampay::app(state);

    for count in [9, 51] {
        let (status, _) = request(
            &app,
            "POST",
            "/exams",
            Some(&key),
            Some(json!({ "title": "Algebra I", "question_count": count })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "count {}", count);
    }

    let (status, body) = request(
        &app,
        "POST",
        "/exams",
        Some(&key),
        Some(json!({ "title": "Algebra I", "question_count": 30 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["question_count"], 30);

    let (status, body) = request(&app, "GET", "/exams", Some(&key), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn only_the_designer_can_update_an_exam() {
    let (state, _db) = create_test_state();

    let (owner_key, other_key, exam_id) = {
        let conn = state.db.get().unwrap();
        let (owner, owner_key) = create_test_user(&conn, "Owner", UserType::Regular);
        let (_, other_key) = create_test_user(&conn, "Other", UserType::Regular);
        (owner_key, other_key, create_test_exam(&conn, &owner.id, 20).id)
    };

    let app = exampay::app(state);

    let (status, _) = request(
        &app,
        "PUT",
        &format!("/exams/{}", exam_id),
        Some(&other_key),
        Some(json!({ "title": "Hijacked" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = request(
        &app,
        "PUT",
        &format!("/exams/{}", exam_id),
        Some(&owner_key),
        Some(json!({ "title": "Algebra II", "question_count": 35 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Algebra II");
    assert_eq!(body["question_count"], 35);
}

#[tokio::test]
async fn flashcard_price_can_be_cleared_back_to_default() {
    let (state, _db) = create_test_state();

    let (key, card_id) = {
        let conn = state.db.get().unwrap();
        let (designer, key) = create_test_user(&conn, "Designer", UserType::Regular);
        (key, create_test_flashcard(&conn, &designer.id, Some(300)).id)
    };

    let app = exampay::app(state);

    // Explicit null clears the price; omitting the field leaves it alone.
    let (status, body) = request(
        &app,
        "PUT",
        &format!("/flashcards/{}", card_id),
        Some(&key),
        Some(json!({ "price": null })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["price"].is_null());

    let (_, body) = request(
        &app,
        "POST",
        "/calculate-flashcard-price",
        None,
        Some(json!({ "flashcard_ids": [card_id] })),
    )
    .await;
    assert_eq!(body["base_price"], 100, "default price after clearing");
}

#[tokio::test]
async fn library_lists_purchased_exams() {
    let (state, _db) = create_test_state();

    let (buyer_key, exam_id) = {
        let conn = state.db.get().unwrap();
        let (designer, _) = create_test_user(&conn, "Designer", UserType::Regular);
        let (buyer, buyer_key) = create_test_user(&conn, "Buyer", UserType::Regular);
        let exam = create_test_exam(&conn, &designer.id, 15);
        fund_wallet(&conn, &buyer.id, 1000);
        (buyer_key, exam.id)
    };

    let app = exampay::app(state);

    let (_, body) = request(&app, "GET", "/library", Some(&buyer_key), None).await;
    assert_eq!(body.as_array().unwrap().len(), 0);

    let (status, _) = request(
        &app,
        "POST",
        "/payments",
        Some(&buyer_key),
        Some(json!({ "exam_id": exam_id, "payment_method": "wallet" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = request(&app, "GET", "/library", Some(&buyer_key), None).await;
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["exam_id"], exam_id);
}

#[tokio::test]
async fn flashcard_prices_must_be_positive() {
    let (state, _db) = create_test_state();

    let key = {
        let conn = state.db.get().unwrap();
        create_test_user(&conn, "Designer", UserType::Regular).1
    };

    let app = exampay::app(state);
    let (status, _) = request(
        &app,
        "POST",
        "/flashcards",
        Some(&key),
        Some(json!({ "title": "Vocab", "price": -5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
