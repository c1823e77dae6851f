//! Revenue-sharing settings: the split invariant, override resolution, and
//! reset semantics.

use axum::http::StatusCode;
use serde_json::json;

use exampay::db::queries;
use exampay::finance::revenue;
use exampay::models::{RevenueSharingSettings, UserType};

mod common;
use common::*;

#[test]
fn split_never_leaks_a_unit() {
    let settings = RevenueSharingSettings {
        designer_share_percent: 70,
        platform_fee_percent: 30,
    };

    for amount in [1, 3, 7, 99, 101, 12_345, 999_999] {
        let split = revenue::split_amount(amount, &settings);
        assert_eq!(
            split.designer_share + split.platform_fee,
            amount,
            "amount {}",
            amount
        );
        assert!(split.designer_share >= 0);
        assert!(split.platform_fee >= 0);
    }
}

#[test]
fn split_share_is_floored_and_fee_takes_the_remainder() {
    let settings = RevenueSharingSettings {
        designer_share_percent: 33,
        platform_fee_percent: 67,
    };
    let split = revenue::split_amount(100, &settings);
    assert_eq!(split.designer_share, 33);
    assert_eq!(split.platform_fee, 67);

    let split = revenue::split_amount(101, &settings);
    assert_eq!(split.designer_share, 33); // floor(33.33)
    assert_eq!(split.platform_fee, 68);
}

#[tokio::test]
async fn default_settings_are_seventy_thirty() {
    let (state, _db) = create_test_state();

    let admin_key = {
        let conn = state.db.get().unwrap();
        create_test_admin(&conn).1
    };

    let app = exampay::app(state);
    let (status, body) = request(&app, "GET", "/admin/finance-settings", Some(&admin_key), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["designer_share_percent"], 70);
    assert_eq!(body["platform_fee_percent"], 30);
}

#[tokio::test]
async fn updating_global_settings_changes_future_splits() {
    let (state, _db) = create_test_state();

    let admin_key = {
        let conn = state.db.get().unwrap();
        create_test_admin(&conn).1
    };

    let app = exampay::app(state);

    let (status, _) = request(
        &app,
        "PUT",
        "/admin/finance-settings",
        Some(&admin_key),
        Some(json!({ "designer_share_percent": 60, "platform_fee_percent": 40 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = request(
        &app,
        "POST",
        "/admin/finance-settings/calculate-sharing",
        Some(&admin_key),
        Some(json!({ "amount": 1000 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["designer_share"], 600);
    assert_eq!(body["platform_fee"], 400);
    assert_eq!(body["designer_share_percent"], 60);
}

#[tokio::test]
async fn settings_must_sum_to_one_hundred() {
    let (state, _db) = create_test_state();

    let admin_key = {
        let conn = state.db.get().unwrap();
        create_test_admin(&conn).1
    };

    let app = exampay::app(state);

    for (designer, platform) in [(70, 40), (101, -1), (50, 49)] {
        let (status, _) = request(
            &app,
            "PUT",
            "/admin/finance-settings",
            Some(&admin_key),
            Some(json!({
                "designer_share_percent": designer,
                "platform_fee_percent": platform
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}/{}", designer, platform);
    }
}

#[tokio::test]
async fn per_exam_override_beats_global_until_reset() {
    let (state, _db) = create_test_state();

    let (admin_key, exam_id) = {
        let conn = state.db.get().unwrap();
        let (designer, _) = create_test_user(&conn, "Designer", UserType::Regular);
        let (_, admin_key) = create_test_admin(&conn);
        (admin_key, create_test_exam(&conn, &designer.id, 15).id)
    };

    let app = exampay::app(state.clone());

    let (status, _) = request(
        &app,
        "PUT",
        &format!("/admin/exams/{}/revenue-settings", exam_id),
        Some(&admin_key),
        Some(json!({ "designer_share_percent": 80, "platform_fee_percent": 20 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // With exam_id: the override. Without: the global default.
    let (_, body) = request(
        &app,
        "POST",
        "/admin/finance-settings/calculate-sharing",
        Some(&admin_key),
        Some(json!({ "amount": 1000, "exam_id": exam_id })),
    )
    .await;
    assert_eq!(body["designer_share"], 800);

    let (_, body) = request(
        &app,
        "POST",
        "/admin/finance-settings/calculate-sharing",
        Some(&admin_key),
        Some(json!({ "amount": 1000 })),
    )
    .await;
    assert_eq!(body["designer_share"], 700);

    // Reset removes the override row entirely.
    let (status, body) = request(
        &app,
        "DELETE",
        &format!("/admin/exams/{}/revenue-settings", exam_id),
        Some(&admin_key),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reset"], true);

    // A later global change now applies to this exam retroactively.
    let (status, _) = request(
        &app,
        "PUT",
        "/admin/finance-settings",
        Some(&admin_key),
        Some(json!({ "designer_share_percent": 55, "platform_fee_percent": 45 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = request(
        &app,
        "POST",
        "/admin/finance-settings/calculate-sharing",
        Some(&admin_key),
        Some(json!({ "amount": 1000, "exam_id": exam_id })),
    )
    .await;
    assert_eq!(body["designer_share"], 550);

    {
        let conn = state.db.get().unwrap();
        assert!(queries::get_exam_revenue_settings(&conn, &exam_id).unwrap().is_none());
    }
}

#[tokio::test]
async fn override_drives_actual_settlement() {
    let (state, _db) = create_test_state();

    let (designer, buyer_key, admin_key, exam_id) = {
        let conn = state.db.get().unwrap();
        let (designer, _) = create_test_user(&conn, "Designer", UserType::Regular);
        let (buyer, buyer_key) = create_test_user(&conn, "Buyer", UserType::Regular);
        let (_, admin_key) = create_test_admin(&conn);
        let exam = create_test_exam(&conn, &designer.id, 15);
        fund_wallet(&conn, &buyer.id, 1000);
        (designer, buyer_key, admin_key, exam.id)
    };

    let app = exampay::app(state.clone());

    let (status, _) = request(
        &app,
        "PUT",
        &format!("/admin/exams/{}/revenue-settings", exam_id),
        Some(&admin_key),
        Some(json!({ "designer_share_percent": 90, "platform_fee_percent": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // First purchase: 800 - 10% = 720; override gives the designer 90%.
    let (status, _) = request(
        &app,
        "POST",
        "/payments",
        Some(&buyer_key),
        Some(json!({ "exam_id": exam_id, "payment_method": "wallet" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let conn = state.db.get().unwrap();
    let wallet = queries::get_wallet(&conn, &designer.id).unwrap().unwrap();
    assert_eq!(wallet.balance, 648); // floor(720 * 0.90)
}

#[tokio::test]
async fn calculate_sharing_validates_input() {
    let (state, _db) = create_test_state();

    let admin_key = {
        let conn = state.db.get().unwrap();
        create_test_admin(&conn).1
    };

    let app = exampay::app(state);

    let (status, _) = request(
        &app,
        "POST",
        "/admin/finance-settings/calculate-sharing",
        Some(&admin_key),
        Some(json!({ "amount": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = request(
        &app,
        "POST",
        "/admin/finance-settings/calculate-sharing",
        Some(&admin_key),
        Some(json!({ "amount": 1000, "exam_id": "missing" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn override_endpoints_check_exam_existence_and_validity() {
    let (state, _db) = create_test_state();

    let (admin_key, exam_id) = {
        let conn = state.db.get().unwrap();
        let (designer, _) = create_test_user(&conn, "Designer", UserType::Regular);
        let (_, admin_key) = create_test_admin(&conn);
        (admin_key, create_test_exam(&conn, &designer.id, 15).id)
    };

    let app = exampay::app(state);

    let (status, _) = request(
        &app,
        "PUT",
        "/admin/exams/missing/revenue-settings",
        Some(&admin_key),
        Some(json!({ "designer_share_percent": 80, "platform_fee_percent": 20 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = request(
        &app,
        "PUT",
        &format!("/admin/exams/{}/revenue-settings", exam_id),
        Some(&admin_key),
        Some(json!({ "designer_share_percent": 80, "platform_fee_percent": 30 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Resetting an exam that never had an override reports reset: false.
    let (status, body) = request(
        &app,
        "DELETE",
        &format!("/admin/exams/{}/revenue-settings", exam_id),
        Some(&admin_key),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reset"], false);
}
