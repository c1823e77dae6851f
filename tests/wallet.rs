//! Wallet summaries and the withdrawal request lifecycle.

use axum::http::StatusCode;
use serde_json::json;

use exampay::db::queries;
use exampay::models::{TransactionStatus, UserType, WithdrawalStatus};

mod common;
use common::*;

#[tokio::test]
async fn empty_wallet_reads_as_zeroes() {
    let (state, _db) = create_test_state();

    let (_, key) = {
        let conn = state.db.get().unwrap();
        create_test_user(&conn, "Newcomer", UserType::Regular)
    };

    let app = exampay::app(state);
    let (status, body) = request(&app, "GET", "/wallet", Some(&key), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], 0);
    assert_eq!(body["available_balance"], 0);
    assert_eq!(body["pending_withdrawals"], 0);
}

#[tokio::test]
async fn withdrawal_request_reserves_funds() {
    let (state, _db) = create_test_state();

    let (designer, key) = {
        let conn = state.db.get().unwrap();
        let (designer, key) = create_test_user(&conn, "Designer", UserType::Regular);
        queries::credit_earning(&conn, &designer.id, 1000).unwrap();
        (designer, key)
    };

    let app = exampay::app(state.clone());

    let (status, body) = request(
        &app,
        "POST",
        "/wallet/withdrawals",
        Some(&key),
        Some(json!({ "amount": 400 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["amount"], 400);

    let (_, wallet) = request(&app, "GET", "/wallet", Some(&key), None).await;
    assert_eq!(wallet["balance"], 1000);
    assert_eq!(wallet["pending_withdrawals"], 400);
    assert_eq!(wallet["available_balance"], 600);

    // The paired ledger row is pending too.
    let conn = state.db.get().unwrap();
    let tx_id = body["transaction_id"].as_str().unwrap();
    let tx = queries::get_transaction_by_id(&conn, tx_id).unwrap().unwrap();
    assert_eq!(tx.status, TransactionStatus::Pending);
    assert_eq!(tx.user_id, designer.id);
}

#[tokio::test]
async fn withdrawal_cannot_exceed_available_balance() {
    let (state, _db) = create_test_state();

    let key = {
        let conn = state.db.get().unwrap();
        let (designer, key) = create_test_user(&conn, "Designer", UserType::Regular);
        queries::credit_earning(&conn, &designer.id, 500).unwrap();
        key
    };

    let app = exampay::app(state);

    let (status, _) = request(
        &app,
        "POST",
        "/wallet/withdrawals",
        Some(&key),
        Some(json!({ "amount": 600 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Reserving twice past the available balance also fails.
    let (status, _) = request(
        &app,
        "POST",
        "/wallet/withdrawals",
        Some(&key),
        Some(json!({ "amount": 400 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = request(
        &app,
        "POST",
        "/wallet/withdrawals",
        Some(&key),
        Some(json!({ "amount": 200 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn withdrawal_amount_must_be_positive() {
    let (state, _db) = create_test_state();

    let key = {
        let conn = state.db.get().unwrap();
        create_test_user(&conn, "Designer", UserType::Regular).1
    };

    let app = exampay::app(state);
    for amount in [0, -50] {
        let (status, _) = request(
            &app,
            "POST",
            "/wallet/withdrawals",
            Some(&key),
            Some(json!({ "amount": amount })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "amount {}", amount);
    }
}

#[tokio::test]
async fn approving_a_withdrawal_moves_funds_out() {
    let (state, _db) = create_test_state();

    let (designer, key, admin_key) = {
        let conn = state.db.get().unwrap();
        let (designer, key) = create_test_user(&conn, "Designer", UserType::Regular);
        let (_, admin_key) = create_test_admin(&conn);
        queries::credit_earning(&conn, &designer.id, 1000).unwrap();
        (designer, key, admin_key)
    };

    let app = exampay::app(state.clone());

    let (_, body) = request(
        &app,
        "POST",
        "/wallet/withdrawals",
        Some(&key),
        Some(json!({ "amount": 400 })),
    )
    .await;
    let request_id = body["id"].as_str().unwrap().to_string();
    let wd_tx_id = body["transaction_id"].as_str().unwrap().to_string();

    let (status, body) = request(
        &app,
        "PUT",
        &format!("/admin/withdrawal-requests/{}", request_id),
        Some(&admin_key),
        Some(json!({ "action": "APPROVE", "admin_notes": "paid via bank transfer" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "approved");
    assert_eq!(body["admin_notes"], "paid via bank transfer");
    assert!(body["processed_at"].as_i64().is_some());

    let conn = state.db.get().unwrap();
    let wallet = queries::get_wallet(&conn, &designer.id).unwrap().unwrap();
    assert_eq!(wallet.balance, 600);
    assert_eq!(wallet.pending_withdrawals, 0);
    assert_eq!(wallet.total_withdrawals, 400);
    assert_eq!(wallet.available_balance(), 600);

    let tx = queries::get_transaction_by_id(&conn, &wd_tx_id).unwrap().unwrap();
    assert_eq!(tx.status, TransactionStatus::Completed);
}

#[tokio::test]
async fn rejecting_a_withdrawal_releases_the_reservation() {
    let (state, _db) = create_test_state();

    let (designer, key, admin_key) = {
        let conn = state.db.get().unwrap();
        let (designer, key) = create_test_user(&conn, "Designer", UserType::Regular);
        let (_, admin_key) = create_test_admin(&conn);
        queries::credit_earning(&conn, &designer.id, 1000).unwrap();
        (designer, key, admin_key)
    };

    let app = exampay::app(state.clone());

    let (_, body) = request(
        &app,
        "POST",
        "/wallet/withdrawals",
        Some(&key),
        Some(json!({ "amount": 400 })),
    )
    .await;
    let request_id = body["id"].as_str().unwrap().to_string();
    let wd_tx_id = body["transaction_id"].as_str().unwrap().to_string();

    let (status, body) = request(
        &app,
        "PUT",
        &format!("/admin/withdrawal-requests/{}", request_id),
        Some(&admin_key),
        Some(json!({ "action": "REJECT" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "rejected");

    let conn = state.db.get().unwrap();
    let wallet = queries::get_wallet(&conn, &designer.id).unwrap().unwrap();
    assert_eq!(wallet.balance, 1000, "balance untouched");
    assert_eq!(wallet.pending_withdrawals, 0);
    assert_eq!(wallet.total_withdrawals, 0);
    assert_eq!(wallet.available_balance(), 1000);

    let tx = queries::get_transaction_by_id(&conn, &wd_tx_id).unwrap().unwrap();
    assert_eq!(tx.status, TransactionStatus::Failed);
}

#[tokio::test]
async fn processing_a_withdrawal_twice_fails() {
    let (state, _db) = create_test_state();

    let (key, admin_key) = {
        let conn = state.db.get().unwrap();
        let (designer, key) = create_test_user(&conn, "Designer", UserType::Regular);
        let (_, admin_key) = create_test_admin(&conn);
        queries::credit_earning(&conn, &designer.id, 1000).unwrap();
        (key, admin_key)
    };

    let app = exampay::app(state);

    let (_, body) = request(
        &app,
        "POST",
        "/wallet/withdrawals",
        Some(&key),
        Some(json!({ "amount": 300 })),
    )
    .await;
    let request_id = body["id"].as_str().unwrap().to_string();

    let (status, _) = request(
        &app,
        "PUT",
        &format!("/admin/withdrawal-requests/{}", request_id),
        Some(&admin_key),
        Some(json!({ "action": "APPROVE" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    for action in ["APPROVE", "REJECT"] {
        let (status, _) = request(
            &app,
            "PUT",
            &format!("/admin/withdrawal-requests/{}", request_id),
            Some(&admin_key),
            Some(json!({ "action": action })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "action {}", action);
    }
}

#[tokio::test]
async fn withdrawal_admin_endpoints_enforce_roles() {
    let (state, _db) = create_test_state();

    let (user_key, admin_key) = {
        let conn = state.db.get().unwrap();
        let (_, user_key) = create_test_user(&conn, "Someone", UserType::Regular);
        let (_, admin_key) = create_test_admin(&conn);
        (user_key, admin_key)
    };

    let app = exampay::app(state);

    let (status, _) = request(&app, "GET", "/admin/withdrawal-requests", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = request(
        &app,
        "GET",
        "/admin/withdrawal-requests",
        Some(&user_key),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = request(
        &app,
        "GET",
        "/admin/withdrawal-requests?status=pending",
        Some(&admin_key),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);

    let (status, _) = request(
        &app,
        "PUT",
        "/admin/withdrawal-requests/missing",
        Some(&admin_key),
        Some(json!({ "action": "APPROVE" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn withdrawal_list_filters_by_status() {
    let (state, _db) = create_test_state();

    let (key, admin_key) = {
        let conn = state.db.get().unwrap();
        let (designer, key) = create_test_user(&conn, "Designer", UserType::Regular);
        let (_, admin_key) = create_test_admin(&conn);
        queries::credit_earning(&conn, &designer.id, 1000).unwrap();
        (key, admin_key)
    };

    let app = exampay::app(state.clone());

    for amount in [100, 200] {
        let (status, _) = request(
            &app,
            "POST",
            "/wallet/withdrawals",
            Some(&key),
            Some(json!({ "amount": amount })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = request(
        &app,
        "GET",
        "/admin/withdrawal-requests?status=pending",
        Some(&admin_key),
        None,
    )
    .await;
    assert_eq!(body["total"], 2);

    // Approve one and the pending filter shrinks.
    let request_id = body["items"][0]["id"].as_str().unwrap().to_string();
    let (status, _) = request(
        &app,
        "PUT",
        &format!("/admin/withdrawal-requests/{}", request_id),
        Some(&admin_key),
        Some(json!({ "action": "APPROVE" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = request(
        &app,
        "GET",
        "/admin/withdrawal-requests?status=pending",
        Some(&admin_key),
        None,
    )
    .await;
    assert_eq!(body["total"], 1);

    let (_, body) = request(
        &app,
        "GET",
        "/admin/withdrawal-requests?status=approved",
        Some(&admin_key),
        None,
    )
    .await;
    assert_eq!(body["total"], 1);

    {
        let conn = state.db.get().unwrap();
        let (requests, total) =
            queries::list_withdrawal_requests(&conn, Some(WithdrawalStatus::Approved), 10, 0)
                .unwrap();
        assert_eq!(total, 1);
        assert_eq!(requests[0].status, WithdrawalStatus::Approved);
    }
}

#[tokio::test]
async fn transaction_history_lists_wallet_activity() {
    let (state, _db) = create_test_state();

    let key = {
        let conn = state.db.get().unwrap();
        let (designer, key) = create_test_user(&conn, "Designer", UserType::Regular);
        queries::credit_earning(&conn, &designer.id, 1000).unwrap();
        key
    };

    let app = exampay::app(state);

    let (_, body) = request(
        &app,
        "POST",
        "/wallet/withdrawals",
        Some(&key),
        Some(json!({ "amount": 250 })),
    )
    .await;
    assert_eq!(body["status"], "pending");

    let (status, body) = request(&app, "GET", "/wallet/transactions", Some(&key), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["tx_type"], "withdrawal");
    assert_eq!(body["items"][0]["amount"], 250);
}
