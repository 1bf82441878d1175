//! API integration tests
//!
//! These run against a live server with a migrated database:
//! `cargo run` in one terminal, `cargo test -- --ignored` in another.

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Helper to get an admin token via the bootstrap account
async fn get_admin_token(client: &Client) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": "admin@lendhub.local",
            "password": "admin"
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Register a fresh patron and return (token, user_id)
async fn register_patron(client: &Client, tag: &str) -> (String, i64) {
    let email = unique_email(tag);
    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "full_name": format!("Patron {}", tag),
            "email": email,
            "password": "patron-pass-123"
        }))
        .send()
        .await
        .expect("Failed to send register request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse register response");
    let token = body["token"].as_str().expect("No token").to_string();
    let user_id = body["user"]["id"].as_i64().expect("No user ID");
    (token, user_id)
}

fn unique_email(tag: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{}@test.lendhub.local", tag, nanos)
}

/// Create a book as admin and return its id
async fn create_book(client: &Client, admin_token: &str, title: &str, copies: i32) -> i64 {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", admin_token))
        .json(&json!({
            "title": title,
            "author": "Integration Test",
            "total_copies": copies
        }))
        .send()
        .await
        .expect("Failed to send create book request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse create response");
    body["id"].as_i64().expect("No book ID")
}

async fn delete_book(client: &Client, admin_token: &str, book_id: i64) {
    let _ = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .send()
        .await;
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_readiness_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
#[ignore]
async fn test_login() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": "admin@lendhub.local",
            "password": "admin"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["user"]["role"], "ADMIN");
    // Password hashes never leave the server
    assert!(body["user"]["password_hash"].is_null());
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": "admin@lendhub.local",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_register_and_me() {
    let client = Client::new();
    let (token, user_id) = register_patron(&client, "me").await;

    let response = client
        .get(format!("{}/auth/me", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["id"].as_i64(), Some(user_id));
    assert_eq!(body["role"], "PATRON");
    assert_eq!(body["status"], "ACTIVE");
}

#[tokio::test]
#[ignore]
async fn test_register_duplicate_email() {
    let client = Client::new();
    let email = unique_email("dup");

    for expected in [201, 409] {
        let response = client
            .post(format!("{}/auth/register", BASE_URL))
            .json(&json!({
                "full_name": "Duplicate Candidate",
                "email": email,
                "password": "patron-pass-123"
            }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), expected);
    }
}

#[tokio::test]
#[ignore]
async fn test_list_books_requires_auth() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_list_books() {
    let client = Client::new();
    let token = get_admin_token(&client).await;

    let response = client
        .get(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["items"].is_array());
    assert!(body["total"].is_number());
}

#[tokio::test]
#[ignore]
async fn test_create_book_requires_admin() {
    let client = Client::new();
    let (patron_token, _) = register_patron(&client, "no-create").await;

    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", patron_token))
        .json(&json!({
            "title": "Forbidden Book",
            "author": "Nobody"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_create_update_delete_book() {
    let client = Client::new();
    let token = get_admin_token(&client).await;
    let book_id = create_book(&client, &token, "CRUD Cycle", 2).await;

    // Capacity edit routes through the ledger
    let response = client
        .put(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "total_copies": 5 }))
        .send()
        .await
        .expect("Failed to send update request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse update response");
    assert_eq!(body["total_copies"].as_i64(), Some(5));
    assert_eq!(body["available_copies"].as_i64(), Some(5));

    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send delete request");

    assert_eq!(response.status(), 204);
}

#[tokio::test]
#[ignore]
async fn test_borrow_and_return_flow() {
    let client = Client::new();
    let admin = get_admin_token(&client).await;
    let book_id = create_book(&client, &admin, "Borrow Flow", 3).await;
    let (patron, patron_id) = register_patron(&client, "borrower").await;

    // Borrow against own account
    let response = client
        .post(format!("{}/loans/borrow", BASE_URL))
        .header("Authorization", format!("Bearer {}", patron))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send borrow request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse borrow response");
    let loan_id = body["loan"]["id"].as_i64().expect("No loan ID");
    assert_eq!(body["loan"]["user_id"].as_i64(), Some(patron_id));
    assert_eq!(body["loan"]["status"], "BORROWED");
    // Reservation is reflected in the same response
    assert_eq!(body["book"]["available_copies"].as_i64(), Some(2));

    // Second borrow of the same title is refused
    let response = client
        .post(format!("{}/loans/borrow", BASE_URL))
        .header("Authorization", format!("Bearer {}", patron))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send duplicate borrow");

    assert_eq!(response.status(), 400);

    // Patrons see their own loans
    let response = client
        .get(format!("{}/loans/user/{}/active", BASE_URL, patron_id))
        .header("Authorization", format!("Bearer {}", patron))
        .send()
        .await
        .expect("Failed to list active loans");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse loans");
    assert_eq!(body.as_array().map(Vec::len), Some(1));

    // Return is an admin operation
    let response = client
        .put(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", patron))
        .send()
        .await
        .expect("Failed to send patron return");
    assert_eq!(response.status(), 403);

    let response = client
        .put(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .expect("Failed to send return request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse return response");
    assert_eq!(body["loan"]["status"], "RETURNED");
    assert_eq!(body["book"]["available_copies"].as_i64(), Some(3));
    // On-time return assesses no penalty
    assert!(body["penalty"].is_null());

    // Returning a closed loan is a conflict
    let response = client
        .put(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .expect("Failed to send duplicate return");
    assert_eq!(response.status(), 409);

    delete_book(&client, &admin, book_id).await;
}

#[tokio::test]
#[ignore]
async fn test_concurrent_borrow_last_copy() {
    let client = Client::new();
    let admin = get_admin_token(&client).await;
    let book_id = create_book(&client, &admin, "Last Copy Race", 1).await;
    let (first, _) = register_patron(&client, "race-a").await;
    let (second, _) = register_patron(&client, "race-b").await;

    let borrow = |token: String| {
        let client = client.clone();
        async move {
            client
                .post(format!("{}/loans/borrow", BASE_URL))
                .header("Authorization", format!("Bearer {}", token))
                .json(&json!({ "book_id": book_id }))
                .send()
                .await
                .expect("Failed to send borrow request")
                .status()
                .as_u16()
        }
    };

    let (a, b) = tokio::join!(borrow(first), borrow(second));

    // Exactly one of the two racers gets the copy
    let mut outcomes = [a, b];
    outcomes.sort();
    assert_eq!(outcomes, [201, 400]);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_double_return() {
    let client = Client::new();
    let admin = get_admin_token(&client).await;
    let book_id = create_book(&client, &admin, "Double Return Race", 1).await;
    let (patron, _) = register_patron(&client, "race-return").await;

    let response = client
        .post(format!("{}/loans/borrow", BASE_URL))
        .header("Authorization", format!("Bearer {}", patron))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send borrow request");
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse borrow response");
    let loan_id = body["loan"]["id"].as_i64().expect("No loan ID");

    let ret = || {
        let client = client.clone();
        let admin = admin.clone();
        async move {
            client
                .put(format!("{}/loans/{}/return", BASE_URL, loan_id))
                .header("Authorization", format!("Bearer {}", admin))
                .send()
                .await
                .expect("Failed to send return request")
                .status()
                .as_u16()
        }
    };

    let (a, b) = tokio::join!(ret(), ret());

    // One return wins, the other observes the closed loan
    let mut outcomes = [a, b];
    outcomes.sort();
    assert_eq!(outcomes, [200, 409]);

    delete_book(&client, &admin, book_id).await;
}

#[tokio::test]
#[ignore]
async fn test_patron_cannot_list_all_loans() {
    let client = Client::new();
    let (patron, _) = register_patron(&client, "no-list").await;

    let response = client
        .get(format!("{}/loans", BASE_URL))
        .header("Authorization", format!("Bearer {}", patron))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_patron_cannot_read_other_users_records() {
    let client = Client::new();
    let (patron, _) = register_patron(&client, "peeker").await;
    let (_, other_id) = register_patron(&client, "peeked").await;

    for path in [
        format!("{}/loans/user/{}", BASE_URL, other_id),
        format!("{}/penalties/user/{}", BASE_URL, other_id),
        format!("{}/users/{}", BASE_URL, other_id),
    ] {
        let response = client
            .get(path)
            .header("Authorization", format!("Bearer {}", patron))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), 403);
    }
}

#[tokio::test]
#[ignore]
async fn test_suspended_user_cannot_borrow() {
    let client = Client::new();
    let admin = get_admin_token(&client).await;
    let book_id = create_book(&client, &admin, "Suspension Gate", 1).await;
    let (patron, patron_id) = register_patron(&client, "suspended").await;

    let response = client
        .put(format!("{}/users/{}/suspend", BASE_URL, patron_id))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .expect("Failed to send suspend request");
    assert!(response.status().is_success());

    // The still-valid token no longer gets past the borrow gate
    let response = client
        .post(format!("{}/loans/borrow", BASE_URL))
        .header("Authorization", format!("Bearer {}", patron))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send borrow request");
    assert_eq!(response.status(), 403);

    // Reinstating lifts the gate
    let response = client
        .put(format!("{}/users/{}/activate", BASE_URL, patron_id))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .expect("Failed to send activate request");
    assert!(response.status().is_success());

    let response = client
        .post(format!("{}/loans/borrow", BASE_URL))
        .header("Authorization", format!("Bearer {}", patron))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send borrow request");
    assert_eq!(response.status(), 201);
}

#[tokio::test]
#[ignore]
async fn test_capacity_cannot_drop_below_outstanding() {
    let client = Client::new();
    let admin = get_admin_token(&client).await;
    let book_id = create_book(&client, &admin, "Capacity Floor", 2).await;
    let (patron, _) = register_patron(&client, "capacity").await;

    let response = client
        .post(format!("{}/loans/borrow", BASE_URL))
        .header("Authorization", format!("Bearer {}", patron))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send borrow request");
    assert_eq!(response.status(), 201);

    // One copy is out, so shrinking to zero would strand it
    let response = client
        .put(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&json!({ "total_copies": 0 }))
        .send()
        .await
        .expect("Failed to send capacity update");
    assert_eq!(response.status(), 400);

    // Shrinking to one is fine: the remaining shelf copy absorbs the cut
    let response = client
        .put(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&json!({ "total_copies": 1 }))
        .send()
        .await
        .expect("Failed to send capacity update");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["total_copies"].as_i64(), Some(1));
    assert_eq!(body["available_copies"].as_i64(), Some(0));
}

#[tokio::test]
#[ignore]
async fn test_delete_book_with_open_loan_conflicts() {
    let client = Client::new();
    let admin = get_admin_token(&client).await;
    let book_id = create_book(&client, &admin, "Undeletable", 1).await;
    let (patron, _) = register_patron(&client, "holder").await;

    let response = client
        .post(format!("{}/loans/borrow", BASE_URL))
        .header("Authorization", format!("Bearer {}", patron))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send borrow request");
    assert_eq!(response.status(), 201);

    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .expect("Failed to send delete request");
    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_penalty_listing_and_totals() {
    let client = Client::new();
    let admin = get_admin_token(&client).await;
    let (patron, patron_id) = register_patron(&client, "penalties").await;

    // A fresh account owes nothing
    let response = client
        .get(format!("{}/penalties/user/{}/total", BASE_URL, patron_id))
        .header("Authorization", format!("Bearer {}", patron))
        .send()
        .await
        .expect("Failed to send total request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse total");
    assert_eq!(body["user_id"].as_i64(), Some(patron_id));
    assert_eq!(body["total_unpaid"], "0");

    // Admin-only listing
    let response = client
        .get(format!("{}/penalties", BASE_URL))
        .header("Authorization", format!("Bearer {}", patron))
        .send()
        .await
        .expect("Failed to send list request");
    assert_eq!(response.status(), 403);

    let response = client
        .get(format!("{}/penalties", BASE_URL))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .expect("Failed to send list request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse list");
    assert!(body["items"].is_array());
}

#[tokio::test]
#[ignore]
async fn test_get_stats() {
    let client = Client::new();
    let token = get_admin_token(&client).await;

    let response = client
        .get(format!("{}/stats", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["total_books"].is_number());
    assert!(body["total_users"].is_number());
    assert!(body["active_loans"].is_number());
    assert!(body["overdue_loans"].is_number());
    assert!(body["unpaid_penalties"].is_number());
    assert!(body["unpaid_amount"].is_string());
}

#[tokio::test]
#[ignore]
async fn test_stats_require_admin() {
    let client = Client::new();
    let (patron, _) = register_patron(&client, "no-stats").await;

    let response = client
        .get(format!("{}/stats", BASE_URL))
        .header("Authorization", format!("Bearer {}", patron))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}
