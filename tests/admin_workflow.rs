mod common;

use serde_json::{json, Value};
use uuid::Uuid;

use common::{spawn_app, test_config, token, TestApp};
use sanjeevani::db::models::booking::BookingStatus;
use sanjeevani::db::models::user::Role;

async fn list(app: &TestApp, status: Option<&str>) -> reqwest::Response {
    let mut request = app.client.get(app.url("/admin/bookings")).bearer_auth(app.admin_token());
    if let Some(status) = status {
        request = request.query(&[("status", status)]);
    }
    request.send().await.unwrap()
}

#[tokio::test]
async fn admin_routes_reject_non_admins() {
    let app = spawn_app(test_config()).await;
    let id = app.book_ok("09:00 AM").await;

    let response = app.client.get(app.url("/admin/bookings")).send().await.unwrap();
    assert_eq!(response.status(), 401);

    let response = app
        .client
        .get(app.url("/admin/bookings"))
        .bearer_auth(app.patient_token())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Admin access required");

    let response = app
        .client
        .put(app.url(&format!("/admin/bookings/{id}/approve")))
        .bearer_auth(app.patient_token())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
    assert!(app.memory.appointments().await.is_empty());
}

#[tokio::test]
async fn listing_is_newest_first_and_filterable() {
    let app = spawn_app(test_config()).await;
    let first = app.book_ok("09:00 AM").await;
    let second = app.book_ok("09:30 AM").await;
    let third = app.book_ok("10:00 AM").await;
    assert_eq!(app.decide(&second, "approve", json!({})).await.status(), 200);

    let response = list(&app, None).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![third.as_str(), second.as_str(), first.as_str()]);
    assert_eq!(body["data"][0]["requester"]["name"], "Asha");
    assert_eq!(body["data"][0]["requester"]["email"], "asha@example.com");
    assert_eq!(body["data"][0]["doctor"]["name"], "Dr. Vaidya");

    let body: Value = list(&app, Some("approved")).await.json().await.unwrap();
    let approved = body["data"].as_array().unwrap();
    assert_eq!(approved.len(), 1);
    assert_eq!(approved[0]["id"], second);

    let body: Value = list(&app, Some("PENDING")).await.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    assert_eq!(list(&app, Some("archived")).await.status(), 400);
}

#[tokio::test]
async fn approval_confirms_once() {
    let app = spawn_app(test_config()).await;
    let id = app.book_ok("11:00 AM").await;

    let response = app.decide(&id, "approve", json!({ "adminRemarks": "Bring reports" })).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["booking"]["status"], "APPROVED");
    assert_eq!(body["data"]["booking"]["adminRemarks"], "Bring reports");
    assert_eq!(body["data"]["booking"]["approvedBy"], app.admin.to_string());
    assert_eq!(body["data"]["appointment"]["bookingId"], id);
    assert_eq!(body["data"]["appointment"]["reason"], "Recurring migraine");

    let response = app.decide(&id, "approve", json!({})).await;
    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Booking already processed");
    assert_eq!(app.memory.appointments().await.len(), 1);
}

#[tokio::test]
async fn rejection_is_permissive() {
    let app = spawn_app(test_config()).await;
    let pending = app.book_ok("11:30 AM").await;

    let response = app
        .client
        .put(app.url(&format!("/admin/bookings/{pending}/reject")))
        .bearer_auth(app.admin_token())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["status"], "REJECTED");
    assert_eq!(body["data"]["adminRemarks"], "");

    // An approved booking can still be rejected; its appointment stays.
    let approved = app.book_ok("04:00 PM").await;
    assert_eq!(app.decide(&approved, "approve", json!({})).await.status(), 200);
    let response = app.decide(&approved, "reject", json!({ "adminRemarks": "Doctor on leave" })).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["status"], "REJECTED");
    assert_eq!(body["data"]["adminRemarks"], "Doctor on leave");

    assert_eq!(app.memory.appointments().await.len(), 1);
    assert_eq!(app.blocked(common::DATE).await, json!([]));
}

#[tokio::test]
async fn rejected_booking_cannot_be_approved() {
    for slot_guard in [false, true] {
        let mut config = test_config();
        config.slot_guard = slot_guard;
        let app = spawn_app(config).await;
        let id = app.book_ok("03:30 PM").await;
        assert_eq!(app.decide(&id, "reject", json!({})).await.status(), 200);

        let response = app.decide(&id, "approve", json!({})).await;
        assert_eq!(response.status(), 409);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["message"], "Booking already processed");
        assert!(app.memory.appointments().await.is_empty());
        assert_eq!(app.blocked(common::DATE).await, json!([]));
    }
}

#[tokio::test]
async fn unknown_booking_is_not_found() {
    let app = spawn_app(test_config()).await;
    for action in ["approve", "reject"] {
        let response = app.decide(&Uuid::new_v4().to_string(), action, json!({})).await;
        assert_eq!(response.status(), 404);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["message"], "Booking not found");
    }
}

#[tokio::test]
async fn two_pending_requests_can_both_be_approved_by_default() {
    let app = spawn_app(test_config()).await;
    let first = app.book_ok("02:30 PM").await;
    let second = app.book(&token(app.other_patient, Role::User), "02:30 PM").await;
    let second: Value = second.json().await.unwrap();
    let second = second["data"]["id"].as_str().unwrap().to_string();

    assert_eq!(app.decide(&first, "approve", json!({})).await.status(), 200);
    assert_eq!(app.decide(&second, "approve", json!({})).await.status(), 200);

    assert_eq!(app.memory.appointments().await.len(), 2);
    assert_eq!(app.blocked(common::DATE).await, json!(["02:30 PM", "02:30 PM"]));
}

#[tokio::test]
async fn slot_guard_keeps_one_approval_per_slot() {
    let mut config = test_config();
    config.slot_guard = true;
    let app = spawn_app(config).await;

    let first = app.book_ok("02:30 PM").await;
    let second = app.book_ok("02:30 PM").await;

    let (a, b) = tokio::join!(
        app.decide(&first, "approve", json!({})),
        app.decide(&second, "approve", json!({}))
    );
    let mut statuses = [a.status().as_u16(), b.status().as_u16()];
    statuses.sort_unstable();
    assert_eq!(statuses, [200, 409]);

    assert_eq!(app.memory.appointments().await.len(), 1);
    let approved = app
        .memory
        .bookings()
        .await
        .into_iter()
        .filter(|b| b.status == BookingStatus::Approved)
        .count();
    assert_eq!(approved, 1);

    let response = app.book(&app.patient_token(), "02:30 PM").await;
    assert_eq!(response.status(), 409);
}
