#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, Response};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use uuid::Uuid;

use sanjeevani::app_state::AppState;
use sanjeevani::config::Config;
use sanjeevani::db::memory::MemoryStore;
use sanjeevani::db::models::doctor::Doctor;
use sanjeevani::db::models::user::{Role, User};
use sanjeevani::db::store::Store;
use sanjeevani::middleware::auth::Claims;

pub const SECRET: &str = "integration-secret";
pub const DATE: &str = "2025-01-10";

pub struct TestApp {
    pub base: String,
    pub client: Client,
    pub memory: Arc<MemoryStore>,
    pub patient: Uuid,
    pub other_patient: Uuid,
    pub admin: Uuid,
    pub doctor: Uuid,
    pub unavailable_doctor: Uuid,
}

pub fn test_config() -> Config {
    Config::with_secret(SECRET)
}

/// Serves the real router on an ephemeral port over a seeded in-memory store.
pub async fn spawn_app(config: Config) -> TestApp {
    let memory = Arc::new(MemoryStore::default());
    let now = Utc::now().naive_utc();

    let seed_user = |name: &str, role: Role| User {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        phone: None,
        role,
        created_at: now,
    };
    let patient = seed_user("Asha", Role::User);
    let other_patient = seed_user("Ravi", Role::User);
    let admin = seed_user("Meera", Role::Admin);

    let doctor = Doctor {
        id: Uuid::new_v4(),
        name: "Dr. Vaidya".into(),
        specialty: "Panchakarma".into(),
        available: true,
        created_at: now,
    };
    let unavailable = Doctor {
        id: Uuid::new_v4(),
        name: "Dr. Acharya".into(),
        specialty: "Rasayana".into(),
        available: false,
        created_at: now,
    };

    let ids = (patient.id, other_patient.id, admin.id, doctor.id, unavailable.id);
    for user in [patient, other_patient, admin] {
        memory.insert_user(user).await;
    }
    memory.insert_doctor(doctor).await;
    memory.insert_doctor(unavailable).await;

    let state = AppState::new(Store::Memory(memory.clone()), config);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, sanjeevani::app(state)).await.unwrap();
    });

    TestApp {
        base: format!("http://{addr}"),
        client: Client::new(),
        memory,
        patient: ids.0,
        other_patient: ids.1,
        admin: ids.2,
        doctor: ids.3,
        unavailable_doctor: ids.4,
    }
}

pub fn token(user_id: Uuid, role: Role) -> String {
    Claims::new(user_id, role, Duration::from_secs(3600))
        .encode(SECRET)
        .unwrap()
}

pub fn booking_body(doctor: Uuid, time: &str) -> Value {
    json!({
        "doctorId": doctor,
        "reason": "Recurring migraine",
        "requestedDate": DATE,
        "requestedTime": time,
    })
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn patient_token(&self) -> String {
        token(self.patient, Role::User)
    }

    pub fn admin_token(&self) -> String {
        token(self.admin, Role::Admin)
    }

    pub async fn book(&self, token: &str, time: &str) -> Response {
        self.client
            .post(self.url("/bookings"))
            .bearer_auth(token)
            .json(&booking_body(self.doctor, time))
            .send()
            .await
            .unwrap()
    }

    /// Creates a booking as the patient and returns its id.
    pub async fn book_ok(&self, time: &str) -> String {
        let response = self.book(&self.patient_token(), time).await;
        assert_eq!(response.status(), 201);
        let body: Value = response.json().await.unwrap();
        body["data"]["id"].as_str().unwrap().to_string()
    }

    pub async fn decide(&self, id: &str, action: &str, body: Value) -> Response {
        self.client
            .put(self.url(&format!("/admin/bookings/{id}/{action}")))
            .bearer_auth(self.admin_token())
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    pub async fn blocked(&self, date: &str) -> Value {
        let response = self
            .client
            .get(self.url(&format!("/bookings/doctor/{}/slots", self.doctor)))
            .query(&[("date", date)])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        body["data"].clone()
    }
}
