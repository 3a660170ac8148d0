//! Runs the ledger against PostgreSQL:
//! `DATABASE_URL=postgres://... cargo test --features postgres-tests`
#![cfg(feature = "postgres-tests")]

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use sanjeevani::app_state::AppState;
use sanjeevani::config::Config;
use sanjeevani::db::models::booking::{BookingStatus, NewBooking};
use sanjeevani::db::models::user::Role;
use sanjeevani::db::store::Store;
use sanjeevani::error::AppError;
use sanjeevani::middleware::auth::Identity;
use sanjeevani::services::{approval, booking};

const DATE: &str = "2025-01-10";

struct Seeded {
    state: AppState,
    pool: PgPool,
    patient: Identity,
    admin: Identity,
    doctor: Uuid,
}

async fn seed_user(pool: &PgPool, name: &str, role: Role) -> Identity {
    let id = Uuid::new_v4();
    let email = format!("{}@example.com", name.to_lowercase());
    sqlx::query("INSERT INTO users (id, name, email, role) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(name)
        .bind(&email)
        .bind(role)
        .execute(pool)
        .await
        .unwrap();
    Identity { user_id: id, role, name: name.to_string(), email }
}

async fn seeded(pool: PgPool, slot_guard: bool) -> Seeded {
    let patient = seed_user(&pool, "Asha", Role::User).await;
    let admin = seed_user(&pool, "Meera", Role::Admin).await;

    let doctor = Uuid::new_v4();
    sqlx::query("INSERT INTO doctors (id, name, specialty, available, created_at) VALUES ($1, $2, $3, TRUE, $4)")
        .bind(doctor)
        .bind("Dr. Vaidya")
        .bind("Panchakarma")
        .bind(Utc::now().naive_utc())
        .execute(&pool)
        .await
        .unwrap();

    let mut config = Config::with_secret("secret");
    config.slot_guard = slot_guard;
    let state = AppState::new(Store::Postgres(pool.clone()), config);
    Seeded { state, pool, patient, admin, doctor }
}

fn request(doctor: Uuid, time: &str) -> NewBooking {
    NewBooking {
        doctor_id: Some(doctor.to_string()),
        reason: Some("Recurring migraine".into()),
        requested_date: Some(DATE.into()),
        requested_time: Some(time.into()),
    }
}

impl Seeded {
    async fn book(&self, time: &str) -> Uuid {
        booking::create_booking(&self.state, &self.patient, request(self.doctor, time))
            .await
            .unwrap()
            .id
    }

    async fn appointments(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM appointments")
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    async fn blocked(&self, date: &str) -> Vec<String> {
        booking::blocked_slots(&self.state, &self.doctor.to_string(), Some(date))
            .await
            .unwrap()
    }
}

async fn assert_slot_refused(s: &Seeded, time: &str) {
    let id = s.book(time).await;
    approval::approve_booking(&s.state, &s.admin, id, None).await.unwrap();

    let err = booking::create_booking(&s.state, &s.patient, request(s.doctor, time))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(err.to_string(), "This time slot is already booked");
    assert_eq!(s.blocked(DATE).await, vec![time.to_string()]);
}

#[sqlx::test(migrations = "./migrations")]
async fn approved_slot_refuses_new_bookings(pool: PgPool) {
    let s = seeded(pool, false).await;
    assert_slot_refused(&s, "10:00 AM").await;
}

#[sqlx::test(migrations = "./migrations")]
async fn guarded_create_refuses_an_approved_slot(pool: PgPool) {
    let s = seeded(pool, true).await;
    assert_slot_refused(&s, "10:30 AM").await;
}

#[sqlx::test(migrations = "./migrations")]
async fn blocked_slots_follow_booking_order(pool: PgPool) {
    let s = seeded(pool, false).await;
    let ids = [s.book("11:00 AM").await, s.book("09:00 AM").await, s.book("10:00 AM").await];
    let pending = s.book("02:00 PM").await;

    for id in ids.iter().rev() {
        approval::approve_booking(&s.state, &s.admin, *id, None).await.unwrap();
    }
    approval::reject_booking(&s.state, &s.admin, pending, None).await.unwrap();

    assert_eq!(s.blocked(DATE).await, vec!["11:00 AM", "09:00 AM", "10:00 AM"]);
    assert!(s.blocked("2025-01-11").await.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn listing_joins_directory_data_and_filters(pool: PgPool) {
    let s = seeded(pool, false).await;
    let first = s.book("09:00 AM").await;
    let second = s.book("09:30 AM").await;
    approval::approve_booking(&s.state, &s.admin, first, None).await.unwrap();

    let all = approval::list_bookings(&s.state, &s.admin, None).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].booking.id, second);
    assert_eq!(all[1].booking.id, first);
    let requester = all[0].requester.as_ref().unwrap();
    assert_eq!(requester.name, "Asha");
    assert_eq!(requester.email, "asha@example.com");
    assert_eq!(all[0].doctor.as_ref().unwrap().specialty, "Panchakarma");

    let pending = approval::list_bookings(&s.state, &s.admin, Some("pending")).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].booking.status, BookingStatus::Pending);

    let approved = approval::list_bookings(&s.state, &s.admin, Some("APPROVED")).await.unwrap();
    assert_eq!(approved.len(), 1);
    assert_eq!(approved[0].booking.id, first);
}

#[sqlx::test(migrations = "./migrations")]
async fn rejected_booking_stays_rejected(pool: PgPool) {
    let s = seeded(pool, false).await;
    let id = s.book("11:30 AM").await;
    let rejected = approval::reject_booking(&s.state, &s.admin, id, Some("Doctor away".into()))
        .await
        .unwrap();
    assert_eq!(rejected.status, BookingStatus::Rejected);
    assert_eq!(rejected.admin_remarks, "Doctor away");

    let err = approval::approve_booking(&s.state, &s.admin, id, None).await.unwrap_err();
    assert_eq!(err.to_string(), "Booking already processed");
    assert_eq!(s.appointments().await, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn default_mode_double_books_one_slot(pool: PgPool) {
    let s = seeded(pool, false).await;
    let first = s.book("02:30 PM").await;
    let second = s.book("02:30 PM").await;

    approval::approve_booking(&s.state, &s.admin, first, None).await.unwrap();
    approval::approve_booking(&s.state, &s.admin, second, None).await.unwrap();
    assert_eq!(s.appointments().await, 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn guarded_concurrent_approvals_keep_one(pool: PgPool) {
    let s = seeded(pool, true).await;
    let first = s.book("03:00 PM").await;
    let second = s.book("03:00 PM").await;

    let (a, b) = tokio::join!(
        approval::approve_booking(&s.state, &s.admin, first, None),
        approval::approve_booking(&s.state, &s.admin, second, None)
    );
    let refused: Vec<AppError> = [a, b].into_iter().filter_map(Result::err).collect();
    assert_eq!(refused.len(), 1);
    assert_eq!(refused[0].to_string(), "This time slot is already booked");
    assert_eq!(s.appointments().await, 1);

    let mine = approval::my_appointments(&s.state, &s.patient).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].appointment.time, "03:00 PM");
    assert_eq!(mine[0].doctor.as_ref().unwrap().name, "Dr. Vaidya");
}
