use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use crate::db::memory::MemoryStore;
use crate::db::models::appointment::{Appointment, AppointmentDraft, AppointmentView};
use crate::db::models::booking::{
    Booking, BookingDraft, BookingStatus, BookingView, Decision, SlotKey,
};
use crate::db::models::doctor::Doctor;
use crate::db::models::user::User;
use crate::db::postgres;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result of the locked approval path.
#[derive(Debug)]
pub enum GuardedApproval {
    Approved(Booking, Appointment),
    NotFound,
    AlreadyProcessed,
    SlotTaken,
}

/// Identity Directory, Practitioner Directory and Slot Ledger behind one handle.
#[derive(Clone)]
pub enum Store {
    Postgres(PgPool),
    Memory(Arc<MemoryStore>),
}

impl Store {
    pub fn in_memory() -> Self {
        Store::Memory(Arc::new(MemoryStore::default()))
    }

    pub fn backend(&self) -> &'static str {
        match self {
            Store::Postgres(_) => "postgres",
            Store::Memory(_) => "memory",
        }
    }

    pub async fn ping(&self) -> StoreResult<()> {
        match self {
            Store::Postgres(pool) => postgres::ping(pool).await,
            Store::Memory(_) => Ok(()),
        }
    }

    pub async fn close(&self) {
        if let Store::Postgres(pool) = self {
            pool.close().await;
        }
    }

    // Identity Directory

    pub async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        match self {
            Store::Postgres(pool) => postgres::find_user(pool, id).await,
            Store::Memory(mem) => Ok(mem.find_user(id).await),
        }
    }

    // Practitioner Directory

    pub async fn find_doctor(&self, id: Uuid) -> StoreResult<Option<Doctor>> {
        match self {
            Store::Postgres(pool) => postgres::find_doctor(pool, id).await,
            Store::Memory(mem) => Ok(mem.find_doctor(id).await),
        }
    }

    pub async fn available_doctors(&self) -> StoreResult<Vec<Doctor>> {
        match self {
            Store::Postgres(pool) => postgres::available_doctors(pool).await,
            Store::Memory(mem) => Ok(mem.available_doctors().await),
        }
    }

    // Slot Ledger

    pub async fn approved_booking_at(&self, slot: &SlotKey) -> StoreResult<Option<Booking>> {
        match self {
            Store::Postgres(pool) => postgres::approved_booking_at(pool, slot).await,
            Store::Memory(mem) => Ok(mem.approved_booking_at(slot).await),
        }
    }

    pub async fn insert_booking(&self, draft: BookingDraft) -> StoreResult<Booking> {
        match self {
            Store::Postgres(pool) => postgres::insert_booking(pool, &draft).await,
            Store::Memory(mem) => Ok(mem.insert_booking(draft).await),
        }
    }

    /// Check-and-insert as one step. `None` when the slot is already approved.
    pub async fn insert_booking_if_open(&self, draft: BookingDraft) -> StoreResult<Option<Booking>> {
        match self {
            Store::Postgres(pool) => postgres::insert_booking_if_open(pool, &draft).await,
            Store::Memory(mem) => Ok(mem.insert_booking_if_open(draft).await),
        }
    }

    pub async fn blocked_slots(&self, doctor_id: Uuid, date: &str) -> StoreResult<Vec<String>> {
        match self {
            Store::Postgres(pool) => postgres::blocked_slots(pool, doctor_id, date).await,
            Store::Memory(mem) => Ok(mem.blocked_slots(doctor_id, date).await),
        }
    }

    pub async fn find_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        match self {
            Store::Postgres(pool) => postgres::find_booking(pool, id).await,
            Store::Memory(mem) => Ok(mem.find_booking(id).await),
        }
    }

    /// Unconditional status write; last write wins.
    pub async fn record_decision(&self, id: Uuid, decision: &Decision) -> StoreResult<Option<Booking>> {
        match self {
            Store::Postgres(pool) => postgres::record_decision(pool, id, decision).await,
            Store::Memory(mem) => Ok(mem.record_decision(id, decision).await),
        }
    }

    /// Approve only if still pending and the slot has no other approved booking,
    /// creating the appointment in the same critical section.
    pub async fn approve_if_open(&self, id: Uuid, admin_id: Uuid, remarks: String) -> StoreResult<GuardedApproval> {
        match self {
            Store::Postgres(pool) => postgres::approve_if_open(pool, id, admin_id, remarks).await,
            Store::Memory(mem) => Ok(mem.approve_if_open(id, admin_id, remarks).await),
        }
    }

    pub async fn insert_appointment(&self, draft: AppointmentDraft) -> StoreResult<Appointment> {
        match self {
            Store::Postgres(pool) => postgres::insert_appointment(pool, &draft).await,
            Store::Memory(mem) => Ok(mem.insert_appointment(draft).await),
        }
    }

    pub async fn list_bookings(&self, status: Option<BookingStatus>) -> StoreResult<Vec<BookingView>> {
        match self {
            Store::Postgres(pool) => postgres::list_bookings(pool, status).await,
            Store::Memory(mem) => Ok(mem.list_bookings(status).await),
        }
    }

    pub async fn approved_appointments_for(&self, requester_id: Uuid) -> StoreResult<Vec<AppointmentView>> {
        match self {
            Store::Postgres(pool) => postgres::approved_appointments_for(pool, requester_id).await,
            Store::Memory(mem) => Ok(mem.approved_appointments_for(requester_id).await),
        }
    }
}
