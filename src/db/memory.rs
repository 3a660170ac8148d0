//! In-process store used when no `DATABASE_URL` is configured and by the tests.
//!
//! Each method takes the lock once, so a check followed by a separate insert
//! interleaves with other requests exactly like two round trips to Postgres.
use std::collections::HashMap;

use chrono::{NaiveDateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::models::appointment::{Appointment, AppointmentDraft, AppointmentStatus, AppointmentView};
use crate::db::models::booking::{
    Booking, BookingDraft, BookingStatus, BookingView, Decision, RequesterSummary, SlotKey,
};
use crate::db::models::doctor::Doctor;
use crate::db::models::user::User;
use crate::db::store::GuardedApproval;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    doctors: Vec<Doctor>,
    bookings: Vec<Booking>,
    appointments: Vec<Appointment>,
}

impl Tables {
    fn doctor(&self, id: Uuid) -> Option<&Doctor> {
        self.doctors.iter().find(|d| d.id == id)
    }

    fn booking_mut(&mut self, id: Uuid) -> Option<&mut Booking> {
        self.bookings.iter_mut().find(|b| b.id == id)
    }

    fn slot_is_approved(&self, slot: &SlotKey, except: Option<Uuid>) -> bool {
        self.bookings.iter().any(|b| {
            b.status == BookingStatus::Approved && Some(b.id) != except && b.slot() == *slot
        })
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

fn booking_from(draft: BookingDraft) -> Booking {
    let created = now();
    Booking {
        id: draft.id,
        requester_id: draft.requester_id,
        doctor_id: draft.doctor_id,
        reason: draft.reason,
        requested_date: draft.requested_date,
        requested_time: draft.requested_time,
        status: BookingStatus::Pending,
        admin_remarks: String::new(),
        approved_by: None,
        created_at: created,
        updated_at: created,
    }
}

impl MemoryStore {
    pub async fn insert_user(&self, user: User) {
        self.tables.write().await.users.insert(user.id, user);
    }

    pub async fn insert_doctor(&self, doctor: Doctor) {
        self.tables.write().await.doctors.push(doctor);
    }

    pub async fn bookings(&self) -> Vec<Booking> {
        self.tables.read().await.bookings.clone()
    }

    pub async fn appointments(&self) -> Vec<Appointment> {
        self.tables.read().await.appointments.clone()
    }

    pub(crate) async fn find_user(&self, id: Uuid) -> Option<User> {
        self.tables.read().await.users.get(&id).cloned()
    }

    pub(crate) async fn find_doctor(&self, id: Uuid) -> Option<Doctor> {
        self.tables.read().await.doctor(id).cloned()
    }

    pub(crate) async fn available_doctors(&self) -> Vec<Doctor> {
        let tables = self.tables.read().await;
        let mut doctors: Vec<Doctor> = tables.doctors.iter().filter(|d| d.available).cloned().collect();
        doctors.sort_by(|a, b| a.name.cmp(&b.name));
        doctors
    }

    pub(crate) async fn approved_booking_at(&self, slot: &SlotKey) -> Option<Booking> {
        self.tables
            .read()
            .await
            .bookings
            .iter()
            .find(|b| b.status == BookingStatus::Approved && b.slot() == *slot)
            .cloned()
    }

    pub(crate) async fn insert_booking(&self, draft: BookingDraft) -> Booking {
        let booking = booking_from(draft);
        self.tables.write().await.bookings.push(booking.clone());
        booking
    }

    pub(crate) async fn insert_booking_if_open(&self, draft: BookingDraft) -> Option<Booking> {
        let mut tables = self.tables.write().await;
        if tables.slot_is_approved(&draft.slot(), None) {
            return None;
        }
        let booking = booking_from(draft);
        tables.bookings.push(booking.clone());
        Some(booking)
    }

    pub(crate) async fn blocked_slots(&self, doctor_id: Uuid, date: &str) -> Vec<String> {
        self.tables
            .read()
            .await
            .bookings
            .iter()
            .filter(|b| {
                b.doctor_id == doctor_id && b.requested_date == date && b.status == BookingStatus::Approved
            })
            .map(|b| b.requested_time.clone())
            .collect()
    }

    pub(crate) async fn find_booking(&self, id: Uuid) -> Option<Booking> {
        self.tables.read().await.bookings.iter().find(|b| b.id == id).cloned()
    }

    pub(crate) async fn record_decision(&self, id: Uuid, decision: &Decision) -> Option<Booking> {
        let mut tables = self.tables.write().await;
        let booking = tables.booking_mut(id)?;
        decision.apply(booking, now());
        Some(booking.clone())
    }

    pub(crate) async fn approve_if_open(&self, id: Uuid, admin_id: Uuid, remarks: String) -> GuardedApproval {
        let mut tables = self.tables.write().await;
        let Some(current) = tables.bookings.iter().find(|b| b.id == id) else {
            return GuardedApproval::NotFound;
        };
        if !current.status.is_pending() {
            return GuardedApproval::AlreadyProcessed;
        }
        let slot = current.slot();
        if tables.slot_is_approved(&slot, Some(id)) {
            return GuardedApproval::SlotTaken;
        }

        let stamp = now();
        let decision = Decision::Approve { admin_id, remarks };
        let Some(booking) = tables.booking_mut(id) else {
            return GuardedApproval::NotFound;
        };
        decision.apply(booking, stamp);
        let booking = booking.clone();

        let appointment = AppointmentDraft::confirming(&booking).into_appointment(stamp);
        tables.appointments.push(appointment.clone());
        GuardedApproval::Approved(booking, appointment)
    }

    pub(crate) async fn insert_appointment(&self, draft: AppointmentDraft) -> Appointment {
        let appointment = draft.into_appointment(now());
        self.tables.write().await.appointments.push(appointment.clone());
        appointment
    }

    pub(crate) async fn list_bookings(&self, status: Option<BookingStatus>) -> Vec<BookingView> {
        let tables = self.tables.read().await;
        // Newest first; equal timestamps keep reverse insertion order.
        let mut rows: Vec<&Booking> = tables
            .bookings
            .iter()
            .rev()
            .filter(|b| status.map_or(true, |s| b.status == s))
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        rows.into_iter()
            .map(|booking| BookingView {
                booking: booking.clone(),
                requester: tables.users.get(&booking.requester_id).map(|u| RequesterSummary {
                    id: u.id,
                    name: u.name.clone(),
                    email: u.email.clone(),
                }),
                doctor: tables.doctor(booking.doctor_id).map(Doctor::summary),
            })
            .collect()
    }

    pub(crate) async fn approved_appointments_for(&self, requester_id: Uuid) -> Vec<AppointmentView> {
        let tables = self.tables.read().await;
        let mut rows: Vec<AppointmentView> = tables
            .appointments
            .iter()
            .filter(|a| a.requester_id == requester_id && a.status == AppointmentStatus::Approved)
            .map(|a| AppointmentView {
                appointment: a.clone(),
                doctor: tables.doctor(a.doctor_id).map(Doctor::summary),
            })
            .collect();
        rows.sort_by(|a, b| a.appointment.date.cmp(&b.appointment.date));
        rows
    }
}
