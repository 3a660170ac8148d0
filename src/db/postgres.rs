use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::db::models::appointment::{Appointment, AppointmentDraft, AppointmentView};
use crate::db::models::booking::{
    Booking, BookingDraft, BookingStatus, BookingView, Decision, DoctorSummary, RequesterSummary,
    SlotKey,
};
use crate::db::models::doctor::Doctor;
use crate::db::models::user::User;
use crate::db::store::{GuardedApproval, StoreResult};

pub async fn ping(pool: &PgPool) -> StoreResult<()> {
    sqlx::query("SELECT 1").fetch_optional(pool).await?;
    Ok(())
}

pub async fn find_user(pool: &PgPool, id: Uuid) -> StoreResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, name, email, phone, role, created_at FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn find_doctor(pool: &PgPool, id: Uuid) -> StoreResult<Option<Doctor>> {
    let doctor = sqlx::query_as::<_, Doctor>(
        "SELECT id, name, specialty, available, created_at FROM doctors WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(doctor)
}

pub async fn available_doctors(pool: &PgPool) -> StoreResult<Vec<Doctor>> {
    let doctors = sqlx::query_as::<_, Doctor>(
        "SELECT id, name, specialty, available, created_at FROM doctors WHERE available ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(doctors)
}

pub async fn approved_booking_at(pool: &PgPool, slot: &SlotKey) -> StoreResult<Option<Booking>> {
    let booking = sqlx::query_as::<_, Booking>(
        r#"
        SELECT id, requester_id, doctor_id, reason, requested_date, requested_time,
               status, admin_remarks, approved_by, created_at, updated_at
        FROM bookings
        WHERE doctor_id = $1 AND requested_date = $2 AND requested_time = $3 AND status = $4
        LIMIT 1
        "#,
    )
    .bind(slot.doctor_id)
    .bind(&slot.date)
    .bind(&slot.time)
    .bind(BookingStatus::Approved)
    .fetch_optional(pool)
    .await?;
    Ok(booking)
}

pub async fn insert_booking(pool: &PgPool, draft: &BookingDraft) -> StoreResult<Booking> {
    let booking = sqlx::query_as::<_, Booking>(
        r#"
        INSERT INTO bookings (id, requester_id, doctor_id, reason, requested_date, requested_time)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, requester_id, doctor_id, reason, requested_date, requested_time,
                  status, admin_remarks, approved_by, created_at, updated_at
        "#,
    )
    .bind(draft.id)
    .bind(draft.requester_id)
    .bind(draft.doctor_id)
    .bind(&draft.reason)
    .bind(&draft.requested_date)
    .bind(&draft.requested_time)
    .fetch_one(pool)
    .await?;
    Ok(booking)
}

pub async fn insert_booking_if_open(pool: &PgPool, draft: &BookingDraft) -> StoreResult<Option<Booking>> {
    let mut tx = pool.begin().await?;
    lock_slot(&mut tx, &draft.slot()).await?;

    let booking = sqlx::query_as::<_, Booking>(
        r#"
        INSERT INTO bookings (id, requester_id, doctor_id, reason, requested_date, requested_time)
        SELECT $1, $2, $3, $4, $5, $6
        WHERE NOT EXISTS (
            SELECT 1 FROM bookings
            WHERE doctor_id = $3 AND requested_date = $5 AND requested_time = $6 AND status = $7
        )
        RETURNING id, requester_id, doctor_id, reason, requested_date, requested_time,
                  status, admin_remarks, approved_by, created_at, updated_at
        "#,
    )
    .bind(draft.id)
    .bind(draft.requester_id)
    .bind(draft.doctor_id)
    .bind(&draft.reason)
    .bind(&draft.requested_date)
    .bind(&draft.requested_time)
    .bind(BookingStatus::Approved)
    .fetch_optional(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(booking)
}

pub async fn blocked_slots(pool: &PgPool, doctor_id: Uuid, date: &str) -> StoreResult<Vec<String>> {
    // Insertion order: creation time, then the physical order Postgres returns.
    let slots = sqlx::query_scalar::<_, String>(
        r#"
        SELECT requested_time FROM bookings
        WHERE doctor_id = $1 AND requested_date = $2 AND status = $3
        ORDER BY created_at ASC
        "#,
    )
    .bind(doctor_id)
    .bind(date)
    .bind(BookingStatus::Approved)
    .fetch_all(pool)
    .await?;
    Ok(slots)
}

pub async fn find_booking(pool: &PgPool, id: Uuid) -> StoreResult<Option<Booking>> {
    let booking = sqlx::query_as::<_, Booking>(
        r#"
        SELECT id, requester_id, doctor_id, reason, requested_date, requested_time,
               status, admin_remarks, approved_by, created_at, updated_at
        FROM bookings
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(booking)
}

pub async fn record_decision(pool: &PgPool, id: Uuid, decision: &Decision) -> StoreResult<Option<Booking>> {
    let booking = sqlx::query_as::<_, Booking>(
        r#"
        UPDATE bookings
        SET status = $2, admin_remarks = $3, approved_by = COALESCE($4, approved_by), updated_at = NOW()
        WHERE id = $1
        RETURNING id, requester_id, doctor_id, reason, requested_date, requested_time,
                  status, admin_remarks, approved_by, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(decision.status())
    .bind(decision.remarks())
    .bind(decision.approved_by())
    .fetch_optional(pool)
    .await?;
    Ok(booking)
}

pub async fn approve_if_open(
    pool: &PgPool,
    id: Uuid,
    admin_id: Uuid,
    remarks: String,
) -> StoreResult<GuardedApproval> {
    let mut tx = pool.begin().await?;

    let current = sqlx::query_as::<_, Booking>(
        r#"
        SELECT id, requester_id, doctor_id, reason, requested_date, requested_time,
               status, admin_remarks, approved_by, created_at, updated_at
        FROM bookings
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(current) = current else {
        return Ok(GuardedApproval::NotFound);
    };
    if !current.status.is_pending() {
        return Ok(GuardedApproval::AlreadyProcessed);
    }

    let slot = current.slot();
    lock_slot(&mut tx, &slot).await?;

    let taken: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM bookings
            WHERE doctor_id = $1 AND requested_date = $2 AND requested_time = $3
              AND status = $4 AND id <> $5
        )
        "#,
    )
    .bind(slot.doctor_id)
    .bind(&slot.date)
    .bind(&slot.time)
    .bind(BookingStatus::Approved)
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;
    if taken {
        return Ok(GuardedApproval::SlotTaken);
    }

    let decision = Decision::Approve { admin_id, remarks };
    let booking = sqlx::query_as::<_, Booking>(
        r#"
        UPDATE bookings
        SET status = $2, admin_remarks = $3, approved_by = $4, updated_at = NOW()
        WHERE id = $1
        RETURNING id, requester_id, doctor_id, reason, requested_date, requested_time,
                  status, admin_remarks, approved_by, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(decision.status())
    .bind(decision.remarks())
    .bind(admin_id)
    .fetch_one(&mut *tx)
    .await?;

    let draft = AppointmentDraft::confirming(&booking);
    let appointment = insert_appointment_with(&mut *tx, &draft).await?;

    tx.commit().await?;
    Ok(GuardedApproval::Approved(booking, appointment))
}

pub async fn insert_appointment(pool: &PgPool, draft: &AppointmentDraft) -> StoreResult<Appointment> {
    insert_appointment_with(pool, draft).await
}

async fn insert_appointment_with<'e, E>(executor: E, draft: &AppointmentDraft) -> StoreResult<Appointment>
where
    E: sqlx::PgExecutor<'e>,
{
    let appointment = sqlx::query_as::<_, Appointment>(
        r#"
        INSERT INTO appointments (id, requester_id, doctor_id, date, time, reason, status, booking_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, requester_id, doctor_id, date, time, reason, status, booking_id,
                  created_at, updated_at
        "#,
    )
    .bind(draft.id)
    .bind(draft.requester_id)
    .bind(draft.doctor_id)
    .bind(&draft.date)
    .bind(&draft.time)
    .bind(&draft.reason)
    .bind(draft.status)
    .bind(draft.booking_id)
    .fetch_one(executor)
    .await?;
    Ok(appointment)
}

/// Serializes writers of one slot until the transaction ends.
async fn lock_slot(tx: &mut sqlx::Transaction<'_, sqlx::Postgres>, slot: &SlotKey) -> StoreResult<()> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(slot.lock_key())
        .execute(&mut **tx)
        .await?;
    Ok(())
}

#[derive(FromRow)]
struct BookingViewRow {
    #[sqlx(flatten)]
    booking: Booking,
    requester_name: Option<String>,
    requester_email: Option<String>,
    doctor_name: Option<String>,
    doctor_specialty: Option<String>,
}

impl From<BookingViewRow> for BookingView {
    fn from(row: BookingViewRow) -> Self {
        let requester = match (row.requester_name, row.requester_email) {
            (Some(name), Some(email)) => Some(RequesterSummary { id: row.booking.requester_id, name, email }),
            _ => None,
        };
        let doctor = match (row.doctor_name, row.doctor_specialty) {
            (Some(name), Some(specialty)) => Some(DoctorSummary { id: row.booking.doctor_id, name, specialty }),
            _ => None,
        };
        BookingView { booking: row.booking, requester, doctor }
    }
}

pub async fn list_bookings(pool: &PgPool, status: Option<BookingStatus>) -> StoreResult<Vec<BookingView>> {
    let rows = sqlx::query_as::<_, BookingViewRow>(
        r#"
        SELECT b.id, b.requester_id, b.doctor_id, b.reason, b.requested_date, b.requested_time,
               b.status, b.admin_remarks, b.approved_by, b.created_at, b.updated_at,
               u.name AS requester_name, u.email AS requester_email,
               d.name AS doctor_name, d.specialty AS doctor_specialty
        FROM bookings b
        LEFT JOIN users u ON u.id = b.requester_id
        LEFT JOIN doctors d ON d.id = b.doctor_id
        WHERE $1::booking_status IS NULL OR b.status = $1
        ORDER BY b.created_at DESC
        "#,
    )
    .bind(status)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(BookingView::from).collect())
}

#[derive(FromRow)]
struct AppointmentViewRow {
    #[sqlx(flatten)]
    appointment: Appointment,
    doctor_name: Option<String>,
    doctor_specialty: Option<String>,
}

pub async fn approved_appointments_for(pool: &PgPool, requester_id: Uuid) -> StoreResult<Vec<AppointmentView>> {
    let rows = sqlx::query_as::<_, AppointmentViewRow>(
        r#"
        SELECT a.id, a.requester_id, a.doctor_id, a.date, a.time, a.reason, a.status, a.booking_id,
               a.created_at, a.updated_at,
               d.name AS doctor_name, d.specialty AS doctor_specialty
        FROM appointments a
        LEFT JOIN doctors d ON d.id = a.doctor_id
        WHERE a.requester_id = $1 AND a.status = 'approved'
        ORDER BY a.date ASC, a.created_at ASC
        "#,
    )
    .bind(requester_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let doctor = match (row.doctor_name, row.doctor_specialty) {
                (Some(name), Some(specialty)) => Some(DoctorSummary { id: row.appointment.doctor_id, name, specialty }),
                _ => None,
            };
            AppointmentView { appointment: row.appointment, doctor }
        })
        .collect())
}
