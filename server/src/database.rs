// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::scheduling::{self, StaffLoad};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use salon_common::{
    Appointment, AppointmentDetail, AppointmentStatus, Client, CreateServicePayload, Service,
    ServiceSummary, StaffProfile, StaffSummary, StatusCount, User,
};
use sqlx::{Sqlite, SqlitePool, migrate::MigrateDatabase};
use std::{fs, path::Path};
use tracing::{debug, info};

/// Tables and indexes, created on startup if missing.
///
/// The partial unique index is what keeps two active appointments off the
/// same (date, time, staff) slot when bookings race each other. Unassigned
/// appointments share the `0` staff key.
const SCHEMA: [&str; 6] = [
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL,
        is_admin BOOLEAN NOT NULL DEFAULT 0,
        created_at TIMESTAMP NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS staff_profiles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
        phone TEXT NULL,
        is_staff_member BOOLEAN NOT NULL DEFAULT 0
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS services (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        duration_minutes INTEGER NOT NULL,
        price INTEGER NOT NULL,
        active BOOLEAN NOT NULL DEFAULT 1
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS appointments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NULL REFERENCES users(id) ON DELETE CASCADE,
        guest_name TEXT NULL,
        guest_email TEXT NULL,
        guest_phone TEXT NULL,
        service_id INTEGER NOT NULL REFERENCES services(id) ON DELETE RESTRICT,
        staff_id INTEGER NULL REFERENCES users(id) ON DELETE SET NULL,
        date DATE NOT NULL,
        time TIME NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending',
        notes TEXT NULL,
        cancellation_reason TEXT NULL,
        reschedule_reason TEXT NULL,
        created_at TIMESTAMP NOT NULL,
        updated_at TIMESTAMP NOT NULL
    );
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS appointments_active_slot
        ON appointments (date, time, IFNULL(staff_id, 0))
        WHERE status IN ('pending', 'confirmed');
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS appointments_by_date ON appointments (date);
    "#,
];

const APPOINTMENT_SELECT: &str = r#"
    SELECT a.id, a.user_id, a.guest_name, a.guest_email, a.guest_phone,
           a.service_id, a.staff_id, a.date, a.time, a.status, a.notes,
           a.cancellation_reason, a.reschedule_reason, a.created_at, a.updated_at,
           s.name AS service_name, u.username AS staff_name
    FROM appointments a
    JOIN services s ON s.id = a.service_id
    LEFT JOIN users u ON u.id = a.staff_id
"#;

/// Establishes the database connection pool.
/// If the database does not exist, it creates it, then makes sure the schema
/// is in place.
pub async fn establish_connection_pool(database_url: &str) -> Result<SqlitePool> {
    ensure_sqlite_dir(database_url).context("Failed to create database directory")?;

    if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
        info!("Creating database {}", database_url);
        Sqlite::create_database(database_url)
            .await
            .context("Failed to create database")?;
    } else {
        info!("Database already exists.");
    }

    let pool = SqlitePool::connect(database_url)
        .await
        .context("Failed to connect to database")?;

    ensure_schema(&pool).await?;

    Ok(pool)
}

/// Creates the parent directory of a file-backed SQLite URL.
fn ensure_sqlite_dir(database_url: &str) -> std::io::Result<()> {
    let Some(path) = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
    else {
        return Ok(());
    };

    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path == ":memory:" {
        return Ok(());
    }

    if let Some(parent) = Path::new(path).parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .context("Failed to apply schema")?;
    }
    info!("Schema is ready.");
    Ok(())
}

/// Flat appointment row as stored, joined with the names dashboards show.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AppointmentRow {
    pub id: i64,
    pub user_id: Option<i64>,
    pub guest_name: Option<String>,
    pub guest_email: Option<String>,
    pub guest_phone: Option<String>,
    pub service_id: i64,
    pub staff_id: Option<i64>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub reschedule_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub service_name: String,
    pub staff_name: Option<String>,
}

impl AppointmentRow {
    pub fn appointment(&self) -> Appointment {
        let client = match self.user_id {
            Some(user_id) => Client::Registered { user_id },
            None => Client::Guest {
                name: self.guest_name.clone().unwrap_or_default(),
                email: self.guest_email.clone().unwrap_or_default(),
                phone: self.guest_phone.clone().unwrap_or_default(),
            },
        };

        Appointment {
            id: self.id,
            client,
            service_id: self.service_id,
            staff_id: self.staff_id,
            date: self.date,
            time: self.time,
            status: self.status,
            notes: self.notes.clone(),
            cancellation_reason: self.cancellation_reason.clone(),
            reschedule_reason: self.reschedule_reason.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn into_detail(self, now: NaiveDateTime) -> AppointmentDetail {
        let appointment = self.appointment();
        AppointmentDetail {
            can_cancel: scheduling::can_cancel(&appointment, now),
            appointment,
            service_name: self.service_name,
            staff_name: self.staff_name,
        }
    }
}

/// A booking about to be stored.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub client: Client,
    pub service_id: i64,
    pub staff_id: Option<i64>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub notes: Option<String>,
}

/// Outcome of a write that claims a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotWrite<T> {
    Done(T),
    /// The unique slot index rejected the write.
    Taken,
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

// --- Users & staff profiles ---

/// Creates a user together with its staff profile, in one transaction.
///
/// Returns `None` when the username is already taken; nothing is written then.
pub async fn insert_user(
    pool: &SqlitePool,
    username: &str,
    email: &str,
    phone: Option<&str>,
    is_admin: bool,
) -> Result<Option<User>> {
    let created_at = Utc::now();
    let mut tx = pool.begin().await.context("Failed to start transaction")?;

    let inserted = sqlx::query(
        "INSERT INTO users (username, email, is_admin, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(username)
    .bind(email)
    .bind(is_admin)
    .bind(created_at)
    .execute(&mut *tx)
    .await;

    let id = match inserted {
        Ok(done) => done.last_insert_rowid(),
        Err(err) if is_unique_violation(&err) => {
            info!("Username {} is already taken.", username);
            return Ok(None);
        }
        Err(err) => return Err(err).context("Failed to insert user into DB"),
    };

    sqlx::query("INSERT INTO staff_profiles (user_id, phone, is_staff_member) VALUES (?, ?, 0)")
        .bind(id)
        .bind(phone)
        .execute(&mut *tx)
        .await
        .context("Failed to provision staff profile")?;

    tx.commit().await.context("Failed to commit new user")?;
    info!("Created user {} with ID: {}", username, id);

    Ok(Some(User {
        id,
        username: username.to_string(),
        email: email.to_string(),
        is_admin,
        created_at,
    }))
}

pub async fn find_user(pool: &SqlitePool, user_id: i64) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("Failed to retrieve user from DB")
}

/// Reads what role resolution needs: `(username, is_admin, is_staff_member)`.
pub async fn find_role_flags(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Option<(String, bool, bool)>> {
    sqlx::query_as::<_, (String, bool, bool)>(
        r#"
        SELECT u.username, u.is_admin, COALESCE(sp.is_staff_member, 0)
        FROM users u
        LEFT JOIN staff_profiles sp ON sp.user_id = u.id
        WHERE u.id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("Failed to resolve user role")
}

/// Creates the staff profile of a user if it does not exist yet. Existing
/// profiles are returned untouched.
pub async fn provision_staff_profile(
    pool: &SqlitePool,
    user_id: i64,
    phone: Option<&str>,
) -> Result<StaffProfile> {
    debug!("Provisioning staff profile for user ID: {}", user_id);
    sqlx::query(
        "INSERT INTO staff_profiles (user_id, phone, is_staff_member) VALUES (?, ?, 0) ON CONFLICT(user_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(phone)
    .execute(pool)
    .await
    .context("Failed to provision staff profile")?;

    sqlx::query_as::<_, StaffProfile>("SELECT * FROM staff_profiles WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .context("Failed to read provisioned staff profile")
}

pub async fn set_staff_member(
    pool: &SqlitePool,
    user_id: i64,
    is_staff_member: bool,
) -> Result<StaffProfile> {
    provision_staff_profile(pool, user_id, None).await?;
    sqlx::query("UPDATE staff_profiles SET is_staff_member = ? WHERE user_id = ?")
        .bind(is_staff_member)
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to update staff flag")?;

    info!("User ID {} staff flag set to {}", user_id, is_staff_member);

    sqlx::query_as::<_, StaffProfile>("SELECT * FROM staff_profiles WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .context("Failed to read staff profile")
}

/// Staff members in assignment order, each with their load for `date` and
/// whether they are free at `time`.
pub async fn staff_loads(
    pool: &SqlitePool,
    date: NaiveDate,
    time: NaiveTime,
) -> Result<Vec<StaffLoad>> {
    sqlx::query_as::<_, StaffLoad>(
        r#"
        SELECT sp.user_id AS staff_id,
               (SELECT COUNT(*) FROM appointments a
                 WHERE a.staff_id = sp.user_id AND a.date = ?) AS appointments,
               NOT EXISTS (SELECT 1 FROM appointments b
                 WHERE b.staff_id = sp.user_id AND b.date = ? AND b.time = ?
                   AND b.status IN ('pending', 'confirmed')) AS free
        FROM staff_profiles sp
        WHERE sp.is_staff_member = 1
        ORDER BY sp.id ASC
        "#,
    )
    .bind(date)
    .bind(date)
    .bind(time)
    .fetch_all(pool)
    .await
    .context("Failed to compute staff loads")
}

pub async fn staff_member_ids(pool: &SqlitePool) -> Result<Vec<i64>> {
    sqlx::query_scalar::<_, i64>(
        "SELECT user_id FROM staff_profiles WHERE is_staff_member = 1 ORDER BY id ASC",
    )
    .fetch_all(pool)
    .await
    .context("Failed to list staff members")
}

// --- Services ---

pub async fn insert_service(pool: &SqlitePool, payload: &CreateServicePayload) -> Result<Service> {
    let id = sqlx::query(
        "INSERT INTO services (name, description, duration_minutes, price, active) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(payload.duration_minutes)
    .bind(payload.price)
    .bind(payload.active)
    .execute(pool)
    .await
    .context("Failed to insert service into DB")?
    .last_insert_rowid();

    Ok(Service {
        id,
        name: payload.name.clone(),
        description: payload.description.clone(),
        duration_minutes: payload.duration_minutes,
        price: payload.price,
        active: payload.active,
    })
}

pub async fn find_service(pool: &SqlitePool, service_id: i64) -> Result<Option<Service>> {
    sqlx::query_as::<_, Service>("SELECT * FROM services WHERE id = ?")
        .bind(service_id)
        .fetch_optional(pool)
        .await
        .context("Failed to retrieve service from DB")
}

pub async fn list_active_services(pool: &SqlitePool) -> Result<Vec<Service>> {
    sqlx::query_as::<_, Service>("SELECT * FROM services WHERE active = 1 ORDER BY name ASC")
        .fetch_all(pool)
        .await
        .context("Failed to list active services")
}

// --- Appointments ---

/// Whether an active appointment already holds the slot. With `staff_id`
/// only that staff member's appointments count; `exclude` skips the
/// appointment being moved.
pub async fn slot_taken(
    pool: &SqlitePool,
    date: NaiveDate,
    time: NaiveTime,
    staff_id: Option<i64>,
    exclude: Option<i64>,
) -> Result<bool> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM appointments
        WHERE date = ? AND time = ?
          AND status IN ('pending', 'confirmed')
          AND (? IS NULL OR staff_id = ?)
          AND (? IS NULL OR id != ?)
        "#,
    )
    .bind(date)
    .bind(time)
    .bind(staff_id)
    .bind(staff_id)
    .bind(exclude)
    .bind(exclude)
    .fetch_one(pool)
    .await
    .context("Failed to check slot availability")?;

    Ok(count > 0)
}

/// Times and staff of the active appointments on a date.
pub async fn active_slots_on(
    pool: &SqlitePool,
    date: NaiveDate,
) -> Result<Vec<(NaiveTime, Option<i64>)>> {
    sqlx::query_as::<_, (NaiveTime, Option<i64>)>(
        "SELECT time, staff_id FROM appointments WHERE date = ? AND status IN ('pending', 'confirmed')",
    )
    .bind(date)
    .fetch_all(pool)
    .await
    .context("Failed to read occupied slots")
}

/// Inserts a new pending appointment.
pub async fn insert_appointment(
    pool: &SqlitePool,
    new: &NewAppointment,
) -> Result<SlotWrite<i64>> {
    let now = Utc::now();
    let (guest_name, guest_email, guest_phone) = match &new.client {
        Client::Registered { .. } => (None, None, None),
        Client::Guest { name, email, phone } => (Some(name), Some(email), Some(phone)),
    };

    debug!(
        "Insert values: client={:?}, service_id={}, staff_id={:?}, date={}, time={}",
        new.client, new.service_id, new.staff_id, new.date, new.time
    );

    let result = sqlx::query(
        r#"
        INSERT INTO appointments (user_id, guest_name, guest_email, guest_phone, service_id,
                                  staff_id, date, time, status, notes, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(new.client.user_id())
    .bind(guest_name)
    .bind(guest_email)
    .bind(guest_phone)
    .bind(new.service_id)
    .bind(new.staff_id)
    .bind(new.date)
    .bind(new.time)
    .bind(AppointmentStatus::Pending)
    .bind(&new.notes)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await;

    match result {
        Ok(done) => Ok(SlotWrite::Done(done.last_insert_rowid())),
        Err(err) if is_unique_violation(&err) => {
            info!("Slot {} {} was taken concurrently.", new.date, new.time);
            Ok(SlotWrite::Taken)
        }
        Err(err) => Err(err).context("Failed to insert appointment into DB"),
    }
}

pub async fn find_appointment(pool: &SqlitePool, appointment_id: i64) -> Result<Option<AppointmentRow>> {
    sqlx::query_as::<_, AppointmentRow>(&format!("{APPOINTMENT_SELECT} WHERE a.id = ?"))
        .bind(appointment_id)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to retrieve appointment with ID: {appointment_id}"))
}

/// Moves an appointment to a new status. A cancellation reason, when given,
/// is stored alongside. Returns false if no such appointment exists.
pub async fn update_status(
    pool: &SqlitePool,
    appointment_id: i64,
    status: AppointmentStatus,
    cancellation_reason: Option<&str>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE appointments
        SET status = ?, cancellation_reason = COALESCE(?, cancellation_reason), updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(status)
    .bind(cancellation_reason)
    .bind(Utc::now())
    .bind(appointment_id)
    .execute(pool)
    .await
    .with_context(|| format!("Failed to update status of appointment {appointment_id}"))?;

    info!(
        "Appointment ID {} set to {} ({} rows)",
        appointment_id,
        status.as_str(),
        result.rows_affected()
    );

    Ok(result.rows_affected() > 0)
}

pub async fn reschedule_appointment(
    pool: &SqlitePool,
    appointment_id: i64,
    date: NaiveDate,
    time: NaiveTime,
    reason: &str,
) -> Result<SlotWrite<bool>> {
    let result = sqlx::query(
        "UPDATE appointments SET date = ?, time = ?, reschedule_reason = ?, updated_at = ? WHERE id = ?",
    )
    .bind(date)
    .bind(time)
    .bind(reason)
    .bind(Utc::now())
    .bind(appointment_id)
    .execute(pool)
    .await;

    match result {
        Ok(done) => Ok(SlotWrite::Done(done.rows_affected() > 0)),
        Err(err) if is_unique_violation(&err) => Ok(SlotWrite::Taken),
        Err(err) => Err(err)
            .with_context(|| format!("Failed to reschedule appointment {appointment_id}")),
    }
}

/// Hard delete. Returns true if a row was removed.
pub async fn delete_appointment(pool: &SqlitePool, appointment_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM appointments WHERE id = ?")
        .bind(appointment_id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to delete appointment {appointment_id}"))?;

    Ok(result.rows_affected() > 0)
}

/// A registered client's active appointments from `today` on, soonest first.
pub async fn client_upcoming(
    pool: &SqlitePool,
    user_id: i64,
    today: NaiveDate,
    limit: i64,
) -> Result<Vec<AppointmentRow>> {
    sqlx::query_as::<_, AppointmentRow>(&format!(
        "{APPOINTMENT_SELECT} WHERE a.user_id = ? AND a.date >= ? AND a.status IN ('pending', 'confirmed') ORDER BY a.date ASC, a.time ASC LIMIT ?"
    ))
    .bind(user_id)
    .bind(today)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to retrieve upcoming appointments")
}

/// A registered client's appointments before `today`, most recent first.
pub async fn client_past(
    pool: &SqlitePool,
    user_id: i64,
    today: NaiveDate,
    limit: i64,
) -> Result<Vec<AppointmentRow>> {
    sqlx::query_as::<_, AppointmentRow>(&format!(
        "{APPOINTMENT_SELECT} WHERE a.user_id = ? AND a.date < ? ORDER BY a.date DESC, a.time DESC LIMIT ?"
    ))
    .bind(user_id)
    .bind(today)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to retrieve past appointments")
}

pub async fn staff_day(
    pool: &SqlitePool,
    staff_id: i64,
    date: NaiveDate,
) -> Result<Vec<AppointmentRow>> {
    sqlx::query_as::<_, AppointmentRow>(&format!(
        "{APPOINTMENT_SELECT} WHERE a.staff_id = ? AND a.date = ? ORDER BY a.time ASC"
    ))
    .bind(staff_id)
    .bind(date)
    .fetch_all(pool)
    .await
    .context("Failed to retrieve staff agenda")
}

pub async fn staff_upcoming(
    pool: &SqlitePool,
    staff_id: i64,
    after: NaiveDate,
) -> Result<Vec<AppointmentRow>> {
    sqlx::query_as::<_, AppointmentRow>(&format!(
        "{APPOINTMENT_SELECT} WHERE a.staff_id = ? AND a.date > ? AND a.status IN ('pending', 'confirmed') ORDER BY a.date ASC, a.time ASC"
    ))
    .bind(staff_id)
    .bind(after)
    .fetch_all(pool)
    .await
    .context("Failed to retrieve upcoming staff appointments")
}

// --- Reports ---

pub async fn status_counts(pool: &SqlitePool) -> Result<Vec<StatusCount>> {
    sqlx::query_as::<_, StatusCount>(
        "SELECT status, COUNT(*) AS count FROM appointments GROUP BY status",
    )
    .fetch_all(pool)
    .await
    .context("Failed to count appointments per status")
}

pub async fn unassigned_active(pool: &SqlitePool) -> Result<i64> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM appointments WHERE staff_id IS NULL AND status IN ('pending', 'confirmed')",
    )
    .fetch_one(pool)
    .await
    .context("Failed to count unassigned appointments")
}

/// Per-staff totals.
pub async fn staff_summaries(pool: &SqlitePool, today: NaiveDate) -> Result<Vec<StaffSummary>> {
    sqlx::query_as::<_, StaffSummary>(
        r#"
        SELECT u.id AS staff_id, u.username AS username,
               COUNT(a.id) AS total,
               COALESCE(SUM(CASE WHEN a.status IN ('pending', 'confirmed') AND a.date >= ? THEN 1 ELSE 0 END), 0) AS upcoming_active,
               COALESCE(SUM(CASE WHEN a.status = 'completed' THEN 1 ELSE 0 END), 0) AS completed
        FROM staff_profiles sp
        JOIN users u ON u.id = sp.user_id
        LEFT JOIN appointments a ON a.staff_id = u.id
        WHERE sp.is_staff_member = 1
        GROUP BY u.id, u.username
        ORDER BY u.username ASC
        "#,
    )
    .bind(today)
    .fetch_all(pool)
    .await
    .context("Failed to summarize staff workload")
}

pub async fn service_summaries(pool: &SqlitePool) -> Result<Vec<ServiceSummary>> {
    sqlx::query_as::<_, ServiceSummary>(
        r#"
        SELECT s.id AS service_id, s.name AS name,
               COUNT(a.id) AS appointments,
               COALESCE(SUM(CASE WHEN a.status = 'completed' THEN s.price ELSE 0 END), 0) AS completed_revenue
        FROM services s
        LEFT JOIN appointments a ON a.service_id = s.id
        GROUP BY s.id, s.name
        ORDER BY s.name ASC
        "#,
    )
    .fetch_all(pool)
    .await
    .context("Failed to summarize services")
}

/// Fresh in-memory database with the schema applied.
///
/// A single connection that never expires keeps every query on the same
/// in-memory database.
#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    ensure_schema(&pool).await.unwrap();
    pool
}
