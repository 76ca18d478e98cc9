// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Wire format for times of day: `HH:MM`.
///
/// Parsing also accepts `HH:MM:SS` so that values echoed back from other
/// clients still go through. Seconds are always dropped.
pub mod hhmm {
    use chrono::{NaiveTime, Timelike};
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%H:%M";

    pub fn format(time: &NaiveTime) -> String {
        time.format(FORMAT).to_string()
    }

    pub fn parse(raw: &str) -> Result<NaiveTime, chrono::ParseError> {
        let time = NaiveTime::parse_from_str(raw.trim(), FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(raw.trim(), "%H:%M:%S"))?;
        // Slots are whole minutes; `with_second(0)` cannot fail.
        Ok(time.with_second(0).unwrap_or(time))
    }

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Lifecycle of an appointment.
///
/// Stored as lowercase text in the `appointments.status` column.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 4] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
    ];

    /// Active appointments occupy their slot.
    pub fn is_active(self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }

    pub fn is_closed(self) -> bool {
        !self.is_active()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

/// Who an appointment is for.
///
/// Anonymous bookings carry their contact details inline; registered ones
/// only point at the account.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Client {
    Registered {
        user_id: i64,
    },
    Guest {
        name: String,
        email: String,
        phone: String,
    },
}

impl Client {
    pub fn user_id(&self) -> Option<i64> {
        match self {
            Client::Registered { user_id } => Some(*user_id),
            Client::Guest { .. } => None,
        }
    }
}

/// A booked slot for one service.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Appointment {
    pub id: i64,
    pub client: Client,
    pub service_id: i64,
    // `None` when no staff member was available at booking time.
    pub staff_id: Option<i64>,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub reschedule_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }
}

/// A bookable service. `active` gates visibility in the booking form.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub duration_minutes: i32,
    // Whole currency units, no decimals.
    pub price: i64,
    pub active: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct StaffProfile {
    pub id: i64,
    pub user_id: i64,
    pub phone: Option<String>,
    pub is_staff_member: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// What an authenticated caller is allowed to do.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Staff,
    Admin,
}

impl Role {
    /// Staff and admins can manage appointments.
    pub fn manages_appointments(self) -> bool {
        matches!(self, Role::Staff | Role::Admin)
    }
}

/// The authenticated caller, with its role resolved once per request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

// --- Request payloads ---

/// Contact details required from anonymous clients.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct GuestContact {
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

/// Structure used to receive a booking request from the API.
/// Registered callers leave `guest` out; anonymous callers must fill it in.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BookingPayload {
    pub service_id: i64,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub guest: Option<GuestContact>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct CancelPayload {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ReschedulePayload {
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    pub reason: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RegisterPayload {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateServicePayload {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub duration_minutes: i32,
    pub price: i64,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

// --- Responses ---

/// An appointment together with what a dashboard needs to show it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AppointmentDetail {
    pub appointment: Appointment,
    pub service_name: String,
    pub staff_name: Option<String>,
    pub can_cancel: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FreeSlots {
    pub horas: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OpeningHours {
    pub day: String,
    pub opens: Option<String>,
    pub closes: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Landing {
    pub services: Vec<Service>,
    pub hours: Vec<OpeningHours>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ClientPanel {
    pub upcoming: Vec<AppointmentDetail>,
    pub past: Vec<AppointmentDetail>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct StaffPanel {
    pub today: Vec<AppointmentDetail>,
    pub upcoming: Vec<AppointmentDetail>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct StatusCount {
    pub status: AppointmentStatus,
    pub count: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct StaffSummary {
    pub staff_id: i64,
    pub username: String,
    pub total: i64,
    pub upcoming_active: i64,
    pub completed: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ServiceSummary {
    pub service_id: i64,
    pub name: String,
    pub appointments: i64,
    pub completed_revenue: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AdminReport {
    pub status_counts: Vec<StatusCount>,
    pub unassigned_active: i64,
    pub staff: Vec<StaffSummary>,
    pub services: Vec<ServiceSummary>,
}
