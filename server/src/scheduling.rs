// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Business hours, slot checks, staff assignment and cancellation rules.
//!
//! Everything here is pure: the storage side feeds in what it read from the
//! appointment table and the current time.
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use salon_common::{Appointment, OpeningHours, hhmm};
use thiserror::Error;

/// Length of a bookable unit on the slot grid.
pub const SLOT_MINUTES: i64 = 30;

/// Clients may cancel up to this many hours before the appointment.
pub const CANCELLATION_NOTICE_HOURS: i64 = 2;

const OPENING_HOUR: u32 = 9;
const WEEKDAY_CLOSING_HOUR: u32 = 19;
const SATURDAY_CLOSING_HOUR: u32 = 14;

/// Why a slot cannot be booked. The messages are shown to clients as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotRejection {
    #[error("No se atiende los domingos.")]
    ClosedSunday,
    #[error("{day} la atención comienza a las {}.", hhmm::format(.opens))]
    BeforeOpening { day: &'static str, opens: NaiveTime },
    #[error("{day} la atención termina a las {}.", hhmm::format(.closes))]
    AfterClosing { day: &'static str, closes: NaiveTime },
    #[error("Las citas se agendan en bloques de 30 minutos (por ejemplo 10:00 o 10:30).")]
    OffGrid,
    #[error("No puedes agendar una cita en el pasado.")]
    InPast,
    #[error("Ese horario ya está tomado.")]
    Taken,
}

/// Opening window for a weekday, `None` when the salon is closed.
pub fn opening_window_on(weekday: Weekday) -> Option<(NaiveTime, NaiveTime)> {
    let closing_hour = match weekday {
        Weekday::Sun => return None,
        Weekday::Sat => SATURDAY_CLOSING_HOUR,
        _ => WEEKDAY_CLOSING_HOUR,
    };
    Some((hour(OPENING_HOUR), hour(closing_hour)))
}

pub fn opening_window(date: NaiveDate) -> Option<(NaiveTime, NaiveTime)> {
    opening_window_on(date.weekday())
}

fn hour(h: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, 0, 0).expect("business hours are valid times")
}

/// Rules 1 to 3: the salon must be open at `time` on `date`.
pub fn check_business_hours(date: NaiveDate, time: NaiveTime) -> Result<(), SlotRejection> {
    let day = match date.weekday() {
        Weekday::Sun => return Err(SlotRejection::ClosedSunday),
        Weekday::Sat => "Los sábados",
        _ => "De lunes a viernes",
    };
    let Some((opens, closes)) = opening_window(date) else {
        return Err(SlotRejection::ClosedSunday);
    };

    if time < opens {
        return Err(SlotRejection::BeforeOpening { day, opens });
    }
    if time >= closes {
        return Err(SlotRejection::AfterClosing { day, closes });
    }
    Ok(())
}

/// Whether `time` starts a slot of the half-hour grid.
pub fn on_grid(time: NaiveTime) -> bool {
    time.second() == 0 && time.nanosecond() == 0 && i64::from(time.minute()) % SLOT_MINUTES == 0
}

/// Rules 1 to 4, plus the slot grid. The conflict rule needs the appointment
/// table and lives in the booking workflow.
pub fn check_slot(
    date: NaiveDate,
    time: NaiveTime,
    now: NaiveDateTime,
) -> Result<(), SlotRejection> {
    check_business_hours(date, time)?;
    if !on_grid(time) {
        return Err(SlotRejection::OffGrid);
    }
    if date.and_time(time) < now {
        return Err(SlotRejection::InPast);
    }
    Ok(())
}

/// The half-hour grid for a date, from opening up to (not including) closing.
pub fn slot_grid(date: NaiveDate) -> Vec<NaiveTime> {
    let Some((opens, closes)) = opening_window(date) else {
        return Vec::new();
    };

    let mut slots = Vec::new();
    let mut current = opens;
    while current < closes {
        slots.push(current);
        current += Duration::minutes(SLOT_MINUTES);
    }
    slots
}

/// Opening hours per weekday, for the landing page.
pub fn weekly_hours() -> Vec<OpeningHours> {
    let days = [
        (Weekday::Mon, "lunes"),
        (Weekday::Tue, "martes"),
        (Weekday::Wed, "miércoles"),
        (Weekday::Thu, "jueves"),
        (Weekday::Fri, "viernes"),
        (Weekday::Sat, "sábado"),
        (Weekday::Sun, "domingo"),
    ];

    days.iter()
        .map(|(weekday, name)| {
            let window = opening_window_on(*weekday);
            OpeningHours {
                day: name.to_string(),
                opens: window.map(|(opens, _)| hhmm::format(&opens)),
                closes: window.map(|(_, closes)| hhmm::format(&closes)),
            }
        })
        .collect()
}

/// Same-day workload of one staff member, as read from storage.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct StaffLoad {
    pub staff_id: i64,
    /// Appointments of any status on the requested date.
    pub appointments: i64,
    /// Whether the staff member has no active appointment at the requested time.
    pub free: bool,
}

/// Greedy load balancing: the free staff member with the fewest appointments
/// that day. Ties go to the first one listed.
pub fn assign(loads: &[StaffLoad]) -> Option<i64> {
    loads
        .iter()
        .filter(|load| load.free)
        .min_by_key(|load| load.appointments)
        .map(|load| load.staff_id)
}

/// Whether an appointment can still be cancelled at `now`.
pub fn can_cancel(appointment: &Appointment, now: NaiveDateTime) -> bool {
    if appointment.status.is_closed() {
        return false;
    }
    appointment.starts_at() - now > Duration::hours(CANCELLATION_NOTICE_HOURS)
}
