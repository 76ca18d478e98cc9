// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Appointment workflows: booking, the staff actions and the dashboards.
//!
//! Every write that places an appointment on a slot re-runs the full slot
//! validation, whatever the client already checked.
use crate::{
    database::{self, AppointmentRow, NewAppointment, SlotWrite},
    error::BookingError,
    scheduling::{self, SlotRejection},
};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use salon_common::{
    AdminReport, AppointmentDetail, AppointmentStatus, BookingPayload, Client, ClientPanel,
    Principal, ReschedulePayload, Role, StaffPanel, StatusCount,
};
use sqlx::SqlitePool;
use tracing::{debug, info};

const CLIENT_PANEL_LIMIT: i64 = 5;

/// Full slot validation: business hours, not in the past, and no active
/// appointment already on the slot.
///
/// With a `staff_id` only that staff member's appointments conflict.
/// `exclude` is the appointment being moved, if any.
pub async fn validate_slot(
    pool: &SqlitePool,
    date: NaiveDate,
    time: NaiveTime,
    staff_id: Option<i64>,
    exclude: Option<i64>,
    now: NaiveDateTime,
) -> Result<(), BookingError> {
    scheduling::check_slot(date, time, now)?;
    if database::slot_taken(pool, date, time, staff_id, exclude).await? {
        return Err(SlotRejection::Taken.into());
    }
    Ok(())
}

/// Picks a staff member for a new appointment.
///
/// `Ok(None)` means nobody is on staff and the appointment goes in
/// unassigned. When there is staff but all of them are busy at that time the
/// slot is taken.
pub async fn assign_staff(
    pool: &SqlitePool,
    date: NaiveDate,
    time: NaiveTime,
) -> Result<Option<i64>, BookingError> {
    let loads = database::staff_loads(pool, date, time).await?;
    if loads.is_empty() {
        info!("No staff members available, booking stays unassigned.");
        return Ok(None);
    }

    match scheduling::assign(&loads) {
        Some(staff_id) => {
            debug!("Assigning staff ID {} for {} {}", staff_id, date, time);
            Ok(Some(staff_id))
        }
        None => Err(SlotRejection::Taken.into()),
    }
}

fn required(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Resolves who the booking is for. Logged-in callers book for themselves;
/// anonymous ones must leave a name and an email.
fn resolve_client(
    caller: Option<&Principal>,
    payload: &BookingPayload,
) -> Result<Client, BookingError> {
    if let Some(principal) = caller {
        return Ok(Client::Registered {
            user_id: principal.user_id,
        });
    }

    let guest = payload
        .guest
        .as_ref()
        .ok_or_else(|| BookingError::invalid("Indica tu nombre y correo para agendar."))?;
    let (Some(first_name), Some(email)) = (required(&guest.first_name), required(&guest.email))
    else {
        return Err(BookingError::invalid(
            "Indica tu nombre y correo para agendar.",
        ));
    };
    if !email.contains('@') {
        return Err(BookingError::invalid("El correo no es válido."));
    }

    let name = match required(&guest.last_name) {
        Some(last_name) => format!("{first_name} {last_name}"),
        None => first_name,
    };

    Ok(Client::Guest {
        name,
        email,
        phone: guest.phone.trim().to_string(),
    })
}

/// Books a new pending appointment.
pub async fn book(
    pool: &SqlitePool,
    caller: Option<&Principal>,
    payload: BookingPayload,
    now: NaiveDateTime,
) -> Result<AppointmentDetail, BookingError> {
    let client = resolve_client(caller, &payload)?;

    match database::find_service(pool, payload.service_id).await? {
        Some(service) if service.active => {}
        _ => return Err(BookingError::invalid("El servicio no está disponible.")),
    }

    scheduling::check_slot(payload.date, payload.time, now)?;
    let staff_id = assign_staff(pool, payload.date, payload.time).await?;
    validate_slot(pool, payload.date, payload.time, staff_id, None, now).await?;

    let new = NewAppointment {
        client,
        service_id: payload.service_id,
        staff_id,
        date: payload.date,
        time: payload.time,
        notes: payload.notes.as_deref().and_then(required),
    };

    let id = match database::insert_appointment(pool, &new).await? {
        SlotWrite::Done(id) => id,
        SlotWrite::Taken => return Err(SlotRejection::Taken.into()),
    };

    info!("Appointment created successfully with ID: {}", id);
    load(pool, id, now).await
}

async fn fetch(pool: &SqlitePool, appointment_id: i64) -> Result<AppointmentRow, BookingError> {
    database::find_appointment(pool, appointment_id)
        .await?
        .ok_or(BookingError::NotFound)
}

async fn load(
    pool: &SqlitePool,
    appointment_id: i64,
    now: NaiveDateTime,
) -> Result<AppointmentDetail, BookingError> {
    Ok(fetch(pool, appointment_id).await?.into_detail(now))
}

fn is_owner(principal: &Principal, row: &AppointmentRow) -> bool {
    row.user_id == Some(principal.user_id)
}

/// Staff act on their own appointments and on unassigned ones; admins on
/// everything.
fn may_manage(principal: &Principal, row: &AppointmentRow) -> bool {
    match principal.role {
        Role::Admin => true,
        Role::Staff => row.staff_id.is_none() || row.staff_id == Some(principal.user_id),
        Role::Client => false,
    }
}

fn ensure_manages(principal: &Principal, row: &AppointmentRow) -> Result<(), BookingError> {
    if may_manage(principal, row) {
        Ok(())
    } else {
        Err(BookingError::forbidden(
            "No tienes permiso para gestionar esta cita.",
        ))
    }
}

pub async fn detail(
    pool: &SqlitePool,
    principal: &Principal,
    appointment_id: i64,
    now: NaiveDateTime,
) -> Result<AppointmentDetail, BookingError> {
    let row = fetch(pool, appointment_id).await?;
    if !is_owner(principal, &row) && !may_manage(principal, &row) {
        return Err(BookingError::forbidden("No tienes acceso a esta cita."));
    }
    Ok(row.into_detail(now))
}

/// Cancels an appointment.
///
/// Owners may cancel only while the cancellation window is open. Staff and
/// admins may cancel any active appointment they manage, with a reason.
pub async fn cancel(
    pool: &SqlitePool,
    principal: &Principal,
    appointment_id: i64,
    reason: Option<&str>,
    now: NaiveDateTime,
) -> Result<AppointmentDetail, BookingError> {
    let row = fetch(pool, appointment_id).await?;
    let reason = reason.and_then(required);

    if may_manage(principal, &row) {
        if row.status.is_closed() {
            return Err(BookingError::invalid("La cita ya está cerrada."));
        }
        if reason.is_none() {
            return Err(BookingError::invalid(
                "Indica el motivo de la cancelación.",
            ));
        }
    } else if is_owner(principal, &row) {
        if !scheduling::can_cancel(&row.appointment(), now) {
            return Err(BookingError::forbidden(
                "No puedes cancelar esta cita. Debe ser con al menos 2 horas de anticipación.",
            ));
        }
    } else {
        return Err(BookingError::forbidden("No tienes acceso a esta cita."));
    }

    database::update_status(
        pool,
        appointment_id,
        AppointmentStatus::Cancelled,
        reason.as_deref(),
    )
    .await?;
    info!("Appointment ID {} cancelled by user ID {}", appointment_id, principal.user_id);
    load(pool, appointment_id, now).await
}

/// Moves an appointment to another slot, keeping its staff member.
pub async fn reschedule(
    pool: &SqlitePool,
    principal: &Principal,
    appointment_id: i64,
    payload: ReschedulePayload,
    now: NaiveDateTime,
) -> Result<AppointmentDetail, BookingError> {
    let row = fetch(pool, appointment_id).await?;
    ensure_manages(principal, &row)?;
    if row.status.is_closed() {
        return Err(BookingError::invalid("La cita ya está cerrada."));
    }
    let Some(reason) = required(&payload.reason) else {
        return Err(BookingError::invalid(
            "Indica el motivo del reagendamiento.",
        ));
    };

    validate_slot(
        pool,
        payload.date,
        payload.time,
        row.staff_id,
        Some(appointment_id),
        now,
    )
    .await?;

    match database::reschedule_appointment(pool, appointment_id, payload.date, payload.time, &reason)
        .await?
    {
        SlotWrite::Done(true) => {}
        SlotWrite::Done(false) => return Err(BookingError::NotFound),
        SlotWrite::Taken => return Err(SlotRejection::Taken.into()),
    }

    info!(
        "Appointment ID {} moved to {} {}",
        appointment_id, payload.date, payload.time
    );
    load(pool, appointment_id, now).await
}

pub async fn confirm(
    pool: &SqlitePool,
    principal: &Principal,
    appointment_id: i64,
    now: NaiveDateTime,
) -> Result<AppointmentDetail, BookingError> {
    let row = fetch(pool, appointment_id).await?;
    ensure_manages(principal, &row)?;
    if row.status != AppointmentStatus::Pending {
        return Err(BookingError::invalid(
            "Solo se pueden confirmar citas pendientes.",
        ));
    }

    database::update_status(pool, appointment_id, AppointmentStatus::Confirmed, None).await?;
    load(pool, appointment_id, now).await
}

pub async fn complete(
    pool: &SqlitePool,
    principal: &Principal,
    appointment_id: i64,
    now: NaiveDateTime,
) -> Result<AppointmentDetail, BookingError> {
    let row = fetch(pool, appointment_id).await?;
    ensure_manages(principal, &row)?;
    if row.status.is_closed() {
        return Err(BookingError::invalid("La cita ya está cerrada."));
    }

    database::update_status(pool, appointment_id, AppointmentStatus::Completed, None).await?;
    load(pool, appointment_id, now).await
}

pub async fn delete(
    pool: &SqlitePool,
    principal: &Principal,
    appointment_id: i64,
) -> Result<(), BookingError> {
    let row = fetch(pool, appointment_id).await?;
    ensure_manages(principal, &row)?;

    if !database::delete_appointment(pool, appointment_id).await? {
        return Err(BookingError::NotFound);
    }
    info!("Appointment ID {} deleted by user ID {}", appointment_id, principal.user_id);
    Ok(())
}

/// Bookable times on a date, `HH:MM` on the half-hour grid.
///
/// A time is free when some staff member has nothing active then, or, with
/// nobody on staff, when no active appointment holds it at all.
pub async fn free_slots(
    pool: &SqlitePool,
    date: NaiveDate,
    now: NaiveDateTime,
) -> anyhow::Result<Vec<NaiveTime>> {
    let occupied = database::active_slots_on(pool, date).await?;
    let staff = database::staff_member_ids(pool).await?;

    Ok(scheduling::slot_grid(date)
        .into_iter()
        .filter(|time| scheduling::check_slot(date, *time, now).is_ok())
        .filter(|time| {
            let at_time = || occupied.iter().filter(move |(t, _)| t == time);
            if staff.is_empty() {
                at_time().next().is_none()
            } else {
                staff
                    .iter()
                    .any(|id| at_time().all(|(_, holder)| *holder != Some(*id)))
            }
        })
        .collect())
}

pub async fn client_panel(
    pool: &SqlitePool,
    principal: &Principal,
    now: NaiveDateTime,
) -> anyhow::Result<ClientPanel> {
    let today = now.date();
    let upcoming =
        database::client_upcoming(pool, principal.user_id, today, CLIENT_PANEL_LIMIT).await?;
    let past = database::client_past(pool, principal.user_id, today, CLIENT_PANEL_LIMIT).await?;

    Ok(ClientPanel {
        upcoming: upcoming.into_iter().map(|row| row.into_detail(now)).collect(),
        past: past.into_iter().map(|row| row.into_detail(now)).collect(),
    })
}

pub async fn staff_panel(
    pool: &SqlitePool,
    principal: &Principal,
    now: NaiveDateTime,
) -> anyhow::Result<StaffPanel> {
    let today = now.date();
    let agenda = database::staff_day(pool, principal.user_id, today).await?;
    let upcoming = database::staff_upcoming(pool, principal.user_id, today).await?;

    Ok(StaffPanel {
        today: agenda.into_iter().map(|row| row.into_detail(now)).collect(),
        upcoming: upcoming.into_iter().map(|row| row.into_detail(now)).collect(),
    })
}

pub async fn admin_report(pool: &SqlitePool, today: NaiveDate) -> anyhow::Result<AdminReport> {
    let counted = database::status_counts(pool).await?;
    // Every status shows up, even at zero.
    let status_counts = AppointmentStatus::ALL
        .iter()
        .map(|status| StatusCount {
            status: *status,
            count: counted
                .iter()
                .find(|c| c.status == *status)
                .map_or(0, |c| c.count),
        })
        .collect();

    Ok(AdminReport {
        status_counts,
        unassigned_active: database::unassigned_active(pool).await?,
        staff: database::staff_summaries(pool, today).await?,
        services: database::service_summaries(pool).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;
    use chrono::Duration;
    use salon_common::{CreateServicePayload, GuestContact};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    // Monday 2030-01-07, early morning.
    fn now() -> NaiveDateTime {
        date(2030, 1, 7).and_hms_opt(8, 0, 0).unwrap()
    }

    const TUESDAY: (i32, u32, u32) = (2030, 1, 8);
    const SATURDAY: (i32, u32, u32) = (2030, 1, 12);

    async fn seed_service(pool: &SqlitePool, active: bool) -> i64 {
        database::insert_service(
            pool,
            &CreateServicePayload {
                name: "Corte Clasico".to_string(),
                description: String::new(),
                duration_minutes: 30,
                price: 10000,
                active,
            },
        )
        .await
        .unwrap()
        .id
    }

    async fn seed_user(pool: &SqlitePool, username: &str, role: Role) -> Principal {
        let user = database::insert_user(pool, username, "x@example.com", None, role == Role::Admin)
            .await
            .unwrap()
            .unwrap();
        if role == Role::Staff {
            database::set_staff_member(pool, user.id, true).await.unwrap();
        }
        Principal {
            user_id: user.id,
            username: username.to_string(),
            role,
        }
    }

    fn guest_booking(service_id: i64, (y, m, d): (i32, u32, u32), t: NaiveTime) -> BookingPayload {
        BookingPayload {
            service_id,
            date: date(y, m, d),
            time: t,
            notes: Some("  ".to_string()),
            guest: Some(GuestContact {
                first_name: "Ana".to_string(),
                last_name: "Pérez".to_string(),
                email: "ana@example.com".to_string(),
                phone: String::new(),
            }),
        }
    }

    #[tokio::test]
    async fn test_saturday_morning_booking_is_accepted() {
        let pool = test_pool().await;
        let service = seed_service(&pool, true).await;
        let staff = seed_user(&pool, "barber", Role::Staff).await;

        let detail = book(&pool, None, guest_booking(service, SATURDAY, time(10, 0)), now())
            .await
            .unwrap();

        assert_eq!(detail.appointment.status, AppointmentStatus::Pending);
        assert_eq!(detail.appointment.staff_id, Some(staff.user_id));
        assert_eq!(detail.appointment.notes, None);
        assert!(detail.can_cancel);
        assert_eq!(
            detail.appointment.client,
            Client::Guest {
                name: "Ana Pérez".to_string(),
                email: "ana@example.com".to_string(),
                phone: String::new(),
            }
        );
    }

    #[tokio::test]
    async fn test_tuesday_evening_booking_is_rejected() {
        let pool = test_pool().await;
        let service = seed_service(&pool, true).await;

        let err = book(&pool, None, guest_booking(service, TUESDAY, time(20, 0)), now())
            .await
            .unwrap_err();

        assert!(matches!(err, BookingError::Rejected(SlotRejection::AfterClosing { .. })));
        assert!(err.to_string().contains("atención termina a las 19:00"));
    }

    #[tokio::test]
    async fn test_second_booking_for_same_staff_slot_is_a_conflict() {
        let pool = test_pool().await;
        let service = seed_service(&pool, true).await;
        seed_user(&pool, "barber", Role::Staff).await;

        book(&pool, None, guest_booking(service, TUESDAY, time(11, 0)), now())
            .await
            .unwrap();
        let err = book(&pool, None, guest_booking(service, TUESDAY, time(11, 0)), now())
            .await
            .unwrap_err();

        assert!(matches!(err, BookingError::Rejected(SlotRejection::Taken)));
    }

    #[tokio::test]
    async fn test_second_staff_member_takes_the_overflow() {
        let pool = test_pool().await;
        let service = seed_service(&pool, true).await;
        let first = seed_user(&pool, "uno", Role::Staff).await;
        let second = seed_user(&pool, "dos", Role::Staff).await;

        let a = book(&pool, None, guest_booking(service, TUESDAY, time(11, 0)), now())
            .await
            .unwrap();
        let b = book(&pool, None, guest_booking(service, TUESDAY, time(11, 0)), now())
            .await
            .unwrap();
        // One appointment each: the tie goes to the first staff member.
        let c = book(&pool, None, guest_booking(service, TUESDAY, time(12, 0)), now())
            .await
            .unwrap();

        assert_eq!(a.appointment.staff_id, Some(first.user_id));
        assert_eq!(b.appointment.staff_id, Some(second.user_id));
        assert_eq!(c.appointment.staff_id, Some(first.user_id));
    }

    #[tokio::test]
    async fn test_without_staff_bookings_stay_unassigned_and_still_conflict() {
        let pool = test_pool().await;
        let service = seed_service(&pool, true).await;

        let detail = book(&pool, None, guest_booking(service, TUESDAY, time(9, 30)), now())
            .await
            .unwrap();
        assert_eq!(detail.appointment.staff_id, None);
        assert_eq!(detail.staff_name, None);

        let err = book(&pool, None, guest_booking(service, TUESDAY, time(9, 30)), now())
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Rejected(SlotRejection::Taken)));
    }

    #[tokio::test]
    async fn test_validation_is_idempotent() {
        let pool = test_pool().await;
        let (y, m, d) = TUESDAY;
        let first = validate_slot(&pool, date(y, m, d), time(10, 0), None, None, now()).await;
        let second = validate_slot(&pool, date(y, m, d), time(10, 0), None, None, now()).await;
        assert!(first.is_ok() && second.is_ok());

        let first = validate_slot(&pool, date(y, m, d), time(7, 0), None, None, now()).await;
        let second = validate_slot(&pool, date(y, m, d), time(7, 0), None, None, now()).await;
        assert_eq!(first.unwrap_err().to_string(), second.unwrap_err().to_string());
    }

    #[tokio::test]
    async fn test_booking_requires_guest_contact_and_active_service() {
        let pool = test_pool().await;
        let active = seed_service(&pool, true).await;
        let retired = seed_service(&pool, false).await;

        let mut anonymous = guest_booking(active, TUESDAY, time(10, 0));
        anonymous.guest = None;
        let err = book(&pool, None, anonymous, now()).await.unwrap_err();
        assert!(matches!(err, BookingError::Invalid(_)));

        let mut bad_email = guest_booking(active, TUESDAY, time(10, 0));
        if let Some(guest) = bad_email.guest.as_mut() {
            guest.email = "ana".to_string();
        }
        assert!(matches!(
            book(&pool, None, bad_email, now()).await.unwrap_err(),
            BookingError::Invalid(_)
        ));

        let err = book(&pool, None, guest_booking(retired, TUESDAY, time(10, 0)), now())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "El servicio no está disponible.");
    }

    #[tokio::test]
    async fn test_registered_client_books_for_themselves() {
        let pool = test_pool().await;
        let service = seed_service(&pool, true).await;
        let client = seed_user(&pool, "cliente", Role::Client).await;

        let mut payload = guest_booking(service, TUESDAY, time(10, 0));
        payload.guest = None;
        let detail = book(&pool, Some(&client), payload, now()).await.unwrap();

        assert_eq!(
            detail.appointment.client,
            Client::Registered { user_id: client.user_id }
        );
    }

    #[tokio::test]
    async fn test_client_cancellation_window() {
        let pool = test_pool().await;
        let service = seed_service(&pool, true).await;
        let client = seed_user(&pool, "cliente", Role::Client).await;
        let stranger = seed_user(&pool, "otro", Role::Client).await;

        let mut payload = guest_booking(service, TUESDAY, time(10, 0));
        payload.guest = None;
        let booked = book(&pool, Some(&client), payload, now()).await.unwrap();
        let id = booked.appointment.id;
        let starts = booked.appointment.starts_at();

        let err = cancel(&pool, &stranger, id, None, now()).await.unwrap_err();
        assert!(matches!(err, BookingError::Forbidden(_)));

        let late = starts - Duration::minutes(90);
        let err = cancel(&pool, &client, id, None, late).await.unwrap_err();
        assert!(err.to_string().contains("2 horas"));

        let cancelled = cancel(&pool, &client, id, None, now()).await.unwrap();
        assert_eq!(cancelled.appointment.status, AppointmentStatus::Cancelled);
        assert!(!cancelled.can_cancel);
    }

    #[tokio::test]
    async fn test_staff_actions() {
        let pool = test_pool().await;
        let service = seed_service(&pool, true).await;
        let staff = seed_user(&pool, "barber", Role::Staff).await;
        let other_staff = seed_user(&pool, "otro", Role::Staff).await;
        let client = seed_user(&pool, "cliente", Role::Client).await;

        let booked = book(&pool, None, guest_booking(service, TUESDAY, time(10, 0)), now())
            .await
            .unwrap();
        let id = booked.appointment.id;
        assert_eq!(booked.appointment.staff_id, Some(staff.user_id));

        let err = confirm(&pool, &other_staff, id, now()).await.unwrap_err();
        assert!(matches!(err, BookingError::Forbidden(_)));
        let err = complete(&pool, &client, id, now()).await.unwrap_err();
        assert!(matches!(err, BookingError::Forbidden(_)));

        let confirmed = confirm(&pool, &staff, id, now()).await.unwrap();
        assert_eq!(confirmed.appointment.status, AppointmentStatus::Confirmed);
        assert!(matches!(
            confirm(&pool, &staff, id, now()).await.unwrap_err(),
            BookingError::Invalid(_)
        ));

        let err = cancel(&pool, &staff, id, Some("  "), now()).await.unwrap_err();
        assert_eq!(err.to_string(), "Indica el motivo de la cancelación.");

        let completed = complete(&pool, &staff, id, now()).await.unwrap();
        assert_eq!(completed.appointment.status, AppointmentStatus::Completed);
        assert!(!completed.can_cancel);

        let err = cancel(&pool, &staff, id, Some("Ya no"), now()).await.unwrap_err();
        assert!(matches!(err, BookingError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_reschedule_revalidates_the_new_slot() {
        let pool = test_pool().await;
        let service = seed_service(&pool, true).await;
        let staff = seed_user(&pool, "barber", Role::Staff).await;

        let first = book(&pool, None, guest_booking(service, TUESDAY, time(10, 0)), now())
            .await
            .unwrap();
        let second = book(&pool, None, guest_booking(service, TUESDAY, time(11, 0)), now())
            .await
            .unwrap();
        let (y, m, d) = TUESDAY;

        let onto_first = ReschedulePayload {
            date: date(y, m, d),
            time: time(10, 0),
            reason: "Cambio".to_string(),
        };
        let err = reschedule(&pool, &staff, second.appointment.id, onto_first, now())
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Rejected(SlotRejection::Taken)));

        let sunday = ReschedulePayload {
            date: date(2030, 1, 13),
            time: time(10, 0),
            reason: "Cambio".to_string(),
        };
        let err = reschedule(&pool, &staff, second.appointment.id, sunday, now())
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Rejected(SlotRejection::ClosedSunday)));

        let no_reason = ReschedulePayload {
            date: date(y, m, d),
            time: time(12, 0),
            reason: String::new(),
        };
        assert!(matches!(
            reschedule(&pool, &staff, second.appointment.id, no_reason, now())
                .await
                .unwrap_err(),
            BookingError::Invalid(_)
        ));

        // Moving onto its own slot is fine.
        let same_slot = ReschedulePayload {
            date: date(y, m, d),
            time: time(10, 0),
            reason: "Confirmado por teléfono".to_string(),
        };
        let moved = reschedule(&pool, &staff, first.appointment.id, same_slot, now())
            .await
            .unwrap();
        assert_eq!(
            moved.appointment.reschedule_reason.as_deref(),
            Some("Confirmado por teléfono")
        );
    }

    #[tokio::test]
    async fn test_off_grid_times_cannot_overlap_a_slot() {
        let pool = test_pool().await;
        let service = seed_service(&pool, true).await;
        let staff = seed_user(&pool, "barber", Role::Staff).await;

        let booked = book(&pool, None, guest_booking(service, TUESDAY, time(9, 0)), now())
            .await
            .unwrap();
        for t in [time(9, 7), time(9, 15)] {
            let err = book(&pool, None, guest_booking(service, TUESDAY, t), now())
                .await
                .unwrap_err();
            assert!(matches!(err, BookingError::Rejected(SlotRejection::OffGrid)));
        }

        let (y, m, d) = TUESDAY;
        let off_grid = ReschedulePayload {
            date: date(y, m, d),
            time: time(9, 45),
            reason: "Cambio".to_string(),
        };
        let err = reschedule(&pool, &staff, booked.appointment.id, off_grid, now())
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Rejected(SlotRejection::OffGrid)));

        let agenda = database::staff_day(&pool, staff.user_id, date(y, m, d))
            .await
            .unwrap();
        assert_eq!(agenda.len(), 1);
        assert_eq!(agenda[0].time, time(9, 0));
    }

    #[tokio::test]
    async fn test_delete_and_detail_access() {
        let pool = test_pool().await;
        let service = seed_service(&pool, true).await;
        let admin = seed_user(&pool, "admin", Role::Admin).await;
        let client = seed_user(&pool, "cliente", Role::Client).await;
        let stranger = seed_user(&pool, "otro", Role::Client).await;

        let mut payload = guest_booking(service, TUESDAY, time(10, 0));
        payload.guest = None;
        let id = book(&pool, Some(&client), payload, now())
            .await
            .unwrap()
            .appointment
            .id;

        assert!(detail(&pool, &client, id, now()).await.is_ok());
        assert!(detail(&pool, &admin, id, now()).await.is_ok());
        assert!(matches!(
            detail(&pool, &stranger, id, now()).await.unwrap_err(),
            BookingError::Forbidden(_)
        ));
        assert!(matches!(
            delete(&pool, &client, id).await.unwrap_err(),
            BookingError::Forbidden(_)
        ));

        delete(&pool, &admin, id).await.unwrap();
        assert!(matches!(
            detail(&pool, &admin, id, now()).await.unwrap_err(),
            BookingError::NotFound
        ));
    }

    #[tokio::test]
    async fn test_free_slots() {
        let pool = test_pool().await;
        let service = seed_service(&pool, true).await;
        let (y, m, d) = TUESDAY;
        let tuesday = date(y, m, d);

        let all = free_slots(&pool, tuesday, now()).await.unwrap();
        assert_eq!(all.len(), 20);

        // Unassigned booking blocks the slot when nobody is on staff.
        book(&pool, None, guest_booking(service, TUESDAY, time(9, 0)), now())
            .await
            .unwrap();
        let free = free_slots(&pool, tuesday, now()).await.unwrap();
        assert_eq!(free.len(), 19);
        assert!(!free.contains(&time(9, 0)));

        // With one staff member, their booking blocks 10:00 but the legacy
        // unassigned 09:00 no longer does.
        seed_user(&pool, "barber", Role::Staff).await;
        book(&pool, None, guest_booking(service, TUESDAY, time(10, 0)), now())
            .await
            .unwrap();
        let free = free_slots(&pool, tuesday, now()).await.unwrap();
        assert!(free.contains(&time(9, 0)));
        assert!(!free.contains(&time(10, 0)));

        // Past times of today are left out, Sundays have nothing.
        let midday = tuesday.and_hms_opt(12, 15, 0).unwrap();
        let afternoon = free_slots(&pool, tuesday, midday).await.unwrap();
        assert_eq!(afternoon.first(), Some(&time(12, 30)));
        assert!(free_slots(&pool, date(2030, 1, 13), now()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_panels() {
        let pool = test_pool().await;
        let service = seed_service(&pool, true).await;
        let staff = seed_user(&pool, "barber", Role::Staff).await;
        let client = seed_user(&pool, "cliente", Role::Client).await;

        for t in [time(10, 0), time(11, 0)] {
            let mut payload = guest_booking(service, TUESDAY, t);
            payload.guest = None;
            book(&pool, Some(&client), payload, now()).await.unwrap();
        }

        let panel = client_panel(&pool, &client, now()).await.unwrap();
        assert_eq!(panel.upcoming.len(), 2);
        assert!(panel.past.is_empty());
        assert_eq!(panel.upcoming[0].appointment.time, time(10, 0));

        let (y, m, d) = TUESDAY;
        let on_the_day = date(y, m, d).and_hms_opt(8, 0, 0).unwrap();
        let agenda = staff_panel(&pool, &staff, on_the_day).await.unwrap();
        assert_eq!(agenda.today.len(), 2);
        assert!(agenda.upcoming.is_empty());

        let day_before = staff_panel(&pool, &staff, now()).await.unwrap();
        assert!(day_before.today.is_empty());
        assert_eq!(day_before.upcoming.len(), 2);
    }

    #[tokio::test]
    async fn test_admin_report_lists_every_status() {
        let pool = test_pool().await;
        let service = seed_service(&pool, true).await;
        let staff = seed_user(&pool, "barber", Role::Staff).await;

        let done = book(&pool, None, guest_booking(service, TUESDAY, time(9, 0)), now())
            .await
            .unwrap();
        complete(&pool, &staff, done.appointment.id, now()).await.unwrap();
        book(&pool, None, guest_booking(service, TUESDAY, time(9, 30)), now())
            .await
            .unwrap();

        let report = admin_report(&pool, now().date()).await.unwrap();
        let counts: Vec<(AppointmentStatus, i64)> = report
            .status_counts
            .iter()
            .map(|c| (c.status, c.count))
            .collect();
        assert_eq!(
            counts,
            vec![
                (AppointmentStatus::Pending, 1),
                (AppointmentStatus::Confirmed, 0),
                (AppointmentStatus::Completed, 1),
                (AppointmentStatus::Cancelled, 0),
            ]
        );
        assert_eq!(report.unassigned_active, 0);
        assert_eq!(report.staff.len(), 1);
        assert_eq!(report.staff[0].username, "barber");
        assert_eq!(report.staff[0].upcoming_active, 1);
        assert_eq!(report.services[0].completed_revenue, 10000);
    }
}
