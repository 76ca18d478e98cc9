// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::{
    auth::{AdminOnly, Authenticated, MaybeAuthenticated, StaffOnly},
    booking, database,
    error::AppError,
    scheduling,
};
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use chrono::{Local, NaiveDate, NaiveDateTime};
use salon_common::{
    AdminReport, AppointmentDetail, BookingPayload, CancelPayload, ClientPanel,
    CreateServicePayload, FreeSlots, Landing, RegisterPayload, ReschedulePayload, Service,
    StaffPanel, StaffProfile, User, hhmm,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{debug, error, info};

/// Business hours are local to the salon.
fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Handler for the landing page: active services and opening hours.
pub async fn landing(State(pool): State<SqlitePool>) -> Result<Json<Landing>, AppError> {
    let services = database::list_active_services(&pool).await?;
    Ok(Json(Landing {
        services,
        hours: scheduling::weekly_hours(),
    }))
}

/// Handler for registering a new account.
/// The user and its profile are created together or not at all.
pub async fn register(
    State(pool): State<SqlitePool>,
    Json(payload): Json<RegisterPayload>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let username = payload.username.trim();
    let email = payload.email.trim();
    if username.is_empty() || email.is_empty() {
        error!("Validation failed: username or email is empty.");
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            "El nombre de usuario y el correo son obligatorios.",
        ));
    }
    if !email.contains('@') {
        error!("Validation failed: invalid email {:?}", email);
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            "El correo no es válido.",
        ));
    }

    let phone = payload
        .phone
        .as_deref()
        .map(str::trim)
        .filter(|phone| !phone.is_empty());

    let Some(user) = database::insert_user(&pool, username, email, phone, false).await? else {
        return Err(AppError::new(
            StatusCode::CONFLICT,
            "El nombre de usuario ya existe.",
        ));
    };

    info!("Account created for {}", user.username);
    Ok((StatusCode::CREATED, Json(user)))
}

/// Handler for submitting a booking, logged in or not.
pub async fn book(
    State(pool): State<SqlitePool>,
    MaybeAuthenticated(caller): MaybeAuthenticated,
    Json(payload): Json<BookingPayload>,
) -> Result<(StatusCode, Json<AppointmentDetail>), AppError> {
    debug!(
        "Received booking request for {} {}",
        payload.date,
        hhmm::format(&payload.time)
    );
    let detail = booking::book(&pool, caller.as_ref(), payload, local_now()).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

#[derive(Deserialize, Debug)]
pub struct SlotsQuery {
    pub fecha: NaiveDate,
}

/// Handler listing the free slots of a date.
pub async fn free_slots(
    State(pool): State<SqlitePool>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<FreeSlots>, AppError> {
    let slots = booking::free_slots(&pool, query.fecha, local_now()).await?;
    Ok(Json(FreeSlots {
        horas: slots.iter().map(hhmm::format).collect(),
    }))
}

pub async fn client_panel(
    State(pool): State<SqlitePool>,
    Authenticated(principal): Authenticated,
) -> Result<Json<ClientPanel>, AppError> {
    Ok(Json(
        booking::client_panel(&pool, &principal, local_now()).await?,
    ))
}

pub async fn staff_panel(
    State(pool): State<SqlitePool>,
    StaffOnly(principal): StaffOnly,
) -> Result<Json<StaffPanel>, AppError> {
    Ok(Json(
        booking::staff_panel(&pool, &principal, local_now()).await?,
    ))
}

pub async fn admin_panel(
    State(pool): State<SqlitePool>,
    AdminOnly(_): AdminOnly,
) -> Result<Json<AdminReport>, AppError> {
    Ok(Json(
        booking::admin_report(&pool, local_now().date()).await?,
    ))
}

pub async fn create_service(
    State(pool): State<SqlitePool>,
    AdminOnly(_): AdminOnly,
    Json(payload): Json<CreateServicePayload>,
) -> Result<(StatusCode, Json<Service>), AppError> {
    if payload.name.trim().is_empty() || payload.duration_minutes <= 0 || payload.price < 0 {
        error!("Validation failed for service {:?}", payload.name);
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            "El servicio necesita nombre, duración positiva y precio válido.",
        ));
    }

    let service = database::insert_service(&pool, &payload).await?;
    info!("Service created with ID: {}", service.id);
    Ok((StatusCode::CREATED, Json(service)))
}

/// Handler flagging an account as a staff member.
pub async fn flag_staff(
    State(pool): State<SqlitePool>,
    AdminOnly(_): AdminOnly,
    Path(user_id): Path<i64>,
) -> Result<Json<StaffProfile>, AppError> {
    if database::find_user(&pool, user_id).await?.is_none() {
        return Err(AppError::new(
            StatusCode::NOT_FOUND,
            &format!("User with ID {user_id} not found."),
        ));
    }
    Ok(Json(database::set_staff_member(&pool, user_id, true).await?))
}

pub async fn appointment_detail(
    State(pool): State<SqlitePool>,
    Authenticated(principal): Authenticated,
    Path(appointment_id): Path<i64>,
) -> Result<Json<AppointmentDetail>, AppError> {
    Ok(Json(
        booking::detail(&pool, &principal, appointment_id, local_now()).await?,
    ))
}

pub async fn delete_appointment(
    State(pool): State<SqlitePool>,
    StaffOnly(principal): StaffOnly,
    Path(appointment_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    booking::delete(&pool, &principal, appointment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn cancel_appointment(
    State(pool): State<SqlitePool>,
    Authenticated(principal): Authenticated,
    Path(appointment_id): Path<i64>,
    Json(payload): Json<CancelPayload>,
) -> Result<Json<AppointmentDetail>, AppError> {
    Ok(Json(
        booking::cancel(
            &pool,
            &principal,
            appointment_id,
            payload.reason.as_deref(),
            local_now(),
        )
        .await?,
    ))
}

pub async fn reschedule_appointment(
    State(pool): State<SqlitePool>,
    StaffOnly(principal): StaffOnly,
    Path(appointment_id): Path<i64>,
    Json(payload): Json<ReschedulePayload>,
) -> Result<Json<AppointmentDetail>, AppError> {
    Ok(Json(
        booking::reschedule(&pool, &principal, appointment_id, payload, local_now()).await?,
    ))
}

pub async fn confirm_appointment(
    State(pool): State<SqlitePool>,
    StaffOnly(principal): StaffOnly,
    Path(appointment_id): Path<i64>,
) -> Result<Json<AppointmentDetail>, AppError> {
    Ok(Json(
        booking::confirm(&pool, &principal, appointment_id, local_now()).await?,
    ))
}

pub async fn complete_appointment(
    State(pool): State<SqlitePool>,
    StaffOnly(principal): StaffOnly,
    Path(appointment_id): Path<i64>,
) -> Result<Json<AppointmentDetail>, AppError> {
    Ok(Json(
        booking::complete(&pool, &principal, appointment_id, local_now()).await?,
    ))
}
