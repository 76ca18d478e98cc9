// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::handlers;
use axum::{
    Router,
    routing::{get, post},
};
use sqlx::SqlitePool;

/// Creates and configures the application router.
pub fn create_router(pool: SqlitePool) -> Router {
    Router::new()
        // Public pages
        .route("/", get(handlers::landing))
        .route("/registro/", post(handlers::register))
        .route("/agendar/", post(handlers::book))
        .route("/horas/", get(handlers::free_slots))
        // Role-scoped dashboards
        .route("/panel/", get(handlers::client_panel))
        .route("/peluquero/", get(handlers::staff_panel))
        .route("/admin_panel/", get(handlers::admin_panel))
        .route("/admin_panel/servicios/", post(handlers::create_service))
        .route(
            "/admin_panel/peluqueros/{user_id}/",
            post(handlers::flag_staff),
        )
        // Actions on a single appointment
        .route(
            "/cita/{id}/",
            get(handlers::appointment_detail).delete(handlers::delete_appointment),
        )
        .route("/cita/{id}/cancelar/", post(handlers::cancel_appointment))
        .route(
            "/cita/{id}/reagendar/",
            post(handlers::reschedule_appointment),
        )
        .route("/cita/{id}/confirmar/", post(handlers::confirm_appointment))
        .route("/cita/{id}/completar/", post(handlers::complete_appointment))
        // Adds the database pool to the application state
        .with_state(pool)
}
