// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Resolves the caller of a request.
//!
//! Logging users in is done upstream; by the time a request gets here the
//! authenticated account id travels in the `x-user-id` header. The role is
//! looked up once, here, and handlers only ever see the resulting
//! [`Principal`].
use crate::{database, error::AppError};

use axum::{extract::FromRequestParts, http::StatusCode, http::request::Parts};
use salon_common::{Principal, Role};
use sqlx::SqlitePool;
use tracing::debug;

pub const USER_HEADER: &str = "x-user-id";

pub fn resolve_role(is_admin: bool, is_staff_member: bool) -> Role {
    if is_admin {
        Role::Admin
    } else if is_staff_member {
        Role::Staff
    } else {
        Role::Client
    }
}

fn header_user_id(parts: &Parts) -> Result<Option<i64>, AppError> {
    let Some(value) = parts.headers.get(USER_HEADER) else {
        return Ok(None);
    };
    value
        .to_str()
        .ok()
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .map(Some)
        .ok_or_else(|| AppError::new(StatusCode::UNAUTHORIZED, "Sesión inválida."))
}

async fn load_principal(pool: &SqlitePool, user_id: i64) -> Result<Principal, AppError> {
    let Some((username, is_admin, is_staff_member)) =
        database::find_role_flags(pool, user_id).await?
    else {
        return Err(AppError::new(StatusCode::UNAUTHORIZED, "Sesión inválida."));
    };

    let role = resolve_role(is_admin, is_staff_member);
    debug!("Resolved user ID {} as {:?}", user_id, role);

    Ok(Principal {
        user_id,
        username,
        role,
    })
}

/// An authenticated caller. Rejects with 401 when nobody is logged in.
pub struct Authenticated(pub Principal);

impl FromRequestParts<SqlitePool> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, pool: &SqlitePool) -> Result<Self, Self::Rejection> {
        match header_user_id(parts)? {
            Some(user_id) => Ok(Authenticated(load_principal(pool, user_id).await?)),
            None => Err(AppError::new(
                StatusCode::UNAUTHORIZED,
                "Debes iniciar sesión.",
            )),
        }
    }
}

/// A caller that may or may not be logged in, e.g. on the booking form.
pub struct MaybeAuthenticated(pub Option<Principal>);

impl FromRequestParts<SqlitePool> for MaybeAuthenticated {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, pool: &SqlitePool) -> Result<Self, Self::Rejection> {
        match header_user_id(parts)? {
            Some(user_id) => Ok(MaybeAuthenticated(Some(load_principal(pool, user_id).await?))),
            None => Ok(MaybeAuthenticated(None)),
        }
    }
}

/// Only staff members and admins get past this one.
pub struct StaffOnly(pub Principal);

impl FromRequestParts<SqlitePool> for StaffOnly {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, pool: &SqlitePool) -> Result<Self, Self::Rejection> {
        let Authenticated(principal) = Authenticated::from_request_parts(parts, pool).await?;
        if !principal.role.manages_appointments() {
            return Err(AppError::new(
                StatusCode::FORBIDDEN,
                "Solo los peluqueros pueden acceder a esta sección.",
            ));
        }
        Ok(StaffOnly(principal))
    }
}

pub struct AdminOnly(pub Principal);

impl FromRequestParts<SqlitePool> for AdminOnly {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, pool: &SqlitePool) -> Result<Self, Self::Rejection> {
        let Authenticated(principal) = Authenticated::from_request_parts(parts, pool).await?;
        if principal.role != Role::Admin {
            return Err(AppError::new(
                StatusCode::FORBIDDEN,
                "Solo los administradores pueden acceder a esta sección.",
            ));
        }
        Ok(AdminOnly(principal))
    }
}
