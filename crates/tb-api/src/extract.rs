//! Bearer-token principal extraction.
//!
//! Handlers that take a [`Principal`] only run for requests carrying a valid
//! `Authorization: Bearer <token>` header. The core sees nothing but the
//! resulting principal name.

use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};
use tb_core::error::AppError;
use tb_core::models::Identity;

use crate::error::ApiError;
use crate::handlers::AppState;

#[derive(Debug, Clone)]
pub struct Principal(pub Identity);

impl FromRequest for Principal {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(principal(req))
    }
}

fn principal(req: &HttpRequest) -> Result<Principal, ApiError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::Internal("application state not configured".into()))?;

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".into()))?;

    Ok(Principal(state.identity.verify(token)?))
}
