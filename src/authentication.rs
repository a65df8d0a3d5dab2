use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use secrecy::{ExposeSecret, Secret};
use uuid::Uuid;

use crate::error::ApiError;

/// Application state for the privileged routes: the configured bearer token
/// and the admin row it maps to.
#[derive(Clone)]
pub struct AdminAuth {
    pub token: Secret<String>,
    pub admin_id: Uuid,
}

/// Proof that the caller presented the admin bearer token. Extracted at the
/// HTTP boundary; the managers treat it as an opaque capability and never
/// consult ambient state. Handlers that allow anonymous access take it as
/// `Option<AdminContext>`.
#[derive(Debug, Clone, Copy)]
pub struct AdminContext {
    pub admin_id: Uuid,
}

impl FromRequest for AdminContext {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authorize(req))
    }
}

fn authorize(req: &HttpRequest) -> Result<AdminContext, ApiError> {
    let auth = req
        .app_data::<web::Data<AdminAuth>>()
        .ok_or(ApiError::Unauthorized)?;
    let header = req
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;
    let token = header.strip_prefix("Bearer ").ok_or(ApiError::Unauthorized)?;

    if token != auth.token.expose_secret() {
        return Err(ApiError::Unauthorized);
    }

    Ok(AdminContext {
        admin_id: auth.admin_id,
    })
}
