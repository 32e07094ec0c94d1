//! Request extractors for authentication.
//!
//! - [`AuthUser`]: any signed-in user (bearer token or `session` cookie)
//! - [`AdminUser`], [`ChefUser`]: signed-in users with that role
//! - [`InternalCaller`]: service-to-service calls carrying the shared bearer secret

use super::state::AppState;
use crate::{
    core::identity,
    entities::{Role, user},
    errors::Error,
};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "session";

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn cookie_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
}

/// The signed-in user, reloaded from the database so role changes apply immediately.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .or_else(|| cookie_token(&parts.headers))
            .ok_or_else(|| Error::unauthorized("Sign in required"))?;

        let claims = identity::verify_token(&state.config.session_secret, token)?;
        let user = identity::find_user_by_id(&state.db, claims.sub)
            .await?
            .ok_or_else(|| Error::unauthorized("Account no longer exists"))?;
        Ok(Self(user))
    }
}

#[derive(Debug, Clone)]
pub struct AdminUser(pub user::Model);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::Admin {
            return Err(Error::forbidden("Administrator access required"));
        }
        Ok(Self(user))
    }
}

#[derive(Debug, Clone)]
pub struct ChefUser(pub user::Model);

#[async_trait]
impl FromRequestParts<AppState> for ChefUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::Chef {
            return Err(Error::forbidden("Chef access required"));
        }
        Ok(Self(user))
    }
}

/// A caller presenting `Authorization: Bearer <WEBHOOK_SECRET_KEY>`.
#[derive(Debug, Clone, Copy)]
pub struct InternalCaller;

#[async_trait]
impl FromRequestParts<AppState> for InternalCaller {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).unwrap_or_default();
        let secret = state.config.webhook_secret_key.as_bytes();
        if !secret.is_empty() && constant_time_eq::constant_time_eq(token.as_bytes(), secret) {
            Ok(Self)
        } else {
            Err(Error::unauthorized("Unauthorized"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_token_sources() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session=tok.sig; other=1"),
        );
        assert_eq!(cookie_token(&headers), Some("tok.sig"));
        assert_eq!(bearer_token(&headers), None);
    }
}
