use std::str::FromStr;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::{TimeDelta, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};

use crate::{config::AppConfig, error::ApiError};

/// Header honoured by the opt-in development auth bypass.
pub const DEV_ROLE_HEADER: &str = "x-user-role";

/// Role
///
/// Caller roles, ordered by privilege: an `admin` satisfies every `user` requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    /// True when this role meets the `required` minimum.
    pub fn grants(self, required: Role) -> bool {
        self >= required
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}

/// Claims
///
/// Payload of the HS256 bearer tokens accepted by the API.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the caller's account id.
    pub sub: String,
    pub role: Role,
    /// Expiration time (seconds since epoch). Always validated.
    pub exp: usize,
    /// Issued at (seconds since epoch).
    pub iat: usize,
}

/// Signs a token for `sub` with `role`, valid for `ttl`.
pub fn issue_token(
    secret: &str,
    sub: &str,
    role: Role,
    ttl: TimeDelta,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: sub.to_string(),
        role,
        exp: (now + ttl).timestamp().max(0) as usize,
        iat: now.timestamp().max(0) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// AuthUser
///
/// The resolved identity of an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub role: Role,
}

/// Resolution order:
/// 1. An identity already attached by `auth_middleware` (request extensions).
/// 2. Only with `auth_dev_bypass`: the `x-user-role` header.
/// 3. `Authorization: Bearer <jwt>`, signature and expiry checked against `jwt_secret`.
///
/// Rejects with 401 on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let config = AppConfig::from_ref(state);

        if config.auth_dev_bypass {
            let dev_role = parts
                .headers
                .get(DEV_ROLE_HEADER)
                .and_then(|value| value.to_str().ok())
                .and_then(|raw| raw.parse::<Role>().ok());

            if let Some(role) = dev_role {
                tracing::debug!(?role, "Local auth bypass");
                return Ok(AuthUser {
                    id: format!("local-{}", role.as_str()),
                    role,
                });
            }
        }

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(ApiError::Unauthorized)?;

        let mut validation = Validation::default();
        validation.validate_exp = true;

        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let token_data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => tracing::debug!("Rejected expired token"),
                other => tracing::debug!(error = ?other, "Rejected invalid token"),
            }
            ApiError::Unauthorized
        })?;

        Ok(AuthUser {
            id: token_data.claims.sub,
            role: token_data.claims.role,
        })
    }
}

/// AdminUser
///
/// An [`AuthUser`] whose role is `admin`. Authenticated callers without it get 403.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;

        if !user.role.grants(Role::Admin) {
            tracing::warn!(user_id = %user.id, "Admin-only route refused");
            return Err(ApiError::Forbidden);
        }

        Ok(AdminUser(user))
    }
}
