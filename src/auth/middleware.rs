use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use crate::AppState;
use crate::error::AppError;
use crate::store::HouseholdStore;

use super::jwt;

const COOKIE_NAME: &str = "token";

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
}

impl<S: HouseholdStore> FromRequestParts<AppState<S>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        let token = match bearer_token(parts) {
            Some(token) => token,
            None => {
                let jar = CookieJar::from_request_parts(parts, state)
                    .await
                    .map_err(|_| AppError::Unauthorized)?;
                jar.get(COOKIE_NAME)
                    .map(|c| c.value().to_string())
                    .ok_or(AppError::Unauthorized)?
            }
        };

        let claims = jwt::validate_token(
            &token,
            &state.config.jwt_secret,
            &state.config.jwt_audience,
        )?;

        Ok(AuthUser {
            user_id: claims.sub,
        })
    }
}
