use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use uuid::Uuid;

use crate::AppState;
use crate::auth::middleware::AuthUser;
use crate::error::AppError;
use crate::models::invite::InviteResponse;
use crate::store::HouseholdStore;

pub fn router<S: HouseholdStore>() -> Router<AppState<S>> {
    Router::new().route(
        "/api/households/{id}/invites",
        post(create_invite::<S>).get(list_invites::<S>),
    )
}

async fn create_invite<S: HouseholdStore>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    Path(household_id): Path<Uuid>,
) -> Result<Json<InviteResponse>, AppError> {
    let invite = state
        .issuer
        .issue_invite(household_id, auth.user_id)
        .await?;

    Ok(Json(invite.into_response(Utc::now())))
}

async fn list_invites<S: HouseholdStore>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    Path(household_id): Path<Uuid>,
) -> Result<Json<Vec<InviteResponse>>, AppError> {
    let now = Utc::now();
    let invites = state
        .issuer
        .list_invites(household_id, auth.user_id)
        .await?;

    Ok(Json(
        invites
            .into_iter()
            .map(|invite| invite.into_response(now))
            .collect(),
    ))
}
