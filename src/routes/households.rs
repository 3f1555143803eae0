use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::AppState;
use crate::auth::middleware::AuthUser;
use crate::error::AppError;
use crate::households::HouseholdError;
use crate::models::household::{
    CreateHouseholdRequest, CreateHouseholdResponse, JoinHouseholdRequest, JoinHouseholdResponse,
};
use crate::models::membership::CurrentHouseholdResponse;
use crate::store::HouseholdStore;

pub fn router<S: HouseholdStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/api/households", post(create_household::<S>))
        .route("/api/households/join", post(join_household::<S>))
        .route("/api/households/current", get(current_household::<S>))
}

async fn create_household<S: HouseholdStore>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    Json(body): Json<CreateHouseholdRequest>,
) -> Result<Json<CreateHouseholdResponse>, AppError> {
    let created = state
        .issuer
        .create_household(&body.name, body.theme, auth.user_id)
        .await?;

    Ok(Json(CreateHouseholdResponse {
        household_id: created.household_id,
        invite_code: created.invite_code.unwrap_or_default(),
    }))
}

async fn join_household<S: HouseholdStore>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    Json(body): Json<JoinHouseholdRequest>,
) -> Result<Json<JoinHouseholdResponse>, AppError> {
    let joined = state
        .redeemer
        .join_household(&body.code, auth.user_id)
        .await?;

    Ok(Json(JoinHouseholdResponse {
        household_id: joined.household_id,
        household_name: joined.household_name,
    }))
}

/// The caller's most recently joined household; 404 sends the client to setup.
async fn current_household<S: HouseholdStore>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
) -> Result<Json<CurrentHouseholdResponse>, AppError> {
    let memberships = state
        .store
        .memberships_for_user(auth.user_id)
        .await
        .map_err(HouseholdError::Store)?;

    for membership in memberships {
        let household = state
            .store
            .find_household(membership.household_id)
            .await
            .map_err(HouseholdError::Store)?;

        if let Some(household) = household {
            return Ok(Json(CurrentHouseholdResponse {
                household,
                role: membership.role,
            }));
        }
    }

    Err(AppError::NotFound("You are not a member of any household".into()))
}
