pub mod households;
pub mod invites;

use axum::Router;

use crate::AppState;
use crate::store::HouseholdStore;

pub fn api_router<S: HouseholdStore>() -> Router<AppState<S>> {
    Router::new()
        .merge(households::router())
        .merge(invites::router())
}
