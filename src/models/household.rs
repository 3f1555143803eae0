use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "household_theme", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Default,
    Warm,
    Cool,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Household {
    pub id: Uuid,
    pub name: String,
    pub created_by: Uuid,
    pub theme: Theme,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewHousehold {
    pub name: String,
    pub theme: Theme,
    pub created_by: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct CreateHouseholdRequest {
    pub name: String,
    #[serde(default)]
    pub theme: Theme,
}

#[derive(Debug, Serialize)]
pub struct CreateHouseholdResponse {
    pub household_id: Uuid,
    /// Empty when the household was created but no invite could be minted.
    pub invite_code: String,
}

#[derive(Debug, Deserialize)]
pub struct JoinHouseholdRequest {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct JoinHouseholdResponse {
    pub household_id: Uuid,
    pub household_name: String,
}
