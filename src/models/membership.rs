use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::household::Household;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "member_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Admin,
    Member,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Membership {
    pub id: Uuid,
    pub user_id: Uuid,
    pub household_id: Uuid,
    pub role: MemberRole,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Membership {
    pub fn is_admin(&self) -> bool {
        self.role == MemberRole::Admin
    }
}

#[derive(Debug, Clone)]
pub struct NewMembership {
    pub user_id: Uuid,
    pub household_id: Uuid,
    pub role: MemberRole,
    pub created_by: Uuid,
}

#[derive(Debug, Serialize)]
pub struct CurrentHouseholdResponse {
    pub household: Household,
    pub role: MemberRole,
}
