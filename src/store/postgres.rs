use sqlx::PgPool;
use uuid::Uuid;

use crate::models::household::{Household, NewHousehold};
use crate::models::invite::{InviteCode, NewInvite};
use crate::models::membership::{Membership, NewMembership};

use super::{HouseholdStore, StoreResult};

const HOUSEHOLD_COLUMNS: &str = "id, name, created_by, theme, created_at";
const MEMBERSHIP_COLUMNS: &str = "id, user_id, household_id, role, created_by, created_at";
const INVITE_COLUMNS: &str =
    "id, code, household_id, created_by, expires_at, uses_remaining, created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl HouseholdStore for PgStore {
    async fn insert_household(&self, new: NewHousehold) -> StoreResult<Household> {
        let household = sqlx::query_as::<_, Household>(&format!(
            "INSERT INTO households (name, theme, created_by)
             VALUES ($1, $2, $3)
             RETURNING {HOUSEHOLD_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(new.theme)
        .bind(new.created_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(household)
    }

    async fn find_household(&self, id: Uuid) -> StoreResult<Option<Household>> {
        let household = sqlx::query_as::<_, Household>(&format!(
            "SELECT {HOUSEHOLD_COLUMNS} FROM households WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(household)
    }

    async fn delete_household(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM households WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_membership(&self, new: NewMembership) -> StoreResult<Membership> {
        let membership = sqlx::query_as::<_, Membership>(&format!(
            "INSERT INTO member_households (user_id, household_id, role, created_by)
             VALUES ($1, $2, $3, $4)
             RETURNING {MEMBERSHIP_COLUMNS}"
        ))
        .bind(new.user_id)
        .bind(new.household_id)
        .bind(new.role)
        .bind(new.created_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(membership)
    }

    async fn find_membership(
        &self,
        user_id: Uuid,
        household_id: Uuid,
    ) -> StoreResult<Option<Membership>> {
        let membership = sqlx::query_as::<_, Membership>(&format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM member_households
             WHERE user_id = $1 AND household_id = $2"
        ))
        .bind(user_id)
        .bind(household_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(membership)
    }

    async fn memberships_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Membership>> {
        let memberships = sqlx::query_as::<_, Membership>(&format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM member_households
             WHERE user_id = $1
             ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(memberships)
    }

    async fn insert_invite(&self, new: NewInvite) -> StoreResult<InviteCode> {
        let invite = sqlx::query_as::<_, InviteCode>(&format!(
            "INSERT INTO household_invites (code, household_id, created_by, expires_at, uses_remaining)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {INVITE_COLUMNS}"
        ))
        .bind(&new.code)
        .bind(new.household_id)
        .bind(new.created_by)
        .bind(new.expires_at)
        .bind(new.uses_remaining)
        .fetch_one(&self.pool)
        .await?;

        Ok(invite)
    }

    async fn find_invite(&self, code: &str) -> StoreResult<Option<InviteCode>> {
        let invite = sqlx::query_as::<_, InviteCode>(&format!(
            "SELECT {INVITE_COLUMNS} FROM household_invites WHERE code = $1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invite)
    }

    async fn invites_for_household(&self, household_id: Uuid) -> StoreResult<Vec<InviteCode>> {
        let invites = sqlx::query_as::<_, InviteCode>(&format!(
            "SELECT {INVITE_COLUMNS} FROM household_invites
             WHERE household_id = $1
             ORDER BY created_at DESC"
        ))
        .bind(household_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(invites)
    }

    async fn claim_invite_use(&self, code: &str) -> StoreResult<bool> {
        // Conditional decrement: two concurrent claims on the last use cannot both succeed.
        let claimed: Option<(i32,)> = sqlx::query_as(
            "UPDATE household_invites
             SET uses_remaining = uses_remaining - 1
             WHERE code = $1 AND uses_remaining > 0
             RETURNING uses_remaining",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(claimed.is_some())
    }

    async fn release_invite_use(&self, code: &str) -> StoreResult<()> {
        sqlx::query(
            "UPDATE household_invites
             SET uses_remaining = uses_remaining + 1
             WHERE code = $1 AND uses_remaining IS NOT NULL",
        )
        .bind(code)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
