use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InviteCode {
    pub id: Uuid,
    pub code: String,
    pub household_id: Uuid,
    pub created_by: Uuid,
    pub expires_at: DateTime<Utc>,
    /// `None` means the code has no use limit.
    pub uses_remaining: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl InviteCode {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_exhausted(&self) -> bool {
        self.uses_remaining.is_some_and(|n| n <= 0)
    }

    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        !self.is_expired(now) && !self.is_exhausted()
    }

    pub fn into_response(self, now: DateTime<Utc>) -> InviteResponse {
        let redeemable = self.is_redeemable(now);
        InviteResponse {
            code: self.code,
            household_id: self.household_id,
            created_by: self.created_by,
            expires_at: self.expires_at,
            uses_remaining: self.uses_remaining,
            created_at: self.created_at,
            redeemable,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewInvite {
    pub code: String,
    pub household_id: Uuid,
    pub created_by: Uuid,
    pub expires_at: DateTime<Utc>,
    pub uses_remaining: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct InviteResponse {
    pub code: String,
    pub household_id: Uuid,
    pub created_by: Uuid,
    pub expires_at: DateTime<Utc>,
    pub uses_remaining: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub redeemable: bool,
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn invite(expires_at: DateTime<Utc>, uses_remaining: Option<i32>) -> InviteCode {
        InviteCode {
            id: Uuid::new_v4(),
            code: "AB3DE7GH".into(),
            household_id: Uuid::new_v4(),
            created_by: Uuid::new_v4(),
            expires_at,
            uses_remaining,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn expiry_is_exclusive_of_the_deadline() {
        let now = Utc::now();
        assert!(invite(now + Duration::seconds(1), Some(1)).is_redeemable(now));
        assert!(!invite(now, Some(1)).is_redeemable(now));
        assert!(!invite(now - Duration::seconds(1), Some(1)).is_redeemable(now));
    }

    #[test]
    fn null_uses_never_exhaust() {
        let now = Utc::now();
        let unlimited = invite(now + Duration::days(1), None);
        assert!(!unlimited.is_exhausted());
        assert!(unlimited.is_redeemable(now));

        assert!(invite(now + Duration::days(1), Some(0)).is_exhausted());
    }
}
