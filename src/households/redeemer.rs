use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::membership::{MemberRole, NewMembership};
use crate::store::HouseholdStore;

use super::saga::{Compensation, Saga};
use super::{HouseholdError, normalize_code};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedHousehold {
    pub household_id: Uuid,
    pub household_name: String,
}

#[derive(Clone)]
pub struct InviteRedeemer<S> {
    store: S,
}

impl<S: HouseholdStore> InviteRedeemer<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Redeems `code` for `user_id`.
    ///
    /// Checks run in a fixed order so that a dead code reports expired or
    /// exhausted before the caller is told they are already a member.
    pub async fn join_household(
        &self,
        code: &str,
        user_id: Uuid,
    ) -> Result<JoinedHousehold, HouseholdError> {
        let code = normalize_code(code)?;

        let invite = self
            .store
            .find_invite(&code)
            .await
            .map_err(HouseholdError::Store)?
            .ok_or(HouseholdError::InvalidCode)?;

        if invite.is_expired(Utc::now()) {
            return Err(HouseholdError::ExpiredCode);
        }
        if invite.is_exhausted() {
            return Err(HouseholdError::ExhaustedCode);
        }

        let existing = self
            .store
            .find_membership(user_id, invite.household_id)
            .await
            .map_err(HouseholdError::Store)?;
        if existing.is_some() {
            return Err(HouseholdError::AlreadyMember);
        }

        let household = self
            .store
            .find_household(invite.household_id)
            .await
            .map_err(HouseholdError::Store)?
            .ok_or(HouseholdError::HouseholdNotFound(invite.household_id))?;

        let mut saga = Saga::new(&self.store);

        if invite.uses_remaining.is_some() {
            match self.store.claim_invite_use(&code).await {
                Ok(true) => saga.record(Compensation::ReleaseInviteUse(code.clone())),
                // Another redemption took the last use since the read above.
                Ok(false) => return Err(HouseholdError::ExhaustedCode),
                Err(e) => {
                    warn!(%code, %user_id, error = %e, "could not decrement invite uses, joining anyway");
                }
            }
        }

        let inserted = self
            .store
            .insert_membership(NewMembership {
                user_id,
                household_id: household.id,
                role: MemberRole::Member,
                created_by: user_id,
            })
            .await;

        if let Err(e) = inserted {
            let failed = saga.unwind().await;
            if !failed.is_empty() {
                warn!(%code, %user_id, "claimed invite use could not be returned");
            }
            if e.is_unique_violation() {
                return Err(HouseholdError::AlreadyMember);
            }
            error!(
                household_id = %household.id,
                %user_id,
                error = %e,
                "membership insert failed"
            );
            return Err(HouseholdError::JoinFailed(e));
        }

        info!(household_id = %household.id, %user_id, "joined household");

        Ok(JoinedHousehold {
            household_id: household.id,
            household_name: household.name,
        })
    }
}
