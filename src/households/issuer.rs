use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::household::{NewHousehold, Theme};
use crate::models::invite::{InviteCode, NewInvite};
use crate::models::membership::{MemberRole, NewMembership};
use crate::store::{HouseholdStore, StoreError};

use super::code::generate_invite_code;
use super::saga::{Compensation, Saga};
use super::{HouseholdError, InvitePolicy, validate_household_name};

/// Fresh codes to try when the store reports a collision.
const MAX_CODE_ATTEMPTS: usize = 5;

#[derive(Debug, Clone)]
pub struct CreatedHousehold {
    pub household_id: Uuid,
    /// `None` when the household was created but minting its first invite failed.
    pub invite_code: Option<String>,
}

#[derive(Clone)]
pub struct InviteIssuer<S> {
    store: S,
    policy: InvitePolicy,
}

impl<S: HouseholdStore> InviteIssuer<S> {
    pub fn new(store: S, policy: InvitePolicy) -> Self {
        Self { store, policy }
    }

    /// Creates a household with `creator` as its admin, plus a first invite.
    ///
    /// The writes are sequential, not transactional. A failed membership insert
    /// deletes the household again; a failed invite insert is tolerated and
    /// reported as `invite_code: None`.
    pub async fn create_household(
        &self,
        name: &str,
        theme: Theme,
        creator: Uuid,
    ) -> Result<CreatedHousehold, HouseholdError> {
        let name = validate_household_name(name)?;

        let household = self
            .store
            .insert_household(NewHousehold {
                name,
                theme,
                created_by: creator,
            })
            .await
            .map_err(|e| {
                error!(%creator, error = %e, "household insert failed");
                HouseholdError::HouseholdCreationFailed(e)
            })?;

        let mut saga = Saga::new(&self.store);
        saga.record(Compensation::DeleteHousehold(household.id));

        let membership = self
            .store
            .insert_membership(NewMembership {
                user_id: creator,
                household_id: household.id,
                role: MemberRole::Admin,
                created_by: creator,
            })
            .await;

        if let Err(source) = membership {
            error!(
                household_id = %household.id,
                %creator,
                error = %source,
                "admin membership insert failed, rolling back household"
            );
            let failed = saga.unwind().await;
            let orphaned_household = (!failed.is_empty()).then_some(household.id);
            if let Some(id) = orphaned_household {
                error!(household_id = %id, "household left without members");
            }
            return Err(HouseholdError::MembershipCreationFailed {
                source,
                orphaned_household,
            });
        }

        let invite_code = match self.mint_invite(household.id, creator).await {
            Ok(invite) => Some(invite.code),
            Err(e) => {
                warn!(
                    household_id = %household.id,
                    error = %e,
                    "household created without an invite code"
                );
                None
            }
        };

        info!(household_id = %household.id, %creator, "household created");

        Ok(CreatedHousehold {
            household_id: household.id,
            invite_code,
        })
    }

    /// Mints an additional invite for a household the requester administers.
    pub async fn issue_invite(
        &self,
        household_id: Uuid,
        requester: Uuid,
    ) -> Result<InviteCode, HouseholdError> {
        self.require_admin(household_id, requester).await?;

        let invite = self
            .mint_invite(household_id, requester)
            .await
            .map_err(|e| {
                error!(%household_id, %requester, error = %e, "invite insert failed");
                HouseholdError::InviteCreationFailed(e)
            })?;

        info!(%household_id, %requester, "invite issued");
        Ok(invite)
    }

    pub async fn list_invites(
        &self,
        household_id: Uuid,
        requester: Uuid,
    ) -> Result<Vec<InviteCode>, HouseholdError> {
        self.require_admin(household_id, requester).await?;

        self.store
            .invites_for_household(household_id)
            .await
            .map_err(HouseholdError::Store)
    }

    async fn require_admin(
        &self,
        household_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), HouseholdError> {
        let membership = self
            .store
            .find_membership(user_id, household_id)
            .await
            .map_err(HouseholdError::Store)?;

        match membership {
            Some(m) if m.is_admin() => Ok(()),
            _ => Err(HouseholdError::NotAdmin),
        }
    }

    async fn mint_invite(
        &self,
        household_id: Uuid,
        created_by: Uuid,
    ) -> Result<InviteCode, StoreError> {
        let mut attempt = 1;
        loop {
            let expires_at = Utc::now()
                .checked_add_signed(self.policy.ttl)
                .ok_or_else(|| StoreError::Backend("invite expiry is out of range".into()))?;
            let new = NewInvite {
                code: generate_invite_code(),
                household_id,
                created_by,
                expires_at,
                uses_remaining: self.policy.max_uses,
            };

            match self.store.insert_invite(new).await {
                Err(e) if e.is_unique_violation() && attempt < MAX_CODE_ATTEMPTS => {
                    warn!(%household_id, attempt, "invite code collision, regenerating");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}
