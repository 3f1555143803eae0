//! In-memory [`HouseholdStore`] with per-operation fault injection.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use uuid::Uuid;

use crate::models::household::{Household, NewHousehold};
use crate::models::invite::{InviteCode, NewInvite};
use crate::models::membership::{Membership, NewMembership};

use super::{HouseholdStore, StoreError, StoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    InsertHousehold,
    DeleteHousehold,
    InsertMembership,
    InsertInvite,
    /// The next invite insert reports a code collision.
    InviteCodeTaken,
    FindInvite,
    ClaimInviteUse,
    ReleaseInviteUse,
}

#[derive(Default)]
struct Tables {
    households: Vec<Household>,
    memberships: Vec<Membership>,
    invites: Vec<InviteCode>,
    faults: HashMap<Fault, usize>,
    yield_after_invite_lookup: bool,
}

impl Tables {
    fn trip(&mut self, fault: Fault) -> StoreResult<()> {
        match self.faults.get_mut(&fault) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                if fault == Fault::InviteCodeTaken {
                    Err(StoreError::UniqueViolation("household_invites_code_key".into()))
                } else {
                    Err(StoreError::Backend(format!("injected failure: {fault:?}")))
                }
            }
            _ => Ok(()),
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `times` calls of the given operation fail.
    pub fn fail(&self, fault: Fault, times: usize) {
        self.lock().faults.insert(fault, times);
    }

    /// Makes every invite lookup yield to the scheduler before returning, so
    /// concurrent redemptions interleave between their read and their claim.
    pub fn yield_after_invite_lookup(&self) {
        self.lock().yield_after_invite_lookup = true;
    }

    pub fn put_invite(&self, invite: InviteCode) {
        self.lock().invites.push(invite);
    }

    pub fn household_count(&self) -> usize {
        self.lock().households.len()
    }

    pub fn membership_count(&self, household_id: Uuid) -> usize {
        self.lock()
            .memberships
            .iter()
            .filter(|m| m.household_id == household_id)
            .count()
    }

    pub fn invite(&self, code: &str) -> Option<InviteCode> {
        self.lock().invites.iter().find(|i| i.code == code).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl HouseholdStore for MemoryStore {
    async fn insert_household(&self, new: NewHousehold) -> StoreResult<Household> {
        let mut tables = self.lock();
        tables.trip(Fault::InsertHousehold)?;
        let household = Household {
            id: Uuid::new_v4(),
            name: new.name,
            created_by: new.created_by,
            theme: new.theme,
            created_at: Utc::now(),
        };
        tables.households.push(household.clone());
        Ok(household)
    }

    async fn find_household(&self, id: Uuid) -> StoreResult<Option<Household>> {
        Ok(self.lock().households.iter().find(|h| h.id == id).cloned())
    }

    async fn delete_household(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.lock();
        tables.trip(Fault::DeleteHousehold)?;
        tables.households.retain(|h| h.id != id);
        tables.memberships.retain(|m| m.household_id != id);
        tables.invites.retain(|i| i.household_id != id);
        Ok(())
    }

    async fn insert_membership(&self, new: NewMembership) -> StoreResult<Membership> {
        let mut tables = self.lock();
        tables.trip(Fault::InsertMembership)?;
        if tables
            .memberships
            .iter()
            .any(|m| m.user_id == new.user_id && m.household_id == new.household_id)
        {
            return Err(StoreError::UniqueViolation(
                "member_households_user_id_household_id_key".into(),
            ));
        }
        let membership = Membership {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            household_id: new.household_id,
            role: new.role,
            created_by: new.created_by,
            created_at: Utc::now(),
        };
        tables.memberships.push(membership.clone());
        Ok(membership)
    }

    async fn find_membership(
        &self,
        user_id: Uuid,
        household_id: Uuid,
    ) -> StoreResult<Option<Membership>> {
        Ok(self
            .lock()
            .memberships
            .iter()
            .find(|m| m.user_id == user_id && m.household_id == household_id)
            .cloned())
    }

    async fn memberships_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Membership>> {
        let mut memberships: Vec<Membership> = self
            .lock()
            .memberships
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();
        memberships.reverse();
        Ok(memberships)
    }

    async fn insert_invite(&self, new: NewInvite) -> StoreResult<InviteCode> {
        let mut tables = self.lock();
        tables.trip(Fault::InviteCodeTaken)?;
        tables.trip(Fault::InsertInvite)?;
        if tables.invites.iter().any(|i| i.code == new.code) {
            return Err(StoreError::UniqueViolation("household_invites_code_key".into()));
        }
        let invite = InviteCode {
            id: Uuid::new_v4(),
            code: new.code,
            household_id: new.household_id,
            created_by: new.created_by,
            expires_at: new.expires_at,
            uses_remaining: new.uses_remaining,
            created_at: Utc::now(),
        };
        tables.invites.push(invite.clone());
        Ok(invite)
    }

    async fn find_invite(&self, code: &str) -> StoreResult<Option<InviteCode>> {
        let (invite, pause) = {
            let mut tables = self.lock();
            tables.trip(Fault::FindInvite)?;
            let invite = tables.invites.iter().find(|i| i.code == code).cloned();
            (invite, tables.yield_after_invite_lookup)
        };
        if pause {
            tokio::task::yield_now().await;
        }
        Ok(invite)
    }

    async fn invites_for_household(&self, household_id: Uuid) -> StoreResult<Vec<InviteCode>> {
        let mut invites: Vec<InviteCode> = self
            .lock()
            .invites
            .iter()
            .filter(|i| i.household_id == household_id)
            .cloned()
            .collect();
        invites.reverse();
        Ok(invites)
    }

    async fn claim_invite_use(&self, code: &str) -> StoreResult<bool> {
        let mut tables = self.lock();
        tables.trip(Fault::ClaimInviteUse)?;
        let Some(invite) = tables.invites.iter_mut().find(|i| i.code == code) else {
            return Ok(false);
        };
        match invite.uses_remaining.as_mut() {
            Some(n) if *n > 0 => {
                *n -= 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release_invite_use(&self, code: &str) -> StoreResult<()> {
        let mut tables = self.lock();
        tables.trip(Fault::ReleaseInviteUse)?;
        if let Some(n) = tables
            .invites
            .iter_mut()
            .find(|i| i.code == code)
            .and_then(|i| i.uses_remaining.as_mut())
        {
            *n += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn new_invite(code: &str, uses_remaining: Option<i32>) -> NewInvite {
        NewInvite {
            code: code.into(),
            household_id: Uuid::new_v4(),
            created_by: Uuid::new_v4(),
            expires_at: Utc::now() + Duration::days(7),
            uses_remaining,
        }
    }

    #[tokio::test]
    async fn claim_never_goes_negative() {
        let store = MemoryStore::new();
        store.insert_invite(new_invite("AAAABBBB", Some(1))).await.unwrap();

        assert!(store.claim_invite_use("AAAABBBB").await.unwrap());
        assert!(!store.claim_invite_use("AAAABBBB").await.unwrap());
        assert_eq!(store.invite("AAAABBBB").unwrap().uses_remaining, Some(0));
    }

    #[tokio::test]
    async fn claim_on_unlimited_code_changes_nothing() {
        let store = MemoryStore::new();
        store.insert_invite(new_invite("CCCCDDDD", None)).await.unwrap();

        assert!(!store.claim_invite_use("CCCCDDDD").await.unwrap());
        store.release_invite_use("CCCCDDDD").await.unwrap();
        assert_eq!(store.invite("CCCCDDDD").unwrap().uses_remaining, None);
    }

    #[tokio::test]
    async fn duplicate_codes_are_rejected() {
        let store = MemoryStore::new();
        store.insert_invite(new_invite("EEEEFFFF", Some(10))).await.unwrap();

        let err = store
            .insert_invite(new_invite("EEEEFFFF", Some(10)))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn faults_trip_the_requested_number_of_times() {
        let store = MemoryStore::new();
        store.fail(Fault::InsertInvite, 1);

        assert!(store.insert_invite(new_invite("GGGGHHHH", None)).await.is_err());
        assert!(store.insert_invite(new_invite("GGGGHHHH", None)).await.is_ok());
    }
}
