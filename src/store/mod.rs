//! Data-store interface consumed by the invite workflow.
//!
//! The issuer and redeemer only ever talk to a [`HouseholdStore`]; the
//! production implementation is [`postgres::PgStore`], tests use the
//! in-memory fake in [`memory`].

#[cfg(test)]
pub mod memory;
pub mod postgres;

use std::future::Future;

use uuid::Uuid;

use crate::models::household::{Household, NewHousehold};
use crate::models::invite::{InviteCode, NewInvite};
use crate::models::membership::{Membership, NewMembership};

#[derive(Debug)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    UniqueViolation(String),
    Backend(String),
}

impl StoreError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UniqueViolation(msg) => write!(f, "unique constraint violated: {msg}"),
            Self::Backend(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::UniqueViolation(db.message().to_string())
            }
            _ => Self::Backend(e.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

pub trait HouseholdStore: Clone + Send + Sync + 'static {
    fn insert_household(
        &self,
        new: NewHousehold,
    ) -> impl Future<Output = StoreResult<Household>> + Send;

    fn find_household(&self, id: Uuid)
    -> impl Future<Output = StoreResult<Option<Household>>> + Send;

    fn delete_household(&self, id: Uuid) -> impl Future<Output = StoreResult<()>> + Send;

    fn insert_membership(
        &self,
        new: NewMembership,
    ) -> impl Future<Output = StoreResult<Membership>> + Send;

    fn find_membership(
        &self,
        user_id: Uuid,
        household_id: Uuid,
    ) -> impl Future<Output = StoreResult<Option<Membership>>> + Send;

    /// Newest membership first.
    fn memberships_for_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = StoreResult<Vec<Membership>>> + Send;

    fn insert_invite(&self, new: NewInvite)
    -> impl Future<Output = StoreResult<InviteCode>> + Send;

    /// Exact, case-sensitive match on the code.
    fn find_invite(&self, code: &str)
    -> impl Future<Output = StoreResult<Option<InviteCode>>> + Send;

    /// Newest invite first.
    fn invites_for_household(
        &self,
        household_id: Uuid,
    ) -> impl Future<Output = StoreResult<Vec<InviteCode>>> + Send;

    /// Atomically takes one use from a limited code. Returns `false` when no
    /// use was left (or the code has no limit), in which case nothing changed.
    fn claim_invite_use(&self, code: &str) -> impl Future<Output = StoreResult<bool>> + Send;

    /// Gives back a use taken by [`HouseholdStore::claim_invite_use`].
    fn release_invite_use(&self, code: &str) -> impl Future<Output = StoreResult<()>> + Send;
}
