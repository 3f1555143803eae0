use tracing::{error, info};
use uuid::Uuid;

use crate::store::HouseholdStore;

/// Undo action for a step that already took effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
    DeleteHousehold(Uuid),
    ReleaseInviteUse(String),
}

/// Records completed steps of a multi-write operation so they can be undone
/// in reverse order if a later step fails.
pub struct Saga<'a, S> {
    store: &'a S,
    completed: Vec<Compensation>,
}

impl<'a, S: HouseholdStore> Saga<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            completed: Vec::new(),
        }
    }

    pub fn record(&mut self, compensation: Compensation) {
        self.completed.push(compensation);
    }

    /// Runs every recorded compensation, newest first. Returns the ones that failed.
    pub async fn unwind(self) -> Vec<Compensation> {
        let mut failed = Vec::new();
        for compensation in self.completed.into_iter().rev() {
            let result = match &compensation {
                Compensation::DeleteHousehold(id) => self.store.delete_household(*id).await,
                Compensation::ReleaseInviteUse(code) => self.store.release_invite_use(code).await,
            };
            match result {
                Ok(()) => info!(?compensation, "compensation applied"),
                Err(e) => {
                    error!(?compensation, error = %e, "compensation failed");
                    failed.push(compensation);
                }
            }
        }
        failed
    }
}
