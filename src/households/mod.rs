//! Household invite lifecycle: issue codes with a new household, redeem
//! them to join one.

pub mod code;
pub mod issuer;
pub mod redeemer;
mod saga;

use chrono::Duration;
use uuid::Uuid;

use crate::store::StoreError;

pub const MAX_HOUSEHOLD_NAME_CHARS: usize = 50;

/// Expiry and use limit stamped onto every minted invite.
#[derive(Debug, Clone, Copy)]
pub struct InvitePolicy {
    pub ttl: Duration,
    /// `None` mints codes without a use limit.
    pub max_uses: Option<i32>,
}

impl Default for InvitePolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::days(7),
            max_uses: Some(10),
        }
    }
}

#[derive(Debug)]
pub enum HouseholdError {
    Validation(String),
    InvalidCode,
    ExpiredCode,
    ExhaustedCode,
    AlreadyMember,
    /// An invite points at a household row that no longer exists.
    HouseholdNotFound(Uuid),
    HouseholdCreationFailed(StoreError),
    MembershipCreationFailed {
        source: StoreError,
        /// Set when the compensating delete failed too and the household row was left behind.
        orphaned_household: Option<Uuid>,
    },
    NotAdmin,
    InviteCreationFailed(StoreError),
    JoinFailed(StoreError),
    Store(StoreError),
}

impl std::fmt::Display for HouseholdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(msg) => write!(f, "{msg}"),
            Self::InvalidCode => write!(f, "Invalid invite code"),
            Self::ExpiredCode => write!(f, "This invite code has expired"),
            Self::ExhaustedCode => write!(f, "This invite code has no uses left"),
            Self::AlreadyMember => write!(f, "You are already a member of this household"),
            Self::HouseholdNotFound(id) => write!(f, "Household {id} not found"),
            Self::HouseholdCreationFailed(e) => write!(f, "Failed to create household: {e}"),
            Self::MembershipCreationFailed {
                source,
                orphaned_household: None,
            } => write!(f, "Failed to add you to the new household: {source}"),
            Self::MembershipCreationFailed {
                source,
                orphaned_household: Some(id),
            } => write!(
                f,
                "Failed to add you to the new household: {source} (household {id} could not be cleaned up)"
            ),
            Self::NotAdmin => write!(f, "Only household admins can manage invites"),
            Self::InviteCreationFailed(e) => write!(f, "Failed to create invite: {e}"),
            Self::JoinFailed(e) => write!(f, "Failed to join household: {e}"),
            Self::Store(e) => write!(f, "Data store error: {e}"),
        }
    }
}

impl std::error::Error for HouseholdError {}

/// Trims the name and enforces the 1..=50 character bound.
pub fn validate_household_name(name: &str) -> Result<String, HouseholdError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(HouseholdError::Validation("Household name is required".into()));
    }
    if trimmed.chars().count() > MAX_HOUSEHOLD_NAME_CHARS {
        return Err(HouseholdError::Validation(format!(
            "Household name must be at most {MAX_HOUSEHOLD_NAME_CHARS} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Codes are compared upper-case; users often type them in lower case.
pub fn normalize_code(code: &str) -> Result<String, HouseholdError> {
    let normalized = code.trim().to_uppercase();
    if normalized.is_empty() {
        return Err(HouseholdError::Validation("Invite code is required".into()));
    }
    Ok(normalized)
}
