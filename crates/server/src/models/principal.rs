//! The authenticated request principal.

use resold_core::{Role, UserId};

/// Identity decoded from the request's bearer token.
///
/// The core trusts this without re-verification against the users table;
/// token issuance belongs to the identity collaborator.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: UserId,
    pub firstname: String,
    pub lastname: String,
    pub role: Role,
}

impl Principal {
    /// Display name used for buyer attribution on transactions.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }
}
