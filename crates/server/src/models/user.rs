//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use resold_core::{Role, UserId};

/// A marketplace account.
///
/// The password hash is deliberately not part of this type; credential
/// handling belongs to the identity service that issues bearer tokens.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    /// Account role (`user` or `admin`).
    pub role: Role,
    /// Disabled accounts cannot be acted on by buyers (moderation flag).
    pub disabled: bool,
    /// Whether the account's email has been verified.
    pub verified: bool,
    #[serde(rename = "registeredAt")]
    pub registered_at: DateTime<Utc>,
    #[serde(rename = "lastLogin")]
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// Display name used for buyer/seller attribution.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_joins_first_and_last() {
        let user = User {
            id: UserId::new(1),
            firstname: "Ada".into(),
            lastname: "Lovelace".into(),
            email: "ada@example.com".into(),
            role: Role::User,
            disabled: false,
            verified: true,
            registered_at: Utc::now(),
            last_login: None,
        };
        assert_eq!(user.full_name(), "Ada Lovelace");
    }
}
