//! Users and the authenticated principal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account role carried in the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    /// Parse a role claim. Anything other than `admin` is a regular user.
    pub fn from_claim(raw: &str) -> Self {
        Self::parse(raw).unwrap_or(Role::User)
    }

    /// Strict parse for role assignments.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

/// A stored account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub role: Role,
    pub is_banned: bool,
    /// Reputation points.
    pub poin: i32,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// A fresh account for a principal seen for the first time.
    pub fn from_principal(principal: &Principal) -> Self {
        Self {
            id: principal.user_id,
            name: principal.name.clone(),
            email: principal.email.clone(),
            image: None,
            role: principal.role,
            is_banned: principal.is_banned,
            poin: 0,
            created_at: Utc::now(),
        }
    }

    pub fn public_profile(&self) -> PublicProfile {
        PublicProfile {
            id: self.id,
            name: self.name.clone(),
            image: self.image.clone(),
            poin: self.poin,
            created_at: self.created_at,
        }
    }
}

/// What anyone may see of another user's account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicProfile {
    pub id: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub poin: i32,
    pub created_at: DateTime<Utc>,
}

/// The authenticated caller of a request, decoded from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_banned: bool,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Apply the moderation state stored for this account.
    ///
    /// The stored role replaces the claim; a ban from either side sticks.
    pub fn with_account(mut self, account: &User) -> Self {
        self.role = account.role;
        self.is_banned = self.is_banned || account.is_banned;
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn principal(role: Role, is_banned: bool) -> Principal {
        Principal {
            user_id: Uuid::now_v7(),
            name: "Rina".into(),
            email: "rina@campus.test".into(),
            role,
            is_banned,
        }
    }

    #[test]
    fn role_claim_parsing() {
        assert_eq!(Role::from_claim("admin"), Role::Admin);
        assert_eq!(Role::from_claim("ADMIN"), Role::Admin);
        assert_eq!(Role::from_claim("user"), Role::User);
        assert_eq!(Role::from_claim("moderator"), Role::User);
    }

    #[test]
    fn strict_role_parsing() {
        assert_eq!(Role::parse(" Admin "), Some(Role::Admin));
        assert_eq!(Role::parse("user"), Some(Role::User));
        assert_eq!(Role::parse("moderator"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn stored_account_overrides_claims() {
        let claimed = principal(Role::Admin, false);
        let mut account = User::from_principal(&claimed);
        account.role = Role::User;
        account.is_banned = true;

        let effective = claimed.with_account(&account);
        assert_eq!(effective.role, Role::User);
        assert!(effective.is_banned);
    }

    #[test]
    fn banned_claim_survives_clean_account() {
        let claimed = principal(Role::User, true);
        let mut account = User::from_principal(&claimed);
        account.is_banned = false;

        assert!(claimed.with_account(&account).is_banned);
    }

    #[test]
    fn public_profile_has_no_email() {
        let user = User::from_principal(&principal(Role::User, false));
        let json = serde_json::to_value(user.public_profile()).unwrap();
        assert!(json.get("email").is_none());
        assert_eq!(json["poin"], 0);
    }
}
