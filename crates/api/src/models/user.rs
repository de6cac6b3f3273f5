//! Shop user model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use wear_with_pride_core::{Email, UserId, UserRole, UserStatus};

/// A registered shop user.
///
/// Accounts are created by the authentication service; this backend reads
/// them to authorize requests and address receipts, and lets an operator
/// block or reactivate them.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: UserRole,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.status == UserStatus::Blocked
    }
}

/// Operator user listing filter. `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    /// Case-insensitive substring of the name or email.
    pub search: Option<String>,
    pub page: u32,
    pub limit: u32,
}

impl UserFilter {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 100;

    /// Clamp paging like the order listing and drop a blank search term.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.page = self.page.max(1);
        self.limit = match self.limit {
            0 => Self::DEFAULT_LIMIT,
            n => n.min(Self::MAX_LIMIT),
        };
        self.search = self
            .search
            .map(|term| term.trim().to_string())
            .filter(|term| !term.is_empty());
        self
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }

    /// Whether `user` passes the filter (paging not considered).
    #[must_use]
    pub fn matches(&self, user: &User) -> bool {
        let found = self.search.as_deref().is_none_or(|term| {
            let term = term.to_lowercase();
            user.name.to_lowercase().contains(&term)
                || user.email.as_str().to_lowercase().contains(&term)
        });
        found
            && self.role.is_none_or(|r| r == user.role)
            && self.status.is_none_or(|s| s == user.status)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user(name: &str, email: &str, status: UserStatus) -> User {
        let now = Utc::now();
        User {
            id: UserId::new(1),
            name: name.to_string(),
            email: Email::parse(email).unwrap(),
            role: UserRole::User,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_search_matches_name_or_email() {
        let ada = user("Ada Obi", "ada@example.com", UserStatus::Active);
        let filter = UserFilter {
            search: Some("OBI".to_string()),
            ..UserFilter::default()
        };
        assert!(filter.matches(&ada));

        let filter = UserFilter {
            search: Some("example.com".to_string()),
            ..UserFilter::default()
        };
        assert!(filter.matches(&ada));

        let filter = UserFilter {
            search: Some("tunde".to_string()),
            ..UserFilter::default()
        };
        assert!(!filter.matches(&ada));
    }

    #[test]
    fn test_status_filter_and_blank_search() {
        let blocked = user("Bisi", "bisi@example.com", UserStatus::Blocked);
        let filter = UserFilter {
            status: Some(UserStatus::Active),
            search: Some("   ".to_string()),
            ..UserFilter::default()
        }
        .normalized();
        assert!(filter.search.is_none());
        assert!(!filter.matches(&blocked));
        assert_eq!(filter.limit, UserFilter::DEFAULT_LIMIT);
        assert_eq!(filter.offset(), 0);
    }
}
