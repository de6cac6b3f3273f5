//! Operator user management: listing accounts and blocking them.

use thiserror::Error;

use wear_with_pride_core::UserId;

use crate::db::RepositoryError;
use crate::models::{User, UserFilter};
use crate::store::Store;

/// User management failures.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("user {0} not found")]
    NotFound(UserId),

    /// An admin tried to block their own account.
    #[error("user {0} cannot change their own status")]
    OwnAccount(UserId),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// One page of the operator user listing.
#[derive(Debug, Clone)]
pub struct UserPage {
    pub users: Vec<User>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
}

impl UserPage {
    #[must_use]
    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.limit.max(1)))
    }
}

/// User service.
pub struct UserService<'a> {
    store: &'a dyn Store,
}

impl<'a> UserService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Operator listing with filters, search and paging.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the query fails.
    pub async fn list(&self, filter: UserFilter) -> Result<UserPage, UserError> {
        let filter = filter.normalized();
        let (users, total) = self.store.list_users(&filter).await?;
        Ok(UserPage {
            users,
            page: filter.page,
            limit: filter.limit,
            total,
        })
    }

    /// Flip a user between active and blocked on behalf of `admin`.
    ///
    /// A blocked user keeps their orders but every authenticated request is
    /// refused from then on.
    ///
    /// # Errors
    ///
    /// Returns `OwnAccount` when `admin` targets themselves and `NotFound`
    /// for an unknown user.
    #[tracing::instrument(skip(self), fields(admin_id = %admin, user_id = %user_id))]
    pub async fn toggle_status(&self, admin: UserId, user_id: UserId) -> Result<User, UserError> {
        if admin == user_id {
            return Err(UserError::OwnAccount(user_id));
        }
        let user = self
            .store
            .toggle_user_status(user_id)
            .await?
            .ok_or(UserError::NotFound(user_id))?;
        tracing::info!(status = ?user.status, "User status changed by admin");
        Ok(user)
    }
}
