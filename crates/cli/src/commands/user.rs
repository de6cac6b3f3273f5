//! User management commands.

use wear_with_pride_api::db::PgStore;
use wear_with_pride_api::services::users::UserError;
use wear_with_pride_api::store::UserStore;
use wear_with_pride_core::UserId;

use super::{CliError, connect};

/// Block an active user or reactivate a blocked one.
pub async fn toggle(id: UserId) -> Result<(), CliError> {
    let store = PgStore::new(connect().await?);
    let user = store
        .toggle_user_status(id)
        .await
        .map_err(UserError::from)?
        .ok_or(UserError::NotFound(id))?;

    tracing::info!(user_id = %user.id, status = ?user.status, "User status updated");
    Ok(())
}
