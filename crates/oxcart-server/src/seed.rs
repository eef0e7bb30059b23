//! First-run administrator bootstrap.

use std::sync::Arc;

use tracing::{debug, info};

use oxcart_auth::config::AuthConfig;
use oxcart_auth::error::AuthError;
use oxcart_auth::password::hash_password;
use oxcart_auth::storage::UserStore;
use oxcart_core::{Role, User};

/// Seeds the configured administrator account when the user table is empty.
///
/// Runs once at startup. A non-empty table or missing seed credentials make
/// this a no-op; it never overwrites an existing account.
///
/// # Errors
/// Returns an error if hashing or the storage write fails.
pub async fn seed_admin(users: &Arc<dyn UserStore>, auth: &AuthConfig) -> Result<(), AuthError> {
    let (Some(email), Some(password)) = (
        auth.seed_admin_email.as_deref(),
        auth.seed_admin_password.as_deref(),
    ) else {
        debug!("seed admin disabled: credentials not configured");
        return Ok(());
    };

    if users.count().await? > 0 {
        debug!("seed admin skipped: user table is not empty");
        return Ok(());
    }

    let password_hash = hash_password(password)?;
    let admin = User::new(email, "Administrator", password_hash, Role::Superadmin);
    users.create(&admin).await?;
    info!(user_id = %admin.id, "seeded initial administrator account");
    Ok(())
}
