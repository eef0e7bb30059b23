//! User account store trait.
//!
//! Account persistence is conventional CRUD; only the operations the auth
//! flows need are specified here. The session manager treats this store as
//! an external collaborator: it reads accounts to bind tokens to live users
//! and never mutates them.

use async_trait::async_trait;
use uuid::Uuid;

use oxcart_core::User;

use crate::AuthResult;

/// Storage trait for user accounts.
///
/// # Implementations
///
/// - `oxcart-auth-postgres` - PostgreSQL storage backend
/// - [`crate::storage::MemoryUserStore`] - in-memory backend
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persists a new account.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` error when the email is already
    /// registered, and a `Storage` error for any other failure.
    async fn create(&self, user: &User) -> AuthResult<()>;

    /// Looks up an account by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<User>>;

    /// Looks up an account by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>>;

    /// Counts all accounts. Used by the first-run bootstrap to decide
    /// whether to seed an administrator.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn count(&self) -> AuthResult<u64>;
}
