use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use idmint_core::User;

/// Pluggable user lookup consulted while minting identity tokens.
///
/// Implement this trait to back the minter with your own storage
/// (SQLx, Redis, LDAP, etc.). Credential checks happen elsewhere.
pub trait UserStore: Send + Sync + 'static {
    /// Find a user by username (the token subject).
    fn find_by_username(&self, username: &str) -> impl Future<Output = Option<User>> + Send;
}

/// In-memory user store for development and testing.
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<DashMap<String, User>>,
}

impl InMemoryUserStore {
    /// Create a new empty in-memory user store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user, keyed by its username.
    pub fn add_user(self, user: User) -> Self {
        self.users.insert(user.username.clone(), user);
        self
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl UserStore for InMemoryUserStore {
    fn find_by_username(&self, username: &str) -> impl Future<Output = Option<User>> + Send {
        let result = self.users.get(username).map(|entry| entry.value().clone());
        async move { result }
    }
}
