//! Test context for managing test setup and lifecycle.
//!
//! Provides a composable `TestContext` that explicitly shows what each test needs:
//! a store on a pinned clock and a logged-in user.

use std::sync::Arc;

use chrono::NaiveDate;
use intentions::{
    Clock, FixedClock,
    store::{Store, User},
    tools::ToolExecutor,
};

/// Store, clock and user for one test.
///
/// The clock starts at 2025-01-15 10:00 UTC, so the working day is 2025-01-15.
pub struct TestContext {
    clock: Arc<FixedClock>,
    store: Store,
    user: User,
}

impl TestContext {
    /// Create a context with a fresh in-memory store and user "alice".
    pub async fn new() -> Self {
        Self::at(FixedClock::at(2025, 1, 15, 10, 0)).await
    }

    /// Create a context whose store uses the given clock.
    pub async fn at(clock: FixedClock) -> Self {
        let clock = Arc::new(clock);
        let store = Store::in_memory_with_clock(clock.clone())
            .await
            .expect("Failed to create store");
        let user = store
            .create_user("alice", None)
            .await
            .expect("Failed to create user");
        Self { clock, store, user }
    }

    pub fn clock(&self) -> &FixedClock {
        &self.clock
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn user_id(&self) -> i64 {
        self.user.id
    }

    /// Re-read the user row, e.g. after changing a preference.
    pub async fn reload_user(&mut self) -> &User {
        self.user = self
            .store
            .user(self.user.id)
            .await
            .expect("Failed to reload user");
        &self.user
    }

    /// Tool executor acting as this context's user.
    pub fn executor(&self) -> ToolExecutor {
        ToolExecutor::new(self.store.clone(), self.user.id)
    }

    /// The working day of the pinned clock.
    pub fn today(&self) -> NaiveDate {
        self.clock.working_day()
    }

    /// A second user, for ownership checks.
    pub async fn other_user(&self, name: &str) -> User {
        self.store
            .create_user(name, None)
            .await
            .expect("Failed to create second user")
    }
}
