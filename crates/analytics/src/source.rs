use crate::error::AnalyticsError;
use async_trait::async_trait;
use core_types::{CycleWithProfiles, User, Window};
use uuid::Uuid;

/// A read-only view of the ownership graph for the duration of one reporting run.
///
/// Implementations hold whatever resource backs the session (a pooled
/// connection for Postgres) and release it when dropped.
#[async_trait]
pub trait CycleSource: Send {
    /// Fetches a single user, or `None` when the id is unknown.
    async fn user(&mut self, id: Uuid) -> Result<Option<User>, AnalyticsError>;

    /// Fetches every known user, in a stable order.
    async fn users(&mut self) -> Result<Vec<User>, AnalyticsError>;

    /// Fetches the user's cycles whose creation time falls inside `window`.
    async fn cycles_in_window(
        &mut self,
        user_id: Uuid,
        window: &Window,
    ) -> Result<Vec<CycleWithProfiles>, AnalyticsError>;
}

/// Hands out one short-lived `CycleSource` per reporting run.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn open_session(&self) -> Result<Box<dyn CycleSource>, AnalyticsError>;
}
