//! An in-memory `SessionProvider` used by tests across the workspace and for
//! exercising the reporting pipeline without a database.

use crate::error::AnalyticsError;
use crate::source::{CycleSource, SessionProvider};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{Cycle, CycleStatus, CycleWithProfiles, Profile, ProfileKind, Role, User, Window};
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// The three counters of a profile, in `[deposits, withdrawals, daily_redemption]` order.
pub type Counters = [Decimal; 3];

#[derive(Debug, Default)]
struct Inner {
    users: Vec<User>,
    cycles: Vec<CycleWithProfiles>,
    unavailable: bool,
    open_sessions: usize,
    sessions_opened: usize,
}

/// Users and cycles kept in insertion order behind a shared lock.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_user(&self, username: &str, role: Role) -> User {
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            role,
            is_active: true,
            created_at: Utc::now(),
        };
        self.lock().users.push(user.clone());
        user
    }

    /// Records a cycle for `owner` with the given parent and child counters.
    pub fn add_cycle(
        &self,
        owner: &User,
        created_at: DateTime<Utc>,
        parent: Counters,
        child: Counters,
    ) -> CycleWithProfiles {
        let cycle = Cycle {
            id: Uuid::new_v4(),
            user_id: owner.id,
            responsible: owner.username.clone(),
            status: CycleStatus::Active,
            created_at,
        };
        let profile = |kind: ProfileKind, [deposits, withdrawals, daily_redemption]: Counters| Profile {
            id: Uuid::new_v4(),
            cycle_id: cycle.id,
            kind,
            fictitious_name: format!("{} {}", owner.username, kind.as_str()),
            credential: "0000000000".to_string(),
            national_id: None,
            phone: None,
            proxy: None,
            secondary_proxy: None,
            deposits,
            withdrawals,
            daily_redemption,
        };
        let entry = CycleWithProfiles {
            parent: profile(ProfileKind::Parent, parent),
            child: profile(ProfileKind::Child, child),
            cycle,
        };
        self.lock().cycles.push(entry.clone());
        entry
    }

    pub fn find_user_by_username(&self, username: &str) -> Option<User> {
        self.lock().users.iter().find(|u| u.username == username).cloned()
    }

    /// Makes every query fail with a data-access error while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Sessions currently held by callers.
    pub fn open_sessions(&self) -> usize {
        self.lock().open_sessions
    }

    /// Sessions handed out since creation.
    pub fn sessions_opened(&self) -> usize {
        self.lock().sessions_opened
    }
}

#[async_trait]
impl SessionProvider for MemoryStore {
    async fn open_session(&self) -> Result<Box<dyn CycleSource>, AnalyticsError> {
        {
            let mut inner = self.lock();
            inner.open_sessions += 1;
            inner.sessions_opened += 1;
        }
        Ok(Box::new(MemorySession { store: self.clone() }))
    }
}

struct MemorySession {
    store: MemoryStore,
}

impl MemorySession {
    fn inner(&self) -> Result<MutexGuard<'_, Inner>, AnalyticsError> {
        let inner = self.store.lock();
        if inner.unavailable {
            return Err(AnalyticsError::DataAccess("store is unavailable".to_string()));
        }
        Ok(inner)
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        let mut inner = self.store.lock();
        inner.open_sessions = inner.open_sessions.saturating_sub(1);
    }
}

#[async_trait]
impl CycleSource for MemorySession {
    async fn user(&mut self, id: Uuid) -> Result<Option<User>, AnalyticsError> {
        Ok(self.inner()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn users(&mut self) -> Result<Vec<User>, AnalyticsError> {
        Ok(self.inner()?.users.clone())
    }

    async fn cycles_in_window(
        &mut self,
        user_id: Uuid,
        window: &Window,
    ) -> Result<Vec<CycleWithProfiles>, AnalyticsError> {
        Ok(self
            .inner()?
            .cycles
            .iter()
            .filter(|c| c.cycle.user_id == user_id && window.contains(c.cycle.created_at))
            .cloned()
            .collect())
    }
}
