use crate::enums::{CycleStatus, ProfileKind, Role};
use crate::error::CoreError;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An operator account. Users own cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A tracked unit of financial activity owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cycle {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Copy of the owner's username at creation time.
    pub responsible: String,
    pub status: CycleStatus,
    pub created_at: DateTime<Utc>,
}

/// One of the two roles inside a cycle, carrying identity metadata and the
/// three running monetary totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub cycle_id: Uuid,
    pub kind: ProfileKind,
    pub fictitious_name: String,
    pub credential: String,
    pub national_id: Option<String>,
    pub phone: Option<String>,
    pub proxy: Option<String>,
    pub secondary_proxy: Option<String>,
    pub deposits: Decimal,
    pub withdrawals: Decimal,
    pub daily_redemption: Decimal,
}

impl Profile {
    /// withdrawals + daily redemption - deposits
    pub fn profit(&self) -> Decimal {
        self.withdrawals + self.daily_redemption - self.deposits
    }

    /// Applies a partial update.
    ///
    /// Counters are running totals: a new value must be non-negative and not
    /// below the current one. Validation happens before any field is touched, so
    /// a rejected update leaves the profile unchanged.
    pub fn apply(&mut self, update: ProfileUpdate) -> Result<(), CoreError> {
        let deposits = checked_total("deposits", self.deposits, update.deposits)?;
        let withdrawals = checked_total("withdrawals", self.withdrawals, update.withdrawals)?;
        let daily_redemption =
            checked_total("daily_redemption", self.daily_redemption, update.daily_redemption)?;

        if let Some(national_id) = update.national_id {
            self.national_id = Some(national_id);
        }
        if let Some(phone) = update.phone {
            self.phone = Some(phone);
        }
        if let Some(proxy) = update.proxy {
            self.proxy = Some(proxy);
        }
        if let Some(secondary_proxy) = update.secondary_proxy {
            self.secondary_proxy = Some(secondary_proxy);
        }
        self.deposits = deposits;
        self.withdrawals = withdrawals;
        self.daily_redemption = daily_redemption;
        Ok(())
    }
}

fn checked_total(
    field: &'static str,
    current: Decimal,
    requested: Option<Decimal>,
) -> Result<Decimal, CoreError> {
    let Some(value) = requested else {
        return Ok(current);
    };
    if value < Decimal::ZERO {
        return Err(CoreError::NegativeCounter(field, value));
    }
    if value < current {
        return Err(CoreError::CounterDecrease {
            field,
            current,
            attempted: value,
        });
    }
    Ok(value)
}

/// A partial profile update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub national_id: Option<String>,
    pub phone: Option<String>,
    pub proxy: Option<String>,
    pub secondary_proxy: Option<String>,
    pub deposits: Option<Decimal>,
    pub withdrawals: Option<Decimal>,
    pub daily_redemption: Option<Decimal>,
}

/// A cycle together with its two profiles.
///
/// Holding the profiles as named fields makes "exactly one parent and one
/// child" a property of the type rather than something callers must check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleWithProfiles {
    pub cycle: Cycle,
    pub parent: Profile,
    pub child: Profile,
}

impl CycleWithProfiles {
    pub fn profiles(&self) -> [&Profile; 2] {
        [&self.parent, &self.child]
    }

    /// Sum of both profiles' profit.
    pub fn profit(&self) -> Decimal {
        self.profiles().iter().map(|p| p.profit()).sum()
    }
}

/// Which users a reporting run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    /// One explicitly requested user. A row is produced even with no cycles.
    Single(Uuid),
    /// Every known user. Users without in-window cycles are left out.
    All,
}

/// A half-open time range `[start, end)` applied to cycle creation times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub const DEFAULT_DAYS: i64 = 7;

    /// The trailing `days` up to `now`.
    pub fn trailing_days(now: DateTime<Utc>, days: i64) -> Self {
        Self {
            start: now - Duration::days(days),
            end: now,
        }
    }

    /// The default weekly reporting window.
    pub fn last_week(now: DateTime<Utc>) -> Self {
        Self::trailing_days(now, Self::DEFAULT_DAYS)
    }

    /// Everything recorded before `now`.
    pub fn all_time(now: DateTime<Utc>) -> Self {
        Self {
            start: DateTime::<Utc>::UNIX_EPOCH,
            end: now,
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }
}

/// One line of a report: the aggregate for a single user over a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub display_name: String,
    pub cycles: usize,
    pub profit: Decimal,
    pub breakdown: String,
}

/// A user's position in the profit ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub name: String,
    pub profit: Decimal,
}
