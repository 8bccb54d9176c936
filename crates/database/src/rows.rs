use crate::error::DbError;
use chrono::{DateTime, Utc};
use core_types::{Cycle, CycleWithProfiles, Profile, ProfileKind, User};
use rust_decimal::Decimal;
use sqlx::FromRow;
use std::collections::HashMap;
use uuid::Uuid;

/// Represents a row from the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct DbUser {
    pub id: Uuid,
    pub username: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Represents a row from the `cycles` table.
#[derive(Debug, Clone, FromRow)]
pub struct DbCycle {
    pub id: Uuid,
    pub user_id: Uuid,
    pub responsible: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Represents a row from the `profiles` table.
///
/// Counters are read as nullable so rows written by older tooling without
/// defaults still load; a missing counter counts as zero.
#[derive(Debug, Clone, FromRow)]
pub struct DbProfile {
    pub id: Uuid,
    pub cycle_id: Uuid,
    pub kind: String,
    pub fictitious_name: String,
    pub credential: String,
    pub national_id: Option<String>,
    pub phone: Option<String>,
    pub proxy: Option<String>,
    pub secondary_proxy: Option<String>,
    pub deposits: Option<Decimal>,
    pub withdrawals: Option<Decimal>,
    pub daily_redemption: Option<Decimal>,
}

impl TryFrom<DbUser> for User {
    type Error = DbError;

    fn try_from(row: DbUser) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            username: row.username,
            role: row.role.parse().map_err(invalid)?,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<DbCycle> for Cycle {
    type Error = DbError;

    fn try_from(row: DbCycle) -> Result<Self, Self::Error> {
        Ok(Cycle {
            id: row.id,
            user_id: row.user_id,
            responsible: row.responsible,
            status: row.status.parse().map_err(invalid)?,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<DbProfile> for Profile {
    type Error = DbError;

    fn try_from(row: DbProfile) -> Result<Self, Self::Error> {
        Ok(Profile {
            id: row.id,
            cycle_id: row.cycle_id,
            kind: row.kind.parse().map_err(invalid)?,
            fictitious_name: row.fictitious_name,
            credential: row.credential,
            national_id: row.national_id,
            phone: row.phone,
            proxy: row.proxy,
            secondary_proxy: row.secondary_proxy,
            deposits: row.deposits.unwrap_or(Decimal::ZERO),
            withdrawals: row.withdrawals.unwrap_or(Decimal::ZERO),
            daily_redemption: row.daily_redemption.unwrap_or(Decimal::ZERO),
        })
    }
}

fn invalid(err: core_types::CoreError) -> DbError {
    DbError::InvalidData(err.to_string())
}

/// Pairs each cycle with its parent and child profile, keeping the cycle order.
///
/// A cycle lacking either profile is reported as inconsistent data rather
/// than silently dropped.
pub fn assemble(cycles: Vec<DbCycle>, profiles: Vec<DbProfile>) -> Result<Vec<CycleWithProfiles>, DbError> {
    let mut by_cycle: HashMap<Uuid, (Option<Profile>, Option<Profile>)> = HashMap::new();
    for row in profiles {
        let profile = Profile::try_from(row)?;
        let slot = by_cycle.entry(profile.cycle_id).or_default();
        match profile.kind {
            ProfileKind::Parent => slot.0 = Some(profile),
            ProfileKind::Child => slot.1 = Some(profile),
        }
    }

    cycles
        .into_iter()
        .map(|row| {
            let cycle = Cycle::try_from(row)?;
            let (parent, child) = by_cycle.remove(&cycle.id).unwrap_or_default();
            let parent = parent.ok_or_else(|| {
                DbError::InvalidData(format!("cycle {} has no parent profile", cycle.id))
            })?;
            let child = child.ok_or_else(|| {
                DbError::InvalidData(format!("cycle {} has no child profile", cycle.id))
            })?;
            Ok(CycleWithProfiles { cycle, parent, child })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn cycle_row(id: Uuid) -> DbCycle {
        DbCycle {
            id,
            user_id: Uuid::nil(),
            responsible: "ana".to_string(),
            status: "active".to_string(),
            created_at: Utc::now(),
        }
    }

    fn profile_row(cycle_id: Uuid, kind: &str, deposits: Option<Decimal>) -> DbProfile {
        DbProfile {
            id: Uuid::new_v4(),
            cycle_id,
            kind: kind.to_string(),
            fictitious_name: "Ana Lima".to_string(),
            credential: "a1b2c3d4e5".to_string(),
            national_id: None,
            phone: None,
            proxy: None,
            secondary_proxy: None,
            deposits,
            withdrawals: Some(dec!(3)),
            daily_redemption: None,
        }
    }

    #[test]
    fn assemble_pairs_profiles_and_keeps_cycle_order() {
        let (first, second) = (Uuid::new_v4(), Uuid::new_v4());
        let cycles = vec![cycle_row(first), cycle_row(second)];
        let profiles = vec![
            profile_row(second, "child", Some(dec!(1))),
            profile_row(first, "parent", Some(dec!(10))),
            profile_row(second, "parent", Some(dec!(2))),
            profile_row(first, "child", None),
        ];

        let assembled = assemble(cycles, profiles).unwrap();

        assert_eq!(assembled.len(), 2);
        assert_eq!(assembled[0].cycle.id, first);
        assert_eq!(assembled[0].parent.deposits, dec!(10));
        assert_eq!(assembled[0].child.deposits, Decimal::ZERO);
        assert_eq!(assembled[0].child.daily_redemption, Decimal::ZERO);
        assert_eq!(assembled[1].cycle.id, second);
        assert_eq!(assembled[1].child.deposits, dec!(1));
    }

    #[test]
    fn assemble_rejects_a_cycle_missing_a_profile() {
        let id = Uuid::new_v4();
        let result = assemble(vec![cycle_row(id)], vec![profile_row(id, "parent", None)]);
        assert!(matches!(result, Err(DbError::InvalidData(msg)) if msg.contains("child")));
    }

    #[test]
    fn unknown_role_is_invalid_data() {
        let row = DbUser {
            id: Uuid::new_v4(),
            username: "ana".to_string(),
            role: "superuser".to_string(),
            is_active: true,
            created_at: Utc::now(),
        };
        assert!(matches!(User::try_from(row), Err(DbError::InvalidData(_))));
    }
}
