use crate::DbError;
use crate::queries::{self, CYCLE_COLUMNS, PROFILE_COLUMNS, USER_COLUMNS};
use crate::rows::{DbCycle, DbProfile, DbUser, assemble};
use core_types::generate;
use core_types::{CycleStatus, CycleWithProfiles, Profile, ProfileKind, ProfileUpdate, Role, User};
use sqlx::postgres::PgPool;
use uuid::Uuid;

/// The `DbRepository` provides a high-level, application-specific interface
/// to the database. It encapsulates all SQL queries and data access logic.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the super-admin account if it does not exist yet.
    ///
    /// Returns `true` when the account was created by this call. Credentials
    /// are provisioned by the authentication gateway, not here.
    pub async fn ensure_admin(&self, username: &str) -> Result<bool, DbError> {
        let result = sqlx::query(
            "INSERT INTO users (id, username, role, is_active) VALUES ($1, $2, $3, TRUE) ON CONFLICT (username) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(Role::Admin.as_str())
        .execute(&self.pool)
        .await?;

        let created = result.rows_affected() == 1;
        if created {
            tracing::info!(username, "Created super-admin account.");
        } else {
            tracing::info!(username, "Super-admin account already exists.");
        }
        Ok(created)
    }

    /// Registers a new active user.
    pub async fn create_user(&self, username: &str, role: Role) -> Result<User, DbError> {
        let row = sqlx::query_as::<_, DbUser>(&format!(
            "INSERT INTO users (id, username, role, is_active) VALUES ($1, $2, $3, TRUE) RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db_err) if db_err.is_unique_violation() => DbError::AlreadyExists(username.to_string()),
            _ => e.into(),
        })?;

        User::try_from(row)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Option<User>, DbError> {
        let mut conn = self.pool.acquire().await?;
        queries::user_by_id(&mut conn, id).await
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DbError> {
        let mut conn = self.pool.acquire().await?;
        queries::user_by_username(&mut conn, username).await
    }

    /// Creates a cycle for `owner` together with its parent and child profiles.
    ///
    /// All three rows are written in one transaction, so a cycle is never
    /// visible without both profiles.
    pub async fn create_cycle(&self, owner: &User) -> Result<CycleWithProfiles, DbError> {
        // ThreadRng is not Send, so it must not live across an await point.
        let seeds = {
            let mut rng = rand::thread_rng();
            [ProfileKind::Parent, ProfileKind::Child].map(|kind| {
                (kind, generate::fictitious_name(&mut rng), generate::credential(&mut rng))
            })
        };

        let mut tx = self.pool.begin().await?;

        let cycle = sqlx::query_as::<_, DbCycle>(&format!(
            "INSERT INTO cycles (id, user_id, responsible, status, created_at) VALUES ($1, $2, $3, $4, NOW()) RETURNING {CYCLE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(owner.id)
        .bind(&owner.username)
        .bind(CycleStatus::Active.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let mut profiles = Vec::with_capacity(seeds.len());
        for (kind, name, credential) in seeds {
            let profile = sqlx::query_as::<_, DbProfile>(&format!(
                "INSERT INTO profiles (id, cycle_id, kind, fictitious_name, credential) VALUES ($1, $2, $3, $4, $5) RETURNING {PROFILE_COLUMNS}"
            ))
            .bind(Uuid::new_v4())
            .bind(cycle.id)
            .bind(kind.as_str())
            .bind(name)
            .bind(credential)
            .fetch_one(&mut *tx)
            .await?;
            profiles.push(profile);
        }

        tx.commit().await?;
        tracing::info!(cycle_id = %cycle.id, owner = %owner.username, "Cycle created.");

        assemble(vec![cycle], profiles)?.pop().ok_or(DbError::NotFound)
    }

    /// Lists the owner's cycles, newest first.
    pub async fn list_cycles(
        &self,
        owner_id: Uuid,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<CycleWithProfiles>, DbError> {
        let mut conn = self.pool.acquire().await?;
        queries::cycles_page(&mut conn, owner_id, skip, limit).await
    }

    /// Applies a partial update to one of the owner's profiles.
    ///
    /// Profiles of other users' cycles are rejected with `Forbidden`. Counter
    /// validation is delegated to `Profile::apply`; a rejected update rolls back.
    pub async fn update_profile(
        &self,
        owner_id: Uuid,
        profile_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Profile, DbError> {
        let mut tx = self.pool.begin().await?;

        let row = queries::owned_profile_for_update(&mut tx, owner_id, profile_id)
            .await?
            .ok_or(DbError::Forbidden)?;
        let mut profile = Profile::try_from(row)?;
        profile.apply(update)?;

        sqlx::query(
            r#"
            UPDATE profiles
            SET national_id = $2, phone = $3, proxy = $4, secondary_proxy = $5,
                deposits = $6, withdrawals = $7, daily_redemption = $8
            WHERE id = $1
            "#,
        )
        .bind(profile.id)
        .bind(&profile.national_id)
        .bind(&profile.phone)
        .bind(&profile.proxy)
        .bind(&profile.secondary_proxy)
        .bind(profile.deposits)
        .bind(profile.withdrawals)
        .bind(profile.daily_redemption)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(profile)
    }
}
