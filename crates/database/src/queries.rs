//! Read queries shared by `DbRepository` and `ReportSession`. Each takes a
//! plain connection so callers decide whether it comes from the pool or a
//! transaction.

use crate::error::DbError;
use crate::rows::{DbCycle, DbProfile, DbUser, assemble};
use core_types::{CycleWithProfiles, User, Window};
use sqlx::PgConnection;
use uuid::Uuid;

pub(crate) const USER_COLUMNS: &str = "id, username, role, is_active, created_at";
pub(crate) const CYCLE_COLUMNS: &str = "id, user_id, responsible, status, created_at";
pub(crate) const PROFILE_COLUMNS: &str = "id, cycle_id, kind, fictitious_name, credential, national_id, phone, proxy, secondary_proxy, deposits, withdrawals, daily_redemption";

pub async fn user_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<User>, DbError> {
    let row = sqlx::query_as::<_, DbUser>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    row.map(User::try_from).transpose()
}

pub async fn user_by_username(conn: &mut PgConnection, username: &str) -> Result<Option<User>, DbError> {
    let row = sqlx::query_as::<_, DbUser>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
    ))
    .bind(username)
    .fetch_optional(&mut *conn)
    .await?;
    row.map(User::try_from).transpose()
}

/// Every user, ordered by username so report rows come out in a stable order.
pub async fn all_users(conn: &mut PgConnection) -> Result<Vec<User>, DbError> {
    let rows = sqlx::query_as::<_, DbUser>(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY username ASC"
    ))
    .fetch_all(&mut *conn)
    .await?;
    rows.into_iter().map(User::try_from).collect()
}

/// The user's cycles created in `[window.start, window.end)`, oldest first.
pub async fn cycles_in_window(
    conn: &mut PgConnection,
    user_id: Uuid,
    window: &Window,
) -> Result<Vec<CycleWithProfiles>, DbError> {
    let cycles = sqlx::query_as::<_, DbCycle>(&format!(
        "SELECT {CYCLE_COLUMNS} FROM cycles WHERE user_id = $1 AND created_at >= $2 AND created_at < $3 ORDER BY created_at ASC"
    ))
    .bind(user_id)
    .bind(window.start)
    .bind(window.end)
    .fetch_all(&mut *conn)
    .await?;
    with_profiles(conn, cycles).await
}

/// One page of the user's cycles, newest first.
pub async fn cycles_page(
    conn: &mut PgConnection,
    user_id: Uuid,
    skip: i64,
    limit: i64,
) -> Result<Vec<CycleWithProfiles>, DbError> {
    let cycles = sqlx::query_as::<_, DbCycle>(&format!(
        "SELECT {CYCLE_COLUMNS} FROM cycles WHERE user_id = $1 ORDER BY created_at DESC OFFSET $2 LIMIT $3"
    ))
    .bind(user_id)
    .bind(skip)
    .bind(limit)
    .fetch_all(&mut *conn)
    .await?;
    with_profiles(conn, cycles).await
}

async fn with_profiles(conn: &mut PgConnection, cycles: Vec<DbCycle>) -> Result<Vec<CycleWithProfiles>, DbError> {
    if cycles.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = cycles.iter().map(|c| c.id).collect();
    let profiles = sqlx::query_as::<_, DbProfile>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM profiles WHERE cycle_id = ANY($1)"
    ))
    .bind(ids)
    .fetch_all(&mut *conn)
    .await?;
    assemble(cycles, profiles)
}

/// Locks one profile for update, provided it belongs to one of `owner_id`'s cycles.
pub async fn owned_profile_for_update(
    conn: &mut PgConnection,
    owner_id: Uuid,
    profile_id: Uuid,
) -> Result<Option<DbProfile>, DbError> {
    let row = sqlx::query_as::<_, DbProfile>(
        r#"
        SELECT p.id, p.cycle_id, p.kind, p.fictitious_name, p.credential, p.national_id, p.phone,
               p.proxy, p.secondary_proxy, p.deposits, p.withdrawals, p.daily_redemption
        FROM profiles AS p
        JOIN cycles AS c ON p.cycle_id = c.id
        WHERE p.id = $1 AND c.user_id = $2
        FOR UPDATE OF p
        "#,
    )
    .bind(profile_id)
    .bind(owner_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row)
}
