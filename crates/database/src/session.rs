use crate::error::DbError;
use crate::queries;
use crate::repository::DbRepository;
use analytics::{AnalyticsError, CycleSource, SessionProvider};
use async_trait::async_trait;
use core_types::{CycleWithProfiles, User, Window};
use sqlx::Postgres;
use sqlx::pool::PoolConnection;
use uuid::Uuid;

/// A reporting session bound to one pooled connection.
///
/// The connection goes back to the pool when the session is dropped, whether
/// the run finished or failed half way.
pub struct ReportSession {
    conn: PoolConnection<Postgres>,
}

#[async_trait]
impl CycleSource for ReportSession {
    async fn user(&mut self, id: Uuid) -> Result<Option<User>, AnalyticsError> {
        Ok(queries::user_by_id(&mut self.conn, id).await?)
    }

    async fn users(&mut self) -> Result<Vec<User>, AnalyticsError> {
        Ok(queries::all_users(&mut self.conn).await?)
    }

    async fn cycles_in_window(
        &mut self,
        user_id: Uuid,
        window: &Window,
    ) -> Result<Vec<CycleWithProfiles>, AnalyticsError> {
        Ok(queries::cycles_in_window(&mut self.conn, user_id, window).await?)
    }
}

#[async_trait]
impl SessionProvider for DbRepository {
    async fn open_session(&self) -> Result<Box<dyn CycleSource>, AnalyticsError> {
        let conn = self.pool().acquire().await.map_err(DbError::from)?;
        Ok(Box::new(ReportSession { conn }))
    }
}
