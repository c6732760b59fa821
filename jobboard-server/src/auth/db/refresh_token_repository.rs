/// Refresh token ledger queries for PostgreSQL

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use database_layer::DatabaseResult;
use ipnetwork::IpNetwork;
use uuid::Uuid;

use super::postgres::PgAuthTransaction;
use super::{NewRefreshToken, RefreshTokenLedger, RefreshTokenRecord, RowLock};

const TOKEN_COLUMNS: &str =
    "id, user_id, token_hash, user_agent, ip, created_at, expires_at, revoked_at";

#[derive(sqlx::FromRow)]
struct RefreshTokenRow {
    id: Uuid,
    user_id: Uuid,
    token_hash: String,
    user_agent: Option<String>,
    ip: Option<IpNetwork>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
}

impl From<RefreshTokenRow> for RefreshTokenRecord {
    fn from(row: RefreshTokenRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            token_hash: row.token_hash,
            user_agent: row.user_agent,
            ip: row.ip.map(|network| network.ip()),
            created_at: row.created_at,
            expires_at: row.expires_at,
            revoked_at: row.revoked_at,
        }
    }
}

#[async_trait]
impl RefreshTokenLedger for PgAuthTransaction {
    async fn insert_token(&mut self, token: NewRefreshToken) -> DatabaseResult<RefreshTokenRecord> {
        let sql = format!(
            "INSERT INTO refresh_tokens (id, user_id, token_hash, user_agent, ip, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {TOKEN_COLUMNS}"
        );
        let row = sqlx::query_as::<_, RefreshTokenRow>(&sql)
            .bind(token.id)
            .bind(token.user_id)
            .bind(&token.token_hash)
            .bind(token.user_agent.as_deref())
            .bind(token.ip.map(IpNetwork::from))
            .bind(token.expires_at)
            .fetch_one(&mut *self.tx)
            .await?;

        Ok(row.into())
    }

    async fn find_token(
        &mut self,
        jti: Uuid,
        lock: RowLock,
    ) -> DatabaseResult<Option<RefreshTokenRecord>> {
        let sql = format!(
            "SELECT {TOKEN_COLUMNS} FROM refresh_tokens WHERE id = $1{}",
            lock.sql_suffix()
        );
        let row = sqlx::query_as::<_, RefreshTokenRow>(&sql)
            .bind(jti)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(row.map(Into::into))
    }

    async fn revoke_token(&mut self, jti: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = NOW() WHERE id = $1 AND revoked_at IS NULL",
        )
        .bind(jti)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn revoke_all_for_user(&mut self, user_id: Uuid) -> DatabaseResult<u64> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = NOW() \
             WHERE user_id = $1 AND revoked_at IS NULL",
        )
        .bind(user_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected())
    }

    async fn count_active_for_user(&mut self, user_id: Uuid) -> DatabaseResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM refresh_tokens \
             WHERE user_id = $1 AND revoked_at IS NULL AND expires_at > NOW()",
        )
        .bind(user_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(u64::try_from(count).unwrap_or(0))
    }
}
