/// Credential store queries for PostgreSQL

use async_trait::async_trait;
use auth_identity::{NewUser, ProfileUpdate, Role, User};
use chrono::{DateTime, Utc};
use database_layer::{DatabaseError, DatabaseResult};
use uuid::Uuid;

use super::postgres::PgAuthTransaction;
use super::{RowLock, UserRepository};

const USER_COLUMNS: &str = "id, name, email::text AS email, password_hash, role::text AS role, \
                            avatar_url, headline, location, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    avatar_url: Option<String>,
    headline: Option<String>,
    location: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = DatabaseError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: Role = row
            .role
            .parse()
            .map_err(|e: auth_identity::IdentityError| DatabaseError::QueryFailed(e.to_string()))?;

        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role,
            avatar_url: row.avatar_url,
            headline: row.headline,
            location: row.location,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_user(row: Option<UserRow>) -> DatabaseResult<Option<User>> {
    row.map(User::try_from).transpose()
}

#[async_trait]
impl UserRepository for PgAuthTransaction {
    async fn find_by_email(&mut self, email: &str, lock: RowLock) -> DatabaseResult<Option<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1{}",
            lock.sql_suffix()
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&mut *self.tx)
            .await?;
        into_user(row)
    }

    async fn find_by_id(&mut self, id: Uuid, lock: RowLock) -> DatabaseResult<Option<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1{}",
            lock.sql_suffix()
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        into_user(row)
    }

    async fn create(&mut self, new_user: NewUser) -> DatabaseResult<User> {
        let sql = format!(
            "INSERT INTO users (id, name, email, password_hash, role) \
             VALUES ($1, $2, $3, $4, $5::user_role) \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new_user.name)
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .bind(new_user.role.as_str())
            .fetch_one(&mut *self.tx)
            .await?;

        tracing::debug!(user_id = %row.id, role = %new_user.role, "User created");
        User::try_from(row)
    }

    async fn update_role(&mut self, id: Uuid, role: Role) -> DatabaseResult<Option<User>> {
        let sql = format!(
            "UPDATE users SET role = $2::user_role WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(role.as_str())
            .fetch_optional(&mut *self.tx)
            .await?;
        into_user(row)
    }

    async fn update_profile(
        &mut self,
        id: Uuid,
        update: &ProfileUpdate,
    ) -> DatabaseResult<Option<User>> {
        let sql = format!(
            "UPDATE users SET \
                name = COALESCE($2, name), \
                headline = COALESCE($3, headline), \
                location = COALESCE($4, location), \
                avatar_url = COALESCE($5, avatar_url), \
                password_hash = COALESCE($6, password_hash) \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(update.name.as_deref())
            .bind(update.headline.as_deref())
            .bind(update.location.as_deref())
            .bind(update.avatar_url.as_deref())
            .bind(update.password_hash.as_deref())
            .fetch_optional(&mut *self.tx)
            .await?;
        into_user(row)
    }
}
