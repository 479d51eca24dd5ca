use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::Row;
use tracing::instrument;

use tillpoint_auth::{Role, User, UserStatus};
use tillpoint_core::{DomainError, StoreId, UserId};

use super::{corrupt, decode_err, map_sqlx_error, PgStore};
use crate::error::{RepoError, RepoResult};
use crate::repository::UserRepository;

const COLUMNS: &str =
    "id, email, display_name, password_hash, role, stores, status, created_at, updated_at";

fn user_from_row(row: &PgRow) -> RepoResult<User> {
    let decode = decode_err("user_from_row");
    let status: String = row.try_get("status").map_err(&decode)?;
    let stores: Vec<uuid::Uuid> = row.try_get("stores").map_err(&decode)?;
    Ok(User {
        id: row.try_get::<uuid::Uuid, _>("id").map_err(&decode)?.into(),
        email: row.try_get("email").map_err(&decode)?,
        display_name: row.try_get("display_name").map_err(&decode)?,
        password_hash: row.try_get("password_hash").map_err(&decode)?,
        role: Role::new(row.try_get::<String, _>("role").map_err(&decode)?),
        stores: stores.into_iter().map(StoreId::from_uuid).collect(),
        status: UserStatus::parse(&status).map_err(corrupt)?,
        created_at: row.try_get("created_at").map_err(&decode)?,
        updated_at: row.try_get("updated_at").map_err(&decode)?,
    })
}

fn store_uuids(user: &User) -> Vec<uuid::Uuid> {
    user.stores.iter().map(|s| *s.as_uuid()).collect()
}

fn email_conflict(user: &User) -> impl Fn(sqlx::Error) -> RepoError + '_ {
    move |e| match super::map_sqlx_error("save_user", e) {
        RepoError::Conflict(_) => {
            RepoError::Conflict(format!("email {} is already registered", user.email))
        }
        other => other,
    }
}

#[async_trait]
impl UserRepository for PgStore {
    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn insert(&self, user: &User) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users
                (id, email, display_name, password_hash, role, stores, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(*user.id.as_uuid())
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(store_uuids(user))
        .bind(user.status.as_str())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(self.pool())
        .await
        .map_err(email_conflict(user))?;
        Ok(())
    }

    async fn get(&self, id: UserId) -> RepoResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
            .bind(*id.as_uuid())
            .fetch_optional(self.pool())
            .await
            .map_err(|e| map_sqlx_error("get_user", e))?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| map_sqlx_error("find_user_by_email", e))?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn list(&self) -> RepoResult<Vec<User>> {
        let rows = sqlx::query(&format!("SELECT {COLUMNS} FROM users ORDER BY email"))
            .fetch_all(self.pool())
            .await
            .map_err(|e| map_sqlx_error("list_users", e))?;
        rows.iter().map(user_from_row).collect()
    }

    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn update(&self, user: &User) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET email = $2, display_name = $3, password_hash = $4, role = $5,
                stores = $6, status = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(*user.id.as_uuid())
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(store_uuids(user))
        .bind(user.status.as_str())
        .bind(user.updated_at)
        .execute(self.pool())
        .await
        .map_err(email_conflict(user))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("user {}", user.id)).into());
        }
        Ok(())
    }

    async fn count(&self) -> RepoResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool())
            .await
            .map_err(|e| map_sqlx_error("count_users", e))?;
        Ok(count.max(0) as u64)
    }
}
