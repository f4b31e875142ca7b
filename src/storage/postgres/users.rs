use crate::{
    errors::AppError,
    storage::{
        models::{NewUser, StoredUser},
        traits::UserStore,
    },
};
use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Row, postgres::PgRow};

pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> Result<StoredUser, sqlx::Error> {
    Ok(StoredUser {
        uid: row.try_get("uid")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        is_superuser: row.try_get("is_superuser")?,
        groups: row.try_get("groups")?,
        created_at: row.try_get("created_at")?,
    })
}

pub(crate) async fn insert_user(
    conn: &mut PgConnection,
    user: &NewUser,
) -> Result<StoredUser, AppError> {
    let row = sqlx::query(
        r#"
        INSERT INTO users (uid, username, email, password_hash, is_superuser, groups)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING uid, username, email, password_hash, is_superuser, groups, created_at
        "#,
    )
    .bind(&user.uid)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.is_superuser)
    .bind(&user.groups)
    .fetch_one(conn)
    .await
    .map_err(|e| AppError::from_sqlx(e, "Username already taken"))?;

    Ok(user_from_row(&row)?)
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn get_user_by_uid(&self, uid: &str) -> Result<Option<StoredUser>, AppError> {
        let row = sqlx::query(
            r#"
            SELECT uid, username, email, password_hash, is_superuser, groups, created_at
            FROM users
            WHERE uid = $1
            "#,
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn get_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<StoredUser>, AppError> {
        let row = sqlx::query(
            r#"
            SELECT uid, username, email, password_hash, is_superuser, groups, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn create_user(&self, user: &NewUser) -> Result<StoredUser, AppError> {
        let mut conn = self.pool.acquire().await?;
        insert_user(&mut conn, user).await
    }

    async fn reset_superuser(
        &self,
        uid: &str,
        password_hash: &str,
        email: Option<&str>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, is_superuser = TRUE, email = COALESCE($3, email)
            WHERE uid = $1
            "#,
        )
        .bind(uid)
        .bind(password_hash)
        .bind(email)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<StoredUser>, AppError> {
        let rows = sqlx::query(
            r#"
            SELECT uid, username, email, password_hash, is_superuser, groups, created_at
            FROM users
            ORDER BY username
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(user_from_row).collect::<Result<Vec<_>, _>>()?)
    }
}
