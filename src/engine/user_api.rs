use super::helpers::fetch_user;
use super::Engine;

use async_trait::async_trait;
use sqlx::{types::Json, Executor};
use uuid::Uuid;

use crate::{
    api::UserAPI,
    auth::Caller,
    entities::{Role, User},
    error::Error,
};

#[async_trait]
impl UserAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn create_user(
        &self,
        caller: Caller,
        email: String,
        name: String,
        phone: Option<String>,
        role: Role,
    ) -> Result<User, Error> {
        let user = User::new(email, name, phone, role);

        let mut conn = self.pool.acquire().await?;

        let result = conn
            .execute(
                sqlx::query(
                    "INSERT INTO users (id, email, data) VALUES ($1, $2, $3) ON CONFLICT (email) DO NOTHING",
                )
                .bind(&user.id)
                .bind(&user.email)
                .bind(Json(&user)),
            )
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::AlreadyExists("user"));
        }

        Ok(user)
    }

    #[tracing::instrument(skip(self))]
    async fn find_user(&self, caller: Caller, id: Uuid) -> Result<User, Error> {
        let mut conn = self.pool.acquire().await?;

        fetch_user(&mut *conn, &id).await
    }
}
