use super::helpers::{fetch_driver_for_update, fetch_order_for_update, update_driver};
use super::Engine;

use async_trait::async_trait;
use sqlx::{types::Json, Acquire, Executor};
use uuid::Uuid;

use crate::{
    api::ReviewAPI,
    auth::Caller,
    entities::{OrderStatus, Review},
    error::Error,
};

#[async_trait]
impl ReviewAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn create_review(
        &self,
        caller: Caller,
        order_id: Uuid,
        rating: i32,
        comment: Option<String>,
    ) -> Result<Review, Error> {
        if !(1..=5).contains(&rating) {
            return Err(Error::InvalidRating);
        }

        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let order = fetch_order_for_update(&mut tx, &order_id).await?;

        if order.customer_id != caller.id {
            return Err(Error::forbidden("only the ordering customer may review"));
        }

        if order.status != OrderStatus::Completed {
            return Err(Error::invalid_state(order.status.name()));
        }

        let driver_id = order.driver_id.ok_or(Error::NotFound("driver"))?;

        let review = Review::new(order.id, driver_id, rating, comment);

        // the unique order_id constraint keeps reviews 1:1 with orders
        let result = tx
            .execute(
                sqlx::query(
                    "INSERT INTO reviews (id, order_id, data) VALUES ($1, $2, $3) ON CONFLICT (order_id) DO NOTHING",
                )
                .bind(&review.id)
                .bind(&review.order_id)
                .bind(Json(&review)),
            )
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::AlreadyExists("review"));
        }

        let mut driver = fetch_driver_for_update(&mut tx, &driver_id).await?;

        driver.rate(rating)?;

        update_driver(&mut tx, &driver).await?;

        tx.commit().await?;

        Ok(review)
    }
}
