use axum::extract::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::DynAPI;
use crate::auth::Caller;
use crate::entities::Review;
use crate::error::Error;

#[derive(Serialize, Deserialize)]
pub struct CreateParams {
    order_id: Uuid,
    rating: i32,
    comment: Option<String>,
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    Extension(caller): Extension<Caller>,
    Json(params): Json<CreateParams>,
) -> Result<Json<Review>, Error> {
    let review = api
        .create_review(caller, params.order_id, params.rating, params.comment)
        .await?;

    Ok(review.into())
}
