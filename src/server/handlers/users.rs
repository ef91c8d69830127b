use axum::extract::{Extension, Json, Path};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::DynAPI;
use crate::auth::Caller;
use crate::entities::{Role, User};
use crate::error::Error;

#[derive(Serialize, Deserialize)]
pub struct CreateParams {
    email: String,
    name: String,
    phone: Option<String>,
    role: Role,
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    Extension(caller): Extension<Caller>,
    Json(params): Json<CreateParams>,
) -> Result<Json<User>, Error> {
    let user = api
        .create_user(caller, params.email, params.name, params.phone, params.role)
        .await?;

    Ok(user.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, Error> {
    let user = api.find_user(caller, id).await?;

    Ok(user.into())
}
