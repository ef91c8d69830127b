use axum::extract::{Extension, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::DynAPI;
use crate::auth::Caller;
use crate::entities::{Wallet, WalletTransaction};
use crate::error::Error;

#[derive(Serialize, Deserialize)]
pub struct TopUpParams {
    amount: Decimal,
}

#[derive(Serialize, Deserialize)]
pub struct TransferParams {
    receiver_user_id: Uuid,
    amount: Decimal,
    description: Option<String>,
}

pub async fn balance(
    Extension(api): Extension<DynAPI>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Decimal>, Error> {
    let balance = api.balance(caller).await?;

    Ok(balance.into())
}

pub async fn top_up(
    Extension(api): Extension<DynAPI>,
    Extension(caller): Extension<Caller>,
    Json(params): Json<TopUpParams>,
) -> Result<Json<Wallet>, Error> {
    let wallet = api.top_up(caller, params.amount).await?;

    Ok(wallet.into())
}

pub async fn transfer(
    Extension(api): Extension<DynAPI>,
    Extension(caller): Extension<Caller>,
    Json(params): Json<TransferParams>,
) -> Result<Json<()>, Error> {
    api.transfer_funds(
        caller,
        params.receiver_user_id,
        params.amount,
        params.description,
    )
    .await?;

    Ok(().into())
}

pub async fn transactions(
    Extension(api): Extension<DynAPI>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<WalletTransaction>>, Error> {
    let history = api.wallet_history(caller).await?;

    Ok(history.into())
}
