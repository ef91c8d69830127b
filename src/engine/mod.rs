mod driver_api;
mod driver_location_api;
mod driver_search_api;
mod helpers;
mod order_api;
mod review_api;
mod user_api;
mod vehicle_type_api;
mod wallet_api;

use sqlx::{Executor, Pool, Postgres};

use crate::{api::API, error::Error};

type Database = Postgres;

pub struct Engine {
    pool: Pool<Database>,
}

impl Engine {
    #[tracing::instrument(name = "Engine::new", skip_all)]
    pub async fn new(pool: Pool<Database>) -> Result<Self, Error> {
        // TODO: move this to migrations
        pool.execute(
            "CREATE TABLE IF NOT EXISTS users (id UUID PRIMARY KEY, email VARCHAR NOT NULL UNIQUE, data JSONB NOT NULL)",
        )
        .await?;

        pool.execute(
            "CREATE TABLE IF NOT EXISTS vehicle_types (id UUID PRIMARY KEY, name VARCHAR NOT NULL UNIQUE, data JSONB NOT NULL)",
        )
        .await?;

        pool.execute(
            "CREATE TABLE IF NOT EXISTS drivers (id UUID PRIMARY KEY, user_id UUID NOT NULL UNIQUE, status VARCHAR NOT NULL, approved BOOLEAN NOT NULL, blocked BOOLEAN NOT NULL, data JSONB NOT NULL)",
        )
        .await?;

        pool.execute(
            "CREATE TABLE IF NOT EXISTS driver_locations (driver_id UUID PRIMARY KEY, latitude DOUBLE PRECISION NOT NULL, longitude DOUBLE PRECISION NOT NULL, updated_at TIMESTAMPTZ NOT NULL)",
        )
        .await?;

        pool.execute(
            "CREATE TABLE IF NOT EXISTS orders (id UUID PRIMARY KEY, status VARCHAR NOT NULL, created_at TIMESTAMPTZ NOT NULL, data JSONB NOT NULL)",
        )
        .await?;

        pool.execute("CREATE INDEX IF NOT EXISTS orders_status_idx ON orders (status)")
            .await?;

        pool.execute(
            "CREATE TABLE IF NOT EXISTS wallets (id UUID PRIMARY KEY, user_id UUID NOT NULL UNIQUE, data JSONB NOT NULL)",
        )
        .await?;

        pool.execute(
            "CREATE TABLE IF NOT EXISTS wallet_transactions (id UUID PRIMARY KEY, wallet_id UUID NOT NULL, created_at TIMESTAMPTZ NOT NULL, data JSONB NOT NULL)",
        )
        .await?;

        pool.execute(
            "CREATE INDEX IF NOT EXISTS wallet_transactions_wallet_idx ON wallet_transactions (wallet_id)",
        )
        .await?;

        pool.execute(
            "CREATE TABLE IF NOT EXISTS reviews (id UUID PRIMARY KEY, order_id UUID NOT NULL UNIQUE, data JSONB NOT NULL)",
        )
        .await?;

        Ok(Self { pool })
    }
}

impl API for Engine {}
