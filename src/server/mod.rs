mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, patch, post, put},
    Router,
};

use crate::server::handlers::{drivers, orders, reviews, users, vehicle_types, wallets};
use crate::{
    api::{DynAPI, API},
    auth::Caller,
};

pub async fn serve<T: API + Sync + Send + 'static>(api: T) {
    tracing_subscriber::fmt::init();

    let api = Arc::new(api) as DynAPI;

    let app = Router::new()
        .route("/users", post(users::create))
        .route("/users/:id", get(users::find))
        .route(
            "/vehicle_types",
            post(vehicle_types::create).get(vehicle_types::list),
        )
        .route(
            "/vehicle_types/:id",
            get(vehicle_types::find).patch(vehicle_types::update_pricing),
        )
        .route("/orders", post(orders::create))
        .route("/orders/pending", get(orders::list_pending))
        .route("/orders/:id", get(orders::find))
        .route("/orders/:id/cancel", post(orders::cancel))
        .route("/orders/:id/accept", put(orders::accept))
        .route("/orders/:id/status", patch(orders::update_status))
        .route("/drivers", post(drivers::create))
        .route("/drivers/nearby", get(drivers::find_nearby))
        .route("/drivers/availability", patch(drivers::update_availability))
        .route("/drivers/location", patch(drivers::update_location))
        .route("/drivers/:id", get(drivers::find))
        .route("/drivers/:id/approve", patch(drivers::approve))
        .route("/drivers/:id/block", patch(drivers::update_block))
        .route("/wallet/balance", get(wallets::balance))
        .route("/wallet/top-up", post(wallets::top_up))
        .route("/wallet/transfer", post(wallets::transfer))
        .route("/wallet/transactions", get(wallets::transactions))
        .route("/reviews", post(reviews::create))
        .layer(Extension(api))
        .layer(Extension(Caller::system()));

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));

    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .unwrap();
}
