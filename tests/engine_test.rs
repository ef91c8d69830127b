//! Engine tests against a live Postgres instance.
//!
//! Run with `TEST_DATABASE_URL=postgresql://... cargo test -- --ignored`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use vectura::api::{
    DriverAPI, DriverLocationAPI, DriverSearchAPI, OrderAPI, ReviewAPI, UserAPI, VehicleTypeAPI,
    WalletAPI,
};
use vectura::auth::Caller;
use vectura::db::PgPool;
use vectura::engine::Engine;
use vectura::entities::{
    Coordinates, Driver, Order, OrderStatus, Role, Stop, TransactionType, VehicleType,
};
use vectura::error::Error;

async fn engine() -> Engine {
    dotenv::dotenv().ok();

    let db_uri = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set to run the engine tests");

    let PgPool(pool) = PgPool::new(&db_uri, 5).await.unwrap();

    Engine::new(pool).await.unwrap()
}

/// A fresh center per test keeps geo assertions independent of drivers left
/// behind by other tests or earlier runs.
fn random_center() -> Coordinates {
    let x = Uuid::new_v4().as_u128();

    let latitude = ((x % 120_000) as f64) / 1000.0 - 60.0;
    let longitude = (((x >> 32) % 340_000) as f64) / 1000.0 - 170.0;

    Coordinates::new(latitude, longitude)
}

fn stop_at(coordinates: Coordinates, address: &str) -> Stop {
    Stop {
        address: address.into(),
        coordinates,
    }
}

async fn new_customer(engine: &Engine) -> Caller {
    let user = engine
        .create_user(
            Caller::system(),
            format!("customer-{}@example.test", Uuid::new_v4()),
            "Test Customer".into(),
            None,
            Role::Customer,
        )
        .await
        .unwrap();

    Caller::new(user.id, Role::Customer)
}

async fn new_vehicle_type(engine: &Engine) -> VehicleType {
    engine
        .create_vehicle_type(
            Caller::system(),
            format!("Car-{}", Uuid::new_v4()),
            dec!(100),
            dec!(150),
        )
        .await
        .unwrap()
}

async fn new_driver(
    engine: &Engine,
    vehicle_type: &VehicleType,
    location: Option<Coordinates>,
) -> (Caller, Driver) {
    let user = engine
        .create_user(
            Caller::system(),
            format!("driver-{}@example.test", Uuid::new_v4()),
            "Test Driver".into(),
            None,
            Role::Driver,
        )
        .await
        .unwrap();

    let caller = Caller::new(user.id, Role::Driver);

    let driver = engine
        .create_driver(
            caller,
            vehicle_type.id,
            format!("LIC-{}", Uuid::new_v4()),
            "CAB-1234".into(),
        )
        .await
        .unwrap();

    engine.approve_driver(Caller::system(), driver.id).await.unwrap();

    let driver = engine.set_driver_availability(caller, true).await.unwrap();

    if let Some(coordinates) = location {
        engine.update_driver_location(caller, coordinates).await.unwrap();
    }

    (caller, driver)
}

async fn pending_order(engine: &Engine, customer: Caller, center: Coordinates) -> Order {
    let vehicle_type = new_vehicle_type(engine).await;

    engine
        .create_order(
            customer,
            vehicle_type.id,
            stop_at(center, "pickup"),
            stop_at(center, "drop-off"),
            dec!(10),
        )
        .await
        .unwrap()
}

/// Drives an order through accept, arrival and transit, up to IN_TRANSIT.
async fn order_in_transit(
    engine: &Engine,
    customer: Caller,
    driver_caller: Caller,
    center: Coordinates,
) -> Order {
    let order = pending_order(engine, customer, center).await;

    engine.accept_order(driver_caller, order.id).await.unwrap();
    engine
        .update_order_status(driver_caller, order.id, OrderStatus::DriverArrived)
        .await
        .unwrap();
    engine
        .update_order_status(driver_caller, order.id, OrderStatus::InTransit)
        .await
        .unwrap()
}

async fn assert_reconciled(engine: &Engine, caller: Caller) {
    let balance = engine.balance(caller).await.unwrap();
    let history = engine.wallet_history(caller).await.unwrap();

    let net = history.iter().fold(Decimal::ZERO, |acc, row| match row.kind {
        TransactionType::Credit => acc + row.amount,
        TransactionType::Debit => acc - row.amount,
    });

    assert_eq!(net, balance);
}

#[tokio::test]
#[ignore = "requires a postgres database (set TEST_DATABASE_URL)"]
async fn order_lifecycle_settles_wallets() {
    let engine = engine().await;
    let center = random_center();

    let customer = new_customer(&engine).await;
    engine.top_up(customer, dec!(2000.00)).await.unwrap();

    let vehicle_type = new_vehicle_type(&engine).await;
    let (driver_caller, driver) = new_driver(&engine, &vehicle_type, Some(center)).await;

    let order = engine
        .create_order(
            customer,
            vehicle_type.id,
            stop_at(center, "pickup"),
            stop_at(center, "drop-off"),
            dec!(10),
        )
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.price, dec!(1600.00));

    let order = engine.accept_order(driver_caller, order.id).await.unwrap();

    assert_eq!(order.status, OrderStatus::Accepted);
    assert_eq!(order.driver_id, Some(driver.id));

    let locked = engine.find_driver(driver_caller, driver.id).await.unwrap();
    assert!(!locked.is_available());

    engine
        .update_order_status(driver_caller, order.id, OrderStatus::DriverArrived)
        .await
        .unwrap();
    engine
        .update_order_status(driver_caller, order.id, OrderStatus::InTransit)
        .await
        .unwrap();

    let order = engine
        .update_order_status(driver_caller, order.id, OrderStatus::Completed)
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Completed);
    assert!(order.completed_at.is_some());

    // 2000 - 1600 for the customer; 1600 - 160 commission for the driver
    assert_eq!(engine.balance(customer).await.unwrap(), dec!(400.00));
    assert_eq!(engine.balance(driver_caller).await.unwrap(), dec!(1440.00));

    let customer_history = engine.wallet_history(customer).await.unwrap();
    assert_eq!(customer_history.len(), 3);

    let driver_history = engine.wallet_history(driver_caller).await.unwrap();
    assert_eq!(driver_history.len(), 1);
    assert_eq!(driver_history[0].kind, TransactionType::Credit);
    assert_eq!(driver_history[0].amount, dec!(1440.00));

    assert_reconciled(&engine, customer).await;
    assert_reconciled(&engine, driver_caller).await;

    // settlement released the driver
    let freed = engine.find_driver(driver_caller, driver.id).await.unwrap();
    assert!(freed.is_available());
}

#[tokio::test]
#[ignore = "requires a postgres database (set TEST_DATABASE_URL)"]
async fn failed_settlement_leaves_order_in_transit() {
    let engine = engine().await;
    let center = random_center();

    let customer = new_customer(&engine).await;
    engine.top_up(customer, dec!(100.00)).await.unwrap();

    let vehicle_type = new_vehicle_type(&engine).await;
    let (driver_caller, driver) = new_driver(&engine, &vehicle_type, Some(center)).await;

    let order = order_in_transit(&engine, customer, driver_caller, center).await;

    let err = engine
        .update_order_status(driver_caller, order.id, OrderStatus::Completed)
        .await
        .unwrap_err();

    match err {
        Error::Payment(inner) => {
            assert!(
                matches!(*inner, Error::InsufficientFunds { balance } if balance == dec!(100.00))
            );
        }
        other => panic!("expected a payment error, got: {other}"),
    }

    // the whole transition rolled back: order still in transit, driver still
    // assigned, no money moved
    let order = engine.find_order(customer, order.id).await.unwrap();
    assert_eq!(order.status, OrderStatus::InTransit);

    let assigned = engine.find_driver(driver_caller, driver.id).await.unwrap();
    assert!(!assigned.is_available());

    assert_eq!(engine.balance(customer).await.unwrap(), dec!(100.00));
    assert_eq!(engine.balance(driver_caller).await.unwrap(), dec!(0));
    assert_eq!(engine.wallet_history(customer).await.unwrap().len(), 1);
    assert!(engine.wallet_history(driver_caller).await.unwrap().is_empty());

    // a top-up unblocks the retry
    engine.top_up(customer, dec!(2000.00)).await.unwrap();

    let order = engine
        .update_order_status(driver_caller, order.id, OrderStatus::Completed)
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Completed);
    assert_eq!(engine.balance(customer).await.unwrap(), dec!(500.00));
    assert_eq!(engine.balance(driver_caller).await.unwrap(), dec!(1440.00));
}

#[tokio::test]
#[ignore = "requires a postgres database (set TEST_DATABASE_URL)"]
async fn concurrent_accepts_have_a_single_winner() {
    let engine = engine().await;
    let center = random_center();

    let customer = new_customer(&engine).await;
    let vehicle_type = new_vehicle_type(&engine).await;

    let (first_caller, first_driver) = new_driver(&engine, &vehicle_type, Some(center)).await;
    let (second_caller, second_driver) = new_driver(&engine, &vehicle_type, Some(center)).await;

    let order = pending_order(&engine, customer, center).await;

    let (first, second) = tokio::join!(
        engine.accept_order(first_caller, order.id),
        engine.accept_order(second_caller, order.id),
    );

    let winners = [first.is_ok(), second.is_ok()]
        .iter()
        .filter(|won| **won)
        .count();
    assert_eq!(winners, 1);

    let (winner, loser_err) = if first.is_ok() {
        (first.unwrap(), second.unwrap_err())
    } else {
        (second.unwrap(), first.unwrap_err())
    };

    assert!(matches!(loser_err, Error::InvalidState { .. }));

    // exactly one driver ended up locked onto the order
    let first_driver = engine.find_driver(first_caller, first_driver.id).await.unwrap();
    let second_driver = engine
        .find_driver(second_caller, second_driver.id)
        .await
        .unwrap();

    assert_eq!(
        [!first_driver.is_available(), !second_driver.is_available()]
            .iter()
            .filter(|locked| **locked)
            .count(),
        1
    );

    let order = engine.find_order(customer, order.id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Accepted);
    assert_eq!(order.driver_id, winner.driver_id);
}

#[tokio::test]
#[ignore = "requires a postgres database (set TEST_DATABASE_URL)"]
async fn cancellation_rules() {
    let engine = engine().await;
    let center = random_center();

    let customer = new_customer(&engine).await;
    let stranger = new_customer(&engine).await;

    let order = pending_order(&engine, customer, center).await;

    // only the ordering customer may cancel
    let err = engine.cancel_order(stranger, order.id).await.unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));

    let order = engine.cancel_order(customer, order.id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);

    // once accepted, cancellation is no longer possible
    let vehicle_type = new_vehicle_type(&engine).await;
    let (driver_caller, driver) = new_driver(&engine, &vehicle_type, Some(center)).await;

    let order = pending_order(&engine, customer, center).await;
    engine.accept_order(driver_caller, order.id).await.unwrap();

    let err = engine.cancel_order(customer, order.id).await.unwrap_err();
    assert!(matches!(err, Error::InvalidState { ref current } if current == "ACCEPTED"));

    let order = engine.find_order(customer, order.id).await.unwrap();
    assert_eq!(order.driver_id, Some(driver.id));
}

#[tokio::test]
#[ignore = "requires a postgres database (set TEST_DATABASE_URL)"]
async fn find_nearby_excludes_unmatchable_drivers_and_sorts_by_distance() {
    let engine = engine().await;
    let center = random_center();

    let km_per_degree = 111.19492664455873;
    let at_km = |km: f64| Coordinates::new(center.latitude + km / km_per_degree, center.longitude);

    let vehicle_type = new_vehicle_type(&engine).await;

    let (_, near) = new_driver(&engine, &vehicle_type, Some(at_km(1.0))).await;
    let (_, farther) = new_driver(&engine, &vehicle_type, Some(at_km(3.0))).await;
    let (_, outside) = new_driver(&engine, &vehicle_type, Some(at_km(10.0))).await;
    let (_, no_location) = new_driver(&engine, &vehicle_type, None).await;

    // available but blocked after going online
    let (_, blocked) = new_driver(&engine, &vehicle_type, Some(at_km(1.5))).await;
    engine
        .set_driver_blocked(Caller::system(), blocked.id, true)
        .await
        .unwrap();

    // approved, located, but offline
    let (offline_caller, offline) = new_driver(&engine, &vehicle_type, Some(at_km(2.0))).await;
    engine
        .set_driver_availability(offline_caller, false)
        .await
        .unwrap();

    let nearby = engine
        .find_nearby_drivers(Caller::system(), center, None)
        .await
        .unwrap();

    let ids: Vec<_> = nearby.iter().map(|n| n.driver.id).collect();

    assert_eq!(ids, vec![near.id, farther.id]);
    assert!(nearby[0].distance_km < 1.1);
    assert!(nearby[1].distance_km > 2.8 && nearby[1].distance_km < 3.2);

    for excluded in [outside.id, no_location.id, blocked.id, offline.id] {
        assert!(!ids.contains(&excluded));
    }
}

#[tokio::test]
#[ignore = "requires a postgres database (set TEST_DATABASE_URL)"]
async fn transfers_are_atomic_and_guarded() {
    let engine = engine().await;

    let sender = new_customer(&engine).await;
    let receiver = new_customer(&engine).await;

    let err = engine
        .transfer_funds(sender, receiver.id, dec!(0), None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidAmount));

    engine.top_up(sender, dec!(50.00)).await.unwrap();

    let err = engine
        .transfer_funds(sender, receiver.id, dec!(100.00), None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InsufficientFunds { balance } if balance == dec!(50.00)));

    // the refused transfer left no trace on either side
    assert_eq!(engine.balance(sender).await.unwrap(), dec!(50.00));
    assert_eq!(engine.balance(receiver).await.unwrap(), dec!(0));
    assert_eq!(engine.wallet_history(sender).await.unwrap().len(), 1);
    assert!(engine.wallet_history(receiver).await.unwrap().is_empty());

    engine
        .transfer_funds(sender, receiver.id, dec!(40.00), None)
        .await
        .unwrap();

    assert_eq!(engine.balance(sender).await.unwrap(), dec!(10.00));
    assert_eq!(engine.balance(receiver).await.unwrap(), dec!(40.00));

    let receiver_history = engine.wallet_history(receiver).await.unwrap();
    assert_eq!(receiver_history.len(), 1);
    assert_eq!(receiver_history[0].kind, TransactionType::Credit);

    assert_reconciled(&engine, sender).await;
    assert_reconciled(&engine, receiver).await;
}

#[tokio::test]
#[ignore = "requires a postgres database (set TEST_DATABASE_URL)"]
async fn reviews_require_completion_and_stay_unique() {
    let engine = engine().await;
    let center = random_center();

    let customer = new_customer(&engine).await;
    engine.top_up(customer, dec!(2000.00)).await.unwrap();

    let vehicle_type = new_vehicle_type(&engine).await;
    let (driver_caller, driver) = new_driver(&engine, &vehicle_type, Some(center)).await;

    let order = order_in_transit(&engine, customer, driver_caller, center).await;

    // not reviewable before completion
    let err = engine
        .create_review(customer, order.id, 5, None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidState { .. }));

    engine
        .update_order_status(driver_caller, order.id, OrderStatus::Completed)
        .await
        .unwrap();

    engine
        .create_review(customer, order.id, 4, Some("smooth trip".into()))
        .await
        .unwrap();

    let rated = engine.find_driver(driver_caller, driver.id).await.unwrap();
    assert_eq!(rated.rating_count, 1);
    assert!((rated.average_rating - 4.0).abs() < 1e-9);

    let err = engine
        .create_review(customer, order.id, 5, None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AlreadyExists("review")));
}
