use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named fare tier. Identity is immutable; pricing is admin-mutable.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VehicleType {
    pub id: Uuid,
    pub name: String,
    pub base_fare: Decimal,
    pub price_per_km: Decimal,
}

impl VehicleType {
    pub fn new(name: String, base_fare: Decimal, price_per_km: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            base_fare,
            price_per_km,
        }
    }

    /// Quote for a trip of the given distance: base fare plus distance times
    /// the per-kilometer rate, rounded half-up to two decimal places.
    pub fn quote(&self, distance_km: Decimal) -> Decimal {
        (self.base_fare + distance_km * self.price_per_km)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}
