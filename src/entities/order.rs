use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{Stop, VehicleType};
use crate::error::Error;

/// Platform commission rate deducted from the driver's side of a settlement.
fn commission_rate() -> Decimal {
    Decimal::new(10, 2)
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub vehicle_type_id: Uuid,
    pub status: Status,
    pub pickup: Stop,
    pub drop_off: Stop,
    pub distance_km: Decimal,
    pub price: Decimal,
    pub final_price: Option<Decimal>,
    pub payment_method: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Pending,
    Accepted,
    DriverArrived,
    InTransit,
    Completed,
    Cancelled,
}

impl Status {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Accepted => "ACCEPTED",
            Self::DriverArrived => "DRIVER_ARRIVED",
            Self::InTransit => "IN_TRANSIT",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl Order {
    /// The price is quoted exactly once, here; it never changes afterwards.
    pub fn new(
        customer_id: Uuid,
        vehicle_type: &VehicleType,
        pickup: Stop,
        drop_off: Stop,
        distance_km: Decimal,
    ) -> Self {
        let price = vehicle_type.quote(distance_km);

        Self {
            id: Uuid::new_v4(),
            customer_id,
            driver_id: None,
            vehicle_type_id: vehicle_type.id,
            status: Status::Pending,
            pickup,
            drop_off,
            distance_km,
            price,
            final_price: None,
            payment_method: None,
            completed_at: None,
            created_at: Utc::now(),
        }
    }

    /// Customer-initiated cancellation, legal only while no driver holds the
    /// order. Once accepted, the order can only move forward.
    pub fn cancel(&mut self, requester_id: Uuid) -> Result<(), Error> {
        if self.customer_id != requester_id {
            return Err(Error::forbidden("only the ordering customer may cancel"));
        }

        match self.status {
            Status::Pending => {
                self.status = Status::Cancelled;
                Ok(())
            }
            _ => Err(Error::invalid_state(self.status.name())),
        }
    }

    pub fn assign_driver(&mut self, driver_id: Uuid) -> Result<(), Error> {
        match self.status {
            Status::Pending => {
                self.driver_id = Some(driver_id);
                self.status = Status::Accepted;
                Ok(())
            }
            _ => Err(Error::invalid_state(self.status.name())),
        }
    }

    /// Driver-initiated progress along the forward chain
    /// ACCEPTED -> DRIVER_ARRIVED -> IN_TRANSIT -> COMPLETED.
    pub fn advance(&mut self, driver_id: Uuid, to: Status) -> Result<(), Error> {
        if self.driver_id != Some(driver_id) {
            return Err(Error::forbidden(
                "only the assigned driver may update this order",
            ));
        }

        match (self.status, to) {
            (Status::Accepted, Status::DriverArrived)
            | (Status::DriverArrived, Status::InTransit)
            | (Status::InTransit, Status::Completed) => {
                self.status = to;

                if to == Status::Completed {
                    self.completed_at = Some(Utc::now());
                    self.final_price = Some(self.price);
                }

                Ok(())
            }
            _ => Err(Error::invalid_state(self.status.name())),
        }
    }

    pub fn commission(&self) -> Decimal {
        (self.price * commission_rate())
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }

    pub fn driver_earning(&self) -> Decimal {
        self.price - self.commission()
    }
}
