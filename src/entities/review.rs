use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One review per completed order; feeds the driver's running average.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub order_id: Uuid,
    pub driver_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub fn new(order_id: Uuid, driver_id: Uuid, rating: i32, comment: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            driver_id,
            rating,
            comment,
            created_at: Utc::now(),
        }
    }
}
