use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::Coordinates;
use crate::error::Error;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Driver {
    pub id: Uuid,
    pub user_id: Uuid,
    pub vehicle_type_id: Uuid,
    pub license_number: String,
    pub vehicle_plate_number: String,
    pub status: Status,
    pub approved: bool,
    pub blocked: bool,
    pub location: Option<Coordinates>,
    pub average_rating: f64,
    pub rating_count: i32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum Status {
    Offline,
    Available,
    Assigned { order_id: Uuid },
}

impl Status {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Offline => "OFFLINE",
            Self::Available => "AVAILABLE",
            Self::Assigned { .. } => "ASSIGNED",
        }
    }
}

impl Driver {
    pub fn new(
        user_id: Uuid,
        vehicle_type_id: Uuid,
        license_number: String,
        vehicle_plate_number: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            vehicle_type_id,
            license_number,
            vehicle_plate_number,
            status: Status::Offline,
            approved: false,
            blocked: false,
            location: None,
            average_rating: 0.0,
            rating_count: 0,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.status, Status::Available)
    }

    pub fn is_matchable(&self) -> bool {
        self.is_available() && self.approved && !self.blocked && self.location.is_some()
    }

    /// Availability may only be turned on for an approved, unblocked driver.
    pub fn go_online(&mut self) -> Result<(), Error> {
        if !self.approved {
            return Err(Error::forbidden("account is pending approval by admin"));
        }

        if self.blocked {
            return Err(Error::forbidden("account is blocked"));
        }

        if let Status::Offline = self.status {
            self.status = Status::Available;
        }

        Ok(())
    }

    pub fn go_offline(&mut self) -> Result<(), Error> {
        match self.status {
            Status::Available => {
                self.status = Status::Offline;
                Ok(())
            }
            Status::Offline => Ok(()),
            _ => Err(Error::invalid_state(self.status.name())),
        }
    }

    pub fn assign(&mut self, order_id: Uuid) -> Result<(), Error> {
        match self.status {
            Status::Available => {
                self.status = Status::Assigned { order_id };
                Ok(())
            }
            _ => Err(Error::invalid_state(self.status.name())),
        }
    }

    /// Releases the driver after a trip ends. An approved, unblocked driver
    /// becomes available again; anyone gated in the meantime goes offline.
    pub fn free(&mut self) {
        if let Status::Assigned { .. } = self.status {
            self.status = if self.approved && !self.blocked {
                Status::Available
            } else {
                Status::Offline
            };
        }
    }

    pub fn block(&mut self) {
        self.blocked = true;

        if let Status::Available = self.status {
            self.status = Status::Offline;
        }
    }

    pub fn unblock(&mut self) {
        self.blocked = false;
    }

    pub fn rate(&mut self, rating: i32) -> Result<(), Error> {
        if !(1..=5).contains(&rating) {
            return Err(Error::InvalidRating);
        }

        let count = self.rating_count as f64;
        self.average_rating = (self.average_rating * count + rating as f64) / (count + 1.0);
        self.rating_count += 1;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approved_driver() -> Driver {
        let mut driver = Driver::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "B1234567".into(),
            "CAB-1234".into(),
        );
        driver.approved = true;
        driver
    }

    #[test]
    fn unapproved_driver_cannot_go_online() {
        let mut driver = Driver::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "B1234567".into(),
            "CAB-1234".into(),
        );

        assert!(matches!(driver.go_online(), Err(Error::Forbidden(_))));
        assert!(!driver.is_available());
    }

    #[test]
    fn blocked_driver_cannot_go_online() {
        let mut driver = approved_driver();
        driver.blocked = true;

        assert!(matches!(driver.go_online(), Err(Error::Forbidden(_))));
    }

    #[test]
    fn approved_driver_goes_online_and_offline() {
        let mut driver = approved_driver();

        driver.go_online().unwrap();
        assert!(driver.is_available());

        driver.go_offline().unwrap();
        assert!(!driver.is_available());
    }

    #[test]
    fn assign_requires_availability() {
        let mut driver = approved_driver();

        assert!(matches!(
            driver.assign(Uuid::new_v4()),
            Err(Error::InvalidState { .. })
        ));

        driver.go_online().unwrap();
        driver.assign(Uuid::new_v4()).unwrap();
        assert!(!driver.is_available());
    }

    #[test]
    fn assigned_driver_cannot_go_offline() {
        let mut driver = approved_driver();
        driver.go_online().unwrap();
        driver.assign(Uuid::new_v4()).unwrap();

        assert!(matches!(
            driver.go_offline(),
            Err(Error::InvalidState { .. })
        ));
    }

    #[test]
    fn free_returns_driver_to_available() {
        let mut driver = approved_driver();
        driver.go_online().unwrap();
        driver.assign(Uuid::new_v4()).unwrap();

        driver.free();

        assert!(driver.is_available());
    }

    #[test]
    fn free_sends_blocked_driver_offline() {
        let mut driver = approved_driver();
        driver.go_online().unwrap();
        driver.assign(Uuid::new_v4()).unwrap();
        driver.blocked = true;

        driver.free();

        assert!(matches!(driver.status, Status::Offline));
    }

    #[test]
    fn blocking_an_available_driver_forces_them_offline() {
        let mut driver = approved_driver();
        driver.go_online().unwrap();

        driver.block();

        assert!(driver.blocked);
        assert!(matches!(driver.status, Status::Offline));
    }

    #[test]
    fn matchable_requires_location() {
        let mut driver = approved_driver();
        driver.go_online().unwrap();

        assert!(!driver.is_matchable());

        driver.location = Some(Coordinates::new(6.9271, 79.8612));
        assert!(driver.is_matchable());
    }

    #[test]
    fn rating_updates_the_running_average() {
        let mut driver = approved_driver();

        driver.rate(4).unwrap();
        driver.rate(5).unwrap();

        assert_eq!(driver.rating_count, 2);
        assert!((driver.average_rating - 4.5).abs() < 1e-9);
    }

    #[test]
    fn rating_outside_range_is_rejected() {
        let mut driver = approved_driver();

        assert!(matches!(driver.rate(0), Err(Error::InvalidRating)));
        assert!(matches!(driver.rate(6), Err(Error::InvalidRating)));
        assert_eq!(driver.rating_count, 0);
    }
}
