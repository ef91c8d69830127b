mod driver;
mod location;
mod order;
mod review;
mod user;
mod vehicle_type;
mod wallet;

pub use driver::{Driver, Status as DriverStatus};
pub use location::{Coordinates, Stop};
pub use order::{Order, Status as OrderStatus};
pub use review::Review;
pub use user::{Role, User};
pub use vehicle_type::VehicleType;
pub use wallet::{TransactionType, Wallet, WalletTransaction};
