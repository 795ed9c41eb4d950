pub mod discount;
pub mod error;
pub mod model;
pub mod service;
pub mod store;

pub use discount::DiscountBook;
pub use error::BookingError;
pub use model::*;
pub use service::*;
pub use store::Store;
