pub mod api;
pub use api::{ApiError, Client, Error, Message, Passport, Trust, Verification};

pub mod logger;
