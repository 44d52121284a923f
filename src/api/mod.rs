mod client;
pub use client::{Auth, Client, DEFAULT_BASE_URL, TIMEOUT};

mod error;
pub use error::{ApiError, Error, Result};

pub mod model;
pub use model::{Message, Passport, Trust, Verification};
