use std::fmt;

/// Failure kinds of a single store round trip.
///
/// Every kind is answered with the endpoint's fixed 500 message; the kind only
/// decides what ends up in the log.
#[derive(Debug)]
pub enum StoreError {
    InvalidId(String),
    InvalidDocument(String),
    NotConnected(String),
    Database(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::InvalidId(id) => write!(f, "Invalid identifier: {}", id),
            StoreError::InvalidDocument(msg) => write!(f, "Invalid document: {}", msg),
            StoreError::NotConnected(msg) => write!(f, "Store not connected: {}", msg),
            StoreError::Database(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for StoreError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        StoreError::InvalidDocument(err.to_string())
    }
}
