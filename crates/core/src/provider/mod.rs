//! Air-quality data provider seam.
//!
//! The gateway only ever needs one number per lookup, so the provider contract
//! is a single async call. `AirVisualClient` is the production implementation.

pub mod airvisual;

use async_trait::async_trait;

use crate::domain::location::LocationQuery;
use crate::domain::reading::Reading;
use crate::errors::FetchError;

pub use airvisual::AirVisualClient;

#[async_trait]
pub trait ReadingProvider: Send + Sync {
    async fn fetch_reading(&self, query: &LocationQuery) -> Result<Reading, FetchError>;
}
