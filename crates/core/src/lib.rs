pub mod config;
pub mod domain;
pub mod errors;
pub mod provider;

pub use config::{AppConfig, BlockedUsers, ResponseModeSetting};
pub use domain::location::{LocationQuery, NamedLocation};
pub use domain::reading::{Reading, Severity};
pub use errors::{ApplicationError, DomainError, FetchError, InterfaceError};
pub use provider::{AirVisualClient, ReadingProvider};
