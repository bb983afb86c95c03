pub mod location;
pub mod reading;
