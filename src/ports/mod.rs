//! Port traits the domain depends on, implemented in [`crate::adapters`].

pub mod config_port;
pub mod price_port;
