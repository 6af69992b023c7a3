//! Core domain types and logic.

pub mod cell;
pub mod config_validation;
pub mod dispatcher;
pub mod error;
pub mod formula;
pub mod grid;
pub mod price;
pub mod scan;
pub mod tenor;
