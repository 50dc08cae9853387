//! # Domain Module
//!
//! Core domain types: identifiers, records, errors and validation rules.

pub mod entities;
pub mod errors;
pub mod formatting;
pub mod validation;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use formatting::*;
pub use validation::*;
pub use value_objects::*;
