//! # Domain Layer (Inner Hexagon)
//!
//! Pure types and functions for bytecode execution.
//! NO I/O, NO interpreter state.

pub mod entities;
pub mod services;
pub mod value_objects;

pub use entities::*;
pub use services::*;
pub use value_objects::*;
