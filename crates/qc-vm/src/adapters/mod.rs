//! # Adapters Layer (Outer Hexagon)
//!
//! Default implementations of the outbound ports.

pub mod address_derivation;

pub use address_derivation::*;
