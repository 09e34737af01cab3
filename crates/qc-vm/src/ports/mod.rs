//! # Ports Layer (Middle Hexagon)
//!
//! Trait definitions the interpreter depends on.
//! No concrete implementations in this module.
//!
//! - **Driven Ports (Outbound)**: `AddressDerivation`

pub mod outbound;

pub use outbound::*;
