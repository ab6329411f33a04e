//! Encoders that serialize decoded BGP/MRT structures back to wire format: MRT RIB dump
//! entries (component E's inverse direction) and MRT UPDATE records.

pub mod rib_encoder;
pub mod rib_to_update;
pub mod updates_encoder;

pub use rib_encoder::*;
pub use rib_to_update::*;
pub use updates_encoder::*;
