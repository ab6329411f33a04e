//! Shared data model types for BGP messages, MRT records, and the underlying address
//! family primitives, plus the filtering VM's own vocabulary (§3 of the design: `Ip`,
//! `RawPrefix`, `BgpMessage`, `BgpAttribute`, AS path, `Vm`).

use ipnet::AddrParseError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod bgp;
pub mod mrt;
pub mod network;
pub mod rpki;

pub use bgp::*;
pub use mrt::*;
pub use network::*;
pub use rpki::*;

/// Error produced by the address/prefix primitives (component A).
#[derive(Debug)]
pub enum BgpModelsError {
    PrefixParsingError(String),
}

impl Display for BgpModelsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BgpModelsError::PrefixParsingError(msg) => {
                write!(f, "cannot convert str to IP prefix: {msg}")
            }
        }
    }
}

impl Error for BgpModelsError {}

impl From<AddrParseError> for BgpModelsError {
    fn from(err: AddrParseError) -> Self {
        BgpModelsError::PrefixParsingError(err.to_string())
    }
}
