/*!
Provides parsing of BGP messages.
*/
pub mod messages;
pub mod attributes;

pub use messages::{encode_bgp_message, parse_bgp_message};