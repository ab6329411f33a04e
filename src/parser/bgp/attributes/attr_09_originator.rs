use crate::models::*;
use crate::parser::ReadUtils;
use crate::ParserError;
use bytes::{BufMut, Bytes, BytesMut};
use std::net::IpAddr;

pub fn parse_originator_id(
    mut input: Bytes,
    afi: &Option<Afi>,
) -> Result<AttributeValue, ParserError> {
    let afi = match afi {
        None => &Afi::Ipv4,
        Some(a) => a,
    };
    let addr = input.read_address(afi)?;
    Ok(AttributeValue::OriginatorId(addr))
}

pub fn encode_originator_id(addr: &IpAddr) -> Bytes {
    let mut bytes = BytesMut::new();
    match addr {
        IpAddr::V4(addr) => bytes.put_u32((*addr).into()),
        IpAddr::V6(addr) => bytes.put_slice(&addr.octets()),
    }
    bytes.freeze()
}
