use crate::models::*;
use crate::parser::ReadUtils;
use crate::ParserError;
use bytes::{BufMut, Bytes, BytesMut};

pub fn parse_large_communities(mut input: Bytes) -> Result<AttributeValue, ParserError> {
    let mut communities = Vec::new();
    while input.remaining() > 0 {
        input.require_n_remaining(12, "large community")?; // 12 bytes for large community (3x 32 bits integers)
        let global_administrator = input.read_u32()?;
        let local_data = [input.read_u32()?, input.read_u32()?];
        communities.push(LargeCommunity::new(global_administrator, local_data));
    }
    Ok(AttributeValue::LargeCommunities(communities))
}

pub fn encode_large_communities(communities: &[LargeCommunity]) -> Bytes {
    let mut bytes = BytesMut::with_capacity(communities.len() * 12);
    for community in communities {
        bytes.put_u32(community.global_admin);
        bytes.put_u32(community.local_data[0]);
        bytes.put_u32(community.local_data[1]);
    }
    bytes.freeze()
}
