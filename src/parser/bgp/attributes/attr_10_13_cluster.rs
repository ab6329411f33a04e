use crate::models::*;
use crate::parser::ReadUtils;
use crate::ParserError;
use bytes::{BufMut, Bytes, BytesMut};
use std::net::IpAddr;

/// <https://tools.ietf.org/html/rfc4456>
pub fn parse_clusters(mut input: Bytes) -> Result<AttributeValue, ParserError> {
    let mut clusters = Vec::with_capacity(input.remaining() / 4);
    while input.remaining() > 0 {
        clusters.push(IpAddr::V4(input.read_ipv4_address()?));
    }
    Ok(AttributeValue::Clusters(clusters))
}

pub fn encode_clusters(clusters: &[IpAddr]) -> Bytes {
    let mut bytes = BytesMut::with_capacity(clusters.len() * 4);
    for cluster in clusters {
        match cluster {
            IpAddr::V4(addr) => bytes.put_u32((*addr).into()),
            IpAddr::V6(_) => {}
        }
    }
    bytes.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_parse_clusters() {
        if let Ok(AttributeValue::Clusters(n)) = parse_clusters(Bytes::from(vec![
            0xC0, 0x00, 0x02, 0x01, 0xC0, 0x00, 0x02, 0x02,
        ])) {
            assert_eq!(n.len(), 2);
            assert_eq!(n[0], IpAddr::V4(Ipv4Addr::new(0xC0, 0x00, 0x02, 0x01)));
            assert_eq!(n[1], IpAddr::V4(Ipv4Addr::new(0xC0, 0x00, 0x02, 0x02)));
        } else {
            panic!()
        }
    }

    #[test]
    fn test_encode_clusters() {
        let clusters = vec![
            IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)),
            IpAddr::V4(Ipv4Addr::new(192, 0, 2, 2)),
        ];
        assert_eq!(
            encode_clusters(&clusters),
            Bytes::from(vec![0xC0, 0x00, 0x02, 0x01, 0xC0, 0x00, 0x02, 0x02])
        );
    }
}
