use std::fmt::{Display, Formatter};
use std::net::Ipv4Addr;

/// Route Distinguisher for VPN-IPv4/VPN-IPv6 routes (SAFI 128/129).
///
/// <https://datatracker.ietf.org/doc/html/rfc4364#section-4.2>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RouteDistinguisher {
    /// Type 0: 2-byte ASN, 4-byte assigned number.
    Type0 { asn: u16, number: u32 },
    /// Type 1: 4-byte IPv4 address, 2-byte assigned number.
    Type1 { ip: Ipv4Addr, number: u16 },
    /// Type 2: 4-byte ASN, 2-byte assigned number.
    Type2 { asn: u32, number: u16 },
}

impl RouteDistinguisher {
    /// Decode an 8-byte route distinguisher per its leading 2-byte type field.
    pub fn from_bytes(bytes: &[u8; 8]) -> RouteDistinguisher {
        let rd_type = u16::from_be_bytes([bytes[0], bytes[1]]);
        match rd_type {
            1 => RouteDistinguisher::Type1 {
                ip: Ipv4Addr::new(bytes[2], bytes[3], bytes[4], bytes[5]),
                number: u16::from_be_bytes([bytes[6], bytes[7]]),
            },
            2 => RouteDistinguisher::Type2 {
                asn: u32::from_be_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]),
                number: u16::from_be_bytes([bytes[6], bytes[7]]),
            },
            _ => RouteDistinguisher::Type0 {
                asn: u16::from_be_bytes([bytes[2], bytes[3]]),
                number: u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            },
        }
    }
}

impl Display for RouteDistinguisher {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteDistinguisher::Type0 { asn, number } => write!(f, "{asn}:{number}"),
            RouteDistinguisher::Type1 { ip, number } => write!(f, "{ip}:{number}"),
            RouteDistinguisher::Type2 { asn, number } => write!(f, "{asn}:{number}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_type0() {
        let bytes = [0, 0, 0x00, 0x01, 0x00, 0x00, 0x00, 0x64];
        match RouteDistinguisher::from_bytes(&bytes) {
            RouteDistinguisher::Type0 { asn, number } => {
                assert_eq!(asn, 1);
                assert_eq!(number, 100);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn decode_type1() {
        let bytes = [0, 1, 10, 0, 0, 1, 0x00, 0x05];
        match RouteDistinguisher::from_bytes(&bytes) {
            RouteDistinguisher::Type1 { ip, number } => {
                assert_eq!(ip, Ipv4Addr::new(10, 0, 0, 1));
                assert_eq!(number, 5);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn display_type0() {
        let rd = RouteDistinguisher::Type0 {
            asn: 65000,
            number: 100,
        };
        assert_eq!(rd.to_string(), "65000:100");
    }
}
