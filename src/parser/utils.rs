/*!
Provides IO utility functions for read bytes of different length and converting to corresponding structs.
*/
use crate::error::ParserError;
use crate::models::{Afi, Asn, AsnLength, NetworkPrefix, Safi};
use bytes::{Buf, Bytes};
use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use std::convert::TryFrom;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// A [regex::Regex] wrapper that adds [PartialEq] and [Clone], neither of which `Regex` itself
/// implements, so that filters carrying a compiled regex can still derive those traits.
#[derive(Debug, Clone)]
pub struct ComparableRegex(regex::Regex);

impl ComparableRegex {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(ComparableRegex(regex::Regex::new(pattern)?))
    }

    pub fn is_match<S: AsRef<str>>(&self, text: S) -> bool {
        self.0.is_match(text.as_ref())
    }
}

impl PartialEq for ComparableRegex {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_str() == other.0.as_str()
    }
}

impl std::ops::Deref for ComparableRegex {
    type Target = regex::Regex;

    fn deref(&self) -> &regex::Regex {
        &self.0
    }
}

/// Extension trait providing length-checked reads on top of [bytes::Buf].
///
/// Every numeric/IP/prefix reader here returns a [ParserError] instead of panicking when the
/// underlying buffer is shorter than the requested field, since MRT/BGP inputs are untrusted.
pub trait ReadUtils: Buf {
    #[inline]
    fn read_u8(&mut self) -> Result<u8, ParserError> {
        self.require_n_remaining(1, "u8")?;
        Ok(Buf::get_u8(self))
    }

    #[inline]
    fn read_u16(&mut self) -> Result<u16, ParserError> {
        self.require_n_remaining(2, "u16")?;
        Ok(Buf::get_u16(self))
    }

    #[inline]
    fn read_u32(&mut self) -> Result<u32, ParserError> {
        self.require_n_remaining(4, "u32")?;
        Ok(Buf::get_u32(self))
    }

    #[inline]
    fn read_u64(&mut self) -> Result<u64, ParserError> {
        self.require_n_remaining(8, "u64")?;
        Ok(Buf::get_u64(self))
    }

    fn read_n_bytes(&mut self, n_bytes: usize) -> Result<Vec<u8>, ParserError> {
        self.require_n_remaining(n_bytes, "n_bytes")?;
        let mut buffer = vec![0; n_bytes];
        self.copy_to_slice(&mut buffer);
        Ok(buffer)
    }

    fn read_n_bytes_to_string(&mut self, n_bytes: usize) -> Result<String, ParserError> {
        let buffer = self.read_n_bytes(n_bytes)?;
        Ok(buffer.into_iter().map(|b| b as char).collect())
    }

    /// Returns an error unless at least `n` bytes remain in the buffer.
    fn has_n_remaining(&self, n: usize) -> Result<(), ParserError> {
        if self.remaining() < n {
            return Err(ParserError::TruncatedMsg(format!(
                "not enough bytes: want {} bytes, {} available",
                n,
                self.remaining()
            )));
        }
        Ok(())
    }

    /// Same as [Self::has_n_remaining] but with a caller-provided label for the error message.
    fn require_n_remaining(&self, n: usize, ctx: &str) -> Result<(), ParserError> {
        if self.remaining() < n {
            return Err(ParserError::TruncatedMsg(format!(
                "not enough bytes to read {}: want {} bytes, {} available",
                ctx,
                n,
                self.remaining()
            )));
        }
        Ok(())
    }

    /// Returns an error unless exactly `n` bytes remain in the buffer. Used by fixed-length
    /// attribute value parsers (ORIGIN, OTC) where any other length is itself malformed.
    fn expect_remaining_eq(&self, n: usize, ctx: &str) -> Result<(), ParserError> {
        if self.remaining() != n {
            return Err(ParserError::ParseError(format!(
                "invalid {} length: expected {} bytes, found {}",
                ctx,
                n,
                self.remaining()
            )));
        }
        Ok(())
    }

    fn read_ipv4_address(&mut self) -> Result<Ipv4Addr, ParserError> {
        Ok(Ipv4Addr::from(self.read_u32()?))
    }

    fn read_ipv6_address(&mut self) -> Result<Ipv6Addr, ParserError> {
        let bytes = self.read_n_bytes(16)?;
        let mut buf = [0u8; 16];
        buf.copy_from_slice(&bytes);
        Ok(Ipv6Addr::from(buf))
    }

    fn read_address(&mut self, afi: &Afi) -> Result<IpAddr, ParserError> {
        match afi {
            Afi::Ipv4 => Ok(IpAddr::V4(self.read_ipv4_address()?)),
            Afi::Ipv6 => Ok(IpAddr::V6(self.read_ipv6_address()?)),
        }
    }

    fn read_ipv4_prefix(&mut self) -> Result<Ipv4Net, ParserError> {
        let addr = self.read_ipv4_address()?;
        let mask = self.read_u8()?;
        Ipv4Net::new(addr, mask)
            .map_err(|_| ParserError::ParseError(format!("invalid IPv4 prefix length: {mask}")))
    }

    fn read_ipv6_prefix(&mut self) -> Result<Ipv6Net, ParserError> {
        let addr = self.read_ipv6_address()?;
        let mask = self.read_u8()?;
        Ipv6Net::new(addr, mask)
            .map_err(|_| ParserError::ParseError(format!("invalid IPv6 prefix length: {mask}")))
    }

    /// Read an announced/withdrawn NLRI prefix.
    ///
    /// Wire format is a 1-byte prefix length followed by the minimal number of address bytes
    /// needed to hold it ([RFC 4271 section 4.3]). When `add_path` is set, a 4-byte path
    /// identifier precedes the prefix length ([RFC 7911]).
    fn read_nlri_prefix(&mut self, afi: &Afi, add_path: bool) -> Result<NetworkPrefix, ParserError> {
        let path_id = if add_path {
            Some(self.read_u32()?)
        } else {
            None
        };

        let bit_len = self.read_u8()?;
        let byte_len = (bit_len as usize).div_ceil(8);

        let addr: IpAddr = match afi {
            Afi::Ipv4 => {
                if byte_len > 4 {
                    return Err(ParserError::ParseError(format!(
                        "invalid IPv4 prefix length: {bit_len}"
                    )));
                }
                let bytes = self.read_n_bytes(byte_len)?;
                let mut buf = [0u8; 4];
                buf[..byte_len].copy_from_slice(&bytes);
                IpAddr::V4(Ipv4Addr::from(buf))
            }
            Afi::Ipv6 => {
                if byte_len > 16 {
                    return Err(ParserError::ParseError(format!(
                        "invalid IPv6 prefix length: {bit_len}"
                    )));
                }
                let bytes = self.read_n_bytes(byte_len)?;
                let mut buf = [0u8; 16];
                buf[..byte_len].copy_from_slice(&bytes);
                IpAddr::V6(Ipv6Addr::from(buf))
            }
        };

        let prefix = match addr {
            IpAddr::V4(addr) => IpNet::V4(
                Ipv4Net::new(addr, bit_len)
                    .map_err(|_| ParserError::ParseError("invalid network prefix length".to_string()))?,
            ),
            IpAddr::V6(addr) => IpNet::V6(
                Ipv6Net::new(addr, bit_len)
                    .map_err(|_| ParserError::ParseError("invalid network prefix length".to_string()))?,
            ),
        };

        Ok(NetworkPrefix::new(prefix, path_id))
    }

    fn read_asn(&mut self, as_length: &AsnLength) -> Result<Asn, ParserError> {
        match as_length {
            AsnLength::Bits16 => Ok(Asn::new_16bit(self.read_u16()?)),
            AsnLength::Bits32 => Ok(Asn::new_32bit(self.read_u32()?)),
        }
    }

    fn read_asns(&mut self, as_length: &AsnLength, count: usize) -> Result<Vec<Asn>, ParserError> {
        let mut path = Vec::with_capacity(count);
        for _ in 0..count {
            path.push(self.read_asn(as_length)?);
        }
        Ok(path)
    }

    fn read_afi(&mut self) -> Result<Afi, ParserError> {
        let afi = self.read_u16()?;
        Ok(Afi::try_from(afi)?)
    }

    fn read_safi(&mut self) -> Result<Safi, ParserError> {
        let safi = self.read_u8()?;
        Ok(Safi::try_from(safi)?)
    }
}

// All types that implement Buf can now read prefixes
impl<T: Buf> ReadUtils for T {}

/// Parse a list of [NetworkPrefix] entries packed back-to-back, as found in BGP UPDATE
/// withdrawn/announced-routes fields and in MP_REACH_NLRI/MP_UNREACH_NLRI attribute values.
pub fn parse_nlri_list(
    mut input: Bytes,
    add_path: bool,
    afi: &Afi,
) -> Result<Vec<NetworkPrefix>, ParserError> {
    let mut prefixes = vec![];
    while input.remaining() > 0 {
        prefixes.push(input.read_nlri_prefix(afi, add_path)?);
    }
    Ok(prefixes)
}
