//! Rebuild a synthetic BGP UPDATE message from a single TABLE_DUMP / TABLE_DUMPV2 RIB
//! entry (spec.md §4.E, component E).
//!
//! [crate::parser::mrt::mrt_elem] already folds RIB entries directly into [crate::BgpElem]
//! without materializing an intermediate wire-format UPDATE, which satisfies component E's
//! "uniform downstream view" contract for the crate's own iterator pipeline (see
//! `DESIGN.md`). [rebuild_update] is the additive, explicit counterpart for callers who want
//! the actual UPDATE bytes a collector would have synthesized -- e.g. re-exporting a filtered
//! RIB snapshot as an UPDATE-only MRT stream, or feeding the VM (`crate::vm`) a message shape
//! identical to a live `BGP4MP` UPDATE regardless of whether it originated from a RIB dump.

use crate::error::ParserError;
use crate::models::{
    Afi, Attribute, AttributeValue, Attributes, AsnLength, BgpMessage, BgpUpdateMessage, NetworkPrefix, Nlri,
};
use crate::parser::bgp::messages::encode_bgp_message;
use bitflags::bitflags;

bitflags! {
    /// Flags controlling [rebuild_update]'s MP_REACH/MP_UNREACH rewrite rules, matching
    /// spec.md §4.E.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RibToUpdateOptions: u8 {
        /// The source entry came from a TABLE_DUMPV2 RIB record rather than legacy
        /// TABLE_DUMP; forces 4-byte ASNs in the rebuilt attribute encoding.
        const RIBV2 = 0b00001;
        /// Assume the source MP_REACH_NLRI is exactly RFC 6396-compliant (next-hop block
        /// only, no embedded AFI/SAFI/NLRI). The crate's attribute parser already detects
        /// and resynchronizes past the non-compliant form at decode time (see
        /// `parse_nlri`'s `first_byte_zero` check in `attr_14_15_nlri.rs`), so this flag is
        /// accepted for parity with spec.md but does not change rebuild behavior: by the
        /// time a `Nlri` reaches this function it has already been normalized.
        const STRICT_RFC6396 = 0b00010;
        /// Drop any MP_UNREACH_NLRI attribute entirely.
        const STRIPUNREACH = 0b00100;
        /// Replace MP_UNREACH_NLRI's prefix list with an empty one, keeping only its AFI/SAFI.
        const CLEARUNREACH = 0b01000;
        /// Allow the rebuilt message to exceed the ordinary 4096-byte cap (up to 65535).
        const EXMSG = 0b10000;
    }
}

const ORDINARY_MSG_CAP: usize = 4096;
const EXTENDED_MSG_CAP: usize = 65535;

/// Rebuild a synthetic UPDATE message carrying exactly `prefix`, copying and rewriting
/// `attrs` per `options`. Mirrors spec.md §4.E's five-step algorithm:
/// 1. ASN width is forced by `RIBV2` (32-bit) vs. legacy TABLE_DUMP (16-bit).
/// 2-3. Path attributes are copied verbatim, except MP_REACH_NLRI (restricted to `prefix`
///    alone) and MP_UNREACH_NLRI (rewritten per `STRIPUNREACH`/`CLEARUNREACH`).
/// 4. If no MP_REACH_NLRI was produced, an IPv4 prefix is appended to the plain NLRI; an
///    IPv6 prefix without MP_REACH_NLRI is an error (`RIB_NO_MPREACH` in spec.md's error
///    taxonomy, here [ParserError::ParseError]).
/// 5. The message is encoded and checked against the 4096 (or, under `EXMSG`, 65535) byte cap.
pub fn rebuild_update(
    prefix: NetworkPrefix,
    attrs: &Attributes,
    options: RibToUpdateOptions,
) -> Result<BgpMessage, ParserError> {
    let asn_len = if options.contains(RibToUpdateOptions::RIBV2) {
        AsnLength::Bits32
    } else {
        AsnLength::Bits16
    };

    let is_v6 = matches!(prefix.prefix, ipnet::IpNet::V6(_));
    let mut rewritten: Vec<Attribute> = Vec::with_capacity(attrs.len());
    let mut wrote_mp_reach = false;

    for attr in attrs.iter() {
        match &attr.value {
            AttributeValue::MpReachNlri(nlri) => {
                // spec.md §4.E step 3: under RIBV2 the source MP_REACH_NLRI carries only a
                // next-hop block for the RIB entry's own family, so it is always rewritten
                // to carry just `prefix`. Outside RIBV2 (legacy TABLE_DUMP), MP_REACH_NLRI
                // is a normal attribute whose AFI must agree with the NLRI it's paired
                // with; a mismatched family means this MP_REACH_NLRI doesn't belong to
                // `prefix` at all, so it is dropped and the prefix falls through to step 4's
                // plain-NLRI append instead.
                let expected_afi = if is_v6 { Afi::Ipv6 } else { Afi::Ipv4 };
                if options.contains(RibToUpdateOptions::RIBV2) || nlri.afi == expected_afi {
                    wrote_mp_reach = true;
                    rewritten.push(Attribute {
                        attr_type: attr.attr_type,
                        flag: attr.flag,
                        value: AttributeValue::MpReachNlri(Nlri {
                            afi: nlri.afi,
                            safi: nlri.safi,
                            next_hop: nlri.next_hop,
                            prefixes: vec![prefix],
                        }),
                    });
                }
            }
            AttributeValue::MpUnreachNlri(nlri) => {
                if options.contains(RibToUpdateOptions::STRIPUNREACH) {
                    continue;
                }
                if options.contains(RibToUpdateOptions::CLEARUNREACH) {
                    rewritten.push(Attribute {
                        attr_type: attr.attr_type,
                        flag: attr.flag,
                        value: AttributeValue::MpUnreachNlri(Nlri {
                            afi: nlri.afi,
                            safi: nlri.safi,
                            next_hop: None,
                            prefixes: vec![],
                        }),
                    });
                } else {
                    rewritten.push(attr.clone());
                }
            }
            _ => rewritten.push(attr.clone()),
        }
    }

    let announced_prefixes = if wrote_mp_reach {
        vec![]
    } else if is_v6 {
        return Err(ParserError::ParseError(
            "RIB entry has no MP_REACH_NLRI for an IPv6 prefix".to_string(),
        ));
    } else {
        vec![prefix]
    };

    let update = BgpUpdateMessage {
        withdrawn_prefixes: vec![],
        attributes: Attributes::from(rewritten),
        announced_prefixes,
    };

    let message = BgpMessage::Update(update);
    let encoded_len = encode_bgp_message(&message, asn_len).len();
    let cap = if options.contains(RibToUpdateOptions::EXMSG) {
        EXTENDED_MSG_CAP
    } else {
        ORDINARY_MSG_CAP
    };
    if encoded_len > cap {
        return Err(ParserError::ParseError(format!(
            "rebuilt UPDATE is {encoded_len} bytes, exceeding the {cap}-byte cap"
        )));
    }

    Ok(message)
}

/// Forced AFI for a prefix's family, used by callers constructing a bare MP_REACH_NLRI
/// (e.g. tests) without going through a parsed RIB entry.
pub fn afi_of(prefix: &NetworkPrefix) -> Afi {
    match prefix.prefix {
        ipnet::IpNet::V4(_) => Afi::Ipv4,
        ipnet::IpNet::V6(_) => Afi::Ipv6,
    }
}
