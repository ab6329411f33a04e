use crate::models::*;
use crate::parser::ReadUtils;
use crate::ParserError;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use num_enum::TryFromPrimitive;

#[allow(non_camel_case_types)]
#[derive(Debug, TryFromPrimitive)]
#[repr(u8)]
enum AsSegmentType {
    AS_PATH_AS_SET = 1,
    AS_PATH_AS_SEQUENCE = 2,
    // https://datatracker.ietf.org/doc/html/rfc5065
    AS_PATH_CONFED_SEQUENCE = 3,
    AS_PATH_CONFED_SET = 4,
}

pub fn parse_as_path(mut input: Bytes, asn_len: &AsnLength) -> Result<AsPath, ParserError> {
    let mut output = AsPath::new();
    while input.remaining() > 0 {
        let segment = parse_as_path_segment(&mut input, asn_len)?;
        output.add_segment(segment);
    }
    Ok(output)
}

fn parse_as_path_segment(
    input: &mut Bytes,
    asn_len: &AsnLength,
) -> Result<AsPathSegment, ParserError> {
    let segment_type =
        AsSegmentType::try_from_primitive(input.read_u8()?).map_err(|e| {
            ParserError::UnrecognizedEnumVariant {
                type_name: "AsSegmentType",
                value: e.number as u32,
            }
        })?;
    let count = input.read_u8()? as usize;
    let path = input.read_asns(asn_len, count)?;
    match segment_type {
        AsSegmentType::AS_PATH_AS_SET => Ok(AsPathSegment::AsSet(path)),
        AsSegmentType::AS_PATH_AS_SEQUENCE => Ok(AsPathSegment::AsSequence(path)),
        AsSegmentType::AS_PATH_CONFED_SEQUENCE => Ok(AsPathSegment::ConfedSequence(path)),
        AsSegmentType::AS_PATH_CONFED_SET => Ok(AsPathSegment::ConfedSet(path)),
    }
}

/// Encode an AS_PATH or AS4_PATH attribute value. `asn_len` is forced to
/// [AsnLength::Bits32] by the caller for AS4_PATH regardless of the session's negotiated width.
pub fn encode_as_path(path: &AsPath, asn_len: AsnLength) -> Bytes {
    let mut bytes = BytesMut::new();
    for segment in &path.segments {
        let (type_code, asns): (u8, &[Asn]) = match segment {
            AsPathSegment::AsSequence(v) => (AsSegmentType::AS_PATH_AS_SEQUENCE as u8, v),
            AsPathSegment::AsSet(v) => (AsSegmentType::AS_PATH_AS_SET as u8, v),
            AsPathSegment::ConfedSequence(v) => (AsSegmentType::AS_PATH_CONFED_SEQUENCE as u8, v),
            AsPathSegment::ConfedSet(v) => (AsSegmentType::AS_PATH_CONFED_SET as u8, v),
        };
        bytes.put_u8(type_code);
        bytes.put_u8(asns.len() as u8);
        for asn in asns {
            let asn = match asn_len {
                AsnLength::Bits16 => Asn::new_16bit(asn.to_u32() as u16),
                AsnLength::Bits32 => Asn::new_32bit(asn.to_u32()),
            };
            bytes.put(asn.encode());
        }
    }
    bytes.freeze()
}
