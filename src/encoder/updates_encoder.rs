use crate::parser::bmp::messages::{BmpMessage, MessageBody};
use crate::models::{
    Asn, AsnLength, Bgp4MpEnum, Bgp4MpMessage, Bgp4MpType, CommonHeader, EntryType, MrtMessage,
};
use bytes::Bytes;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

fn convert_timestamp(timestamp: f64) -> (u32, u32) {
    let seconds = timestamp as u32;
    let microseconds = ((timestamp - seconds as f64) * 1_000_000.0) as u32;
    (seconds, microseconds)
}

fn zero_addr(like: &IpAddr) -> IpAddr {
    match like {
        IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
    }
}

/// Re-wraps BMP route monitoring messages as MRT BGP4MP records, so a BMP feed can be archived
/// to the same MRT format produced by [`crate::encoder::MrtRibEncoder`].
///
/// BMP has no notion of a local ASN/interface/IP for the collector side, so those fields are
/// filled in with zero values; only the peer-facing half of the BGP4MP record is meaningful.
#[derive(Default)]
pub struct MrtUpdatesEncoder {}

impl MrtUpdatesEncoder {
    pub fn encode_bmp_message(&self, message: &BmpMessage) -> Result<Bytes, String> {
        let per_peer_header = message
            .per_peer_header
            .as_ref()
            .ok_or_else(|| "BMP message has no per-peer header to derive a BGP4MP record from".to_string())?;

        let route_monitoring = match &message.message_body {
            MessageBody::RouteMonitoring(m) => m,
            other => {
                return Err(format!(
                    "cannot encode BMP message body {other:?} as an MRT BGP4MP record"
                ))
            }
        };

        let asn_len = per_peer_header.asn_length();
        let msg_type = match asn_len {
            AsnLength::Bits32 => Bgp4MpType::MessageAs4,
            AsnLength::Bits16 => Bgp4MpType::Message,
        };

        let bgp4mp_message = Bgp4MpMessage {
            msg_type,
            peer_asn: per_peer_header.peer_asn,
            local_asn: Asn::default(),
            interface_index: 0,
            peer_ip: per_peer_header.peer_ip,
            local_ip: zero_addr(&per_peer_header.peer_ip),
            bgp_message: route_monitoring.bgp_message.clone(),
        };

        let mrt_message = MrtMessage::Bgp4Mp(Bgp4MpEnum::Message(bgp4mp_message));
        let sub_type = u16::from(msg_type);
        let data_bytes = mrt_message.encode(sub_type);

        let (seconds, microseconds) = convert_timestamp(per_peer_header.timestamp);
        let header_bytes = CommonHeader {
            timestamp: seconds,
            microsecond_timestamp: Some(microseconds),
            entry_type: EntryType::BGP4MP,
            entry_subtype: sub_type,
            length: data_bytes.len() as u32,
        }
        .encode();

        let mut bytes = bytes::BytesMut::with_capacity(header_bytes.len() + data_bytes.len());
        bytes.extend_from_slice(&header_bytes);
        bytes.extend_from_slice(&data_bytes);
        Ok(bytes.freeze())
    }
}
