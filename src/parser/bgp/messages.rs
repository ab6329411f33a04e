use crate::error::ParserError;
use crate::models::*;
use crate::parser::bgp::attributes::parse_attributes;
use crate::parser::utils::{parse_nlri_list, ReadUtils};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use log::warn;

const BGP_MARKER_LEN: usize = 16;
const BGP_HEADER_LEN: usize = 19;

/// Parse a single BGP message, including its RFC 4271 section 4.1 header.
///
/// ```text
/// 0                   1                   2                   3
/// 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// +                                                               +
/// |                                                               |
/// +                           Marker                              +
/// |                                                               |
/// +                                                               +
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |          Length               |      Type     |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// `data` is consumed up to and including `length` bytes; any bytes beyond the message are
/// left untouched so callers (e.g. BMP PeerUpNotification, which carries two OPEN messages
/// back to back) can call this repeatedly over the same buffer.
pub fn parse_bgp_message(
    data: &mut Bytes,
    add_path: bool,
    asn_len: &AsnLength,
) -> Result<BgpMessage, ParserError> {
    data.require_n_remaining(BGP_HEADER_LEN, "bgp message header")?;
    data.advance(BGP_MARKER_LEN);

    /*
    This 2-octet unsigned integer indicates the total length of the
    message, including the header in octets. Thus, it allows one
    to locate the (Marker field of the) next message in the TCP
    stream. The value of the Length field MUST always be at least
    19 and no greater than 4096, and MAY be further constrained,
    depending on the message type. "padding" of extra data after
    the message is not allowed. Therefore, the Length field MUST
    have the smallest value required, given the rest of the
    message.
    */
    let length = data.read_u16()? as usize;
    if length < BGP_HEADER_LEN {
        return Err(ParserError::ParseError(format!(
            "invalid BGP message length {length}"
        )));
    }

    let msg_type = data.read_u8()?;

    let body_len = length - BGP_HEADER_LEN;
    let body_len = body_len.min(data.remaining());
    let mut body = data.split_to(body_len);

    Ok(match msg_type {
        1 => BgpMessage::Open(parse_bgp_open_message(&mut body)?),
        2 => BgpMessage::Update(parse_bgp_update_message(&mut body, add_path, asn_len)?),
        3 => BgpMessage::Notification(parse_bgp_notification_message(&mut body)?),
        4 => BgpMessage::KeepAlive,
        v => return Err(ParserError::ParseError(format!("unknown BGP message type {v}"))),
    })
}

/// Parse a BGP NOTIFICATION message. Everything past the error code/subcode is carried as
/// opaque data; decoding the error itself never fails a session teardown.
pub fn parse_bgp_notification_message(data: &mut Bytes) -> Result<BgpNotificationMessage, ParserError> {
    let error_code = data.read_u8()?;
    let error_subcode = data.read_u8()?;
    let remaining = data.remaining();
    let payload = data.read_n_bytes(remaining)?;
    Ok(BgpNotificationMessage {
        error: BgpError::new(error_code, error_subcode),
        data: payload,
    })
}

/// Parse a BGP OPEN message, including its optional parameters and any embedded capabilities.
pub fn parse_bgp_open_message(data: &mut Bytes) -> Result<BgpOpenMessage, ParserError> {
    let version = data.read_u8()?;
    let asn = Asn::new_16bit(data.read_u16()?);
    let hold_time = data.read_u16()?;
    let sender_ip = data.read_ipv4_address()?;
    let opt_params_len = data.read_u8()? as usize;

    data.require_n_remaining(opt_params_len, "bgp open optional parameters")?;
    let mut opt_data = data.split_to(opt_params_len);

    let mut extended_length = false;
    let mut first = true;
    let mut opt_params: Vec<OptParam> = vec![];

    while opt_data.remaining() >= 2 {
        let param_type = opt_data.read_u8()?;
        if first {
            first = false;
            // RFC 9072: a first parameter of type 255 with a declared length of 255 signals
            // that all following optional parameters use a 2-byte length field.
            if opt_params_len == 255 && param_type == 255 {
                extended_length = true;
                break;
            }
        }

        let (param_len, value_len) = if extended_length {
            let len = opt_data.read_u16()?;
            (len, len as usize)
        } else {
            let len = opt_data.read_u8()? as u16;
            (len, len as usize)
        };

        opt_data.require_n_remaining(value_len, "bgp open parameter value")?;
        let mut value_data = opt_data.split_to(value_len);

        let param_value = match param_type {
            2 => {
                let code = value_data.read_u8()?;
                let value_len = value_data.read_u8()? as usize;
                let cap_data = value_data.split_to(value_data.remaining().min(value_len));
                ParamValue::Capability(parse_capability(code, cap_data)?)
            }
            _ => ParamValue::Raw(value_data.to_vec()),
        };

        opt_params.push(OptParam {
            param_type,
            param_len,
            param_value,
        });
    }

    Ok(BgpOpenMessage {
        version,
        asn,
        hold_time,
        sender_ip,
        extended_length,
        opt_params,
    })
}

fn parse_capability(code: u8, data: Bytes) -> Result<Capability, ParserError> {
    let ty = BgpCapabilityType::from(code);
    let value = match ty {
        BgpCapabilityType::MULTIPROTOCOL_EXTENSIONS_FOR_BGP_4 => {
            CapabilityValue::MultiprotocolExtensions(MultiprotocolExtensionsCapability::parse(data)?)
        }
        BgpCapabilityType::ROUTE_REFRESH_CAPABILITY_FOR_BGP_4 => {
            CapabilityValue::RouteRefresh(RouteRefreshCapability::parse(data)?)
        }
        BgpCapabilityType::EXTENDED_NEXT_HOP_ENCODING => {
            CapabilityValue::ExtendedNextHop(ExtendedNextHopCapability::parse(data)?)
        }
        BgpCapabilityType::GRACEFUL_RESTART_CAPABILITY => {
            CapabilityValue::GracefulRestart(GracefulRestartCapability::parse(data)?)
        }
        BgpCapabilityType::SUPPORT_FOR_4_OCTET_AS_NUMBER_CAPABILITY => {
            CapabilityValue::FourOctetAs(FourOctetAsCapability::parse(data)?)
        }
        BgpCapabilityType::ADD_PATH_CAPABILITY => CapabilityValue::AddPath(AddPathCapability::parse(data)?),
        BgpCapabilityType::BGP_ROLE => CapabilityValue::BgpRole(BgpRoleCapability::parse(data)?),
        _ => CapabilityValue::Raw(data.to_vec()),
    };
    Ok(Capability { ty, value })
}

/// Read a withdrawn/announced NLRI field of `length` bytes. A length of 0 or 1 means there's
/// nothing (or garbage) to read; seen in the wild from some broken exporters.
fn read_nlri(data: &mut Bytes, length: usize, afi: &Afi, add_path: bool) -> Result<Vec<NetworkPrefix>, ParserError> {
    if length == 0 {
        return Ok(vec![]);
    }
    if length == 1 {
        warn!("seeing strange one-byte NLRI field");
        data.advance(1);
        return Ok(vec![]);
    }

    data.require_n_remaining(length, "nlri field")?;
    let nlri_data = data.split_to(length);
    parse_nlri_list(nlri_data, add_path, afi)
}

/// Parse a BGP UPDATE message: withdrawn routes, path attributes, and announced routes.
///
/// Routes carried in [`AttributeValue::MpReachNlri`]/[`AttributeValue::MpUnreachNlri`] live
/// inside `attributes`, not in `withdrawn_prefixes`/`announced_prefixes` — see
/// [`crate::parser::Elementor::bgp_update_to_elems`] for reassembling the full route set.
pub fn parse_bgp_update_message(
    data: &mut Bytes,
    add_path: bool,
    asn_len: &AsnLength,
) -> Result<BgpUpdateMessage, ParserError> {
    // Withdrawn/announced routes outside of MP_(UN)REACH_NLRI are always IPv4.
    let afi = Afi::Ipv4;

    let withdrawn_length = data.read_u16()? as usize;
    let withdrawn_prefixes = read_nlri(data, withdrawn_length, &afi, add_path)?;

    let attribute_length = data.read_u16()? as usize;
    data.require_n_remaining(attribute_length, "bgp update attributes")?;
    let attr_data = data.split_to(attribute_length);
    let attributes = parse_attributes(attr_data, asn_len, add_path, None, None, None)?;

    let nlri_length = data.remaining();
    let announced_prefixes = read_nlri(data, nlri_length, &afi, add_path)?;

    Ok(BgpUpdateMessage {
        withdrawn_prefixes,
        attributes,
        announced_prefixes,
    })
}

/// Encode a single BGP message, including its RFC 4271 section 4.1 header.
///
/// `asn_len` governs the width of AS numbers inside path attributes (e.g. AS_PATH); the OPEN
/// message's own My Autonomous System field is always 2 bytes regardless.
pub fn encode_bgp_message(message: &BgpMessage, asn_len: AsnLength) -> Bytes {
    let (msg_type, body) = match message {
        BgpMessage::Open(open) => (1u8, encode_bgp_open_message(open)),
        BgpMessage::Update(update) => (2u8, encode_bgp_update_message(update, asn_len)),
        BgpMessage::Notification(notification) => {
            (3u8, encode_bgp_notification_message(notification))
        }
        BgpMessage::KeepAlive => (4u8, Bytes::new()),
    };

    let mut bytes = BytesMut::with_capacity(BGP_HEADER_LEN + body.len());
    bytes.put_slice(&[0xffu8; BGP_MARKER_LEN]);
    bytes.put_u16((BGP_HEADER_LEN + body.len()) as u16);
    bytes.put_u8(msg_type);
    bytes.put_slice(&body);
    bytes.freeze()
}

fn encode_bgp_notification_message(notification: &BgpNotificationMessage) -> Bytes {
    let (code, subcode) = bgp_error_codes(&notification.error);
    let mut bytes = BytesMut::with_capacity(2 + notification.data.len());
    bytes.put_u8(code);
    bytes.put_u8(subcode);
    bytes.put_slice(&notification.data);
    bytes.freeze()
}

fn bgp_error_codes(error: &BgpError) -> (u8, u8) {
    match error {
        BgpError::Reserved(subcode) => (0, *subcode),
        BgpError::MessageHeaderError(v) => (1, u8::from(*v)),
        BgpError::OpenError(v) => (2, u8::from(*v)),
        BgpError::UpdateError(v) => (3, u8::from(*v)),
        BgpError::HoldTimerExpired(subcode) => (4, *subcode),
        BgpError::FiniteStateMachineError(v) => (5, u8::from(*v)),
        BgpError::CeaseNotification(v) => (6, u8::from(*v)),
        BgpError::RouteFreshError(v) => (7, u8::from(*v)),
        BgpError::Unknown(code, subcode) => (*code, *subcode),
    }
}

/// Encode a BGP OPEN message. RFC 9072 extended-length optional parameters are not produced:
/// the writer side sticks to the single-byte parameter length that every real-world peer
/// understands, mirroring the limit the parser itself accepts above.
fn encode_bgp_open_message(open: &BgpOpenMessage) -> Bytes {
    let mut bytes = BytesMut::new();
    bytes.put_u8(open.version);
    bytes.put_u16(open.asn.to_u32() as u16);
    bytes.put_u16(open.hold_time);
    bytes.put_slice(&open.sender_ip.octets());

    let mut params = BytesMut::new();
    for param in &open.opt_params {
        let value = encode_param_value(&param.param_value);
        params.put_u8(param.param_type);
        params.put_u8(value.len() as u8);
        params.put_slice(&value);
    }
    bytes.put_u8(params.len() as u8);
    bytes.put_slice(&params);
    bytes.freeze()
}

fn encode_param_value(value: &ParamValue) -> Bytes {
    match value {
        ParamValue::Raw(bytes) => Bytes::copy_from_slice(bytes),
        ParamValue::Capability(cap) => {
            let value = encode_capability_value(&cap.value);
            let mut bytes = BytesMut::with_capacity(2 + value.len());
            bytes.put_u8(cap.ty.into());
            bytes.put_u8(value.len() as u8);
            bytes.put_slice(&value);
            bytes.freeze()
        }
    }
}

fn encode_capability_value(value: &CapabilityValue) -> Bytes {
    match value {
        CapabilityValue::Raw(bytes) => Bytes::copy_from_slice(bytes),
        CapabilityValue::MultiprotocolExtensions(c) => c.encode(),
        CapabilityValue::RouteRefresh(c) => c.encode(),
        CapabilityValue::ExtendedNextHop(c) => c.encode(),
        CapabilityValue::GracefulRestart(c) => c.encode(),
        CapabilityValue::FourOctetAs(c) => c.encode(),
        CapabilityValue::AddPath(c) => c.encode(),
        CapabilityValue::BgpRole(c) => c.encode(),
    }
}

fn encode_prefixes(prefixes: &[NetworkPrefix]) -> Bytes {
    let mut bytes = BytesMut::new();
    for prefix in prefixes {
        bytes.put_slice(&prefix.encode());
    }
    bytes.freeze()
}

/// Encode a BGP UPDATE message. Routes carried via MP_REACH_NLRI/MP_UNREACH_NLRI are encoded
/// as part of `attributes` and are not duplicated here.
fn encode_bgp_update_message(update: &BgpUpdateMessage, asn_len: AsnLength) -> Bytes {
    let mut bytes = BytesMut::new();

    let withdrawn = encode_prefixes(&update.withdrawn_prefixes);
    bytes.put_u16(withdrawn.len() as u16);
    bytes.put_slice(&withdrawn);

    let attributes = update.attributes.encode(asn_len);
    bytes.put_u16(attributes.len() as u16);
    bytes.put_slice(&attributes);

    bytes.put_slice(&encode_prefixes(&update.announced_prefixes));
    bytes.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn keepalive_bytes() -> Vec<u8> {
        let mut bytes = vec![0xffu8; BGP_MARKER_LEN];
        bytes.extend_from_slice(&19u16.to_be_bytes());
        bytes.push(4);
        bytes
    }

    #[test]
    fn parses_keepalive() {
        let mut data = Bytes::from(keepalive_bytes());
        let msg = parse_bgp_message(&mut data, false, &AsnLength::Bits32).unwrap();
        assert_eq!(msg.msg_type(), BgpMessageType::KEEPALIVE);
        assert!(data.is_empty());
    }

    #[test]
    fn parses_open_with_no_params() {
        let mut body = vec![4u8]; // version
        body.extend_from_slice(&100u16.to_be_bytes()); // asn
        body.extend_from_slice(&180u16.to_be_bytes()); // hold time
        body.extend_from_slice(&Ipv4Addr::new(10, 0, 0, 1).octets()); // sender ip
        body.push(0); // opt params len

        let mut bytes = vec![0xffu8; BGP_MARKER_LEN];
        bytes.extend_from_slice(&((BGP_HEADER_LEN + body.len()) as u16).to_be_bytes());
        bytes.push(1);
        bytes.extend_from_slice(&body);

        let mut data = Bytes::from(bytes);
        let msg = parse_bgp_message(&mut data, false, &AsnLength::Bits16).unwrap();
        match msg {
            BgpMessage::Open(open) => {
                assert_eq!(open.version, 4);
                assert_eq!(open.hold_time, 180);
                assert_eq!(open.sender_ip, Ipv4Addr::new(10, 0, 0, 1));
                assert!(open.opt_params.is_empty());
            }
            _ => panic!("expected open message"),
        }
    }

    #[test]
    fn parses_notification() {
        let mut body = vec![6u8, 4u8]; // CEASE, administratively reset
        body.extend_from_slice(b"bye");

        let mut bytes = vec![0xffu8; BGP_MARKER_LEN];
        bytes.extend_from_slice(&((BGP_HEADER_LEN + body.len()) as u16).to_be_bytes());
        bytes.push(3);
        bytes.extend_from_slice(&body);

        let mut data = Bytes::from(bytes);
        let msg = parse_bgp_message(&mut data, false, &AsnLength::Bits32).unwrap();
        match msg {
            BgpMessage::Notification(n) => assert_eq!(n.data, b"bye".to_vec()),
            _ => panic!("expected notification message"),
        }
    }

    #[test]
    fn rejects_short_length() {
        let mut bytes = vec![0xffu8; BGP_MARKER_LEN];
        bytes.extend_from_slice(&10u16.to_be_bytes());
        bytes.push(4);
        let mut data = Bytes::from(bytes);
        assert!(parse_bgp_message(&mut data, false, &AsnLength::Bits32).is_err());
    }

    #[test]
    fn encodes_keepalive() {
        let encoded = encode_bgp_message(&BgpMessage::KeepAlive, AsnLength::Bits32);
        assert_eq!(encoded, Bytes::from(keepalive_bytes()));
    }

    #[test]
    fn round_trips_open_message() {
        let open = BgpOpenMessage {
            version: 4,
            asn: Asn::new_16bit(65000),
            hold_time: 180,
            sender_ip: Ipv4Addr::new(10, 0, 0, 1),
            extended_length: false,
            opt_params: vec![],
        };
        let mut encoded = encode_bgp_message(&BgpMessage::Open(open.clone()), AsnLength::Bits16);
        let decoded = parse_bgp_message(&mut encoded, false, &AsnLength::Bits16).unwrap();
        match decoded {
            BgpMessage::Open(decoded_open) => assert_eq!(decoded_open, open),
            _ => panic!("expected open message"),
        }
    }

    #[test]
    fn round_trips_notification_message() {
        let notification = BgpNotificationMessage {
            error: BgpError::new(6, 4),
            data: b"reset".to_vec(),
        };
        let mut encoded = encode_bgp_message(
            &BgpMessage::Notification(notification.clone()),
            AsnLength::Bits32,
        );
        let decoded = parse_bgp_message(&mut encoded, false, &AsnLength::Bits32).unwrap();
        match decoded {
            BgpMessage::Notification(decoded_notification) => {
                assert_eq!(decoded_notification, notification)
            }
            _ => panic!("expected notification message"),
        }
    }
}
