use crate::models::{AsnLength, Bgp4Mp, Bgp4MpType, MrtMessage, TableDumpV2Message};
use crate::parser::{parse_bgp4mp, parse_table_dump_message, parse_table_dump_v2_message};
use crate::ParserError;
use bytes::Bytes;

pub(crate) mod bgp4mp;
pub(crate) mod table_dump;
pub(crate) mod table_dump_v2_message;

impl MrtMessage {
    pub fn encode(&self, sub_type: u16) -> Bytes {
        let msg_bytes: Bytes = match self {
            MrtMessage::TableDumpMessage(m) => m.encode(),
            MrtMessage::TableDumpV2Message(m) => match m {
                TableDumpV2Message::PeerIndexTable(t) => t.encode(),
                TableDumpV2Message::RibAfi(e) => e.encode(),
                TableDumpV2Message::RibGeneric(_) => {
                    Bytes::new() // generic RIB entries are never produced by the RIB encoder
                }
                TableDumpV2Message::GeoPeerTable(t) => t.encode(),
            },
            MrtMessage::Bgp4Mp(m) => {
                let msg_type = Bgp4MpType::try_from(sub_type).unwrap();
                let asn_len = match matches!(
                    msg_type,
                    Bgp4MpType::MessageAs4
                        | Bgp4MpType::MessageAs4Addpath
                        | Bgp4MpType::MessageLocalAs4Addpath
                        | Bgp4MpType::MessageAs4Local
                ) {
                    true => AsnLength::Bits32,
                    false => AsnLength::Bits16,
                };

                match m {
                    Bgp4Mp::StateChange(msg) => {
                        let asn_len = match matches!(msg_type, Bgp4MpType::StateChangeAs4) {
                            true => AsnLength::Bits32,
                            false => AsnLength::Bits16,
                        };
                        msg.encode(asn_len)
                    }
                    Bgp4Mp::Message(msg) => msg.encode(asn_len),
                }
            }
        };

        msg_bytes
    }
}
