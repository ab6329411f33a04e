use crate::models::{Afi, AsnLength, Peer, PeerIndexTable, PeerType};
use crate::parser::ReadUtils;
use crate::ParserError;
use bytes::{BufMut, Bytes, BytesMut};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};

/// Peer index table
///
/// RFC: https://www.rfc-editor.org/rfc/rfc6396#section-4.3.1
pub fn parse_peer_index_table(data: &mut Bytes) -> Result<PeerIndexTable, ParserError> {
    let collector_bgp_id = Ipv4Addr::from(data.read_u32()?);
    let view_name_length = data.read_u16()?;
    let view_name =
        String::from_utf8(data.read_n_bytes(view_name_length as usize)?).unwrap_or("".to_string());

    let peer_count = data.read_u16()?;
    let mut peers = vec![];
    for _index in 0..peer_count {
        let peer_type = PeerType::from_bits_retain(data.read_u8()?);
        let afi = match peer_type.contains(PeerType::ADDRESS_FAMILY_IPV6) {
            true => Afi::Ipv6,
            false => Afi::Ipv4,
        };
        let asn_len = match peer_type.contains(PeerType::AS_SIZE_32BIT) {
            true => AsnLength::Bits32,
            false => AsnLength::Bits16,
        };

        let peer_bgp_id = Ipv4Addr::from(data.read_u32()?);
        let peer_ip: IpAddr = data.read_address(&afi)?;
        let peer_asn = data.read_asn(&asn_len)?;
        peers.push(Peer {
            peer_type,
            peer_bgp_id,
            peer_ip,
            peer_asn,
        })
    }

    let mut id_peer_map = HashMap::new();
    let mut peer_ip_id_map = HashMap::new();

    for (id, p) in peers.into_iter().enumerate() {
        let id = id as u16;
        peer_ip_id_map.insert(p.peer_ip, id);
        id_peer_map.insert(id, p);
    }

    Ok(PeerIndexTable {
        collector_bgp_id,
        view_name,
        id_peer_map,
        peer_ip_id_map,
    })
}

impl PeerIndexTable {
    /// Add peer to peer index table and return its id, reusing an existing entry if the
    /// peer's IP address is already indexed.
    pub fn add_peer(&mut self, peer: Peer) -> u16 {
        match self.peer_ip_id_map.get(&peer.peer_ip) {
            Some(id) => *id,
            None => {
                let peer_id = self.id_peer_map.len() as u16;
                self.peer_ip_id_map.insert(peer.peer_ip, peer_id);
                self.id_peer_map.insert(peer_id, peer);
                peer_id
            }
        }
    }

    /// Get peer by id
    pub fn get_peer_by_id(&self, peer_id: &u16) -> Option<&Peer> {
        self.id_peer_map.get(peer_id)
    }

    /// Get peer id by IP address.
    pub fn get_peer_id_by_addr(&self, peer_addr: &IpAddr) -> Option<u16> {
        self.peer_ip_id_map.get(peer_addr).copied()
    }

    pub fn encode(&self) -> Bytes {
        let mut bytes = BytesMut::new();
        bytes.put_u32(u32::from(self.collector_bgp_id));
        bytes.put_u16(self.view_name.len() as u16);
        bytes.put_slice(self.view_name.as_bytes());

        let mut ids: Vec<&u16> = self.id_peer_map.keys().collect();
        ids.sort();
        bytes.put_u16(ids.len() as u16);
        for id in ids {
            let peer = &self.id_peer_map[id];
            bytes.put_u8(peer.peer_type.bits());
            bytes.put_u32(u32::from(peer.peer_bgp_id));
            match peer.peer_ip {
                IpAddr::V4(ip) => bytes.put_slice(&ip.octets()),
                IpAddr::V6(ip) => bytes.put_slice(&ip.octets()),
            }
            bytes.put_slice(&peer.peer_asn.encode());
        }
        bytes.freeze()
    }
}
