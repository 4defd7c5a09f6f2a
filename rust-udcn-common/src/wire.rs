//! ICN packet framing: fixed header, name, and the component-offsets TLV.
//!
//! Wire layout, all fields big-endian:
//!
//! ```text
//! offset  size  field
//!      0     2  type        (0 = Interest, 1 = Data, 2 = Control)
//!      2     2  pkt_len     (total length of header + name + TLVs)
//!      4     1  hop_limit
//!      5     2  flags       (reserved, round-tripped but not interpreted)
//!      7     2  hdr_len     (length of this fixed header, 11)
//!      9     2  name_len
//!     11     N  name bytes
//!   11+N     M  TLVs (tag u16, length u16, value), optional
//! ```
//!
//! The only TLV this implementation produces or understands is tag
//! `0x0001`, whose value is the component-offsets array encoded as
//! big-endian `u16`s (see [`crate::name::ComponentOffsets`]). It lets a
//! receiver skip re-scanning the name for separators; when it is absent
//! or truncated we fall back to scanning the name ourselves.

use crate::error::Error;
use crate::name::{self, ComponentOffsets, MAX_NAME_COMPONENTS, MAX_NAME_LEN};
use bytes::{Buf, BufMut, BytesMut};

pub const ICN_HDR_LEN: usize = 11;
pub const TAG_COMPONENT_OFFSETS: u16 = 0x0001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum PacketType {
    Interest = 0,
    Data = 1,
    Control = 2,
}

impl PacketType {
    fn from_u16(v: u16) -> Option<Self> {
        match v {
            0 => Some(Self::Interest),
            1 => Some(Self::Data),
            2 => Some(Self::Control),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IcnHeader {
    pub packet_type: u16,
    pub pkt_len: u16,
    pub hop_limit: u8,
    pub flags: u16,
    pub hdr_len: u16,
}

/// A packet as seen by the forwarding engine: the fixed header plus a
/// borrowed view of the name and its component offsets. Never allocates.
#[derive(Debug)]
pub struct ParsedPacket<'a> {
    pub header: IcnHeader,
    pub name: &'a [u8],
    pub component_offsets: [u16; MAX_NAME_COMPONENTS],
    pub component_count: usize,
    /// Set when the component-offsets TLV was missing, malformed, or cut
    /// short; offsets were recomputed locally by scanning `name`.
    pub truncated: bool,
}

impl<'a> ParsedPacket<'a> {
    pub fn packet_type(&self) -> Option<PacketType> {
        PacketType::from_u16(self.header.packet_type)
    }
}

/// Parses an ICN packet out of `buf`. Never allocates or copies the name;
/// `buf` must outlive the returned [`ParsedPacket`].
pub fn parse(buf: &[u8]) -> Result<ParsedPacket<'_>, Error> {
    if buf.len() < ICN_HDR_LEN {
        return Err(Error::Wire(format!(
            "packet of {} bytes is shorter than the {}-byte header",
            buf.len(),
            ICN_HDR_LEN
        )));
    }
    let mut cursor = buf;
    let packet_type = cursor.get_u16();
    let pkt_len = cursor.get_u16();
    let hop_limit = cursor.get_u8();
    let flags = cursor.get_u16();
    let hdr_len = cursor.get_u16();
    let name_len = cursor.get_u16() as usize;

    let header = IcnHeader {
        packet_type,
        pkt_len,
        hop_limit,
        flags,
        hdr_len,
    };

    let available = cursor.remaining();
    let captured_len = name_len.min(available).min(MAX_NAME_LEN);
    let name = &cursor[..captured_len];
    let mut truncated = name_len > captured_len;
    cursor.advance(name_len.min(available));

    let (component_offsets, component_count) = if !truncated && cursor.remaining() >= 4 {
        let tag = cursor.get_u16();
        let tlv_len = cursor.get_u16() as usize;
        if tag == TAG_COMPONENT_OFFSETS && cursor.remaining() >= tlv_len && tlv_len % 2 == 0 {
            let mut offsets = [0u16; MAX_NAME_COMPONENTS];
            let mut count = 0usize;
            let mut value = &cursor[..tlv_len];
            while value.remaining() >= 2 && count < MAX_NAME_COMPONENTS {
                offsets[count] = value.get_u16();
                count += 1;
            }
            (offsets, count)
        } else {
            truncated = true;
            let offs = name::component_offsets(name);
            (offs.offsets, offs.count)
        }
    } else {
        if cursor.remaining() > 0 {
            truncated = true;
        }
        let offs = name::component_offsets(name);
        (offs.offsets, offs.count)
    };

    Ok(ParsedPacket {
        header,
        name,
        component_offsets,
        component_count,
        truncated,
    })
}

fn encode_header_and_name(
    packet_type: PacketType,
    hop_limit: u8,
    name: &[u8],
    extra_len: usize,
) -> BytesMut {
    let mut buf = BytesMut::with_capacity(ICN_HDR_LEN + name.len() + extra_len);
    let pkt_len = ICN_HDR_LEN + name.len() + extra_len;
    buf.put_u16(packet_type as u16);
    buf.put_u16(pkt_len as u16);
    buf.put_u8(hop_limit);
    buf.put_u16(0); // flags, reserved
    buf.put_u16(ICN_HDR_LEN as u16);
    buf.put_u16(name.len() as u16);
    buf.put_slice(name);
    buf
}

/// Encodes an Interest or Data packet carrying `name`, with the
/// component-offsets TLV appended so a receiver need not rescan.
pub fn encode_with_offsets(
    packet_type: PacketType,
    hop_limit: u8,
    name: &[u8],
    offsets: &ComponentOffsets,
) -> Vec<u8> {
    let tlv_value_len = offsets.count * 2;
    let mut buf = encode_header_and_name(packet_type, hop_limit, name, 4 + tlv_value_len);
    buf.put_u16(TAG_COMPONENT_OFFSETS);
    buf.put_u16(tlv_value_len as u16);
    for i in 0..offsets.count {
        buf.put_u16(offsets.offsets[i]);
    }
    buf.to_vec()
}

/// Encodes a Control packet: no TLV, the name carries the `VERB:prefix:face`
/// command text, matching `original_source/src/util/fib_control.c`.
pub fn encode_control(hop_limit: u8, command: &[u8]) -> Vec<u8> {
    encode_header_and_name(PacketType::Control, hop_limit, command, 0).to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::Name;

    #[test]
    fn round_trips_a_control_packet() {
        let wire = encode_control(10, b"ADD:/a/b:2");
        let parsed = parse(&wire).unwrap();
        assert_eq!(parsed.packet_type(), Some(PacketType::Control));
        assert_eq!(parsed.name, b"ADD:/a/b:2");
    }

    #[test]
    fn round_trips_an_interest_with_offsets_tlv() {
        let name = Name::parse("/a/b").unwrap();
        let offsets = name.component_offsets();
        let wire = encode_with_offsets(PacketType::Interest, 32, name.as_bytes(), &offsets);
        let parsed = parse(&wire).unwrap();
        assert!(!parsed.truncated);
        assert_eq!(parsed.component_count, 2);
        assert_eq!(parsed.component_offsets[0], 1);
        assert_eq!(parsed.component_offsets[1], 3);
    }

    #[test]
    fn falls_back_to_scanning_when_tlv_absent() {
        let name = Name::parse("/a/b/c").unwrap();
        let wire = encode_header_and_name(PacketType::Interest, 32, name.as_bytes(), 0);
        let parsed = parse(&wire).unwrap();
        assert!(parsed.truncated);
        assert_eq!(parsed.component_count, 3);
    }

    #[test]
    fn rejects_buffers_shorter_than_the_fixed_header() {
        assert!(parse(&[0u8; 4]).is_err());
    }
}
