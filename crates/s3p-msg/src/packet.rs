//! Packet header, type codes and the frame build/parse entry points.
//!
//! A packet is `header (6) || data || crc (2)`, all big-endian; a frame
//! is the COBS encoding of the packet followed by the `0x00` delimiter.

use binrw::io::Cursor;
use binrw::prelude::*;
use modular_bitfield::prelude::*;

use s3p_frame::{COBS_DELIM, MAX_DATA_SIZE, MAX_FRAME_SIZE, cobs, crc16};

use crate::error::S3pMsgError;

/// Packet header size in bytes.
pub const PKT_HEADER_SIZE: usize = 6;
/// Header plus CRC: the minimum decodable packet.
pub const PKT_OVERHEAD: usize = PKT_HEADER_SIZE + 2;

/// S3P request/response type codes.
///
/// Requests carry an even code; the matching response is request + 1.
#[binrw]
#[brw(repr(u8))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PacketType {
    /// Exec command request.
    ExecCmd = 0x10,
    /// Exec command response.
    ExecCmdResp = 0x11,
    /// Read reg(s) request.
    ReadRegs = 0x12,
    /// Read reg(s) response.
    ReadRegsResp = 0x13,
    /// Write reg request.
    WriteReg = 0x14,
    /// Write reg response.
    WriteRegResp = 0x15,
    /// VMEM read request.
    ReadVmem = 0x16,
    /// VMEM read response.
    ReadVmemResp = 0x17,
    /// VMEM write request.
    WriteVmem = 0x18,
    /// VMEM write response.
    WriteVmemResp = 0x19,
    /// Read string reg request.
    ReadStrReg = 0x1A,
    /// Read string reg response.
    ReadStrRegResp = 0x1B,
    /// Write string reg request.
    WriteStrReg = 0x1C,
    /// Write string reg response.
    WriteStrRegResp = 0x1D,
    /// Version, register and VMEM table information request.
    S3pInfo = 0x30,
    /// Version, register and VMEM table information response.
    S3pInfoResp = 0x31,
    /// Reg information request.
    RegInfo = 0x32,
    /// Reg information response.
    RegInfoResp = 0x33,
    /// VMEM mapping entry request.
    VmemInfo = 0x34,
    /// VMEM mapping entry response.
    VmemInfoResp = 0x35,
}

impl PacketType {
    /// Whether this code is a request (even low bit).
    pub fn is_request(self) -> bool {
        (self as u8) & 1 == 0
    }

    /// The response code paired with this request, `None` for responses.
    pub fn response_twin(self) -> Option<PacketType> {
        Some(match self {
            Self::ExecCmd => Self::ExecCmdResp,
            Self::ReadRegs => Self::ReadRegsResp,
            Self::WriteReg => Self::WriteRegResp,
            Self::ReadVmem => Self::ReadVmemResp,
            Self::WriteVmem => Self::WriteVmemResp,
            Self::ReadStrReg => Self::ReadStrRegResp,
            Self::WriteStrReg => Self::WriteStrRegResp,
            Self::S3pInfo => Self::S3pInfoResp,
            Self::RegInfo => Self::RegInfoResp,
            Self::VmemInfo => Self::VmemInfoResp,
            _ => return None,
        })
    }
}

impl std::fmt::Display for PacketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ExecCmd => "Exec Cmd",
            Self::ExecCmdResp => "Exec Cmd Response",
            Self::ReadRegs => "Read Regs",
            Self::ReadRegsResp => "Read Regs Response",
            Self::WriteReg => "Write Reg",
            Self::WriteRegResp => "Write Reg Response",
            Self::ReadVmem => "Read VMEM",
            Self::ReadVmemResp => "Read VMEM Response",
            Self::WriteVmem => "Write VMEM",
            Self::WriteVmemResp => "Write VMEM Response",
            Self::ReadStrReg => "Read Str Reg",
            Self::ReadStrRegResp => "Read Str Reg Response",
            Self::WriteStrReg => "Write Str Reg",
            Self::WriteStrRegResp => "Write Str Reg Response",
            Self::S3pInfo => "S3P Info",
            Self::S3pInfoResp => "S3P Info Response",
            Self::RegInfo => "Reg Info",
            Self::RegInfoResp => "Reg Info Response",
            Self::VmemInfo => "VMEM Info",
            Self::VmemInfoResp => "VMEM Info Response",
        };
        write!(f, "{} ({:#04x})", name, *self as u8)
    }
}

/// The packed flags/sequence header byte.
///
/// The low nibble is the 4-bit wrapping sequence; the high nibble is
/// reserved, written as zero and ignored on receive.
#[bitfield]
#[derive(Clone, Copy, Debug, PartialEq, Eq, BinRead, BinWrite)]
#[br(map = Self::from_bytes)]
#[bw(map = |&x| Self::into_bytes(x))]
pub struct FlagsSeq {
    pub seq: B4,
    pub reserved: B4,
}

impl FlagsSeq {
    /// A flags/seq byte carrying `seq` with the reserved nibble clear.
    pub fn with_sequence(seq: u8) -> FlagsSeq {
        FlagsSeq::new().with_seq(seq & 0x0F)
    }
}

/// A decoded S3P packet.
#[binrw]
#[brw(big)]
#[derive(Clone, Debug, PartialEq)]
pub struct Packet {
    /// Source node id. `0x00` and `0xFF` are reserved.
    pub src_id: u8,
    /// Destination node id. `0x00` and `0xFF` are reserved.
    pub dst_id: u8,
    /// Flags (reserved) and sequence.
    pub flags_seq: FlagsSeq,
    /// Request/response type.
    pub ptype: PacketType,

    #[bw(try_calc = data.len().try_into())]
    #[br(temp, assert(data_len as usize <= MAX_DATA_SIZE))]
    data_len: u16,

    /// Payload.
    #[br(count = data_len)]
    pub data: Vec<u8>,
}

impl Packet {
    /// Builds a packet with the reserved flags nibble clear.
    pub fn new(src_id: u8, dst_id: u8, seq: u8, ptype: PacketType, data: Vec<u8>) -> Packet {
        Packet {
            src_id,
            dst_id,
            flags_seq: FlagsSeq::with_sequence(seq),
            ptype,
            data,
        }
    }

    /// The 4-bit sequence number.
    pub fn seq(&self) -> u8 {
        self.flags_seq.seq()
    }
}

/// Encodes `pkt` into a wire frame: header + payload + big-endian CRC,
/// COBS-stuffed, with the trailing delimiter appended.
pub fn make_frame(pkt: &Packet) -> crate::Result<Vec<u8>> {
    if pkt.data.len() > MAX_DATA_SIZE {
        return Err(S3pMsgError::PayloadTooLarge {
            len: pkt.data.len(),
        });
    }

    let mut cursor = Cursor::new(Vec::with_capacity(PKT_OVERHEAD + pkt.data.len()));
    pkt.write(&mut cursor)?;
    let mut body = cursor.into_inner();

    let crc = crc16(&body);
    body.extend_from_slice(&crc.to_be_bytes());

    let mut frame = cobs::encode_vec(&body);
    frame.push(COBS_DELIM);
    if frame.len() > MAX_FRAME_SIZE {
        return Err(S3pMsgError::FrameTooLarge { len: frame.len() });
    }
    Ok(frame)
}

/// Parses a received frame, with the trailing delimiter already
/// stripped by the transport.
///
/// Verifies the CRC, the payload length and the destination id; a frame
/// addressed elsewhere fails with
/// [`NotForUs`][S3pMsgError::NotForUs] and must be discarded silently.
pub fn parse_frame(frame: &[u8], expected_dst_id: u8) -> crate::Result<Packet> {
    let decoded = cobs::decode_vec(frame)?;
    if decoded.len() < PKT_OVERHEAD {
        return Err(S3pMsgError::FrameTooShort { len: decoded.len() });
    }

    let (body, crc_bytes) = decoded.split_at(decoded.len() - 2);
    let received = u16::from_be_bytes([crc_bytes[0], crc_bytes[1]]);
    let computed = crc16(body);
    if received != computed {
        return Err(S3pMsgError::CrcMismatch { received, computed });
    }

    let pkt = Packet::read(&mut Cursor::new(body))?;
    if PKT_HEADER_SIZE + pkt.data.len() != body.len() {
        return Err(S3pMsgError::LengthMismatch {
            header: pkt.data.len(),
            actual: body.len() - PKT_HEADER_SIZE,
        });
    }

    if pkt.dst_id != expected_dst_id {
        return Err(S3pMsgError::NotForUs {
            dst_id: pkt.dst_id,
            expected: expected_dst_id,
        });
    }

    Ok(pkt)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn type_twins() {
        assert_eq!(
            PacketType::ExecCmd.response_twin(),
            Some(PacketType::ExecCmdResp)
        );
        assert_eq!(
            PacketType::VmemInfo.response_twin(),
            Some(PacketType::VmemInfoResp)
        );
        assert_eq!(PacketType::ReadRegsResp.response_twin(), None);
        assert!(PacketType::S3pInfo.is_request());
        assert!(!PacketType::S3pInfoResp.is_request());
    }

    #[test]
    fn ping_frame_roundtrip() {
        // EXEC_CMD from manager 0x6A to node 0x2A, seq 1, PING + u32 arg.
        let pkt = Packet::new(
            0x6A,
            0x2A,
            1,
            PacketType::ExecCmd,
            vec![0x10, 0x00, 0x00, 0x00, 0x00],
        );
        let frame = make_frame(&pkt).unwrap();
        assert_eq!(*frame.last().unwrap(), COBS_DELIM);
        assert!(!frame[..frame.len() - 1].contains(&COBS_DELIM));

        // The pre-CRC image is the documented header + data bytes.
        let body = cobs::decode_vec(&frame[..frame.len() - 1]).unwrap();
        assert_eq!(
            &body[..11],
            &[0x6A, 0x2A, 0x01, 0x10, 0x00, 0x05, 0x10, 0x00, 0x00, 0x00, 0x00]
        );

        let parsed = parse_frame(&frame[..frame.len() - 1], 0x2A).unwrap();
        assert_eq!(parsed, pkt);
        assert_eq!(parsed.seq(), 1);
    }

    #[test]
    fn wrong_destination_is_reported() {
        let pkt = Packet::new(0x6A, 0x2A, 3, PacketType::S3pInfo, vec![]);
        let frame = make_frame(&pkt).unwrap();
        let err = parse_frame(&frame[..frame.len() - 1], 0x6A).unwrap_err();
        assert!(matches!(
            err,
            S3pMsgError::NotForUs {
                dst_id: 0x2A,
                expected: 0x6A
            }
        ));
    }

    #[test]
    fn bit_flips_are_detected() {
        let pkt = Packet::new(
            0x6A,
            0x2A,
            7,
            PacketType::ReadRegs,
            vec![0x00, 0x2A, 0x00, 0x01],
        );
        let frame = make_frame(&pkt).unwrap();
        let body = cobs::decode_vec(&frame[..frame.len() - 1]).unwrap();

        // A single-bit error anywhere in header, payload or trailer is
        // always caught: the CRC check runs before any field is trusted.
        for byte in 0..body.len() {
            for bit in 0..8 {
                let mut corrupted = body.clone();
                corrupted[byte] ^= 1 << bit;
                let reframed = cobs::encode_vec(&corrupted);
                assert!(
                    parse_frame(&reframed, 0x2A).is_err(),
                    "bit {bit} of byte {byte} slipped through"
                );
            }
        }
    }

    #[test]
    fn oversize_payload_rejected_locally() {
        let pkt = Packet::new(
            0x6A,
            0x2A,
            0,
            PacketType::WriteVmem,
            vec![0u8; MAX_DATA_SIZE + 1],
        );
        assert!(matches!(
            make_frame(&pkt),
            Err(S3pMsgError::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn max_payload_fits_frame_budget() {
        let pkt = Packet::new(
            0x6A,
            0x2A,
            0,
            PacketType::WriteVmem,
            vec![0xA5; MAX_DATA_SIZE],
        );
        let frame = make_frame(&pkt).unwrap();
        assert!(frame.len() <= MAX_FRAME_SIZE);
    }

    #[test]
    fn truncated_packet_rejected() {
        let short = cobs::encode_vec(&[0x6A, 0x2A, 0x01]);
        assert!(matches!(
            parse_frame(&short, 0x2A),
            Err(S3pMsgError::FrameTooShort { .. })
        ));
    }

    #[test]
    fn reserved_nibble_ignored_on_receive() {
        let pkt = Packet::new(0x6A, 0x2A, 5, PacketType::S3pInfo, vec![]);
        let frame = make_frame(&pkt).unwrap();
        let mut body = cobs::decode_vec(&frame[..frame.len() - 1]).unwrap();
        // Set the reserved nibble and refresh the CRC.
        body[2] |= 0xA0;
        let crc_at = body.len() - 2;
        let crc = crc16(&body[..crc_at]);
        body[crc_at..].copy_from_slice(&crc.to_be_bytes());

        let reframed = cobs::encode_vec(&body);
        let parsed = parse_frame(&reframed, 0x2A).unwrap();
        assert_eq!(parsed.seq(), 5);
        assert_eq!(parsed.flags_seq.reserved(), 0x0A);
    }

    proptest! {
        #[test]
        fn frame_roundtrip(
            src_id in 1u8..=254,
            dst_id in 1u8..=254,
            seq in 0u8..16,
            data in proptest::collection::vec(any::<u8>(), 0..64),
        ) {
            let pkt = Packet::new(src_id, dst_id, seq, PacketType::ExecCmd, data);
            let frame = make_frame(&pkt).unwrap();
            prop_assert!(frame.len() <= MAX_FRAME_SIZE);
            prop_assert_eq!(*frame.last().unwrap(), COBS_DELIM);
            prop_assert!(!frame[..frame.len() - 1].contains(&COBS_DELIM));
            let parsed = parse_frame(&frame[..frame.len() - 1], dst_id).unwrap();
            prop_assert_eq!(parsed, pkt);
        }
    }
}
