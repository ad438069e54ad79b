//! CRC-16/CCITT with the 0x1D0F start value.
//!
//! Polynomial 0x1021, MSB first, no input or output reflection, no final
//! XOR: the AUG-CCITT (SPI-FUJITSU) parameterization. The checksum covers
//! packet header plus payload and rides the wire big-endian.

use crc::{CRC_16_SPI_FUJITSU, Crc};

/// The CRC algorithm instance used for every S3P packet.
pub const CRC16_AUG_CCITT: Crc<u16> = Crc::<u16>::new(&CRC_16_SPI_FUJITSU);

/// Computes the packet checksum over `data`.
pub fn crc16(data: &[u8]) -> u16 {
    CRC16_AUG_CCITT.checksum(data)
}
