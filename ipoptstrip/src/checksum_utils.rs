//! Provide utility functions for calculating the IPv4 header checksum.

use byteorder::{ByteOrder, NetworkEndian};

/// Compute an RFC 1071 compliant checksum (without the final complement).
///
/// The summing loop follows smoltcp::wire::ip::checksum::data.
pub fn from_slice(mut data: &[u8]) -> u16 {
    let mut accum = 0;

    // For each 32-byte chunk...
    const CHUNK_SIZE: usize = 32;
    while data.len() >= CHUNK_SIZE {
        let mut d = &data[..CHUNK_SIZE];
        // ... take by 2 bytes and sum them.
        while d.len() >= 2 {
            accum += NetworkEndian::read_u16(d) as u32;
            d = &d[2..];
        }

        data = &data[CHUNK_SIZE..];
    }

    // Sum the rest that does not fit the last 32-byte chunk,
    // taking by 2 bytes.
    while data.len() >= 2 {
        accum += NetworkEndian::read_u16(data) as u32;
        data = &data[2..];
    }

    // Add the last remaining odd byte, if any.
    if let Some(&value) = data.first() {
        accum += (value as u32) << 8;
    }

    propagate_carries(accum)
}

/// Compute the value to store in a checksum field.
///
/// The checksum field inside `data` must be zero when this is called.
#[inline]
pub fn checksum(data: &[u8]) -> u16 {
    !from_slice(data)
}

/// Check a block that already carries its checksum field.
#[inline]
pub fn verify(data: &[u8]) -> bool {
    from_slice(data) == !0
}

fn propagate_carries(word: u32) -> u16 {
    let sum = (word >> 16) + (word & 0xffff);
    ((sum >> 16) as u16) + (sum as u16)
}
