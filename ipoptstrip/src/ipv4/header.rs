use byteorder::{ByteOrder, NetworkEndian};

use super::Ipv4Addr;
use crate::checksum_utils;

header_field_val_accessors! {
    (ver_ihl, ver_ihl_mut, 0),
}

header_field_range_accessors! {
    (length, length_mut, 2..4),
    (checksum, checksum_mut, 10..12),
    (source_ip, source_ip_mut, 12..16),
    (dest_ip, dest_ip_mut, 16..20),
}

/// A constant that defines the fixed byte length of the Ipv4 protocol header.
pub const IPV4_HEADER_LEN: usize = 20;

/// Maximum length of the Ipv4 header with options.
pub const IPV4_HEADER_LEN_MAX: usize = 60;

/// A fixed Ipv4 header.
pub const IPV4_HEADER_TEMPLATE: [u8; 20] = [
    0x45, 0x00, 0x00, 0x14, 0x00, 0x00, 0x40, 0x00, 0x40, 0x11, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00,
];

/// A view over an Ipv4 header.
///
/// Only the fields that option stripping reads or writes get accessors.
#[derive(Clone, Copy, Debug)]
pub struct Ipv4Header<T> {
    buf: T,
}

impl<T: AsRef<[u8]>> Ipv4Header<T> {
    /// Wrap `buf` if it holds at least the fixed 20-byte header.
    #[inline]
    pub fn new(buf: T) -> Result<Self, T> {
        if buf.as_ref().len() >= IPV4_HEADER_LEN {
            Ok(Self { buf })
        } else {
            Err(buf)
        }
    }

    /// Wrap `buf` without a length check.
    #[inline]
    pub fn new_unchecked(buf: T) -> Self {
        Self { buf }
    }

    /// Give back the wrapped buffer.
    #[inline]
    pub fn release(self) -> T {
        self.buf
    }

    /// The fixed 20 header bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf.as_ref()[0..IPV4_HEADER_LEN]
    }

    /// The version field, 4 for Ipv4.
    #[inline]
    pub fn version(&self) -> u8 {
        *ver_ihl(self.buf.as_ref()) >> 4
    }

    /// The raw IHL field, counted in 32-bit words.
    #[inline]
    pub fn header_len_words(&self) -> u8 {
        *ver_ihl(self.buf.as_ref()) & 0x0f
    }

    /// The header length in bytes.
    #[inline]
    pub fn header_len(&self) -> u8 {
        self.header_len_words() << 2
    }

    /// The total length field.
    #[inline]
    pub fn packet_len(&self) -> u16 {
        NetworkEndian::read_u16(length(self.buf.as_ref()))
    }

    /// The header checksum field.
    #[inline]
    pub fn checksum(&self) -> u16 {
        NetworkEndian::read_u16(checksum(self.buf.as_ref()))
    }

    /// The source address.
    #[inline]
    pub fn src_addr(&self) -> Ipv4Addr {
        Ipv4Addr::from(NetworkEndian::read_u32(source_ip(self.buf.as_ref())))
    }

    /// The destination address.
    #[inline]
    pub fn dst_addr(&self) -> Ipv4Addr {
        Ipv4Addr::from(NetworkEndian::read_u32(dest_ip(self.buf.as_ref())))
    }

    /// The option bytes between the fixed header and `header_len`.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is shorter than `header_len`, or if the IHL is
    /// below 5 words.
    #[inline]
    pub fn option_bytes(&self) -> &[u8] {
        let header_len = usize::from(self.header_len());
        &self.buf.as_ref()[IPV4_HEADER_LEN..header_len]
    }

    /// Whether the checksum of the fixed 20-byte header is correct.
    #[inline]
    pub fn verify_checksum(&self) -> bool {
        checksum_utils::verify(self.as_bytes())
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Ipv4Header<T> {
    /// Set the header length in bytes.
    #[inline]
    pub fn set_header_len(&mut self, value: u8) {
        assert!(value >= 20 && value <= 60 && value & 0x03 == 0);
        let data = ver_ihl_mut(self.buf.as_mut());
        *data = (*data & 0xf0) | (value >> 2);
    }

    /// Set the total length field.
    #[inline]
    pub fn set_packet_len(&mut self, value: u16) {
        NetworkEndian::write_u16(length_mut(self.buf.as_mut()), value);
    }

    /// Set the header checksum field.
    #[inline]
    pub fn set_checksum(&mut self, value: u16) {
        NetworkEndian::write_u16(checksum_mut(self.buf.as_mut()), value);
    }

    /// Set the source address.
    #[inline]
    pub fn set_src_addr(&mut self, value: Ipv4Addr) {
        source_ip_mut(self.buf.as_mut()).copy_from_slice(&value.octets());
    }

    /// Set the destination address.
    #[inline]
    pub fn set_dst_addr(&mut self, value: Ipv4Addr) {
        dest_ip_mut(self.buf.as_mut()).copy_from_slice(&value.octets());
    }

    /// Recompute the checksum over the fixed 20-byte header and store it.
    ///
    /// Option bytes, if any, are not covered.
    #[inline]
    pub fn fill_checksum(&mut self) {
        self.set_checksum(0);
        let value = checksum_utils::checksum(self.as_bytes());
        self.set_checksum(value);
    }
}
