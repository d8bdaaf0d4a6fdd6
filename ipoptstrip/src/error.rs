use core::fmt;

/// The result type returned by the strip operation.
pub type Result<T> = core::result::Result<T, StripError>;

/// The ways an IPv4 header can be malformed for stripping.
///
/// Whenever one of these is returned, the packet buffer has not been touched.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum StripError {
    /// Fewer than 20 bytes are available after the network header offset.
    TruncatedHeader {
        /// Bytes captured from the network header to the end of the buffer.
        len: usize,
    },
    /// The IHL field is below the 5-word minimum.
    InvalidHeaderLength(u8),
    /// The options reach past the captured bytes, carry an invalid length,
    /// or a source route points outside the options block.
    TruncatedOptions {
        /// Offset from the network header where the bad option data starts.
        offset: usize,
    },
    /// The total length field is smaller than the header length.
    InvalidTotalLength {
        /// The total length field.
        packet_len: u16,
        /// The header length in bytes.
        header_len: u8,
    },
}

impl fmt::Display for StripError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StripError::TruncatedHeader { len } => {
                write!(f, "truncated ipv4 header: need 20 bytes, got {len}")
            }
            StripError::InvalidHeaderLength(words) => {
                write!(f, "invalid ipv4 header length: {words} words")
            }
            StripError::TruncatedOptions { offset } => {
                write!(f, "truncated ipv4 options at header offset {offset}")
            }
            StripError::InvalidTotalLength {
                packet_len,
                header_len,
            } => write!(
                f,
                "invalid ipv4 total length {packet_len}, shorter than header length {header_len}"
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for StripError {}
