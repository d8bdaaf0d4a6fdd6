#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
#![no_std]

//! Strip options from IPv4 headers in place.
//!
//! The crate takes one packet at a time, removes every option that follows
//! the fixed 20-byte IPv4 header, optionally rewrites the destination address
//! with the last hop of a loose or strict source route option, and leaves the
//! packet with a fixed-size header and a valid header checksum.
//!
//! ```
//! use bytes::BytesMut;
//! use ipoptstrip::ipv4::{Ipv4Addr, Ipv4Header};
//! use ipoptstrip::{strip_options, PacketBuf, StripConfig, Verdict};
//!
//! // IHL = 8, carrying a loose source route through 10.0.0.2 and 10.0.0.3.
//! let packet = [
//!     0x48, 0x00, 0x00, 0x24, 0x12, 0x34, 0x40, 0x00, 0x40, 0x11, 0x00, 0x00,
//!     0xc0, 0xa8, 0x00, 0x01, 0x0a, 0x00, 0x00, 0x01, 0x83, 0x0b, 0x04, 0x0a,
//!     0x00, 0x00, 0x02, 0x0a, 0x00, 0x00, 0x03, 0x00, 0xde, 0xad, 0xbe, 0xef,
//! ];
//!
//! let mut pbuf = PacketBuf::from_network_header(BytesMut::from(&packet[..]), 0);
//! let verdict = strip_options(&mut pbuf, &StripConfig::new()).unwrap();
//! assert_eq!(verdict, Verdict::Continue);
//!
//! let header = Ipv4Header::new(pbuf.network()).unwrap();
//! assert_eq!(header.header_len(), 20);
//! assert_eq!(header.packet_len(), 24);
//! assert_eq!(header.dst_addr(), Ipv4Addr::new(10, 0, 0, 3));
//! assert!(header.verify_checksum());
//! assert_eq!(pbuf.transport(), &[0xde, 0xad, 0xbe, 0xef]);
//! ```

#[cfg(any(feature = "std", test))]
extern crate std;

#[macro_use]
mod macros;

pub mod checksum_utils;

mod error;
pub use error::{Result, StripError};

mod pbuf;
pub use pbuf::PacketBuf;

pub mod ipv4;

mod strip;
pub use strip::{strip_options, IpOptStrip, StripConfig, Verdict};
