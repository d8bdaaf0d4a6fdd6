//! IPv4 header access and option scanning.

pub use core::net::Ipv4Addr;

mod header;
pub use header::{Ipv4Header, IPV4_HEADER_LEN, IPV4_HEADER_LEN_MAX, IPV4_HEADER_TEMPLATE};

mod option;
pub use option::{find_source_route, OptionType, ScanMode, SourceRoute};
