use byteorder::{ByteOrder, NetworkEndian};

use super::{Ipv4Addr, IPV4_HEADER_LEN};
use crate::{Result, StripError};

enum_sim! {
    /// An enum-like type for representing Ipv4 option type codes.
    pub struct OptionType (u8) {
        /// End of option list.
        EOL = 0,

        /// No operation, used as padding between options.
        NOP = 1,

        /// Record route.
        RR = 7,

        /// Internet timestamp.
        TS = 68,

        /// Loose source and record route.
        LSRR = 131,

        /// Strict source and record route.
        SSRR = 137,
    }
}

impl OptionType {
    /// Whether this is one of the two source route options.
    #[inline]
    pub fn is_source_route(&self) -> bool {
        *self == Self::LSRR || *self == Self::SSRR
    }
}

// type, length, pointer and a single route address
const SOURCE_ROUTE_MIN_LEN: usize = 7;

const ROUTE_ADDR_LEN: usize = 4;

/// How the option bytes are searched for a source route.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanMode {
    /// Test every option byte against the source route type codes, without
    /// skipping over other options by their length.
    ///
    /// Bytes inside unrelated options can be mistaken for a source route.
    ByteScan,

    /// Walk the options one at a time, honoring each option's length byte.
    #[default]
    Structural,
}

/// A source route option found inside an options block.
///
/// A `SourceRoute` can only be obtained from [`find_source_route`], which has
/// already checked that its last hop lies inside the options block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRoute<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> SourceRoute<'a> {
    fn check(buf: &'a [u8], offset: usize) -> Result<Self> {
        let route_end = buf
            .get(offset + 1)
            .map(|pointer| offset + usize::from(*pointer));
        match route_end {
            Some(end) if end >= offset + ROUTE_ADDR_LEN && end <= buf.len() => {
                Ok(Self { buf, offset })
            }
            _ => Err(StripError::TruncatedOptions {
                offset: IPV4_HEADER_LEN + offset,
            }),
        }
    }

    /// Offset of the option inside the options block.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// LSRR or SSRR.
    #[inline]
    pub fn option_type(&self) -> OptionType {
        OptionType::from(self.buf[self.offset])
    }

    /// The byte right after the type code.
    ///
    /// Route data ends this many bytes into the option. For a well-formed
    /// option this is the option length, which makes the last hop the final
    /// address on the route.
    #[inline]
    pub fn pointer(&self) -> u8 {
        self.buf[self.offset + 1]
    }

    /// The 4 bytes that end at `pointer`.
    #[inline]
    pub fn last_hop(&self) -> Ipv4Addr {
        let end = self.offset + usize::from(self.pointer());
        Ipv4Addr::from(NetworkEndian::read_u32(
            &self.buf[end - ROUTE_ADDR_LEN..end],
        ))
    }
}

/// Search the options block `opts` for a source route.
///
/// When several source routes are present the last one wins. Any source
/// route whose last hop falls outside `opts`, and in structural mode any
/// option with an invalid length, is reported as
/// [`StripError::TruncatedOptions`].
pub fn find_source_route(opts: &[u8], mode: ScanMode) -> Result<Option<SourceRoute<'_>>> {
    match mode {
        ScanMode::ByteScan => byte_scan(opts),
        ScanMode::Structural => structural_scan(opts),
    }
}

fn byte_scan(opts: &[u8]) -> Result<Option<SourceRoute<'_>>> {
    let mut found = None;
    for (offset, opt_type) in opts.iter().enumerate() {
        if OptionType::from(*opt_type).is_source_route() {
            found = Some(SourceRoute::check(opts, offset)?);
        }
    }
    Ok(found)
}

fn structural_scan(opts: &[u8]) -> Result<Option<SourceRoute<'_>>> {
    let truncated = |offset: usize| StripError::TruncatedOptions {
        offset: IPV4_HEADER_LEN + offset,
    };

    let mut found = None;
    let mut offset = 0;
    while offset < opts.len() {
        let opt_type = OptionType::from(opts[offset]);
        match opt_type {
            // the rest is padding
            OptionType::EOL => break,
            OptionType::NOP => offset += 1,
            _ => {
                let remaining = opts.len() - offset;
                if remaining < 2 {
                    return Err(truncated(offset));
                }

                let opt_len = usize::from(opts[offset + 1]);
                if opt_len < 2 || opt_len > remaining {
                    return Err(truncated(offset));
                }

                if opt_type.is_source_route() {
                    if opt_len < SOURCE_ROUTE_MIN_LEN {
                        return Err(truncated(offset));
                    }
                    found = Some(SourceRoute::check(opts, offset)?);
                }
                offset += opt_len;
            }
        }
    }
    Ok(found)
}
