use crate::ipv4::{find_source_route, Ipv4Addr, Ipv4Header, ScanMode, IPV4_HEADER_LEN};
use crate::{PacketBuf, Result, StripError};

/// What the caller should do with the packet after stripping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Keep processing the packet normally.
    Continue,
}

/// Per-invocation configuration of the strip operation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StripConfig {
    /// Leave the destination address alone even if a source route is present.
    /// Options are stripped either way.
    pub keep_destination: bool,
    /// How the options are searched for a source route.
    pub scan_mode: ScanMode,
}

impl StripConfig {
    /// Rewrite the destination from source routes, scanning options
    /// structurally.
    pub fn new() -> Self {
        Self::default()
    }
}

/// A strip target bound to one configuration, for callers that run every
/// matched packet through the same settings.
#[derive(Debug, Default, Clone, Copy)]
pub struct IpOptStrip {
    config: StripConfig,
}

impl IpOptStrip {
    /// Bind `config` to a new target.
    pub fn new(config: StripConfig) -> Self {
        Self { config }
    }

    /// The bound configuration.
    pub fn config(&self) -> &StripConfig {
        &self.config
    }

    /// Run [`strip_options`] on `pbuf` with the bound configuration.
    #[inline]
    pub fn process(&self, pbuf: &mut PacketBuf) -> Result<Verdict> {
        strip_options(pbuf, &self.config)
    }
}

/// Remove all options from the IPv4 header inside `pbuf`.
///
/// If a loose or strict source route is present and
/// `config.keep_destination` is false, the destination address is first
/// replaced with the last hop of that route. The header length is then reset
/// to 20 bytes, the total length and the buffer shrink by the option length,
/// the payload moves up to follow the fixed header, and the header checksum
/// is recomputed.
///
/// A header without options is left untouched. On error the buffer is left
/// untouched as well, and the caller decides what to do with the packet.
pub fn strip_options(pbuf: &mut PacketBuf, config: &StripConfig) -> Result<Verdict> {
    match strip(pbuf, config) {
        Ok(()) => Ok(Verdict::Continue),
        Err(err) => {
            tracing::debug!(error = %err, "malformed ipv4 header, packet left untouched");
            Err(err)
        }
    }
}

fn strip(pbuf: &mut PacketBuf, config: &StripConfig) -> Result<()> {
    let optlen = option_len(pbuf.network())?;
    if optlen == 0 {
        return Ok(());
    }

    // Every check happens in this block, before the buffer is modified.
    let hop = {
        let header = Ipv4Header::new_unchecked(pbuf.network());
        tracing::debug!(
            optlen,
            src = %header.src_addr(),
            dst = %header.dst_addr(),
            "packet with ip options"
        );

        let header_len = header.header_len();
        let packet_len = header.packet_len();
        if packet_len < u16::from(header_len) {
            return Err(StripError::InvalidTotalLength {
                packet_len,
                header_len,
            });
        }

        // A byte scan only looks for a hop to rewrite with, while the
        // structural walk also checks the option layout.
        match (config.keep_destination, config.scan_mode) {
            (true, ScanMode::ByteScan) => None,
            (true, ScanMode::Structural) => {
                find_source_route(header.option_bytes(), ScanMode::Structural)?;
                None
            }
            (false, mode) => {
                let route = find_source_route(header.option_bytes(), mode)?;
                route.map(|route| route.last_hop())
            }
        }
    };

    trace_offsets(pbuf, "before strip");

    if let Some(hop) = hop {
        rewrite_destination(pbuf, hop);
    }
    compact_header(pbuf, optlen);
    Ipv4Header::new_unchecked(pbuf.network_mut()).fill_checksum();

    trace_offsets(pbuf, "after strip");
    Ok(())
}

// Option length in bytes, after checking that the options are captured.
fn option_len(network: &[u8]) -> Result<usize> {
    let header = Ipv4Header::new(network)
        .map_err(|network| StripError::TruncatedHeader { len: network.len() })?;

    if usize::from(header.header_len()) < IPV4_HEADER_LEN {
        return Err(StripError::InvalidHeaderLength(header.header_len_words()));
    }

    let header_len = usize::from(header.header_len());
    if header_len > network.len() {
        return Err(StripError::TruncatedOptions {
            offset: IPV4_HEADER_LEN,
        });
    }

    Ok(header_len - IPV4_HEADER_LEN)
}

fn rewrite_destination(pbuf: &mut PacketBuf, hop: Ipv4Addr) {
    let mut header = Ipv4Header::new_unchecked(pbuf.network_mut());
    tracing::debug!(
        from = %header.dst_addr(),
        to = %hop,
        "rewriting destination from source route"
    );
    header.set_dst_addr(hop);
}

fn compact_header(pbuf: &mut PacketBuf, optlen: usize) {
    let mut header = Ipv4Header::new_unchecked(pbuf.network_mut());
    let packet_len = header.packet_len();
    header.set_header_len(IPV4_HEADER_LEN as u8);
    header.set_packet_len(packet_len - optlen as u16);

    pbuf.set_transport_header(IPV4_HEADER_LEN);
    let options_end = pbuf.network_header() + IPV4_HEADER_LEN + optlen;
    pbuf.shift_left(options_end, optlen);
}

fn trace_offsets(pbuf: &PacketBuf, stage: &str) {
    tracing::trace!(
        network_header = pbuf.network_header(),
        transport_header = pbuf.transport_header(),
        len = pbuf.len(),
        "{}",
        stage
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipv4::{IPV4_HEADER_LEN_MAX, IPV4_HEADER_TEMPLATE};
    use std::vec::Vec;
    use bytes::BytesMut;

    // Build `prefix | header(options) | payload` with the IHL and total
    // length filled in.
    fn packet(prefix: &[u8], options: &[u8], payload: &[u8]) -> PacketBuf {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(prefix);
        bytes.extend_from_slice(&IPV4_HEADER_TEMPLATE);
        bytes.extend_from_slice(options);
        bytes.extend_from_slice(payload);

        let mut header = Ipv4Header::new_unchecked(&mut bytes[prefix.len()..]);
        header.set_header_len((IPV4_HEADER_LEN + options.len()) as u8);
        header.set_packet_len((IPV4_HEADER_LEN + options.len() + payload.len()) as u16);
        header.set_src_addr(Ipv4Addr::new(192, 168, 0, 1));
        header.set_dst_addr(Ipv4Addr::new(10, 0, 0, 1));

        PacketBuf::from_network_header(BytesMut::from(&bytes[..]), prefix.len())
    }

    const LSRR: [u8; 12] = [0x83, 0x0b, 0x04, 10, 0, 0, 2, 10, 0, 0, 3, 0x00];

    #[test]
    fn rewrite_and_strip() {
        let mut pbuf = packet(&[], &LSRR, &[1, 2, 3, 4, 5]);
        let before_len = pbuf.len();

        assert_eq!(
            strip_options(&mut pbuf, &StripConfig::new()),
            Ok(Verdict::Continue)
        );

        let header = Ipv4Header::new(pbuf.network()).unwrap();
        assert_eq!(header.header_len(), 20);
        assert_eq!(header.packet_len(), 25);
        assert_eq!(header.dst_addr(), Ipv4Addr::new(10, 0, 0, 3));
        assert_eq!(header.src_addr(), Ipv4Addr::new(192, 168, 0, 1));
        assert!(header.verify_checksum());
        assert_eq!(pbuf.len(), before_len - 12);
        assert_eq!(pbuf.transport_header(), 20);
        assert_eq!(pbuf.transport(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn keep_destination() {
        let mut pbuf = packet(&[], &LSRR, &[1, 2, 3, 4, 5]);
        let config = StripConfig {
            keep_destination: true,
            ..StripConfig::new()
        };

        assert_eq!(strip_options(&mut pbuf, &config), Ok(Verdict::Continue));

        let header = Ipv4Header::new(pbuf.network()).unwrap();
        assert_eq!(header.header_len(), 20);
        assert_eq!(header.packet_len(), 25);
        assert_eq!(header.dst_addr(), Ipv4Addr::new(10, 0, 0, 1));
        assert!(header.verify_checksum());
        assert_eq!(pbuf.transport(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn no_options_is_noop() {
        let mut pbuf = packet(&[0xaa; 14], &[], &[9; 8]);
        let before = pbuf.clone();

        assert_eq!(
            strip_options(&mut pbuf, &StripConfig::new()),
            Ok(Verdict::Continue)
        );
        assert_eq!(pbuf, before);
    }

    #[test]
    fn link_layer_prefix_untouched() {
        let mut pbuf = packet(&[0xaa; 14], &LSRR, &[7; 30]);

        assert_eq!(
            strip_options(&mut pbuf, &StripConfig::new()),
            Ok(Verdict::Continue)
        );
        assert_eq!(&pbuf.data()[..14], &[0xaa; 14]);
        assert_eq!(pbuf.network_header(), 14);
        assert_eq!(pbuf.transport_header(), 34);
        assert_eq!(pbuf.len(), 14 + 20 + 30);
        assert_eq!(pbuf.transport(), &[7; 30]);
    }

    #[test]
    fn trailing_bytes_after_packet_move_too() {
        // captured bytes past the total length, e.g. ethernet padding
        let mut pbuf = packet(&[], &LSRR, &[1, 2]);
        let mut bytes = BytesMut::from(pbuf.data());
        bytes.extend_from_slice(&[0xee; 4]);
        pbuf = PacketBuf::from_network_header(bytes, 0);

        assert_eq!(
            strip_options(&mut pbuf, &StripConfig::new()),
            Ok(Verdict::Continue)
        );
        assert_eq!(Ipv4Header::new(pbuf.network()).unwrap().packet_len(), 22);
        assert_eq!(pbuf.transport(), &[1, 2, 0xee, 0xee, 0xee, 0xee]);
    }

    #[test]
    fn errors_leave_buffer_untouched() {
        let cases: [(PacketBuf, StripError); 4] = [
            (
                PacketBuf::from_network_header(BytesMut::from(&IPV4_HEADER_TEMPLATE[..19]), 0),
                StripError::TruncatedHeader { len: 19 },
            ),
            (
                {
                    let mut bytes = BytesMut::from(&IPV4_HEADER_TEMPLATE[..]);
                    bytes[0] = 0x44;
                    PacketBuf::from_network_header(bytes, 0)
                },
                StripError::InvalidHeaderLength(4),
            ),
            (
                {
                    let mut bytes = BytesMut::from(packet(&[], &LSRR, &[]).data());
                    bytes[0] = 0x4f;
                    PacketBuf::new(bytes, 0, 32)
                },
                StripError::TruncatedOptions { offset: 20 },
            ),
            (
                {
                    let mut bytes = BytesMut::from(packet(&[], &LSRR, &[]).data());
                    bytes[3] = 0x10;
                    PacketBuf::from_network_header(bytes, 0)
                },
                StripError::InvalidTotalLength {
                    packet_len: 16,
                    header_len: 32,
                },
            ),
        ];

        for (mut pbuf, err) in cases {
            let before = pbuf.clone();
            assert_eq!(strip_options(&mut pbuf, &StripConfig::new()), Err(err));
            assert_eq!(pbuf, before);
        }
    }

    #[test]
    fn byte_scan_keeping_destination_ignores_route_pointers() {
        // record route holding 131.0.0.1, no source route at all
        let rr = [0x07, 0x07, 0x04, 131, 0, 0, 1, 0x00];
        let target = IpOptStrip::new(StripConfig {
            keep_destination: true,
            scan_mode: ScanMode::ByteScan,
        });
        assert!(target.config().keep_destination);

        let mut pbuf = packet(&[], &rr, &[1, 2, 3]);
        assert_eq!(target.process(&mut pbuf), Ok(Verdict::Continue));
        let header = Ipv4Header::new(pbuf.network()).unwrap();
        assert_eq!(header.header_len(), 20);
        assert_eq!(header.packet_len(), 23);
        assert_eq!(header.dst_addr(), Ipv4Addr::new(10, 0, 0, 1));
        assert!(header.verify_checksum());
        assert_eq!(pbuf.len(), 23);
        assert!(pbuf.len() <= pbuf.capacity());
        assert_eq!(pbuf.transport(), &[1, 2, 3]);

        // a source route pointing past the block is never read either
        let mut opts = LSRR;
        opts[1] = 0x0d;
        let mut pbuf = packet(&[], &opts, &[1, 2, 3]);
        assert_eq!(target.process(&mut pbuf), Ok(Verdict::Continue));
        assert_eq!(pbuf.len(), 23);
    }

    #[test]
    fn bad_pointer_rejected_when_rewriting() {
        let rr = [0x07, 0x07, 0x04, 131, 0, 0, 1, 0x00];
        let mut pbuf = packet(&[], &rr, &[1, 2, 3]);
        let before = pbuf.clone();

        let config = StripConfig {
            scan_mode: ScanMode::ByteScan,
            ..StripConfig::new()
        };
        assert_eq!(
            strip_options(&mut pbuf, &config),
            Err(StripError::TruncatedOptions { offset: 23 })
        );
        assert_eq!(pbuf, before);
    }

    #[test]
    fn structural_layout_checked_when_keeping_destination() {
        let mut opts = LSRR;
        opts[1] = 0x0d;
        let mut pbuf = packet(&[], &opts, &[1, 2, 3]);
        let before = pbuf.clone();

        let config = StripConfig {
            keep_destination: true,
            ..StripConfig::new()
        };
        assert_eq!(
            strip_options(&mut pbuf, &config),
            Err(StripError::TruncatedOptions { offset: 20 })
        );
        assert_eq!(pbuf, before);
    }

    #[test]
    fn second_pass_is_noop() {
        let target = IpOptStrip::default();
        let mut pbuf = packet(&[], &LSRR, &[1, 2, 3]);

        assert_eq!(target.process(&mut pbuf), Ok(Verdict::Continue));
        let once = pbuf.clone();
        assert_eq!(target.process(&mut pbuf), Ok(Verdict::Continue));
        assert_eq!(pbuf, once);
    }

    #[test]
    fn maximum_option_block() {
        // 40 bytes: NOP padding and an SSRR with nine hops
        let mut opts = [0x01u8; IPV4_HEADER_LEN_MAX - IPV4_HEADER_LEN];
        opts[1] = 0x89;
        opts[2] = 39;
        opts[3] = 4;
        for (i, hop) in opts[4..40].chunks_mut(4).enumerate() {
            hop.copy_from_slice(&[172, 16, 0, i as u8]);
        }
        let mut pbuf = packet(&[], &opts, &[0x55; 100]);

        assert_eq!(
            strip_options(&mut pbuf, &StripConfig::new()),
            Ok(Verdict::Continue)
        );
        let header = Ipv4Header::new(pbuf.network()).unwrap();
        assert_eq!(header.dst_addr(), Ipv4Addr::new(172, 16, 0, 8));
        assert_eq!(header.packet_len(), 120);
        assert_eq!(pbuf.len(), 120);
        assert!(header.verify_checksum());
    }
}
