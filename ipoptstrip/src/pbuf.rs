use bytes::BytesMut;

/// An owned packet buffer that tracks where the network and transport
/// headers start.
///
/// The buffer keeps `network_header <= transport_header <= len <= capacity`
/// at all times. Offsets are absolute positions inside the buffer, so any
/// bytes before the network header (a link-layer header, for instance) are
/// carried along untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketBuf {
    data: BytesMut,
    network_header: usize,
    transport_header: usize,
}

impl PacketBuf {
    /// Wrap `data` with explicit header offsets.
    ///
    /// # Panics
    ///
    /// Panics if the offsets are out of order or past the end of `data`.
    #[inline]
    pub fn new(data: BytesMut, network_header: usize, transport_header: usize) -> Self {
        assert!(
            network_header <= transport_header && transport_header <= data.len()
        );
        Self {
            data,
            network_header,
            transport_header,
        }
    }

    /// Wrap `data` whose IPv4 header starts at `network_header`.
    ///
    /// The transport header offset is derived from the IHL field and clamped
    /// to the end of the buffer when the header is truncated.
    ///
    /// # Panics
    ///
    /// Panics if `network_header` is past the end of `data`.
    #[inline]
    pub fn from_network_header(data: BytesMut, network_header: usize) -> Self {
        assert!(network_header <= data.len());
        let header_len = data
            .get(network_header)
            .map(|ver_ihl| usize::from(ver_ihl & 0x0f) * 4)
            .unwrap_or(0);
        let transport_header = (network_header + header_len).min(data.len());
        Self {
            data,
            network_header,
            transport_header,
        }
    }

    /// Number of valid bytes in the buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer holds no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Total bytes the buffer can hold without reallocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Offset of the network header.
    #[inline]
    pub fn network_header(&self) -> usize {
        self.network_header
    }

    /// Offset of the transport header.
    #[inline]
    pub fn transport_header(&self) -> usize {
        self.transport_header
    }

    /// Place the transport header `offset` bytes after the network header.
    ///
    /// # Panics
    ///
    /// Panics if the new offset is past the end of the buffer.
    #[inline]
    pub fn set_transport_header(&mut self, offset: usize) {
        let transport_header = self.network_header + offset;
        assert!(transport_header <= self.data.len());
        self.transport_header = transport_header;
    }

    /// All the valid bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data[..]
    }

    /// All the valid bytes, mutably.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data[..]
    }

    /// Bytes from the network header to the end.
    #[inline]
    pub fn network(&self) -> &[u8] {
        &self.data[self.network_header..]
    }

    /// Bytes from the network header to the end, mutably.
    #[inline]
    pub fn network_mut(&mut self) -> &mut [u8] {
        &mut self.data[self.network_header..]
    }

    /// Bytes from the transport header to the end.
    #[inline]
    pub fn transport(&self) -> &[u8] {
        &self.data[self.transport_header..]
    }

    /// Move every byte in `from..len` left by `cnt`, then drop the last `cnt`
    /// bytes.
    ///
    /// The source and destination ranges may overlap. Bytes before
    /// `from - cnt` are left alone.
    ///
    /// # Panics
    ///
    /// Panics if `cnt > from`, if `from` is past the end of the buffer, or if
    /// the shrink would cut into the transport header.
    pub fn shift_left(&mut self, from: usize, cnt: usize) {
        assert!(cnt <= from && from <= self.data.len());
        let new_len = self.data.len() - cnt;
        assert!(self.transport_header <= new_len);

        self.data.copy_within(from.., from - cnt);
        self.data.truncate(new_len);
    }

    /// Give back the underlying bytes.
    #[inline]
    pub fn into_inner(self) -> BytesMut {
        self.data
    }
}
