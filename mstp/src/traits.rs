pub use bytes::Buf;

/// A readable buffer whose unread region can be shrunk from the tail.
///
/// BPDUs frequently arrive with Ethernet padding behind them. The codec uses
/// `trim_off` to cut a received buffer down to the length the BPDU header
/// advertises before handing out views.
pub trait PktBuf: Buf {
    /// Remove `cnt` trailing bytes.
    fn trim_off(&mut self, cnt: usize);
}

/// A writable buffer the encoder fills in place.
pub trait PktBufMut: PktBuf {
    /// A mutable view of the unread region.
    fn chunk_mut(&mut self) -> &mut [u8];
}

impl<T: PktBuf + ?Sized> PktBuf for &mut T {
    #[inline]
    fn trim_off(&mut self, cnt: usize) {
        (**self).trim_off(cnt);
    }
}

impl<T: PktBufMut + ?Sized> PktBufMut for &mut T {
    #[inline]
    fn chunk_mut(&mut self) -> &mut [u8] {
        (**self).chunk_mut()
    }
}
