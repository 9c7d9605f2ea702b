use bytes::Buf;

use crate::traits::{PktBuf, PktBufMut};

/// A read cursor over a byte slice.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
    end: usize,
}

impl<'a> Cursor<'a> {
    /// Create a cursor positioned at the start of `buf`.
    #[inline]
    pub fn new(buf: &'a [u8]) -> Self {
        Cursor {
            buf,
            pos: 0,
            end: buf.len(),
        }
    }
}

impl<'a> Buf for Cursor<'a> {
    #[inline]
    fn remaining(&self) -> usize {
        self.end - self.pos
    }

    #[inline]
    fn chunk(&self) -> &[u8] {
        &self.buf[self.pos..self.end]
    }

    #[inline]
    fn advance(&mut self, cnt: usize) {
        assert!(cnt <= self.remaining());
        self.pos += cnt;
    }
}

impl<'a> PktBuf for Cursor<'a> {
    #[inline]
    fn trim_off(&mut self, cnt: usize) {
        assert!(cnt <= self.remaining());
        self.end -= cnt;
    }
}

/// A write cursor over a mutable byte slice.
#[derive(Debug)]
pub struct CursorMut<'a> {
    buf: &'a mut [u8],
    pos: usize,
    end: usize,
}

impl<'a> CursorMut<'a> {
    /// Create a cursor positioned at the start of `buf`.
    #[inline]
    pub fn new(buf: &'a mut [u8]) -> Self {
        let end = buf.len();
        CursorMut { buf, pos: 0, end }
    }
}

impl<'a> Buf for CursorMut<'a> {
    #[inline]
    fn remaining(&self) -> usize {
        self.end - self.pos
    }

    #[inline]
    fn chunk(&self) -> &[u8] {
        &self.buf[self.pos..self.end]
    }

    #[inline]
    fn advance(&mut self, cnt: usize) {
        assert!(cnt <= self.remaining());
        self.pos += cnt;
    }
}

impl<'a> PktBuf for CursorMut<'a> {
    #[inline]
    fn trim_off(&mut self, cnt: usize) {
        assert!(cnt <= self.remaining());
        self.end -= cnt;
    }
}

impl<'a> PktBufMut for CursorMut<'a> {
    #[inline]
    fn chunk_mut(&mut self) -> &mut [u8] {
        &mut self.buf[self.pos..self.end]
    }
}
