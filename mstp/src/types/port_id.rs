use core::fmt;

use serde::{Deserialize, Serialize};

/// A port identifier: a 4-bit priority followed by a 12-bit port number.
///
/// The priority is expressed the way management interfaces show it, as a
/// multiple of 16 in `0..=240`.
#[derive(
    Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default, Serialize, Deserialize,
)]
pub struct PortId(pub u16);

impl PortId {
    /// Build a port identifier.
    ///
    /// # Panics
    ///
    /// `priority` is not a multiple of 16 below 256, or `number` does not fit in
    /// 12 bits.
    pub fn new(priority: u8, number: u16) -> Self {
        assert!(priority & 0x0f == 0);
        assert!(number <= 0xfff);
        PortId(((priority as u16) << 8) | number)
    }

    /// The raw 16-bit value.
    #[inline]
    pub fn raw(&self) -> u16 {
        self.0
    }

    /// The priority, a multiple of 16.
    #[inline]
    pub fn priority(&self) -> u8 {
        (self.0 >> 8) as u8 & 0xf0
    }

    /// The 12-bit port number.
    #[inline]
    pub fn number(&self) -> u16 {
        self.0 & 0x0fff
    }

    /// Replace the priority, keeping the port number.
    ///
    /// # Panics
    ///
    /// `priority` is not a multiple of 16.
    #[inline]
    pub fn set_priority(&mut self, priority: u8) {
        assert!(priority & 0x0f == 0);
        self.0 = ((priority as u16) << 8) | self.number();
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}", self.0)
    }
}
