#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

//! A protocol engine for the IEEE 802.1Q spanning tree family: MSTP, with
//! RSTP and legacy STP interoperation.
//!
//! The crate carries no I/O of its own. A host (a switch driver, a simulator,
//! a test harness) implements [`Host`], builds a [`Bridge`] and feeds it
//! received BPDUs, link changes and a one second tick. The bridge answers by
//! transmitting BPDUs and opening or closing ports through the host.
//!
//! The modules below the bridge are usable on their own: [`bpdu`] is a
//! complete wire codec for Config, TCN, RST and MST BPDUs, and [`types`]
//! holds the identifiers and priority vectors the protocol orders bridges by.

#[macro_use]
mod macros;

mod traits;
pub use traits::{Buf, PktBuf, PktBufMut};

mod cursors;
pub use cursors::{Cursor, CursorMut};

pub mod bpdu;
pub mod config;
pub mod ether;
pub mod types;

mod error;
pub use error::{Error, Result};

mod host;
pub use host::{FlushType, Host};

mod bridge;
pub use bridge::{Bridge, PortStats, PortTreeStatus, TopologyChangeInfo};

mod procedures;
mod sm;

pub use config::{BridgeConfig, PortConfig};
pub use types::{AdminP2p, BridgeId, PortId, PortRole, PortState, ProtocolVersion, CIST};
