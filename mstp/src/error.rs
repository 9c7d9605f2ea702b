//! Error types for the administrative surface of the engine.
//!
//! Received frames never produce an error: the codec classifies anything it
//! cannot decode as unknown and the bridge drops it. Out-of-range port and tree
//! indices are programming errors and panic.

use thiserror::Error;

/// Errors returned by bridge construction, getters and setters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Spanning tree is administratively stopped on the bridge, so there is no
    /// root-derived information to report.
    #[error("spanning tree is disabled on this bridge")]
    Disabled,

    /// A priority is not a multiple of its step or exceeds the maximum.
    #[error("invalid priority {value}: must be a multiple of {step} not above {max}")]
    InvalidPriority {
        /// Value supplied.
        value: u32,
        /// Required granularity.
        step: u32,
        /// Largest legal value.
        max: u32,
    },

    /// A parameter is outside its legal range.
    #[error("{name} {value} out of range {min}..={max}")]
    OutOfRange {
        /// Parameter name.
        name: &'static str,
        /// Value supplied.
        value: u32,
        /// Smallest legal value.
        min: u32,
        /// Largest legal value.
        max: u32,
    },

    /// Bridge times violate `2 * (forward_delay - 1) >= max_age >= 2 * (hello_time + 1)`.
    #[error(
        "inconsistent bridge times: max_age {max_age}, hello_time {hello_time}, forward_delay {forward_delay}"
    )]
    InconsistentTimes {
        /// Max Age in seconds.
        max_age: u16,
        /// Hello Time in seconds.
        hello_time: u16,
        /// Forward Delay in seconds.
        forward_delay: u16,
    },

    /// The MST configuration name does not fit in 32 bytes.
    #[error("MST configuration name is {len} bytes, at most 32 allowed")]
    InvalidConfigName {
        /// Length of the rejected name in bytes.
        len: usize,
    },

    /// A per-port configuration list does not match the port count.
    #[error("{given} port configurations supplied for {port_count} ports")]
    PortConfigMismatch {
        /// Number of port configurations supplied.
        given: usize,
        /// Number of ports on the bridge.
        port_count: usize,
    },
}

/// Result type used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    pub(crate) fn out_of_range(name: &'static str, value: u32, min: u32, max: u32) -> Self {
        Error::OutOfRange {
            name,
            value,
            min,
            max,
        }
    }

    /// Check that `value` lies in `min..=max`.
    pub(crate) fn check_range(name: &'static str, value: u32, min: u32, max: u32) -> Result<()> {
        if value < min || value > max {
            return Err(Self::out_of_range(name, value, min, max));
        }
        Ok(())
    }
}
