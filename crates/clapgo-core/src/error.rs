//! Error types for the ClapGo core.
//!
//! Only non-real-time paths return these. Audio-thread operations report
//! failure through `Option`/`bool` returns and diagnostic counters instead.

use thiserror::Error;

use crate::types::ParameterId;

/// Construction-time configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Event pool capacity resolved to zero.
    #[error("event pool capacity must be greater than zero")]
    ZeroPoolCapacity,
    /// Output event queue capacity is zero.
    #[error("output event capacity must be greater than zero")]
    ZeroOutputCapacity,
    /// Event pool capacity does not fit a 32-bit slot index.
    #[error("event pool capacity {0} exceeds the maximum of {max}", max = u32::MAX)]
    PoolCapacityTooLarge(usize),
    /// SysEx storage size overflows, or a slot dimension does not fit 32 bits.
    #[error("sysex storage of {slots} slots x {slot_size} bytes is too large")]
    SysexSizeOverflow { slots: usize, slot_size: usize },
    /// Listener table capacity is zero.
    #[error("listener capacity must be greater than zero")]
    ZeroListenerCapacity,
    /// Configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors returned by the parameter manager.
#[derive(Debug, Error, PartialEq)]
pub enum ParameterError {
    /// A parameter with this id is already registered.
    #[error("parameter {0} is already registered")]
    DuplicateId(ParameterId),
    /// No parameter with this id is registered.
    #[error("unknown parameter id {0}")]
    UnknownId(ParameterId),
    /// Default value lies outside `[min, max]`.
    #[error("parameter {id}: default {default} outside [{min}, {max}]")]
    DefaultOutOfRange {
        id: ParameterId,
        default: f64,
        min: f64,
        max: f64,
    },
    /// `min > max`, or a bound is NaN.
    #[error("parameter {id}: invalid range [{min}, {max}]")]
    InvalidRange { id: ParameterId, min: f64, max: f64 },
    /// Flags contradict the declared range.
    #[error("parameter {id}: inconsistent flags ({reason})")]
    InconsistentFlags { id: ParameterId, reason: &'static str },
    /// A NaN or infinite value was passed to a setter.
    #[error("parameter {0}: value is not finite")]
    NonFiniteValue(ParameterId),
    /// The parameter set is frozen (activated or already enumerated by the host).
    #[error("parameter set is frozen; cannot register {0}")]
    SetFrozen(ParameterId),
    /// The listener table is full.
    #[error("listener capacity of {0} reached")]
    ListenerCapacity(usize),
}

/// Errors from saving or restoring parameter state.
#[derive(Debug, Error)]
pub enum StateError {
    /// Serialization failed.
    #[error("failed to serialize state: {0}")]
    Serialize(#[source] serde_json::Error),
    /// The state blob is not valid.
    #[error("failed to deserialize state: {0}")]
    Deserialize(#[source] serde_json::Error),
    /// The blob was written by a newer format version.
    #[error("unsupported state version {found} (max supported {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
}

/// Result type for parameter operations.
pub type ParameterResult<T> = Result<T, ParameterError>;
