//! Core configuration.
//!
//! Sizing for the real-time event path and the parameter manager. Every
//! capacity is fixed at construction; nothing here grows at runtime.
//!
//! Configs can be built in `const` context or loaded from JSON:
//!
//! ```ignore
//! use clapgo_core::config::{CoreConfig, ManagerConfig, PoolConfig};
//!
//! pub static CONFIG: CoreConfig = CoreConfig::new()
//!     .with_pool(PoolConfig::new().with_max_polyphony(32).with_events_per_note(6))
//!     .with_parameters(ManagerConfig::new().with_max_listeners(8));
//!
//! let from_disk = CoreConfig::from_json(r#"{ "pool": { "max_polyphony": 16 } }"#)?;
//! ```

use serde::Deserialize;

use crate::error::ConfigError;
use crate::sysex_pool::SysexPool;

// =========================================================================
// SysEx slot size
// =========================================================================

/// Default bytes per SysEx slot.
///
/// Configurable via Cargo features: `sysex-256`, `sysex-1024`, `sysex-2048`.
#[cfg(feature = "sysex-2048")]
pub const DEFAULT_SYSEX_SLOT_SIZE: usize = 2048;

/// Default bytes per SysEx slot.
#[cfg(all(feature = "sysex-1024", not(feature = "sysex-2048")))]
pub const DEFAULT_SYSEX_SLOT_SIZE: usize = 1024;

/// Default bytes per SysEx slot.
#[cfg(all(
    feature = "sysex-256",
    not(feature = "sysex-1024"),
    not(feature = "sysex-2048")
))]
pub const DEFAULT_SYSEX_SLOT_SIZE: usize = 256;

/// Default bytes per SysEx slot.
#[cfg(not(any(feature = "sysex-256", feature = "sysex-1024", feature = "sysex-2048")))]
pub const DEFAULT_SYSEX_SLOT_SIZE: usize = 512;

// =========================================================================
// PoolConfig
// =========================================================================

/// Sizing for the per-block event path.
///
/// The event pool capacity is derived from polyphony unless an explicit
/// capacity is set:
///
/// `max(max_polyphony * events_per_note + headroom, min_capacity)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum simultaneously sounding voices.
    pub max_polyphony: usize,
    /// Events budgeted per voice per block (on, off, expressions, ...).
    pub events_per_note: usize,
    /// Extra slots for transport, parameter and MIDI events.
    pub headroom: usize,
    /// Lower bound on the derived capacity.
    pub min_capacity: usize,
    /// Explicit capacity, bypassing the derivation.
    pub capacity: Option<usize>,
    /// Number of SysEx payload slots per block.
    pub sysex_slots: usize,
    /// Bytes per SysEx payload slot.
    pub sysex_slot_size: usize,
    /// Capacity of the output event queue.
    pub output_capacity: usize,
}

impl PoolConfig {
    /// Default configuration: 64 voices, 8 events each, 512 slots headroom.
    pub const fn new() -> Self {
        Self {
            max_polyphony: 64,
            events_per_note: 8,
            headroom: 512,
            min_capacity: 1024,
            capacity: None,
            sysex_slots: 16,
            sysex_slot_size: DEFAULT_SYSEX_SLOT_SIZE,
            output_capacity: 1024,
        }
    }

    /// Set the maximum polyphony.
    pub const fn with_max_polyphony(mut self, voices: usize) -> Self {
        self.max_polyphony = voices;
        self
    }

    /// Set the per-voice event budget.
    pub const fn with_events_per_note(mut self, events: usize) -> Self {
        self.events_per_note = events;
        self
    }

    /// Set the headroom added on top of the voice budget.
    pub const fn with_headroom(mut self, headroom: usize) -> Self {
        self.headroom = headroom;
        self
    }

    /// Set the minimum derived capacity.
    pub const fn with_min_capacity(mut self, min: usize) -> Self {
        self.min_capacity = min;
        self
    }

    /// Use an explicit pool capacity.
    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Set SysEx slot count and slot size.
    pub const fn with_sysex(mut self, slots: usize, slot_size: usize) -> Self {
        self.sysex_slots = slots;
        self.sysex_slot_size = slot_size;
        self
    }

    /// Set the output queue capacity.
    pub const fn with_output_capacity(mut self, capacity: usize) -> Self {
        self.output_capacity = capacity;
        self
    }

    /// Resolved event pool capacity.
    pub const fn event_capacity(&self) -> usize {
        match self.capacity {
            Some(capacity) => capacity,
            None => {
                let derived = self
                    .max_polyphony
                    .saturating_mul(self.events_per_note)
                    .saturating_add(self.headroom);
                if derived > self.min_capacity {
                    derived
                } else {
                    self.min_capacity
                }
            }
        }
    }

    /// Reject configurations that would produce an unusable event path.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let capacity = self.event_capacity();
        if capacity == 0 {
            return Err(ConfigError::ZeroPoolCapacity);
        }
        if u32::try_from(capacity).is_err() {
            return Err(ConfigError::PoolCapacityTooLarge(capacity));
        }
        if SysexPool::storage_len(self.sysex_slots, self.sysex_slot_size).is_none() {
            return Err(ConfigError::SysexSizeOverflow {
                slots: self.sysex_slots,
                slot_size: self.sysex_slot_size,
            });
        }
        if self.output_capacity == 0 {
            return Err(ConfigError::ZeroOutputCapacity);
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// ManagerConfig
// =========================================================================

/// Sizing for the parameter manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Capacity of the change-listener table.
    pub max_listeners: usize,
}

impl ManagerConfig {
    /// Default listener capacity.
    pub const DEFAULT_MAX_LISTENERS: usize = 16;

    /// Default configuration.
    pub const fn new() -> Self {
        Self {
            max_listeners: Self::DEFAULT_MAX_LISTENERS,
        }
    }

    /// Set the listener capacity.
    pub const fn with_max_listeners(mut self, max: usize) -> Self {
        self.max_listeners = max;
        self
    }

    /// Reject a zero-capacity listener table.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_listeners == 0 {
            return Err(ConfigError::ZeroListenerCapacity);
        }
        Ok(())
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// CoreConfig
// =========================================================================

/// Complete core configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Event path sizing.
    pub pool: PoolConfig,
    /// Parameter manager sizing.
    pub parameters: ManagerConfig,
}

impl CoreConfig {
    /// Default configuration.
    pub const fn new() -> Self {
        Self {
            pool: PoolConfig::new(),
            parameters: ManagerConfig::new(),
        }
    }

    /// Set the event path sizing.
    pub const fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    /// Set the parameter manager sizing.
    pub const fn with_parameters(mut self, parameters: ManagerConfig) -> Self {
        self.parameters = parameters;
        self
    }

    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pool.validate()?;
        self.parameters.validate()
    }
}
