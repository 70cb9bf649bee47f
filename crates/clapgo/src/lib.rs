//! # ClapGo
//!
//! Real-time building blocks for CLAP audio plugins.
//!
//! ClapGo keeps the audio thread free of allocation and locks: host events
//! are staged in a pre-allocated pool, parameter values live in atomic cells,
//! and every capacity is fixed when the plugin is created.
//!
//! ## Architecture
//!
//! ```text
//! CLAP host
//!    ↓
//! glue layer (C ABI)
//!    ↓
//! EventBridge ──> EventHandler (your plugin)
//!    ↓
//! ParameterManager (AtomicF64 cells)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use clapgo::prelude::*;
//!
//! struct Synth;
//!
//! impl EventHandler for Synth {
//!     fn on_note_on(&mut self, time: u32, note: &NoteEvent) {
//!         // start a voice
//!     }
//! }
//!
//! static CONFIG: CoreConfig = CoreConfig::new()
//!     .with_pool(PoolConfig::new().with_max_polyphony(16));
//!
//! let mut params = ParameterManager::new(CONFIG.parameters)?;
//! params.register(ParameterInfo::new(0, "Volume", 0.0, 1.0, 0.8))?;
//!
//! let mut bridge = EventBridge::new(&CONFIG.pool)?;
//! bridge.begin_block(256);
//! bridge.dispatch(&mut Synth, Some(&params));
//! ```

// Re-export sub-crates
pub use clapgo_core as core;

pub use clapgo_core::{
    midi, state, thread_check, AtomicF64, ConfigError, CoreConfig, Event, EventBridge,
    EventHandler, EventPool, Formatter, ManagerConfig, ParameterError, ParameterFlags,
    ParameterInfo, ParameterManager, PoolConfig, StateError,
};

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use clapgo::prelude::*;
/// ```
pub mod prelude {
    pub use clapgo_core::prelude::*;

    // Thread roles
    pub use clapgo_core::thread_check::{set_main_thread, HostThreadCheck, ThreadChecker};

    // Diagnostics
    pub use clapgo_core::{BridgeStats, PoolMonitor, PoolStats};
}
