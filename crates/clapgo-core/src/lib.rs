//! # clapgo-core
//!
//! Real-time core of the ClapGo CLAP plugin framework.
//!
//! The host calls into a plugin from two kinds of threads. The main thread
//! registers parameters, answers host queries and saves state; the audio
//! thread runs `process` and must never block or allocate. This crate
//! provides the pieces that sit on that boundary:
//!
//! - [`EventPool`]: fixed-capacity event arena with epoch-checked handles
//! - [`EventBridge`]: per-block staging, ordering and dispatch of host events
//! - [`AtomicF64`]: lock-free `f64` cell used for every parameter value
//! - [`ParameterManager`]: validated registration, clamped updates, listeners
//!   and JSON state
//! - [`thread_check`]: thread-role marks and debug assertions
//!
//! ## Architecture
//!
//! ```text
//! host event list ──> EventBridge::push_input ──> EventPool (slots)
//!                                │
//!                     EventBridge::dispatch ──> ParameterManager::apply_event
//!                                │                       │
//!                                └──> EventHandler    AtomicF64 cells
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use clapgo_core::prelude::*;
//!
//! let mut params = ParameterManager::new(ManagerConfig::default())?;
//! params.register(ParameterInfo::new(0, "Gain", 0.0, 2.0, 1.0))?;
//! params.activate();
//!
//! let mut bridge = EventBridge::new(&PoolConfig::default())?;
//!
//! // In process():
//! let _audio = AudioThreadScope::enter();
//! bridge.begin_block(frames);
//! for event in host_events {
//!     bridge.push_input(event);
//! }
//! bridge.dispatch(&mut synth, Some(&params));
//! ```

pub mod atomic;
pub mod bridge;
pub mod config;
pub mod error;
pub mod event;
pub mod event_pool;
pub mod midi;
pub mod parameter_format;
pub mod parameter_info;
pub mod parameter_manager;
pub mod state;
pub mod sysex_pool;
pub mod thread_check;
pub mod types;

// Re-exports
pub use atomic::AtomicF64;
pub use bridge::{BridgeStats, EventBridge, EventHandler, NoOpHandler, OutputEvents};
pub use config::{CoreConfig, ManagerConfig, PoolConfig, DEFAULT_SYSEX_SLOT_SIZE};
pub use error::{ConfigError, ParameterError, ParameterResult, StateError};
pub use event::{
    Event, EventBody, EventFlags, EventHeader, EventKind, Midi, Midi2, NoteEvent, NoteExpression,
    NoteExpressionId, ParamGesture, ParamMod, ParamValue, SysexRef, Transport, TransportFlags,
};
pub use event_pool::{EventHandle, EventPool, PoolMonitor, PoolStats};
pub use parameter_format::Formatter;
pub use parameter_info::{ParameterFlags, ParameterInfo};
pub use parameter_manager::{ListenerId, ParameterChange, ParameterManager, SetOutcome};
pub use state::{LoadSummary, SavedValue, StateDocument, STATE_VERSION};
pub use sysex_pool::SysexPool;
pub use thread_check::{AudioThreadScope, HostThreadCheck, ThreadChecker, ThreadRole};
pub use types::{FrameOffset, NoteId, ParameterId, ParameterValue, CORE_EVENT_SPACE_ID, WILDCARD};

/// Common imports for plugin code.
pub mod prelude {
    pub use crate::{
        // Events
        Event, EventBody, EventKind, NoteEvent, ParamValue, Transport,
        // Staging and dispatch
        EventBridge, EventHandler, NoOpHandler, OutputEvents,
        // Parameters
        AtomicF64, Formatter, ParameterFlags, ParameterInfo, ParameterManager, SetOutcome,
        // Configuration
        CoreConfig, ManagerConfig, PoolConfig,
        // Errors
        ConfigError, ParameterError, StateError,
        // Threads
        AudioThreadScope,
    };
}
