//! Parameter registry with lock-free value storage.
//!
//! [`ParameterManager`] owns every parameter a plugin exposes. It moves
//! through two phases:
//!
//! 1. **Registering**: the plugin declares parameters with [`register`]. Each
//!    declaration is validated and assigned the next index.
//! 2. **Frozen**: after [`activate`], or once the host has enumerated the set
//!    through [`count`] or [`info_by_index`], the set can no longer change.
//!    Indices stay stable for the lifetime of the manager.
//!
//! Values live in [`AtomicF64`] cells. The main thread writes through
//! [`set_value`], which clamps, notifies listeners, and reports what it did
//! through [`SetOutcome`]. The audio thread reads with [`value`] or holds a
//! cell reference from [`store`], and applies host automation with
//! [`apply_event`], which never notifies listeners and never allocates.
//!
//! [`register`]: ParameterManager::register
//! [`activate`]: ParameterManager::activate
//! [`count`]: ParameterManager::count
//! [`info_by_index`]: ParameterManager::info_by_index
//! [`set_value`]: ParameterManager::set_value
//! [`value`]: ParameterManager::value
//! [`store`]: ParameterManager::store
//! [`apply_event`]: ParameterManager::apply_event
//!
//! # Example
//!
//! ```ignore
//! use clapgo_core::{ManagerConfig, ParameterInfo, ParameterManager, SetOutcome};
//!
//! let mut params = ParameterManager::new(ManagerConfig::default())?;
//! params.register(ParameterInfo::new(0, "Gain", 0.0, 2.0, 1.0))?;
//! params.activate();
//!
//! assert_eq!(
//!     params.set_value(0, 3.0)?,
//!     SetOutcome::Clamped { requested: 3.0, stored: 2.0 }
//! );
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::atomic::AtomicF64;
use crate::config::ManagerConfig;
use crate::error::{ConfigError, ParameterError, ParameterResult};
use crate::event::{Event, EventBody};
use crate::parameter_info::ParameterInfo;
use crate::thread_check;
use crate::types::{ParameterId, ParameterValue};

/// Result of a successful [`ParameterManager::set_value`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SetOutcome {
    /// The requested value was stored as-is.
    Stored,
    /// The requested value was outside the bounds and was clamped. Reported
    /// even if the clamped value was already stored.
    Clamped {
        requested: ParameterValue,
        stored: ParameterValue,
    },
    /// The stored value already had these bits; listeners were not notified.
    Unchanged,
}

/// A value change delivered to listeners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterChange {
    pub id: ParameterId,
    pub old: ParameterValue,
    pub new: ParameterValue,
}

/// Token returned by [`ParameterManager::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u32);

type Listener = Box<dyn Fn(ParameterChange) + Send + Sync>;

struct Entry {
    info: ParameterInfo,
    value: AtomicF64,
}

/// Owns parameter metadata, values and change listeners.
pub struct ParameterManager {
    entries: Vec<Entry>,
    index_by_id: HashMap<ParameterId, usize>,
    listeners: Vec<(ListenerId, Listener)>,
    max_listeners: usize,
    next_listener: u32,
    frozen: AtomicBool,
    active: AtomicBool,
    clamp_count: AtomicU64,
}

impl ParameterManager {
    /// Create an empty manager.
    ///
    /// The listener table is allocated here at its full capacity.
    pub fn new(config: ManagerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            entries: Vec::new(),
            index_by_id: HashMap::new(),
            listeners: Vec::with_capacity(config.max_listeners),
            max_listeners: config.max_listeners,
            next_listener: 0,
            frozen: AtomicBool::new(false),
            active: AtomicBool::new(false),
            clamp_count: AtomicU64::new(0),
        })
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a parameter. Main thread only.
    ///
    /// The value starts at `info.default`.
    pub fn register(&mut self, info: ParameterInfo) -> ParameterResult<()> {
        thread_check::assert_not_audio_thread("ParameterManager::register");

        if self.is_frozen() {
            return Err(ParameterError::SetFrozen(info.id));
        }
        info.validate()?;
        if self.index_by_id.contains_key(&info.id) {
            return Err(ParameterError::DuplicateId(info.id));
        }

        let index = self.entries.len();
        self.index_by_id.insert(info.id, index);
        self.entries.push(Entry {
            value: AtomicF64::new(info.default),
            info,
        });

        log::debug!(
            "registered parameter {} '{}' at index {} [{}, {}]",
            info.id,
            info.name,
            index,
            info.min,
            info.max
        );
        Ok(())
    }

    /// Register several parameters, stopping at the first error.
    ///
    /// Parameters before the failing one stay registered.
    pub fn register_all<I>(&mut self, infos: I) -> ParameterResult<()>
    where
        I: IntoIterator<Item = ParameterInfo>,
    {
        for info in infos {
            self.register(info)?;
        }
        Ok(())
    }

    /// Freeze the set and mark the plugin active.
    pub fn activate(&self) {
        thread_check::assert_not_audio_thread("ParameterManager::activate");

        self.frozen.store(true, Ordering::Release);
        if !self.active.swap(true, Ordering::AcqRel) {
            log::info!("parameter set activated with {} parameters", self.entries.len());
        }
    }

    /// Mark the plugin inactive. The set stays frozen.
    pub fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }

    /// Returns true between `activate()` and `deactivate()`.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Returns true once registration is closed.
    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    // =========================================================================
    // Host queries
    // =========================================================================

    /// Number of registered parameters. Freezes the set.
    pub fn count(&self) -> usize {
        self.frozen.store(true, Ordering::Release);
        self.entries.len()
    }

    /// Metadata by registration index. Freezes the set.
    pub fn info_by_index(&self, index: usize) -> Option<&ParameterInfo> {
        self.frozen.store(true, Ordering::Release);
        self.entries.get(index).map(|entry| &entry.info)
    }

    /// Metadata by id.
    pub fn info_by_id(&self, id: ParameterId) -> Option<&ParameterInfo> {
        self.entry(id).map(|entry| &entry.info)
    }

    /// Registration index of `id`.
    pub fn index_of(&self, id: ParameterId) -> Option<usize> {
        self.index_by_id.get(&id).copied()
    }

    /// Number of registered parameters without freezing.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // =========================================================================
    // Values
    // =========================================================================

    /// Current value.
    #[inline]
    pub fn value(&self, id: ParameterId) -> ParameterResult<ParameterValue> {
        self.entry(id)
            .map(|entry| entry.value.load())
            .ok_or(ParameterError::UnknownId(id))
    }

    /// Direct access to the value cell for the audio path.
    #[inline]
    pub fn store(&self, id: ParameterId) -> Option<&AtomicF64> {
        self.entry(id).map(|entry| &entry.value)
    }

    /// Set a value, clamping to the parameter's bounds.
    ///
    /// Every clamp is reported, even when the clamped value equals the one
    /// already stored. Listeners run on the calling thread after the store,
    /// and only when the stored bits change.
    pub fn set_value(&self, id: ParameterId, value: ParameterValue) -> ParameterResult<SetOutcome> {
        let entry = self.entry(id).ok_or(ParameterError::UnknownId(id))?;
        if !value.is_finite() {
            return Err(ParameterError::NonFiniteValue(id));
        }

        let stored = entry.info.clamp(value);
        let clamped = stored.to_bits() != value.to_bits();
        let old = entry.value.swap(stored);

        if clamped {
            self.clamp_count.fetch_add(1, Ordering::Relaxed);
            log::debug!("parameter {} clamped from {} to {}", id, value, stored);
        }
        if old.to_bits() != stored.to_bits() {
            self.notify(ParameterChange { id, old, new: stored });
        }

        Ok(if clamped {
            SetOutcome::Clamped {
                requested: value,
                stored,
            }
        } else if old.to_bits() == stored.to_bits() {
            SetOutcome::Unchanged
        } else {
            SetOutcome::Stored
        })
    }

    /// Apply a host parameter event. Audio-thread safe.
    ///
    /// Handles global `ParamValue` events only; per-note values are left to
    /// the plugin. Unknown ids and non-finite values are ignored. Listeners
    /// are not notified. Returns true if a value was stored.
    pub fn apply_event(&self, event: &Event) -> bool {
        let EventBody::ParamValue(param) = &event.body else {
            return false;
        };
        if param.note_id >= 0 || !param.value.is_finite() {
            return false;
        }
        match self.entry(param.param_id) {
            Some(entry) => {
                let stored = entry.info.clamp(param.value);
                if stored.to_bits() != param.value.to_bits() {
                    self.clamp_count.fetch_add(1, Ordering::Relaxed);
                }
                entry.value.store(stored);
                true
            }
            None => false,
        }
    }

    /// Restore every parameter to its default, notifying listeners of changes.
    pub fn reset_to_defaults(&self) {
        for entry in &self.entries {
            let old = entry.value.swap(entry.info.default);
            if old.to_bits() != entry.info.default.to_bits() {
                self.notify(ParameterChange {
                    id: entry.info.id,
                    old,
                    new: entry.info.default,
                });
            }
        }
    }

    /// Visit every parameter in registration order.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&ParameterInfo, ParameterValue),
    {
        for entry in &self.entries {
            f(&entry.info, entry.value.load());
        }
    }

    /// Snapshot of `(id, value)` pairs in registration order.
    pub fn values(&self) -> Vec<(ParameterId, ParameterValue)> {
        self.entries
            .iter()
            .map(|entry| (entry.info.id, entry.value.load()))
            .collect()
    }

    /// Values clamped by `set_value` or `apply_event` since construction.
    #[inline]
    pub fn clamp_count(&self) -> u64 {
        self.clamp_count.load(Ordering::Relaxed)
    }

    // =========================================================================
    // Text conversion
    // =========================================================================

    /// Display text for `value` using the parameter's formatter.
    pub fn value_to_text(&self, id: ParameterId, value: ParameterValue) -> ParameterResult<String> {
        let entry = self.entry(id).ok_or(ParameterError::UnknownId(id))?;
        Ok(entry.info.formatter.text(value))
    }

    /// Parse display text, clamped to the parameter's bounds.
    ///
    /// `Ok(None)` means the id is known but the text did not parse.
    pub fn text_to_value(&self, id: ParameterId, text: &str) -> ParameterResult<Option<ParameterValue>> {
        let entry = self.entry(id).ok_or(ParameterError::UnknownId(id))?;
        Ok(entry
            .info
            .formatter
            .parse(text)
            .filter(|value| value.is_finite())
            .map(|value| entry.info.clamp(value)))
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    /// Add a change listener.
    ///
    /// Listeners are called in registration order after each real change.
    pub fn add_listener<F>(&mut self, listener: F) -> ParameterResult<ListenerId>
    where
        F: Fn(ParameterChange) + Send + Sync + 'static,
    {
        if self.listeners.len() >= self.max_listeners {
            log::warn!("listener table full ({} entries)", self.max_listeners);
            return Err(ParameterError::ListenerCapacity(self.max_listeners));
        }
        let id = ListenerId(self.next_listener);
        self.next_listener = self.next_listener.wrapping_add(1);
        self.listeners.push((id, Box::new(listener)));
        Ok(id)
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        match self.listeners.iter().position(|(listener_id, _)| *listener_id == id) {
            Some(position) => {
                self.listeners.remove(position);
                true
            }
            None => false,
        }
    }

    /// Number of registered listeners.
    #[inline]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn notify(&self, change: ParameterChange) {
        for (_, listener) in &self.listeners {
            listener(change);
        }
    }

    #[inline]
    fn entry(&self, id: ParameterId) -> Option<&Entry> {
        self.index_by_id.get(&id).map(|&index| &self.entries[index])
    }
}

impl fmt::Debug for ParameterManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterManager")
            .field("parameters", &self.entries.len())
            .field("listeners", &self.listeners.len())
            .field("frozen", &self.is_frozen())
            .field("active", &self.is_active())
            .field("clamp_count", &self.clamp_count())
            .finish()
    }
}
