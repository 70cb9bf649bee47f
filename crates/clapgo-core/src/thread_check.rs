//! Thread-role tracking and audio-thread discipline checks.
//!
//! CLAP assigns each plugin call to a thread role: `process` runs on the
//! audio thread, while lifecycle, parameter registration and state calls run
//! on the main thread. This module records the role of the current thread
//! and provides assertions that catch misuse during development.
//!
//! The `assert_*` functions are active only with `debug_assertions`; in
//! release builds they compile to nothing so the audio path pays no cost.
//!
//! # Example
//!
//! ```ignore
//! use clapgo_core::thread_check::{self, AudioThreadScope};
//!
//! thread_check::set_main_thread();
//!
//! std::thread::spawn(|| {
//!     let _audio = AudioThreadScope::enter();
//!     thread_check::assert_audio_thread("process");
//! });
//! ```

use std::cell::Cell;

/// Role of a thread from the plugin's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThreadRole {
    /// Host main thread (lifecycle, parameters, state).
    Main,
    /// Real-time audio thread (`process`).
    Audio,
    /// Not marked.
    #[default]
    Unknown,
}

thread_local! {
    static CURRENT_ROLE: Cell<ThreadRole> = const { Cell::new(ThreadRole::Unknown) };
}

/// Mark the calling thread as the main thread.
pub fn set_main_thread() {
    CURRENT_ROLE.with(|role| role.set(ThreadRole::Main));
}

/// Clear any role mark on the calling thread.
pub fn clear_thread_role() {
    CURRENT_ROLE.with(|role| role.set(ThreadRole::Unknown));
}

/// Role of the calling thread.
#[inline]
pub fn current_role() -> ThreadRole {
    CURRENT_ROLE.with(|role| role.get())
}

/// Returns true if the calling thread is marked as the audio thread.
#[inline]
pub fn is_audio_thread() -> bool {
    current_role() == ThreadRole::Audio
}

/// Returns true if the calling thread is marked as the main thread.
#[inline]
pub fn is_main_thread() -> bool {
    current_role() == ThreadRole::Main
}

/// RAII guard marking the calling thread as the audio thread.
///
/// The previous role is restored on drop, so scopes nest correctly when a
/// host drives `process` from a thread it also uses for other work.
#[must_use = "the audio role is cleared when the scope is dropped"]
pub struct AudioThreadScope {
    previous: ThreadRole,
    // Thread-local state: the guard must be dropped on the thread that made it.
    _not_send: std::marker::PhantomData<*const ()>,
}

impl AudioThreadScope {
    /// Mark the calling thread as audio until the guard is dropped.
    pub fn enter() -> Self {
        let previous = CURRENT_ROLE.with(|role| role.replace(ThreadRole::Audio));
        Self {
            previous,
            _not_send: std::marker::PhantomData,
        }
    }
}

impl Drop for AudioThreadScope {
    fn drop(&mut self) {
        let previous = self.previous;
        CURRENT_ROLE.with(|role| role.set(previous));
    }
}

/// Panics in debug builds unless called from a thread marked as audio.
#[inline]
#[track_caller]
pub fn assert_audio_thread(operation: &str) {
    if cfg!(debug_assertions) && !is_audio_thread() {
        panic!(
            "thread violation: {} must be called from the audio thread (current: {:?})",
            operation,
            current_role()
        );
    }
}

/// Panics in debug builds if the calling thread is marked as something other
/// than main.
///
/// Unmarked threads pass: hosts that never announce their main thread should
/// not trip the check.
#[inline]
#[track_caller]
pub fn assert_main_thread(operation: &str) {
    if cfg!(debug_assertions) && current_role() == ThreadRole::Audio {
        panic!(
            "thread violation: {} must be called from the main thread",
            operation
        );
    }
}

/// Panics in debug builds if the calling thread is marked as audio.
#[inline]
#[track_caller]
pub fn assert_not_audio_thread(operation: &str) {
    if cfg!(debug_assertions) && is_audio_thread() {
        panic!(
            "thread violation: {} is not allowed on the audio thread",
            operation
        );
    }
}

// =============================================================================
// Host-provided thread check
// =============================================================================

/// Host-side thread identification (the CLAP `thread-check` extension).
///
/// Each method returns `None` when the host cannot answer.
pub trait HostThreadCheck: Send + Sync {
    /// Whether the calling thread is the host's main thread.
    fn is_main_thread(&self) -> Option<bool>;

    /// Whether the calling thread is one of the host's audio threads.
    fn is_audio_thread(&self) -> Option<bool>;
}

/// Combines a host thread check with the local role marks.
///
/// The host's answer wins when available; otherwise the thread-local mark is
/// used.
#[derive(Default)]
pub struct ThreadChecker {
    host: Option<Box<dyn HostThreadCheck>>,
}

impl ThreadChecker {
    /// Checker with only local marks.
    pub fn new() -> Self {
        Self { host: None }
    }

    /// Checker that consults the host first.
    pub fn with_host(host: Box<dyn HostThreadCheck>) -> Self {
        Self { host: Some(host) }
    }

    /// Returns true if a host check is installed.
    pub fn has_host_check(&self) -> bool {
        self.host.is_some()
    }

    /// Whether the calling thread is the audio thread.
    pub fn is_audio_thread(&self) -> bool {
        self.host
            .as_ref()
            .and_then(|host| host.is_audio_thread())
            .unwrap_or_else(is_audio_thread)
    }

    /// Whether the calling thread is the main thread.
    pub fn is_main_thread(&self) -> bool {
        self.host
            .as_ref()
            .and_then(|host| host.is_main_thread())
            .unwrap_or_else(is_main_thread)
    }

    /// Panics in debug builds unless on the audio thread.
    #[track_caller]
    pub fn assert_audio_thread(&self, operation: &str) {
        if cfg!(debug_assertions) && !self.is_audio_thread() {
            panic!("{} must be called from the audio thread", operation);
        }
    }

    /// Panics in debug builds if on the audio thread.
    #[track_caller]
    pub fn assert_not_audio_thread(&self, operation: &str) {
        if cfg!(debug_assertions) && self.is_audio_thread() {
            panic!("{} is not allowed on the audio thread", operation);
        }
    }
}
