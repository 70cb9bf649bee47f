//! Pre-allocated SysEx payload storage for real-time safety.
//!
//! MIDI SysEx is the only variable-length CLAP event. Rather than holding a
//! pointer into host memory (which is only valid for the duration of the
//! host's callback) or copying into a fresh `Vec`, the staging path copies the
//! bytes into one of a fixed number of pre-allocated slots and the event
//! carries a [`SysexRef`] to it.

use crate::error::ConfigError;
use crate::event::SysexRef;

/// Fixed set of SysEx buffers, reused every block.
pub struct SysexPool {
    /// One contiguous buffer, `slots * slot_size` bytes.
    storage: Vec<u8>,
    /// Valid length in each slot.
    lengths: Vec<u32>,
    slot_size: usize,
    next_slot: usize,
    dropped: u64,
    truncated: u64,
}

impl SysexPool {
    /// Default number of slots per block.
    pub const DEFAULT_SLOTS: usize = 16;

    /// Create a pool of `slots` buffers of `slot_size` bytes each.
    ///
    /// All memory is allocated here; `store()` never allocates. Fails when
    /// the total size overflows or a slot dimension does not fit the `u32`
    /// fields of [`SysexRef`].
    pub fn with_capacity(slots: usize, slot_size: usize) -> Result<Self, ConfigError> {
        let bytes = Self::storage_len(slots, slot_size)
            .ok_or(ConfigError::SysexSizeOverflow { slots, slot_size })?;
        Ok(Self::allocate(slots, slot_size, bytes))
    }

    /// Total bytes needed for `slots` buffers of `slot_size`, or `None` if
    /// the sizing cannot be represented.
    pub fn storage_len(slots: usize, slot_size: usize) -> Option<usize> {
        u32::try_from(slots).ok()?;
        u32::try_from(slot_size).ok()?;
        slots.checked_mul(slot_size)
    }

    fn allocate(slots: usize, slot_size: usize, bytes: usize) -> Self {
        Self {
            storage: vec![0u8; bytes],
            lengths: vec![0u32; slots],
            slot_size,
            next_slot: 0,
            dropped: 0,
            truncated: 0,
        }
    }

    /// Release every slot. O(1).
    #[inline]
    pub fn clear(&mut self) {
        self.next_slot = 0;
    }

    /// Copy `data` into the next free slot.
    ///
    /// Payloads longer than the slot size are truncated and counted.
    /// Returns `None` and counts a drop when every slot is in use.
    pub fn store(&mut self, port: u16, data: &[u8]) -> Option<SysexRef> {
        if self.next_slot >= self.lengths.len() {
            self.dropped += 1;
            return None;
        }

        let slot = self.next_slot;
        self.next_slot += 1;

        let copy_len = data.len().min(self.slot_size);
        if copy_len < data.len() {
            self.truncated += 1;
        }
        let start = slot * self.slot_size;
        self.storage[start..start + copy_len].copy_from_slice(&data[..copy_len]);
        self.lengths[slot] = copy_len as u32;

        Some(SysexRef {
            port,
            slot: slot as u32,
            len: copy_len as u32,
        })
    }

    /// Payload for a reference produced during the current block.
    ///
    /// Returns `None` for references whose slot has not been filled since the
    /// last `clear()`.
    pub fn get(&self, sysex: &SysexRef) -> Option<&[u8]> {
        let slot = sysex.slot as usize;
        if slot >= self.next_slot {
            return None;
        }
        let len = (self.lengths[slot] as usize).min(sysex.len as usize);
        let start = slot * self.slot_size;
        Some(&self.storage[start..start + len])
    }

    /// Slot count.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.lengths.len()
    }

    /// Bytes per slot.
    #[inline]
    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    /// Slots used in the current block.
    #[inline]
    pub fn used(&self) -> usize {
        self.next_slot
    }

    /// Payloads dropped since construction.
    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Payloads truncated since construction.
    #[inline]
    pub fn truncated(&self) -> u64 {
        self.truncated
    }
}

impl Default for SysexPool {
    fn default() -> Self {
        let slot_size = crate::config::DEFAULT_SYSEX_SLOT_SIZE;
        Self::allocate(Self::DEFAULT_SLOTS, slot_size, Self::DEFAULT_SLOTS * slot_size)
    }
}
