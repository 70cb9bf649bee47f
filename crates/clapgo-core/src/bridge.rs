//! Per-block event staging and dispatch.
//!
//! [`EventBridge`] sits between the host's event lists and plugin logic.
//! During `process` the glue layer:
//!
//! 1. calls [`EventBridge::begin_block`] with the block's frame count,
//! 2. stages every host input event with [`EventBridge::push_input`] (or
//!    [`EventBridge::push_sysex`] for SysEx payloads),
//! 3. calls [`EventBridge::dispatch`], which applies parameter changes and
//!    routes each event to an [`EventHandler`] in time order,
//! 4. drains [`EventBridge::output`] into the host's output list.
//!
//! Every buffer is allocated in [`EventBridge::new`]. Nothing on this path
//! allocates, locks or logs; overflow is counted and reported later through
//! [`EventBridge::stats`].

use crate::config::PoolConfig;
use crate::error::ConfigError;
use crate::event::{
    Event, EventBody, EventHeader, Midi, Midi2, NoteEvent, NoteExpression, ParamMod, ParamValue,
    SysexRef, Transport,
};
use crate::event_pool::{EventHandle, EventPool, PoolMonitor, PoolStats};
use crate::parameter_manager::ParameterManager;
use crate::sysex_pool::SysexPool;
use crate::thread_check::{self, ThreadRole};
use crate::types::{FrameOffset, ParameterId};

// =============================================================================
// EventHandler
// =============================================================================

/// Receives dispatched events. Every method defaults to a no-op, so handlers
/// implement only what they care about.
pub trait EventHandler {
    fn on_note_on(&mut self, _time: FrameOffset, _note: &NoteEvent) {}

    fn on_note_off(&mut self, _time: FrameOffset, _note: &NoteEvent) {}

    fn on_note_choke(&mut self, _time: FrameOffset, _note: &NoteEvent) {}

    fn on_note_end(&mut self, _time: FrameOffset, _note: &NoteEvent) {}

    fn on_note_expression(&mut self, _time: FrameOffset, _expression: &NoteExpression) {}

    /// Called after the value has been applied to the parameter manager, if
    /// one was passed to `dispatch`.
    fn on_param_value(&mut self, _time: FrameOffset, _param: &ParamValue) {}

    fn on_param_mod(&mut self, _time: FrameOffset, _param: &ParamMod) {}

    fn on_param_gesture_begin(&mut self, _time: FrameOffset, _param_id: ParameterId) {}

    fn on_param_gesture_end(&mut self, _time: FrameOffset, _param_id: ParameterId) {}

    fn on_transport(&mut self, _time: FrameOffset, _transport: &Transport) {}

    fn on_midi(&mut self, _time: FrameOffset, _midi: &Midi) {}

    /// `data` borrows the bridge's SysEx pool and is valid until the next block.
    fn on_midi_sysex(&mut self, _time: FrameOffset, _port: u16, _data: &[u8]) {}

    fn on_midi2(&mut self, _time: FrameOffset, _midi: &Midi2) {}
}

/// Handler that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl EventHandler for NoOpHandler {}

// =============================================================================
// OutputEvents
// =============================================================================

/// Fixed-capacity queue of events sent back to the host.
///
/// Hosts require output events in non-decreasing time order. A push that
/// would break the order is rejected and counted, as is a push into a full
/// queue.
#[derive(Debug)]
pub struct OutputEvents {
    events: Vec<Event>,
    capacity: usize,
    rejected_order: u64,
    rejected_full: u64,
}

impl OutputEvents {
    /// Allocate a queue for `capacity` events.
    pub fn with_capacity(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroOutputCapacity);
        }
        Ok(Self {
            events: Vec::with_capacity(capacity),
            capacity,
            rejected_order: 0,
            rejected_full: 0,
        })
    }

    /// Queue an event. Returns false if it was rejected.
    pub fn try_push(&mut self, event: Event) -> bool {
        if let Some(last) = self.events.last() {
            if event.time() < last.time() {
                self.rejected_order += 1;
                return false;
            }
        }
        if self.events.len() >= self.capacity {
            self.rejected_full += 1;
            return false;
        }
        self.events.push(event);
        true
    }

    /// Empty the queue. Counters are kept.
    #[inline]
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Queued events in order.
    #[inline]
    pub fn as_slice(&self) -> &[Event] {
        &self.events
    }

    /// Iterate queued events in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events rejected for arriving earlier than the previous one.
    #[inline]
    pub fn rejected_out_of_order(&self) -> u64 {
        self.rejected_order
    }

    /// Events rejected because the queue was full.
    #[inline]
    pub fn rejected_full(&self) -> u64 {
        self.rejected_full
    }
}

impl<'a> IntoIterator for &'a OutputEvents {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

// =============================================================================
// EventBridge
// =============================================================================

/// Bridge diagnostics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BridgeStats {
    pub pool: PoolStats,
    /// Input events whose time was past the end of the block.
    pub late_events: u64,
    pub sysex_dropped: u64,
    pub sysex_truncated: u64,
    pub output_out_of_order: u64,
    pub output_full: u64,
}

impl BridgeStats {
    /// Returns true if any event was lost or altered.
    pub fn has_losses(&self) -> bool {
        self.pool.dropped > 0
            || self.late_events > 0
            || self.sysex_dropped > 0
            || self.sysex_truncated > 0
            || self.output_out_of_order > 0
            || self.output_full > 0
    }

    /// Log a summary. Never call this from the audio thread.
    pub fn log_diagnostics(&self) {
        if self.has_losses() {
            log::warn!(
                "event bridge: {} pool drops, {} late, {} sysex dropped, {} sysex truncated, {} output out of order, {} output full",
                self.pool.dropped,
                self.late_events,
                self.sysex_dropped,
                self.sysex_truncated,
                self.output_out_of_order,
                self.output_full
            );
        }
        log::debug!(
            "event bridge: {} blocks, pool high water {}/{}",
            self.pool.blocks,
            self.pool.high_water,
            self.pool.capacity
        );
    }
}

/// Stages host events for one block and dispatches them in time order.
pub struct EventBridge {
    pool: EventPool,
    sysex: SysexPool,
    /// Staged handles sorted by time, stable for equal times.
    order: Vec<EventHandle>,
    output: OutputEvents,
    frames: u32,
    late_events: u64,
}

impl EventBridge {
    /// Allocate all per-block storage.
    pub fn new(config: &PoolConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let capacity = config.event_capacity();
        let bridge = Self {
            pool: EventPool::new(capacity)?,
            sysex: SysexPool::with_capacity(config.sysex_slots, config.sysex_slot_size)?,
            order: Vec::with_capacity(capacity),
            output: OutputEvents::with_capacity(config.output_capacity)?,
            frames: 0,
            late_events: 0,
        };
        log::debug!(
            "event bridge: {} event slots, {} sysex slots of {} bytes, {} output slots",
            capacity,
            config.sysex_slots,
            config.sysex_slot_size,
            config.output_capacity
        );
        Ok(bridge)
    }

    /// Start a block of `frames` samples. Invalidates everything staged or
    /// queued in the previous block.
    pub fn begin_block(&mut self, frames: u32) {
        debug_assert!(
            thread_check::current_role() != ThreadRole::Main,
            "EventBridge::begin_block called on the main thread"
        );
        self.order.clear();
        self.pool.reset();
        self.sysex.clear();
        self.output.clear();
        self.frames = frames;
    }

    /// Stage one input event. Returns false if the pool is full.
    ///
    /// Events timed at or past the end of the block are moved to the last
    /// frame. Events with equal times keep their arrival order.
    ///
    /// Appending is O(1) when events arrive in time order, as CLAP hosts
    /// deliver them. Out-of-order input is inserted in place at O(n) each.
    pub fn push_input(&mut self, mut event: Event) -> bool {
        let last_frame = self.frames.saturating_sub(1);
        if event.header.time > last_frame {
            event.header.time = last_frame;
            self.late_events += 1;
        }
        let time = event.time();

        let Some(handle) = self.pool.stage(event) else {
            return false;
        };
        let pool = &self.pool;
        let position = self
            .order
            .partition_point(|staged| pool.get(staged).is_some_and(|e| e.time() <= time));
        self.order.insert(position, handle);
        true
    }

    /// Copy a SysEx payload and stage an event for it.
    ///
    /// Payloads longer than the slot size are truncated. Returns false if
    /// the SysEx pool or the event pool is full. A full event pool is
    /// counted as a drop and leaves the SysEx slot free.
    pub fn push_sysex(&mut self, header: EventHeader, port: u16, data: &[u8]) -> bool {
        if self.pool.available() == 0 {
            self.pool.record_drop();
            return false;
        }
        match self.sysex.store(port, data) {
            Some(sysex) => self.push_input(Event {
                header,
                body: EventBody::MidiSysex(sysex),
            }),
            None => false,
        }
    }

    /// Route every staged event to `handler` in time order.
    ///
    /// With a parameter manager, global parameter values are stored before
    /// `on_param_value` runs. Returns the number of events dispatched.
    pub fn dispatch<H>(&self, handler: &mut H, params: Option<&ParameterManager>) -> usize
    where
        H: EventHandler + ?Sized,
    {
        let mut dispatched = 0;
        for event in self.events() {
            let time = event.time();
            match &event.body {
                EventBody::NoteOn(note) => handler.on_note_on(time, note),
                EventBody::NoteOff(note) => handler.on_note_off(time, note),
                EventBody::NoteChoke(note) => handler.on_note_choke(time, note),
                EventBody::NoteEnd(note) => handler.on_note_end(time, note),
                EventBody::NoteExpression(expression) => {
                    handler.on_note_expression(time, expression)
                }
                EventBody::ParamValue(param) => {
                    if let Some(params) = params {
                        params.apply_event(event);
                    }
                    handler.on_param_value(time, param);
                }
                EventBody::ParamMod(param) => handler.on_param_mod(time, param),
                EventBody::ParamGestureBegin(gesture) => {
                    handler.on_param_gesture_begin(time, gesture.param_id)
                }
                EventBody::ParamGestureEnd(gesture) => {
                    handler.on_param_gesture_end(time, gesture.param_id)
                }
                EventBody::Transport(transport) => handler.on_transport(time, transport),
                EventBody::Midi(midi) => handler.on_midi(time, midi),
                EventBody::MidiSysex(sysex) => {
                    if let Some(data) = self.sysex.get(sysex) {
                        handler.on_midi_sysex(time, sysex.port, data);
                    }
                }
                EventBody::Midi2(midi) => handler.on_midi2(time, midi),
            }
            dispatched += 1;
        }
        dispatched
    }

    /// Staged events in dispatch order.
    pub fn events(&self) -> impl Iterator<Item = &Event> + '_ {
        self.order.iter().filter_map(|handle| self.pool.get(handle))
    }

    /// Number of staged events.
    #[inline]
    pub fn staged(&self) -> usize {
        self.order.len()
    }

    /// Payload for a SysEx event staged in this block.
    pub fn sysex_data(&self, sysex: &SysexRef) -> Option<&[u8]> {
        self.sysex.get(sysex)
    }

    /// Frame count of the current block.
    #[inline]
    pub fn frames(&self) -> u32 {
        self.frames
    }

    /// Output queue for this block.
    #[inline]
    pub fn output(&self) -> &OutputEvents {
        &self.output
    }

    /// Mutable output queue, for plugin logic that emits events.
    #[inline]
    pub fn output_mut(&mut self) -> &mut OutputEvents {
        &mut self.output
    }

    /// Pool counter view for another thread.
    pub fn monitor(&self) -> PoolMonitor {
        self.pool.monitor()
    }

    /// Current diagnostics.
    pub fn stats(&self) -> BridgeStats {
        BridgeStats {
            pool: self.pool.monitor().stats(),
            late_events: self.late_events,
            sysex_dropped: self.sysex.dropped(),
            sysex_truncated: self.sysex.truncated(),
            output_out_of_order: self.output.rejected_out_of_order(),
            output_full: self.output.rejected_full(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ManagerConfig;
    use crate::parameter_info::ParameterInfo;

    #[derive(Default)]
    struct Recorder {
        log: Vec<(FrameOffset, &'static str, i64)>,
        sysex: Vec<Vec<u8>>,
    }

    impl EventHandler for Recorder {
        fn on_note_on(&mut self, time: FrameOffset, note: &NoteEvent) {
            self.log.push((time, "note_on", note.key as i64));
        }

        fn on_note_off(&mut self, time: FrameOffset, note: &NoteEvent) {
            self.log.push((time, "note_off", note.key as i64));
        }

        fn on_param_value(&mut self, time: FrameOffset, param: &ParamValue) {
            self.log.push((time, "param", param.param_id as i64));
        }

        fn on_midi_sysex(&mut self, time: FrameOffset, _port: u16, data: &[u8]) {
            self.log.push((time, "sysex", data.len() as i64));
            self.sysex.push(data.to_vec());
        }
    }

    fn bridge(capacity: usize) -> EventBridge {
        EventBridge::new(&PoolConfig::new().with_capacity(capacity).with_sysex(2, 8)).unwrap()
    }

    fn note(key: i16) -> NoteEvent {
        NoteEvent::new(0, 0, key, 1.0)
    }

    #[test]
    fn test_dispatch_in_time_order() {
        let mut bridge = bridge(16);
        bridge.begin_block(64);

        assert!(bridge.push_input(Event::note_on(32, note(60))));
        assert!(bridge.push_input(Event::note_on(0, note(62))));
        assert!(bridge.push_input(Event::note_off(32, note(64))));
        assert!(bridge.push_input(Event::note_off(10, note(66))));

        let mut recorder = Recorder::default();
        assert_eq!(bridge.dispatch(&mut recorder, None), 4);
        assert_eq!(
            recorder.log,
            vec![
                (0, "note_on", 62),
                (10, "note_off", 66),
                (32, "note_on", 60),
                (32, "note_off", 64),
            ]
        );
    }

    #[test]
    fn test_late_events_are_clamped() {
        let mut bridge = bridge(16);
        bridge.begin_block(32);

        assert!(bridge.push_input(Event::note_on(100, note(60))));
        assert!(bridge.push_input(Event::note_on(31, note(61))));

        let times: Vec<_> = bridge.events().map(|e| e.time()).collect();
        assert_eq!(times, vec![31, 31]);
        assert_eq!(bridge.stats().late_events, 1);
    }

    #[test]
    fn test_pool_exhaustion_drops() {
        let mut bridge = bridge(2);
        bridge.begin_block(64);

        assert!(bridge.push_input(Event::note_on(0, note(60))));
        assert!(bridge.push_input(Event::note_on(1, note(61))));
        assert!(!bridge.push_input(Event::note_on(2, note(62))));

        let stats = bridge.stats();
        assert_eq!(stats.pool.dropped, 1);
        assert!(stats.has_losses());

        bridge.begin_block(64);
        assert_eq!(bridge.staged(), 0);
        assert!(bridge.push_input(Event::note_on(0, note(60))));
    }

    #[test]
    fn test_dispatch_applies_parameters() {
        let mut params = ParameterManager::new(ManagerConfig::default()).unwrap();
        params
            .register(ParameterInfo::new(3, "Cutoff", 0.0, 1.0, 0.5))
            .unwrap();

        let mut bridge = bridge(16);
        bridge.begin_block(64);
        bridge.push_input(Event::param_value(8, 3, 0.9));

        let mut recorder = Recorder::default();
        bridge.dispatch(&mut recorder, Some(&params));
        assert_eq!(params.value(3), Ok(0.9));
        assert_eq!(recorder.log, vec![(8, "param", 3)]);

        bridge.dispatch(&mut NoOpHandler, None);
    }

    #[test]
    fn test_sysex_staging() {
        let mut bridge = bridge(16);
        bridge.begin_block(64);

        let payload = [0xF0, 0x7E, 0x00, 0x06, 0x01, 0xF7];
        assert!(bridge.push_sysex(EventHeader::at(4), 0, &payload));
        let oversized = [0u8; 12];
        assert!(bridge.push_sysex(EventHeader::at(5), 0, &oversized));
        assert!(!bridge.push_sysex(EventHeader::at(6), 0, &payload));

        let mut recorder = Recorder::default();
        bridge.dispatch(&mut recorder, None);
        assert_eq!(recorder.sysex[0], payload);
        assert_eq!(recorder.sysex[1].len(), 8);

        let stats = bridge.stats();
        assert_eq!(stats.sysex_truncated, 1);
        assert_eq!(stats.sysex_dropped, 1);
    }

    #[test]
    fn test_full_pool_keeps_sysex_slot() {
        let mut bridge = bridge(1);
        bridge.begin_block(64);
        let payload = [0xF0, 0x01, 0xF7];

        assert!(bridge.push_input(Event::note_on(0, note(60))));
        assert!(!bridge.push_sysex(EventHeader::at(1), 0, &payload));

        let stats = bridge.stats();
        assert_eq!(stats.pool.dropped, 1);
        assert_eq!(stats.sysex_dropped, 0);
        assert_eq!(bridge.sysex.used(), 0);
    }

    #[test]
    fn test_oversized_sysex_config_fails() {
        let config = PoolConfig::new()
            .with_capacity(8)
            .with_sysex(2, usize::MAX / 2 + 1);
        assert!(matches!(
            EventBridge::new(&config),
            Err(ConfigError::SysexSizeOverflow { .. })
        ));
    }

    #[test]
    fn test_output_order_enforced() {
        let mut output = OutputEvents::with_capacity(2).unwrap();

        assert!(output.try_push(Event::note_off(10, note(60))));
        assert!(!output.try_push(Event::note_off(5, note(61))));
        assert!(output.try_push(Event::note_off(10, note(62))));
        assert!(!output.try_push(Event::note_off(11, note(63))));

        assert_eq!(output.len(), 2);
        assert_eq!(output.rejected_out_of_order(), 1);
        assert_eq!(output.rejected_full(), 1);

        output.clear();
        assert!(output.try_push(Event::note_off(0, note(60))));
    }

    #[test]
    fn test_zero_output_capacity() {
        assert!(matches!(
            OutputEvents::with_capacity(0),
            Err(ConfigError::ZeroOutputCapacity)
        ));
    }

    #[test]
    fn test_begin_block_clears_output() {
        let mut bridge = bridge(4);
        bridge.begin_block(64);
        bridge.output_mut().try_push(Event::note_end(3, note(60)));
        assert_eq!(bridge.output().len(), 1);

        bridge.begin_block(64);
        assert!(bridge.output().is_empty());
    }
}
