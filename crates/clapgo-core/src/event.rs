//! CLAP event model.
//!
//! [`Event`] is a plain `Copy` value: a common [`EventHeader`] plus an
//! [`EventBody`] tagged union covering every core CLAP event type. Because
//! events hold no heap data they can live in pre-allocated pool slots and be
//! copied in and out without touching the allocator. SysEx payloads are the
//! one variable-length case; they are referenced through a [`SysexRef`] into
//! a [`SysexPool`](crate::sysex_pool::SysexPool) owned by the staging path.
//!
//! Numeric kinds and flag bits match the CLAP ABI so glue code can convert
//! raw host structures one-to-one.

use crate::types::{FrameOffset, NoteId, ParameterId, CORE_EVENT_SPACE_ID, WILDCARD};

// =============================================================================
// Header
// =============================================================================

/// Event flags (`CLAP_EVENT_IS_LIVE`, `CLAP_EVENT_DONT_RECORD`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventFlags(pub u32);

impl EventFlags {
    /// No flags.
    pub const NONE: Self = Self(0);
    /// Event comes from live user input.
    pub const IS_LIVE: Self = Self(1 << 0);
    /// Event should not be recorded.
    pub const DONT_RECORD: Self = Self(1 << 1);

    /// Check if a flag is set.
    pub const fn contains(&self, flag: Self) -> bool {
        (self.0 & flag.0) == flag.0
    }

    /// Combine flags.
    pub const fn or(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// Fields shared by every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventHeader {
    /// Sample offset within the current block.
    pub time: FrameOffset,
    /// Event space. Core events use [`CORE_EVENT_SPACE_ID`].
    pub space_id: u16,
    /// Event flags.
    pub flags: EventFlags,
}

impl EventHeader {
    /// Core-space header at `time` with no flags.
    pub const fn at(time: FrameOffset) -> Self {
        Self {
            time,
            space_id: CORE_EVENT_SPACE_ID,
            flags: EventFlags::NONE,
        }
    }
}

/// Event type tag, numbered as in `clap/events.h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum EventKind {
    NoteOn = 0,
    NoteOff = 1,
    NoteChoke = 2,
    NoteEnd = 3,
    NoteExpression = 4,
    ParamValue = 5,
    ParamMod = 6,
    ParamGestureBegin = 7,
    ParamGestureEnd = 8,
    Transport = 9,
    Midi = 10,
    MidiSysex = 11,
    Midi2 = 12,
}

impl EventKind {
    /// Map a raw CLAP event type to a kind.
    pub const fn from_raw(raw: u16) -> Option<Self> {
        Some(match raw {
            0 => Self::NoteOn,
            1 => Self::NoteOff,
            2 => Self::NoteChoke,
            3 => Self::NoteEnd,
            4 => Self::NoteExpression,
            5 => Self::ParamValue,
            6 => Self::ParamMod,
            7 => Self::ParamGestureBegin,
            8 => Self::ParamGestureEnd,
            9 => Self::Transport,
            10 => Self::Midi,
            11 => Self::MidiSysex,
            12 => Self::Midi2,
            _ => return None,
        })
    }

    /// Raw CLAP event type.
    pub const fn as_raw(self) -> u16 {
        self as u16
    }
}

// =============================================================================
// Payloads
// =============================================================================

/// Note on/off/choke/end payload.
///
/// Negative `note_id`, `port`, `channel` or `key` act as wildcards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEvent {
    pub note_id: NoteId,
    pub port: i16,
    pub channel: i16,
    pub key: i16,
    /// Velocity in 0.0..=1.0.
    pub velocity: f64,
}

impl NoteEvent {
    /// Note addressed by port, channel and key, with no host note id.
    pub const fn new(port: i16, channel: i16, key: i16, velocity: f64) -> Self {
        Self {
            note_id: -1,
            port,
            channel,
            key,
            velocity,
        }
    }

    /// Attach a host note id.
    pub const fn with_note_id(mut self, note_id: NoteId) -> Self {
        self.note_id = note_id;
        self
    }
}

/// Note expression identifiers (`CLAP_NOTE_EXPRESSION_*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum NoteExpressionId {
    /// 0.0 < x <= 4.0, plain gain.
    Volume = 0,
    /// 0.0 left, 0.5 center, 1.0 right.
    Pan = 1,
    /// Relative tuning in semitones, -120..=120.
    Tuning = 2,
    Vibrato = 3,
    Expression = 4,
    Brightness = 5,
    Pressure = 6,
}

impl NoteExpressionId {
    /// Map a raw expression id.
    pub const fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw {
            0 => Self::Volume,
            1 => Self::Pan,
            2 => Self::Tuning,
            3 => Self::Vibrato,
            4 => Self::Expression,
            5 => Self::Brightness,
            6 => Self::Pressure,
            _ => return None,
        })
    }
}

/// Per-note expression payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteExpression {
    pub expression: NoteExpressionId,
    pub note_id: NoteId,
    pub port: i16,
    pub channel: i16,
    pub key: i16,
    pub value: f64,
}

/// Parameter value change.
///
/// `cookie` is the opaque host cookie, carried as an address so the event
/// stays `Send`. Zero means no cookie.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamValue {
    pub param_id: ParameterId,
    pub cookie: usize,
    pub note_id: NoteId,
    pub port: i16,
    pub channel: i16,
    pub key: i16,
    pub value: f64,
}

/// Parameter modulation offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamMod {
    pub param_id: ParameterId,
    pub cookie: usize,
    pub note_id: NoteId,
    pub port: i16,
    pub channel: i16,
    pub key: i16,
    pub amount: f64,
}

/// Begin or end of a user gesture on a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamGesture {
    pub param_id: ParameterId,
}

/// Transport flags (`CLAP_TRANSPORT_*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransportFlags(pub u32);

impl TransportFlags {
    pub const HAS_TEMPO: Self = Self(1 << 0);
    pub const HAS_BEATS_TIMELINE: Self = Self(1 << 1);
    pub const HAS_SECONDS_TIMELINE: Self = Self(1 << 2);
    pub const HAS_TIME_SIGNATURE: Self = Self(1 << 3);
    pub const IS_PLAYING: Self = Self(1 << 4);
    pub const IS_RECORDING: Self = Self(1 << 5);
    pub const IS_LOOP_ACTIVE: Self = Self(1 << 6);
    pub const IS_WITHIN_PRE_ROLL: Self = Self(1 << 7);

    /// Check if a flag is set.
    pub const fn contains(&self, flag: Self) -> bool {
        (self.0 & flag.0) == flag.0
    }

    /// Combine flags.
    pub const fn or(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// Transport state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transport {
    pub flags: TransportFlags,
    pub song_pos_beats: f64,
    pub song_pos_seconds: f64,
    /// Tempo in BPM.
    pub tempo: f64,
    /// Tempo increment per sample.
    pub tempo_inc: f64,
    pub loop_start_beats: f64,
    pub loop_end_beats: f64,
    pub loop_start_seconds: f64,
    pub loop_end_seconds: f64,
    /// Start of the current bar, in beats.
    pub bar_start: f64,
    pub bar_number: i32,
    pub time_signature_numerator: u16,
    pub time_signature_denominator: u16,
}

impl Transport {
    /// Returns true if the host is playing.
    pub const fn is_playing(&self) -> bool {
        self.flags.contains(TransportFlags::IS_PLAYING)
    }

    /// Tempo, if the host provided one.
    pub fn tempo(&self) -> Option<f64> {
        self.flags
            .contains(TransportFlags::HAS_TEMPO)
            .then_some(self.tempo)
    }
}

/// MIDI 1.0 message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Midi {
    pub port: u16,
    pub data: [u8; 3],
}

/// SysEx payload stored in the block's SysEx pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SysexRef {
    pub port: u16,
    /// Slot index inside the owning pool.
    pub slot: u32,
    /// Stored payload length (after truncation).
    pub len: u32,
}

/// MIDI 2.0 universal MIDI packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Midi2 {
    pub port: u16,
    pub data: [u32; 4],
}

// =============================================================================
// Event
// =============================================================================

/// Event payload, tagged by kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventBody {
    NoteOn(NoteEvent),
    NoteOff(NoteEvent),
    NoteChoke(NoteEvent),
    NoteEnd(NoteEvent),
    NoteExpression(NoteExpression),
    ParamValue(ParamValue),
    ParamMod(ParamMod),
    ParamGestureBegin(ParamGesture),
    ParamGestureEnd(ParamGesture),
    Transport(Transport),
    Midi(Midi),
    MidiSysex(SysexRef),
    Midi2(Midi2),
}

impl EventBody {
    /// Kind tag of this payload.
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::NoteOn(_) => EventKind::NoteOn,
            Self::NoteOff(_) => EventKind::NoteOff,
            Self::NoteChoke(_) => EventKind::NoteChoke,
            Self::NoteEnd(_) => EventKind::NoteEnd,
            Self::NoteExpression(_) => EventKind::NoteExpression,
            Self::ParamValue(_) => EventKind::ParamValue,
            Self::ParamMod(_) => EventKind::ParamMod,
            Self::ParamGestureBegin(_) => EventKind::ParamGestureBegin,
            Self::ParamGestureEnd(_) => EventKind::ParamGestureEnd,
            Self::Transport(_) => EventKind::Transport,
            Self::Midi(_) => EventKind::Midi,
            Self::MidiSysex(_) => EventKind::MidiSysex,
            Self::Midi2(_) => EventKind::Midi2,
        }
    }
}

/// A single timestamped event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    pub header: EventHeader,
    pub body: EventBody,
}

impl Event {
    /// Core-space event at `time`.
    pub const fn new(time: FrameOffset, body: EventBody) -> Self {
        Self {
            header: EventHeader::at(time),
            body,
        }
    }

    /// Sample offset within the block.
    #[inline]
    pub const fn time(&self) -> FrameOffset {
        self.header.time
    }

    /// Kind tag.
    #[inline]
    pub const fn kind(&self) -> EventKind {
        self.body.kind()
    }

    /// Replace the flags.
    pub const fn with_flags(mut self, flags: EventFlags) -> Self {
        self.header.flags = flags;
        self
    }

    /// Mark as live input.
    pub const fn live(mut self) -> Self {
        self.header.flags = self.header.flags.or(EventFlags::IS_LIVE);
        self
    }

    /// Mark as not to be recorded.
    pub const fn dont_record(mut self) -> Self {
        self.header.flags = self.header.flags.or(EventFlags::DONT_RECORD);
        self
    }

    // === Constructors ===

    pub const fn note_on(time: FrameOffset, note: NoteEvent) -> Self {
        Self::new(time, EventBody::NoteOn(note))
    }

    pub const fn note_off(time: FrameOffset, note: NoteEvent) -> Self {
        Self::new(time, EventBody::NoteOff(note))
    }

    pub const fn note_choke(time: FrameOffset, note: NoteEvent) -> Self {
        Self::new(time, EventBody::NoteChoke(note))
    }

    pub const fn note_end(time: FrameOffset, note: NoteEvent) -> Self {
        Self::new(time, EventBody::NoteEnd(note))
    }

    /// Monophonic (global) parameter value change.
    pub const fn param_value(time: FrameOffset, param_id: ParameterId, value: f64) -> Self {
        Self::new(
            time,
            EventBody::ParamValue(ParamValue {
                param_id,
                cookie: 0,
                note_id: -1,
                port: WILDCARD,
                channel: WILDCARD,
                key: WILDCARD,
                value,
            }),
        )
    }

    /// Monophonic (global) parameter modulation.
    pub const fn param_mod(time: FrameOffset, param_id: ParameterId, amount: f64) -> Self {
        Self::new(
            time,
            EventBody::ParamMod(ParamMod {
                param_id,
                cookie: 0,
                note_id: -1,
                port: WILDCARD,
                channel: WILDCARD,
                key: WILDCARD,
                amount,
            }),
        )
    }

    pub const fn gesture_begin(time: FrameOffset, param_id: ParameterId) -> Self {
        Self::new(time, EventBody::ParamGestureBegin(ParamGesture { param_id }))
    }

    pub const fn gesture_end(time: FrameOffset, param_id: ParameterId) -> Self {
        Self::new(time, EventBody::ParamGestureEnd(ParamGesture { param_id }))
    }

    pub const fn midi(time: FrameOffset, port: u16, data: [u8; 3]) -> Self {
        Self::new(time, EventBody::Midi(Midi { port, data }))
    }

    pub const fn midi2(time: FrameOffset, port: u16, data: [u32; 4]) -> Self {
        Self::new(time, EventBody::Midi2(Midi2 { port, data }))
    }

    pub const fn transport(time: FrameOffset, transport: Transport) -> Self {
        Self::new(time, EventBody::Transport(transport))
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::midi(0, 0, [0; 3])
    }
}
