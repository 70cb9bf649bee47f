//! MIDI 1.0 conversion helpers.
//!
//! Hosts that do not speak CLAP note events deliver raw MIDI. These helpers
//! translate between three-byte MIDI messages and [`Event`]s so plugin logic
//! only has to handle one representation. The channel comes from the status
//! byte; the port is supplied by the caller.

use crate::event::{Event, EventBody, Midi, NoteEvent, ParamMod, ParamValue};
use crate::types::{FrameOffset, ParameterId, WILDCARD};

/// Status byte high nibbles.
pub mod status {
    pub const NOTE_OFF: u8 = 0x80;
    pub const NOTE_ON: u8 = 0x90;
    pub const POLY_PRESSURE: u8 = 0xA0;
    pub const CONTROL_CHANGE: u8 = 0xB0;
    pub const PROGRAM_CHANGE: u8 = 0xC0;
    pub const CHANNEL_PRESSURE: u8 = 0xD0;
    pub const PITCH_BEND: u8 = 0xE0;
    pub const SYSTEM_EXCLUSIVE: u8 = 0xF0;
}

#[inline]
const fn kind(data: &[u8; 3]) -> u8 {
    data[0] & 0xF0
}

#[inline]
const fn channel(data: &[u8; 3]) -> i16 {
    (data[0] & 0x0F) as i16
}

/// Convert a note-on or note-off message to a note event.
///
/// A note-on with velocity 0 is a note-off. Returns `None` for any other
/// message.
pub fn to_note_event(time: FrameOffset, port: i16, data: [u8; 3]) -> Option<Event> {
    let key = (data[1] & 0x7F) as i16;
    let velocity = (data[2] & 0x7F) as f64 / 127.0;
    let note = NoteEvent::new(port, channel(&data), key, velocity);

    match kind(&data) {
        status::NOTE_ON if data[2] != 0 => Some(Event::note_on(time, note)),
        status::NOTE_ON | status::NOTE_OFF => Some(Event::note_off(time, note)),
        _ => None,
    }
}

/// Convert a note-on or note-off event back to MIDI bytes.
///
/// Returns `None` for other events and for keys outside 0..=127. A wildcard
/// channel maps to channel 0.
pub fn note_to_bytes(event: &Event) -> Option<[u8; 3]> {
    let (head, note) = match &event.body {
        EventBody::NoteOn(note) => (status::NOTE_ON, note),
        EventBody::NoteOff(note) => (status::NOTE_OFF, note),
        _ => return None,
    };
    if !(0..=127).contains(&note.key) {
        return None;
    }
    let channel = note.channel.max(0) as u8 & 0x0F;
    let velocity = (note.velocity.clamp(0.0, 1.0) * 127.0).round() as u8;

    // A note-on that rounds to zero velocity would read back as a note-off.
    let velocity = if head == status::NOTE_ON { velocity.max(1) } else { velocity };
    Some([head | channel, note.key as u8, velocity])
}

/// Map a control change to a parameter value in 0.0..=1.0.
pub fn cc_to_param_value(
    time: FrameOffset,
    port: i16,
    data: [u8; 3],
    param_id: ParameterId,
) -> Option<Event> {
    if kind(&data) != status::CONTROL_CHANGE {
        return None;
    }
    Some(Event::new(
        time,
        EventBody::ParamValue(ParamValue {
            param_id,
            cookie: 0,
            note_id: -1,
            port,
            channel: channel(&data),
            key: WILDCARD,
            value: (data[2] & 0x7F) as f64 / 127.0,
        }),
    ))
}

/// Map a pitch bend to a modulation amount in -1.0..1.0.
pub fn pitch_bend_to_param_mod(
    time: FrameOffset,
    port: i16,
    data: [u8; 3],
    param_id: ParameterId,
) -> Option<Event> {
    if kind(&data) != status::PITCH_BEND {
        return None;
    }
    let bend = (data[1] & 0x7F) as u16 | (((data[2] & 0x7F) as u16) << 7);
    Some(Event::new(
        time,
        EventBody::ParamMod(ParamMod {
            param_id,
            cookie: 0,
            note_id: -1,
            port,
            channel: channel(&data),
            key: WILDCARD,
            amount: (bend as f64 - 8192.0) / 8192.0,
        }),
    ))
}

/// Expand a raw MIDI event into a note event when it is one.
pub fn normalize(time: FrameOffset, midi: &Midi) -> Event {
    let port = i16::try_from(midi.port).unwrap_or(i16::MAX);
    to_note_event(time, port, midi.data).unwrap_or(Event::midi(time, midi.port, midi.data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;

    #[test]
    fn test_note_on() {
        let event = to_note_event(5, 1, [0x93, 60, 127]).unwrap();
        assert_eq!(event.time(), 5);
        let EventBody::NoteOn(note) = event.body else {
            panic!("expected note on, got {:?}", event.kind());
        };
        assert_eq!((note.port, note.channel, note.key), (1, 3, 60));
        assert_eq!(note.velocity, 1.0);
        assert_eq!(note.note_id, -1);
    }

    #[test]
    fn test_zero_velocity_is_note_off() {
        let event = to_note_event(0, 0, [0x90, 64, 0]).unwrap();
        assert_eq!(event.kind(), EventKind::NoteOff);

        let event = to_note_event(0, 0, [0x80, 64, 40]).unwrap();
        assert_eq!(event.kind(), EventKind::NoteOff);

        assert!(to_note_event(0, 0, [0xB0, 1, 2]).is_none());
    }

    #[test]
    fn test_note_to_bytes() {
        let on = Event::note_on(0, NoteEvent::new(0, 2, 60, 1.0));
        assert_eq!(note_to_bytes(&on), Some([0x92, 60, 127]));

        let off = Event::note_off(0, NoteEvent::new(0, -1, 60, 0.0));
        assert_eq!(note_to_bytes(&off), Some([0x80, 60, 0]));

        let quiet = Event::note_on(0, NoteEvent::new(0, 0, 60, 0.001));
        assert_eq!(note_to_bytes(&quiet), Some([0x90, 60, 1]));

        let wildcard_key = Event::note_on(0, NoteEvent::new(0, 0, -1, 1.0));
        assert!(note_to_bytes(&wildcard_key).is_none());
        assert!(note_to_bytes(&Event::midi(0, 0, [0x90, 60, 1])).is_none());
    }

    #[test]
    fn test_cc_to_param_value() {
        let event = cc_to_param_value(3, 0, [0xB1, 74, 127], 9).unwrap();
        let EventBody::ParamValue(param) = event.body else {
            panic!("expected param value");
        };
        assert_eq!(param.param_id, 9);
        assert_eq!(param.channel, 1);
        assert_eq!(param.value, 1.0);

        assert!(cc_to_param_value(0, 0, [0x90, 74, 127], 9).is_none());
    }

    #[test]
    fn test_pitch_bend() {
        let center = pitch_bend_to_param_mod(0, 0, [0xE0, 0x00, 0x40], 1).unwrap();
        let EventBody::ParamMod(param) = center.body else {
            panic!("expected param mod");
        };
        assert_eq!(param.amount, 0.0);

        let low = pitch_bend_to_param_mod(0, 0, [0xE0, 0x00, 0x00], 1).unwrap();
        let EventBody::ParamMod(param) = low.body else {
            panic!("expected param mod");
        };
        assert_eq!(param.amount, -1.0);
    }

    #[test]
    fn test_normalize() {
        let midi = Midi { port: 2, data: [0x90, 60, 100] };
        assert_eq!(normalize(0, &midi).kind(), EventKind::NoteOn);

        let cc = Midi { port: 2, data: [0xB0, 7, 100] };
        assert_eq!(normalize(0, &cc), Event::midi(0, 2, [0xB0, 7, 100]));
    }
}
