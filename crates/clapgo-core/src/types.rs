//! Shared primitive type aliases.

/// Stable parameter identifier, assigned by the plugin author.
pub type ParameterId = u32;

/// Plain parameter value in the parameter's own units.
pub type ParameterValue = f64;

/// Sample offset from the start of the current processing block.
pub type FrameOffset = u32;

/// Host-assigned note identifier. `-1` means "no id" (wildcard).
pub type NoteId = i32;

/// Wildcard value for note id, port, channel and key fields.
pub const WILDCARD: i16 = -1;

/// The CLAP core event space.
pub const CORE_EVENT_SPACE_ID: u16 = 0;
