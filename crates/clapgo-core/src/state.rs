//! Parameter state persistence.
//!
//! State is stored as JSON so projects stay readable and diffable:
//!
//! ```json
//! {"version":1,"values":[{"id":0,"value":1.0},{"id":5,"value":0.25}]}
//! ```
//!
//! Loading is lenient about content and strict about format: unknown ids
//! are skipped with a warning, out-of-range values are clamped, but a blob
//! written by a newer format version is rejected outright.

use serde::{Deserialize, Serialize};

use crate::error::StateError;
use crate::parameter_manager::ParameterManager;
use crate::types::{ParameterId, ParameterValue};

/// Current state format version.
pub const STATE_VERSION: u32 = 1;

/// Serialized parameter state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDocument {
    pub version: u32,
    #[serde(default)]
    pub values: Vec<SavedValue>,
}

/// One saved parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavedValue {
    pub id: ParameterId,
    pub value: ParameterValue,
}

/// What `load_state` did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Values written to known parameters.
    pub restored: usize,
    /// Entries skipped because the id is not registered.
    pub skipped: usize,
    /// Values clamped into range.
    pub clamped: usize,
}

impl StateDocument {
    /// Capture the current values of `params`.
    pub fn capture(params: &ParameterManager) -> Self {
        Self {
            version: STATE_VERSION,
            values: params
                .values()
                .into_iter()
                .map(|(id, value)| SavedValue { id, value })
                .collect(),
        }
    }
}

impl ParameterManager {
    /// Serialize every parameter value. Main thread only.
    pub fn save_state(&self) -> Result<Vec<u8>, StateError> {
        let document = StateDocument::capture(self);
        let bytes = serde_json::to_vec(&document).map_err(StateError::Serialize)?;
        log::debug!(
            "saved state: {} values, {} bytes",
            document.values.len(),
            bytes.len()
        );
        Ok(bytes)
    }

    /// Restore values saved by `save_state`. Main thread only.
    ///
    /// Listeners are notified for every value that changes. Parameters
    /// missing from the blob keep their current value.
    pub fn load_state(&self, bytes: &[u8]) -> Result<LoadSummary, StateError> {
        let document: StateDocument =
            serde_json::from_slice(bytes).map_err(StateError::Deserialize)?;

        if document.version > STATE_VERSION {
            return Err(StateError::UnsupportedVersion {
                found: document.version,
                supported: STATE_VERSION,
            });
        }

        let mut summary = LoadSummary::default();
        for saved in &document.values {
            let Some(info) = self.info_by_id(saved.id) else {
                log::warn!("state contains unknown parameter {}; skipping", saved.id);
                summary.skipped += 1;
                continue;
            };
            let value = info.clamp(saved.value);
            if value.to_bits() != saved.value.to_bits() {
                log::warn!(
                    "state value {} for parameter {} out of range; clamped to {}",
                    saved.value,
                    saved.id,
                    value
                );
                summary.clamped += 1;
            }
            // The id is known and the value finite, so this cannot fail.
            if self.set_value(saved.id, value).is_ok() {
                summary.restored += 1;
            }
        }

        log::debug!(
            "loaded state v{}: {} restored, {} skipped",
            document.version,
            summary.restored,
            summary.skipped
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ManagerConfig;
    use crate::parameter_info::ParameterInfo;

    fn manager() -> ParameterManager {
        let mut params = ParameterManager::new(ManagerConfig::default()).unwrap();
        params
            .register_all([
                ParameterInfo::new(0, "Gain", 0.0, 2.0, 1.0),
                ParameterInfo::new(5, "Mix", 0.0, 1.0, 0.5),
            ])
            .unwrap();
        params
    }

    #[test]
    fn test_save_and_restore() {
        let source = manager();
        source.set_value(0, 1.75).unwrap();
        source.set_value(5, 0.1).unwrap();
        let bytes = source.save_state().unwrap();

        let target = manager();
        let summary = target.load_state(&bytes).unwrap();
        assert_eq!(summary.restored, 2);
        assert_eq!(target.values(), vec![(0, 1.75), (5, 0.1)]);
    }

    #[test]
    fn test_saved_format() {
        let params = manager();
        let bytes = params.save_state().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(json["version"], 1);
        assert_eq!(json["values"][1]["id"], 5);
        assert_eq!(json["values"][1]["value"], 0.5);
    }

    #[test]
    fn test_unknown_ids_are_skipped() {
        let params = manager();
        let blob = br#"{"version":1,"values":[{"id":99,"value":1.0},{"id":5,"value":0.75}]}"#;

        let summary = params.load_state(blob).unwrap();
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.restored, 1);
        assert_eq!(params.value(5), Ok(0.75));
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        let params = manager();
        let blob = br#"{"version":1,"values":[{"id":0,"value":-4.0}]}"#;

        let summary = params.load_state(blob).unwrap();
        assert_eq!(summary.clamped, 1);
        assert_eq!(params.value(0), Ok(0.0));
    }

    #[test]
    fn test_newer_version_is_rejected() {
        let params = manager();
        let blob = br#"{"version":2,"values":[{"id":0,"value":0.0}]}"#;

        assert!(matches!(
            params.load_state(blob),
            Err(StateError::UnsupportedVersion {
                found: 2,
                supported: 1
            })
        ));
        assert_eq!(params.value(0), Ok(1.0));
    }

    #[test]
    fn test_garbage_is_rejected() {
        let params = manager();
        assert!(matches!(
            params.load_state(b"not json"),
            Err(StateError::Deserialize(_))
        ));
    }

    #[test]
    fn test_missing_values_keep_current() {
        let params = manager();
        params.set_value(0, 0.3).unwrap();

        let summary = params.load_state(br#"{"version":1}"#).unwrap();
        assert_eq!(summary, LoadSummary::default());
        assert_eq!(params.value(0), Ok(0.3));
    }
}
