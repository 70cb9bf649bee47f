//! Parameter metadata types.
//!
//! This module provides types for describing parameter metadata:
//! - [`ParameterInfo`] - Complete parameter description (id, name, range, flags, etc.)
//! - [`ParameterFlags`] - CLAP parameter flag bitset

use crate::error::ParameterError;
use crate::parameter_format::Formatter;
use crate::types::{ParameterId, ParameterValue};

/// CLAP parameter flags.
///
/// Bit positions match the ClapGo wire values so flags can be passed to the
/// glue layer unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParameterFlags(pub u32);

impl ParameterFlags {
    /// No flags.
    pub const NONE: Self = Self(0);
    /// Host may automate the parameter.
    pub const AUTOMATABLE: Self = Self(1 << 0);
    /// Host may modulate the parameter.
    pub const MODULATABLE: Self = Self(1 << 1);
    /// Values are integers.
    pub const STEPPED: Self = Self(1 << 2);
    /// Host cannot change the value.
    pub const READONLY: Self = Self(1 << 3);
    /// Not shown in host parameter lists.
    pub const HIDDEN: Self = Self(1 << 4);
    /// The plugin's bypass switch.
    pub const BYPASS: Self = Self(1 << 5);
    /// Values are clamped to `min`.
    pub const BOUNDED_BELOW: Self = Self(1 << 6);
    /// Values are clamped to `max`.
    pub const BOUNDED_ABOVE: Self = Self(1 << 7);
    /// Changing the value requires `process` to run even when idle.
    pub const REQUIRES_PROCESS: Self = Self(1 << 8);

    /// Automatable and bounded on both sides.
    pub const DEFAULT: Self = Self(Self::AUTOMATABLE.0 | Self::BOUNDED_BELOW.0 | Self::BOUNDED_ABOVE.0);

    /// Check if every bit of `flag` is set.
    #[inline]
    pub const fn contains(&self, flag: Self) -> bool {
        (self.0 & flag.0) == flag.0
    }

    /// Check if any bit of `flag` is set.
    #[inline]
    pub const fn intersects(&self, flag: Self) -> bool {
        (self.0 & flag.0) != 0
    }

    /// Combine flags.
    #[inline]
    pub const fn or(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Remove flags.
    #[inline]
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

impl std::ops::BitOr for ParameterFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.or(rhs)
    }
}

/// Metadata describing a single parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterInfo {
    /// Stable identifier, unique within the plugin.
    pub id: ParameterId,
    /// Display name (e.g., "Cutoff").
    pub name: &'static str,
    /// Grouping path (e.g., "Filter/Envelope"). Empty for top-level.
    pub module: &'static str,
    /// Minimum plain value.
    pub min: ParameterValue,
    /// Maximum plain value.
    pub max: ParameterValue,
    /// Value at registration and after reset.
    pub default: ParameterValue,
    /// Behavioral flags.
    pub flags: ParameterFlags,
    /// Value/text conversion.
    pub formatter: Formatter,
}

impl ParameterInfo {
    /// Create an automatable parameter bounded to `[min, max]`.
    pub const fn new(
        id: ParameterId,
        name: &'static str,
        min: ParameterValue,
        max: ParameterValue,
        default: ParameterValue,
    ) -> Self {
        Self {
            id,
            name,
            module: "",
            min,
            max,
            default,
            flags: ParameterFlags::DEFAULT,
            formatter: Formatter::Float { precision: 3 },
        }
    }

    /// Create a bypass toggle parameter.
    ///
    /// Stepped 0/1, automatable, default off.
    pub const fn bypass(id: ParameterId) -> Self {
        Self {
            id,
            name: "Bypass",
            module: "",
            min: 0.0,
            max: 1.0,
            default: 0.0,
            flags: Self::bypass_flags(),
            formatter: Formatter::Boolean,
        }
    }

    const fn bypass_flags() -> ParameterFlags {
        ParameterFlags::DEFAULT
            .or(ParameterFlags::STEPPED)
            .or(ParameterFlags::BYPASS)
    }

    /// Set the grouping path.
    pub const fn with_module(mut self, module: &'static str) -> Self {
        self.module = module;
        self
    }

    /// Replace all flags.
    pub const fn with_flags(mut self, flags: ParameterFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Add flags to the current set.
    pub const fn add_flags(mut self, flags: ParameterFlags) -> Self {
        self.flags = self.flags.or(flags);
        self
    }

    /// Set the value formatter.
    pub const fn with_formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = formatter;
        self
    }

    /// Mark as stepped (integer values).
    pub const fn stepped(self) -> Self {
        self.add_flags(ParameterFlags::STEPPED)
    }

    /// Mark as modulatable.
    pub const fn modulatable(self) -> Self {
        self.add_flags(ParameterFlags::MODULATABLE)
    }

    /// Mark as hidden.
    pub const fn hidden(self) -> Self {
        self.add_flags(ParameterFlags::HIDDEN)
    }

    /// Mark as read-only. Removes the automatable flag.
    pub const fn readonly(mut self) -> Self {
        self.flags = self
            .flags
            .without(ParameterFlags::AUTOMATABLE)
            .or(ParameterFlags::READONLY);
        self
    }

    /// Returns true if the flags clamp values at `min`.
    #[inline]
    pub const fn is_bounded_below(&self) -> bool {
        self.flags.contains(ParameterFlags::BOUNDED_BELOW)
    }

    /// Returns true if the flags clamp values at `max`.
    #[inline]
    pub const fn is_bounded_above(&self) -> bool {
        self.flags.contains(ParameterFlags::BOUNDED_ABOVE)
    }

    /// Clamp `value` to the bounds enabled by the flags.
    #[inline]
    pub fn clamp(&self, value: ParameterValue) -> ParameterValue {
        let mut value = value;
        if self.is_bounded_below() && value < self.min {
            value = self.min;
        }
        if self.is_bounded_above() && value > self.max {
            value = self.max;
        }
        value
    }

    /// Check internal consistency. Called on registration.
    pub fn validate(&self) -> Result<(), ParameterError> {
        let id = self.id;
        if self.min.is_nan() || self.max.is_nan() || self.min > self.max {
            return Err(ParameterError::InvalidRange {
                id,
                min: self.min,
                max: self.max,
            });
        }
        if self.is_bounded_below() && !self.min.is_finite() {
            return Err(ParameterError::InconsistentFlags {
                id,
                reason: "bounded below without a finite minimum",
            });
        }
        if self.is_bounded_above() && !self.max.is_finite() {
            return Err(ParameterError::InconsistentFlags {
                id,
                reason: "bounded above without a finite maximum",
            });
        }
        if self.flags.contains(ParameterFlags::READONLY)
            && self.flags.contains(ParameterFlags::AUTOMATABLE)
        {
            return Err(ParameterError::InconsistentFlags {
                id,
                reason: "read-only parameter marked automatable",
            });
        }
        if self.flags.contains(ParameterFlags::BYPASS)
            && !self.flags.contains(ParameterFlags::STEPPED)
        {
            return Err(ParameterError::InconsistentFlags {
                id,
                reason: "bypass parameter must be stepped",
            });
        }
        if !self.default.is_finite() || self.default < self.min || self.default > self.max {
            return Err(ParameterError::DefaultOutOfRange {
                id,
                default: self.default,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}
