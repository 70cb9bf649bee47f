//! Parameter value formatting and parsing.
//!
//! [`Formatter`] converts between plain parameter values and the display
//! strings a host shows in automation lanes and generic editors (CLAP
//! `value_to_text` / `text_to_value`). Display strings include the unit
//! suffix ("-6.0 dB", "250 ms") because CLAP hosts show the text verbatim.
//!
//! [`Formatter::write_text`] writes into any [`std::fmt::Write`], so glue code
//! can fill the host's fixed-size buffer without an intermediate `String`.
//!
//! # Example
//!
//! ```ignore
//! use clapgo_core::parameter_format::Formatter;
//!
//! let db = Formatter::Decibel { precision: 1 };
//! assert_eq!(db.text(0.5), "-6.0 dB");
//! assert_eq!(db.parse("-6.0 dB").map(|v| (v * 100.0).round()), Some(50.0));
//!
//! assert_eq!(Formatter::Kilohertz.text(1500.0), "1.50 kHz");
//! ```

use std::fmt::{self, Write};

/// Parameter value formatter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Formatter {
    /// Bare number with configurable precision (e.g., "0.500").
    Float {
        /// Number of decimal places.
        precision: usize,
    },

    /// Decibels from linear amplitude (1.0 = "0.0 dB", 0.0 = "-inf dB").
    Decibel {
        /// Number of decimal places.
        precision: usize,
    },

    /// Percentage from 0.0..=1.0 (0.75 = "75.0%").
    Percent {
        /// Number of decimal places.
        precision: usize,
    },

    /// Milliseconds from a value in seconds (0.25 = "250 ms").
    Milliseconds,

    /// Seconds (1.5 = "1.50 s").
    Seconds,

    /// Hertz (440.0 = "440.0 Hz").
    Hertz,

    /// Kilohertz from a value in Hz (1500.0 = "1.50 kHz").
    Kilohertz,

    /// Stereo position from -1.0..=1.0 ("L50", "C", "R50").
    Pan,

    /// Toggle (> 0.5 = "On").
    Boolean,
}

impl Formatter {
    /// Write the display text for `value` into `out`.
    pub fn write_text<W: Write>(&self, value: f64, out: &mut W) -> fmt::Result {
        match *self {
            Formatter::Float { precision } => write!(out, "{:.*}", precision, value),

            Formatter::Decibel { precision } => {
                if value <= 0.0 {
                    out.write_str("-inf dB")
                } else {
                    write!(out, "{:.*} dB", precision, 20.0 * value.log10())
                }
            }

            Formatter::Percent { precision } => write!(out, "{:.*}%", precision, value * 100.0),

            Formatter::Milliseconds => write!(out, "{:.0} ms", value * 1000.0),

            Formatter::Seconds => write!(out, "{:.2} s", value),

            Formatter::Hertz => write!(out, "{:.1} Hz", value),

            Formatter::Kilohertz => write!(out, "{:.2} kHz", value / 1000.0),

            Formatter::Pan => {
                if value.abs() < 0.005 {
                    out.write_char('C')
                } else if value < 0.0 {
                    write!(out, "L{:.0}", value.abs() * 100.0)
                } else {
                    write!(out, "R{:.0}", value * 100.0)
                }
            }

            Formatter::Boolean => out.write_str(if value > 0.5 { "On" } else { "Off" }),
        }
    }

    /// Display text for `value`. Allocates; not for the audio thread.
    pub fn text(&self, value: f64) -> String {
        let mut text = String::new();
        // Writing to a String cannot fail.
        let _ = self.write_text(value, &mut text);
        text
    }

    /// Parse display text back to a plain value.
    ///
    /// The unit suffix is optional. Returns `None` if the text is not a
    /// number in this formatter's notation.
    pub fn parse(&self, text: &str) -> Option<f64> {
        let text = text.trim();

        match self {
            Formatter::Float { .. } => text.parse().ok(),

            Formatter::Decibel { .. } => {
                let number = strip_unit(text, &["dB", "db"]);
                if number.eq_ignore_ascii_case("-inf") || number == "-∞" {
                    return Some(0.0);
                }
                let db: f64 = number.parse().ok()?;
                Some(10.0_f64.powf(db / 20.0))
            }

            Formatter::Percent { .. } => {
                let number = strip_unit(text, &["%"]);
                number.parse::<f64>().ok().map(|v| v / 100.0)
            }

            Formatter::Milliseconds => {
                let number = strip_unit(text, &["ms"]);
                number.parse::<f64>().ok().map(|v| v / 1000.0)
            }

            Formatter::Seconds => strip_unit(text, &["s"]).parse().ok(),

            Formatter::Hertz | Formatter::Kilohertz => {
                if let Some(khz) = strip_suffix_ci(text, "khz") {
                    return khz.trim().parse::<f64>().ok().map(|v| v * 1000.0);
                }
                let number = strip_unit(text, &["Hz", "hz"]);
                let value: f64 = number.parse().ok()?;
                // A bare number in kHz notation is already in kHz.
                if *self == Formatter::Kilohertz && number.len() == text.len() {
                    Some(value * 1000.0)
                } else {
                    Some(value)
                }
            }

            Formatter::Pan => {
                let upper = text.to_ascii_uppercase();
                if upper == "C" || upper == "CENTER" {
                    return Some(0.0);
                }
                if let Some(left) = upper.strip_prefix('L') {
                    return left.trim().parse::<f64>().ok().map(|v| -v / 100.0);
                }
                if let Some(right) = upper.strip_prefix('R') {
                    return right.trim().parse::<f64>().ok().map(|v| v / 100.0);
                }
                text.parse().ok()
            }

            Formatter::Boolean => match text.to_ascii_lowercase().as_str() {
                "on" | "true" | "yes" | "1" => Some(1.0),
                "off" | "false" | "no" | "0" => Some(0.0),
                _ => None,
            },
        }
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Formatter::Float { precision: 3 }
    }
}

fn strip_unit<'a>(text: &'a str, units: &[&str]) -> &'a str {
    for unit in units {
        if let Some(number) = text.strip_suffix(unit) {
            return number.trim_end();
        }
    }
    text
}

fn strip_suffix_ci<'a>(text: &'a str, suffix: &str) -> Option<&'a str> {
    let split = text.len().checked_sub(suffix.len())?;
    if !text.is_char_boundary(split) {
        return None;
    }
    let (head, tail) = text.split_at(split);
    tail.eq_ignore_ascii_case(suffix).then_some(head)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float() {
        let f = Formatter::Float { precision: 2 };
        assert_eq!(f.text(1.234), "1.23");
        assert_eq!(f.parse(" 0.5 "), Some(0.5));
        assert_eq!(f.parse("abc"), None);
    }

    #[test]
    fn test_decibel() {
        let f = Formatter::Decibel { precision: 1 };
        assert_eq!(f.text(1.0), "0.0 dB");
        assert_eq!(f.text(0.0), "-inf dB");
        assert_eq!(f.parse("-inf"), Some(0.0));
        let linear = f.parse("-6.0 dB").unwrap();
        assert!((linear - 0.501).abs() < 0.001);
        assert!((f.parse("0").unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_percent() {
        let f = Formatter::Percent { precision: 1 };
        assert_eq!(f.text(0.75), "75.0%");
        assert_eq!(f.parse("50%"), Some(0.5));
        assert_eq!(f.parse("25"), Some(0.25));
    }

    #[test]
    fn test_time_units() {
        assert_eq!(Formatter::Milliseconds.text(0.25), "250 ms");
        assert_eq!(Formatter::Milliseconds.parse("250 ms"), Some(0.25));
        assert_eq!(Formatter::Seconds.text(1.5), "1.50 s");
        assert_eq!(Formatter::Seconds.parse("1.5s"), Some(1.5));
    }

    #[test]
    fn test_frequency() {
        assert_eq!(Formatter::Hertz.text(440.0), "440.0 Hz");
        assert_eq!(Formatter::Kilohertz.text(1500.0), "1.50 kHz");
        assert_eq!(Formatter::Hertz.parse("440 Hz"), Some(440.0));
        assert_eq!(Formatter::Hertz.parse("1.5 kHz"), Some(1500.0));
        assert_eq!(Formatter::Kilohertz.parse("2.5"), Some(2500.0));
        assert_eq!(Formatter::Kilohertz.parse("300 Hz"), Some(300.0));
    }

    #[test]
    fn test_pan() {
        assert_eq!(Formatter::Pan.text(0.0), "C");
        assert_eq!(Formatter::Pan.text(-0.5), "L50");
        assert_eq!(Formatter::Pan.text(0.25), "R25");
        assert_eq!(Formatter::Pan.parse("l50"), Some(-0.5));
        assert_eq!(Formatter::Pan.parse("center"), Some(0.0));
    }

    #[test]
    fn test_boolean() {
        assert_eq!(Formatter::Boolean.text(1.0), "On");
        assert_eq!(Formatter::Boolean.text(0.0), "Off");
        assert_eq!(Formatter::Boolean.parse("YES"), Some(1.0));
        assert_eq!(Formatter::Boolean.parse("maybe"), None);
    }

    #[test]
    fn test_write_text_into_fixed_buffer() {
        struct Fixed {
            buf: [u8; 16],
            len: usize,
        }

        impl Write for Fixed {
            fn write_str(&mut self, s: &str) -> fmt::Result {
                let end = self.len + s.len();
                if end > self.buf.len() {
                    return Err(fmt::Error);
                }
                self.buf[self.len..end].copy_from_slice(s.as_bytes());
                self.len = end;
                Ok(())
            }
        }

        let mut out = Fixed { buf: [0; 16], len: 0 };
        Formatter::Hertz.write_text(880.0, &mut out).unwrap();
        assert_eq!(&out.buf[..out.len], b"880.0 Hz");
    }
}
