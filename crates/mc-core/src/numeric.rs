use core::fmt;
use core::str::FromStr;

use crate::{McError, McResult};

/// Format used for value digests and as the default float rendering.
pub const DEFAULT_FLOAT_FORMAT: &str = "%.15g";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FloatStyle {
    /// `%f`
    Fixed,
    /// `%e` / `%E`
    Exp { upper: bool },
    /// `%g` / `%G`
    General { upper: bool },
}

/// printf-style float format: `%[flags][width][.precision](f|e|E|g|G)`.
///
/// Applied uniformly to every float cell of a conversion so re-exports of
/// the same values produce byte-identical text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FloatFormat {
    style: FloatStyle,
    precision: Option<usize>,
    width: usize,
    left: bool,
    plus: bool,
    zero_pad: bool,
    alternate: bool,
    source: String,
}

impl Default for FloatFormat {
    fn default() -> Self {
        Self {
            style: FloatStyle::General { upper: false },
            precision: Some(15),
            width: 0,
            left: false,
            plus: false,
            zero_pad: false,
            alternate: false,
            source: DEFAULT_FLOAT_FORMAT.to_string(),
        }
    }
}

impl FloatFormat {
    pub fn parse(pattern: &str) -> McResult<Self> {
        let bad = || McError::InvalidArg {
            what: format!("float format '{}'", pattern),
        };

        let rest = pattern.trim().strip_prefix('%').ok_or_else(bad)?;
        let bytes = rest.as_bytes();
        let mut pos = 0;

        let mut fmt = FloatFormat {
            style: FloatStyle::Fixed,
            precision: None,
            width: 0,
            left: false,
            plus: false,
            zero_pad: false,
            alternate: false,
            source: pattern.trim().to_string(),
        };

        while pos < bytes.len() {
            match bytes[pos] {
                b'-' => fmt.left = true,
                b'+' => fmt.plus = true,
                b'0' => fmt.zero_pad = true,
                b'#' => fmt.alternate = true,
                b' ' => {}
                _ => break,
            }
            pos += 1;
        }

        let width_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        if pos > width_start {
            fmt.width = rest[width_start..pos].parse().map_err(|_| bad())?;
        }

        if pos < bytes.len() && bytes[pos] == b'.' {
            pos += 1;
            let prec_start = pos;
            while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                pos += 1;
            }
            let prec = if pos > prec_start {
                rest[prec_start..pos].parse().map_err(|_| bad())?
            } else {
                0
            };
            fmt.precision = Some(prec);
        }

        // tolerate C length modifier: %lf, %Lg
        if pos < bytes.len() && (bytes[pos] == b'l' || bytes[pos] == b'L') {
            pos += 1;
        }

        if pos + 1 != bytes.len() {
            return Err(bad());
        }
        fmt.style = match bytes[pos] {
            b'f' | b'F' => FloatStyle::Fixed,
            b'e' => FloatStyle::Exp { upper: false },
            b'E' => FloatStyle::Exp { upper: true },
            b'g' => FloatStyle::General { upper: false },
            b'G' => FloatStyle::General { upper: true },
            _ => return Err(bad()),
        };
        Ok(fmt)
    }

    /// True when rendered values keep the 15 significant digits that value
    /// digests are computed with.
    pub fn keeps_digest_precision(&self) -> bool {
        match self.style {
            FloatStyle::General { .. } => self.precision.unwrap_or(6) >= 15,
            FloatStyle::Exp { .. } => self.precision.unwrap_or(6) >= 14,
            FloatStyle::Fixed => false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn format(&self, v: f64) -> String {
        let mut out = String::new();
        self.write_to(v, &mut out);
        out
    }

    /// Append the rendered value to `out`.
    pub fn write_to(&self, v: f64, out: &mut String) {
        if !v.is_finite() {
            let text = if v.is_nan() {
                "NaN"
            } else if v > 0.0 {
                "+Inf"
            } else {
                "-Inf"
            };
            self.pad(text, false, out);
            return;
        }

        let prec = self.precision.unwrap_or(6);
        let mut body = match self.style {
            FloatStyle::Fixed => format!("{:.*}", prec, v),
            FloatStyle::Exp { upper } => exp_c_style(v, prec, upper),
            FloatStyle::General { upper } => {
                let p = if prec == 0 { 1 } else { prec };
                let x = decimal_exponent(v, p);
                let s = if x >= -4 && x < p as i32 {
                    format!("{:.*}", (p as i32 - 1 - x) as usize, v)
                } else {
                    exp_c_style(v, p - 1, upper)
                };
                if self.alternate {
                    s
                } else {
                    strip_trailing_zeros(&s)
                }
            }
        };
        if self.plus && !body.starts_with('-') {
            body.insert(0, '+');
        }
        self.pad(&body, self.zero_pad, out);
    }

    fn pad(&self, body: &str, zeros: bool, out: &mut String) {
        let len = body.chars().count();
        if len >= self.width {
            out.push_str(body);
            return;
        }
        let fill = self.width - len;
        if self.left {
            out.push_str(body);
            out.extend(std::iter::repeat_n(' ', fill));
        } else if zeros {
            let (sign, digits) = match body.chars().next() {
                Some(c @ ('+' | '-')) => (Some(c), &body[1..]),
                _ => (None, body),
            };
            if let Some(c) = sign {
                out.push(c);
            }
            out.extend(std::iter::repeat_n('0', fill));
            out.push_str(digits);
        } else {
            out.extend(std::iter::repeat_n(' ', fill));
            out.push_str(body);
        }
    }
}

impl FromStr for FloatFormat {
    type Err = McError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FloatFormat::parse(s)
    }
}

impl fmt::Display for FloatFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

/// Exponent of `v` after rounding to `sig` significant digits.
fn decimal_exponent(v: f64, sig: usize) -> i32 {
    if v == 0.0 {
        return 0;
    }
    let s = format!("{:.*e}", sig.saturating_sub(1), v);
    s.rsplit('e')
        .next()
        .and_then(|e| e.parse().ok())
        .unwrap_or(0)
}

/// `1.50e3` -> `1.50e+03`
fn exp_c_style(v: f64, prec: usize, upper: bool) -> String {
    let s = format!("{:.*e}", prec, v);
    let (mantissa, exp) = s.split_once('e').unwrap_or((s.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let sign = if exp < 0 { '-' } else { '+' };
    let e = if upper { 'E' } else { 'e' };
    format!("{}{}{}{:02}", mantissa, e, sign, exp.abs())
}

fn strip_trailing_zeros(s: &str) -> String {
    let (mantissa, exp) = match s.find(['e', 'E']) {
        Some(pos) => (&s[..pos], &s[pos..]),
        None => (s, ""),
    };
    if !mantissa.contains('.') {
        return s.to_string();
    }
    let trimmed = mantissa.trim_end_matches('0').trim_end_matches('.');
    format!("{}{}", trimmed, exp)
}

/// Parse a float cell, accepting the non-finite spellings the writer emits.
pub fn parse_float(text: &str) -> McResult<f64> {
    let t = text.trim();
    match t {
        "NaN" | "nan" => return Ok(f64::NAN),
        "+Inf" | "Inf" | "inf" | "+inf" => return Ok(f64::INFINITY),
        "-Inf" | "-inf" => return Ok(f64::NEG_INFINITY),
        _ => {}
    }
    t.parse::<f64>().map_err(|_| McError::parse("float", text))
}

pub fn parse_int(text: &str) -> McResult<i64> {
    text.trim()
        .parse::<i64>()
        .map_err(|_| McError::parse("integer", text))
}

pub fn parse_bool(text: &str) -> McResult<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "t" | "yes" => Ok(true),
        "false" | "0" | "f" | "no" => Ok(false),
        _ => Err(McError::parse("boolean", text)),
    }
}
