//! Parsing of the literal inside a utility's brackets.
//!
//! Colors are only accepted when fully opaque: a translucent color has no
//! single static token that could stand in for it.

use crate::error::ValueError;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParsedColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl ParsedColor {
    pub fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Canonical form: six lowercase hex digits without `#`.
    pub fn hex(&self) -> String {
        format!("{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim_start_matches('#');
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |idx: usize| u8::from_str_radix(&digits[idx..idx + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for ParsedColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.hex())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    Px,
    Rem,
    Em,
    Percent,
    Vh,
    Vw,
    Vmin,
    Vmax,
}

impl Unit {
    pub const ALL: [Unit; 8] = [
        Unit::Px,
        Unit::Rem,
        Unit::Em,
        Unit::Percent,
        Unit::Vh,
        Unit::Vw,
        Unit::Vmin,
        Unit::Vmax,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Unit::Px => "px",
            Unit::Rem => "rem",
            Unit::Em => "em",
            Unit::Percent => "%",
            Unit::Vh => "vh",
            Unit::Vw => "vw",
            Unit::Vmin => "vmin",
            Unit::Vmax => "vmax",
        }
    }

    pub fn from_suffix(suffix: &str) -> Option<Self> {
        let lower = suffix.to_ascii_lowercase();
        Self::ALL.into_iter().find(|unit| unit.as_str() == lower)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedDimension {
    Length { magnitude: f64, unit: Unit },
    Calc(String),
    /// Contains a unit token but is not a single number+unit pair.
    Opaque(String),
}

/// Applies Tailwind's space escaping: `_` is a space, `\_` a literal
/// underscore.
pub fn normalize_literal(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' if chars.peek() == Some(&'_') => {
                chars.next();
                out.push('_');
            }
            '_' => out.push(' '),
            _ => out.push(ch),
        }
    }
    out
}

/// Canonical dimension key: whitespace runs collapsed, trimmed.
pub fn canonical_dimension(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn is_color_like(value: &str) -> bool {
    let lower = value.trim().to_ascii_lowercase();
    lower.starts_with('#')
        || lower.starts_with("rgb(")
        || lower.starts_with("rgba(")
        || lower.starts_with("hsl(")
        || lower.starts_with("hsla(")
}

/// True when the literal mentions a recognized unit or is a calc expression.
pub fn has_unit_token(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    lower.starts_with("calc(") || Unit::ALL.iter().any(|unit| lower.contains(unit.as_str()))
}

#[derive(Debug, Clone, Copy)]
enum ColorSyntax {
    Rgb,
    Hsl,
}

fn color_patterns() -> &'static [(Regex, ColorSyntax)] {
    static PATTERNS: OnceLock<Vec<(Regex, ColorSyntax)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            (
                r"^rgba?\(\s*(\d+)\s*,\s*(\d+)\s*,\s*(\d+)\s*(?:,\s*([\d.]+))?\s*\)$",
                ColorSyntax::Rgb,
            ),
            (
                r"^rgba?\(\s*(\d+)\s+(\d+)\s+(\d+)\s*(?:/\s*([\d.]+))?\s*\)$",
                ColorSyntax::Rgb,
            ),
            (
                r"^hsla?\(\s*(\d+)\s*,\s*(\d+)%\s*,\s*(\d+)%\s*(?:,\s*([\d.]+))?\s*\)$",
                ColorSyntax::Hsl,
            ),
            (
                r"^hsla?\(\s*(\d+)\s+(\d+)%\s+(\d+)%\s*(?:/\s*([\d.]+))?\s*\)$",
                ColorSyntax::Hsl,
            ),
        ]
        .into_iter()
        .map(|(pattern, syntax)| (Regex::new(pattern).expect("color pattern"), syntax))
        .collect()
    })
}

fn length_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([+-]?\d*\.?\d+)([a-zA-Z%]+)$").expect("length pattern"))
}

pub fn parse_color(text: &str) -> Result<ParsedColor, ValueError> {
    let value = text.trim().to_ascii_lowercase();
    let not_a_color = || ValueError::NotAColor(text.to_string());

    if let Some(digits) = value.strip_prefix('#') {
        return parse_hex(digits).ok_or_else(not_a_color);
    }

    for (pattern, syntax) in color_patterns() {
        let Some(caps) = pattern.captures(&value) else {
            continue;
        };
        if let Some(alpha) = caps.get(4) {
            let opaque = alpha
                .as_str()
                .parse::<f64>()
                .is_ok_and(|alpha| alpha == 1.0);
            if !opaque {
                return Err(not_a_color());
            }
        }
        let component = |idx: usize| caps[idx].parse::<u32>().ok();
        let (Some(a), Some(b), Some(c)) = (component(1), component(2), component(3)) else {
            return Err(not_a_color());
        };
        return match syntax {
            ColorSyntax::Rgb => {
                let channel = |v: u32| u8::try_from(v).ok();
                match (channel(a), channel(b), channel(c)) {
                    (Some(r), Some(g), Some(b)) => Ok(ParsedColor::new(r, g, b)),
                    _ => Err(not_a_color()),
                }
            }
            ColorSyntax::Hsl => {
                if b > 100 || c > 100 {
                    return Err(not_a_color());
                }
                Ok(hsl_to_rgb(
                    f64::from(a) / 360.0,
                    f64::from(b) / 100.0,
                    f64::from(c) / 100.0,
                ))
            }
        };
    }

    Err(not_a_color())
}

fn parse_hex(digits: &str) -> Option<ParsedColor> {
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let doubled = |s: &str| s.chars().flat_map(|c| [c, c]).collect::<String>();
    let (rgb, alpha) = match digits.len() {
        3 => (doubled(digits), "ff".to_string()),
        4 => (doubled(&digits[..3]), doubled(&digits[3..])),
        6 => (digits.to_string(), "ff".to_string()),
        8 => (digits[..6].to_string(), digits[6..].to_string()),
        _ => return None,
    };
    if alpha != "ff" {
        return None;
    }
    ParsedColor::from_hex(&rgb)
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> ParsedColor {
    let (r, g, b) = if s == 0.0 {
        (l, l, l)
    } else {
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        (
            hue_to_channel(p, q, h + 1.0 / 3.0),
            hue_to_channel(p, q, h),
            hue_to_channel(p, q, h - 1.0 / 3.0),
        )
    };
    let to_byte = |x: f64| (x * 255.0).round().clamp(0.0, 255.0) as u8;
    ParsedColor::new(to_byte(r), to_byte(g), to_byte(b))
}

fn hue_to_channel(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 1.0 / 2.0 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
    }
    p
}

pub fn parse_dimension(text: &str) -> Result<ParsedDimension, ValueError> {
    let value = text.trim();
    let is_calc = value
        .get(..5)
        .is_some_and(|head| head.eq_ignore_ascii_case("calc("));
    if is_calc && value.ends_with(')') {
        return Ok(ParsedDimension::Calc(value.to_string()));
    }

    split_number_unit(value)
        .and_then(|(magnitude, suffix)| {
            Unit::from_suffix(suffix).map(|unit| ParsedDimension::Length { magnitude, unit })
        })
        .ok_or_else(|| ValueError::NotADimension(text.to_string()))
}

/// Splits `12.5rem` into `(12.5, "rem")`; the unit may be any letters or `%`.
pub fn split_number_unit(value: &str) -> Option<(f64, &str)> {
    let caps = length_pattern().captures(value)?;
    let magnitude = caps.get(1)?.as_str().parse::<f64>().ok()?;
    let suffix = caps.get(2)?.as_str();
    Some((magnitude, suffix))
}

#[cfg(test)]
mod tests {
    use super::{
        ParsedColor, ParsedDimension, Unit, canonical_dimension, has_unit_token, is_color_like,
        normalize_literal, parse_color, parse_dimension,
    };

    fn hex(text: &str) -> Option<String> {
        parse_color(text).ok().map(|color| color.hex())
    }

    #[test]
    fn parses_hex_lengths() {
        assert_eq!(hex("#f00").as_deref(), Some("ff0000"));
        assert_eq!(hex("#F00F").as_deref(), Some("ff0000"));
        assert_eq!(hex("#1A2b3C").as_deref(), Some("1a2b3c"));
        assert_eq!(hex("#ff0000ff").as_deref(), Some("ff0000"));
        assert_eq!(hex("#ff00"), None);
        assert_eq!(hex("#12345"), None);
        assert_eq!(hex("#gggggg"), None);
    }

    #[test]
    fn rejects_translucent_colors() {
        assert_eq!(hex("#ff000080"), None);
        assert_eq!(hex("#f008"), None);
        assert_eq!(hex("rgba(255,0,0,0.5)"), None);
        assert_eq!(hex("rgb(255 0 0 / 0.5)"), None);
        assert_eq!(hex("hsla(0, 100%, 50%, 0.2)"), None);
    }

    #[test]
    fn accepts_explicitly_opaque_alpha() {
        assert_eq!(hex("rgb(255 0 0 / 1)").as_deref(), Some("ff0000"));
        assert_eq!(hex("rgba(255, 0, 0, 1)").as_deref(), Some("ff0000"));
        assert_eq!(hex("rgba(0,128,255,1.0)").as_deref(), Some("0080ff"));
    }

    #[test]
    fn parses_rgb_notations() {
        assert_eq!(hex("rgb(18, 52, 86)").as_deref(), Some("123456"));
        assert_eq!(hex("rgb(18 52 86)").as_deref(), Some("123456"));
        assert_eq!(hex("RGB(0,0,0)").as_deref(), Some("000000"));
        assert_eq!(hex("rgb(256, 0, 0)"), None);
        assert_eq!(hex("rgb(1, 2 3)"), None);
    }

    #[test]
    fn parses_hsl_notations() {
        assert_eq!(hex("hsl(0, 100%, 50%)").as_deref(), Some("ff0000"));
        assert_eq!(hex("hsl(120 100% 25%)").as_deref(), Some("008000"));
        assert_eq!(hex("hsl(240, 100%, 50%)").as_deref(), Some("0000ff"));
        assert_eq!(hex("hsl(0, 0%, 50%)").as_deref(), Some("808080"));
        assert_eq!(hex("hsl(0 0% 100% / 1)").as_deref(), Some("ffffff"));
        assert_eq!(hex("hsl(0, 150%, 50%)"), None);
    }

    #[test]
    fn rejects_non_colors() {
        assert_eq!(hex("12px"), None);
        assert_eq!(hex("red"), None);
        assert_eq!(hex("var(--brand)"), None);
    }

    #[test]
    fn hex_round_trips_through_display() {
        let color = ParsedColor::from_hex("#0a0B0c").expect("valid hex");
        assert_eq!(color.to_string(), "#0a0b0c");
    }

    #[test]
    fn parses_lengths() {
        assert_eq!(
            parse_dimension("15.6px"),
            Ok(ParsedDimension::Length {
                magnitude: 15.6,
                unit: Unit::Px
            })
        );
        assert_eq!(
            parse_dimension("-.5rem"),
            Ok(ParsedDimension::Length {
                magnitude: -0.5,
                unit: Unit::Rem
            })
        );
        assert_eq!(
            parse_dimension("50vmin"),
            Ok(ParsedDimension::Length {
                magnitude: 50.0,
                unit: Unit::Vmin
            })
        );
        assert_eq!(
            parse_dimension("33.33%"),
            Ok(ParsedDimension::Length {
                magnitude: 33.33,
                unit: Unit::Percent
            })
        );
    }

    #[test]
    fn parses_calc_expressions() {
        assert_eq!(
            parse_dimension("calc(100% - 2rem)"),
            Ok(ParsedDimension::Calc("calc(100% - 2rem)".to_string()))
        );
    }

    #[test]
    fn rejects_unknown_units_and_words() {
        assert!(parse_dimension("12ch").is_err());
        assert!(parse_dimension("auto").is_err());
        assert!(parse_dimension("10px 20px").is_err());
        assert!(parse_dimension("px").is_err());
    }

    #[test]
    fn underscores_become_spaces() {
        assert_eq!(normalize_literal("calc(100%_-_2rem)"), "calc(100% - 2rem)");
        assert_eq!(normalize_literal(r"a\_b"), "a_b");
        assert_eq!(canonical_dimension("  calc(1px  +  2px) "), "calc(1px + 2px)");
    }

    #[test]
    fn classifies_literals() {
        assert!(is_color_like("#fff"));
        assert!(is_color_like("hsl(0 0% 0% / 0.5)"));
        assert!(!is_color_like("12px"));
        assert!(has_unit_token("12px"));
        assert!(has_unit_token("calc(100%-1px)"));
        assert!(!has_unit_token("auto"));
    }
}
