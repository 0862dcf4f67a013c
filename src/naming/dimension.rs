//! Algorithmic names for lengths, percentages and calc expressions.

use crate::config::Settings;
use crate::session::Session;
use crate::value::{ParsedDimension, Unit, split_number_unit};
use regex::Regex;
use std::sync::OnceLock;

/// Exact literals that map to Tailwind's fraction vocabulary. No tolerance
/// is applied: `33%` is not `1/3`.
const FRACTION_SHORTCUTS: [(&str, &str); 12] = [
    ("100%", "full"),
    ("50%", "1/2"),
    ("33.333333%", "1/3"),
    ("33.33%", "1/3"),
    ("66.666667%", "2/3"),
    ("66.67%", "2/3"),
    ("25%", "1/4"),
    ("75%", "3/4"),
    ("20%", "1/5"),
    ("40%", "2/5"),
    ("60%", "3/5"),
    ("80%", "4/5"),
];

pub fn fraction_shortcut(value: &str) -> Option<&'static str> {
    FRACTION_SHORTCUTS
        .iter()
        .find(|(literal, _)| *literal == value)
        .map(|(_, name)| *name)
}

/// Returns the token name for `value` in `category`, reusing config names and
/// earlier assignments from this run.
pub fn name_for(
    session: &mut Session,
    category: &str,
    value: &str,
    dimension: &ParsedDimension,
) -> String {
    if let Some(name) = session.tokens.name_of(category, value) {
        session.stats.value_config_matches += 1;
        return name.to_string();
    }
    if let Some(name) = session.discovered.name_of(category, value) {
        return name.to_string();
    }

    let base = base_name(value, dimension, &session.settings);
    let name = session.registry.claim(category, &base);
    session.discovered.record(category, value, &name);
    session.stats.generated_names += 1;
    tracing::debug!(category, value, name = %name, "generated value name");
    name
}

/// The name before collision resolution.
pub fn base_name(value: &str, dimension: &ParsedDimension, settings: &Settings) -> String {
    if let Some(shortcut) = fraction_shortcut(value) {
        return shortcut.to_string();
    }

    let raw = match dimension {
        ParsedDimension::Calc(expr) => calc_name(expr),
        ParsedDimension::Length { magnitude, unit } => {
            length_name(*magnitude, *unit, settings.unit_prefix(unit.as_str()))
        }
        ParsedDimension::Opaque(raw) => match split_number_unit(raw) {
            Some((magnitude, suffix)) => hyphenate(&format!("{magnitude}{suffix}")),
            None => raw.clone(),
        },
    };
    sanitize(&raw)
}

fn length_name(magnitude: f64, unit: Unit, prefix: &str) -> String {
    let body = match unit {
        Unit::Px | Unit::Percent => round_half_up(magnitude).to_string(),
        Unit::Rem => rem_body(magnitude),
        Unit::Em => dashed(magnitude),
        Unit::Vh | Unit::Vw | Unit::Vmin | Unit::Vmax => {
            return format!("{}-{}", unit.as_str(), round_half_up(magnitude));
        }
    };
    join_prefix(prefix, &body)
}

fn rem_body(magnitude: f64) -> String {
    if magnitude % 1.0 == 0.0 {
        return magnitude.to_string();
    }
    let floor = magnitude.floor();
    match format!("{:.2}", magnitude % 1.0).as_str() {
        "0.25" => format!("{floor}-25"),
        "0.50" => format!("{floor}-5"),
        "0.75" => format!("{floor}-75"),
        _ => dashed(magnitude),
    }
}

fn dashed(magnitude: f64) -> String {
    magnitude.to_string().replacen('.', "-", 1)
}

fn join_prefix(prefix: &str, body: &str) -> String {
    if prefix.is_empty() {
        body.to_string()
    } else {
        format!("{prefix}-{body}")
    }
}

fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

struct CalcPatterns {
    var: Regex,
    theme: Regex,
    operator: Regex,
}

fn calc_patterns() -> &'static CalcPatterns {
    static PATTERNS: OnceLock<CalcPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| CalcPatterns {
        var: Regex::new(r"var\(\s*--[\w-]+\s*\)").expect("var pattern"),
        theme: Regex::new(r#"theme\(\s*[\w.\-'"]+\s*\)"#).expect("theme pattern"),
        operator: Regex::new(r"\s*([+\-*/])\s*").expect("operator pattern"),
    })
}

/// `calc(100% - 2rem)` → `calc-100-minus-2rem`.
pub fn calc_name(expr: &str) -> String {
    let trimmed = expr.trim();
    let inner = trimmed
        .get(..5)
        .filter(|head| head.eq_ignore_ascii_case("calc("))
        .and_then(|_| trimmed[5..].strip_suffix(')'))
        .unwrap_or(trimmed);

    let patterns = calc_patterns();
    let out = patterns.var.replace_all(inner, "var");
    let out = patterns.theme.replace_all(&out, "theme");
    // One pass so the hyphens of `-plus-` are not read as minus signs.
    let out = patterns
        .operator
        .replace_all(&out, |caps: &regex::Captures<'_>| match &caps[1] {
            "+" => "-plus-",
            "-" => "-minus-",
            "*" => "-times-",
            _ => "-div-",
        });
    let out = out.replace(['(', ')'], "-");
    format!("calc-{}", hyphenate(&out))
}

/// Every non-alphanumeric run becomes a single hyphen; edges trimmed.
fn hyphenate(value: &str) -> String {
    collapse_hyphens(
        &value
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect::<String>(),
    )
}

/// Keeps alphanumerics, `-` and `.`.
pub fn sanitize(name: &str) -> String {
    collapse_hyphens(
        &name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                    c
                } else {
                    '-'
                }
            })
            .collect::<String>(),
    )
}

fn collapse_hyphens(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch == '-' && out.ends_with('-') {
            continue;
        }
        out.push(ch);
    }
    out.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::{base_name, calc_name, fraction_shortcut, name_for, sanitize};
    use crate::config::Settings;
    use crate::session::{Session, TokenTable};
    use crate::value::{ParsedDimension, parse_dimension};

    fn name(value: &str) -> String {
        let dimension =
            parse_dimension(value).unwrap_or_else(|_| ParsedDimension::Opaque(value.to_string()));
        base_name(value, &dimension, &Settings::default())
    }

    #[test]
    fn fraction_shortcuts_are_literal() {
        assert_eq!(fraction_shortcut("50%"), Some("1/2"));
        assert_eq!(fraction_shortcut("33.333333%"), Some("1/3"));
        assert_eq!(fraction_shortcut("66.67%"), Some("2/3"));
        assert_eq!(fraction_shortcut("33%"), None);
        assert_eq!(name("100%"), "full");
        assert_eq!(name("80%"), "4/5");
    }

    #[test]
    fn rounds_pixels_half_up() {
        assert_eq!(name("15.6px"), "16");
        assert_eq!(name("15.5px"), "16");
        assert_eq!(name("327px"), "327");
        assert_eq!(name("-2.5px"), "2");
    }

    #[test]
    fn names_rem_values() {
        assert_eq!(name("2rem"), "r-2");
        assert_eq!(name("1.25rem"), "r-1-25");
        assert_eq!(name("1.5rem"), "r-1-5");
        assert_eq!(name("0.75rem"), "r-0-75");
        assert_eq!(name("1.125rem"), "r-1-125");
    }

    #[test]
    fn names_em_percent_and_viewport_values() {
        assert_eq!(name("1.5em"), "e-1-5");
        assert_eq!(name("45.6%"), "pc-46");
        assert_eq!(name("100vh"), "vh-100");
        assert_eq!(name("33.4vw"), "vw-33");
        assert_eq!(name("50vmin"), "vmin-50");
        assert_eq!(name("10vmax"), "vmax-10");
    }

    #[test]
    fn names_opaque_values() {
        assert_eq!(name("2lvh"), "2lvh");
        assert_eq!(name("10px 20px"), "10px-20px");
        assert_eq!(name("min(10px,2rem)"), "min-10px-2rem");
    }

    #[test]
    fn calc_names_use_connector_words() {
        assert_eq!(calc_name("calc(100%-2rem)"), "calc-100-minus-2rem");
        assert_eq!(calc_name("calc(100% + 20px)"), "calc-100-plus-20px");
        assert_eq!(calc_name("calc(2 * 3rem)"), "calc-2-times-3rem");
        assert_eq!(calc_name("calc(100vh / 3)"), "calc-100vh-div-3");
        assert_eq!(calc_name("calc(var(--gap) * 2)"), "calc-var-times-2");
        assert_eq!(
            calc_name("calc(theme(spacing.4) + (1px * 2))"),
            "calc-theme-plus-1px-times-2"
        );
        let generated = name("calc(100%-2rem)");
        assert!(generated.starts_with("calc-"));
        assert!(generated.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'));
    }

    #[test]
    fn sanitize_collapses_and_trims() {
        assert_eq!(sanitize("--a__b..c--"), "a-b..c");
        assert_eq!(sanitize("x y"), "x-y");
    }

    #[test]
    fn memoizes_and_resolves_collisions() {
        let mut tokens = TokenTable::new();
        tokens.insert("width", "4rem", "16");
        let mut session = Session::new(Settings::default(), tokens);

        let px = parse_dimension("16px").expect("px");
        assert_eq!(name_for(&mut session, "width", "16px", &px), "16-1");
        assert_eq!(name_for(&mut session, "width", "16px", &px), "16-1");

        let rounded = parse_dimension("15.8px").expect("px");
        assert_eq!(name_for(&mut session, "width", "15.8px", &rounded), "16-2");

        let rem = parse_dimension("4rem").expect("rem");
        assert_eq!(name_for(&mut session, "width", "4rem", &rem), "16");

        assert_eq!(session.stats.generated_names, 2);
        assert_eq!(session.stats.value_config_matches, 1);
    }

    #[test]
    fn shortcut_collisions_get_suffixes() {
        let mut session = Session::new(Settings::default(), TokenTable::new());
        let a = parse_dimension("33.33%").expect("pct");
        let b = parse_dimension("33.333333%").expect("pct");
        assert_eq!(name_for(&mut session, "width", "33.33%", &a), "1/3");
        assert_eq!(name_for(&mut session, "width", "33.333333%", &b), "1/3-1");
    }
}
