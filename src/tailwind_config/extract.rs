//! Token tables from a config, either from the parsed object or, when the
//! file holds code the parser refuses, from brace and pattern matching on
//! the text.

use super::object::{
    Blank, JsObject, JsValue, find_block, find_matching_brace, locate_export, mask,
    object_entries, string_at,
};
use crate::naming::color::is_reserved_name;
use crate::session::{COLORS, TokenTable};
use crate::value::{canonical_dimension, parse_color};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    pub tokens: TokenTable,
    /// Every key seen per category, indexed or not.
    pub names: BTreeMap<String, BTreeSet<String>>,
    pub prefix: Option<String>,
}

impl Extracted {
    fn reserve(&mut self, category: &str, name: &str) {
        self.names
            .entry(category.to_string())
            .or_default()
            .insert(name.to_string());
    }

    fn entry(&mut self, category: &str, name: &str, value: &str) {
        if category == COLORS {
            if is_reserved_name(name) {
                return;
            }
            self.reserve(COLORS, name);
            if let Ok(color) = parse_color(value.trim()) {
                self.tokens.insert(COLORS, &color.hex(), name);
            }
        } else {
            self.reserve(category, name);
            let canonical = canonical_dimension(value);
            if !canonical.is_empty() {
                self.tokens.insert(category, &canonical, name);
            }
        }
    }

    fn group(&mut self, family: &str, shade: &str, value: &str) {
        self.entry(COLORS, &group_name(family, shade), value);
    }
}

/// `DEFAULT` names the family itself.
pub fn group_name(family: &str, shade: &str) -> String {
    if shade == "DEFAULT" {
        family.to_string()
    } else {
        format!("{family}-{shade}")
    }
}

pub fn from_object(object: &JsObject) -> Extracted {
    let mut out = Extracted {
        prefix: object
            .get("prefix")
            .and_then(JsValue::as_str)
            .map(str::to_string),
        ..Extracted::default()
    };

    let Some(theme) = object.get("theme").and_then(JsValue::as_object) else {
        return out;
    };
    if let Some(extend) = theme.get("extend").and_then(JsValue::as_object) {
        for (category, value) in extend {
            object_category(&mut out, category, value);
        }
    }
    for (category, value) in theme {
        if category != "extend" {
            object_category(&mut out, category, value);
        }
    }
    out
}

fn object_category(out: &mut Extracted, category: &str, value: &JsValue) {
    let Some(entries) = value.as_object() else {
        return;
    };
    for (key, entry) in entries {
        match entry {
            JsValue::Str(value) | JsValue::Num(value) => out.entry(category, key, value),
            JsValue::Array(items) => match items.first().and_then(JsValue::as_str) {
                Some(first) => out.entry(category, key, first),
                None => out.reserve(category, key),
            },
            JsValue::Object(group) if category == COLORS => {
                for (shade, value) in group {
                    match value.as_str() {
                        Some(value) => out.group(key, shade, value),
                        None => out.reserve(COLORS, &group_name(key, shade)),
                    }
                }
            }
            _ => out.reserve(category, key),
        }
    }
}

/// Best-effort extraction from raw config text.
pub fn from_text(text: &str) -> Extracted {
    let clean = mask(text, Blank::Comments);
    let code = mask(text, Blank::CommentsAndStrings);
    let mut out = Extracted {
        prefix: prefix_of(&clean),
        ..Extracted::default()
    };

    if let Some((open, close)) = theme_span(&clean, &code) {
        if let Some(extend) = find_block(&clean, &code, open, close, "extend") {
            for entry in object_entries(&clean, &code, extend.open, extend.close) {
                text_category(&mut out, &clean, &code, &entry.key, entry.value_start);
            }
        }
        for entry in object_entries(&clean, &code, open, close) {
            if entry.key != "extend" {
                text_category(&mut out, &clean, &code, &entry.key, entry.value_start);
            }
        }
    }

    for (category, open) in tail_slots(&clean, &code) {
        text_category(&mut out, &clean, &code, &category, open);
    }

    scan_color_groups(&mut out, &clean);
    scan_color_pairs(&mut out, &clean);
    out
}

/// Objects assigned to `<export>.theme.extend.<category>` after the export,
/// as category and opening brace.
fn tail_slots(clean: &str, code: &str) -> Vec<(String, usize)> {
    static SLOT_RE: OnceLock<Regex> = OnceLock::new();
    let re = SLOT_RE.get_or_init(|| {
        Regex::new(r"\.theme\.extend(?:\.([A-Za-z_$][\w$]*)|\[\s*(['`\x22])[^\]]*\])\s*=\s*\{")
            .expect("valid slot regex")
    });
    re.captures_iter(code)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let category = match (caps.get(1), caps.get(2)) {
                (Some(name), _) => name.as_str(),
                (None, Some(quote)) => string_at(clean, code, quote.start())?,
                (None, None) => return None,
            };
            Some((category.to_string(), whole.end() - 1))
        })
        .collect()
}

fn theme_span(clean: &str, code: &str) -> Option<(usize, usize)> {
    if let Some((_, _, open)) = locate_export(code) {
        let close = find_matching_brace(code, open)?;
        if let Some(theme) = find_block(clean, code, open, close, "theme") {
            return Some((theme.open, theme.close));
        }
    }
    static THEME_RE: OnceLock<Regex> = OnceLock::new();
    let re = THEME_RE
        .get_or_init(|| Regex::new(r"\btheme\s*:\s*\{").expect("valid theme regex"));
    let found = re.find(code)?;
    let open = found.end() - 1;
    Some((open, find_matching_brace(code, open)?))
}

fn text_category(out: &mut Extracted, clean: &str, code: &str, category: &str, start: usize) {
    if code.as_bytes().get(start) != Some(&b'{') {
        return;
    }
    let Some(close) = find_matching_brace(code, start) else {
        return;
    };
    for entry in object_entries(clean, code, start, close) {
        let value_start = entry.value_start;
        match code.as_bytes().get(value_start) {
            Some(b'{') if category == COLORS => {
                let Some(group_close) = find_matching_brace(code, value_start) else {
                    continue;
                };
                for shade in object_entries(clean, code, value_start, group_close) {
                    match string_at(clean, code, shade.value_start) {
                        Some(value) => out.group(&entry.key, &shade.key, value),
                        None => out.reserve(COLORS, &group_name(&entry.key, &shade.key)),
                    }
                }
            }
            Some(b'[') => match string_at(clean, code, skip_ws(code, value_start + 1)) {
                Some(first) => out.entry(category, &entry.key, first),
                None => out.reserve(category, &entry.key),
            },
            _ => match string_at(clean, code, value_start) {
                Some(value) => out.entry(category, &entry.key, value),
                None => out.reserve(category, &entry.key),
            },
        }
    }
}

fn skip_ws(code: &str, idx: usize) -> usize {
    code.get(idx..)
        .map(|rest| idx + (rest.len() - rest.trim_start().len()))
        .unwrap_or(idx)
}

fn prefix_of(clean: &str) -> Option<String> {
    static PREFIX_RE: OnceLock<Regex> = OnceLock::new();
    let re = PREFIX_RE.get_or_init(|| {
        Regex::new(r#"\bprefix\s*:\s*['"`]([^'"`]+)['"`]"#).expect("valid prefix regex")
    });
    re.captures(clean)
        .and_then(|caps| caps.get(1))
        .map(|value| value.as_str().to_string())
}

/// `family: { shade: '#rrggbb' }` anywhere in the file.
fn scan_color_groups(out: &mut Extracted, clean: &str) {
    static GROUP_RE: OnceLock<Regex> = OnceLock::new();
    static SHADE_RE: OnceLock<Regex> = OnceLock::new();
    let group_re = GROUP_RE.get_or_init(|| {
        Regex::new(r#"['"`]?([\w-]+)['"`]?\s*:\s*\{([^{}]*)\}"#).expect("valid group regex")
    });
    let shade_re = SHADE_RE.get_or_init(|| {
        Regex::new(r#"['"`]?([\w-]+)['"`]?\s*:\s*['"`](#[0-9a-fA-F]{6})['"`]"#)
            .expect("valid shade regex")
    });

    for caps in group_re.captures_iter(clean) {
        let (Some(family), Some(body)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let family = family.as_str();
        if matches!(family, "colors" | "extend" | "theme") {
            continue;
        }
        for shade in shade_re.captures_iter(body.as_str()) {
            if let (Some(name), Some(hex)) = (shade.get(1), shade.get(2)) {
                out.group(family, name.as_str(), hex.as_str());
            }
        }
    }
}

/// `name: '#rrggbb'` anywhere in the file; shade keys are left to the
/// group scan.
fn scan_color_pairs(out: &mut Extracted, clean: &str) {
    static PAIR_RE: OnceLock<Regex> = OnceLock::new();
    let re = PAIR_RE.get_or_init(|| {
        Regex::new(r#"(?:['"`]([^'"`]+)['"`]|([\w-]+))\s*:\s*['"`](#[0-9a-fA-F]{6})['"`]"#)
            .expect("valid pair regex")
    });
    for caps in re.captures_iter(clean) {
        let Some(name) = caps.get(1).or_else(|| caps.get(2)) else {
            continue;
        };
        let Some(hex) = caps.get(3) else {
            continue;
        };
        let name = name.as_str();
        if name == "DEFAULT" || name.starts_with(|c: char| c.is_ascii_digit()) {
            continue;
        }
        let Ok(color) = parse_color(hex.as_str()) else {
            continue;
        };
        if out.tokens.contains(COLORS, &color.hex()) {
            continue;
        }
        out.entry(COLORS, name, hex.as_str());
    }
}
