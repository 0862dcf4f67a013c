//! A constrained reader and writer for the JSON-like object literal a
//! Tailwind config exports. Nothing here evaluates code: anything beyond
//! literals, arrays and nested objects is rejected.

use crate::error::ObjectParseError;
use indexmap::IndexMap;
use regex::Regex;
use std::sync::OnceLock;

pub type JsObject = IndexMap<String, JsValue>;

#[derive(Debug, Clone, PartialEq)]
pub enum JsValue {
    Str(String),
    /// Raw numeric text, kept as written.
    Num(String),
    Bool(bool),
    Null,
    Array(Vec<JsValue>),
    Object(JsObject),
}

impl JsValue {
    pub fn as_object(&self) -> Option<&JsObject> {
        match self {
            JsValue::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut JsObject> {
        match self {
            JsValue::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            JsValue::Str(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportStyle {
    #[default]
    CommonJs,
    EsModule,
}

impl ExportStyle {
    fn statement(self) -> &'static str {
        match self {
            ExportStyle::CommonJs => "module.exports = ",
            ExportStyle::EsModule => "export default ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blank {
    Comments,
    CommentsAndStrings,
}

/// Same-length copy of `text` with comments (and optionally string
/// contents) replaced by spaces. Newlines and quote characters survive, so
/// byte offsets and line structure match the original.
pub fn mask(text: &str, blank: Blank) -> String {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum State {
        Code,
        LineComment,
        BlockComment,
        Str(char),
    }

    let blank_strings = blank == Blank::CommentsAndStrings;
    let mut out = String::with_capacity(text.len());
    let mut state = State::Code;
    let mut chars = text.chars().peekable();

    let push_blank = |out: &mut String, ch: char| {
        if ch == '\n' {
            out.push('\n');
        } else {
            out.extend(std::iter::repeat_n(' ', ch.len_utf8()));
        }
    };

    while let Some(ch) = chars.next() {
        match state {
            State::Code => match ch {
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    out.push_str("  ");
                    state = State::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    out.push_str("  ");
                    state = State::BlockComment;
                }
                '\'' | '"' | '`' => {
                    out.push(ch);
                    state = State::Str(ch);
                }
                _ => out.push(ch),
            },
            State::LineComment => {
                push_blank(&mut out, ch);
                if ch == '\n' {
                    state = State::Code;
                }
            }
            State::BlockComment => {
                if ch == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    out.push_str("  ");
                    state = State::Code;
                } else {
                    push_blank(&mut out, ch);
                }
            }
            State::Str(quote) => {
                if ch == '\\' {
                    let escaped = chars.next();
                    if blank_strings {
                        push_blank(&mut out, ch);
                        if let Some(escaped) = escaped {
                            push_blank(&mut out, escaped);
                        }
                    } else {
                        out.push(ch);
                        if let Some(escaped) = escaped {
                            out.push(escaped);
                        }
                    }
                } else if ch == quote {
                    out.push(ch);
                    state = State::Code;
                } else if blank_strings {
                    push_blank(&mut out, ch);
                } else {
                    out.push(ch);
                }
            }
        }
    }
    out
}

/// Index of the `}` closing the brace at `open_idx`, counting braces only.
/// Callers pass masked text so braces in strings and comments never count.
pub fn find_matching_brace(masked: &str, open_idx: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (rel_idx, ch) in masked.get(open_idx..)?.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(open_idx + rel_idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Where the exported object literal starts: statement offset, brace offset.
pub fn locate_export(masked: &str) -> Option<(ExportStyle, usize, usize)> {
    static EXPORT_RE: OnceLock<Regex> = OnceLock::new();
    let re = EXPORT_RE.get_or_init(|| {
        Regex::new(r"(module\.exports\s*=|export\s+default)\s*\{").expect("valid export regex")
    });
    let caps = re.captures(masked)?;
    let whole = caps.get(0)?;
    let style = if caps.get(1)?.as_str().starts_with("module") {
        ExportStyle::CommonJs
    } else {
        ExportStyle::EsModule
    };
    Some((style, whole.start(), whole.end() - 1))
}

/// How to address what a config exports when it is not written as a
/// literal: `module.exports` for CommonJS, the binding of
/// `export default name`. `None` for exports with no name, e.g.
/// `export default defineConfig(base)`.
pub fn export_binding(masked: &str) -> Option<String> {
    static DEFAULT_RE: OnceLock<Regex> = OnceLock::new();
    static ESM_RE: OnceLock<Regex> = OnceLock::new();
    static CJS_RE: OnceLock<Regex> = OnceLock::new();
    let default_re = DEFAULT_RE.get_or_init(|| {
        Regex::new(r"(?m)\bexport\s+default\s+([A-Za-z_$][\w$]*)\s*;?\s*$")
            .expect("valid default export regex")
    });
    let esm_re =
        ESM_RE.get_or_init(|| Regex::new(r"\bexport\s+default\b").expect("valid esm regex"));
    let cjs_re = CJS_RE
        .get_or_init(|| Regex::new(r"\bmodule\.exports\s*=").expect("valid commonjs regex"));

    if esm_re.is_match(masked) {
        let binding = default_re.captures(masked)?.get(1)?.as_str();
        if matches!(binding, "function" | "class" | "async" | "new" | "await") {
            return None;
        }
        return Some(binding.to_string());
    }
    cjs_re
        .is_match(masked)
        .then(|| "module.exports".to_string())
}

/// Parses a whole config file whose only statement exports an object
/// literal.
pub fn parse_config(text: &str) -> Result<(ExportStyle, JsObject), ObjectParseError> {
    let without_comments = mask(text, Blank::Comments);
    let code = mask(text, Blank::CommentsAndStrings);
    let (style, statement, open) = locate_export(&code).ok_or_else(|| ObjectParseError {
        message: "no exported object".to_string(),
        offset: 0,
    })?;
    if !code[..statement].trim().is_empty() {
        return Err(ObjectParseError {
            message: "statements before the export".to_string(),
            offset: 0,
        });
    }
    let close = find_matching_brace(&code, open).ok_or_else(|| ObjectParseError {
        message: "unbalanced braces".to_string(),
        offset: open,
    })?;
    let rest = code[close + 1..].trim();
    if !(rest.is_empty() || rest == ";") {
        return Err(ObjectParseError {
            message: "statements after the export".to_string(),
            offset: close + 1,
        });
    }
    let object = parse_object(&without_comments[open..=close]).map_err(|err| ObjectParseError {
        message: err.message,
        offset: err.offset + open,
    })?;
    Ok((style, object))
}

pub fn parse_object(text: &str) -> Result<JsObject, ObjectParseError> {
    let mut parser = Parser { text, pos: 0 };
    parser.skip_ws();
    let object = parser.object()?;
    parser.skip_ws();
    if parser.pos < text.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(object)
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn error(&self, message: &str) -> ObjectParseError {
        ObjectParseError {
            message: message.to_string(),
            offset: self.pos,
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), ObjectParseError> {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            Ok(())
        } else {
            Err(self.error(&format!("expected '{expected}'")))
        }
    }

    fn skip_ws(&mut self) {
        loop {
            let rest = &self.text[self.pos..];
            let trimmed = rest.trim_start();
            self.pos += rest.len() - trimmed.len();
            if trimmed.starts_with("//") {
                self.pos += trimmed.find('\n').unwrap_or(trimmed.len());
            } else if trimmed.starts_with("/*") {
                match trimmed[2..].find("*/") {
                    Some(end) => self.pos += end + 4,
                    None => self.pos = self.text.len(),
                }
            } else {
                return;
            }
        }
    }

    fn object(&mut self) -> Result<JsObject, ObjectParseError> {
        self.expect('{')?;
        let mut object = JsObject::new();
        loop {
            self.skip_ws();
            if self.peek() == Some('}') {
                self.pos += 1;
                return Ok(object);
            }
            let key = self.key()?;
            self.skip_ws();
            self.expect(':')?;
            self.skip_ws();
            let value = self.value()?;
            object.insert(key, value);
            self.skip_ws();
            match self.bump() {
                Some(',') => continue,
                Some('}') => return Ok(object),
                _ => return Err(self.error("expected ',' or '}'")),
            }
        }
    }

    fn array(&mut self) -> Result<Vec<JsValue>, ObjectParseError> {
        self.expect('[')?;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some(']') {
                self.pos += 1;
                return Ok(items);
            }
            items.push(self.value()?);
            self.skip_ws();
            match self.bump() {
                Some(',') => continue,
                Some(']') => return Ok(items),
                _ => return Err(self.error("expected ',' or ']'")),
            }
        }
    }

    fn key(&mut self) -> Result<String, ObjectParseError> {
        match self.peek() {
            Some(quote @ ('\'' | '"' | '`')) => self.string(quote),
            Some(ch) if ch.is_ascii_digit() => self.number(),
            Some(ch) if is_ident_start(ch) => Ok(self.identifier().to_string()),
            _ => Err(self.error("expected a key")),
        }
    }

    fn value(&mut self) -> Result<JsValue, ObjectParseError> {
        match self.peek() {
            Some('{') => Ok(JsValue::Object(self.object()?)),
            Some('[') => Ok(JsValue::Array(self.array()?)),
            Some(quote @ ('\'' | '"' | '`')) => Ok(JsValue::Str(self.string(quote)?)),
            Some(ch) if ch.is_ascii_digit() || ch == '-' || ch == '.' => {
                Ok(JsValue::Num(self.number()?))
            }
            Some(ch) if is_ident_start(ch) => {
                let start = self.pos;
                match self.identifier() {
                    "true" => Ok(JsValue::Bool(true)),
                    "false" => Ok(JsValue::Bool(false)),
                    "null" => Ok(JsValue::Null),
                    _ => {
                        self.pos = start;
                        Err(self.error("unsupported expression"))
                    }
                }
            }
            _ => Err(self.error("expected a value")),
        }
    }

    fn identifier(&mut self) -> &'a str {
        let text = self.text;
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        &text[start..self.pos]
    }

    fn number(&mut self) -> Result<String, ObjectParseError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        while self
            .peek()
            .is_some_and(|ch| ch.is_ascii_digit() || matches!(ch, '.' | 'e' | 'E'))
        {
            self.pos += 1;
            if matches!(self.text[..self.pos].chars().last(), Some('e' | 'E'))
                && matches!(self.peek(), Some('+' | '-'))
            {
                self.pos += 1;
            }
        }
        let raw = &self.text[start..self.pos];
        if raw.parse::<f64>().is_err() {
            self.pos = start;
            return Err(self.error("invalid number"));
        }
        Ok(raw.to_string())
    }

    fn string(&mut self, quote: char) -> Result<String, ObjectParseError> {
        self.expect(quote)?;
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some(ch) if ch == quote => return Ok(value),
                Some('\n') if quote != '`' => return Err(self.error("newline in string")),
                Some('$') if quote == '`' && self.peek() == Some('{') => {
                    return Err(self.error("template interpolation"));
                }
                Some('\\') => match self.bump() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some(escaped) => value.push(escaped),
                    None => return Err(self.error("unterminated string")),
                },
                Some(ch) => value.push(ch),
            }
        }
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == '$'
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '$'
}

pub fn is_identifier_key(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|ch| ch.is_ascii_alphabetic() || ch == '_')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
    out.push('\'');
    out
}

pub fn format_key(key: &str) -> String {
    if is_identifier_key(key) {
        key.to_string()
    } else {
        quote(key)
    }
}

/// Renders a whole config file around `object`.
pub fn format_config(object: &JsObject, style: ExportStyle) -> String {
    let mut out = String::from("/** @type {import('tailwindcss').Config} */\n");
    out.push_str(style.statement());
    format_object(object, 0, &mut out);
    out.push('\n');
    out
}

fn indent(level: usize) -> String {
    "  ".repeat(level)
}

fn format_object(object: &JsObject, level: usize, out: &mut String) {
    if object.is_empty() {
        out.push_str("{}");
        return;
    }
    out.push_str("{\n");
    let last = object.len() - 1;
    for (idx, (key, value)) in object.iter().enumerate() {
        out.push_str(&indent(level + 1));
        out.push_str(&format_key(key));
        out.push_str(": ");
        format_value(value, level + 1, out);
        if idx != last {
            out.push(',');
        }
        out.push('\n');
    }
    out.push_str(&indent(level));
    out.push('}');
}

fn format_value(value: &JsValue, level: usize, out: &mut String) {
    match value {
        JsValue::Str(text) => out.push_str(&quote(text)),
        JsValue::Num(raw) => out.push_str(raw),
        JsValue::Bool(flag) => out.push_str(if *flag { "true" } else { "false" }),
        JsValue::Null => out.push_str("null"),
        JsValue::Object(object) => format_object(object, level, out),
        JsValue::Array(items) if items.is_empty() => out.push_str("[]"),
        JsValue::Array(items) => {
            out.push_str("[\n");
            let last = items.len() - 1;
            for (idx, item) in items.iter().enumerate() {
                out.push_str(&indent(level + 1));
                format_value(item, level + 1, out);
                if idx != last {
                    out.push(',');
                }
                out.push('\n');
            }
            out.push_str(&indent(level));
            out.push(']');
        }
    }
}

/// A `key: value` member found in object literal text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub key_start: usize,
    pub value_start: usize,
}

/// An object-valued member: `key: { ... }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub key_start: usize,
    pub open: usize,
    pub close: usize,
}

/// Top-level members of the object spanning `open..=close`. `code` is the
/// fully masked form of `text`; keys are read from `text`.
pub fn object_entries(text: &str, code: &str, open: usize, close: usize) -> Vec<Entry> {
    let bytes = code.as_bytes();
    let mut entries = Vec::new();
    let mut depth = 0usize;
    let mut expect_key = true;
    let mut i = open + 1;

    while i < close {
        let b = bytes[i];
        match b {
            b'{' | b'[' | b'(' => {
                depth += 1;
                expect_key = false;
                i += 1;
            }
            b'}' | b']' | b')' => {
                depth = depth.saturating_sub(1);
                i += 1;
            }
            b',' if depth == 0 => {
                expect_key = true;
                i += 1;
            }
            _ if b.is_ascii_whitespace() => i += 1,
            _ if depth == 0 && expect_key => {
                expect_key = false;
                let (key, after) = if matches!(b, b'\'' | b'"' | b'`') {
                    let Some(len) = code[i + 1..close].find(b as char) else {
                        break;
                    };
                    let end = i + 1 + len;
                    (text[i + 1..end].to_string(), end + 1)
                } else {
                    let len = code[i..close]
                        .find(|c: char| !(is_ident_char(c) || c == '-'))
                        .unwrap_or(close - i);
                    if len == 0 {
                        i += code[i..close].chars().next().map_or(1, char::len_utf8);
                        continue;
                    }
                    (code[i..i + len].to_string(), i + len)
                };
                match code[after..close].trim_start().strip_prefix(':') {
                    Some(value) => {
                        let value_start = close - value.trim_start().len();
                        entries.push(Entry {
                            key,
                            key_start: i,
                            value_start,
                        });
                        i = value_start;
                    }
                    None => i = after,
                }
            }
            _ => i += 1,
        }
    }
    entries
}

/// The object-valued member `key` of the object spanning `open..=close`.
pub fn find_block(text: &str, code: &str, open: usize, close: usize, key: &str) -> Option<Block> {
    let entry = object_entries(text, code, open, close)
        .into_iter()
        .find(|entry| entry.key == key)?;
    if code.as_bytes().get(entry.value_start) != Some(&b'{') {
        return None;
    }
    Some(Block {
        key_start: entry.key_start,
        open: entry.value_start,
        close: find_matching_brace(code, entry.value_start)?,
    })
}

/// Contents of the string literal whose opening quote is at `idx`.
pub fn string_at<'t>(text: &'t str, code: &str, idx: usize) -> Option<&'t str> {
    let quote = *code.as_bytes().get(idx)?;
    if !matches!(quote, b'\'' | b'"' | b'`') {
        return None;
    }
    let len = code.get(idx + 1..)?.find(quote as char)?;
    text.get(idx + 1..idx + 1 + len)
}

#[cfg(test)]
mod tests {
    use super::{
        Blank, ExportStyle, JsValue, export_binding, find_matching_brace, format_config, mask,
        object_entries, parse_config, parse_object,
    };

    const CONFIG: &str = r##"/** @type {import('tailwindcss').Config} */
module.exports = {
  // where classes live
  content: ["./src/**/*.{js,ts}", './index.html',],
  darkMode: 'class',
  theme: {
    extend: {
      colors: {
        brand: '#123456', /* primary */
        'brand-dark': "#0a0b0c",
        primary: { DEFAULT: '#111111', 500: '#222222' },
      },
      spacing: { '18': '4.5rem' },
    },
  },
  plugins: [],
};
"##;

    #[test]
    fn names_the_exported_binding() {
        assert_eq!(
            export_binding("const c = require('./c');\nmodule.exports = c;\n").as_deref(),
            Some("module.exports")
        );
        assert_eq!(
            export_binding("import base from './base.js';\nexport default base\n").as_deref(),
            Some("base")
        );
        assert_eq!(export_binding("export default defineConfig(base);\n"), None);
        assert_eq!(export_binding("export default function () {}\n"), None);
        assert_eq!(export_binding("const theme = {};\n"), None);
    }

    #[test]
    fn entries_skip_non_ascii_code() {
        let text = "{ ...(é || {}), ünï: 1, 'a': '1' }";
        let code = mask(text, Blank::CommentsAndStrings);
        let close = find_matching_brace(&code, 0).expect("close");
        let keys: Vec<String> = object_entries(text, &code, 0, close)
            .into_iter()
            .map(|entry| entry.key)
            .collect();
        assert_eq!(keys, vec!["a"]);
    }

    #[test]
    fn parses_exported_object() {
        let (style, object) = parse_config(CONFIG).expect("config should parse");
        assert_eq!(style, ExportStyle::CommonJs);
        assert_eq!(object["darkMode"], JsValue::Str("class".to_string()));
        let content = match &object["content"] {
            JsValue::Array(items) => items.len(),
            _ => 0,
        };
        assert_eq!(content, 2);
        let colors = object["theme"].as_object().expect("theme")["extend"]
            .as_object()
            .expect("extend")["colors"]
            .as_object()
            .expect("colors");
        assert_eq!(colors["brand-dark"].as_str(), Some("#0a0b0c"));
        assert!(colors["primary"].as_object().expect("group").contains_key("500"));
    }

    #[test]
    fn rejects_code() {
        assert!(parse_object("{ plugins: [require('x')] }").is_err());
        assert!(parse_object("{ a: `x${y}` }").is_err());
        assert!(parse_config("const x = 1;\nmodule.exports = { a: 1 }").is_err());
        assert!(parse_config("module.exports = { a: 1 }\nmodule.exports.b = 2;").is_err());
    }

    #[test]
    fn accepts_es_module_export() {
        let (style, object) = parse_config("export default {\n  prefix: 'tw-',\n}\n").expect("parse");
        assert_eq!(style, ExportStyle::EsModule);
        assert_eq!(object["prefix"].as_str(), Some("tw-"));
    }

    #[test]
    fn mask_keeps_offsets() {
        let text = "a: '}' // {\n/* { */ b: { c: \"é\" }";
        let masked = mask(text, Blank::CommentsAndStrings);
        assert_eq!(masked.len(), text.len());
        assert!(!masked.contains("//"));
        let open = masked.find('{').expect("brace");
        assert_eq!(find_matching_brace(&masked, open), Some(text.len() - 1));
    }

    #[test]
    fn formatted_output_parses_back() {
        let (style, object) = parse_config(CONFIG).expect("parse");
        let rendered = format_config(&object, style);
        assert!(rendered.contains("    extend: {\n"));
        assert!(rendered.contains("'brand-dark': '#0a0b0c'"));
        assert!(rendered.contains("DEFAULT: '#111111'"));
        let (_, reparsed) = parse_config(&rendered).expect("rendered config parses");
        assert_eq!(reparsed, object);
    }
}
