//! Textual merge: new entries are spliced into the original config text so
//! everything the parser cannot model survives untouched.

use super::object::{
    Blank, Block, export_binding, find_block, find_matching_brace,
    is_identifier_key, locate_export, mask, quote,
};
use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub value: String,
}

impl Member {
    fn render(&self, indent: &str) -> String {
        format!("{indent}{}: {},", quote(&self.name), quote(&self.value))
    }
}

/// Where the interesting objects sit in the current text.
pub struct Layout {
    code: String,
    root: Option<(usize, usize)>,
    theme: Option<Block>,
    extend: Option<Block>,
    extend_category: Option<Block>,
    theme_category: Option<Block>,
    export: Option<String>,
}

impl Layout {
    pub fn of(text: &str, category: &str) -> Self {
        let code = mask(text, Blank::CommentsAndStrings);
        let root = locate_export(&code)
            .and_then(|(_, _, open)| Some((open, find_matching_brace(&code, open)?)));
        let theme = root.and_then(|(open, close)| find_block(text, &code, open, close, "theme"));
        let extend = theme.and_then(|t| find_block(text, &code, t.open, t.close, "extend"));
        let extend_category =
            extend.and_then(|e| find_block(text, &code, e.open, e.close, category));
        let theme_category = theme.and_then(|t| find_block(text, &code, t.open, t.close, category));
        let export = export_binding(&code);
        Self {
            code,
            root,
            theme,
            extend,
            extend_category,
            theme_category,
            export,
        }
    }
}

pub trait SplicePolicy {
    fn name(&self) -> &'static str;

    /// The merged text, or `None` when the text does not have this shape.
    fn apply(
        &self,
        text: &str,
        layout: &Layout,
        category: &str,
        members: &[Member],
    ) -> Option<String>;
}

/// `theme.extend.C` exists: append to it.
struct ExtendCategory;

impl SplicePolicy for ExtendCategory {
    fn name(&self) -> &'static str {
        "theme.extend.category"
    }

    fn apply(&self, text: &str, layout: &Layout, _: &str, members: &[Member]) -> Option<String> {
        let block = layout.extend_category?;
        Some(append_members(text, &layout.code, block, members).0)
    }
}

/// `theme.C` without `extend`: append, then move it under `extend`.
struct ThemeCategory;

impl SplicePolicy for ThemeCategory {
    fn name(&self) -> &'static str {
        "theme.category"
    }

    fn apply(&self, text: &str, layout: &Layout, _: &str, members: &[Member]) -> Option<String> {
        if layout.extend.is_some() {
            return None;
        }
        let block = layout.theme_category?;
        let (mut merged, inserted) = append_members(text, &layout.code, block, members);
        let close = block.close + inserted;
        let indent = line_indent(text, block.key_start);
        merged.insert_str(close + 1, &format!("\n{indent}}}"));
        merged.insert_str(block.key_start, &format!("extend: {{\n{indent}"));
        Some(merged)
    }
}

/// `theme` without `extend`: add `extend: { C }`.
struct ThemeWithoutExtend;

impl SplicePolicy for ThemeWithoutExtend {
    fn name(&self) -> &'static str {
        "theme"
    }

    fn apply(
        &self,
        text: &str,
        layout: &Layout,
        category: &str,
        members: &[Member],
    ) -> Option<String> {
        if layout.extend.is_some() {
            return None;
        }
        let theme = layout.theme?;
        Some(insert_nested(
            text,
            theme.open,
            &child_indent(text, theme.key_start),
            &["extend", category],
            members,
        ))
    }
}

/// `extend` without `C`: add `C`.
struct ExtendWithoutCategory;

impl SplicePolicy for ExtendWithoutCategory {
    fn name(&self) -> &'static str {
        "theme.extend"
    }

    fn apply(
        &self,
        text: &str,
        layout: &Layout,
        category: &str,
        members: &[Member],
    ) -> Option<String> {
        let extend = layout.extend?;
        Some(insert_nested(
            text,
            extend.open,
            &child_indent(text, extend.key_start),
            &[category],
            members,
        ))
    }
}

/// No `theme`: add `theme.extend.C` to the exported object.
struct ExportedObject;

impl SplicePolicy for ExportedObject {
    fn name(&self) -> &'static str {
        "exported object"
    }

    fn apply(
        &self,
        text: &str,
        layout: &Layout,
        category: &str,
        members: &[Member],
    ) -> Option<String> {
        if layout.theme.is_some() {
            return None;
        }
        let (open, _) = layout.root?;
        Some(insert_nested(
            text,
            open,
            &child_indent(text, open),
            &["theme", "extend", category],
            members,
        ))
    }
}

/// No object literal to edit: merge at runtime from a trailing statement
/// on whatever the file exports.
struct RuntimeTail;

impl SplicePolicy for RuntimeTail {
    fn name(&self) -> &'static str {
        "runtime tail"
    }

    fn apply(
        &self,
        text: &str,
        layout: &Layout,
        category: &str,
        members: &[Member],
    ) -> Option<String> {
        let base = layout.export.as_deref()?;
        let slot = tail_slot(base, category);
        let mut merged = text.trim_end().to_string();
        merged.push_str(&format!("\n\n{TAIL_MARKER}\n"));
        merged.push_str(&format!("{base}.theme = {base}.theme || {{}};\n"));
        merged.push_str(&format!("{base}.theme.extend = {base}.theme.extend || {{}};\n"));
        merged.push_str(&format!("{slot} = {{\n  ...({slot} || {{}}),\n"));
        for member in members {
            merged.push_str(&member.render("  "));
            merged.push('\n');
        }
        merged.push_str("};\n");
        Some(merged)
    }
}

const TAIL_MARKER: &str = "// tokens added by tokenwind";

/// `base.theme.extend.category`, bracketed when the category is not an
/// identifier.
fn tail_slot(base: &str, category: &str) -> String {
    if is_identifier_key(category) {
        format!("{base}.theme.extend.{category}")
    } else {
        format!("{base}.theme.extend[{}]", quote(category))
    }
}

fn chain() -> [&'static dyn SplicePolicy; 6] {
    [
        &ExtendCategory,
        &ThemeCategory,
        &ThemeWithoutExtend,
        &ExtendWithoutCategory,
        &ExportedObject,
        &RuntimeTail,
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpliceStep {
    pub category: String,
    pub policy: &'static str,
}

/// The merged text and the policy used per category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spliced {
    pub text: String,
    pub steps: Vec<SpliceStep>,
    /// Categories no policy could place.
    pub skipped: Vec<String>,
}

/// Splices every category into `text`, one policy per category.
pub fn splice(text: &str, additions: &IndexMap<String, IndexMap<String, String>>) -> Spliced {
    let mut merged = text.to_string();
    let mut steps = Vec::new();
    let mut skipped = Vec::new();
    for (category, entries) in additions {
        if entries.is_empty() {
            continue;
        }
        let members: Vec<Member> = entries
            .iter()
            .map(|(name, value)| Member {
                name: name.clone(),
                value: value.clone(),
            })
            .collect();
        let layout = Layout::of(&merged, category);
        let applied = chain().into_iter().find_map(|policy| {
            policy
                .apply(&merged, &layout, category, &members)
                .map(|next| (policy.name(), next))
        });
        match applied {
            Some((policy, next)) => {
                tracing::debug!(category = %category, policy, "spliced config");
                steps.push(SpliceStep {
                    category: category.clone(),
                    policy,
                });
                merged = next;
            }
            None => {
                tracing::warn!(category = %category, "config export cannot be extended; tokens not merged");
                skipped.push(category.clone());
            }
        }
    }
    Spliced {
        text: merged,
        steps,
        skipped,
    }
}

/// Appends `members` inside `block`; returns the text and bytes inserted.
fn append_members(text: &str, code: &str, block: Block, members: &[Member]) -> (String, usize) {
    let indent = child_indent(text, block.key_start);
    let (insert_at, last) = match last_code_char(code, block.open, block.close) {
        Some((idx, ch)) => (idx + ch.len_utf8(), Some(ch)),
        None => (block.open + 1, None),
    };
    let mut insertion = String::new();
    if !matches!(last, None | Some(',')) {
        insertion.push(',');
    }
    for member in members {
        insertion.push('\n');
        insertion.push_str(&member.render(&indent));
    }
    if last.is_none() {
        insertion.push('\n');
        insertion.push_str(&line_indent(text, block.key_start));
    }
    let mut merged = text.to_string();
    merged.insert_str(insert_at, &insertion);
    (merged, insertion.len())
}

/// Inserts `path: { ... members }` right after the brace at `open`.
fn insert_nested(text: &str, open: usize, indent: &str, path: &[&str], members: &[Member]) -> String {
    let mut merged = text.to_string();
    merged.insert_str(open + 1, &format!("\n{}", render_nested(path, members, indent)));
    merged
}

fn render_nested(path: &[&str], members: &[Member], indent: &str) -> String {
    match path.split_first() {
        None => members
            .iter()
            .map(|member| member.render(indent))
            .collect::<Vec<_>>()
            .join("\n"),
        Some((key, rest)) => format!(
            "{indent}{}: {{\n{}\n{indent}}},",
            super::object::format_key(key),
            render_nested(rest, members, &format!("{indent}  "))
        ),
    }
}

fn last_code_char(code: &str, open: usize, close: usize) -> Option<(usize, char)> {
    code[open + 1..close]
        .char_indices()
        .rev()
        .find(|(_, ch)| !ch.is_whitespace())
        .map(|(idx, ch)| (open + 1 + idx, ch))
}

fn line_indent(text: &str, idx: usize) -> String {
    let start = text[..idx].rfind('\n').map_or(0, |pos| pos + 1);
    text[start..]
        .chars()
        .take_while(|ch| *ch == ' ' || *ch == '\t')
        .collect()
}

fn child_indent(text: &str, idx: usize) -> String {
    format!("{}  ", line_indent(text, idx))
}

#[cfg(test)]
mod tests {
    use super::{Spliced, splice};
    use crate::session::{Additions, COLORS};
    use crate::tailwind_config::extract::from_object;
    use crate::tailwind_config::object::parse_config;

    fn additions(category: &str, entries: &[(&str, &str)]) -> Additions {
        let mut additions = Additions::new();
        let values = additions.entry(category.to_string()).or_default();
        for (name, value) in entries {
            values.insert(name.to_string(), value.to_string());
        }
        additions
    }

    fn assert_color(text: &str, hex: &str, name: &str) {
        let (_, object) = parse_config(text).expect("merged config should parse");
        assert_eq!(from_object(&object).tokens.name_of(COLORS, hex), Some(name));
    }

    #[test]
    fn appends_to_extend_category() {
        let text = "module.exports = {\n  theme: {\n    extend: {\n      colors: {\n        brand: '#123456' // main\n      },\n    },\n  },\n};\n";
        let Spliced { text: merged, steps, .. } = splice(text, &additions(COLORS, &[("red", "#ff0000")]));
        assert_eq!(steps[0].policy, "theme.extend.category");
        assert!(merged.contains("        'red': '#ff0000',"));
        assert_color(&merged, "ff0000", "red");
        assert_color(&merged, "123456", "brand");
    }

    #[test]
    fn moves_theme_category_under_extend() {
        let text = "module.exports = {\n  theme: {\n    colors: {\n      brand: '#123456',\n    },\n  },\n}\n";
        let Spliced { text: merged, steps, .. } = splice(text, &additions(COLORS, &[("red", "#ff0000")]));
        assert_eq!(steps[0].policy, "theme.category");
        let (_, object) = parse_config(&merged).expect("merged config should parse");
        let extend = object["theme"].as_object().expect("theme")["extend"]
            .as_object()
            .expect("extend");
        assert!(extend.contains_key("colors"));
        assert_color(&merged, "ff0000", "red");
    }

    #[test]
    fn adds_extend_to_theme() {
        let text = "module.exports = {\n  theme: {\n    screens: { sm: '480px' },\n  },\n}\n";
        let Spliced { text: merged, steps, .. } = splice(text, &additions("width", &[("card", "327px")]));
        assert_eq!(steps[0].policy, "theme");
        let (_, object) = parse_config(&merged).expect("merged config should parse");
        assert_eq!(from_object(&object).tokens.name_of("width", "327px"), Some("card"));
    }

    #[test]
    fn adds_category_to_extend() {
        let text = "module.exports = {\n  theme: {\n    extend: {},\n  },\n}\n";
        let Spliced { text: merged, steps, .. } = splice(text, &additions(COLORS, &[("red", "#ff0000")]));
        assert_eq!(steps[0].policy, "theme.extend");
        assert_color(&merged, "ff0000", "red");
    }

    #[test]
    fn adds_theme_to_exported_object() {
        let text = "export default {\n  content: ['./src/**/*.ts'],\n}\n";
        let Spliced { text: merged, steps, .. } = splice(text, &additions(COLORS, &[("red", "#ff0000")]));
        assert_eq!(steps[0].policy, "exported object");
        assert_color(&merged, "ff0000", "red");
    }

    #[test]
    fn falls_back_to_runtime_tail() {
        let text = "const config = require('./base');\nmodule.exports = config;\n";
        let Spliced { text: merged, steps, .. } = splice(text, &additions("spacing", &[("r-1-5", "1.5rem")]));
        assert_eq!(steps[0].policy, "runtime tail");
        assert!(merged.starts_with("const config = require('./base');"));
        assert!(merged.contains("module.exports.theme.extend.spacing = {"));
        assert!(merged.contains("  'r-1-5': '1.5rem',"));
    }

    #[test]
    fn runtime_tail_extends_the_default_export_binding() {
        let text = "import base from './base.js';\nexport default base;\n";
        let Spliced { text: merged, steps, skipped } =
            splice(text, &additions("width", &[("327", "327px")]));
        assert_eq!(steps[0].policy, "runtime tail");
        assert!(skipped.is_empty());
        assert!(!merged.contains("module.exports"));
        assert!(merged.contains("base.theme.extend = base.theme.extend || {};"));
        assert!(merged.contains("base.theme.extend.width = {\n  ...(base.theme.extend.width || {}),"));
    }

    #[test]
    fn skips_exports_it_cannot_name() {
        let text = "import { defineConfig } from 'tailwindcss';\nexport default defineConfig(base);\n";
        let spliced = splice(text, &additions(COLORS, &[("red", "#ff0000")]));
        assert!(spliced.steps.is_empty());
        assert_eq!(spliced.skipped, vec![COLORS.to_string()]);
        assert_eq!(spliced.text, text);
    }

    #[test]
    fn each_category_takes_its_own_path() {
        let text = "module.exports = {\n  theme: {\n    extend: {\n      colors: { brand: '#123456' },\n    },\n  },\n}\n";
        let mut additions = additions(COLORS, &[("red", "#ff0000")]);
        additions
            .entry("width".to_string())
            .or_default()
            .insert("1/2".to_string(), "50%".to_string());
        let Spliced { text: merged, steps, .. } = splice(text, &additions);
        let policies: Vec<&str> = steps.iter().map(|step| step.policy).collect();
        assert_eq!(policies, vec!["theme.extend.category", "theme.extend"]);
        let (_, object) = parse_config(&merged).expect("merged config should parse");
        let extracted = from_object(&object);
        assert_eq!(extracted.tokens.name_of("width", "50%"), Some("1/2"));
        assert_eq!(extracted.tokens.name_of(COLORS, "ff0000"), Some("red"));
    }
}
