//! Reading design tokens out of `tailwind.config.js` and writing new ones
//! back in.

pub mod extract;
pub mod object;
pub mod splice;

use crate::session::{Additions, COLORS, TokenTable};
use crate::value::canonical_dimension;
use object::{ExportStyle, JsObject, JsValue, format_config, parse_config};
use splice::SpliceStep;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_CONTENT: [&str; 2] = ["./src/**/*.{js,jsx,ts,tsx}", "./public/index.html"];

#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub path: PathBuf,
    /// `None` when the file is missing or unreadable.
    pub text: Option<String>,
    /// Set only when the whole file parsed as a plain exported object.
    pub object: Option<JsObject>,
    pub export: ExportStyle,
    pub tokens: TokenTable,
    pub names: BTreeMap<String, BTreeSet<String>>,
    pub prefix: Option<String>,
}

impl LoadedConfig {
    pub fn exists(&self) -> bool {
        self.text.is_some()
    }

    pub fn is_structured(&self) -> bool {
        self.object.is_some()
    }
}

/// Never fails: a missing or unreadable config loads as empty.
pub fn load(path: &Path) -> LoadedConfig {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            if path.exists() {
                tracing::warn!(path = %path.display(), error = %err, "cannot read tailwind config");
            } else {
                tracing::debug!(path = %path.display(), "no tailwind config");
            }
            return LoadedConfig {
                path: path.to_path_buf(),
                ..LoadedConfig::default()
            };
        }
    };

    let (export, object, extracted) = match parse_config(&text) {
        Ok((export, object)) => {
            let extracted = extract::from_object(&object);
            (export, Some(object), extracted)
        }
        Err(err) => {
            tracing::debug!(error = %err, "config is not a plain object; extracting by pattern");
            (ExportStyle::default(), None, extract::from_text(&text))
        }
    };

    tracing::debug!(
        tokens = extracted.tokens.len(),
        structured = object.is_some(),
        "loaded tailwind config"
    );
    LoadedConfig {
        path: path.to_path_buf(),
        text: Some(text),
        object,
        export,
        tokens: extracted.tokens,
        names: extracted.names,
        prefix: extracted.prefix,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Re-serialize the parsed object.
    Rewrite,
    /// Splice into the original text.
    Splice,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeStrategy {
    Created,
    Rewritten,
    Spliced(Vec<SpliceStep>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub text: String,
    pub strategy: MergeStrategy,
    pub added: usize,
    /// Categories left out because the config had nowhere to put them.
    pub skipped: Vec<String>,
}

/// The new config text, or `None` when nothing is missing from it.
pub fn merge(loaded: &LoadedConfig, additions: &Additions, mode: MergeMode) -> Option<MergeOutcome> {
    let fresh = unknown_entries(loaded, additions);
    let added: usize = fresh.values().map(|entries| entries.len()).sum();
    if added == 0 {
        return None;
    }

    let Some(text) = &loaded.text else {
        let object = with_additions(minimal_config(), &fresh)?;
        return Some(MergeOutcome {
            text: format_config(&object, ExportStyle::CommonJs),
            strategy: MergeStrategy::Created,
            added,
            skipped: Vec::new(),
        });
    };

    if mode == MergeMode::Rewrite {
        if let Some(object) = loaded
            .object
            .clone()
            .and_then(|object| with_additions(object, &fresh))
        {
            return Some(MergeOutcome {
                text: format_config(&object, loaded.export),
                strategy: MergeStrategy::Rewritten,
                added,
                skipped: Vec::new(),
            });
        }
        tracing::debug!("config cannot be rewritten; splicing instead");
    }

    let spliced = splice::splice(text, &fresh);
    let added: usize = spliced
        .steps
        .iter()
        .filter_map(|step| fresh.get(&step.category))
        .map(|entries| entries.len())
        .sum();
    Some(MergeOutcome {
        text: spliced.text,
        strategy: MergeStrategy::Spliced(spliced.steps),
        added,
        skipped: spliced.skipped,
    })
}

fn unknown_entries(loaded: &LoadedConfig, additions: &Additions) -> Additions {
    let mut fresh = Additions::new();
    for (category, entries) in additions {
        for (name, value) in entries {
            let canonical = if category == COLORS {
                value.trim_start_matches('#').to_ascii_lowercase()
            } else {
                canonical_dimension(value)
            };
            if loaded.tokens.contains(category, &canonical) {
                continue;
            }
            fresh
                .entry(category.clone())
                .or_default()
                .insert(name.clone(), value.clone());
        }
    }
    fresh
}

fn minimal_config() -> JsObject {
    let mut extend = JsObject::new();
    extend.insert("extend".to_string(), JsValue::Object(JsObject::new()));
    let mut object = JsObject::new();
    object.insert(
        "content".to_string(),
        JsValue::Array(
            DEFAULT_CONTENT
                .iter()
                .map(|glob| JsValue::Str(glob.to_string()))
                .collect(),
        ),
    );
    object.insert("theme".to_string(), JsValue::Object(extend));
    object.insert("plugins".to_string(), JsValue::Array(Vec::new()));
    object
}

/// Adds entries under `theme.extend`; `None` if the object has a
/// non-object in the way.
fn with_additions(mut object: JsObject, additions: &Additions) -> Option<JsObject> {
    let theme = object
        .entry("theme".to_string())
        .or_insert_with(|| JsValue::Object(JsObject::new()))
        .as_object_mut()?;
    let extend = theme
        .entry("extend".to_string())
        .or_insert_with(|| JsValue::Object(JsObject::new()))
        .as_object_mut()?;
    for (category, entries) in additions {
        let target = extend
            .entry(category.clone())
            .or_insert_with(|| JsValue::Object(JsObject::new()))
            .as_object_mut()?;
        for (name, value) in entries {
            target
                .entry(name.clone())
                .or_insert_with(|| JsValue::Str(value.clone()));
        }
    }
    Some(object)
}

#[cfg(test)]
mod tests {
    use super::{MergeMode, MergeStrategy, load, merge};
    use crate::session::{Additions, COLORS};
    use std::fs;

    fn additions(entries: &[(&str, &str, &str)]) -> Additions {
        let mut additions = Additions::new();
        for (category, name, value) in entries {
            additions
                .entry(category.to_string())
                .or_default()
                .insert(name.to_string(), value.to_string());
        }
        additions
    }

    #[test]
    fn missing_config_loads_empty_and_is_created() {
        let dir = tempfile::tempdir().expect("temp dir");
        let loaded = load(&dir.path().join("tailwind.config.js"));
        assert!(!loaded.exists());
        assert!(loaded.tokens.is_empty());

        let outcome = merge(
            &loaded,
            &additions(&[(COLORS, "red", "#ff0000")]),
            MergeMode::Splice,
        )
        .expect("an outcome");
        assert_eq!(outcome.strategy, MergeStrategy::Created);
        assert!(outcome.text.contains("'./public/index.html'"));
        assert!(outcome.text.contains("red: '#ff0000'"));
        assert!(outcome.text.contains("plugins: []"));
    }

    #[test]
    fn unreadable_config_loads_empty() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("tailwind.config.js");
        fs::create_dir_all(&path).expect("mkdir");

        let loaded = load(&path);
        assert_eq!(loaded.path, path);
        assert!(!loaded.exists());
        assert!(!loaded.is_structured());
        assert!(loaded.tokens.is_empty());
        assert!(loaded.names.is_empty());
    }

    #[test]
    fn rewrite_keeps_unrelated_keys() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("tailwind.config.js");
        fs::write(
            &path,
            "module.exports = {\n  darkMode: 'class',\n  theme: { extend: { width: { card: '327px' } } },\n}\n",
        )
        .expect("write config");
        let loaded = load(&path);
        assert!(loaded.is_structured());

        let outcome = merge(
            &loaded,
            &additions(&[
                ("width", "card-1", "327px"),
                ("width", "1/2", "50%"),
                ("spacing", "r-1-5", "1.5rem"),
            ]),
            MergeMode::Rewrite,
        )
        .expect("an outcome");
        assert_eq!(outcome.strategy, MergeStrategy::Rewritten);
        assert_eq!(outcome.added, 2);
        assert!(outcome.text.contains("darkMode: 'class'"));
        assert!(outcome.text.contains("'1/2': '50%'"));
        assert!(!outcome.text.contains("card-1"));

        fs::write(&path, &outcome.text).expect("write merged");
        let reloaded = load(&path);
        assert_eq!(reloaded.tokens.name_of("spacing", "1.5rem"), Some("r-1-5"));
        assert_eq!(reloaded.tokens.name_of("width", "327px"), Some("card"));
    }

    #[test]
    fn rewrite_falls_back_to_splice_for_code() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("tailwind.config.js");
        let text = "const forms = require('@tailwindcss/forms');\nmodule.exports = {\n  theme: { extend: {} },\n  plugins: [forms],\n};\n";
        fs::write(&path, text).expect("write config");
        let loaded = load(&path);
        assert!(!loaded.is_structured());

        let outcome = merge(
            &loaded,
            &additions(&[(COLORS, "red", "#ff0000")]),
            MergeMode::Rewrite,
        )
        .expect("an outcome");
        assert!(matches!(outcome.strategy, MergeStrategy::Spliced(_)));
        assert!(outcome.text.starts_with("const forms = require('@tailwindcss/forms');"));
        assert!(outcome.text.contains("plugins: [forms]"));

        fs::write(&path, &outcome.text).expect("write merged");
        assert_eq!(load(&path).tokens.name_of(COLORS, "ff0000"), Some("red"));
    }

    #[test]
    fn nothing_new_means_no_outcome() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("tailwind.config.js");
        fs::write(
            &path,
            "module.exports = { theme: { extend: { colors: { brand: '#123456' } } } }\n",
        )
        .expect("write config");
        let loaded = load(&path);
        assert!(merge(
            &loaded,
            &additions(&[(COLORS, "brand-1", "#123456")]),
            MergeMode::Splice
        )
        .is_none());
    }
}
