use crate::error::SettingsError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE: &str = "tokenwind.toml";

const DEFAULT_CATALOG_URL: &str = "https://api.color.pizza/v1/?list=default";
const DEFAULT_NEAREST_URL: &str = "https://api.color.pizza/v1/";

/// How discovered tokens are written back to the Tailwind config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MergeStyle {
    /// Rewrite the whole object when dimensions are handled and the config
    /// parsed cleanly, otherwise splice text.
    #[default]
    Auto,
    /// Always splice new entries into the existing text.
    Splice,
    /// Always re-serialize the parsed object.
    Rewrite,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub extensions: Vec<String>,
    pub exclude_dirs: Vec<String>,
    pub respect_gitignore: bool,
    pub tailwind_config: String,
    pub catalog_url: String,
    pub nearest_url: String,
    /// Prepended to generated color names (`acme-crimson`).
    pub name_prefix: Option<String>,
    /// Tailwind `prefix` option that precedes every utility (`tw-`).
    pub utility_prefix: Option<String>,
    /// Resolve colors in the same pass as dimensions.
    pub inline_colors: bool,
    pub dimensions: bool,
    pub offline: bool,
    pub merge_style: MergeStyle,
    pub unit_prefixes: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            extensions: [
                "js", "jsx", "ts", "tsx", "html", "vue", "css", "scss", "less",
            ]
            .iter()
            .map(|ext| ext.to_string())
            .collect(),
            exclude_dirs: ["node_modules", ".git", "dist", "build", ".next", ".nuxt"]
                .iter()
                .map(|dir| dir.to_string())
                .collect(),
            respect_gitignore: false,
            tailwind_config: "tailwind.config.js".to_string(),
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            nearest_url: DEFAULT_NEAREST_URL.to_string(),
            name_prefix: None,
            utility_prefix: None,
            inline_colors: true,
            dimensions: true,
            offline: false,
            merge_style: MergeStyle::Auto,
            unit_prefixes: default_unit_prefixes(),
        }
    }
}

impl Settings {
    pub fn unit_prefix<'a>(&'a self, unit: &'a str) -> &'a str {
        self.unit_prefixes
            .get(unit)
            .map(String::as_str)
            .unwrap_or(unit)
    }

    pub fn tailwind_config_path(&self, root: &Path) -> PathBuf {
        root.join(&self.tailwind_config)
    }
}

fn default_unit_prefixes() -> BTreeMap<String, String> {
    [
        ("px", ""),
        ("rem", "r"),
        ("em", "e"),
        ("%", "pc"),
        ("vh", "vh"),
        ("vw", "vw"),
        ("vmin", "vmin"),
        ("vmax", "vmax"),
        ("calc", "calc"),
    ]
    .into_iter()
    .map(|(unit, prefix)| (unit.to_string(), prefix.to_string()))
    .collect()
}

pub fn load(path: &Path) -> Result<Settings, SettingsError> {
    let text = fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads `explicit` when given, otherwise `tokenwind.toml` under `root` if
/// present, otherwise defaults.
pub fn resolve(root: &Path, explicit: Option<&Path>) -> Result<Settings, SettingsError> {
    if let Some(path) = explicit {
        return load(path);
    }
    let candidate = root.join(SETTINGS_FILE);
    if candidate.is_file() {
        return load(&candidate);
    }
    Ok(Settings::default())
}
