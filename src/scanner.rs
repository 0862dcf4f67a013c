use crate::config::Settings;
use crate::error::ScanError;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const COLOR_UTILITIES: [&str; 17] = [
    "bg",
    "text",
    "border",
    "ring",
    "ring-offset",
    "shadow",
    "fill",
    "stroke",
    "accent",
    "decoration",
    "divide",
    "outline",
    "caret",
    "placeholder",
    "from",
    "via",
    "to",
];

/// Theme category → utilities whose arbitrary values belong to it.
pub const DIMENSION_CATEGORIES: [(&str, &[&str]); 11] = [
    ("width", &["w", "min-w", "max-w"]),
    ("height", &["h", "min-h", "max-h"]),
    (
        "spacing",
        &[
            "m", "mt", "mr", "mb", "ml", "mx", "my", "p", "pt", "pr", "pb", "pl", "px", "py",
            "gap",
        ],
    ),
    ("fontSize", &["text"]),
    ("lineHeight", &["leading"]),
    ("letterSpacing", &["tracking"]),
    (
        "borderWidth",
        &["border", "border-t", "border-r", "border-b", "border-l"],
    ),
    (
        "borderRadius",
        &[
            "rounded",
            "rounded-t",
            "rounded-r",
            "rounded-b",
            "rounded-l",
            "rounded-tl",
            "rounded-tr",
            "rounded-bl",
            "rounded-br",
        ],
    ),
    ("scale", &["scale", "scale-x", "scale-y"]),
    ("translate", &["translate-x", "translate-y"]),
    ("rotate", &["rotate"]),
];

pub fn is_color_utility(utility: &str) -> bool {
    COLOR_UTILITIES.contains(&utility)
}

pub fn dimension_category(utility: &str) -> Option<&'static str> {
    DIMENSION_CATEGORIES
        .iter()
        .find(|(_, utilities)| utilities.contains(&utility))
        .map(|(category, _)| *category)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    pub root: PathBuf,
    pub extensions: Vec<String>,
    pub exclude_dirs: Vec<String>,
    pub respect_gitignore: bool,
}

impl ScanOptions {
    pub fn from_settings(root: &Path, settings: &Settings) -> Self {
        Self {
            root: root.to_path_buf(),
            extensions: settings.extensions.clone(),
            exclude_dirs: settings.exclude_dirs.clone(),
            respect_gitignore: settings.respect_gitignore,
        }
    }
}

/// Candidate source files under the root, ordered by path.
pub fn find_files(options: &ScanOptions) -> Result<Vec<PathBuf>, ScanError> {
    if !options.root.is_dir() {
        return Err(ScanError::RootNotFound(options.root.clone()));
    }

    let globset = build_globset(&options.extensions)?;
    let excluded: HashSet<String> = options.exclude_dirs.iter().cloned().collect();

    let mut builder = WalkBuilder::new(&options.root);
    builder
        .hidden(false)
        .git_ignore(options.respect_gitignore)
        .git_global(options.respect_gitignore)
        .git_exclude(options.respect_gitignore)
        .require_git(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
            !(is_dir
                && entry.depth() > 0
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| excluded.contains(name)))
        });

    let mut paths = Vec::new();
    for entry in builder.build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable path");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        if globset.is_match(Path::new(entry.file_name())) {
            paths.push(entry.into_path());
        }
    }
    Ok(paths)
}

fn build_globset(extensions: &[String]) -> Result<GlobSet, ScanError> {
    let mut builder = GlobSetBuilder::new();
    for ext in extensions {
        let pattern = format!("*.{}", ext.trim_start_matches('.'));
        let glob = Glob::new(&pattern).map_err(|err| ScanError::InvalidPattern {
            pattern: pattern.clone(),
            message: err.to_string(),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|err| ScanError::InvalidPattern {
        pattern: extensions.join(","),
        message: err.to_string(),
    })
}

/// One `utility-[literal]` occurrence; offsets span the whole class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site<'t> {
    pub start: usize,
    pub end: usize,
    pub utility: &'t str,
    pub literal: &'t str,
}

#[derive(Debug, Clone)]
pub struct UtilityMatcher {
    regex: Regex,
}

impl UtilityMatcher {
    pub fn new(utility_prefix: Option<&str>) -> Result<Self, ScanError> {
        let mut utilities: Vec<&str> = COLOR_UTILITIES
            .iter()
            .copied()
            .chain(
                DIMENSION_CATEGORIES
                    .iter()
                    .flat_map(|(_, utilities)| utilities.iter().copied()),
            )
            .collect();
        utilities.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        utilities.dedup();

        let alternation = utilities
            .iter()
            .map(|utility| regex::escape(utility))
            .collect::<Vec<_>>()
            .join("|");
        let prefix = regex::escape(utility_prefix.unwrap_or(""));
        let pattern = format!(r"{prefix}({alternation})-\[([^\]\s]+)\]");
        let regex = Regex::new(&pattern).map_err(|err| ScanError::InvalidPattern {
            pattern,
            message: err.to_string(),
        })?;
        Ok(Self { regex })
    }

    pub fn sites<'t>(&self, text: &'t str) -> Vec<Site<'t>> {
        self.regex
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                if !is_site_boundary(text, whole.start(), whole.end()) {
                    return None;
                }
                Some(Site {
                    start: whole.start(),
                    end: whole.end(),
                    utility: caps.get(1)?.as_str(),
                    literal: caps.get(2)?.as_str(),
                })
            })
            .collect()
    }
}

/// A single leading `-` marks a negative utility such as `-mt-[4px]`.
fn is_site_boundary(text: &str, start: usize, end: usize) -> bool {
    let before = &text[..start];
    let prev = before
        .strip_suffix('-')
        .map_or_else(|| before.chars().last(), |rest| rest.chars().last());
    let next = text[end..].chars().next();
    prev.is_none_or(is_boundary_char) && next.is_none_or(is_boundary_char)
}

fn is_boundary_char(c: char) -> bool {
    !(c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::{ScanOptions, UtilityMatcher, dimension_category, find_files, is_color_utility};
    use crate::config::Settings;
    use std::fs;

    #[test]
    fn finds_sites_with_variants_and_longest_utility() {
        let matcher = UtilityMatcher::new(None).expect("matcher");
        let text = r#"<div class="hover:bg-[#ff0000] min-w-[10px] border-t-[2px] xw-[3px]">"#;
        let sites = matcher.sites(text);
        let found: Vec<(&str, &str)> = sites.iter().map(|s| (s.utility, s.literal)).collect();
        assert_eq!(
            found,
            vec![("bg", "#ff0000"), ("min-w", "10px"), ("border-t", "2px")]
        );
        assert_eq!(&text[sites[0].start..sites[0].end], "bg-[#ff0000]");
    }

    #[test]
    fn accepts_negative_utilities() {
        let matcher = UtilityMatcher::new(None).expect("matcher");
        let text = "-mt-[4px] hover:-translate-x-[10px] a-mt-[1px] --mt-[2px]";
        let sites = matcher.sites(text);
        let found: Vec<(&str, &str)> = sites.iter().map(|s| (s.utility, s.literal)).collect();
        assert_eq!(found, vec![("mt", "4px"), ("translate-x", "10px")]);
        assert_eq!(&text[sites[0].start - 1..sites[0].end], "-mt-[4px]");
    }

    #[test]
    fn honours_utility_prefix() {
        let matcher = UtilityMatcher::new(Some("tw-")).expect("matcher");
        let sites = matcher.sites("tw-p-[4px] p-[8px]");
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].utility, "p");
        assert_eq!(sites[0].literal, "4px");
    }

    #[test]
    fn classifies_utilities() {
        assert!(is_color_utility("ring-offset"));
        assert!(!is_color_utility("w"));
        assert_eq!(dimension_category("text"), Some("fontSize"));
        assert_eq!(dimension_category("gap"), Some("spacing"));
        assert_eq!(dimension_category("bg"), None);
    }

    #[test]
    fn walks_source_files_and_prunes_excluded_dirs() {
        let dir = tempfile::tempdir().expect("temp dir");
        let root = dir.path();
        fs::create_dir_all(root.join("src/nested")).expect("mkdir");
        fs::create_dir_all(root.join("node_modules/lib")).expect("mkdir");
        fs::write(root.join("src/b.tsx"), "").expect("write");
        fs::write(root.join("src/a.html"), "").expect("write");
        fs::write(root.join("src/nested/c.vue"), "").expect("write");
        fs::write(root.join("src/logo.png"), "").expect("write");
        fs::write(root.join("node_modules/lib/index.js"), "").expect("write");

        let options = ScanOptions::from_settings(root, &Settings::default());
        let files = find_files(&options).expect("scan");
        let relative: Vec<String> = files
            .iter()
            .map(|path| {
                path.strip_prefix(root)
                    .expect("under root")
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        assert_eq!(relative, vec!["src/a.html", "src/b.tsx", "src/nested/c.vue"]);
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let options = ScanOptions::from_settings(&dir.path().join("absent"), &Settings::default());
        assert!(find_files(&options).is_err());
    }
}
