use crate::error::ScanError;
use crate::naming::{ColorNamer, dimension};
use crate::scanner::{Site, UtilityMatcher, dimension_category, is_color_utility};
use crate::session::Session;
use crate::value::{
    ParsedDimension, canonical_dimension, has_unit_token, is_color_like, normalize_literal,
    parse_color, parse_dimension,
};
use indexmap::IndexSet;
use std::fs;
use std::path::Path;

/// Rewrites `utility-[literal]` sites to `utility-name`.
pub struct Replacer {
    matcher: UtilityMatcher,
    utility_prefix: String,
    colors: bool,
    dimensions: bool,
}

impl Replacer {
    pub fn new(utility_prefix: Option<&str>, colors: bool, dimensions: bool) -> Result<Self, ScanError> {
        Ok(Self {
            matcher: UtilityMatcher::new(utility_prefix)?,
            utility_prefix: utility_prefix.unwrap_or_default().to_string(),
            colors,
            dimensions,
        })
    }

    pub fn handles_colors(&self) -> bool {
        self.colors
    }

    /// Adds the hex of every opaque color in a color utility to `hexes`.
    pub fn collect_hexes(&self, text: &str, hexes: &mut IndexSet<String>) {
        if !self.colors {
            return;
        }
        for site in self.matcher.sites(text) {
            if !is_color_utility(site.utility) {
                continue;
            }
            if let Ok(color) = parse_color(&normalize_literal(site.literal)) {
                hexes.insert(color.hex());
            }
        }
    }

    /// The rewritten text, or `None` when no site changed.
    pub fn replace_in_text(
        &self,
        text: &str,
        session: &mut Session,
        namer: &mut ColorNamer,
    ) -> Option<String> {
        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        let mut changed = false;

        for site in self.matcher.sites(text) {
            let Some(name) = self.name_site(&site, session, namer) else {
                continue;
            };
            out.push_str(&text[cursor..site.start]);
            out.push_str(&self.utility_prefix);
            out.push_str(site.utility);
            out.push('-');
            out.push_str(&name);
            cursor = site.end;
            changed = true;
            session.stats.replacements += 1;
        }

        if !changed {
            return None;
        }
        out.push_str(&text[cursor..]);
        Some(out)
    }

    fn name_site(&self, site: &Site<'_>, session: &mut Session, namer: &mut ColorNamer) -> Option<String> {
        let literal = normalize_literal(site.literal);

        if self.colors && is_color_utility(site.utility) {
            if let Ok(color) = parse_color(&literal) {
                match namer.name_for(session, &color) {
                    Ok(resolved) => return Some(resolved.name),
                    Err(err) => {
                        tracing::warn!(literal = site.literal, "{err}; leaving it as is");
                        session.stats.unresolved_colors += 1;
                        return None;
                    }
                }
            }
        }

        if !self.dimensions || is_color_like(&literal) {
            return None;
        }
        let category = dimension_category(site.utility)?;
        if !has_unit_token(&literal) {
            return None;
        }
        let canonical = canonical_dimension(&literal);
        let parsed =
            parse_dimension(&canonical).unwrap_or_else(|_| ParsedDimension::Opaque(canonical.clone()));
        Some(dimension::name_for(session, category, &canonical, &parsed))
    }

    /// Rewrites `path` in place when any site changed. Failures are logged
    /// and reported as unmodified.
    pub fn process_file(&self, path: &Path, session: &mut Session, namer: &mut ColorNamer) -> bool {
        session.stats.processed_files += 1;
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "cannot read file");
                return false;
            }
        };
        let Some(updated) = self.replace_in_text(&text, session, namer) else {
            return false;
        };
        if let Err(err) = fs::write(path, updated) {
            tracing::warn!(path = %path.display(), error = %err, "cannot write file");
            return false;
        }
        session.stats.modified_files += 1;
        tracing::info!(path = %path.display(), "modified");
        true
    }
}
