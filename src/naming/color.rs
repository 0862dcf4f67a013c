//! Color names, in priority order: the Tailwind config, the exact catalog,
//! the service's nearest match, then the offline table.

use super::{ColorNameRecord, OfflineResolver};
use crate::color_api::CatalogEntry;
use crate::error::NoNameFound;
use crate::session::{COLORS, Session};
use crate::value::ParsedColor;
use std::collections::HashMap;

/// Tailwind utility prefixes and keywords that must never be color names.
pub const RESERVED_NAMES: [&str; 19] = [
    "border",
    "text",
    "bg",
    "ring",
    "shadow",
    "from",
    "via",
    "to",
    "accent",
    "decoration",
    "divide",
    "outline",
    "fill",
    "stroke",
    "caret",
    "placeholder",
    "current",
    "transparent",
    "inherit",
];

pub fn is_reserved_name(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSource {
    Config,
    CatalogExact,
    CatalogNearest,
    Offline,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColor {
    pub name: String,
    pub source: ColorSource,
}

#[derive(Debug, Clone)]
struct CachedName {
    record: ColorNameRecord,
    source: ColorSource,
}

pub struct ColorNamer {
    cache: HashMap<String, CachedName>,
    assigned: HashMap<String, ResolvedColor>,
    offline: Box<dyn OfflineResolver>,
}

impl ColorNamer {
    pub fn new(offline: Box<dyn OfflineResolver>) -> Self {
        Self {
            cache: HashMap::new(),
            assigned: HashMap::new(),
            offline,
        }
    }

    /// Seeds the cache with exact names; returns how many were added.
    pub fn load_catalog(&mut self, entries: Vec<CatalogEntry>, prefix: Option<&str>) -> usize {
        let mut added = 0;
        for entry in entries {
            let cached = CachedName {
                record: ColorNameRecord {
                    name: sanitize_color_name(&entry.name, prefix),
                    distance: 0.0,
                },
                source: ColorSource::CatalogExact,
            };
            if self.cache.insert(entry.hex, cached).is_none() {
                added += 1;
            }
        }
        added
    }

    pub fn is_cached(&self, hex: &str) -> bool {
        self.cache.contains_key(hex)
    }

    /// Stores the service's answers for `hexes`, pairing by position.
    pub fn absorb_nearest(
        &mut self,
        hexes: &[String],
        records: Vec<ColorNameRecord>,
        prefix: Option<&str>,
    ) {
        for (hex, record) in hexes.iter().zip(records) {
            let source = if record.distance == 0.0 {
                ColorSource::CatalogExact
            } else {
                ColorSource::CatalogNearest
            };
            tracing::debug!(hex = %hex, name = %record.name, distance = record.distance, "nearest color");
            self.cache.insert(
                hex.clone(),
                CachedName {
                    record: ColorNameRecord {
                        name: sanitize_color_name(&record.name, prefix),
                        distance: record.distance,
                    },
                    source,
                },
            );
        }
    }

    pub fn name_for(
        &mut self,
        session: &mut Session,
        color: &ParsedColor,
    ) -> Result<ResolvedColor, NoNameFound> {
        let hex = color.hex();

        if let Some(name) = session.tokens.name_of(COLORS, &hex) {
            session.stats.color_config_matches += 1;
            return Ok(ResolvedColor {
                name: name.to_string(),
                source: ColorSource::Config,
            });
        }

        if let Some(resolved) = self.assigned.get(&hex) {
            count(session, resolved.source);
            return Ok(resolved.clone());
        }

        let cached = match self.cache.get(&hex) {
            Some(cached) => cached.clone(),
            None => {
                let record = self
                    .offline
                    .nearest(color)
                    .ok_or_else(|| NoNameFound(hex.clone()))?;
                let cached = CachedName {
                    record: ColorNameRecord {
                        name: sanitize_color_name(
                            &record.name,
                            session.settings.name_prefix.as_deref(),
                        ),
                        distance: record.distance,
                    },
                    source: ColorSource::Offline,
                };
                tracing::debug!(hex = %hex, name = %cached.record.name, "offline color fallback");
                self.cache.insert(hex.clone(), cached.clone());
                cached
            }
        };

        let name = session.registry.claim(COLORS, &cached.record.name);
        session.discovered.record(COLORS, &hex, &name);
        let resolved = ResolvedColor {
            name,
            source: cached.source,
        };
        count(session, resolved.source);
        self.assigned.insert(hex, resolved.clone());
        Ok(resolved)
    }
}

fn count(session: &mut Session, source: ColorSource) {
    let stats = &mut session.stats;
    match source {
        ColorSource::Config => stats.color_config_matches += 1,
        ColorSource::CatalogExact => stats.catalog_exact_matches += 1,
        ColorSource::CatalogNearest => stats.catalog_nearest_matches += 1,
        ColorSource::Offline => stats.offline_matches += 1,
    }
}

/// Kebab-case, CSS-safe, never a reserved utility and never digit-leading.
pub fn sanitize_color_name(name: &str, prefix: Option<&str>) -> String {
    let kept: String = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || *c == '-')
        .collect();
    let mut core = String::with_capacity(kept.len());
    for ch in kept.chars() {
        let ch = if ch.is_whitespace() { '-' } else { ch };
        if ch == '-' && core.ends_with('-') {
            continue;
        }
        core.push(ch);
    }
    let core = core.trim_matches('-');
    let core = if core.is_empty() { "unnamed-color" } else { core };

    let mut sanitized = match prefix.filter(|p| !p.is_empty()) {
        Some(prefix) => format!("{prefix}-{core}"),
        None => core.to_string(),
    };
    if is_reserved_name(&sanitized) {
        sanitized = format!("color-{sanitized}");
    }
    if sanitized.starts_with(|c: char| c.is_ascii_digit()) {
        sanitized = format!("color-{sanitized}");
    }
    sanitized
}
