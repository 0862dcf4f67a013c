//! One run: load the config, name every arbitrary value in the tree,
//! rewrite files, then write the new tokens back.

use crate::color_api::ColorService;
use crate::config::{MergeStyle, Settings};
use crate::error::{RunError, ScanError};
use crate::naming::{ColorNamer, OfflineResolver};
use crate::replace::Replacer;
use crate::scanner::{ScanOptions, find_files};
use crate::session::{COLORS, Session, Stats};
use crate::tailwind_config::{self, LoadedConfig, MergeMode, MergeStrategy};
use indexmap::IndexSet;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    LoadConfig,
    FetchColorCatalog,
    EnumerateFiles,
    CollectUnknownValues,
    ResolveUnknownValues,
    RewriteFiles,
    MergeConfig,
    Report,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigUpdate {
    Unchanged,
    Written { strategy: MergeStrategy, added: usize },
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub category: String,
    pub value: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub stats: Stats,
    pub files_found: usize,
    pub modified: Vec<PathBuf>,
    pub config_path: PathBuf,
    pub config: ConfigUpdate,
    /// Names created or reused from this run's scan, in first-seen order.
    pub assignments: Vec<Assignment>,
    pub utility_prefix: Option<String>,
}

struct Run<'a> {
    root: &'a Path,
    stage: Stage,
    service: Option<&'a dyn ColorService>,
}

impl Run<'_> {
    fn enter(&mut self, stage: Stage) {
        tracing::debug!(from = ?self.stage, to = ?stage, "stage");
        self.stage = stage;
    }

    fn online_service(&self, session: &Session) -> Option<&dyn ColorService> {
        if session.settings.offline {
            None
        } else {
            self.service
        }
    }
}

pub fn run(
    root: &Path,
    settings: Settings,
    service: Option<&dyn ColorService>,
    offline: Box<dyn OfflineResolver>,
) -> Result<RunOutcome, RunError> {
    let mut run = Run {
        root,
        stage: Stage::Init,
        service,
    };
    if !root.is_dir() {
        return Err(ScanError::RootNotFound(root.to_path_buf()).into());
    }

    run.enter(Stage::LoadConfig);
    let config_path = settings.tailwind_config_path(run.root);
    let loaded = tailwind_config::load(&config_path);
    let utility_prefix = settings.utility_prefix.clone().or_else(|| loaded.prefix.clone());
    let mode = merge_mode(&settings, &loaded);
    let mut session = Session::new(settings, loaded.tokens.clone());
    for (category, names) in &loaded.names {
        session.reserve_names(category, names.iter().map(String::as_str));
    }
    let replacer = Replacer::new(
        utility_prefix.as_deref(),
        session.settings.inline_colors,
        session.settings.dimensions,
    )?;
    let mut namer = ColorNamer::new(offline);
    let prefix = session.settings.name_prefix.clone();

    run.enter(Stage::FetchColorCatalog);
    if replacer.handles_colors() {
        if let Some(service) = run.online_service(&session) {
            let entries = service.fetch_catalog()?;
            let added = namer.load_catalog(entries, prefix.as_deref());
            tracing::info!(colors = added, "loaded color catalog");
        }
    }

    run.enter(Stage::EnumerateFiles);
    let files: Vec<PathBuf> = find_files(&ScanOptions::from_settings(run.root, &session.settings))?
        .into_iter()
        .filter(|path| *path != config_path)
        .collect();
    tracing::info!(files = files.len(), "found files");

    run.enter(Stage::CollectUnknownValues);
    let mut unknown = Vec::new();
    if replacer.handles_colors() && run.online_service(&session).is_some() {
        let mut hexes = IndexSet::new();
        for path in &files {
            match fs::read_to_string(path) {
                Ok(text) => replacer.collect_hexes(&text, &mut hexes),
                Err(err) => tracing::warn!(path = %path.display(), error = %err, "cannot read file"),
            }
        }
        unknown = hexes
            .into_iter()
            .filter(|hex| !session.tokens.contains(COLORS, hex) && !namer.is_cached(hex))
            .collect();
    }

    run.enter(Stage::ResolveUnknownValues);
    if let Some(service) = run.online_service(&session).filter(|_| !unknown.is_empty()) {
        match service.fetch_nearest(&unknown) {
            Ok(records) => namer.absorb_nearest(&unknown, records, prefix.as_deref()),
            Err(err) => {
                tracing::warn!(error = %err, colors = unknown.len(), "nearest color lookup failed; using offline names")
            }
        }
    }

    run.enter(Stage::RewriteFiles);
    let mut modified = Vec::new();
    for path in &files {
        if replacer.process_file(path, &mut session, &mut namer) {
            modified.push(path.clone());
        }
    }

    run.enter(Stage::MergeConfig);
    let config = match tailwind_config::merge(&loaded, &session.additions(), mode) {
        None => ConfigUpdate::Unchanged,
        Some(outcome) if outcome.added == 0 => {
            let reason = format!("no place to add {}", outcome.skipped.join(", "));
            tracing::error!(path = %config_path.display(), "{reason}");
            ConfigUpdate::Failed(reason)
        }
        Some(outcome) => match fs::write(&config_path, &outcome.text) {
            Ok(()) => ConfigUpdate::Written {
                strategy: outcome.strategy,
                added: outcome.added,
            },
            Err(err) => {
                tracing::error!(path = %config_path.display(), error = %err, "cannot write tailwind config");
                ConfigUpdate::Failed(err.to_string())
            }
        },
    };

    run.enter(Stage::Report);
    let assignments = session
        .discovered
        .iter()
        .flat_map(|(category, values)| {
            values.iter().map(move |(value, name)| Assignment {
                category: category.to_string(),
                value: value.clone(),
                name: name.clone(),
            })
        })
        .collect();
    let outcome = RunOutcome {
        stats: session.stats,
        files_found: files.len(),
        modified,
        config_path,
        config,
        assignments,
        utility_prefix,
    };

    run.enter(Stage::Done);
    Ok(outcome)
}

fn merge_mode(settings: &Settings, loaded: &LoadedConfig) -> MergeMode {
    match settings.merge_style {
        MergeStyle::Rewrite => MergeMode::Rewrite,
        MergeStyle::Splice => MergeMode::Splice,
        MergeStyle::Auto if settings.dimensions && loaded.is_structured() => MergeMode::Rewrite,
        MergeStyle::Auto => MergeMode::Splice,
    }
}
