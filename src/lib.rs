pub mod color_api;
pub mod config;
pub mod error;
pub mod naming;
pub mod pipeline;
pub mod replace;
pub mod scanner;
pub mod session;
pub mod tailwind_config;
pub mod value;

use clap::Parser;
use color_api::ColorPizzaClient;
use config::{MergeStyle, Settings};
use error::RunError;
use naming::NamedColorTable;
use pipeline::{ConfigUpdate, RunOutcome};
use std::path::PathBuf;
use std::sync::Once;
use tailwind_config::MergeStrategy;
use tracing_subscriber::EnvFilter;

/// Replace Tailwind arbitrary values with named design tokens
#[derive(Debug, Parser)]
#[command(name = "tokenwind", version)]
pub struct Cli {
    /// Project root to scan
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Prefix for generated color names
    #[arg(long, value_name = "NAME")]
    pub prefix: Option<String>,

    /// Tailwind `prefix` option in front of every utility, e.g. `tw-`
    #[arg(long, value_name = "PREFIX")]
    pub utility_prefix: Option<String>,

    /// Only replace colors
    #[arg(long)]
    pub colors_only: bool,

    /// Leave colors alone and only replace dimensions
    #[arg(long)]
    pub no_inline_colors: bool,

    /// Never call the color naming service
    #[arg(long)]
    pub offline: bool,

    /// How new tokens are written to the Tailwind config
    #[arg(long, value_enum, value_name = "STYLE")]
    pub merge: Option<MergeStyle>,

    /// Settings file (defaults to tokenwind.toml in the root)
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,
}

impl Cli {
    /// Flags given on the command line win over the settings file.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(prefix) = &self.prefix {
            settings.name_prefix = Some(prefix.clone());
        }
        if let Some(prefix) = &self.utility_prefix {
            settings.utility_prefix = Some(prefix.clone());
        }
        if self.colors_only {
            settings.dimensions = false;
        }
        if self.no_inline_colors {
            settings.inline_colors = false;
        }
        if self.offline {
            settings.offline = true;
        }
        if let Some(style) = self.merge {
            settings.merge_style = style;
        }
    }
}

pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tokenwind=info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

pub fn run_from_env() -> Result<(), RunError> {
    init_tracing();
    run(Cli::parse()).map(|_| ())
}

pub fn run(cli: Cli) -> Result<RunOutcome, RunError> {
    let mut settings = config::resolve(&cli.root, cli.settings.as_deref())?;
    cli.apply(&mut settings);

    println!("Scanning {}", cli.root.display());
    if settings.offline {
        println!("Offline: colors are named from the built-in table");
    }

    let client = ColorPizzaClient::new(&settings.catalog_url, &settings.nearest_url);
    let outcome = pipeline::run(
        &cli.root,
        settings,
        Some(&client),
        Box::new(NamedColorTable),
    )?;
    print_report(&outcome);
    Ok(outcome)
}

fn print_report(outcome: &RunOutcome) {
    let stats = &outcome.stats;
    println!();
    for path in &outcome.modified {
        println!("Modified: {}", path.display());
    }
    match &outcome.config {
        ConfigUpdate::Unchanged => println!("{}: no new tokens", outcome.config_path.display()),
        ConfigUpdate::Written { strategy, added } => {
            let how = match strategy {
                MergeStrategy::Created => "created".to_string(),
                MergeStrategy::Rewritten => "rewritten".to_string(),
                MergeStrategy::Spliced(steps) => {
                    let policies: Vec<String> = steps
                        .iter()
                        .map(|step| format!("{} via {}", step.category, step.policy))
                        .collect();
                    format!("spliced ({})", policies.join(", "))
                }
            };
            println!(
                "{}: {} with {} new token(s)",
                outcome.config_path.display(),
                how,
                added
            );
        }
        ConfigUpdate::Failed(reason) => {
            println!("{}: not updated ({})", outcome.config_path.display(), reason)
        }
    }

    println!();
    println!("Results:");
    println!("├── Files found: {}", outcome.files_found);
    println!("├── Files processed: {}", stats.processed_files);
    println!("├── Files modified: {}", stats.modified_files);
    println!("├── Replacements: {}", stats.replacements);
    println!("├── Config color matches: {}", stats.color_config_matches);
    println!("├── Catalog exact matches: {}", stats.catalog_exact_matches);
    println!("├── Catalog nearest matches: {}", stats.catalog_nearest_matches);
    println!("├── Offline matches: {}", stats.offline_matches);
    println!("├── Config value matches: {}", stats.value_config_matches);
    println!("├── Generated value names: {}", stats.generated_names);
    println!("└── Unresolved colors: {}", stats.unresolved_colors);

    if outcome.assignments.is_empty() {
        return;
    }
    let prefix = outcome.utility_prefix.as_deref().unwrap_or("");
    println!();
    println!("Names:");
    let mut current = "";
    for assignment in &outcome.assignments {
        if assignment.category != current {
            current = assignment.category.as_str();
            println!("  {current}:");
        }
        println!("    [{}] → {prefix}{}", assignment.value, assignment.name);
    }
}

#[cfg(test)]
mod tests {
    use super::Cli;
    use crate::config::{MergeStyle, Settings};
    use clap::Parser;

    #[test]
    fn flags_override_settings() {
        let cli = Cli::try_parse_from([
            "tokenwind",
            "site",
            "--prefix",
            "acme",
            "--utility-prefix",
            "tw-",
            "--colors-only",
            "--offline",
            "--merge",
            "splice",
        ])
        .expect("valid arguments");
        let mut settings = Settings::default();
        cli.apply(&mut settings);

        assert_eq!(cli.root.to_str(), Some("site"));
        assert_eq!(settings.name_prefix.as_deref(), Some("acme"));
        assert_eq!(settings.utility_prefix.as_deref(), Some("tw-"));
        assert!(!settings.dimensions);
        assert!(settings.inline_colors);
        assert!(settings.offline);
        assert_eq!(settings.merge_style, MergeStyle::Splice);
    }

    #[test]
    fn defaults_leave_settings_alone() {
        let cli = Cli::try_parse_from(["tokenwind"]).expect("valid arguments");
        let mut settings = Settings::default();
        cli.apply(&mut settings);
        assert_eq!(settings, Settings::default());
        assert_eq!(cli.root.to_str(), Some("."));
    }
}
