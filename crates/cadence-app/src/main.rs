//! `cadence`: expand an iCalendar recurrence rule from the command line.

use anyhow::Context;
use cadence_core::config::{Settings, load_config};
use cadence_core::types::ComplianceMode;
use cadence_rfc::rfc::ical::parse::parse_instance;
use cadence_rfc::{Instance, IterOptions, RecurrenceRule};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

/// Expand an RRULE value into its instances.
#[derive(Debug, Parser)]
#[command(name = "cadence", version)]
struct Args {
    /// Rule text, e.g. `FREQ=MONTHLY;BYDAY=-1FR;COUNT=6`
    rule: String,

    /// First instance: `YYYYMMDD`, `YYYYMMDDTHHMMSS` or `YYYYMMDDTHHMMSSZ`
    #[arg(short, long)]
    start: String,

    /// Time zone of a local first instance
    #[arg(long)]
    tzid: Option<String>,

    /// Compliance mode, overriding the configured one
    #[arg(short, long)]
    mode: Option<ComplianceMode>,

    /// Maximum number of instances to print
    #[arg(short, long)]
    limit: Option<u32>,

    /// Print a JSON array instead of one instance per line
    #[arg(long)]
    json: bool,

    /// Configuration file, `config.toml` by default
    #[arg(long)]
    config: Option<String>,
}

/// ## Summary
/// Parses the rule and expands it under the effective mode and limits.
///
/// ## Errors
/// Returns an error if the rule, the first instance or their combination is
/// invalid.
fn expand(args: &Args, settings: &Settings) -> anyhow::Result<(RecurrenceRule, Vec<Instance>)> {
    let mode = args.mode.unwrap_or(settings.recurrence.mode);
    let rule = RecurrenceRule::parse(&args.rule, mode)
        .with_context(|| format!("Failed to parse rule {}", args.rule))?;
    let first = parse_instance(&args.start, args.tzid.as_deref())
        .with_context(|| format!("Failed to parse start {}", args.start))?;

    tracing::info!(rule = %rule, %mode, start = %first, "Expanding recurrence");

    let max = settings.recurrence.max_instances;
    let limit = args.limit.map_or(max, |limit| limit.min(max));
    let cursor = rule.iterator_with(first, IterOptions::from(&settings.recurrence))?;
    let instances = cursor
        .take(usize::try_from(limit).unwrap_or(usize::MAX))
        .collect();

    Ok((rule, instances))
}

fn main() -> anyhow::Result<()> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    let args = Args::parse();
    let settings = load_config(args.config.as_deref())?;

    if let Ok(filter) = EnvFilter::try_new(settings.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %settings.logging.level, "Invalid log level in config, keeping info");
    }

    let (rule, instances) = expand(&args, &settings)?;
    tracing::debug!(rule = %rule, count = instances.len(), "Expansion finished");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&instances)?);
    } else {
        for instance in &instances {
            println!("{instance}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings::load_from(Some("does-not-exist.toml")).unwrap()
    }

    #[test]
    fn arguments_parse() {
        let args = Args::try_parse_from([
            "cadence",
            "FREQ=DAILY;COUNT=3",
            "--start",
            "20200101T090000",
            "--tzid",
            "Europe/Berlin",
            "--mode",
            "rfc5545-strict",
            "--limit",
            "2",
            "--json",
        ])
        .unwrap();

        assert_eq!(args.mode, Some(ComplianceMode::Rfc5545Strict));
        assert_eq!(args.limit, Some(2));
        assert!(args.json);
    }

    #[test_log::test]
    fn limit_caps_output() {
        let args =
            Args::try_parse_from(["cadence", "FREQ=WEEKLY", "-s", "20200101", "-l", "3"]).unwrap();
        let (rule, instances) = expand(&args, &settings()).unwrap();

        assert_eq!(rule.to_string(), "FREQ=WEEKLY");
        let text: Vec<String> = instances.iter().map(ToString::to_string).collect();
        assert_eq!(text, ["20200101", "20200108", "20200115"]);
    }

    #[test_log::test]
    fn configured_maximum_bounds_unbounded_rules() {
        let mut settings = settings();
        settings.recurrence.max_instances = 5;
        let args =
            Args::try_parse_from(["cadence", "FREQ=DAILY", "-s", "20200101", "-l", "50"]).unwrap();

        let (_, instances) = expand(&args, &settings).unwrap();

        assert_eq!(instances.len(), 5);
    }

    #[test]
    fn strict_mode_rejects_what_lax_corrects() {
        let args = Args::try_parse_from([
            "cadence",
            "FREQ=WEEKLY;BYDAY=1MO",
            "-s",
            "20200106",
            "-m",
            "rfc5545_strict",
        ])
        .unwrap();
        assert!(expand(&args, &settings()).is_err());

        let args = Args::try_parse_from(["cadence", "FREQ=WEEKLY;BYDAY=1MO", "-s", "20200106"])
            .unwrap();
        let (rule, _) = expand(&args, &settings()).unwrap();
        assert_eq!(rule.to_string(), "FREQ=WEEKLY;BYDAY=MO");
    }
}
