use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use colored::Colorize;
use tracing::warn;
use xmerge_batch::{run_batch, BatchConfig, BatchReport};
use xmerge_engine::{discover_unbounded, DiscoveryOptions, MergeConfig, MergeReport, Merger};
use xmerge_tree::{Document, WriteOptions};

use crate::cli::*;
use crate::diff;

pub fn run_command(cli: Cli) -> anyhow::Result<ExitCode> {
    let write = cli.write_options();
    let format = cli.format;
    let ok = match cli.command {
        Command::Merge(args) => cmd_merge(args, format, &write)?,
        Command::Batch(args) => cmd_batch(args, format, &write)?,
        Command::Discover(args) => cmd_discover(args, format)?,
        Command::CheckConfig(args) => cmd_check_config(args, format)?,
    };
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn load_config(path: &Path) -> anyhow::Result<MergeConfig> {
    MergeConfig::load(path).with_context(|| format!("loading config {}", path.display()))
}

fn load_document(path: &Path, what: &str) -> anyhow::Result<Document> {
    Document::from_file(path).with_context(|| format!("loading {what} {}", path.display()))
}

fn warn_missing(config: &MergeConfig, template: &Document) -> Vec<String> {
    let missing = config.missing_from(template);
    for tag in &missing {
        warn!(%tag, "unbounded tag never occurs in template");
    }
    missing
}

/// Print to stdout, or to stderr when stdout carries the XML.
fn emit(to_stdout: bool, text: &str) {
    if to_stdout {
        println!("{text}");
    } else {
        eprintln!("{text}");
    }
}

fn cmd_merge(args: MergeArgs, format: OutputFormat, write: &WriteOptions) -> anyhow::Result<bool> {
    let config = load_config(&args.config)?;
    let template = load_document(&args.template, "template")?;
    let source = load_document(&args.source, "source")?;
    warn_missing(&config, &template);

    let before = if args.diff {
        Some(template.to_xml_string(write)?)
    } else {
        None
    };
    let outcome = Merger::new(config).merge(template, &source);
    let xml = outcome.document.to_xml_string(write)?;

    match &args.output {
        Some(path) => std::fs::write(path, &xml)
            .with_context(|| format!("writing {}", path.display()))?,
        None if before.is_none() => println!("{xml}"),
        None => {}
    }
    if let Some(before) = &before {
        print!(
            "{}",
            diff::render(
                &args.template.display().to_string(),
                &args.source.display().to_string(),
                before,
                &xml,
            )
        );
    }

    let report_to_stdout = args.output.is_some() && before.is_none();
    match format {
        OutputFormat::Json => emit(report_to_stdout, &serde_json::to_string_pretty(&outcome.report)?),
        OutputFormat::Text => {
            let target = args
                .output
                .as_deref()
                .map_or_else(|| "stdout".to_string(), |p| p.display().to_string());
            let mut text = format!(
                "{} Merged {} → {}\n",
                "✓".green().bold(),
                args.source.display().to_string().bold(),
                target
            );
            text.push_str(&summarize(&outcome.report));
            emit(report_to_stdout, text.trim_end());
        }
    }
    Ok(true)
}

fn summarize(report: &MergeReport) -> String {
    let mut text = format!(
        "  {} text updates, {} clones added, {} empty removed, {} imported\n",
        report.text_updates, report.clones_added, report.empty_removed, report.subtrees_imported,
    );
    if report.flat_imported > 0 {
        text.push_str(&format!(
            "  {} flat values imported, {} template values replaced, {} duplicates dropped\n",
            report.flat_imported, report.flat_replaced, report.flat_deduplicated,
        ));
    }
    for warning in &report.warnings {
        text.push_str(&format!("  {} {warning}\n", "warning:".yellow()));
    }
    text
}

fn cmd_batch(args: BatchArgs, format: OutputFormat, write: &WriteOptions) -> anyhow::Result<bool> {
    let merger = Merger::new(load_config(&args.config)?);

    let mut config = BatchConfig::new(&args.template, &args.sources, &args.output)
        .with_prefix(args.prefix)
        .recursive(args.recursive)
        .with_write_options(write.clone());
    if let Some(jobs) = args.jobs {
        config = config.with_jobs(jobs);
    }
    if let Some(secs) = args.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }

    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    let report = runtime.block_on(run_batch(merger, &config))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_batch(&report),
    }
    Ok(report.is_success())
}

fn print_batch(report: &BatchReport) {
    for merged in &report.merged {
        println!(
            "  {} {} → {}",
            "merged:".green(),
            merged.source.display(),
            merged.output.display()
        );
        for warning in &merged.report.warnings {
            println!("    {} {warning}", "warning:".yellow());
        }
    }
    for failure in &report.failures {
        println!("  {} {}: {}", "failed:".red(), failure.source.display(), failure.error);
    }

    let status = if report.is_success() {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!(
        "{status} {} of {} files merged ({} clones added, {} empty removed, {} warnings)",
        report.merged.len(),
        report.processed(),
        report.totals.clones_added,
        report.totals.empty_removed,
        report.totals.warnings.len(),
    );
}

fn cmd_discover(args: DiscoverArgs, format: OutputFormat) -> anyhow::Result<bool> {
    let template = load_document(&args.template, "template")?;
    let mut options = DiscoveryOptions {
        flat_leaves: args.flat,
        ..Default::default()
    };
    if !args.markers.is_empty() {
        options.markers = args.markers;
    }

    let config = discover_unbounded(&template, &options);
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
        OutputFormat::Text => print!("{}", config.to_toml_string()?),
    }
    if config.unbounded.is_empty() {
        eprintln!("{} no marker comments found", "warning:".yellow());
    }
    Ok(true)
}

fn cmd_check_config(args: CheckConfigArgs, format: OutputFormat) -> anyhow::Result<bool> {
    let config = load_config(&args.config)?;
    let missing = match &args.template {
        Some(path) => warn_missing(&config, &load_document(path, "template")?),
        None => Vec::new(),
    };

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "unbounded": config.unbounded,
                "flat_repeat": config.flat_repeat,
                "missing_from_template": missing,
            }))?
        ),
        OutputFormat::Text => {
            println!(
                "{} {}: {} unbounded, {} flat-repeat",
                "✓".green().bold(),
                args.config.display(),
                config.unbounded.len(),
                config.flat_repeat.len()
            );
            for tag in &missing {
                println!("  {} <{tag}> never occurs in template", "missing:".yellow());
            }
        }
    }
    Ok(missing.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    struct Files {
        dir: tempfile::TempDir,
    }

    impl Files {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            fs::write(dir.path().join("wl.toml"), "unbounded = [\"X\"]\n").unwrap();
            fs::write(dir.path().join("t.xml"), "<r><X/><Y/></r>").unwrap();
            fs::write(dir.path().join("s.xml"), "<r><X>1</X><X>2</X><Y>y</Y></r>").unwrap();
            Self { dir }
        }

        fn path(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }
    }

    fn compact() -> WriteOptions {
        WriteOptions {
            indent: None,
            declaration: false,
        }
    }

    #[test]
    fn merge_writes_output_file() {
        let f = Files::new();
        let args = MergeArgs {
            config: f.path("wl.toml"),
            template: f.path("t.xml"),
            source: f.path("s.xml"),
            output: Some(f.path("out.xml")),
            diff: false,
        };
        assert!(cmd_merge(args, OutputFormat::Json, &compact()).unwrap());
        assert_eq!(
            fs::read_to_string(f.path("out.xml")).unwrap(),
            "<r><X>1</X><X>2</X><Y>y</Y></r>"
        );
    }

    #[test]
    fn merge_reports_missing_config() {
        let f = Files::new();
        let args = MergeArgs {
            config: f.path("absent.toml"),
            template: f.path("t.xml"),
            source: f.path("s.xml"),
            output: None,
            diff: false,
        };
        let err = cmd_merge(args, OutputFormat::Text, &compact()).unwrap_err();
        assert!(err.to_string().contains("loading config"));
    }

    #[test]
    fn check_config_flags_tags_absent_from_template() {
        let f = Files::new();
        fs::write(f.path("wl.toml"), "unbounded = [\"X\", \"Nowhere\"]\n").unwrap();
        let with_template = CheckConfigArgs {
            config: f.path("wl.toml"),
            template: Some(f.path("t.xml")),
        };
        assert!(!cmd_check_config(with_template, OutputFormat::Text).unwrap());

        let alone = CheckConfigArgs {
            config: f.path("wl.toml"),
            template: None,
        };
        assert!(cmd_check_config(alone, OutputFormat::Json).unwrap());
    }

    #[test]
    fn check_config_rejects_invalid_file() {
        let f = Files::new();
        fs::write(f.path("wl.toml"), "flat_repeat = [\"N\"]\nunbounded = []\n").unwrap();
        let args = CheckConfigArgs {
            config: f.path("wl.toml"),
            template: None,
        };
        assert!(cmd_check_config(args, OutputFormat::Text).is_err());
    }

    #[test]
    fn batch_fails_loud_when_a_file_fails() {
        let f = Files::new();
        let sources = f.path("in");
        fs::create_dir_all(&sources).unwrap();
        fs::copy(f.path("s.xml"), sources.join("good.xml")).unwrap();
        fs::write(sources.join("bad.xml"), "<r>").unwrap();

        let args = BatchArgs {
            config: f.path("wl.toml"),
            template: f.path("t.xml"),
            sources,
            output: f.path("out"),
            jobs: Some(2),
            timeout_secs: None,
            prefix: "Merged_".into(),
            recursive: false,
        };
        assert!(!cmd_batch(args, OutputFormat::Text, &compact()).unwrap());
        assert!(f.path("out").join("Merged_good.xml").exists());
    }

    #[test]
    fn summary_lists_warnings() {
        let report = MergeReport {
            clones_added: 2,
            warnings: vec![xmerge_engine::MergeWarning::RootMismatch {
                template: "a".into(),
                source: "b".into(),
            }],
            ..Default::default()
        };
        let text = summarize(&report);
        assert!(text.contains("2 clones added"));
        assert!(text.contains("root mismatch"));
    }
}
