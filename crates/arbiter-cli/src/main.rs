//! CLI entry point for arbiter.
//!
//! This module is intentionally thin: it handles argument parsing, I/O, logging setup and exit
//! codes. All business logic lives in the `arbiter-app` crate.

use anyhow::Context;
use arbiter_app::{
    EvaluateInput, ExplainOutput, decision_exit_code, parse_response_json, render_markdown,
    render_text, run_evaluate, run_explain, runtime_error_envelope, serialize_response,
};
use arbiter_settings::Overrides;
use arbiter_types::ResponseEnvelope;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "arbiter",
    version,
    about = "Attribute-based access-control policy decision point"
)]
struct Cli {
    /// Path to arbiter config TOML. Relative policy search paths are resolved
    /// against its directory.
    #[arg(long, default_value = "arbiter.toml")]
    config: Utf8PathBuf,

    /// Enable debug logging for the arbiter crates.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Md,
    Text,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate a policy document against a request document.
    Evaluate {
        /// Policy or policy set document (JSON).
        #[arg(long)]
        policy: Utf8PathBuf,

        /// Request context document (JSON).
        #[arg(long)]
        request: Utf8PathBuf,

        /// Where to write the JSON response envelope.
        #[arg(long)]
        out: Option<Utf8PathBuf>,

        /// Format printed to stdout.
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Directory searched for referenced policies (repeatable; replaces the config value).
        #[arg(long = "search-path")]
        search_paths: Vec<String>,

        /// Override the maximum variable reference depth.
        #[arg(long)]
        max_variable_depth: Option<usize>,

        /// Override the maximum policy reference depth.
        #[arg(long)]
        max_reference_depth: Option<usize>,

        /// Print the evaluation trace to stderr.
        #[arg(long)]
        trace: bool,
    },

    /// Render markdown from an existing JSON response.
    Md {
        /// Path to the JSON response file.
        #[arg(long)]
        response: Utf8PathBuf,

        /// Where to write the Markdown output (if not specified, prints to stdout).
        #[arg(long, short)]
        output: Option<Utf8PathBuf>,
    },

    /// Explain a combining algorithm or status code.
    Explain {
        /// Full URN or short name (e.g. "deny-overrides", "missing-attribute").
        identifier: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Commands::Evaluate {
            ref policy,
            ref request,
            ref out,
            format,
            ref search_paths,
            max_variable_depth,
            max_reference_depth,
            trace,
        } => {
            let overrides = Overrides {
                max_variable_depth,
                max_reference_depth,
                trace: trace.then_some(true),
                search_paths: search_paths.clone(),
            };
            cmd_evaluate(&cli, policy, request, out.as_deref(), format, overrides)
        }
        Commands::Md {
            ref response,
            ref output,
        } => {
            init_tracing(cli.verbose, false);
            cmd_md(response, output.as_deref())
        }
        Commands::Explain { ref identifier } => cmd_explain(identifier),
    }
}

fn init_tracing(verbose: bool, trace: bool) {
    use tracing_subscriber::EnvFilter;

    let mut filter = if verbose {
        EnvFilter::new("arbiter=debug,arbiter_domain=debug,arbiter_repo=debug,arbiter_app=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    if trace && let Ok(directive) = "arbiter::eval=trace".parse() {
        filter = filter.add_directive(directive);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Quick look at `[engine] trace` so logging can be set up before the config
/// is fully resolved.
fn trace_from_config(cfg_text: &str) -> bool {
    arbiter_settings::parse_config_toml(cfg_text)
        .ok()
        .and_then(|cfg| cfg.engine.trace)
        .unwrap_or(false)
}

fn config_base_dir(config: &Utf8Path) -> Utf8PathBuf {
    match config.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent.to_path_buf(),
        _ => Utf8PathBuf::from("."),
    }
}

fn cmd_evaluate(
    cli: &Cli,
    policy: &Utf8Path,
    request: &Utf8Path,
    out: Option<&Utf8Path>,
    format: OutputFormat,
    overrides: Overrides,
) -> anyhow::Result<()> {
    // Missing config file is allowed (defaults apply).
    let cfg_text = std::fs::read_to_string(&cli.config).unwrap_or_default();
    let trace = overrides.trace.unwrap_or_else(|| trace_from_config(&cfg_text));
    init_tracing(cli.verbose, trace);

    let base_dir = config_base_dir(&cli.config);
    let result = (|| -> anyhow::Result<i32> {
        let output = run_evaluate(EvaluateInput {
            policy_path: policy,
            request_path: request,
            config_text: &cfg_text,
            base_dir: &base_dir,
            overrides,
        })?;
        let envelope = output.envelope;
        tracing::debug!(
            decision = %envelope.decision,
            results = envelope.response.results.len(),
            "evaluation finished"
        );

        if let Some(path) = out {
            write_response_file(path, &envelope).context("write response json")?;
        }
        match format {
            OutputFormat::Json => {
                let data = serialize_response(&envelope)?;
                println!("{}", String::from_utf8_lossy(&data));
            }
            OutputFormat::Md => print!("{}", render_markdown(&envelope)),
            OutputFormat::Text => print!("{}", render_text(&envelope)),
        }

        Ok(decision_exit_code(envelope.decision))
    })();

    match result {
        Ok(code) => {
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
        Err(err) => {
            if let Some(path) = out {
                let envelope = runtime_error_envelope(&format!("{err:#}"));
                let _ = write_response_file(path, &envelope);
            }
            eprintln!("arbiter error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn write_response_file(
    path: &Utf8Path,
    envelope: &ResponseEnvelope,
) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_str().is_empty()
    {
        std::fs::create_dir_all(parent).with_context(|| format!("create directory: {}", parent))?;
    }
    let data = serialize_response(envelope)?;
    std::fs::write(path, data).with_context(|| format!("write response: {}", path))?;
    Ok(())
}

fn write_text_file(path: &Utf8Path, text: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_str().is_empty()
    {
        std::fs::create_dir_all(parent).with_context(|| format!("create directory: {}", parent))?;
    }
    std::fs::write(path, text).with_context(|| format!("write text: {}", path))?;
    Ok(())
}

fn cmd_md(response_path: &Utf8Path, output: Option<&Utf8Path>) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(response_path)
        .with_context(|| format!("read response: {}", response_path))?;
    let envelope = parse_response_json(&text)?;
    let md = render_markdown(&envelope);

    if let Some(out_path) = output {
        write_text_file(out_path, &md).context("write markdown output")?;
    } else {
        print!("{}", md);
    }

    Ok(())
}

fn cmd_explain(identifier: &str) -> anyhow::Result<()> {
    match run_explain(identifier) {
        ExplainOutput::Found(exp) => {
            print!("{}", arbiter_app::format_explanation(&exp));
            Ok(())
        }
        ExplainOutput::NotFound {
            identifier,
            available_algorithms,
            available_status_codes,
        } => {
            eprint!(
                "{}",
                arbiter_app::format_not_found(
                    &identifier,
                    available_algorithms,
                    available_status_codes
                )
            );
            std::process::exit(1);
        }
    }
}
