//! Developer tasks (schema generation, fixture checks, explain coverage).
//!
//! Keeping this separate avoids bloating the end-user CLI.

use anyhow::{Context, bail};
use camino::Utf8PathBuf;
use schemars::schema_for;
use std::fs;
use std::path::PathBuf;

/// Get the project root (parent of xtask directory).
fn project_root() -> anyhow::Result<PathBuf> {
    let manifest_dir = match std::env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => std::env::current_dir().context("Cannot determine current directory")?,
    };

    // If we're in the xtask directory, go up one level
    if manifest_dir.ends_with("xtask")
        && let Some(parent) = manifest_dir.parent()
    {
        Ok(parent.to_path_buf())
    } else {
        Ok(manifest_dir)
    }
}

fn schemas_dir() -> anyhow::Result<PathBuf> {
    Ok(project_root()?.join("schemas"))
}

fn fixtures_dir() -> anyhow::Result<PathBuf> {
    Ok(project_root()?.join("tests").join("fixtures"))
}

/// Schema definition with its target filename.
struct SchemaSpec {
    filename: &'static str,
    generate: fn() -> schemars::Schema,
}

fn generate_response_schema() -> schemars::Schema {
    schema_for!(arbiter_types::ResponseEnvelope)
}

fn generate_config_schema() -> schemars::Schema {
    schema_for!(arbiter_settings::ArbiterConfigV1)
}

fn generate_policy_schema() -> schemars::Schema {
    schema_for!(arbiter_domain::model::PolicyDocument)
}

fn generate_request_schema() -> schemars::Schema {
    schema_for!(arbiter_domain::model::ContextDocument)
}

fn schema_specs() -> Vec<SchemaSpec> {
    vec![
        SchemaSpec {
            filename: "arbiter.response.v1.json",
            generate: generate_response_schema,
        },
        SchemaSpec {
            filename: "arbiter.config.v1.json",
            generate: generate_config_schema,
        },
        SchemaSpec {
            filename: "arbiter.policy.v1.json",
            generate: generate_policy_schema,
        },
        SchemaSpec {
            filename: "arbiter.request.v1.json",
            generate: generate_request_schema,
        },
    ]
}

/// Serialize a schema to pretty-printed JSON with trailing newline.
fn serialize_schema(schema: &schemars::Schema) -> anyhow::Result<String> {
    let mut json = serde_json::to_string_pretty(schema).context("Failed to serialize schema")?;
    json.push('\n');
    Ok(json)
}

fn emit_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir()?;
    if !dir.exists() {
        fs::create_dir_all(&dir).context("Failed to create schemas directory")?;
    }

    for spec in schema_specs() {
        let json = serialize_schema(&(spec.generate)())?;
        let path = dir.join(spec.filename);
        fs::write(&path, &json)
            .with_context(|| format!("Failed to write schema to {}", path.display()))?;
        println!("Wrote {}", path.display());
    }

    println!("\nSchemas emitted successfully.");
    Ok(())
}

/// Validate that schemas in the repo match what would be generated.
fn validate_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir()?;
    let mut missing = Vec::new();
    let mut mismatched = Vec::new();

    for spec in schema_specs() {
        let path = dir.join(spec.filename);
        if !path.exists() {
            missing.push(spec.filename);
            continue;
        }

        let expected = serialize_schema(&(spec.generate)())?;
        let actual = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if expected != actual {
            mismatched.push(spec.filename);
        }
    }

    if missing.is_empty() && mismatched.is_empty() {
        println!("All schemas are up to date.");
        return Ok(());
    }
    if !missing.is_empty() {
        eprintln!("Missing schemas:");
        for name in &missing {
            eprintln!("  - {}", name);
        }
    }
    if !mismatched.is_empty() {
        eprintln!("Schemas out of date:");
        for name in &mismatched {
            eprintln!("  - {}", name);
        }
    }
    eprintln!("\nRun `cargo xtask emit-schemas` to regenerate.");
    bail!("Schema validation failed")
}

/// Load every fixture's documents and validate its golden response against
/// the response schema.
fn check_fixtures() -> anyhow::Result<()> {
    let schema = serde_json::to_value(generate_response_schema())
        .context("Failed to convert response schema")?;
    let validator = jsonschema::validator_for(&schema)
        .map_err(|e| anyhow::anyhow!("Failed to compile response schema: {}", e))?;

    let dir = fixtures_dir()?;
    let mut entries = fs::read_dir(&dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?
        .collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|e| e.file_name());

    let mut checked = 0;
    let mut errors = Vec::new();
    for entry in entries {
        let Ok(path) = Utf8PathBuf::from_path_buf(entry.path()) else {
            continue;
        };
        let expected = path.join("expected.response.json");
        if !expected.exists() {
            continue;
        }
        let name = path.file_name().unwrap_or_default().to_string();

        if let Err(err) = arbiter_repo::load_policy_document(&path.join("policy.json")) {
            errors.push(format!("{name}: {err:#}"));
        }
        if let Err(err) = arbiter_repo::load_context_document(&path.join("request.json")) {
            errors.push(format!("{name}: {err:#}"));
        }

        let content = fs::read_to_string(&expected)
            .with_context(|| format!("Failed to read {expected}"))?;
        let value: serde_json::Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {expected} as JSON"))?;
        for err in validator.iter_errors(&value) {
            errors.push(format!("{name}: schema validation: {err}"));
        }
        // Golden files must already carry the placeholders.
        if arbiter_test_util::normalize_nondeterministic(value.clone()) != value {
            errors.push(format!(
                "{name}: timestamps and tool version must use placeholders"
            ));
        }
        checked += 1;
    }

    if errors.is_empty() {
        println!("✓ {} fixtures checked", checked);
        Ok(())
    } else {
        for error in &errors {
            eprintln!("  - {}", error);
        }
        bail!("Fixture check failed with {} errors", errors.len())
    }
}

/// Validate that all combining algorithms and status codes have explanations.
fn explain_coverage() -> anyhow::Result<()> {
    let algorithms = arbiter_types::explain::all_algorithm_ids();
    let status_codes = arbiter_types::explain::all_status_codes();

    let mut errors = Vec::new();
    for (kind, id) in algorithms
        .iter()
        .map(|id| ("Algorithm", id))
        .chain(status_codes.iter().map(|id| ("Status code", id)))
    {
        match arbiter_types::lookup_explanation(id) {
            Some(exp) => {
                if exp.title.is_empty() {
                    errors.push(format!("{kind} '{id}' has empty title"));
                }
                if exp.description.is_empty() {
                    errors.push(format!("{kind} '{id}' has empty description"));
                }
                if exp.remediation.is_empty() {
                    errors.push(format!("{kind} '{id}' has empty remediation"));
                }
            }
            None => errors.push(format!("{kind} '{id}' has no explanation")),
        }
    }

    if errors.is_empty() {
        println!("✓ {} combining algorithms have explanations", algorithms.len());
        println!("✓ {} status codes have explanations", status_codes.len());
        println!("\n✓ All explain coverage checks passed!");
        Ok(())
    } else {
        for error in &errors {
            eprintln!("  - {}", error);
        }
        bail!(
            "Explain coverage validation failed with {} errors",
            errors.len()
        )
    }
}

fn print_help() {
    eprintln!("xtask commands:");
    eprintln!("  help              Show this message");
    eprintln!("  emit-schemas      Generate JSON schemas from Rust types to schemas/");
    eprintln!("  validate-schemas  Check if schemas/ matches generated output (for CI)");
    eprintln!("  print-schema-ids  Print known schema IDs");
    eprintln!("  check-fixtures    Load tests/fixtures/ and validate golden responses");
    eprintln!("  explain-coverage  Validate all algorithms and status codes have explanations");
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let cmd = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    match cmd {
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        "emit-schemas" => emit_schemas(),
        "validate-schemas" => validate_schemas(),
        "check-fixtures" => check_fixtures(),
        "explain-coverage" => explain_coverage(),
        "print-schema-ids" => {
            for spec in schema_specs() {
                println!("{}", spec.filename.trim_end_matches(".json"));
            }
            Ok(())
        }
        other => bail!("unknown xtask command: {other}\n\nRun `cargo xtask help` for usage."),
    }
    .context("xtask failed")
}
