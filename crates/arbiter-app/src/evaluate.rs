//! The `evaluate` use case: load documents, build the engine, produce an envelope.

use anyhow::Context;
use arbiter_domain::Engine;
use arbiter_repo::FilePolicyRepository;
use arbiter_settings::{ArbiterConfigV1, Overrides, ResolvedConfig};
use arbiter_types::{Decision, ResponseEnvelope, SCHEMA_RESPONSE_V1, ToolMeta};
use camino::Utf8Path;
use time::OffsetDateTime;

/// Input for the evaluate use case.
#[derive(Clone, Debug)]
pub struct EvaluateInput<'a> {
    /// Policy or policy set document to evaluate.
    pub policy_path: &'a Utf8Path,
    /// Request context document.
    pub request_path: &'a Utf8Path,
    /// Config file contents (empty string if not found).
    pub config_text: &'a str,
    /// Directory relative policy search paths are resolved against.
    pub base_dir: &'a Utf8Path,
    /// CLI overrides.
    pub overrides: Overrides,
}

/// Output from the evaluate use case.
#[derive(Clone, Debug)]
pub struct EvaluateOutput {
    pub envelope: ResponseEnvelope,
    /// The resolved configuration used.
    pub resolved_config: ResolvedConfig,
}

/// Run the evaluate use case: parse config, load documents and referenced
/// policies, evaluate, wrap the response in an envelope.
pub fn run_evaluate(input: EvaluateInput<'_>) -> anyhow::Result<EvaluateOutput> {
    let started_at = OffsetDateTime::now_utc();

    // Parse config (empty is allowed, defaults apply).
    let cfg = if input.config_text.trim().is_empty() {
        ArbiterConfigV1::default()
    } else {
        arbiter_settings::parse_config_toml(input.config_text).context("parse config")?
    };
    let resolved =
        arbiter_settings::resolve_config(cfg, input.overrides.clone()).context("resolve config")?;

    let policy = arbiter_repo::load_policy_document(input.policy_path).context("load policy")?;
    let request =
        arbiter_repo::load_context_document(input.request_path).context("load request")?;

    let mut builder = Engine::builder().options(resolved.options);
    if !resolved.attributes.is_empty() {
        builder = builder.attribute_repository(resolved.attribute_repository());
    }
    if !resolved.search_paths.is_empty() {
        let repository = FilePolicyRepository::load(input.base_dir, &resolved.search_paths)
            .context("load policy repository")?;
        builder = builder.policy_repository(repository);
    }
    let engine = builder.build();

    let response = engine.evaluate(&policy, &request);
    let finished_at = OffsetDateTime::now_utc();

    let envelope = ResponseEnvelope {
        schema: SCHEMA_RESPONSE_V1.to_string(),
        tool: ToolMeta {
            name: "arbiter".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        started_at,
        finished_at,
        decision: response.aggregate_decision(),
        response,
    };

    Ok(EvaluateOutput {
        envelope,
        resolved_config: resolved,
    })
}

/// Map the aggregate decision to an exit code: 0 = permit, 2 = deny,
/// 3 = not applicable, 4 = indeterminate. Runtime errors use 1.
pub fn decision_exit_code(decision: Decision) -> i32 {
    match decision {
        Decision::Permit => 0,
        Decision::Deny => 2,
        Decision::NotApplicable => 3,
        Decision::Indeterminate => 4,
    }
}
