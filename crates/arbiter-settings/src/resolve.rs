use crate::model::{ArbiterConfigV1, AttributeConfig, SCHEMA_CONFIG_V1};
use anyhow::Context;
use arbiter_domain::model::Category;
use arbiter_domain::{DataType, EngineOptions, StaticAttribute, StaticAttributeRepository};
use arbiter_types::ids;

/// Command-line values that win over the config file.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub max_variable_depth: Option<usize>,
    pub max_reference_depth: Option<usize>,
    pub trace: Option<bool>,
    /// Replaces the configured search paths when non-empty.
    pub search_paths: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ResolvedConfig {
    pub options: EngineOptions,
    pub trace: bool,
    pub search_paths: Vec<String>,
    pub attributes: Vec<StaticAttribute>,
}

impl ResolvedConfig {
    pub fn attribute_repository(&self) -> StaticAttributeRepository {
        StaticAttributeRepository::new(self.attributes.clone())
    }
}

pub fn resolve_config(
    cfg: ArbiterConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    if let Some(schema) = cfg.schema.as_deref()
        && schema != SCHEMA_CONFIG_V1
    {
        anyhow::bail!("unsupported config schema: {schema} (expected {SCHEMA_CONFIG_V1})");
    }

    let defaults = EngineOptions::default();
    let options = EngineOptions {
        max_variable_depth: positive(
            "max_variable_depth",
            overrides
                .max_variable_depth
                .or(cfg.engine.max_variable_depth)
                .unwrap_or(defaults.max_variable_depth),
        )?,
        max_reference_depth: positive(
            "max_reference_depth",
            overrides
                .max_reference_depth
                .or(cfg.engine.max_reference_depth)
                .unwrap_or(defaults.max_reference_depth),
        )?,
    };

    let search_paths = if overrides.search_paths.is_empty() {
        cfg.policies.search_paths
    } else {
        overrides.search_paths
    };

    let attributes = cfg
        .attributes
        .iter()
        .enumerate()
        .map(|(i, a)| {
            resolve_attribute(a).with_context(|| format!("invalid attribute #{i} ({})", a.attribute_id))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(ResolvedConfig {
        options,
        trace: overrides.trace.or(cfg.engine.trace).unwrap_or(false),
        search_paths,
        attributes,
    })
}

fn positive(name: &str, value: usize) -> anyhow::Result<usize> {
    if value == 0 {
        anyhow::bail!("{name} must be at least 1");
    }
    Ok(value)
}

fn resolve_attribute(cfg: &AttributeConfig) -> anyhow::Result<StaticAttribute> {
    let category = Category::parse(&cfg.category).with_context(|| {
        format!(
            "unknown category: {} (expected subject|resource|action|environment)",
            cfg.category
        )
    })?;
    if cfg.attribute_id.is_empty() {
        anyhow::bail!("attribute_id must not be empty");
    }
    let data_type_uri = cfg.data_type.as_deref().unwrap_or(ids::DATA_TYPE_STRING);
    let data_type = DataType::from_uri(data_type_uri)
        .with_context(|| format!("unknown data type: {data_type_uri}"))?;
    for (i, value) in cfg.values.iter().enumerate() {
        data_type
            .parse(value, i)
            .with_context(|| format!("value {value:?} is not a valid {data_type}"))?;
    }
    Ok(StaticAttribute {
        category,
        attribute_id: cfg.attribute_id.clone(),
        data_type: data_type_uri.to_string(),
        issuer: cfg.issuer.clone(),
        values: cfg.values.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_config_toml;

    #[test]
    fn empty_config_resolves_to_defaults() {
        let cfg = parse_config_toml("").unwrap();
        let resolved = resolve_config(cfg, Overrides::default()).unwrap();
        assert_eq!(resolved.options, EngineOptions::default());
        assert!(!resolved.trace);
        assert!(resolved.search_paths.is_empty());
        assert!(resolved.attribute_repository().is_empty());
    }

    #[test]
    fn file_values_and_overrides() {
        let cfg = parse_config_toml(
            r#"
schema = "arbiter.config.v1"

[engine]
max_variable_depth = 8
max_reference_depth = 4
trace = true

[policies]
search_paths = ["policies", "shared"]

[[attributes]]
category = "environment"
attribute_id = "urn:example:env:region"
values = ["eu-west"]

[[attributes]]
category = "subject"
attribute_id = "urn:example:clearance"
data_type = "http://www.w3.org/2001/XMLSchema#integer"
issuer = "hr"
values = ["3"]
"#,
        )
        .unwrap();

        let resolved = resolve_config(
            cfg,
            Overrides {
                max_reference_depth: Some(2),
                trace: Some(false),
                ..Overrides::default()
            },
        )
        .unwrap();
        assert_eq!(resolved.options.max_variable_depth, 8);
        assert_eq!(resolved.options.max_reference_depth, 2);
        assert!(!resolved.trace);
        assert_eq!(resolved.search_paths, vec!["policies", "shared"]);
        assert_eq!(resolved.attributes.len(), 2);
        assert_eq!(resolved.attributes[0].category, Category::Environment);
        assert_eq!(resolved.attributes[0].data_type, ids::DATA_TYPE_STRING);
        assert_eq!(resolved.attributes[1].issuer.as_deref(), Some("hr"));
    }

    #[test]
    fn search_path_override_replaces_file_value() {
        let cfg = parse_config_toml("[policies]\nsearch_paths = [\"a\"]\n").unwrap();
        let resolved = resolve_config(
            cfg,
            Overrides {
                search_paths: vec!["b".to_string()],
                ..Overrides::default()
            },
        )
        .unwrap();
        assert_eq!(resolved.search_paths, vec!["b"]);
    }

    #[test]
    fn zero_depth_is_rejected() {
        let cfg = parse_config_toml("[engine]\nmax_variable_depth = 0\n").unwrap();
        let err = resolve_config(cfg, Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("max_variable_depth"));
    }

    #[test]
    fn unknown_category_and_data_type_are_rejected() {
        let cfg = parse_config_toml(
            "[[attributes]]\ncategory = \"planet\"\nattribute_id = \"a\"\nvalues = []\n",
        )
        .unwrap();
        let err = resolve_config(cfg, Overrides::default()).unwrap_err();
        assert!(format!("{err:#}").contains("unknown category: planet"));

        let cfg = parse_config_toml(
            "[[attributes]]\ncategory = \"action\"\nattribute_id = \"a\"\ndata_type = \"urn:nope\"\n",
        )
        .unwrap();
        let err = resolve_config(cfg, Overrides::default()).unwrap_err();
        assert!(format!("{err:#}").contains("unknown data type: urn:nope"));
    }

    #[test]
    fn unparsable_static_value_is_rejected() {
        let cfg = parse_config_toml(
            "[[attributes]]\ncategory = \"action\"\nattribute_id = \"n\"\ndata_type = \"http://www.w3.org/2001/XMLSchema#integer\"\nvalues = [\"many\"]\n",
        )
        .unwrap();
        let err = resolve_config(cfg, Overrides::default()).unwrap_err();
        assert!(format!("{err:#}").contains("not a valid integer"));
    }

    #[test]
    fn foreign_schema_is_rejected() {
        let cfg = parse_config_toml("schema = \"other.config.v1\"\n").unwrap();
        assert!(resolve_config(cfg, Overrides::default()).is_err());
    }
}
