//! Loading das tabelas: YAML + overrides de ambiente.

use crate::tables::RuleTables;
use clinix_core::ClinixError;

/// Env var pointing at a rules YAML file.
pub const RULES_PATH_VAR: &str = "CLINIX_RULES";

/// Parse a full rule-table document from YAML.
pub fn from_yaml(yaml: &str) -> Result<RuleTables, ClinixError> {
    serde_yaml::from_str(yaml).map_err(|e| ClinixError::Config(e.to_string()))
}

/// Load the tables for this process: the `CLINIX_RULES` file when set,
/// otherwise the builtin clinic defaults; then apply per-processor
/// `CLINIX_PROCESSOR_<NAME>_ENABLED` overrides.
pub fn load() -> Result<RuleTables, ClinixError> {
    let mut tables = match std::env::var(RULES_PATH_VAR) {
        Ok(path) => {
            let raw = std::fs::read_to_string(&path)
                .map_err(|e| ClinixError::Config(format!("{}: {}", path, e)))?;
            tracing::info!(%path, "rule tables loaded from file");
            from_yaml(&raw)?
        }
        Err(_) => RuleTables::builtin(),
    };
    apply_env_overrides(&mut tables);
    Ok(tables)
}

/// `CLINIX_PROCESSOR_SUMMARY_AGENT_ENABLED=false` flips the flag of
/// `summary_agent` at load time.
fn apply_env_overrides(tables: &mut RuleTables) {
    for (name, config) in tables.processors.iter_mut() {
        let var = format!("CLINIX_PROCESSOR_{}_ENABLED", name.to_uppercase());
        if let Ok(raw) = std::env::var(&var) {
            match raw.to_lowercase().as_str() {
                "true" | "1" | "yes" => config.enabled = true,
                "false" | "0" | "no" => config.enabled = false,
                other => {
                    tracing::warn!(%var, value = other, "ignoring unparseable enabled override")
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
simple_functions:
  - add_allergy
  - get_patient
complex_functions:
  generate_summary:
    processor: summary_agent
    requires_subject: true
validation_rules:
  generate_summary:
    min_length: 50
    max_length: 2000
    required_sections: [resumo]
    forbidden_keywords: [lorem ipsum]
processors:
  summary_agent:
    display_name: Gerador de Resumos
    enabled: true
    timeout_seconds: 30
    max_retries: 2
"#;

    #[test]
    fn test_yaml_roundtrip() {
        let tables = from_yaml(SAMPLE).unwrap();
        assert!(tables.is_simple("add_allergy"));
        assert_eq!(
            tables.route_for("generate_summary").unwrap().processor,
            "summary_agent"
        );
        assert_eq!(
            tables.rules_for("generate_summary").unwrap().min_length,
            Some(50)
        );
        assert_eq!(tables.processor("summary_agent").unwrap().max_retries, 2);
    }

    #[test]
    fn test_invalid_yaml_is_a_config_error() {
        let err = from_yaml("simple_functions: 42").unwrap_err();
        assert!(err.to_string().starts_with("CONFIG/"));
    }

    #[test]
    fn test_env_override_disables_a_processor() {
        let mut tables = RuleTables::builtin();
        std::env::set_var("CLINIX_PROCESSOR_REPORT_AGENT_ENABLED", "false");
        apply_env_overrides(&mut tables);
        std::env::remove_var("CLINIX_PROCESSOR_REPORT_AGENT_ENABLED");
        assert!(!tables.processor("report_agent").unwrap().enabled);
    }
}
