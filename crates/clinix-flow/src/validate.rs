//! Validate stage: aplica as regras da função à saída do processador.
//!
//! Acumula todas as violações, nunca para na primeira. Com erro de
//! dispatch a validação é forçada a reprovar; sem delegação ela é pulada
//! e conta como aprovada.

use async_trait::async_trait;
use clinix_core::{AuditEntry, ExecutionContext, Stage};
use clinix_rules::{RuleStore, ValidationRules};
use serde_json::Value;
use std::sync::Arc;

/// Credential-like tokens rejected in every delegate output regardless of
/// per-function configuration.
const BASELINE_FORBIDDEN: &[&str] = &["senha", "password", "api_key", "secret_key", "bearer "];

pub struct ValidateStage {
    rules: Arc<RuleStore>,
}

impl ValidateStage {
    pub fn new(rules: Arc<RuleStore>) -> Self {
        Self { rules }
    }

    /// Serialized textual content of a delegate reply: the `data` field
    /// when it is a string, its compact JSON otherwise.
    fn content_of(response: &Value) -> String {
        match response.get("data") {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Null) | None => response.to_string(),
            Some(other) => other.to_string(),
        }
    }

    fn check(content: &str, rules: &ValidationRules) -> Vec<String> {
        let mut errors = Vec::new();
        let length = content.chars().count();
        let lowered = content.to_lowercase();

        if let Some(min) = rules.min_length {
            if length < min {
                errors.push(format!(
                    "conteúdo com {} caracteres, abaixo do mínimo {}",
                    length, min
                ));
            }
        }

        if let Some(max) = rules.max_length {
            if length > max {
                errors.push(format!(
                    "conteúdo com {} caracteres, acima do máximo {}",
                    length, max
                ));
            }
        }

        for section in &rules.required_sections {
            if !lowered.contains(&section.to_lowercase()) {
                errors.push(format!("seção obrigatória ausente: {}", section));
            }
        }

        let mut forbidden: Vec<String> = rules
            .forbidden_keywords
            .iter()
            .map(|k| k.to_lowercase())
            .collect();
        for baseline in BASELINE_FORBIDDEN {
            if !forbidden.iter().any(|k| k == baseline) {
                forbidden.push(baseline.to_string());
            }
        }
        for keyword in &forbidden {
            if lowered.contains(keyword) {
                errors.push(format!("palavra proibida encontrada: {}", keyword));
            }
        }

        errors
    }
}

#[async_trait]
impl Stage<ExecutionContext> for ValidateStage {
    fn name(&self) -> &'static str {
        "validate"
    }

    async fn run(&self, mut ctx: ExecutionContext) -> ExecutionContext {
        // dispatch failed: there is no output to inspect, the run is
        // failed with the processor error as the sole reason
        if let Some(err) = ctx.processor_error.clone() {
            ctx.validation_passed = Some(false);
            ctx.validation_errors = vec![err.to_string()];
            let errors = ctx.validation_errors.clone();
            ctx.audit.append(
                AuditEntry::new(self.name())
                    .with("passed", false)
                    .with("forced", true)
                    .with("errors", errors),
            );
            ctx.push_trace("validate: reprovado (erro de dispatch)".to_string());
            return ctx;
        }

        // no delegation happened: nothing to validate, counts as passed
        let response = match &ctx.processor_response {
            Some(response) => response.clone(),
            None => {
                ctx.validation_passed = Some(true);
                ctx.audit.append(
                    AuditEntry::new(self.name())
                        .with("passed", true)
                        .with("skipped", true),
                );
                ctx.push_trace("validate: pulado (sem delegação)".to_string());
                return ctx;
            }
        };

        let tables = self.rules.snapshot();
        let empty = ValidationRules::default();
        let rules = tables.rules_for(&ctx.function_name).unwrap_or(&empty);

        let content = Self::content_of(&response);
        let errors = Self::check(&content, rules);
        let passed = errors.is_empty();

        ctx.validation_passed = Some(passed);
        ctx.validation_errors = errors.clone();
        ctx.audit.append(
            AuditEntry::new(self.name())
                .with("passed", passed)
                .with("errors", errors),
        );
        ctx.push_trace(format!(
            "validate: {}",
            if passed { "aprovado" } else { "reprovado" }
        ));
        ctx
    }
}
