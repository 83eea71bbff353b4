//! Respond stage: monta o envelope canônico, sempre por último.
//!
//! Precedência: erro de dispatch, depois reprovação de validação, depois
//! resposta do delegado, depois o caminho simples. Este estágio não pode
//! falhar; na pior hipótese degrada para um envelope de erro.

use async_trait::async_trait;
use chrono::Utc;
use clinix_core::{AuditEntry, ExecutionContext, ResponseStatus, Stage};
use serde_json::{json, Value};

const DEFAULT_SUCCESS_MESSAGE: &str = "função executada com sucesso";
const VALIDATION_FAILED_MESSAGE: &str = "saída do processador reprovada na validação";

#[derive(Default)]
pub struct RespondStage;

#[async_trait]
impl Stage<ExecutionContext> for RespondStage {
    fn name(&self) -> &'static str {
        "respond"
    }

    async fn run(&self, mut ctx: ExecutionContext) -> ExecutionContext {
        let (status, message, data) = if let Some(err) = &ctx.processor_error {
            // the dispatch failure is the caller-facing story, not the
            // forced validation verdict it also produced
            (ResponseStatus::Error, err.to_string(), Value::Null)
        } else if ctx.validation_passed == Some(false) {
            (
                ResponseStatus::Error,
                VALIDATION_FAILED_MESSAGE.to_string(),
                json!({ "errors": ctx.validation_errors.clone() }),
            )
        } else if let Some(response) = &ctx.processor_response {
            let data = response
                .get("data")
                .filter(|d| !d.is_null())
                .cloned()
                .unwrap_or_else(|| response.clone());
            let message = response
                .get("message")
                .and_then(|m| m.as_str())
                .filter(|m| !m.is_empty())
                .map(String::from)
                .unwrap_or_else(|| DEFAULT_SUCCESS_MESSAGE.to_string());
            (ResponseStatus::Success, message, data)
        } else {
            (
                ResponseStatus::Success,
                DEFAULT_SUCCESS_MESSAGE.to_string(),
                json!({ "processed": true }),
            )
        };

        let completed_at = Utc::now();
        let elapsed_ms = (completed_at - ctx.created_at).num_milliseconds().max(0) as u64;

        ctx.response_status = Some(status);
        ctx.response_message = Some(message);
        ctx.response_data = Some(data);
        ctx.completed_at = Some(completed_at);
        ctx.elapsed_ms = Some(elapsed_ms);

        ctx.audit.append(
            AuditEntry::new(self.name())
                .with("status", serde_json::to_value(status).unwrap_or_default())
                .with("elapsed_ms", elapsed_ms),
        );
        ctx.push_trace(format!("respond: {:?} em {}ms", status, elapsed_ms));

        tracing::info!(
            run_id = %ctx.run_id,
            function = %ctx.function_name,
            status = ?status,
            elapsed_ms,
            "run finished"
        );
        ctx
    }
}
