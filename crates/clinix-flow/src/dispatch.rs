//! Dispatch stage: entrega a chamada ao sub-processador alvo.
//!
//! Só age quando a classificação é `Complex`; no caminho simples passa
//! direto, sem entrada de auditoria. Toda falha vira `processor_error`
//! normalizado; nada escapa deste estágio como exceção.

use async_trait::async_trait;
use clinix_core::{
    AuditEntry, DispatchError, ExecutionContext, Processor, ProcessorRegistry, ProcessorRequest,
    Stage,
};
use clinix_rules::{ProcessorConfig, RuleStore};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

pub struct DispatchStage {
    rules: Arc<RuleStore>,
    processors: Arc<ProcessorRegistry>,
}

impl DispatchStage {
    pub fn new(rules: Arc<RuleStore>, processors: Arc<ProcessorRegistry>) -> Self {
        Self { rules, processors }
    }

    fn build_request(ctx: &ExecutionContext) -> ProcessorRequest {
        ProcessorRequest {
            function_name: ctx.function_name.clone(),
            arguments: ctx.arguments.clone(),
            subject_id: ctx.subject_id.clone(),
            secondary_id: ctx.secondary_id.clone(),
            actor_id: ctx.actor_id.clone(),
            context: json!({
                "run_id": ctx.run_id,
                "classification": ctx.classification,
                "complexity_score": ctx.complexity_score,
            }),
        }
    }

    /// One bounded attempt against the delegate. The timeout budget comes
    /// from the registry row; dropping the future abandons the call.
    async fn attempt(
        processor: &Arc<dyn Processor>,
        config: &ProcessorConfig,
        name: &str,
        request: ProcessorRequest,
    ) -> Result<clinix_core::ProcessorReply, DispatchError> {
        let budget = Duration::from_secs(config.timeout_seconds);
        match tokio::time::timeout(budget, processor.handle(request)).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(source)) => Err(DispatchError::InvocationFailed(source.to_string())),
            Err(_) => Err(DispatchError::Timeout {
                name: name.to_string(),
                seconds: config.timeout_seconds,
            }),
        }
    }
}

#[async_trait]
impl Stage<ExecutionContext> for DispatchStage {
    fn name(&self) -> &'static str {
        "dispatch"
    }

    async fn run(&self, mut ctx: ExecutionContext) -> ExecutionContext {
        if ctx.classification.map(|c| c.delegates()) != Some(true) {
            ctx.push_trace("dispatch: pulado (sem delegação)".to_string());
            return ctx;
        }

        // invariant: Complex implies a target; an empty one is a
        // configuration defect, reported as such
        let name = ctx.target_processor.clone().unwrap_or_default();
        let tables = self.rules.snapshot();

        let config = match tables.processor(&name) {
            Some(config) => config.clone(),
            None => {
                let err = DispatchError::ProcessorNotConfigured(name.clone());
                ctx.audit.append(
                    AuditEntry::new(self.name())
                        .with("processor", name.clone())
                        .with("success", false)
                        .with("error", err.to_string()),
                );
                ctx.push_trace(format!("dispatch: {}", err));
                ctx.record_dispatch_failure(err);
                return ctx;
            }
        };

        if !config.enabled {
            let err = DispatchError::ProcessorDisabled(name.clone());
            ctx.audit.append(
                AuditEntry::new(self.name())
                    .with("processor", name.clone())
                    .with("success", false)
                    .with("error", err.to_string()),
            );
            ctx.push_trace(format!("dispatch: {}", err));
            ctx.record_dispatch_failure(err);
            return ctx;
        }

        let request = Self::build_request(&ctx);
        ctx.processor_request = serde_json::to_value(&request).ok();

        // entry-point resolution failure is a configuration problem,
        // wrapped as invocation failure and never retried
        let processor = match self.processors.get(&name) {
            Some(processor) => processor,
            None => {
                let err = DispatchError::InvocationFailed(format!(
                    "entry point '{}' is not registered",
                    name
                ));
                ctx.audit.append(
                    AuditEntry::new(self.name())
                        .with("processor", name.clone())
                        .with("success", false)
                        .with("error", err.to_string()),
                );
                ctx.push_trace(format!("dispatch: {}", err));
                ctx.record_dispatch_failure(err);
                return ctx;
            }
        };

        let mut outcome: Result<clinix_core::ProcessorReply, DispatchError> =
            Err(DispatchError::InvocationFailed("not attempted".to_string()));
        for attempt in 1..=config.max_retries + 1 {
            match Self::attempt(&processor, &config, &name, request.clone()).await {
                Ok(mut reply) => {
                    // delegate-internal stage entries were timestamped
                    // during the attempt: absorb them before our own entry
                    // so the trail stays chronological
                    ctx.audit.extend(std::mem::take(&mut reply.audit));
                    ctx.audit.append(
                        AuditEntry::new(self.name())
                            .with("processor", name.clone())
                            .with("success", true)
                            .with("attempt", attempt),
                    );
                    outcome = Ok(reply);
                    break;
                }
                Err(err) => {
                    ctx.audit.append(
                        AuditEntry::new(self.name())
                            .with("processor", name.clone())
                            .with("success", false)
                            .with("attempt", attempt)
                            .with("error", err.to_string()),
                    );
                    tracing::warn!(
                        processor = %name,
                        attempt,
                        error = %err,
                        "delegate attempt failed"
                    );
                    let transient = err.is_transient();
                    outcome = Err(err);
                    if !transient {
                        break;
                    }
                }
            }
        }

        match outcome {
            Ok(reply) => {
                ctx.push_trace(format!("dispatch: {} respondeu", name));
                ctx.record_dispatch_success(json!({
                    "data": reply.data,
                    "message": reply.message,
                    "status": reply.status,
                }));
            }
            Err(err) => {
                ctx.push_trace(format!("dispatch: {}", err));
                ctx.record_dispatch_failure(err);
            }
        }
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinix_core::{Classification, ProcessorReply};
    use clinix_rules::RuleTables;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct StaticProcessor;

    #[async_trait]
    impl Processor for StaticProcessor {
        fn name(&self) -> &'static str {
            "summary_agent"
        }

        async fn handle(&self, _request: ProcessorRequest) -> anyhow::Result<ProcessorReply> {
            Ok(ProcessorReply {
                data: json!({ "summary": "Resumo do paciente." }),
                message: Some("resumo gerado".to_string()),
                status: "ok".to_string(),
                audit: Vec::new(),
            })
        }
    }

    struct FlakyProcessor {
        failures_left: AtomicU32,
    }

    #[async_trait]
    impl Processor for FlakyProcessor {
        fn name(&self) -> &'static str {
            "summary_agent"
        }

        async fn handle(&self, _request: ProcessorRequest) -> anyhow::Result<ProcessorReply> {
            if self.failures_left.fetch_sub(1, Ordering::SeqCst) > 0 {
                anyhow::bail!("transient upstream hiccup");
            }
            Ok(ProcessorReply {
                data: json!({ "summary": "Resumo do paciente." }),
                message: None,
                status: "ok".to_string(),
                audit: Vec::new(),
            })
        }
    }

    struct SleepyProcessor;

    #[async_trait]
    impl Processor for SleepyProcessor {
        fn name(&self) -> &'static str {
            "summary_agent"
        }

        async fn handle(&self, _request: ProcessorRequest) -> anyhow::Result<ProcessorReply> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            unreachable!("the dispatcher must cut this off");
        }
    }

    fn complex_ctx() -> ExecutionContext {
        let mut ctx =
            ExecutionContext::new("generate_summary", HashMap::new(), "pat-1", "dr-9", None);
        ctx.classification = Some(Classification::Complex);
        ctx.target_processor = Some("summary_agent".to_string());
        ctx
    }

    fn stage_with(
        tables: RuleTables,
        processor: Option<Arc<dyn Processor>>,
    ) -> DispatchStage {
        let mut registry = ProcessorRegistry::new();
        if let Some(processor) = processor {
            registry.register(processor);
        }
        DispatchStage::new(Arc::new(RuleStore::new(tables)), Arc::new(registry))
    }

    #[tokio::test]
    async fn test_simple_path_appends_no_dispatch_entry() {
        let stage = stage_with(RuleTables::builtin(), Some(Arc::new(StaticProcessor)));
        let mut ctx = ExecutionContext::new("add_allergy", HashMap::new(), "pat-1", "dr-9", None);
        ctx.classification = Some(Classification::Simple);

        let ctx = stage.run(ctx).await;
        assert!(ctx.audit.for_stage("dispatch").is_empty());
        assert!(ctx.processor_error.is_none());
        assert!(ctx.processor_response.is_none());
    }

    #[tokio::test]
    async fn test_successful_dispatch_stores_the_raw_reply() {
        let stage = stage_with(RuleTables::builtin(), Some(Arc::new(StaticProcessor)));
        let ctx = stage.run(complex_ctx()).await;

        assert!(ctx.processor_error.is_none());
        let response = ctx.processor_response.unwrap();
        assert_eq!(response["data"]["summary"], json!("Resumo do paciente."));

        let entries = ctx.audit.for_stage("dispatch");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].details["success"], json!(true));
        assert_eq!(entries[0].details["processor"], json!("summary_agent"));
    }

    #[tokio::test]
    async fn test_disabled_processor_fails_without_retry() {
        let mut tables = RuleTables::builtin();
        tables.processors.get_mut("summary_agent").unwrap().enabled = false;
        let stage = stage_with(tables, Some(Arc::new(StaticProcessor)));

        let ctx = stage.run(complex_ctx()).await;
        assert_eq!(
            ctx.processor_error,
            Some(DispatchError::ProcessorDisabled("summary_agent".into()))
        );
        let entries = ctx.audit.for_stage("dispatch");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].details["success"], json!(false));
    }

    #[tokio::test]
    async fn test_unconfigured_processor_is_reported() {
        let mut tables = RuleTables::builtin();
        tables.processors.remove("summary_agent");
        let stage = stage_with(tables, Some(Arc::new(StaticProcessor)));

        let ctx = stage.run(complex_ctx()).await;
        assert_eq!(
            ctx.processor_error,
            Some(DispatchError::ProcessorNotConfigured("summary_agent".into()))
        );
    }

    #[tokio::test]
    async fn test_missing_entry_point_is_an_invocation_failure() {
        let stage = stage_with(RuleTables::builtin(), None);
        let ctx = stage.run(complex_ctx()).await;

        match ctx.processor_error {
            Some(DispatchError::InvocationFailed(msg)) => {
                assert!(msg.contains("not registered"))
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        // resolution failure is configuration, a single audit entry
        assert_eq!(ctx.audit.for_stage("dispatch").len(), 1);
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried_within_budget() {
        let processor = Arc::new(FlakyProcessor {
            failures_left: AtomicU32::new(2),
        });
        // builtin summary_agent allows max_retries = 2, so 3 attempts
        let stage = stage_with(RuleTables::builtin(), Some(processor));
        let ctx = stage.run(complex_ctx()).await;

        assert!(ctx.processor_error.is_none());
        let entries = ctx.audit.for_stage("dispatch");
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].details["success"], json!(false));
        assert_eq!(entries[2].details["success"], json!(true));
        assert_eq!(entries[2].details["attempt"], json!(3));
    }

    #[tokio::test]
    async fn test_retry_budget_exhaustion_keeps_the_last_error() {
        let processor = Arc::new(FlakyProcessor {
            failures_left: AtomicU32::new(10),
        });
        let stage = stage_with(RuleTables::builtin(), Some(processor));
        let ctx = stage.run(complex_ctx()).await;

        match ctx.processor_error {
            Some(DispatchError::InvocationFailed(msg)) => assert!(msg.contains("hiccup")),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(ctx.audit.for_stage("dispatch").len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_budget_is_enforced() {
        let stage = stage_with(RuleTables::builtin(), Some(Arc::new(SleepyProcessor)));
        let ctx = stage.run(complex_ctx()).await;

        assert_eq!(
            ctx.processor_error,
            Some(DispatchError::Timeout {
                name: "summary_agent".to_string(),
                seconds: 30,
            })
        );
        // timeout is transient: all attempts were burned
        assert_eq!(ctx.audit.for_stage("dispatch").len(), 3);
    }
}
