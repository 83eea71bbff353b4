//! Summary delegate: gera o resumo clínico de um paciente.
//!
//! Mesmo formato de pipeline do orquestrador, com contexto próprio:
//! fetch (persistência) → compose (modelo de linguagem) → format.
//! O estágio de fetch é pulado quando o material vem inline na chamada;
//! o pulo entra na auditoria interna, devolvida na resposta.

use crate::collaborators::{LanguageModel, RecordStore};
use async_trait::async_trait;
use clinix_core::{AuditEntry, AuditTrail, PipelineRunner, Processor, ProcessorReply, ProcessorRequest, Stage};
use serde_json::{json, Value};
use std::sync::Arc;

/// Context threaded through the delegate's internal stages.
struct SummaryContext {
    request: ProcessorRequest,
    patient: Option<Value>,
    appointments: Vec<Value>,
    draft: Option<String>,
    reply: Option<ProcessorReply>,
    error: Option<String>,
    audit: AuditTrail,
}

impl SummaryContext {
    fn new(request: ProcessorRequest) -> Self {
        Self {
            request,
            patient: None,
            appointments: Vec::new(),
            draft: None,
            reply: None,
            error: None,
            audit: AuditTrail::new(),
        }
    }

    fn inline_content(&self) -> Option<&str> {
        self.request.arguments.get("content").and_then(|v| v.as_str())
    }
}

struct FetchStage {
    store: Arc<dyn RecordStore>,
}

#[async_trait]
impl Stage<SummaryContext> for FetchStage {
    fn name(&self) -> &'static str {
        "summary.fetch"
    }

    async fn run(&self, mut ctx: SummaryContext) -> SummaryContext {
        if ctx.inline_content().is_some() {
            ctx.audit.append(
                AuditEntry::new(self.name())
                    .with("skipped", true)
                    .with("reason", "material inline na chamada"),
            );
            return ctx;
        }

        let patient_id = ctx.request.subject_id.clone();
        match self.store.patient(&patient_id).await {
            Ok(patient) => ctx.patient = patient,
            Err(err) => {
                ctx.error = Some(format!("falha ao buscar paciente: {}", err));
            }
        }
        if ctx.error.is_none() {
            match self.store.appointments(&patient_id).await {
                Ok(appointments) => ctx.appointments = appointments,
                Err(err) => {
                    ctx.error = Some(format!("falha ao buscar consultas: {}", err));
                }
            }
        }
        if ctx.error.is_none() && ctx.patient.is_none() {
            ctx.error = Some(format!("paciente '{}' não encontrado", patient_id));
        }

        ctx.audit.append(
            AuditEntry::new(self.name())
                .with("success", ctx.error.is_none())
                .with("appointments", ctx.appointments.len()),
        );
        ctx
    }
}

struct ComposeStage {
    model: Arc<dyn LanguageModel>,
}

#[async_trait]
impl Stage<SummaryContext> for ComposeStage {
    fn name(&self) -> &'static str {
        "summary.compose"
    }

    async fn run(&self, mut ctx: SummaryContext) -> SummaryContext {
        if ctx.error.is_some() {
            ctx.audit.append(
                AuditEntry::new(self.name())
                    .with("skipped", true)
                    .with("reason", "erro no estágio anterior"),
            );
            return ctx;
        }

        let material = match ctx.inline_content() {
            Some(content) => content.to_string(),
            None => format!(
                "Paciente: {}\nConsultas registradas: {}",
                ctx.patient.clone().unwrap_or(Value::Null),
                ctx.appointments.len()
            ),
        };
        let prompt = format!(
            "Gerar o resumo clínico do paciente {}.\n{}",
            ctx.request.subject_id, material
        );

        match self.model.complete(&prompt).await {
            Ok(draft) => ctx.draft = Some(draft),
            Err(err) => ctx.error = Some(format!("falha do modelo: {}", err)),
        }

        ctx.audit
            .append(AuditEntry::new(self.name()).with("success", ctx.error.is_none()));
        ctx
    }
}

#[derive(Default)]
struct FormatStage;

#[async_trait]
impl Stage<SummaryContext> for FormatStage {
    fn name(&self) -> &'static str {
        "summary.format"
    }

    async fn run(&self, mut ctx: SummaryContext) -> SummaryContext {
        if ctx.error.is_some() {
            ctx.audit.append(
                AuditEntry::new(self.name())
                    .with("skipped", true)
                    .with("reason", "erro no estágio anterior"),
            );
            return ctx;
        }

        ctx.audit.append(AuditEntry::new(self.name()).with("success", true));
        let reply = ProcessorReply {
            data: json!({
                "summary": ctx.draft.clone().unwrap_or_default(),
                "patient_id": ctx.request.subject_id,
                "appointments_considered": ctx.appointments.len(),
            }),
            message: Some("resumo gerado".to_string()),
            status: "ok".to_string(),
            audit: Vec::new(), // filled by handle() with the full trail
        };
        ctx.reply = Some(reply);
        ctx
    }
}

pub struct SummaryProcessor {
    pipeline: PipelineRunner<SummaryContext>,
}

impl SummaryProcessor {
    pub fn new(store: Arc<dyn RecordStore>, model: Arc<dyn LanguageModel>) -> Self {
        let stages: Vec<Box<dyn Stage<SummaryContext>>> = vec![
            Box::new(FetchStage { store }),
            Box::new(ComposeStage { model }),
            Box::new(FormatStage),
        ];
        Self {
            pipeline: PipelineRunner::new(stages),
        }
    }
}

#[async_trait]
impl Processor for SummaryProcessor {
    fn name(&self) -> &'static str {
        "summary_agent"
    }

    async fn handle(&self, request: ProcessorRequest) -> anyhow::Result<ProcessorReply> {
        let ctx = self.pipeline.run(SummaryContext::new(request)).await;
        if let Some(error) = ctx.error {
            anyhow::bail!(error);
        }
        let mut reply = ctx
            .reply
            .ok_or_else(|| anyhow::anyhow!("pipeline interno não produziu resposta"))?;
        reply.audit = ctx.audit.into_entries();
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{MemoryRecordStore, TemplateModel};
    use std::collections::HashMap;

    fn request(subject: &str, arguments: HashMap<String, Value>) -> ProcessorRequest {
        ProcessorRequest {
            function_name: "generate_summary".to_string(),
            arguments,
            subject_id: subject.to_string(),
            secondary_id: None,
            actor_id: "dr-9".to_string(),
            context: Value::Null,
        }
    }

    fn processor_with_patient() -> SummaryProcessor {
        let store = MemoryRecordStore::new()
            .with_patient("pat-1", json!({ "name": "Ana", "age": 44 }))
            .with_appointment("pat-1", json!({ "date": "2026-08-01", "kind": "rotina" }));
        SummaryProcessor::new(Arc::new(store), Arc::new(TemplateModel))
    }

    #[tokio::test]
    async fn test_summary_covers_the_fetched_records() {
        let reply = processor_with_patient()
            .handle(request("pat-1", HashMap::new()))
            .await
            .unwrap();

        assert_eq!(reply.status, "ok");
        assert_eq!(reply.data["patient_id"], json!("pat-1"));
        assert_eq!(reply.data["appointments_considered"], json!(1));
        assert!(reply.data["summary"].as_str().unwrap().contains("Resumo"));
    }

    #[tokio::test]
    async fn test_internal_trail_has_one_entry_per_stage() {
        let reply = processor_with_patient()
            .handle(request("pat-1", HashMap::new()))
            .await
            .unwrap();

        let stages: Vec<&str> = reply.audit.iter().map(|e| e.stage.as_str()).collect();
        assert_eq!(
            stages,
            vec!["summary.fetch", "summary.compose", "summary.format"]
        );
    }

    #[tokio::test]
    async fn test_inline_content_skips_the_fetch_stage_with_a_marker() {
        let mut arguments = HashMap::new();
        arguments.insert("content".to_string(), json!("Paciente em pós-operatório."));

        let reply = processor_with_patient()
            .handle(request("pat-2", arguments))
            .await
            .unwrap();

        let fetch = &reply.audit[0];
        assert_eq!(fetch.stage, "summary.fetch");
        assert_eq!(fetch.details["skipped"], json!(true));
        assert!(reply.data["summary"]
            .as_str()
            .unwrap()
            .contains("pós-operatório"));
    }

    #[tokio::test]
    async fn test_unknown_patient_raises_and_later_stages_do_not_act() {
        let err = processor_with_patient()
            .handle(request("pat-404", HashMap::new()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("pat-404"));
    }
}
