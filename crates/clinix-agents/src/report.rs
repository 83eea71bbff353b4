//! Report delegate: relatório de atendimentos de um paciente.

use crate::collaborators::RecordStore;
use async_trait::async_trait;
use clinix_core::{Processor, ProcessorReply, ProcessorRequest};
use serde_json::json;
use std::sync::Arc;

pub struct ReportProcessor {
    store: Arc<dyn RecordStore>,
}

impl ReportProcessor {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Processor for ReportProcessor {
    fn name(&self) -> &'static str {
        "report_agent"
    }

    async fn handle(&self, request: ProcessorRequest) -> anyhow::Result<ProcessorReply> {
        let appointments = self.store.appointments(&request.subject_id).await?;
        let period = request
            .arguments
            .get("period")
            .and_then(|v| v.as_str())
            .unwrap_or("completo");

        let mut text = format!(
            "Relatório de atendimentos do paciente {}.\nPeríodo: {}.\nTotal de consultas: {}.\n",
            request.subject_id,
            period,
            appointments.len()
        );
        for appointment in &appointments {
            text.push_str(&format!("- {}\n", appointment));
        }

        Ok(ProcessorReply {
            data: json!({ "report": text, "patient_id": request.subject_id }),
            message: Some("relatório gerado".to_string()),
            status: "ok".to_string(),
            audit: Vec::new(),
        })
    }
}
