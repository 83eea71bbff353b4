//! Conversation delegate: resposta de acompanhamento ao paciente.

use crate::collaborators::LanguageModel;
use async_trait::async_trait;
use clinix_core::{Processor, ProcessorReply, ProcessorRequest};
use serde_json::json;
use std::sync::Arc;

pub struct ConversationProcessor {
    model: Arc<dyn LanguageModel>,
}

impl ConversationProcessor {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Processor for ConversationProcessor {
    fn name(&self) -> &'static str {
        "conversation_agent"
    }

    async fn handle(&self, request: ProcessorRequest) -> anyhow::Result<ProcessorReply> {
        let message = request
            .arguments
            .get("message")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("argumento 'message' ausente"))?;

        let prompt = format!(
            "Responder a mensagem de acompanhamento do paciente {}: {}",
            request.subject_id, message
        );
        let text = self.model.complete(&prompt).await?;

        Ok(ProcessorReply {
            data: json!(text),
            message: Some("resposta de acompanhamento gerada".to_string()),
            status: "ok".to_string(),
            audit: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::TemplateModel;
    use std::collections::HashMap;

    fn request(arguments: HashMap<String, serde_json::Value>) -> ProcessorRequest {
        ProcessorRequest {
            function_name: "chat_followup".to_string(),
            arguments,
            subject_id: "pat-1".to_string(),
            secondary_id: Some("apt-7".to_string()),
            actor_id: "pat-1".to_string(),
            context: serde_json::Value::Null,
        }
    }

    #[tokio::test]
    async fn test_reply_quotes_the_incoming_message() {
        let mut arguments = HashMap::new();
        arguments.insert("message".to_string(), json!("Posso retirar o curativo?"));

        let processor = ConversationProcessor::new(Arc::new(TemplateModel));
        let reply = processor.handle(request(arguments)).await.unwrap();
        assert!(reply.data.as_str().unwrap().contains("curativo"));
    }

    #[tokio::test]
    async fn test_missing_message_argument_raises() {
        let processor = ConversationProcessor::new(Arc::new(TemplateModel));
        let err = processor.handle(request(HashMap::new())).await.unwrap_err();
        assert!(err.to_string().contains("message"));
    }
}
