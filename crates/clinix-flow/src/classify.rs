//! Classify stage: função → veredito de complexidade.
//!
//! Lookup na tabela de funções simples, depois no mapeamento complexo;
//! função desconhecida vira o default permissivo `Unknown` (tratado como
//! simples). Classificação nunca falha.

use async_trait::async_trait;
use clinix_core::{AuditEntry, Classification, ExecutionContext, Stage};
use clinix_rules::RuleStore;
use std::sync::Arc;

const SCORE_SIMPLE: f64 = 0.2;
const SCORE_COMPLEX: f64 = 0.8;
const SCORE_UNKNOWN: f64 = 0.5;

pub struct ClassifyStage {
    rules: Arc<RuleStore>,
}

impl ClassifyStage {
    pub fn new(rules: Arc<RuleStore>) -> Self {
        Self { rules }
    }
}

#[async_trait]
impl Stage<ExecutionContext> for ClassifyStage {
    fn name(&self) -> &'static str {
        "classify"
    }

    async fn run(&self, mut ctx: ExecutionContext) -> ExecutionContext {
        let tables = self.rules.snapshot();

        let mut requires = None;
        let (classification, score, target, known) = if tables.is_simple(&ctx.function_name) {
            (Classification::Simple, SCORE_SIMPLE, None, true)
        } else if let Some(route) = tables.route_for(&ctx.function_name) {
            requires = Some((route.requires_subject, route.requires_secondary));
            (
                Classification::Complex,
                SCORE_COMPLEX,
                Some(route.processor.clone()),
                true,
            )
        } else {
            tracing::info!(
                function = %ctx.function_name,
                "unknown function, taking the permissive simple path"
            );
            (Classification::Unknown, SCORE_UNKNOWN, None, false)
        };

        ctx.classification = Some(classification);
        ctx.complexity_score = score;
        ctx.target_processor = target.clone();

        let mut entry = AuditEntry::new(self.name())
            .with("classification", serde_json::to_value(classification).unwrap_or_default())
            .with("complexity_score", score)
            .with("known", known);
        if let Some(processor) = &target {
            entry = entry.with("target_processor", processor.clone());
        }
        if let Some((subject, secondary)) = requires {
            entry = entry
                .with("requires_subject", subject)
                .with("requires_secondary", secondary);
        }
        ctx.audit.append(entry);

        ctx.push_trace(format!(
            "classify: {} → {:?} (score {:.1})",
            ctx.function_name, classification, score
        ));
        ctx
    }
}
