//! Pipeline Runner: encadeia estágios em ordem, um contexto por execução.

use crate::stage::Stage;
use std::time::Instant;

pub struct PipelineRunner<C: Send + 'static> {
    stages: Vec<Box<dyn Stage<C>>>,
    pipeline_id: String,
}

impl<C: Send + 'static> PipelineRunner<C> {
    pub fn new(stages: Vec<Box<dyn Stage<C>>>) -> Self {
        let pipeline_id = stages
            .iter()
            .map(|s| s.name())
            .collect::<Vec<_>>()
            .join("→");

        Self { stages, pipeline_id }
    }

    /// Run every stage in order. There is no early exit: the terminal
    /// stage is guaranteed to see the context no matter what happened
    /// upstream.
    pub async fn run(&self, mut ctx: C) -> C {
        for stage in &self.stages {
            let start = Instant::now();
            ctx = stage.run(ctx).await;
            tracing::debug!(
                stage = stage.name(),
                latency_ms = start.elapsed().as_millis() as u64,
                "stage finished"
            );
        }
        ctx
    }

    pub fn pipeline_id(&self) -> &str {
        &self.pipeline_id
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}
