//! 研究计划生成

use crate::research::error::ResearchError;
use crate::research::generation::{GenerationError, GenerationTask, StructuredGenerator};
use crate::research::prompts::{PlanPromptContext, plan_request};
use crate::research::types::ResearchPlan;

/// 校验研究主题，返回去除首尾空白后的主题
pub fn validate_topic(topic: &str) -> Result<&str, ResearchError> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(ResearchError::InvalidInput(
            "research topic must not be empty".to_string(),
        ));
    }
    Ok(topic)
}

/// 研究计划生成器
pub struct PlanBuilder<'a, G> {
    generator: &'a G,
}

impl<'a, G: StructuredGenerator> PlanBuilder<'a, G> {
    pub fn new(generator: &'a G) -> Self {
        Self { generator }
    }

    /// 一次结构化生成调用产出计划，失败不在本地重试
    pub async fn build_plan(
        &self,
        topic: &str,
        current_date: &str,
    ) -> Result<ResearchPlan, ResearchError> {
        let request = plan_request(&PlanPromptContext {
            topic,
            current_date,
        });

        let mut plan: ResearchPlan = self
            .generator
            .generate(request)
            .await
            .map_err(ResearchError::PlanGeneration)?;

        plan.search_directives
            .retain(|directive| !directive.query.trim().is_empty());
        let plan = plan.normalized();

        if plan.search_directives.is_empty() {
            return Err(ResearchError::PlanGeneration(GenerationError::Rejected {
                task: GenerationTask::Plan,
                reason: "the plan contains no search directives".to_string(),
            }));
        }

        tracing::debug!(
            search_directives = plan.search_directives.len(),
            analysis_directives = plan.analysis_directives.len(),
            "research plan generated"
        );
        Ok(plan)
    }
}
