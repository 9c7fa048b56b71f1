use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::research::context::{ResearchContext, ResearchSettings};
use crate::research::engine::ExecutionEngine;
use crate::research::error::ResearchError;
use crate::research::events::{EventKind, PLAN_EVENT_ID, ProgressEvent, ProgressSink};
use crate::research::expand::{expand, expand_follow_up};
use crate::research::gap::{GapFillController, follow_up_directives, should_deepen};
use crate::research::generation::StructuredGenerator;
use crate::research::plan::{PlanBuilder, validate_topic};
use crate::research::prompts::LedgerFormatter;
use crate::research::types::{ResearchDepth, ResearchOutcome, ResultsLedger};
use crate::search::SearchProvider;

/// 推理式研究编排器
///
/// 计划 -> 展开 -> 执行 -> 缺口审查 ->（可选）第二轮 -> 综合，
/// 每个阶段转换都向sink发出进度事件。编排器本身无状态，可被多次调用复用。
pub struct ResearchOrchestrator<G> {
    generator: Arc<G>,
    search: Arc<dyn SearchProvider>,
    settings: ResearchSettings,
}

impl<G: StructuredGenerator> ResearchOrchestrator<G> {
    pub fn new(
        generator: Arc<G>,
        search: Arc<dyn SearchProvider>,
        settings: ResearchSettings,
    ) -> Self {
        Self {
            generator,
            search,
            settings,
        }
    }

    /// 执行一次完整的研究调用
    ///
    /// 成功时最后一个事件总是 `research-progress`；取消时不再发出任何completed事件，
    /// 返回 [`ResearchError::Cancelled`]。
    pub async fn research(
        &self,
        topic: &str,
        depth: ResearchDepth,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<ResearchOutcome, ResearchError> {
        let topic = validate_topic(topic)?;
        let session_id = Uuid::new_v4();
        let span = tracing::info_span!("research", %session_id, topic, %depth);

        self.run(session_id, topic, depth, sink, cancel)
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        session_id: Uuid,
        topic: &str,
        depth: ResearchDepth,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<ResearchOutcome, ResearchError> {
        let ctx = ResearchContext {
            generator: self.generator.as_ref(),
            search: self.search.as_ref(),
            sink,
            cancel,
            settings: &self.settings,
            formatter: LedgerFormatter::new(self.settings.content_truncate_length),
            topic,
            depth,
        };
        ctx.ensure_active()?;

        // 第一轮：计划
        tracing::info!("planning research");
        let plan_title = "Planning research";
        ctx.emit(ProgressEvent::running(PLAN_EVENT_ID, EventKind::Plan, plan_title, topic));

        let current_date = chrono::Utc::now().format("%Y-%m-%d").to_string();
        let planner = PlanBuilder::new(ctx.generator);
        let plan = match ctx.guard(planner.build_plan(topic, &current_date)).await {
            Ok(plan) => plan,
            Err(err) => {
                ctx.report_failure(PLAN_EVENT_ID, EventKind::Plan, plan_title, &err);
                return Err(err);
            }
        };

        let steps = expand(&plan);
        let round_one_steps = steps.total_steps();
        let engine = ExecutionEngine::new(&ctx);
        engine.announce_plan(&plan, &steps);

        // 第一轮：搜索与分析
        tracing::info!(total_steps = round_one_steps, "executing research plan");
        let mut ledger = ResultsLedger::new();
        let findings = engine.run(&steps, &mut ledger).await?;

        // 缺口审查
        let controller = GapFillController::new(&ctx);
        let gap_report = controller.review(&ledger, &findings).await?;

        let (synthesis, total_steps) = if should_deepen(depth, &gap_report) {
            // 第二轮：补缺搜索，然后综合
            let follow_up = expand_follow_up(&follow_up_directives(&gap_report));
            tracing::info!(
                follow_up_steps = follow_up.total_steps(),
                "closing knowledge gaps"
            );
            engine.run(&follow_up, &mut ledger).await?;

            let synthesis = controller.synthesize(&ledger, &gap_report).await?;
            (Some(synthesis), round_one_steps + 2)
        } else {
            (None, round_one_steps + 1)
        };

        ctx.ensure_active()?;
        ctx.emit(ProgressEvent::research_complete(total_steps, total_steps));
        tracing::info!(
            records = ledger.len(),
            results = ledger.item_count(),
            "research complete"
        );

        Ok(ResearchOutcome {
            session_id,
            topic: topic.to_string(),
            depth,
            plan,
            results: ledger.into_records(),
            findings,
            gap_report,
            synthesis,
        })
    }
}
