//! 执行引擎 - 顺序执行搜索步骤与分析步骤，累积结果账本

use std::collections::HashSet;

use serde_json::json;

use crate::research::context::{ResearchContext, ResearchSettings};
use crate::research::error::{MalformedResultError, ResearchError};
use crate::research::events::{EventKind, PLAN_EVENT_ID, ProgressEvent};
use crate::research::generation::StructuredGenerator;
use crate::research::prompts::{AnalysisPromptContext, analysis_request};
use crate::research::types::{
    AnalysisFinding, AnalysisStep, ExpandedSteps, ResearchPlan, ResultItem, ResultRecord,
    ResultsLedger, SearchStep, SourceType,
};
use crate::search::{ProviderError, social_post_id};

/// 计算单个搜索步骤的结果条数上限
///
/// 网页与学术搜索：优先级越高（数值越小）取得越多，`6 - priority` 再钳制到配置范围；
/// 社交搜索直接使用优先级。
pub fn result_cap(source_type: SourceType, priority: u8, settings: &ResearchSettings) -> usize {
    let max = settings.max_results_per_step.max(1);
    match source_type {
        SourceType::Web | SourceType::Academic => 6usize
            .saturating_sub(priority as usize)
            .max(settings.min_results_per_step)
            .min(max),
        SourceType::Social => (priority as usize).clamp(1, max),
    }
}

/// 整理搜索返回：网页按URL去重，社交结果补齐帖子id，无法识别的直接丢弃
pub fn sanitize_items(step: &SearchStep, items: Vec<ResultItem>, cap: usize) -> Vec<ResultItem> {
    let mut seen_urls = HashSet::new();
    let mut sanitized = Vec::with_capacity(items.len());

    for mut item in items {
        match step.source_type {
            SourceType::Web => {
                if !seen_urls.insert(item.url.clone()) {
                    continue;
                }
            }
            SourceType::Social => {
                if item.tweet_id.is_none() {
                    item.tweet_id = social_post_id(&item.url);
                }
                if item.tweet_id.is_none() {
                    let err = MalformedResultError {
                        step_id: step.id.clone(),
                        url: item.url.clone(),
                        missing: "post id",
                    };
                    tracing::debug!("dropping social result: {}", err);
                    continue;
                }
            }
            SourceType::Academic => {}
        }
        sanitized.push(item);
    }

    sanitized.truncate(cap);
    sanitized
}

fn search_title(source_type: SourceType) -> &'static str {
    match source_type {
        SourceType::Web => "Searching the web",
        SourceType::Academic => "Searching academic papers",
        SourceType::Social => "Searching social posts",
    }
}

/// 执行引擎，借用单次调用的上下文
pub struct ExecutionEngine<'r, G> {
    ctx: &'r ResearchContext<'r, G>,
}

impl<'r, G: StructuredGenerator> ExecutionEngine<'r, G> {
    pub fn new(ctx: &'r ResearchContext<'r, G>) -> Self {
        Self { ctx }
    }

    /// 发布计划完成事件，携带第一轮的总步数
    pub fn announce_plan(&self, plan: &ResearchPlan, steps: &ExpandedSteps) {
        let total_steps = steps.total_steps();
        self.ctx.emit(
            ProgressEvent::completed(
                PLAN_EVENT_ID,
                EventKind::Plan,
                "Research plan ready",
                format!(
                    "Planned {} search steps and {} analysis steps",
                    steps.search_steps.len(),
                    steps.analysis_steps.len()
                ),
            )
            .with_payload(json!({
                "plan": serde_json::to_value(plan).unwrap_or_default(),
                "totalSteps": total_steps,
            })),
        );
    }

    /// 按顺序执行一轮的全部步骤：先搜索，再分析
    pub async fn run(
        &self,
        steps: &ExpandedSteps,
        ledger: &mut ResultsLedger,
    ) -> Result<Vec<AnalysisFinding>, ResearchError> {
        self.run_searches(&steps.search_steps, ledger).await?;
        self.run_analyses(&steps.analysis_steps, ledger).await
    }

    pub async fn run_searches(
        &self,
        steps: &[SearchStep],
        ledger: &mut ResultsLedger,
    ) -> Result<(), ResearchError> {
        for step in steps {
            let record = self.run_search_step(step).await?;
            ledger.append(record);
        }
        Ok(())
    }

    pub async fn run_analyses(
        &self,
        steps: &[AnalysisStep],
        ledger: &ResultsLedger,
    ) -> Result<Vec<AnalysisFinding>, ResearchError> {
        let mut findings = Vec::with_capacity(steps.len());
        for step in steps {
            findings.push(self.run_analysis_step(step, ledger).await?);
        }
        Ok(findings)
    }

    async fn run_search_step(&self, step: &SearchStep) -> Result<ResultRecord, ResearchError> {
        let ctx = self.ctx;
        ctx.ensure_active()?;

        let kind = step.source_type.event_kind();
        let cap = result_cap(step.source_type, step.directive.priority, ctx.settings);
        let query = step.directive.query.as_str();

        ctx.emit(
            ProgressEvent::running(&step.id, kind, search_title(step.source_type), query)
                .with_payload(json!({
                    "query": query,
                    "sourceType": step.source_type,
                    "maxResults": cap,
                })),
        );
        tracing::debug!(step_id = %step.id, max_results = cap, "search step started");

        let outcome = ctx
            .guard(async {
                self.dispatch(step.source_type, query, cap)
                    .await
                    .map_err(|cause| ResearchError::SearchStep {
                        step_id: step.id.clone(),
                        cause,
                    })
            })
            .await;

        let items = match outcome {
            Ok(items) => items,
            Err(err) => {
                ctx.report_failure(&step.id, kind, search_title(step.source_type), &err);
                return Err(err);
            }
        };

        let items = sanitize_items(step, items, cap);
        ctx.emit(
            ProgressEvent::completed(
                &step.id,
                kind,
                search_title(step.source_type),
                format!("Found {} results for \"{}\"", items.len(), query),
            )
            .with_payload(json!({
                "query": query,
                "sourceType": step.source_type,
                "items": serde_json::to_value(&items).unwrap_or_default(),
            })),
        );
        tracing::debug!(step_id = %step.id, results = items.len(), "search step completed");

        Ok(ResultRecord {
            step_id: step.id.clone(),
            source_type: step.source_type,
            directive: step.directive.clone(),
            items,
        })
    }

    /// 按来源类型分发，单次调用受超时约束
    async fn dispatch(
        &self,
        source_type: SourceType,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<ResultItem>, ProviderError> {
        let search = self.ctx.search;
        let call = match source_type {
            SourceType::Web => search.search_web(query, self.ctx.depth, max_results),
            SourceType::Academic => search.search_academic(query, max_results),
            SourceType::Social => search.search_social(query, max_results),
        };

        let timeout = self.ctx.settings.provider_timeout;
        match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::new(
                source_type,
                format!("timed out after {:?}", timeout),
            )),
        }
    }

    async fn run_analysis_step(
        &self,
        step: &AnalysisStep,
        ledger: &ResultsLedger,
    ) -> Result<AnalysisFinding, ResearchError> {
        let ctx = self.ctx;
        ctx.ensure_active()?;

        let title = format!("Analyzing: {}", step.directive.analysis_type);
        ctx.emit(
            ProgressEvent::running(&step.id, EventKind::Analysis, &title, &step.directive.description)
                .with_payload(json!({
                    "type": step.directive.analysis_type,
                    "importance": step.directive.importance,
                })),
        );

        let request = analysis_request(&AnalysisPromptContext {
            topic: ctx.topic,
            directive: &step.directive,
            ledger,
            formatter: &ctx.formatter,
        });

        let generated: Result<AnalysisFinding, ResearchError> = ctx
            .guard(async {
                ctx.generator
                    .generate(request)
                    .await
                    .map_err(ResearchError::from)
            })
            .await;
        let finding = match generated {
            Ok(finding) => finding.normalized(),
            Err(err) => {
                ctx.report_failure(&step.id, EventKind::Analysis, &title, &err);
                return Err(err);
            }
        };

        ctx.emit(
            ProgressEvent::completed(
                &step.id,
                EventKind::Analysis,
                &title,
                format!("{} insights", finding.findings.len()),
            )
            .with_payload(json!({
                "findings": serde_json::to_value(&finding).unwrap_or_default(),
            })),
        );

        Ok(finding)
    }
}
