//! 缺口补全 - 审查结果账本，必要时发起第二轮搜索并综合全部结论

use serde_json::json;

use crate::research::context::ResearchContext;
use crate::research::error::ResearchError;
use crate::research::events::{EventKind, GAP_ANALYSIS_EVENT_ID, ProgressEvent, SYNTHESIS_EVENT_ID};
use crate::research::generation::StructuredGenerator;
use crate::research::prompts::{
    GapPromptContext, SynthesisPromptContext, gap_review_request, synthesis_request,
};
use crate::research::types::{
    AnalysisFinding, GapReport, ResearchDepth, ResultsLedger, SearchDirective, SourceKind,
    Synthesis,
};

/// 补缺查询的固定优先级
pub const FOLLOW_UP_PRIORITY: u8 = 3;

/// 第k条补缺查询（k>0）轮换使用的单一来源
const ROTATING_SOURCES: [SourceKind; 3] = [SourceKind::Web, SourceKind::Academic, SourceKind::Social];

/// 仅在advanced深度且存在知识缺口时进入第二轮
pub fn should_deepen(depth: ResearchDepth, report: &GapReport) -> bool {
    depth == ResearchDepth::Advanced && !report.knowledge_gaps.is_empty()
}

/// 把缺口报告中的补充查询转换为搜索指令
///
/// 每个缺口的第0条查询搜索全部来源，之后的第k条使用 `[web, academic, social][k % 3]`。
/// 空白查询先被过滤掉，不占用序号。
pub fn follow_up_directives(report: &GapReport) -> Vec<SearchDirective> {
    let mut directives = Vec::new();
    for gap in &report.knowledge_gaps {
        let queries = gap
            .additional_queries
            .iter()
            .map(|q| q.trim())
            .filter(|q| !q.is_empty());

        for (k, query) in queries.enumerate() {
            let source = if k == 0 {
                SourceKind::All
            } else {
                ROTATING_SOURCES[k % ROTATING_SOURCES.len()]
            };
            directives.push(SearchDirective {
                query: query.to_string(),
                rationale: format!("Close knowledge gap: {}", gap.topic),
                source,
                priority: FOLLOW_UP_PRIORITY,
            });
        }
    }
    directives
}

pub struct GapFillController<'r, G> {
    ctx: &'r ResearchContext<'r, G>,
}

impl<'r, G: StructuredGenerator> GapFillController<'r, G> {
    pub fn new(ctx: &'r ResearchContext<'r, G>) -> Self {
        Self { ctx }
    }

    /// 缺口审查，每次研究调用恰好执行一次
    pub async fn review(
        &self,
        ledger: &ResultsLedger,
        findings: &[AnalysisFinding],
    ) -> Result<GapReport, ResearchError> {
        let ctx = self.ctx;
        ctx.ensure_active()?;

        let title = "Reviewing knowledge gaps";
        ctx.emit(ProgressEvent::running(
            GAP_ANALYSIS_EVENT_ID,
            EventKind::Analysis,
            title,
            format!("Reviewing {} search results", ledger.item_count()),
        ));

        let request = gap_review_request(&GapPromptContext {
            topic: ctx.topic,
            ledger,
            findings,
            formatter: &ctx.formatter,
        });
        let generated: Result<GapReport, ResearchError> = ctx
            .guard(async {
                ctx.generator
                    .generate(request)
                    .await
                    .map_err(ResearchError::from)
            })
            .await;
        let report = match generated {
            Ok(report) => report.normalized(),
            Err(err) => {
                ctx.report_failure(GAP_ANALYSIS_EVENT_ID, EventKind::Analysis, title, &err);
                return Err(err);
            }
        };

        tracing::info!(
            knowledge_gaps = report.knowledge_gaps.len(),
            limitations = report.limitations.len(),
            "gap review finished"
        );
        ctx.emit(
            ProgressEvent::completed(
                GAP_ANALYSIS_EVENT_ID,
                EventKind::Analysis,
                title,
                format!("Identified {} knowledge gaps", report.knowledge_gaps.len()),
            )
            .with_payload(json!({
                "gapReport": serde_json::to_value(&report).unwrap_or_default(),
            })),
        );

        Ok(report)
    }

    /// 对两轮的全部结果做最终综合
    pub async fn synthesize(
        &self,
        ledger: &ResultsLedger,
        report: &GapReport,
    ) -> Result<Synthesis, ResearchError> {
        let ctx = self.ctx;
        ctx.ensure_active()?;

        let title = "Synthesizing findings";
        ctx.emit(ProgressEvent::running(
            SYNTHESIS_EVENT_ID,
            EventKind::Analysis,
            title,
            format!("Combining {} search records", ledger.len()),
        ));

        let request = synthesis_request(&SynthesisPromptContext {
            topic: ctx.topic,
            ledger,
            gap_report: report,
            formatter: &ctx.formatter,
        });
        let generated: Result<Synthesis, ResearchError> = ctx
            .guard(async {
                ctx.generator
                    .generate(request)
                    .await
                    .map_err(ResearchError::from)
            })
            .await;
        let synthesis = match generated {
            Ok(synthesis) => synthesis.normalized(),
            Err(err) => {
                ctx.report_failure(SYNTHESIS_EVENT_ID, EventKind::Analysis, title, &err);
                return Err(err);
            }
        };

        ctx.emit(
            ProgressEvent::completed(
                SYNTHESIS_EVENT_ID,
                EventKind::Analysis,
                title,
                format!("{} key findings", synthesis.key_findings.len()),
            )
            .with_payload(json!({
                "synthesis": serde_json::to_value(&synthesis).unwrap_or_default(),
            })),
        );

        Ok(synthesis)
    }
}
