//! Prompt构建 - 由类型化的上下文记录渲染出生成请求，不做任何IO

use crate::research::generation::{GenerationRequest, GenerationTask};
use crate::research::types::{
    AnalysisDirective, AnalysisFinding, GapReport, MAX_ANALYSIS_DIRECTIVES, MAX_PLAN_STEPS,
    MAX_SEARCH_DIRECTIVES, ResultsLedger,
};

/// Prompt模板配置
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// 系统提示词
    pub system_prompt: String,
    /// 开头的说明性指令
    pub opening_instruction: String,
    /// 结尾的强调性指令
    pub closing_instruction: String,
}

impl PromptTemplate {
    /// 按 开头指令 -> 材料 -> 结尾指令 的顺序拼装用户提示词
    pub fn render(&self, task: GenerationTask, sections: &[(&str, String)]) -> GenerationRequest {
        let mut prompt = String::new();
        prompt.push_str(&self.opening_instruction);
        prompt.push_str("\n\n");

        for (heading, body) in sections {
            if body.trim().is_empty() {
                continue;
            }
            prompt.push_str(&format!("## {}\n{}\n\n", heading, body.trim_end()));
        }

        prompt.push_str(&self.closing_instruction);

        GenerationRequest {
            task,
            system_prompt: self.system_prompt.clone(),
            user_prompt: prompt,
        }
    }
}

/// 结果账本格式化器
#[derive(Debug, Clone)]
pub struct LedgerFormatter {
    /// 单条结果内容的截断长度（字符）
    content_truncate_length: usize,
}

impl Default for LedgerFormatter {
    fn default() -> Self {
        Self::new(1500)
    }
}

impl LedgerFormatter {
    pub fn new(content_truncate_length: usize) -> Self {
        Self {
            content_truncate_length,
        }
    }

    fn truncate(&self, content: &str) -> String {
        let content = content.trim();
        if content.chars().count() > self.content_truncate_length {
            let truncated: String = content.chars().take(self.content_truncate_length).collect();
            format!("{}...(truncated)", truncated)
        } else {
            content.to_string()
        }
    }

    /// 格式化全部搜索结果
    pub fn format_ledger(&self, ledger: &ResultsLedger) -> String {
        if ledger.is_empty() {
            return "No search results were collected.\n".to_string();
        }

        let mut content = String::new();
        for record in ledger.records() {
            content.push_str(&format!(
                "### [{}] {} search: {}\n",
                record.step_id, record.source_type, record.directive.query
            ));
            if record.items.is_empty() {
                content.push_str("(no results)\n");
            }
            for (i, item) in record.items.iter().enumerate() {
                content.push_str(&format!("{}. {} ({})\n", i + 1, item.title, item.url));
                let body = self.truncate(&item.content);
                if !body.is_empty() {
                    content.push_str(&format!("   {}\n", body));
                }
            }
            content.push('\n');
        }
        content
    }

    /// 格式化各分析步骤的结论
    pub fn format_findings(&self, findings: &[AnalysisFinding]) -> String {
        let mut content = String::new();
        for (i, finding) in findings.iter().enumerate() {
            content.push_str(&format!("### Analysis {}\n", i + 1));
            for insight in &finding.findings {
                content.push_str(&format!(
                    "- {} (confidence {:.2})\n",
                    insight.insight, insight.confidence
                ));
            }
            for implication in &finding.implications {
                content.push_str(&format!("- implication: {}\n", implication));
            }
            for limitation in &finding.limitations {
                content.push_str(&format!("- limitation: {}\n", limitation));
            }
            content.push('\n');
        }
        content
    }

    pub fn format_gap_report(&self, report: &GapReport) -> String {
        let mut content = String::new();
        for limitation in &report.limitations {
            content.push_str(&format!(
                "- limitation [{}] (severity {}): {}\n",
                limitation.limitation_type, limitation.severity, limitation.description
            ));
            for solution in &limitation.potential_solutions {
                content.push_str(&format!("  - possible fix: {}\n", solution));
            }
        }
        for gap in &report.knowledge_gaps {
            content.push_str(&format!("- gap: {} ({})\n", gap.topic, gap.reason));
            for query in &gap.additional_queries {
                content.push_str(&format!("  - query: {}\n", query));
            }
        }
        for followup in &report.recommended_followup {
            content.push_str(&format!(
                "- follow-up (priority {}): {} ({})\n",
                followup.priority, followup.action, followup.rationale
            ));
        }
        content
    }
}

pub struct PlanPromptContext<'a> {
    pub topic: &'a str,
    pub current_date: &'a str,
}

pub struct AnalysisPromptContext<'a> {
    pub topic: &'a str,
    pub directive: &'a AnalysisDirective,
    pub ledger: &'a ResultsLedger,
    pub formatter: &'a LedgerFormatter,
}

pub struct GapPromptContext<'a> {
    pub topic: &'a str,
    pub ledger: &'a ResultsLedger,
    pub findings: &'a [AnalysisFinding],
    pub formatter: &'a LedgerFormatter,
}

pub struct SynthesisPromptContext<'a> {
    pub topic: &'a str,
    pub ledger: &'a ResultsLedger,
    pub gap_report: &'a GapReport,
    pub formatter: &'a LedgerFormatter,
}

pub fn plan_request(ctx: &PlanPromptContext<'_>) -> GenerationRequest {
    let template = PromptTemplate {
        system_prompt: format!(
            r#"You are a research planner. Today's date is {}.

Create a focused research plan for the topic given by the user:
- {} to {} search directives and 2 to {} analysis directives, at most {} directives in total.
- Each search directive has a query, a short rationale, a source (web, academic, x or all) and a priority.
- Priorities are whole numbers between 2 and 4; importance is a whole number between 1 and 5.
- Use "all" only for queries that benefit from every source.
- Prefer recent information where the topic is time sensitive."#,
            ctx.current_date,
            4,
            MAX_SEARCH_DIRECTIVES,
            MAX_ANALYSIS_DIRECTIVES,
            MAX_PLAN_STEPS
        ),
        opening_instruction: "Plan the research for the following topic.".to_string(),
        closing_instruction: "Return the plan as structured data only.".to_string(),
    };

    template.render(
        GenerationTask::Plan,
        &[
            ("Topic", ctx.topic.to_string()),
            ("Current date", ctx.current_date.to_string()),
        ],
    )
}

pub fn analysis_request(ctx: &AnalysisPromptContext<'_>) -> GenerationRequest {
    let template = PromptTemplate {
        system_prompt: "You are a research analyst. Base every insight on the collected search results, cite evidence from them and give a calibrated confidence between 0 and 1.".to_string(),
        opening_instruction: format!("Perform a {} analysis for the research topic.", ctx.directive.analysis_type),
        closing_instruction: "List the findings with evidence, their implications and the limitations of the available data.".to_string(),
    };

    template.render(
        GenerationTask::Analysis,
        &[
            ("Topic", ctx.topic.to_string()),
            ("Analysis goal", ctx.directive.description.clone()),
            ("Search results", ctx.formatter.format_ledger(ctx.ledger)),
        ],
    )
}

pub fn gap_review_request(ctx: &GapPromptContext<'_>) -> GenerationRequest {
    let template = PromptTemplate {
        system_prompt: "You review research for completeness. Identify limitations of the gathered material, knowledge gaps that more searching could close, and recommended follow-up actions. Severity and priority are whole numbers between 2 and 10.".to_string(),
        opening_instruction: "Review the research collected so far.".to_string(),
        closing_instruction: "For every knowledge gap, propose concrete additional search queries. Leave the list of gaps empty when the research is complete.".to_string(),
    };

    template.render(
        GenerationTask::GapReview,
        &[
            ("Topic", ctx.topic.to_string()),
            ("Search results", ctx.formatter.format_ledger(ctx.ledger)),
            ("Analysis findings", ctx.formatter.format_findings(ctx.findings)),
        ],
    )
}

pub fn synthesis_request(ctx: &SynthesisPromptContext<'_>) -> GenerationRequest {
    let template = PromptTemplate {
        system_prompt: "You synthesize research. Combine the results of every search round into key findings with evidence and a calibrated confidence between 0 and 1, and state what remains uncertain.".to_string(),
        opening_instruction: "Synthesize the complete research.".to_string(),
        closing_instruction: "Focus on findings supported by several sources.".to_string(),
    };

    template.render(
        GenerationTask::Synthesis,
        &[
            ("Topic", ctx.topic.to_string()),
            ("Search results", ctx.formatter.format_ledger(ctx.ledger)),
            ("Gap review", ctx.formatter.format_gap_report(ctx.gap_report)),
        ],
    )
}
