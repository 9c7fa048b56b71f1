use crate::config::Config;
use crate::llm::LLMClient;
use crate::research::events::{ChannelSink, EventStatus, ProgressEvent};
use crate::research::types::{ResearchOutcome, SourceType};
use crate::research::{ResearchError, ResearchOrchestrator, ResearchSettings};
use crate::search::{SearchFacade, SearchProvider};

use anyhow::Result;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// 一次命令行研究调用的请求参数
#[derive(Debug, Clone)]
pub struct ResearchRequest {
    /// 研究主题
    pub topic: String,
    /// 以JSON Lines输出，而不是可读的进度与报告
    pub json_output: bool,
}

/// 把进度事件渲染为一行控制台输出
pub fn format_event(event: &ProgressEvent) -> String {
    let icon = match event.status {
        EventStatus::Running => "⏳",
        EventStatus::Completed => "✅",
        EventStatus::Failed => "❌",
    };
    if event.message.is_empty() {
        format!("{} [{}] {}", icon, event.id, event.title)
    } else {
        format!("{} [{}] {}: {}", icon, event.id, event.title, event.message)
    }
}

/// 消费进度事件直到发送端全部释放
async fn print_events(mut rx: mpsc::UnboundedReceiver<ProgressEvent>, json_output: bool) {
    while let Some(event) = rx.recv().await {
        if json_output {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{}", line),
                Err(err) => tracing::warn!("failed to serialize progress event: {}", err),
            }
        } else {
            println!("{}", format_event(&event));
        }
    }
}

fn source_label(source_type: SourceType) -> &'static str {
    match source_type {
        SourceType::Web => "Web",
        SourceType::Academic => "Academic",
        SourceType::Social => "Social",
    }
}

/// 把研究产出渲染为Markdown报告
pub fn render_report(outcome: &ResearchOutcome) -> String {
    let mut report = String::new();
    report.push_str(&format!("# Research: {}\n\n", outcome.topic));
    report.push_str(&format!(
        "_Session {} · depth {}_\n\n",
        outcome.session_id, outcome.depth
    ));

    report.push_str("## Plan\n\n");
    for directive in &outcome.plan.search_directives {
        report.push_str(&format!(
            "- [{:?}] {} (priority {})\n",
            directive.source, directive.query, directive.priority
        ));
    }
    for directive in &outcome.plan.analysis_directives {
        report.push_str(&format!(
            "- analysis `{}`: {}\n",
            directive.analysis_type, directive.description
        ));
    }
    report.push('\n');

    if let Some(synthesis) = &outcome.synthesis {
        report.push_str("## Key Findings\n\n");
        for finding in &synthesis.key_findings {
            report.push_str(&format!(
                "- {} (confidence {:.2})\n",
                finding.finding, finding.confidence
            ));
        }
        if !synthesis.remaining_uncertainties.is_empty() {
            report.push_str("\n### Remaining Uncertainties\n\n");
            for uncertainty in &synthesis.remaining_uncertainties {
                report.push_str(&format!("- {}\n", uncertainty));
            }
        }
        report.push('\n');
    }

    if !outcome.findings.is_empty() {
        report.push_str("## Analysis\n\n");
        for (finding, directive) in outcome
            .findings
            .iter()
            .zip(outcome.plan.analysis_directives.iter())
        {
            report.push_str(&format!("### {}\n\n", directive.description));
            for insight in &finding.findings {
                report.push_str(&format!(
                    "- {} (confidence {:.2})\n",
                    insight.insight, insight.confidence
                ));
            }
            for implication in &finding.implications {
                report.push_str(&format!("- _Implication:_ {}\n", implication));
            }
            report.push('\n');
        }
    }

    let gaps = &outcome.gap_report.knowledge_gaps;
    if !gaps.is_empty() {
        report.push_str("## Knowledge Gaps\n\n");
        for gap in gaps {
            report.push_str(&format!("- **{}**: {}\n", gap.topic, gap.reason));
        }
        report.push('\n');
    }

    report.push_str("## Sources\n\n");
    for record in &outcome.results {
        if record.items.is_empty() {
            continue;
        }
        report.push_str(&format!(
            "### {} · {}\n\n",
            source_label(record.source_type),
            record.directive.query
        ));
        for item in &record.items {
            report.push_str(&format!("- [{}]({})\n", item.title, item.url));
        }
        report.push('\n');
    }

    report
}

/// 启动一次研究调用
pub async fn launch(config: &Config, request: &ResearchRequest) -> Result<()> {
    let generator = Arc::new(LLMClient::new(config.llm.clone())?);
    let search: Arc<dyn SearchProvider> = Arc::new(SearchFacade::new(&config.search)?);
    let orchestrator =
        ResearchOrchestrator::new(generator, search, ResearchSettings::from(config));

    let (sink, rx) = ChannelSink::new();
    let printer = tokio::spawn(print_events(rx, request.json_output));

    // Ctrl-C 取消本次研究
    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let depth = config.research.depth;
    if !request.json_output {
        println!("🚀 开始研究: {} (depth: {})", request.topic, depth);
    }
    let start = Instant::now();

    let result = orchestrator
        .research(&request.topic, depth, &sink, &cancel)
        .await;

    interrupt.abort();
    drop(sink);
    printer.await?;

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(ResearchError::Cancelled) => {
            eprintln!("🛑 研究已取消");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    if request.json_output {
        println!("{}", serde_json::to_string(&outcome)?);
    } else {
        println!();
        println!("{}", render_report(&outcome));
        println!(
            "✓ 研究完成，共 {} 条搜索记录，耗时 {:.2}秒",
            outcome.results.len(),
            start.elapsed().as_secs_f64()
        );
    }

    Ok(())
}
