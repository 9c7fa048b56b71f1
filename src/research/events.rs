//! 研究进度事件 - 编排器写出、消费方按id覆盖渲染

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::mpsc;

/// 研究计划事件id
pub const PLAN_EVENT_ID: &str = "research-plan";
/// 缺口分析事件id
pub const GAP_ANALYSIS_EVENT_ID: &str = "gap-analysis";
/// 最终综合事件id
pub const SYNTHESIS_EVENT_ID: &str = "final-synthesis";
/// 终止进度事件id
pub const PROGRESS_EVENT_ID: &str = "research-progress";

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    Plan,
    SearchWeb,
    SearchAcademic,
    SearchSocial,
    Analysis,
    Progress,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Running,
    Completed,
    Failed,
}

/// 进度事件，发出后所有权即转移给sink
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub id: String,
    pub kind: EventKind,
    pub status: EventStatus,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub overwrite: bool,
    pub payload: Value,
}

impl ProgressEvent {
    fn new(
        id: impl Into<String>,
        kind: EventKind,
        status: EventStatus,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            status,
            title: title.into(),
            message: message.into(),
            timestamp: Utc::now(),
            overwrite: status != EventStatus::Running,
            payload: Value::Null,
        }
    }

    pub fn running(
        id: impl Into<String>,
        kind: EventKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(id, kind, EventStatus::Running, title, message)
    }

    /// 完成事件总是覆盖同id的running事件
    pub fn completed(
        id: impl Into<String>,
        kind: EventKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(id, kind, EventStatus::Completed, title, message)
    }

    pub fn failed(
        id: impl Into<String>,
        kind: EventKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(id, kind, EventStatus::Failed, title, message)
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// 整个调用的终止事件，消费方收到后即可停止监听
    pub fn research_complete(completed_steps: usize, total_steps: usize) -> Self {
        Self::completed(
            PROGRESS_EVENT_ID,
            EventKind::Progress,
            "Research complete",
            format!("Completed {} of {} steps", completed_steps, total_steps),
        )
        .with_payload(json!({
            "completedSteps": completed_steps,
            "totalSteps": total_steps,
            "isComplete": true,
        }))
    }
}

/// 进度事件接收端，发出即忘，不能阻塞编排器
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// 基于无界通道的sink
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressSink for ChannelSink {
    fn emit(&self, event: ProgressEvent) {
        if let Err(err) = self.tx.send(event) {
            tracing::trace!(event_id = %err.0.id, "progress consumer is gone, dropping event");
        }
    }
}

/// 丢弃所有事件
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _event: ProgressEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_value(EventKind::SearchAcademic).unwrap(),
            json!("search-academic")
        );
        assert_eq!(serde_json::to_value(EventStatus::Completed).unwrap(), json!("completed"));
    }

    #[test]
    fn test_overwrite_flag_follows_status() {
        let running = ProgressEvent::running("search-web-0", EventKind::SearchWeb, "t", "m");
        let completed = ProgressEvent::completed("search-web-0", EventKind::SearchWeb, "t", "m");
        let failed = ProgressEvent::failed("search-web-0", EventKind::SearchWeb, "t", "m");

        assert!(!running.overwrite);
        assert!(completed.overwrite);
        assert!(failed.overwrite);
    }

    #[test]
    fn test_research_complete_payload() {
        let event = ProgressEvent::research_complete(4, 4);
        assert_eq!(event.id, PROGRESS_EVENT_ID);
        assert_eq!(event.kind, EventKind::Progress);
        assert_eq!(event.payload["isComplete"], json!(true));
        assert_eq!(event.payload["totalSteps"], json!(4));

        let value = serde_json::to_value(&event).unwrap();
        assert!(value.get("overwrite").is_some());
        assert!(value.get("timestamp").is_some());
    }

    #[tokio::test]
    async fn test_channel_sink_preserves_order() {
        let (sink, mut rx) = ChannelSink::new();
        sink.emit(ProgressEvent::running("a", EventKind::Analysis, "a", ""));
        sink.emit(ProgressEvent::completed("a", EventKind::Analysis, "a", ""));
        drop(sink);

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.status, EventStatus::Running);
        assert_eq!(second.status, EventStatus::Completed);
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn test_channel_sink_ignores_closed_receiver() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.emit(ProgressEvent::running("a", EventKind::Analysis, "a", ""));
    }
}
