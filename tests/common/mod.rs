#![allow(dead_code)]

use async_trait::async_trait;
use deepresearch_rs::research::events::{EventStatus, ProgressEvent, ProgressSink};
use deepresearch_rs::research::generation::{
    GenerationError, GenerationRequest, GenerationTask, StructuredGenerator,
};
use deepresearch_rs::research::types::{ResearchDepth, ResultItem, SourceType};
use deepresearch_rs::search::{ProviderError, SearchProvider};
use schemars::JsonSchema;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// 按任务类型预置返回值的生成服务
#[derive(Default)]
pub struct ScriptedGenerator {
    responses: Mutex<HashMap<GenerationTask, VecDeque<Result<Value, String>>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, task: GenerationTask, value: Value) -> Self {
        self.push(task, Ok(value));
        self
    }

    pub fn with_failure(self, task: GenerationTask, cause: &str) -> Self {
        self.push(task, Err(cause.to_string()));
        self
    }

    fn push(&self, task: GenerationTask, response: Result<Value, String>) {
        self.responses
            .lock()
            .unwrap()
            .entry(task)
            .or_default()
            .push_back(response);
    }

    pub fn tasks(&self) -> Vec<GenerationTask> {
        self.requests.lock().unwrap().iter().map(|r| r.task).collect()
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl StructuredGenerator for ScriptedGenerator {
    async fn generate<T>(&self, request: GenerationRequest) -> Result<T, GenerationError>
    where
        T: JsonSchema + DeserializeOwned + Serialize + Send + Sync + 'static,
    {
        let task = request.task;
        self.requests.lock().unwrap().push(request);

        let response = self
            .responses
            .lock()
            .unwrap()
            .get_mut(&task)
            .and_then(|queue| queue.pop_front());

        match response {
            Some(Ok(value)) => serde_json::from_value(value).map_err(|e| GenerationError::Failed {
                task,
                cause: e.to_string(),
            }),
            Some(Err(cause)) => Err(GenerationError::Failed { task, cause }),
            None => Err(GenerationError::Failed {
                task,
                cause: "no scripted response".to_string(),
            }),
        }
    }
}

/// 一次搜索调用的记录
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCall {
    pub source_type: SourceType,
    pub query: String,
    pub max_results: usize,
}

/// 确定性的搜索门面，可在第n次调用时失败或取消
#[derive(Default)]
pub struct FakeSearch {
    calls: Mutex<Vec<SearchCall>>,
    fail_on_call: Option<usize>,
    cancel_on_call: Option<(usize, CancellationToken)>,
}

impl FakeSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// 第 `n` 次调用（从1开始）返回provider错误
    pub fn failing_on(n: usize) -> Self {
        Self {
            fail_on_call: Some(n),
            ..Default::default()
        }
    }

    /// 第 `n` 次调用时取消令牌，然后永远挂起
    pub fn cancelling_on(n: usize, token: CancellationToken) -> Self {
        Self {
            cancel_on_call: Some((n, token)),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<SearchCall> {
        self.calls.lock().unwrap().clone()
    }

    async fn respond(
        &self,
        source_type: SourceType,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<ResultItem>, ProviderError> {
        let call_number = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(SearchCall {
                source_type,
                query: query.to_string(),
                max_results,
            });
            calls.len()
        };

        if self.fail_on_call == Some(call_number) {
            return Err(ProviderError::new(source_type, "upstream returned 503"));
        }
        if let Some((n, token)) = &self.cancel_on_call {
            if *n == call_number {
                token.cancel();
                return std::future::pending().await;
            }
        }

        Ok(fake_items(source_type, query, call_number))
    }
}

fn fake_items(source_type: SourceType, query: &str, call_number: usize) -> Vec<ResultItem> {
    let slug = query.replace(' ', "-");
    match source_type {
        SourceType::Web => (0..2)
            .map(|i| ResultItem {
                source: SourceType::Web,
                title: format!("{} article {}", query, i),
                url: format!("https://web.example/{}/{}", slug, i),
                content: format!("web content about {}", query),
                tweet_id: None,
            })
            .collect(),
        SourceType::Academic => vec![ResultItem {
            source: SourceType::Academic,
            title: format!("A study of {}", query),
            url: format!("https://papers.example/{}", slug),
            content: format!("abstract about {}", query),
            tweet_id: None,
        }],
        SourceType::Social => vec![
            ResultItem {
                source: SourceType::Social,
                title: format!("post about {}", query),
                url: format!("https://x.com/researcher/status/{}", 1000 + call_number),
                content: format!("thread on {}", query),
                tweet_id: None,
            },
            ResultItem {
                source: SourceType::Social,
                title: "profile".to_string(),
                url: "https://x.com/researcher".to_string(),
                content: String::new(),
                tweet_id: None,
            },
        ],
    }
}

#[async_trait]
impl SearchProvider for FakeSearch {
    async fn search_web(
        &self,
        query: &str,
        _depth: ResearchDepth,
        max_results: usize,
    ) -> Result<Vec<ResultItem>, ProviderError> {
        self.respond(SourceType::Web, query, max_results).await
    }

    async fn search_academic(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<ResultItem>, ProviderError> {
        self.respond(SourceType::Academic, query, max_results).await
    }

    async fn search_social(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<ResultItem>, ProviderError> {
        self.respond(SourceType::Social, query, max_results).await
    }
}

/// 记录全部进度事件
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl RecordingSink {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn ids_with_status(&self, status: EventStatus) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|e| e.status == status)
            .map(|e| e.id)
            .collect()
    }

    pub fn completed_ids(&self) -> Vec<String> {
        self.ids_with_status(EventStatus::Completed)
    }

    pub fn last(&self) -> Option<ProgressEvent> {
        self.events().last().cloned()
    }
}

pub fn plan_fixture(searches: &[(&str, &str)], analyses: &[&str]) -> Value {
    json!({
        "searchDirectives": searches
            .iter()
            .map(|(query, source)| json!({
                "query": query,
                "rationale": format!("covers {}", query),
                "source": source,
                "priority": 3
            }))
            .collect::<Vec<_>>(),
        "analysisDirectives": analyses
            .iter()
            .map(|description| json!({
                "type": "trend",
                "description": description,
                "importance": 3
            }))
            .collect::<Vec<_>>()
    })
}

pub fn analysis_fixture(insight: &str) -> Value {
    json!({
        "findings": [
            {"insight": insight, "evidence": ["https://web.example/evidence"], "confidence": 0.7}
        ],
        "implications": ["worth watching"],
        "limitations": []
    })
}

pub fn gap_fixture(gaps: &[(&str, &[&str])]) -> Value {
    json!({
        "limitations": [
            {"type": "coverage", "description": "few primary sources", "severity": 4, "potentialSolutions": []}
        ],
        "knowledgeGaps": gaps
            .iter()
            .map(|(topic, queries)| json!({
                "topic": topic,
                "reason": "not covered by round one",
                "additionalQueries": queries
            }))
            .collect::<Vec<_>>(),
        "recommendedFollowup": []
    })
}

pub fn synthesis_fixture() -> Value {
    json!({
        "keyFindings": [
            {"finding": "adoption is accelerating", "confidence": 0.65, "evidence": ["https://web.example/evidence"]}
        ],
        "remainingUncertainties": ["long-term durability"]
    })
}
