use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::research::events::EventKind;

/// 研究计划中搜索指令的数量上限
pub const MAX_SEARCH_DIRECTIVES: usize = 12;
/// 研究计划中分析指令的数量上限
pub const MAX_ANALYSIS_DIRECTIVES: usize = 8;
/// 研究计划的总步数预算
pub const MAX_PLAN_STEPS: usize = 20;

/// 研究深度
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResearchDepth {
    #[default]
    Basic,
    Advanced,
}

impl ResearchDepth {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResearchDepth::Basic => "basic",
            ResearchDepth::Advanced => "advanced",
        }
    }
}

impl std::fmt::Display for ResearchDepth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResearchDepth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(ResearchDepth::Basic),
            "advanced" | "deep" => Ok(ResearchDepth::Advanced),
            _ => Err(format!("Unknown research depth: {}", s)),
        }
    }
}

/// 可执行的搜索来源（步骤级别，不包含 all）
#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Web,
    Academic,
    Social,
}

impl SourceType {
    /// all 指令展开时的固定顺序
    pub const ALL: [SourceType; 3] = [SourceType::Web, SourceType::Academic, SourceType::Social];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Web => "web",
            SourceType::Academic => "academic",
            SourceType::Social => "social",
        }
    }

    pub fn event_kind(&self) -> EventKind {
        match self {
            SourceType::Web => EventKind::SearchWeb,
            SourceType::Academic => EventKind::SearchAcademic,
            SourceType::Social => EventKind::SearchSocial,
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 计划级别的搜索来源
#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Web,
    Academic,
    #[serde(alias = "x")]
    Social,
    All,
}

impl SourceKind {
    /// 展开表：每种来源对应的可执行步骤类型，新增来源只需要在这里加一行
    pub fn expansion(&self) -> &'static [SourceType] {
        match self {
            SourceKind::Web => &[SourceType::Web],
            SourceKind::Academic => &[SourceType::Academic],
            SourceKind::Social => &[SourceType::Social],
            SourceKind::All => &SourceType::ALL,
        }
    }
}

impl From<SourceType> for SourceKind {
    fn from(value: SourceType) -> Self {
        match value {
            SourceType::Web => SourceKind::Web,
            SourceType::Academic => SourceKind::Academic,
            SourceType::Social => SourceKind::Social,
        }
    }
}

/// A planned search.
#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchDirective {
    /// The search query to run.
    pub query: String,
    /// Why this search helps answer the research topic.
    #[serde(default)]
    pub rationale: String,
    /// Where to search: web, academic, social (x) or all of them.
    pub source: SourceKind,
    /// Priority as a whole number between 2 and 4.
    #[schemars(range(min = 2, max = 4))]
    pub priority: u8,
}

/// A planned analysis over the collected search results.
#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisDirective {
    /// Kind of analysis, e.g. "trend", "comparison" or "consensus".
    #[serde(rename = "type")]
    pub analysis_type: String,
    /// What the analysis should establish.
    pub description: String,
    /// Importance as a whole number between 1 and 5.
    #[schemars(range(min = 1, max = 5))]
    pub importance: u8,
}

/// A research plan: ordered searches followed by ordered analyses.
#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResearchPlan {
    /// Between 4 and 12 search directives.
    #[schemars(length(max = 12))]
    pub search_directives: Vec<SearchDirective>,
    /// Between 2 and 8 analysis directives.
    #[serde(default)]
    #[schemars(length(max = 8))]
    pub analysis_directives: Vec<AnalysisDirective>,
}

impl ResearchPlan {
    /// 规范化模型产出的计划：钳制优先级与重要性，截断到数量上限与总预算
    pub fn normalized(mut self) -> Self {
        self.search_directives.truncate(MAX_SEARCH_DIRECTIVES);
        self.analysis_directives.truncate(MAX_ANALYSIS_DIRECTIVES);

        let analysis_budget = MAX_PLAN_STEPS.saturating_sub(self.search_directives.len());
        self.analysis_directives.truncate(analysis_budget);

        for directive in &mut self.search_directives {
            directive.priority = directive.priority.clamp(2, 4);
        }
        for directive in &mut self.analysis_directives {
            directive.importance = directive.importance.clamp(1, 5);
        }
        self
    }

    pub fn directive_count(&self) -> usize {
        self.search_directives.len() + self.analysis_directives.len()
    }
}

/// 一次搜索步骤
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchStep {
    pub id: String,
    pub source_type: SourceType,
    pub directive: SearchDirective,
}

/// 一次分析步骤
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisStep {
    pub id: String,
    pub directive: AnalysisDirective,
}

/// 展开后的可执行步骤
#[derive(Debug, Serialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExpandedSteps {
    pub search_steps: Vec<SearchStep>,
    pub analysis_steps: Vec<AnalysisStep>,
}

impl ExpandedSteps {
    pub fn total_steps(&self) -> usize {
        self.search_steps.len() + self.analysis_steps.len()
    }

    /// 按执行顺序列出所有步骤id
    pub fn step_ids(&self) -> Vec<&str> {
        self.search_steps
            .iter()
            .map(|s| s.id.as_str())
            .chain(self.analysis_steps.iter().map(|s| s.id.as_str()))
            .collect()
    }
}

/// 单条搜索结果，由各搜索适配器在边界处映射而来
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResultItem {
    pub source: SourceType,
    pub title: String,
    pub url: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tweet_id: Option<String>,
}

/// 一个搜索步骤的执行结果
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub step_id: String,
    pub source_type: SourceType,
    pub directive: SearchDirective,
    pub items: Vec<ResultItem>,
}

/// 单次研究调用内的结果账本，只追加
#[derive(Debug, Clone, Default)]
pub struct ResultsLedger {
    records: Vec<ResultRecord>,
}

impl ResultsLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: ResultRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn item_count(&self) -> usize {
        self.records.iter().map(|r| r.items.len()).sum()
    }

    pub fn into_records(self) -> Vec<ResultRecord> {
        self.records
    }
}

/// One insight backed by evidence.
#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub insight: String,
    #[serde(default)]
    pub evidence: Vec<String>,
    /// Confidence between 0 and 1.
    #[schemars(range(min = 0.0, max = 1.0))]
    pub confidence: f64,
}

/// The outcome of one analysis directive.
#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisFinding {
    pub findings: Vec<Insight>,
    #[serde(default)]
    pub implications: Vec<String>,
    #[serde(default)]
    pub limitations: Vec<String>,
}

impl AnalysisFinding {
    /// 把模型给出的置信度钳制到 [0, 1]
    pub fn normalized(mut self) -> Self {
        for insight in &mut self.findings {
            insight.confidence = clamp_confidence(insight.confidence);
        }
        self
    }
}

/// A limitation of the research gathered so far.
#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Limitation {
    #[serde(rename = "type")]
    pub limitation_type: String,
    pub description: String,
    /// Severity as a whole number between 2 and 10.
    #[schemars(range(min = 2, max = 10))]
    pub severity: u8,
    #[serde(default)]
    pub potential_solutions: Vec<String>,
}

/// A topic the research does not cover well enough yet.
#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeGap {
    pub topic: String,
    pub reason: String,
    /// Search queries that would close this gap.
    #[serde(default)]
    pub additional_queries: Vec<String>,
}

/// A recommended next action.
#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedFollowup {
    pub action: String,
    pub rationale: String,
    /// Priority as a whole number between 2 and 10.
    #[schemars(range(min = 2, max = 10))]
    pub priority: u8,
}

/// Review of the research results: limitations, gaps and follow-ups.
#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GapReport {
    #[serde(default)]
    pub limitations: Vec<Limitation>,
    #[serde(default)]
    pub knowledge_gaps: Vec<KnowledgeGap>,
    #[serde(default)]
    pub recommended_followup: Vec<RecommendedFollowup>,
}

impl GapReport {
    /// 钳制严重程度与跟进优先级到 [2, 10]
    pub fn normalized(mut self) -> Self {
        for limitation in &mut self.limitations {
            limitation.severity = limitation.severity.clamp(2, 10);
        }
        for followup in &mut self.recommended_followup {
            followup.priority = followup.priority.clamp(2, 10);
        }
        self
    }
}

/// A key finding of the final synthesis.
#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KeyFinding {
    pub finding: String,
    /// Confidence between 0 and 1.
    #[schemars(range(min = 0.0, max = 1.0))]
    pub confidence: f64,
    #[serde(default)]
    pub evidence: Vec<String>,
}

/// Cross-round synthesis of everything the research found.
#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Synthesis {
    pub key_findings: Vec<KeyFinding>,
    #[serde(default)]
    pub remaining_uncertainties: Vec<String>,
}

impl Synthesis {
    pub fn normalized(mut self) -> Self {
        for finding in &mut self.key_findings {
            finding.confidence = clamp_confidence(finding.confidence);
        }
        self
    }
}

/// NaN按0处理
fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

/// 一次研究调用的最终产出
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ResearchOutcome {
    pub session_id: Uuid,
    pub topic: String,
    pub depth: ResearchDepth,
    pub plan: ResearchPlan,
    pub results: Vec<ResultRecord>,
    pub findings: Vec<AnalysisFinding>,
    pub gap_report: GapReport,
    pub synthesis: Option<Synthesis>,
}
