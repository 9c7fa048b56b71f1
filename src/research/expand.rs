//! 步骤展开 - 把研究计划确定性地展开为带稳定id的可执行步骤

use crate::research::types::{
    AnalysisDirective, AnalysisStep, ExpandedSteps, ResearchPlan, SearchDirective, SearchStep,
    SourceType,
};

/// 第一轮（计划）步骤的id前缀
pub const PLAN_SEARCH_PREFIX: &str = "search";
pub const PLAN_ANALYSIS_PREFIX: &str = "analysis";
/// 第二轮（补缺）步骤的id前缀
pub const GAP_SEARCH_PREFIX: &str = "gap-search";

/// 步骤序号分配器，作用域为一次展开，id在展开时一次性分配、之后不再生成
#[derive(Debug)]
struct StepIdAllocator {
    prefix: &'static str,
    next_ordinal: usize,
}

impl StepIdAllocator {
    fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            next_ordinal: 0,
        }
    }

    /// 每条指令占用一个序号，all指令展开出的子步骤共享该序号
    fn next(&mut self) -> usize {
        let ordinal = self.next_ordinal;
        self.next_ordinal += 1;
        ordinal
    }

    fn search_id(&self, source_type: SourceType, ordinal: usize) -> String {
        format!("{}-{}-{}", self.prefix, source_type, ordinal)
    }

    fn plain_id(&self, ordinal: usize) -> String {
        format!("{}-{}", self.prefix, ordinal)
    }
}

fn expand_search(directives: &[SearchDirective], prefix: &'static str) -> Vec<SearchStep> {
    let mut ids = StepIdAllocator::new(prefix);
    let mut steps = Vec::new();

    for directive in directives {
        let ordinal = ids.next();
        for &source_type in directive.source.expansion() {
            steps.push(SearchStep {
                id: ids.search_id(source_type, ordinal),
                source_type,
                directive: directive.clone(),
            });
        }
    }
    steps
}

fn expand_analysis(directives: &[AnalysisDirective], prefix: &'static str) -> Vec<AnalysisStep> {
    let mut ids = StepIdAllocator::new(prefix);
    directives
        .iter()
        .map(|directive| {
            let ordinal = ids.next();
            AnalysisStep {
                id: ids.plain_id(ordinal),
                directive: directive.clone(),
            }
        })
        .collect()
}

/// 展开第一轮计划，纯函数，同一计划总是得到相同结果
pub fn expand(plan: &ResearchPlan) -> ExpandedSteps {
    ExpandedSteps {
        search_steps: expand_search(&plan.search_directives, PLAN_SEARCH_PREFIX),
        analysis_steps: expand_analysis(&plan.analysis_directives, PLAN_ANALYSIS_PREFIX),
    }
}

/// 展开补缺轮的搜索指令，使用独立的 `gap-search-*` id空间
pub fn expand_follow_up(directives: &[SearchDirective]) -> ExpandedSteps {
    ExpandedSteps {
        search_steps: expand_search(directives, GAP_SEARCH_PREFIX),
        analysis_steps: vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::research::types::SourceKind;
    use std::collections::HashSet;

    fn search(query: &str, source: SourceKind) -> SearchDirective {
        SearchDirective {
            query: query.to_string(),
            rationale: "because".to_string(),
            source,
            priority: 3,
        }
    }

    fn analysis(kind: &str) -> AnalysisDirective {
        AnalysisDirective {
            analysis_type: kind.to_string(),
            description: format!("{} analysis", kind),
            importance: 3,
        }
    }

    fn sample_plan() -> ResearchPlan {
        ResearchPlan {
            search_directives: vec![
                search("q0", SourceKind::Web),
                search("q1", SourceKind::All),
                search("q2", SourceKind::Social),
                search("q3", SourceKind::Academic),
            ],
            analysis_directives: vec![analysis("trend"), analysis("consensus")],
        }
    }

    #[test]
    fn test_all_source_yields_three_steps_in_fixed_order() {
        let steps = expand(&sample_plan());
        let ids: Vec<&str> = steps.search_steps.iter().map(|s| s.id.as_str()).collect();

        assert_eq!(
            ids,
            vec![
                "search-web-0",
                "search-web-1",
                "search-academic-1",
                "search-social-1",
                "search-social-2",
                "search-academic-3",
            ]
        );
        let all_steps: Vec<_> = steps
            .search_steps
            .iter()
            .filter(|s| s.directive.query == "q1")
            .map(|s| s.source_type)
            .collect();
        assert_eq!(all_steps, SourceType::ALL.to_vec());
    }

    #[test]
    fn test_total_steps_matches_expansion() {
        let steps = expand(&sample_plan());
        assert_eq!(steps.search_steps.len(), 6);
        assert_eq!(steps.analysis_steps.len(), 2);
        assert_eq!(steps.total_steps(), 8);
        assert_eq!(steps.analysis_steps[0].id, "analysis-0");
        assert_eq!(steps.analysis_steps[1].id, "analysis-1");
    }

    #[test]
    fn test_step_ids_are_unique() {
        let steps = expand(&sample_plan());
        let ids = steps.step_ids();
        let unique: HashSet<&str> = ids.iter().copied().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn test_expand_is_idempotent() {
        let plan = sample_plan();
        assert_eq!(expand(&plan), expand(&plan));
    }

    #[test]
    fn test_x_source_becomes_social_step() {
        let directive: SearchDirective = serde_json::from_value(serde_json::json!({
            "query": "launch reactions",
            "source": "x",
            "priority": 2
        }))
        .unwrap();
        let plan = ResearchPlan {
            search_directives: vec![directive],
            analysis_directives: vec![],
        };

        let steps = expand(&plan);
        assert_eq!(steps.search_steps.len(), 1);
        assert_eq!(steps.search_steps[0].source_type, SourceType::Social);
        assert_eq!(steps.search_steps[0].id, "search-social-0");
    }

    #[test]
    fn test_follow_up_uses_gap_namespace() {
        let steps = expand_follow_up(&[
            search("g0", SourceKind::All),
            search("g1", SourceKind::Academic),
        ]);
        assert_eq!(
            steps.step_ids(),
            vec![
                "gap-search-web-0",
                "gap-search-academic-0",
                "gap-search-social-0",
                "gap-search-academic-1",
            ]
        );
        assert!(steps.analysis_steps.is_empty());
    }
}
