//! The pure recommendation algorithm
//!
//! Candidate generation walks the graph snapshot from the user's mastered
//! frontier (default mode) or backward from a goal along prerequisites
//! (target mode). Candidates are filtered, scored on four components, and
//! diversified by round-robin over weakest-tag groups.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::graph::{QuestionNode, QuestionRelation, RelationType};
use crate::mastery::split_tags;

/// Width of the improvement peak around the mastery threshold.
const IMPROVEMENT_BAND: f64 = 0.1;

/// Score weights.
const W_IMPROVEMENT: f64 = 0.45;
const W_CONSOLIDATION: f64 = 0.10;
const W_DIVERSITY: f64 = 0.30;
const W_BASE: f64 = 0.15;

/// Per-prerequisite out-degree bonus on target-mode base weights.
const PREREQ_DEGREE_BONUS: f64 = 0.02;

/// Share of the result list reserved for consolidation picks.
const CONSOLIDATION_SHARE: f64 = 0.05;

/// Candidate generation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendMode {
    /// Forward from the mastered frontier
    Default,
    /// Backward from a goal problem or tag
    Target,
}

/// Validated engine parameters.
#[derive(Debug, Clone)]
pub struct RecommendParams {
    pub mode: RecommendMode,
    pub target_question: Option<i32>,
    pub target_tag: Option<String>,
    pub limit: usize,
    pub mastery_threshold: f64,
    pub difficulty_tolerance: i32,
    pub max_depth: usize,
}

impl Default for RecommendParams {
    fn default() -> Self {
        Self {
            mode: RecommendMode::Default,
            target_question: None,
            target_tag: None,
            limit: crate::constants::DEFAULT_RECOMMEND_LIMIT,
            mastery_threshold: crate::constants::DEFAULT_MASTERY_THRESHOLD,
            difficulty_tolerance: crate::constants::DEFAULT_DIFFICULTY_TOLERANCE,
            max_depth: crate::constants::DEFAULT_MAX_DEPTH,
        }
    }
}

impl RecommendParams {
    /// Clamp every knob into its documented range.
    pub fn clamped(mut self) -> Self {
        self.limit = self.limit.clamp(1, crate::constants::MAX_RECOMMEND_LIMIT);
        self.mastery_threshold = self.mastery_threshold.clamp(0.0, 1.0);
        self.max_depth = self.max_depth.clamp(1, crate::constants::MAX_SEARCH_DEPTH);
        self
    }
}

/// Snapshot of everything the engine reads.
#[derive(Debug, Clone, Default)]
pub struct EngineInput {
    pub questions: BTreeMap<i32, QuestionNode>,
    pub relations: Vec<QuestionRelation>,
    /// Per-question mastery (accepted/attempts), absent = 0
    pub question_mastery: HashMap<i32, f64>,
    /// Per-tag mastery, absent = 0
    pub tag_mastery: HashMap<String, f64>,
    /// Difficulty rank of the most recently accepted problem, if any
    pub base_rank: Option<i32>,
}

/// Score components of one recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub improvement: f64,
    pub consolidation: f64,
    pub diversity: f64,
}

/// Why a problem was recommended: the step path toward it and its edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub path: Vec<String>,
    pub edge_types: Vec<String>,
    pub edge_weights: Vec<f64>,
    pub confidence: f64,
}

/// One ranked recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub question_id: String,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    pub explanation: Explanation,
}

/// Map a difficulty label to its rank 1-4; numeric labels pass through,
/// unknown labels rank 0.
pub fn difficulty_rank(label: &str) -> i32 {
    let s = label.trim().to_lowercase();
    let s = s.strip_suffix('级').unwrap_or(&s);
    if let Ok(n) = s.parse::<i32>() {
        return n;
    }
    match s {
        "easy" | "简单" => 1,
        "medium" | "中等" => 2,
        "hard" | "困难" => 3,
        "expert" | "非常困难" | "地狱" => 4,
        _ => 0,
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    question_number: i32,
    from: Option<i32>,
    relation_type: RelationType,
    edge_weight: f64,
    endpoint: Option<i32>,
    is_consolidation: bool,
    score: f64,
    improvement: f64,
    consolidation: f64,
    diversity: f64,
    /// Weakest-tag grouping label
    label: String,
}

/// Adjacency views the engine derives once from the relation list.
struct Adjacency {
    next_level: BTreeMap<i32, Vec<(i32, f64)>>,
    similar: BTreeMap<i32, Vec<(i32, f64)>>,
    similar_set: BTreeSet<(i32, i32)>,
    /// question -> its prerequisite sources
    prereqs_of: BTreeMap<i32, Vec<i32>>,
    /// prerequisite edge weights keyed by (from, to)
    prereq_weight: BTreeMap<(i32, i32), f64>,
    /// number of distinct prerequisite out-edges per source
    out_prereq_degree: BTreeMap<i32, usize>,
}

impl Adjacency {
    fn build(relations: &[QuestionRelation]) -> Self {
        let mut adjacency = Adjacency {
            next_level: BTreeMap::new(),
            similar: BTreeMap::new(),
            similar_set: BTreeSet::new(),
            prereqs_of: BTreeMap::new(),
            prereq_weight: BTreeMap::new(),
            out_prereq_degree: BTreeMap::new(),
        };

        for r in relations {
            let (from, to) = (r.from_question_number, r.to_question_number);
            match r.relation_type {
                RelationType::NextLevel => {
                    adjacency.next_level.entry(from).or_default().push((to, r.weight));
                }
                RelationType::Similar => {
                    adjacency.similar.entry(from).or_default().push((to, r.weight));
                    adjacency.similar_set.insert((from, to));
                }
                RelationType::Prerequisite => {
                    adjacency.prereqs_of.entry(to).or_default().push(from);
                    adjacency.prereq_weight.insert((from, to), r.weight);
                    *adjacency.out_prereq_degree.entry(from).or_insert(0) += 1;
                }
                _ => {}
            }
        }
        adjacency
    }
}

/// Run the engine. Deterministic: identical input yields identical output.
pub fn recommend(input: &EngineInput, params: RecommendParams) -> AppResult<Vec<Recommendation>> {
    let params = params.clamped();
    let adjacency = Adjacency::build(&input.relations);

    let mastered: BTreeSet<i32> = input
        .question_mastery
        .iter()
        .filter(|(_, m)| **m >= params.mastery_threshold)
        .map(|(qn, _)| *qn)
        .collect();

    // next-step and endpoint maps only exist in target mode
    let mut next_step: BTreeMap<i32, i32> = BTreeMap::new();
    let mut candidates: BTreeMap<i32, Candidate> = BTreeMap::new();
    let mut offer = |map: &mut BTreeMap<i32, Candidate>, candidate: Candidate| {
        match map.get(&candidate.question_number) {
            Some(existing) if existing.score >= candidate.score => {}
            _ => {
                map.insert(candidate.question_number, candidate);
            }
        }
    };

    match params.mode {
        RecommendMode::Default => {
            for qn in &mastered {
                if let Some(edges) = adjacency.next_level.get(qn) {
                    for (to, weight) in edges {
                        if mastered.contains(to) {
                            continue;
                        }
                        offer(
                            &mut candidates,
                            Candidate {
                                question_number: *to,
                                from: Some(*qn),
                                relation_type: RelationType::NextLevel,
                                edge_weight: *weight,
                                endpoint: None,
                                is_consolidation: false,
                                score: 0.0,
                                improvement: 0.0,
                                consolidation: 0.0,
                                diversity: 0.0,
                                label: String::new(),
                            },
                        );
                    }
                }
            }
            for qn in &mastered {
                if let Some(edges) = adjacency.similar.get(qn) {
                    for (to, weight) in edges {
                        if mastered.contains(to) {
                            continue;
                        }
                        // consolidation only counts with a reciprocal edge
                        if !adjacency.similar_set.contains(&(*to, *qn)) {
                            continue;
                        }
                        offer(
                            &mut candidates,
                            Candidate {
                                question_number: *to,
                                from: Some(*qn),
                                relation_type: RelationType::Similar,
                                edge_weight: *weight,
                                endpoint: None,
                                is_consolidation: true,
                                score: 0.0,
                                improvement: 0.0,
                                consolidation: 0.0,
                                diversity: 0.0,
                                label: String::new(),
                            },
                        );
                    }
                }
            }
        }
        RecommendMode::Target => {
            let mut targets: Vec<i32> = Vec::new();
            if let Some(target) = params.target_question {
                if !input.questions.contains_key(&target) {
                    return Err(AppError::NotFound("目标题目不存在".to_string()));
                }
                targets.push(target);
            } else if let Some(tag) = params.target_tag.as_deref() {
                let tag = tag.trim();
                if !tag.is_empty() {
                    for (qn, node) in &input.questions {
                        if split_tags(&node.tags).iter().any(|t| t == tag) {
                            targets.push(*qn);
                        }
                    }
                }
            }
            if targets.is_empty() {
                return Err(AppError::InvalidInput(
                    "目标模式需要 target_question 或 target_tag".to_string(),
                ));
            }

            // breadth-first backward expansion along prerequisites
            let mut dist: BTreeMap<i32, usize> = BTreeMap::new();
            let mut endpoint: BTreeMap<i32, i32> = BTreeMap::new();
            let mut queue: VecDeque<i32> = VecDeque::new();
            for target in &targets {
                if dist.contains_key(target) {
                    continue;
                }
                dist.insert(*target, 0);
                endpoint.insert(*target, *target);
                queue.push_back(*target);
            }
            while let Some(current) = queue.pop_front() {
                let d = dist[&current];
                if d >= params.max_depth {
                    continue;
                }
                let goal = endpoint[&current];
                if let Some(sources) = adjacency.prereqs_of.get(&current) {
                    for pre in sources {
                        if dist.contains_key(pre) {
                            continue;
                        }
                        dist.insert(*pre, d + 1);
                        next_step.insert(*pre, current);
                        endpoint.insert(*pre, goal);
                        queue.push_back(*pre);
                    }
                }
            }

            for (qn, d) in &dist {
                if *d == 0 {
                    // the explicit goal itself is never recommended; a tag
                    // goal's own problems are, when unmastered
                    if params.target_question.is_some() || mastered.contains(qn) {
                        continue;
                    }
                } else if mastered.contains(qn) {
                    continue;
                }
                let degree = adjacency.out_prereq_degree.get(qn).copied().unwrap_or(0);
                let base = 1.0 / (*d as f64 + 1.0) + PREREQ_DEGREE_BONUS * degree as f64;
                offer(
                    &mut candidates,
                    Candidate {
                        question_number: *qn,
                        from: None,
                        relation_type: RelationType::Prerequisite,
                        edge_weight: base,
                        endpoint: Some(endpoint[qn]),
                        is_consolidation: false,
                        score: 0.0,
                        improvement: 0.0,
                        consolidation: 0.0,
                        diversity: 0.0,
                        label: String::new(),
                    },
                );
            }
        }
    }

    // filters + scoring
    let mut filtered: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for (_, mut candidate) in candidates {
        let Some(node) = input.questions.get(&candidate.question_number) else {
            continue;
        };
        if node.status != crate::constants::problem_status::PUBLISHED {
            continue;
        }
        if let Some(prereqs) = adjacency.prereqs_of.get(&candidate.question_number) {
            let blocked = prereqs.iter().any(|pre| {
                input.question_mastery.get(pre).copied().unwrap_or(0.0)
                    < params.mastery_threshold
            });
            if blocked {
                continue;
            }
        }
        if let Some(base_rank) = input.base_rank {
            if params.difficulty_tolerance >= 0
                && (difficulty_rank(&node.difficulty) - base_rank).abs()
                    > params.difficulty_tolerance
            {
                continue;
            }
        }

        let mastery = input
            .question_mastery
            .get(&candidate.question_number)
            .copied()
            .unwrap_or(0.0);
        candidate.improvement = improvement_score(mastery, params.mastery_threshold);
        candidate.consolidation = if candidate.is_consolidation { 1.0 } else { 0.0 };

        let (label, min_mastery) = weakest_tag(&node.tags, &input.tag_mastery);
        candidate.diversity = if label.is_empty() { 0.0 } else { 1.0 - min_mastery };
        candidate.label = label;

        candidate.score = W_IMPROVEMENT * candidate.improvement
            + W_CONSOLIDATION * candidate.consolidation
            + W_DIVERSITY * candidate.diversity
            + W_BASE * candidate.edge_weight.min(1.0);
        filtered.push(candidate);
    }

    filtered.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.question_number.cmp(&b.question_number))
    });

    let selected = diversify(filtered, params.limit);

    Ok(selected
        .into_iter()
        .map(|candidate| {
            let (path, edge_types, edge_weights) =
                explain_path(&candidate, params.mode, params.max_depth, &next_step, &adjacency);
            Recommendation {
                question_id: candidate.question_number.to_string(),
                score: candidate.score,
                breakdown: ScoreBreakdown {
                    improvement: candidate.improvement,
                    consolidation: candidate.consolidation,
                    diversity: candidate.diversity,
                },
                explanation: Explanation {
                    path: vec![path],
                    edge_types,
                    edge_weights,
                    confidence: candidate.score,
                },
            }
        })
        .collect())
}

/// Peaks at the threshold and falls off linearly over the band width.
fn improvement_score(mastery: f64, threshold: f64) -> f64 {
    let distance = (mastery - threshold).abs();
    if distance >= IMPROVEMENT_BAND {
        0.0
    } else {
        1.0 - distance / IMPROVEMENT_BAND
    }
}

/// The candidate's weakest tag and its mastery; first tag wins ties.
fn weakest_tag(tags: &str, tag_mastery: &HashMap<String, f64>) -> (String, f64) {
    let mut best_tag = String::new();
    let mut best_mastery = 1.0;
    for tag in split_tags(tags) {
        let mastery = tag_mastery.get(&tag).copied().unwrap_or(0.0);
        if best_tag.is_empty() || mastery < best_mastery {
            best_tag = tag;
            best_mastery = mastery;
        }
    }
    (best_tag, best_mastery)
}

/// Round-robin across weakest-tag groups, then enforce the consolidation
/// quota by replacing the weakest non-consolidation picks.
fn diversify(filtered: Vec<Candidate>, limit: usize) -> Vec<Candidate> {
    let required_consolidation = (limit as f64 * CONSOLIDATION_SHARE).floor() as usize;

    // group by label, preserving the score ordering inside each group
    let mut groups: BTreeMap<String, VecDeque<usize>> = BTreeMap::new();
    let mut label_order: Vec<String> = Vec::new();
    for (idx, candidate) in filtered.iter().enumerate() {
        let label = if candidate.label.is_empty() {
            "_".to_string()
        } else {
            candidate.label.clone()
        };
        if !groups.contains_key(&label) {
            label_order.push(label.clone());
        }
        groups.entry(label).or_default().push_back(idx);
    }
    // order groups by their best candidate's score, label as tiebreak
    label_order.sort_by(|a, b| {
        let score_a = filtered[groups[a][0]].score;
        let score_b = filtered[groups[b][0]].score;
        score_b
            .partial_cmp(&score_a)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(b))
    });

    let mut selected_idx: Vec<usize> = Vec::new();
    let mut used: BTreeSet<usize> = BTreeSet::new();
    while selected_idx.len() < limit {
        let mut progress = false;
        for label in &label_order {
            let group = groups.get_mut(label).unwrap();
            while let Some(front) = group.front() {
                if used.contains(front) {
                    group.pop_front();
                } else {
                    break;
                }
            }
            let Some(&idx) = group.front() else { continue };
            group.pop_front();
            used.insert(idx);
            selected_idx.push(idx);
            progress = true;
            if selected_idx.len() >= limit {
                break;
            }
        }
        if !progress {
            break;
        }
    }

    // consolidation quota
    if required_consolidation > 0 {
        let mut have = selected_idx
            .iter()
            .filter(|&&i| filtered[i].is_consolidation)
            .count();
        if have < required_consolidation {
            for (idx, candidate) in filtered.iter().enumerate() {
                if have >= required_consolidation {
                    break;
                }
                if !candidate.is_consolidation || used.contains(&idx) {
                    continue;
                }
                if selected_idx.len() < limit {
                    selected_idx.push(idx);
                    used.insert(idx);
                    have += 1;
                    continue;
                }
                // replace the last non-consolidation pick
                for slot in (0..selected_idx.len()).rev() {
                    if !filtered[selected_idx[slot]].is_consolidation {
                        used.remove(&selected_idx[slot]);
                        selected_idx[slot] = idx;
                        used.insert(idx);
                        have += 1;
                        break;
                    }
                }
            }
        }
    }

    selected_idx.into_iter().map(|i| filtered[i].clone()).collect()
}

/// Build the explanation path for one pick.
fn explain_path(
    candidate: &Candidate,
    mode: RecommendMode,
    max_depth: usize,
    next_step: &BTreeMap<i32, i32>,
    adjacency: &Adjacency,
) -> (String, Vec<String>, Vec<f64>) {
    if mode != RecommendMode::Target {
        let path = match candidate.from {
            Some(from) => format!("{}→{}", from, candidate.question_number),
            None => candidate.question_number.to_string(),
        };
        return (
            path,
            vec![candidate.relation_type.as_str().to_string()],
            vec![candidate.edge_weight],
        );
    }

    // walk from the candidate toward the goal it was discovered from
    let end = candidate.endpoint.unwrap_or(candidate.question_number);
    let mut path = vec![candidate.question_number];
    let mut cursor = candidate.question_number;
    while cursor != end {
        let Some(&next) = next_step.get(&cursor) else {
            break;
        };
        path.push(next);
        cursor = next;
        if path.len() > max_depth + 2 {
            break;
        }
    }

    let mut edge_types = Vec::with_capacity(path.len().saturating_sub(1));
    let mut edge_weights = Vec::with_capacity(path.len().saturating_sub(1));
    for window in path.windows(2) {
        edge_types.push(RelationType::Prerequisite.as_str().to_string());
        edge_weights.push(
            adjacency
                .prereq_weight
                .get(&(window[0], window[1]))
                .copied()
                .unwrap_or(1.0),
        );
    }

    let joined = path
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join("→");
    (joined, edge_types, edge_weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn node(number: i32, tags: &str, difficulty: &str, status: &str) -> QuestionNode {
        let now = Utc::now();
        QuestionNode {
            question_number: number,
            question_id: String::new(),
            title: format!("q{}", number),
            difficulty: difficulty.to_string(),
            tags: tags.to_string(),
            status: status.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn edge(from: i32, to: i32, t: RelationType, weight: f64) -> QuestionRelation {
        QuestionRelation {
            from_question_number: from,
            to_question_number: to,
            relation_type: t,
            weight,
            description: String::new(),
            auto: false,
            created_at: Utc::now(),
        }
    }

    fn input(nodes: Vec<QuestionNode>, relations: Vec<QuestionRelation>) -> EngineInput {
        EngineInput {
            questions: nodes.into_iter().map(|n| (n.question_number, n)).collect(),
            relations,
            question_mastery: HashMap::new(),
            tag_mastery: HashMap::new(),
            base_rank: None,
        }
    }

    #[test]
    fn test_difficulty_rank_table() {
        assert_eq!(difficulty_rank("Easy"), 1);
        assert_eq!(difficulty_rank("简单"), 1);
        assert_eq!(difficulty_rank("Medium"), 2);
        assert_eq!(difficulty_rank("困难"), 3);
        assert_eq!(difficulty_rank("expert"), 4);
        assert_eq!(difficulty_rank("地狱"), 4);
        assert_eq!(difficulty_rank("3"), 3);
        assert_eq!(difficulty_rank("2级"), 2);
        assert_eq!(difficulty_rank("???"), 0);
    }

    #[test]
    fn test_improvement_peaks_at_threshold() {
        assert_eq!(improvement_score(0.7, 0.7), 1.0);
        assert!((improvement_score(0.65, 0.7) - 0.5).abs() < 1e-9);
        assert_eq!(improvement_score(0.5, 0.7), 0.0);
        assert_eq!(improvement_score(0.9, 0.7), 0.0);
    }

    #[test]
    fn test_default_mode_next_level_candidate() {
        // A mastered at 0.9; A -NEXT_LEVEL-> B; B's only prerequisite is A
        let mut engine_input = input(
            vec![
                node(1001, "dp", "Easy", "published"),
                node(1002, "dp", "Easy", "published"),
            ],
            vec![
                edge(1001, 1002, RelationType::NextLevel, 1.0),
                edge(1001, 1002, RelationType::Prerequisite, 1.0),
            ],
        );
        engine_input.question_mastery.insert(1001, 0.9);

        // threshold 0 puts the unattempted candidate right at the peak of
        // the improvement band
        let recs = recommend(
            &engine_input,
            RecommendParams {
                limit: 1,
                mastery_threshold: 0.0,
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(recs.len(), 1);
        let rec = &recs[0];
        assert_eq!(rec.question_id, "1002");
        assert!(rec.breakdown.improvement >= 0.9);
        assert_eq!(rec.explanation.path, vec!["1001→1002".to_string()]);
        assert_eq!(rec.explanation.edge_types, vec!["NEXT_LEVEL".to_string()]);
        assert_eq!(rec.explanation.edge_weights, vec![1.0]);
    }

    #[test]
    fn test_improvement_is_zero_far_below_threshold() {
        let mut engine_input = input(
            vec![
                node(1001, "", "", "published"),
                node(1002, "", "", "published"),
            ],
            vec![edge(1001, 1002, RelationType::NextLevel, 1.0)],
        );
        engine_input.question_mastery.insert(1001, 0.9);

        let recs = recommend(&engine_input, RecommendParams::default()).unwrap();
        assert_eq!(recs.len(), 1);
        // unattempted candidate sits far below the 0.7 threshold
        assert_eq!(recs[0].breakdown.improvement, 0.0);
    }

    #[test]
    fn test_default_mode_drops_mastered_targets() {
        let mut engine_input = input(
            vec![
                node(1, "", "", "published"),
                node(2, "", "", "published"),
            ],
            vec![edge(1, 2, RelationType::NextLevel, 1.0)],
        );
        engine_input.question_mastery.insert(1, 0.9);
        engine_input.question_mastery.insert(2, 0.95);

        let recs = recommend(&engine_input, RecommendParams::default()).unwrap();
        assert!(recs.is_empty());
    }

    #[test]
    fn test_similar_requires_reciprocal_edge() {
        let mut engine_input = input(
            vec![
                node(1, "", "", "published"),
                node(2, "", "", "published"),
                node(3, "", "", "published"),
            ],
            vec![
                // one-way similar: not a candidate
                edge(1, 2, RelationType::Similar, 1.0),
                // reciprocal similar: consolidation candidate
                edge(1, 3, RelationType::Similar, 1.0),
                edge(3, 1, RelationType::Similar, 1.0),
            ],
        );
        engine_input.question_mastery.insert(1, 0.9);

        let recs = recommend(&engine_input, RecommendParams::default()).unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].question_id, "3");
        assert_eq!(recs[0].breakdown.consolidation, 1.0);
    }

    #[test]
    fn test_unpublished_filtered() {
        let mut engine_input = input(
            vec![
                node(1, "", "", "published"),
                node(2, "", "", "draft"),
            ],
            vec![edge(1, 2, RelationType::NextLevel, 1.0)],
        );
        engine_input.question_mastery.insert(1, 0.9);

        let recs = recommend(&engine_input, RecommendParams::default()).unwrap();
        assert!(recs.is_empty());
    }

    #[test]
    fn test_prerequisite_gate() {
        // 1 -> 3 and 2 -> 3 are prerequisites; only 1 is mastered
        let mut engine_input = input(
            vec![
                node(1, "", "", "published"),
                node(2, "", "", "published"),
                node(3, "", "", "published"),
            ],
            vec![
                edge(1, 3, RelationType::NextLevel, 1.0),
                edge(1, 3, RelationType::Prerequisite, 1.0),
                edge(2, 3, RelationType::Prerequisite, 1.0),
            ],
        );
        engine_input.question_mastery.insert(1, 0.9);

        let recs = recommend(&engine_input, RecommendParams::default()).unwrap();
        assert!(recs.is_empty());
    }

    #[test]
    fn test_difficulty_tolerance_filter() {
        let mut engine_input = input(
            vec![
                node(1, "", "Easy", "published"),
                node(2, "", "Hard", "published"),
                node(3, "", "Medium", "published"),
            ],
            vec![
                edge(1, 2, RelationType::NextLevel, 1.0),
                edge(1, 3, RelationType::NextLevel, 1.0),
            ],
        );
        engine_input.question_mastery.insert(1, 0.9);
        engine_input.base_rank = Some(1); // last accepted was Easy

        let recs = recommend(&engine_input, RecommendParams::default()).unwrap();
        // Hard (rank 3) is outside tolerance 1 of base 1; Medium passes
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].question_id, "3");
    }

    #[test]
    fn test_target_mode_requires_target() {
        let engine_input = input(vec![node(1, "", "", "published")], vec![]);
        let result = recommend(
            &engine_input,
            RecommendParams {
                mode: RecommendMode::Target,
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_target_mode_missing_question() {
        let engine_input = input(vec![node(1, "", "", "published")], vec![]);
        let result = recommend(
            &engine_input,
            RecommendParams {
                mode: RecommendMode::Target,
                target_question: Some(42),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_target_mode_backward_path() {
        // chain 1 -PREREQUISITE-> 2 -PREREQUISITE-> 3, goal 3. Node 2 is
        // blocked by its unmastered prerequisite 1; the leaf 1 survives and
        // explains the full path forward to the goal.
        let engine_input = input(
            vec![
                node(1, "", "", "published"),
                node(2, "", "", "published"),
                node(3, "", "", "published"),
            ],
            vec![
                edge(1, 2, RelationType::Prerequisite, 1.0),
                edge(2, 3, RelationType::Prerequisite, 2.0),
            ],
        );

        let recs = recommend(
            &engine_input,
            RecommendParams {
                mode: RecommendMode::Target,
                target_question: Some(3),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(recs.len(), 1);
        let rec1 = &recs[0];
        assert_eq!(rec1.question_id, "1");
        assert_eq!(rec1.explanation.path, vec!["1→2→3".to_string()]);
        assert_eq!(
            rec1.explanation.edge_types,
            vec!["PREREQUISITE".to_string(), "PREREQUISITE".to_string()]
        );
        assert_eq!(rec1.explanation.edge_weights, vec![1.0, 2.0]);
    }

    #[test]
    fn test_target_mode_blocked_branch_unblocks_with_mastery() {
        // once the prerequisite is mastered, the next step up the chain
        // becomes the candidate and the leaf drops out as mastered
        let mut engine_input = input(
            vec![
                node(1, "", "", "published"),
                node(2, "", "", "published"),
                node(3, "", "", "published"),
            ],
            vec![
                edge(1, 2, RelationType::Prerequisite, 1.0),
                edge(2, 3, RelationType::Prerequisite, 1.0),
            ],
        );
        engine_input.question_mastery.insert(1, 0.9);

        let recs = recommend(
            &engine_input,
            RecommendParams {
                mode: RecommendMode::Target,
                target_question: Some(3),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].question_id, "2");
    }

    #[test]
    fn test_target_mode_base_weight_closer_is_larger() {
        // two independent leaves toward the goal: b at distance 1, a at
        // distance 2 (through c, which is itself blocked by a)
        let engine_input = input(
            vec![
                node(1, "", "", "published"), // a
                node(2, "", "", "published"), // b
                node(3, "", "", "published"), // c
                node(4, "", "", "published"), // goal
            ],
            vec![
                edge(1, 3, RelationType::Prerequisite, 1.0),
                edge(3, 4, RelationType::Prerequisite, 1.0),
                edge(2, 4, RelationType::Prerequisite, 1.0),
            ],
        );

        let recs = recommend(
            &engine_input,
            RecommendParams {
                mode: RecommendMode::Target,
                target_question: Some(4),
                ..Default::default()
            },
        )
        .unwrap();

        let near = recs.iter().find(|r| r.question_id == "2").unwrap();
        let far = recs.iter().find(|r| r.question_id == "1").unwrap();
        assert!(near.score > far.score);
    }

    #[test]
    fn test_target_mode_respects_max_depth() {
        // b -> c -> goal; with depth 1 the leaf b is never discovered and c
        // is blocked, so nothing remains
        let engine_input = input(
            vec![
                node(1, "", "", "published"), // b
                node(2, "", "", "published"), // c
                node(3, "", "", "published"), // goal
            ],
            vec![
                edge(1, 2, RelationType::Prerequisite, 1.0),
                edge(2, 3, RelationType::Prerequisite, 1.0),
            ],
        );

        let shallow = recommend(
            &engine_input,
            RecommendParams {
                mode: RecommendMode::Target,
                target_question: Some(3),
                max_depth: 1,
                ..Default::default()
            },
        )
        .unwrap();
        assert!(shallow.is_empty());

        let deep = recommend(
            &engine_input,
            RecommendParams {
                mode: RecommendMode::Target,
                target_question: Some(3),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(deep.len(), 1);
        assert_eq!(deep[0].question_id, "1");
    }

    #[test]
    fn test_diversity_component() {
        let mut engine_input = input(
            vec![
                node(1, "", "", "published"),
                node(2, "dp,graph", "", "published"),
            ],
            vec![edge(1, 2, RelationType::NextLevel, 1.0)],
        );
        engine_input.question_mastery.insert(1, 0.9);
        engine_input.tag_mastery.insert("dp".to_string(), 0.8);
        engine_input.tag_mastery.insert("graph".to_string(), 0.2);

        let recs = recommend(&engine_input, RecommendParams::default()).unwrap();
        // weakest tag is graph at 0.2 -> diversity 0.8
        assert!((recs[0].breakdown.diversity - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_round_robin_diversification() {
        // two dp candidates outscore the graph one, but round-robin
        // alternates groups
        let mut engine_input = input(
            vec![
                node(1, "", "", "published"),
                node(2, "dp", "", "published"),
                node(3, "dp", "", "published"),
                node(4, "graph", "", "published"),
            ],
            vec![
                edge(1, 2, RelationType::NextLevel, 1.0),
                edge(1, 3, RelationType::NextLevel, 0.9),
                edge(1, 4, RelationType::NextLevel, 0.1),
            ],
        );
        engine_input.question_mastery.insert(1, 0.9);
        engine_input.tag_mastery.insert("dp".to_string(), 0.1);
        engine_input.tag_mastery.insert("graph".to_string(), 0.5);

        let recs = recommend(
            &engine_input,
            RecommendParams {
                limit: 2,
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(recs.len(), 2);
        let picked: Vec<&str> = recs.iter().map(|r| r.question_id.as_str()).collect();
        // one from the dp group, one from the graph group
        assert!(picked.contains(&"2"));
        assert!(picked.contains(&"4"));
    }

    #[test]
    fn test_consolidation_quota_replacement() {
        // limit 20 -> quota 1; build 20+ improvement candidates and one
        // low-scoring consolidation candidate
        let mut nodes = vec![node(1, "", "", "published")];
        let mut relations = Vec::new();
        for i in 2..30 {
            nodes.push(node(i, &format!("t{}", i), "", "published"));
            relations.push(edge(1, i, RelationType::NextLevel, 1.0));
        }
        nodes.push(node(99, "t99", "", "published"));
        relations.push(edge(1, 99, RelationType::Similar, 0.1));
        relations.push(edge(99, 1, RelationType::Similar, 0.1));

        let mut engine_input = input(nodes, relations);
        engine_input.question_mastery.insert(1, 0.9);
        // make the consolidation pick score worst on diversity
        engine_input.tag_mastery.insert("t99".to_string(), 0.99);

        let recs = recommend(
            &engine_input,
            RecommendParams {
                limit: 20,
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(recs.len(), 20);
        let consolidation_count = recs
            .iter()
            .filter(|r| r.breakdown.consolidation == 1.0)
            .count();
        assert!(consolidation_count >= 1);
    }

    #[test]
    fn test_determinism() {
        let mut engine_input = input(
            vec![
                node(1, "a", "", "published"),
                node(2, "a,b", "", "published"),
                node(3, "b", "", "published"),
                node(4, "c", "", "published"),
            ],
            vec![
                edge(1, 2, RelationType::NextLevel, 0.5),
                edge(1, 3, RelationType::NextLevel, 0.7),
                edge(1, 4, RelationType::NextLevel, 0.9),
            ],
        );
        engine_input.question_mastery.insert(1, 0.9);
        engine_input.tag_mastery.insert("a".to_string(), 0.4);

        let first = recommend(&engine_input, RecommendParams::default()).unwrap();
        for _ in 0..5 {
            let again = recommend(&engine_input, RecommendParams::default()).unwrap();
            assert_eq!(first, again);
        }
    }
}
