//! Graph service
//!
//! CRUD over the graph projection plus the derived queries: prerequisites,
//! next-level, shortest learning path, per-question recommendations, solved
//! edges, mastery edges, and the reconciliation that rewrites the projection
//! from the relational source of truth.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::repositories::{ProblemRepository, RelationRepository};
use crate::error::AppResult;
use crate::mastery::skill_keys_from_tags;
use crate::models::{Problem, Relation};

use super::store::GraphStore;
use super::types::{
    GraphRecommendation, LearningPath, QuestionNode, QuestionRelation, QuestionSkillRelation,
    RelationType, SkillNode, SkillRelation, SkillRelationType, SolvedEdge, UserMasteryEntry,
};

/// Fixed weight of name-containment skill edges.
const SUBSUMES_WEIGHT: f64 = 0.6;

/// Graph service over the arena store. Cloning is cheap; all clones share
/// the same store.
#[derive(Clone)]
pub struct GraphService {
    store: Arc<GraphStore>,
}

impl GraphService {
    pub fn new(store: Arc<GraphStore>) -> Self {
        Self { store }
    }

    // ------------------------------------------------------------------
    // Node and edge CRUD
    // ------------------------------------------------------------------

    pub async fn upsert_question(&self, node: QuestionNode) -> AppResult<()> {
        self.store.upsert_question(node).await;
        Ok(())
    }

    pub async fn delete_question(&self, question_number: i32) -> AppResult<()> {
        self.store.delete_question(question_number).await;
        Ok(())
    }

    pub async fn upsert_relation(
        &self,
        from: i32,
        to: i32,
        relation_type: RelationType,
        weight: f64,
        description: String,
    ) -> AppResult<()> {
        self.store
            .upsert_relation(QuestionRelation {
                from_question_number: from,
                to_question_number: to,
                relation_type,
                weight,
                description,
                auto: false,
                created_at: Utc::now(),
            })
            .await;
        Ok(())
    }

    pub async fn delete_relation(
        &self,
        from: i32,
        to: i32,
        relation_type: RelationType,
    ) -> AppResult<bool> {
        Ok(self.store.delete_relation(from, to, relation_type).await)
    }

    pub async fn list_questions(&self) -> Vec<QuestionNode> {
        self.store.list_questions().await
    }

    pub async fn list_relations(&self) -> Vec<QuestionRelation> {
        self.store
            .list_relations(&[
                RelationType::Prerequisite,
                RelationType::NextLevel,
                RelationType::Similar,
                RelationType::Category,
                RelationType::TagSimilar,
            ])
            .await
    }

    pub async fn list_skills(&self) -> Vec<SkillNode> {
        self.store.list_skills().await
    }

    pub async fn list_skill_relations(&self) -> Vec<SkillRelation> {
        self.store.list_skill_relations().await
    }

    pub async fn list_question_skill_relations(&self) -> Vec<QuestionSkillRelation> {
        self.store.list_question_skills().await
    }

    // ------------------------------------------------------------------
    // Derived queries
    // ------------------------------------------------------------------

    /// All `pre -[:PREREQUISITE]-> q` sources, ordered by question number.
    pub async fn prerequisites(&self, question_number: i32) -> Vec<QuestionNode> {
        let mut numbers: Vec<i32> = self
            .store
            .in_edges(question_number, RelationType::Prerequisite)
            .await
            .into_iter()
            .map(|(from, _)| from)
            .collect();
        numbers.sort_unstable();
        self.resolve_nodes(&numbers).await
    }

    /// All `q -[:NEXT_LEVEL]-> next` targets, ordered by question number.
    pub async fn next_level(&self, question_number: i32) -> Vec<QuestionNode> {
        let mut numbers: Vec<i32> = self
            .store
            .out_edges(question_number, RelationType::NextLevel)
            .await
            .into_iter()
            .map(|(to, _)| to)
            .collect();
        numbers.sort_unstable();
        self.resolve_nodes(&numbers).await
    }

    async fn resolve_nodes(&self, numbers: &[i32]) -> Vec<QuestionNode> {
        let mut nodes = Vec::with_capacity(numbers.len());
        for n in numbers {
            if let Some(node) = self.store.get_question(*n).await {
                nodes.push(node);
            }
        }
        nodes
    }

    /// Fewest-hops path from `start` to `end` over the union of PREREQUISITE
    /// and NEXT_LEVEL edges; returns the node sequence and summed weights.
    pub async fn shortest_path(&self, start: i32, end: i32) -> Option<LearningPath> {
        if self.store.get_question(start).await.is_none()
            || self.store.get_question(end).await.is_none()
        {
            return None;
        }

        // adjacency snapshot so the search runs against one consistent state
        let relations = self
            .store
            .list_relations(&[RelationType::Prerequisite, RelationType::NextLevel])
            .await;
        let mut adjacency: HashMap<i32, Vec<(i32, f64)>> = HashMap::new();
        for r in &relations {
            adjacency
                .entry(r.from_question_number)
                .or_default()
                .push((r.to_question_number, r.weight));
        }

        let mut parent: HashMap<i32, (i32, f64)> = HashMap::new();
        let mut visited: BTreeSet<i32> = BTreeSet::from([start]);
        let mut queue: VecDeque<i32> = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            if current == end {
                break;
            }
            let Some(neighbors) = adjacency.get(&current) else {
                continue;
            };
            for (next, weight) in neighbors {
                if visited.insert(*next) {
                    parent.insert(*next, (current, *weight));
                    queue.push_back(*next);
                }
            }
        }

        if start != end && !parent.contains_key(&end) {
            return None;
        }

        let mut path = vec![end];
        let mut total_weight = 0.0;
        let mut cursor = end;
        while cursor != start {
            let (prev, weight) = parent[&cursor];
            total_weight += weight;
            path.push(prev);
            cursor = prev;
        }
        path.reverse();

        Some(LearningPath {
            start_question: start,
            end_question: end,
            path_length: path.len() - 1,
            path,
            total_weight,
        })
    }

    /// Per-question recommendations: direct NEXT_LEVEL/SIMILAR edges, shared
    /// tags, and skill co-occurrence, deduplicated by target keeping the
    /// best-scoring explanation.
    pub async fn recommend(&self, question_number: i32, limit: usize) -> Vec<GraphRecommendation> {
        let mut best: BTreeMap<i32, GraphRecommendation> = BTreeMap::new();
        let mut offer = |candidate: GraphRecommendation| {
            match best.get(&candidate.question_number) {
                Some(existing) if existing.score >= candidate.score => {}
                _ => {
                    best.insert(candidate.question_number, candidate);
                }
            }
        };

        // direct NEXT_LEVEL / SIMILAR edges
        for (relation_type, reason) in [
            (RelationType::NextLevel, "进阶题目"),
            (RelationType::Similar, "相似题目"),
        ] {
            for (to, weight) in self.store.out_edges(question_number, relation_type).await {
                let Some(node) = self.published(to).await else {
                    continue;
                };
                offer(Self::recommendation(
                    &node,
                    weight,
                    relation_type.as_str(),
                    reason.to_string(),
                    String::new(),
                ));
            }
        }

        // two-hop through shared skills
        let own_skills = self.store.skills_of(question_number).await;
        let mut shared_counts: BTreeMap<i32, f64> = BTreeMap::new();
        for skill in &own_skills {
            for other in self.store.questions_with_skill(skill).await {
                if other != question_number {
                    *shared_counts.entry(other).or_insert(0.0) += 1.0;
                }
            }
        }
        for (other, shared) in &shared_counts {
            let Some(node) = self.published(*other).await else {
                continue;
            };
            offer(Self::recommendation(
                &node,
                *shared,
                "TAG",
                format!("同标签: {} 个", *shared as i64),
                String::new(),
            ));
        }

        // two-hop through skill co-occurrence
        let mut co_occur_scores: BTreeMap<i32, f64> = BTreeMap::new();
        for skill in &own_skills {
            for (neighbor_skill, weight) in self.store.co_occur_neighbors(skill).await {
                for other in self.store.questions_with_skill(&neighbor_skill).await {
                    if other != question_number {
                        *co_occur_scores.entry(other).or_insert(0.0) += weight;
                    }
                }
            }
        }
        for (other, score) in &co_occur_scores {
            let Some(node) = self.published(*other).await else {
                continue;
            };
            offer(Self::recommendation(
                &node,
                *score,
                "TAG_CO_OCCUR",
                "共现标签".to_string(),
                String::new(),
            ));
        }

        let mut out: Vec<GraphRecommendation> = best.into_values().collect();
        out.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.question_number.cmp(&b.question_number))
        });
        out.truncate(limit);
        out
    }

    async fn published(&self, question_number: i32) -> Option<QuestionNode> {
        self.store
            .get_question(question_number)
            .await
            .filter(|n| n.status == crate::constants::problem_status::PUBLISHED)
    }

    fn recommendation(
        node: &QuestionNode,
        score: f64,
        relation_type: &str,
        reason: String,
        skill_key: String,
    ) -> GraphRecommendation {
        GraphRecommendation {
            question_number: node.question_number,
            question_id: node.question_id.clone(),
            title: node.title.clone(),
            difficulty: node.difficulty.clone(),
            score,
            relation_type: relation_type.to_string(),
            reason,
            skill_key,
        }
    }

    // ------------------------------------------------------------------
    // User edges
    // ------------------------------------------------------------------

    pub async fn mark_solved(&self, user_uuid: &Uuid, question_number: i32) -> AppResult<()> {
        self.store
            .mark_solved(user_uuid, question_number, Utc::now())
            .await;
        Ok(())
    }

    pub async fn solved_questions(&self, user_uuid: &Uuid) -> BTreeSet<i32> {
        self.store.solved_by(user_uuid).await
    }

    pub async fn solved_edges(&self, user_uuid: &Uuid) -> Vec<SolvedEdge> {
        self.store.solved_edges_of(user_uuid).await
    }

    pub async fn get_user_mastery(&self, user_uuid: &Uuid) -> Vec<UserMasteryEntry> {
        self.store.user_mastery(user_uuid).await
    }

    pub async fn update_user_mastery(
        &self,
        user_uuid: &Uuid,
        skill_key: &str,
        mastery: f64,
    ) -> AppResult<()> {
        self.store
            .upsert_user_mastery(user_uuid, skill_key, mastery)
            .await;
        Ok(())
    }

    /// Published problems that touch any target skill and are not yet
    /// solved by the user. With no targets, unsolved published problems are
    /// offered as entry points.
    pub async fn recommend_by_skills(
        &self,
        user_uuid: &Uuid,
        target_skills: &[String],
        limit: usize,
    ) -> Vec<GraphRecommendation> {
        let solved = self.store.solved_by(user_uuid).await;
        let mut out = Vec::new();

        for node in self.store.list_questions().await {
            if node.status != crate::constants::problem_status::PUBLISHED
                || solved.contains(&node.question_number)
            {
                continue;
            }

            let skills = self.store.skills_of(node.question_number).await;
            if target_skills.is_empty() {
                out.push(Self::recommendation(
                    &node,
                    1.0,
                    "TAG",
                    "入门推荐".to_string(),
                    skills.first().cloned().unwrap_or_default(),
                ));
                continue;
            }

            let matched: Vec<&String> = skills
                .iter()
                .filter(|s| target_skills.contains(s))
                .collect();
            if matched.is_empty() {
                continue;
            }
            let skill_key = matched[0].clone();
            out.push(Self::recommendation(
                &node,
                matched.len() as f64,
                "TAG",
                format!("涉及目标技能: {}", skill_key),
                skill_key,
            ));
        }

        out.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.question_number.cmp(&b.question_number))
        });
        out.truncate(limit);
        out
    }

    // ------------------------------------------------------------------
    // Reconciliation
    // ------------------------------------------------------------------

    /// Rewrite the projection from the relational store: nodes, explicit
    /// edges, and every auto-derived entity.
    pub async fn init_graph(&self, pool: &PgPool) -> AppResult<()> {
        let problems = ProblemRepository::list_all(pool).await?;
        let relations = RelationRepository::list_all(pool).await?;
        self.reconcile(&problems, &relations).await;
        Ok(())
    }

    /// Reconciliation against already-loaded relational data.
    pub async fn reconcile(&self, problems: &[Problem], relations: &[Relation]) {
        let now = Utc::now();

        // 1) question nodes: upsert changed or missing, drop graph-only
        let mut db_numbers: BTreeSet<i32> = BTreeSet::new();
        let graph_nodes: BTreeMap<i32, QuestionNode> = self
            .store
            .list_questions()
            .await
            .into_iter()
            .map(|n| (n.question_number, n))
            .collect();

        for problem in problems {
            db_numbers.insert(problem.question_number);
            let desired = QuestionNode {
                question_number: problem.question_number,
                question_id: problem.question_id.clone().unwrap_or_default(),
                title: problem.title.clone(),
                difficulty: problem.difficulty.clone(),
                tags: problem.tags.clone(),
                status: problem.status.clone(),
                created_at: now,
                updated_at: now,
            };
            match graph_nodes.get(&problem.question_number) {
                Some(existing) if existing.same_content(&desired) => {}
                _ => self.store.upsert_question(desired).await,
            }
        }
        for number in graph_nodes.keys() {
            if !db_numbers.contains(number) {
                self.store.delete_question(*number).await;
            }
        }

        // 2) explicit edges: create missing with weight 1, delete graph-only
        let mut desired_edges: BTreeSet<(i32, i32, RelationType)> = BTreeSet::new();
        for r in relations {
            let Some(relation_type) = RelationType::parse(&r.relation) else {
                continue;
            };
            if !RelationType::EXPLICIT.contains(&relation_type) {
                continue;
            }
            if !db_numbers.contains(&r.source_number) || !db_numbers.contains(&r.target_number) {
                continue;
            }
            desired_edges.insert((r.source_number, r.target_number, relation_type));
        }

        let existing_edges: BTreeSet<(i32, i32, RelationType)> = self
            .store
            .list_relations(RelationType::EXPLICIT)
            .await
            .into_iter()
            .map(|r| {
                (
                    r.from_question_number,
                    r.to_question_number,
                    r.relation_type,
                )
            })
            .collect();

        for (from, to, relation_type) in desired_edges.difference(&existing_edges) {
            self.store
                .upsert_relation(QuestionRelation {
                    from_question_number: *from,
                    to_question_number: *to,
                    relation_type: *relation_type,
                    weight: 1.0,
                    description: String::new(),
                    auto: false,
                    created_at: now,
                })
                .await;
        }
        for (from, to, relation_type) in existing_edges.difference(&desired_edges) {
            self.store.delete_relation(*from, *to, *relation_type).await;
        }

        // 3) auto skill entities, rebuilt from scratch
        for problem in problems {
            let skills: Vec<SkillNode> = skill_keys_from_tags(&problem.tags)
                .into_iter()
                .map(|key| SkillNode {
                    name: key.clone(),
                    key,
                    created_at: now,
                    updated_at: now,
                })
                .collect();
            self.store
                .set_question_skills(problem.question_number, &skills)
                .await;
        }

        self.store.clear_skill_relations().await;
        for rel in build_auto_skill_relations(problems) {
            self.store
                .upsert_skill_relation(&rel.from_key, &rel.to_key, rel.relation_type, rel.weight, now)
                .await;
        }

        // 4) TAG_SIMILAR, rebuilt from scratch over published problems
        self.store.clear_auto_relations(RelationType::TagSimilar).await;
        let published: Vec<&Problem> = problems
            .iter()
            .filter(|p| p.status == crate::constants::problem_status::PUBLISHED)
            .collect();
        for (i, a) in published.iter().enumerate() {
            let keys_a: BTreeSet<String> =
                skill_keys_from_tags(&a.tags).into_iter().collect();
            if keys_a.is_empty() {
                continue;
            }
            for b in published.iter().skip(i + 1) {
                let keys_b: BTreeSet<String> =
                    skill_keys_from_tags(&b.tags).into_iter().collect();
                let shared = keys_a.intersection(&keys_b).count();
                if shared == 0 {
                    continue;
                }
                for (from, to) in [
                    (a.question_number, b.question_number),
                    (b.question_number, a.question_number),
                ] {
                    self.store
                        .upsert_relation(QuestionRelation {
                            from_question_number: from,
                            to_question_number: to,
                            relation_type: RelationType::TagSimilar,
                            weight: shared as f64,
                            description: format!("shared_tags:{}", shared),
                            auto: true,
                            created_at: now,
                        })
                        .await;
                }
            }
        }
    }
}

/// Auto-derived skill-skill relations from the problem list: co-occurrence
/// counts plus name-containment (general -> specific, both keys >= 2 chars).
pub fn build_auto_skill_relations(problems: &[Problem]) -> Vec<SkillRelation> {
    let mut co_occur: BTreeMap<(String, String), f64> = BTreeMap::new();
    let mut all_keys: BTreeSet<String> = BTreeSet::new();

    for problem in problems {
        let keys = skill_keys_from_tags(&problem.tags);
        all_keys.extend(keys.iter().cloned());
        for i in 0..keys.len() {
            for j in (i + 1)..keys.len() {
                *co_occur
                    .entry((keys[i].clone(), keys[j].clone()))
                    .or_insert(0.0) += 1.0;
            }
        }
    }

    let mut relations: Vec<SkillRelation> = co_occur
        .into_iter()
        .map(|((from, to), weight)| SkillRelation {
            from_key: from,
            to_key: to,
            relation_type: SkillRelationType::SkillCoOccur,
            weight,
        })
        .collect();

    let keys: Vec<&String> = all_keys.iter().collect();
    for general in &keys {
        if general.chars().count() < 2 {
            continue;
        }
        for specific in &keys {
            if general == specific {
                continue;
            }
            if specific.contains(general.as_str()) {
                relations.push(SkillRelation {
                    from_key: (*general).clone(),
                    to_key: (*specific).clone(),
                    relation_type: SkillRelationType::SkillSubsumes,
                    weight: SUBSUMES_WEIGHT,
                });
            }
        }
    }

    relations
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn problem(number: i32, tags: &str, status: &str) -> Problem {
        let now = Utc::now();
        Problem {
            id: number - 1000,
            question_number: number,
            question_id: None,
            title: format!("problem {}", number),
            content: None,
            difficulty: "Easy".to_string(),
            tags: tags.to_string(),
            status: status.to_string(),
            time_limit: 2000,
            memory_limit: 256,
            source: None,
            hint: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn relation(source: i32, target: i32, relation: &str) -> Relation {
        Relation {
            id: 0,
            source_number: source,
            target_number: target,
            relation: relation.to_string(),
            created_at: Utc::now(),
        }
    }

    fn service() -> GraphService {
        GraphService::new(Arc::new(GraphStore::new()))
    }

    #[tokio::test]
    async fn test_reconcile_creates_nodes_and_edges() {
        let svc = service();
        let problems = vec![
            problem(1001, "dp", "published"),
            problem(1002, "dp,graph", "published"),
        ];
        let relations = vec![relation(1001, 1002, "NEXT_LEVEL")];

        svc.reconcile(&problems, &relations).await;

        assert_eq!(svc.list_questions().await.len(), 2);
        let next = svc.next_level(1001).await;
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].question_number, 1002);

        // HAS_SKILL mirrors tags exactly
        let qs = svc.list_question_skill_relations().await;
        assert_eq!(qs.len(), 3);
    }

    #[tokio::test]
    async fn test_reconcile_removes_stale_nodes_and_edges() {
        let svc = service();
        let problems = vec![
            problem(1001, "", "published"),
            problem(1002, "", "published"),
        ];
        svc.reconcile(&problems, &[relation(1001, 1002, "SIMILAR")])
            .await;

        // second pass: 1002 and the relation are gone from the source
        svc.reconcile(&[problem(1001, "", "published")], &[]).await;

        assert_eq!(svc.list_questions().await.len(), 1);
        assert!(svc.list_relations().await.is_empty());
    }

    #[tokio::test]
    async fn test_reconcile_preserves_explicit_edge_weights() {
        let svc = service();
        let problems = vec![
            problem(1001, "", "published"),
            problem(1002, "", "published"),
        ];
        let relations = vec![relation(1001, 1002, "PREREQUISITE")];
        svc.reconcile(&problems, &relations).await;

        // user tunes the weight afterwards
        svc.upsert_relation(1001, 1002, RelationType::Prerequisite, 3.0, "tuned".into())
            .await
            .unwrap();

        svc.reconcile(&problems, &relations).await;
        let edges = svc.list_relations().await;
        let edge = edges
            .iter()
            .find(|r| r.relation_type == RelationType::Prerequisite)
            .unwrap();
        assert_eq!(edge.weight, 3.0);
    }

    #[tokio::test]
    async fn test_reconcile_skips_dangling_relations() {
        let svc = service();
        svc.reconcile(
            &[problem(1001, "", "published")],
            &[relation(1001, 9999, "NEXT_LEVEL")],
        )
        .await;
        assert!(svc.list_relations().await.is_empty());
    }

    #[tokio::test]
    async fn test_tag_similar_reciprocal_with_shared_count() {
        let svc = service();
        let problems = vec![
            problem(1001, "dp,graph", "published"),
            problem(1002, "dp,graph,greedy", "published"),
            problem(1003, "strings", "published"),
            problem(1004, "dp", "draft"),
        ];
        svc.reconcile(&problems, &[]).await;

        let edges: Vec<QuestionRelation> = svc
            .list_relations()
            .await
            .into_iter()
            .filter(|r| r.relation_type == RelationType::TagSimilar)
            .collect();

        // only 1001<->1002 share tags among published problems
        assert_eq!(edges.len(), 2);
        assert!(edges.iter().all(|e| e.weight == 2.0));
        assert!(edges.iter().all(|e| e.auto));
        let pairs: BTreeSet<(i32, i32)> = edges
            .iter()
            .map(|e| (e.from_question_number, e.to_question_number))
            .collect();
        assert!(pairs.contains(&(1001, 1002)));
        assert!(pairs.contains(&(1002, 1001)));
    }

    #[test]
    fn test_auto_skill_relations_co_occur_counts() {
        let problems = vec![
            problem(1, "dp,graph", "published"),
            problem(2, "dp,graph", "published"),
            problem(3, "dp,greedy", "published"),
        ];
        let relations = build_auto_skill_relations(&problems);

        let co: Vec<&SkillRelation> = relations
            .iter()
            .filter(|r| r.relation_type == SkillRelationType::SkillCoOccur)
            .collect();
        let dp_graph = co
            .iter()
            .find(|r| r.from_key == "dp" && r.to_key == "graph")
            .unwrap();
        assert_eq!(dp_graph.weight, 2.0);
        let dp_greedy = co
            .iter()
            .find(|r| r.from_key == "dp" && r.to_key == "greedy")
            .unwrap();
        assert_eq!(dp_greedy.weight, 1.0);
    }

    #[test]
    fn test_auto_skill_relations_subsumes() {
        let problems = vec![problem(1, "tree,segment tree,a", "published")];
        let relations = build_auto_skill_relations(&problems);

        let sub: Vec<&SkillRelation> = relations
            .iter()
            .filter(|r| r.relation_type == SkillRelationType::SkillSubsumes)
            .collect();
        assert_eq!(sub.len(), 1);
        assert_eq!(sub[0].from_key, "tree");
        assert_eq!(sub[0].to_key, "segment tree");
        assert_eq!(sub[0].weight, 0.6);
        // single-char key "a" never subsumes
        assert!(!sub.iter().any(|r| r.from_key == "a"));
    }

    #[tokio::test]
    async fn test_shortest_path() {
        let svc = service();
        let problems = vec![
            problem(1, "", "published"),
            problem(2, "", "published"),
            problem(3, "", "published"),
            problem(4, "", "published"),
        ];
        let relations = vec![
            relation(1, 2, "NEXT_LEVEL"),
            relation(2, 3, "PREREQUISITE"),
            relation(1, 4, "NEXT_LEVEL"),
            relation(4, 3, "NEXT_LEVEL"),
        ];
        svc.reconcile(&problems, &relations).await;

        let path = svc.shortest_path(1, 3).await.unwrap();
        assert_eq!(path.path_length, 2);
        assert_eq!(path.path.len(), 3);
        assert_eq!(path.path[0], 1);
        assert_eq!(path.path[2], 3);
        assert_eq!(path.total_weight, 2.0);

        assert!(svc.shortest_path(3, 1).await.is_none());
        assert!(svc.shortest_path(1, 999).await.is_none());
    }

    #[tokio::test]
    async fn test_recommend_dedups_by_best_score() {
        let svc = service();
        let problems = vec![
            problem(1001, "dp", "published"),
            problem(1002, "dp", "published"),
        ];
        // direct SIMILAR edge AND a shared tag to the same target
        svc.reconcile(&problems, &[relation(1001, 1002, "SIMILAR")])
            .await;
        svc.upsert_relation(1001, 1002, RelationType::Similar, 5.0, String::new())
            .await
            .unwrap();

        let recs = svc.recommend(1001, 10).await;
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].question_number, 1002);
        // the stronger explanation (direct edge, weight 5) wins the dedup
        assert_eq!(recs[0].relation_type, "SIMILAR");
        assert_eq!(recs[0].score, 5.0);
    }

    #[tokio::test]
    async fn test_recommend_skips_unpublished() {
        let svc = service();
        let problems = vec![
            problem(1001, "", "published"),
            problem(1002, "", "draft"),
        ];
        svc.reconcile(&problems, &[relation(1001, 1002, "NEXT_LEVEL")])
            .await;

        assert!(svc.recommend(1001, 10).await.is_empty());
    }

    #[tokio::test]
    async fn test_recommend_by_skills_excludes_solved() {
        let svc = service();
        let problems = vec![
            problem(1001, "dp", "published"),
            problem(1002, "dp", "published"),
            problem(1003, "graph", "published"),
        ];
        svc.reconcile(&problems, &[]).await;

        let user = Uuid::new_v4();
        svc.mark_solved(&user, 1001).await.unwrap();

        let recs = svc
            .recommend_by_skills(&user, &["dp".to_string()], 10)
            .await;
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].question_number, 1002);
        assert_eq!(recs[0].skill_key, "dp");
    }

    #[tokio::test]
    async fn test_user_mastery_edges() {
        let svc = service();
        let user = Uuid::new_v4();
        svc.update_user_mastery(&user, "dp", 0.3).await.unwrap();
        svc.update_user_mastery(&user, "dp", 0.5).await.unwrap();
        svc.update_user_mastery(&user, "graph", 0.2).await.unwrap();

        let mastery = svc.get_user_mastery(&user).await;
        assert_eq!(mastery.len(), 2);
        let dp = mastery.iter().find(|m| m.skill_key == "dp").unwrap();
        assert_eq!(dp.mastery, 0.5);
    }
}
