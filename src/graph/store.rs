//! In-process graph store
//!
//! An arena of nodes addressed by stable identifiers plus separate edge sets
//! keyed by `(from, to, type)`. All mutating operations have MERGE
//! semantics: upserting twice converges to one node or edge, and key
//! uniqueness holds by construction. A `tokio` RwLock serializes writers, so
//! reconciliation is atomic with respect to other graph operations.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::types::{
    QuestionNode, QuestionRelation, QuestionSkillRelation, RelationType, SkillNode, SkillRelation,
    SkillRelationType, SolvedEdge, UserMasteryEntry,
};

#[derive(Debug, Clone)]
struct QuestionEdge {
    weight: f64,
    description: String,
    auto: bool,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct SkillEdge {
    weight: f64,
}

#[derive(Debug, Clone)]
struct HasSkillEdge {
    weight: f64,
}

#[derive(Default)]
struct GraphInner {
    questions: BTreeMap<i32, QuestionNode>,
    skills: BTreeMap<String, SkillNode>,
    question_edges: BTreeMap<(i32, i32, RelationType), QuestionEdge>,
    skill_edges: BTreeMap<(String, String, SkillRelationType), SkillEdge>,
    question_skill_edges: BTreeMap<(i32, String), HasSkillEdge>,
    solved_edges: BTreeMap<(Uuid, i32), DateTime<Utc>>,
    mastery_edges: BTreeMap<(Uuid, String), f64>,
}

/// Thread-safe arena graph store.
#[derive(Default)]
pub struct GraphStore {
    inner: RwLock<GraphInner>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Question nodes
    // ------------------------------------------------------------------

    /// MERGE a question node: create or overwrite its mirrored fields,
    /// keeping the original creation timestamp. Edges are untouched.
    pub async fn upsert_question(&self, node: QuestionNode) {
        let mut inner = self.inner.write().await;
        match inner.questions.get_mut(&node.question_number) {
            Some(existing) => {
                let created_at = existing.created_at;
                *existing = QuestionNode { created_at, ..node };
            }
            None => {
                inner.questions.insert(node.question_number, node);
            }
        }
    }

    /// Detach-delete a question node: the node and every edge touching it.
    pub async fn delete_question(&self, question_number: i32) {
        let mut inner = self.inner.write().await;
        inner.questions.remove(&question_number);
        inner
            .question_edges
            .retain(|(from, to, _), _| *from != question_number && *to != question_number);
        inner
            .question_skill_edges
            .retain(|(qn, _), _| *qn != question_number);
        inner.solved_edges.retain(|(_, qn), _| *qn != question_number);
    }

    pub async fn get_question(&self, question_number: i32) -> Option<QuestionNode> {
        self.inner.read().await.questions.get(&question_number).cloned()
    }

    /// All question nodes, ordered by question number.
    pub async fn list_questions(&self) -> Vec<QuestionNode> {
        self.inner.read().await.questions.values().cloned().collect()
    }

    // ------------------------------------------------------------------
    // Question-question edges
    // ------------------------------------------------------------------

    /// MERGE an edge: one edge per (from, to, type); weight, description and
    /// auto flag are overwritten on re-upsert.
    pub async fn upsert_relation(&self, relation: QuestionRelation) {
        let mut inner = self.inner.write().await;
        let key = (
            relation.from_question_number,
            relation.to_question_number,
            relation.relation_type,
        );
        match inner.question_edges.get_mut(&key) {
            Some(edge) => {
                edge.weight = relation.weight;
                edge.description = relation.description;
                edge.auto = relation.auto;
            }
            None => {
                inner.question_edges.insert(
                    key,
                    QuestionEdge {
                        weight: relation.weight,
                        description: relation.description,
                        auto: relation.auto,
                        created_at: relation.created_at,
                    },
                );
            }
        }
    }

    pub async fn delete_relation(
        &self,
        from: i32,
        to: i32,
        relation_type: RelationType,
    ) -> bool {
        self.inner
            .write()
            .await
            .question_edges
            .remove(&(from, to, relation_type))
            .is_some()
    }

    /// Edges of the given types, ordered by (from, to, type).
    pub async fn list_relations(&self, types: &[RelationType]) -> Vec<QuestionRelation> {
        let inner = self.inner.read().await;
        inner
            .question_edges
            .iter()
            .filter(|((_, _, t), _)| types.contains(t))
            .map(|((from, to, t), edge)| QuestionRelation {
                from_question_number: *from,
                to_question_number: *to,
                relation_type: *t,
                weight: edge.weight,
                description: edge.description.clone(),
                auto: edge.auto,
                created_at: edge.created_at,
            })
            .collect()
    }

    /// Drop every auto-flagged edge of one type (rebuild precursor).
    pub async fn clear_auto_relations(&self, relation_type: RelationType) {
        self.inner
            .write()
            .await
            .question_edges
            .retain(|(_, _, t), edge| *t != relation_type || !edge.auto);
    }

    /// Outgoing edges of one type from a question: (target, weight).
    pub async fn out_edges(&self, from: i32, relation_type: RelationType) -> Vec<(i32, f64)> {
        let inner = self.inner.read().await;
        inner
            .question_edges
            .iter()
            .filter(|((f, _, t), _)| *f == from && *t == relation_type)
            .map(|((_, to, _), edge)| (*to, edge.weight))
            .collect()
    }

    /// Incoming edges of one type into a question: (source, weight).
    pub async fn in_edges(&self, to: i32, relation_type: RelationType) -> Vec<(i32, f64)> {
        let inner = self.inner.read().await;
        inner
            .question_edges
            .iter()
            .filter(|((_, t_to, t), _)| *t_to == to && *t == relation_type)
            .map(|((from, _, _), edge)| (*from, edge.weight))
            .collect()
    }

    // ------------------------------------------------------------------
    // Skill nodes and edges
    // ------------------------------------------------------------------

    /// All skill nodes, ordered by name.
    pub async fn list_skills(&self) -> Vec<SkillNode> {
        let mut skills: Vec<SkillNode> =
            self.inner.read().await.skills.values().cloned().collect();
        skills.sort_by(|a, b| a.name.cmp(&b.name));
        skills
    }

    /// Replace a question's HAS_SKILL edges so they exactly match `skills`.
    /// Missing skill nodes are created on the fly (MERGE).
    pub async fn set_question_skills(&self, question_number: i32, skills: &[SkillNode]) {
        let mut inner = self.inner.write().await;
        inner
            .question_skill_edges
            .retain(|(qn, _), _| *qn != question_number);
        for skill in skills {
            match inner.skills.get_mut(&skill.key) {
                Some(existing) => {
                    existing.name = skill.name.clone();
                    existing.updated_at = skill.updated_at;
                }
                None => {
                    inner.skills.insert(skill.key.clone(), skill.clone());
                }
            }
            inner
                .question_skill_edges
                .insert((question_number, skill.key.clone()), HasSkillEdge { weight: 1.0 });
        }
    }

    /// All HAS_SKILL edges, ordered by (question, skill).
    pub async fn list_question_skills(&self) -> Vec<QuestionSkillRelation> {
        let inner = self.inner.read().await;
        inner
            .question_skill_edges
            .iter()
            .map(|((qn, key), edge)| QuestionSkillRelation {
                question_number: *qn,
                skill_key: key.clone(),
                weight: edge.weight,
            })
            .collect()
    }

    /// Skill keys attached to one question.
    pub async fn skills_of(&self, question_number: i32) -> Vec<String> {
        let inner = self.inner.read().await;
        inner
            .question_skill_edges
            .iter()
            .filter(|((qn, _), _)| *qn == question_number)
            .map(|((_, key), _)| key.clone())
            .collect()
    }

    /// Questions carrying one skill.
    pub async fn questions_with_skill(&self, skill_key: &str) -> Vec<i32> {
        let inner = self.inner.read().await;
        inner
            .question_skill_edges
            .iter()
            .filter(|((_, key), _)| key == skill_key)
            .map(|((qn, _), _)| *qn)
            .collect()
    }

    /// MERGE one skill-skill edge; endpoints are created when missing.
    pub async fn upsert_skill_relation(
        &self,
        from_key: &str,
        to_key: &str,
        relation_type: SkillRelationType,
        weight: f64,
        now: DateTime<Utc>,
    ) {
        let mut inner = self.inner.write().await;
        for key in [from_key, to_key] {
            if !inner.skills.contains_key(key) {
                inner.skills.insert(
                    key.to_string(),
                    SkillNode {
                        key: key.to_string(),
                        name: key.to_string(),
                        created_at: now,
                        updated_at: now,
                    },
                );
            }
        }
        inner.skill_edges.insert(
            (from_key.to_string(), to_key.to_string(), relation_type),
            SkillEdge { weight },
        );
    }

    /// All skill-skill edges, ordered by (type, from, to).
    pub async fn list_skill_relations(&self) -> Vec<SkillRelation> {
        let inner = self.inner.read().await;
        let mut relations: Vec<SkillRelation> = inner
            .skill_edges
            .iter()
            .map(|((from, to, t), edge)| SkillRelation {
                from_key: from.clone(),
                to_key: to.clone(),
                relation_type: *t,
                weight: edge.weight,
            })
            .collect();
        relations.sort_by(|a, b| {
            (a.relation_type, &a.from_key, &a.to_key)
                .cmp(&(b.relation_type, &b.from_key, &b.to_key))
        });
        relations
    }

    /// Drop all skill-skill edges (rebuild precursor; they are all auto).
    pub async fn clear_skill_relations(&self) {
        self.inner.write().await.skill_edges.clear();
    }

    /// Co-occurrence weights keyed by (from, to); recommendation input.
    pub async fn co_occur_neighbors(&self, skill_key: &str) -> Vec<(String, f64)> {
        let inner = self.inner.read().await;
        let mut out = Vec::new();
        for ((from, to, t), edge) in inner.skill_edges.iter() {
            if *t != SkillRelationType::SkillCoOccur {
                continue;
            }
            // co-occurrence is symmetric; stored once, traversed both ways
            if from == skill_key {
                out.push((to.clone(), edge.weight));
            } else if to == skill_key {
                out.push((from.clone(), edge.weight));
            }
        }
        out
    }

    // ------------------------------------------------------------------
    // User edges
    // ------------------------------------------------------------------

    /// MERGE the user's SOLVED edge; the first timestamp wins.
    pub async fn mark_solved(&self, user_uuid: &Uuid, question_number: i32, now: DateTime<Utc>) {
        self.inner
            .write()
            .await
            .solved_edges
            .entry((*user_uuid, question_number))
            .or_insert(now);
    }

    /// Question numbers the user has SOLVED edges to.
    pub async fn solved_by(&self, user_uuid: &Uuid) -> BTreeSet<i32> {
        let inner = self.inner.read().await;
        inner
            .solved_edges
            .keys()
            .filter(|(u, _)| u == user_uuid)
            .map(|(_, qn)| *qn)
            .collect()
    }

    /// All SOLVED edges of a user with timestamps.
    pub async fn solved_edges_of(&self, user_uuid: &Uuid) -> Vec<SolvedEdge> {
        let inner = self.inner.read().await;
        inner
            .solved_edges
            .iter()
            .filter(|((u, _), _)| u == user_uuid)
            .map(|((_, qn), at)| SolvedEdge {
                user_uuid: *user_uuid,
                question_number: *qn,
                solved_at: *at,
            })
            .collect()
    }

    /// MERGE the user's mastery edge for one skill.
    pub async fn upsert_user_mastery(&self, user_uuid: &Uuid, skill_key: &str, mastery: f64) {
        self.inner
            .write()
            .await
            .mastery_edges
            .insert((*user_uuid, skill_key.to_string()), mastery);
    }

    /// Flattened (skill, mastery) list for one user.
    pub async fn user_mastery(&self, user_uuid: &Uuid) -> Vec<UserMasteryEntry> {
        let inner = self.inner.read().await;
        inner
            .mastery_edges
            .iter()
            .filter(|((u, _), _)| u == user_uuid)
            .map(|((_, key), mastery)| UserMasteryEntry {
                skill_key: key.clone(),
                mastery: *mastery,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(number: i32, title: &str) -> QuestionNode {
        let now = Utc::now();
        QuestionNode {
            question_number: number,
            question_id: String::new(),
            title: title.to_string(),
            difficulty: "Easy".to_string(),
            tags: String::new(),
            status: "published".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn relation(from: i32, to: i32, t: RelationType, weight: f64) -> QuestionRelation {
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

    #[tokio::test]
    async fn test_upsert_question_merges() {
        let store = GraphStore::new();
        store.upsert_question(node(1001, "two sum")).await;
        store.upsert_question(node(1001, "two sum ii")).await;

        let questions = store.list_questions().await;
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].title, "two sum ii");
    }

    #[tokio::test]
    async fn test_detach_delete() {
        let store = GraphStore::new();
        store.upsert_question(node(1001, "a")).await;
        store.upsert_question(node(1002, "b")).await;
        store
            .upsert_relation(relation(1001, 1002, RelationType::NextLevel, 1.0))
            .await;
        let user = Uuid::new_v4();
        store.mark_solved(&user, 1002, Utc::now()).await;

        store.delete_question(1002).await;

        assert!(store.get_question(1002).await.is_none());
        assert!(store
            .list_relations(&[RelationType::NextLevel])
            .await
            .is_empty());
        assert!(store.solved_by(&user).await.is_empty());
    }

    #[tokio::test]
    async fn test_relation_merge_overwrites_weight() {
        let store = GraphStore::new();
        store
            .upsert_relation(relation(1, 2, RelationType::Similar, 1.0))
            .await;
        store
            .upsert_relation(relation(1, 2, RelationType::Similar, 2.5))
            .await;

        let relations = store.list_relations(&[RelationType::Similar]).await;
        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].weight, 2.5);
    }

    #[tokio::test]
    async fn test_clear_auto_relations_keeps_explicit() {
        let store = GraphStore::new();
        let mut auto = relation(1, 2, RelationType::TagSimilar, 2.0);
        auto.auto = true;
        store.upsert_relation(auto).await;
        store
            .upsert_relation(relation(2, 3, RelationType::TagSimilar, 1.0))
            .await;

        store.clear_auto_relations(RelationType::TagSimilar).await;

        let left = store.list_relations(&[RelationType::TagSimilar]).await;
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].from_question_number, 2);
    }

    #[tokio::test]
    async fn test_set_question_skills_replaces() {
        let store = GraphStore::new();
        let now = Utc::now();
        let skill = |key: &str| SkillNode {
            key: key.to_string(),
            name: key.to_string(),
            created_at: now,
            updated_at: now,
        };

        store
            .set_question_skills(1001, &[skill("dp"), skill("graph")])
            .await;
        assert_eq!(store.skills_of(1001).await, vec!["dp", "graph"]);

        store.set_question_skills(1001, &[skill("greedy")]).await;
        assert_eq!(store.skills_of(1001).await, vec!["greedy"]);
        // skill nodes survive edge replacement
        assert_eq!(store.list_skills().await.len(), 3);
    }

    #[tokio::test]
    async fn test_mark_solved_idempotent() {
        let store = GraphStore::new();
        let user = Uuid::new_v4();
        store.mark_solved(&user, 1001, Utc::now()).await;
        store.mark_solved(&user, 1001, Utc::now()).await;

        assert_eq!(store.solved_by(&user).await.len(), 1);
        assert_eq!(store.solved_edges_of(&user).await.len(), 1);
    }

    #[tokio::test]
    async fn test_co_occur_traversed_both_ways() {
        let store = GraphStore::new();
        let now = Utc::now();
        store
            .upsert_skill_relation("dp", "graph", SkillRelationType::SkillCoOccur, 3.0, now)
            .await;

        assert_eq!(store.co_occur_neighbors("dp").await, vec![("graph".to_string(), 3.0)]);
        assert_eq!(store.co_occur_neighbors("graph").await, vec![("dp".to_string(), 3.0)]);
    }
}
