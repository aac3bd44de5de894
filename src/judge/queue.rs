//! Submission queue and judging worker
//!
//! Intake pushes submissions onto a bounded channel; `send` blocks when the
//! queue is full, giving producers back-pressure instead of dropped work. A
//! dedicated worker task drains the channel serially, drives each submission
//! through the coordinator, and applies the post-completion side effects:
//! mastery counters, the solved-list append (deduplicated), and the SOLVED
//! edge in the graph projection.

use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::db::repositories::{ProblemRepository, SubmissionRepository, UserRepository};
use crate::error::{classify_judge_error, AppError, AppResult};
use crate::graph::GraphService;
use crate::mastery::MasteryService;
use crate::models::Submission;

use super::coordinator::JudgeCoordinator;

/// Producer handle onto the bounded submission queue.
#[derive(Clone)]
pub struct JudgeQueue {
    tx: mpsc::Sender<Submission>,
}

impl JudgeQueue {
    /// Create the queue; the receiver goes to `spawn_worker`.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Submission>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Enqueue a submission, waiting while the queue is full.
    pub async fn enqueue(&self, submission: Submission) -> AppResult<()> {
        self.tx
            .send(submission)
            .await
            .map_err(|_| AppError::Internal(anyhow::anyhow!("judge queue closed")))
    }
}

/// Start the background worker draining the queue until the channel closes.
pub fn spawn_worker(
    mut rx: mpsc::Receiver<Submission>,
    pool: PgPool,
    coordinator: Arc<JudgeCoordinator>,
    graph: Option<GraphService>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!("judge worker started");
        while let Some(submission) = rx.recv().await {
            let id = submission.id;
            if let Err(e) = process(&pool, &coordinator, graph.as_ref(), submission).await {
                tracing::error!(submission_id = %id, "submission processing failed: {}", e);
            }
        }
        tracing::info!("judge worker stopped");
    })
}

/// Drive one submission to a terminal state and apply side effects.
async fn process(
    pool: &PgPool,
    coordinator: &JudgeCoordinator,
    graph: Option<&GraphService>,
    mut submission: Submission,
) -> AppResult<()> {
    // the write sequence is strictly pending -> processing -> terminal,
    // even when judging fails before the executor runs
    SubmissionRepository::mark_processing(pool, &submission.id).await?;
    submission.status = crate::models::SubmissionStatus::Processing
        .as_str()
        .to_string();

    if let Err(e) = coordinator.judge(&mut submission).await {
        if let AppError::Conflict(_) = e {
            // already terminal; never rewrite a terminal state
            tracing::warn!(submission_id = %submission.id, "skipping re-judge: {}", e);
            return Ok(());
        }

        let message = e.to_string();
        let code = classify_judge_error(&message);
        tracing::error!(
            submission_id = %submission.id,
            error_code = code,
            "judging failed: {}",
            message
        );
        SubmissionRepository::save_error(pool, &submission.id, code, &message).await?;
        submission.status = crate::models::SubmissionStatus::Error.as_str().to_string();
        submission.results = String::new();
    }

    let accepted = submission.is_accepted();

    let problem = match ProblemRepository::find_by_id(pool, submission.question_id).await? {
        Some(problem) => problem,
        None => {
            tracing::warn!(
                submission_id = %submission.id,
                question_id = submission.question_id,
                "problem disappeared before mastery update"
            );
            return Ok(());
        }
    };

    // counters move on every terminal submission; the skill law only on AC
    if let Err(e) =
        MasteryService::record_submission(pool, graph, &submission.user_id, &problem, accepted)
            .await
    {
        tracing::error!(submission_id = %submission.id, "mastery update failed: {}", e);
    }

    if !accepted {
        return Ok(());
    }

    // SOLVED edge first; the projection merge is idempotent
    if let Some(graph) = graph {
        if let Err(e) = graph
            .mark_solved(&submission.user_id, problem.question_number)
            .await
        {
            tracing::warn!(
                submission_id = %submission.id,
                "marking SOLVED edge failed: {}",
                e
            );
        }
    }

    // solved list: at most one occurrence per question number
    match UserRepository::find_solve(pool, &submission.user_id).await? {
        None => {
            UserRepository::create_solve(pool, &submission.user_id, problem.question_number)
                .await?;
        }
        Some(solve) => {
            if !solve.contains(problem.question_number) {
                let updated = solve.appended(problem.question_number);
                UserRepository::update_solve(pool, &submission.user_id, &updated).await?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use uuid::Uuid;

    fn submission(tag: i32) -> Submission {
        Submission::new(Uuid::new_v4(), tag, format!("code {}", tag), "go".into())
    }

    #[tokio::test]
    async fn test_enqueue_blocks_when_full() {
        let (queue, mut rx) = JudgeQueue::new(1);
        queue.enqueue(submission(1)).await.unwrap();

        // second enqueue must park until the consumer drains
        let blocked = tokio::time::timeout(Duration::from_millis(50), queue.enqueue(submission(2)));
        assert!(blocked.await.is_err());

        let first = rx.recv().await.unwrap();
        assert_eq!(first.question_id, 1);

        tokio::time::timeout(Duration::from_millis(200), queue.enqueue(submission(3)))
            .await
            .expect("enqueue should proceed after drain")
            .unwrap();
    }

    #[tokio::test]
    async fn test_blocked_producers_resume_in_order() {
        let (queue, mut rx) = JudgeQueue::new(1);
        queue.enqueue(submission(0)).await.unwrap();

        let q1 = queue.clone();
        let p1 = tokio::spawn(async move { q1.enqueue(submission(1)).await });
        // make sure producer 1 parks before producer 2
        tokio::time::sleep(Duration::from_millis(20)).await;
        let q2 = queue.clone();
        let p2 = tokio::spawn(async move { q2.enqueue(submission(2)).await });

        let mut order = Vec::new();
        for _ in 0..3 {
            order.push(rx.recv().await.unwrap().question_id);
        }
        p1.await.unwrap().unwrap();
        p2.await.unwrap().unwrap();

        assert_eq!(order, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_enqueue_fails_after_close() {
        let (queue, rx) = JudgeQueue::new(1);
        drop(rx);
        assert!(queue.enqueue(submission(1)).await.is_err());
    }
}
