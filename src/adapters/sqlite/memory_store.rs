//! SQLite-backed semantic memory store.
//!
//! Replaces a hosted vector database with deterministic token-overlap
//! scoring over persisted step outputs. Good enough for prompt
//! enrichment, and crucially best-effort: the engine tolerates every
//! failure mode here.

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::collections::HashSet;

use crate::domain::models::{Step, StepOutput};
use crate::domain::ports::{MemoryHit, MemoryStore, StoreError};

#[derive(Clone)]
pub struct SqliteMemoryStore {
    pool: SqlitePool,
    /// Maximum hits a similarity search returns
    search_limit: usize,
}

impl SqliteMemoryStore {
    pub fn new(pool: SqlitePool, search_limit: usize) -> Self {
        Self { pool, search_limit }
    }
}

#[async_trait]
impl MemoryStore for SqliteMemoryStore {
    async fn record_step(&self, step: &Step) -> Result<(), StoreError> {
        let additional_input = serde_json::to_string(&step.additional_input)?;

        sqlx::query(
            r"INSERT INTO memory_steps (id, task_id, input, additional_input, created_at)
              VALUES (?, ?, ?, ?, ?)",
        )
        .bind(step.id.to_string())
        .bind(step.task_id.to_string())
        .bind(&step.input)
        .bind(&additional_input)
        .bind(step.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn record_step_output(&self, output: &StepOutput) -> Result<(), StoreError> {
        sqlx::query(
            r"INSERT INTO memory_step_outputs (id, step_id, thought, value, output_type, created_at)
              VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(output.id.to_string())
        .bind(output.step_id.to_string())
        .bind(&output.thought)
        .bind(&output.value)
        .bind(&output.output_type)
        .bind(output.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn search_step_outputs(&self, prompt: &str) -> Result<Vec<MemoryHit>, StoreError> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT thought, value FROM memory_step_outputs ORDER BY created_at ASC")
                .fetch_all(&self.pool)
                .await?;

        let query_tokens = tokenize(prompt);
        let mut scored: Vec<MemoryHit> = rows
            .into_iter()
            .filter_map(|(thought, value)| {
                let score = overlap_score(&query_tokens, &format!("{thought} {value}"));
                (score > 0.0).then_some(MemoryHit {
                    thought,
                    value,
                    score,
                })
            })
            .collect();

        // Stable sort keeps insertion order among equal scores.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(self.search_limit);
        Ok(scored)
    }
}

fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 2)
        .map(ToString::to_string)
        .collect()
}

/// Jaccard similarity between the query tokens and a candidate text.
fn overlap_score(query: &HashSet<String>, candidate: &str) -> f64 {
    if query.is_empty() {
        return 0.0;
    }
    let candidate_tokens = tokenize(candidate);
    if candidate_tokens.is_empty() {
        return 0.0;
    }
    let intersection = query.intersection(&candidate_tokens).count();
    let union = query.union(&candidate_tokens).count();
    #[allow(clippy::cast_precision_loss)]
    {
        intersection as f64 / union as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::connection::create_test_pool;
    use crate::adapters::sqlite::migrations::Migrator;
    use crate::domain::models::PlannedStep;
    use uuid::Uuid;

    async fn setup() -> SqliteMemoryStore {
        let pool = create_test_pool().await.unwrap();
        Migrator::new(pool.clone()).run().await.unwrap();
        SqliteMemoryStore::new(pool, 3)
    }

    #[tokio::test]
    async fn test_search_ranks_by_overlap() {
        let store = setup().await;
        let step_id = Uuid::new_v4();

        for (thought, value) in [
            ("queried sales table", "rows for sales by region"),
            ("wrote summary file", "summary.txt written"),
            ("listed sales regions", "north south east west"),
        ] {
            store
                .record_step_output(&StepOutput::new(step_id, thought, value, "test"))
                .await
                .unwrap();
        }

        let hits = store.search_step_outputs("sales by region").await.unwrap();
        assert!(!hits.is_empty());
        assert!(hits[0].value.contains("sales by region"));
        // Unrelated output scores zero and is excluded.
        assert!(hits.iter().all(|h| !h.value.contains("summary.txt")));
    }

    #[tokio::test]
    async fn test_search_respects_limit() {
        let store = setup().await;
        let step_id = Uuid::new_v4();
        for i in 0..5 {
            store
                .record_step_output(&StepOutput::new(
                    step_id,
                    format!("sales note {i}"),
                    "sales data",
                    "test",
                ))
                .await
                .unwrap();
        }

        let hits = store.search_step_outputs("sales").await.unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[tokio::test]
    async fn test_record_step() {
        let store = setup().await;
        let step = Step::from_planned(Uuid::new_v4(), &PlannedStep::new("query"), 0, 1, false);
        store.record_step(&step).await.unwrap();
    }

    #[test]
    fn test_overlap_score_bounds() {
        let query = tokenize("sales by region");
        assert_eq!(overlap_score(&query, ""), 0.0);
        let perfect = overlap_score(&query, "sales region");
        assert!(perfect > 0.0 && perfect <= 1.0);
    }
}
