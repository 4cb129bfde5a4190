//! Flow definitions and run history.

use chrono::{DateTime, Duration, Utc};
use flowguard_core_types::{FlowDefinition, FlowRunResult, Verdict};
use query_guard::{Identifier, RecentResultsQuery, RunSummaryQuery, SearchQuery};
use rusqlite::{params, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info};

use crate::db::Database;
use crate::errors::StoreError;
use crate::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    Created,
    Updated,
}

/// Verdict counts for one flow over a look-back window.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub flow_name: String,
    pub days: u32,
    pub total: u64,
    pub passed: u64,
    pub failed: u64,
    pub errored: u64,
    pub avg_duration_ms: Option<f64>,
}

impl RunSummary {
    /// Share of passing runs, 0 when there were none.
    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.passed as f64 / self.total as f64
        }
    }
}

/// Reads and writes flows and their run results.
///
/// Every lookup parameter is a validated query-guard type.
#[derive(Clone)]
pub struct FlowRepository {
    db: Database,
}

impl FlowRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert or replace the definition stored under the flow's name.
    pub fn save_flow(&self, flow: &FlowDefinition) -> Result<SaveOutcome> {
        flow.validate()?;
        let name = Identifier::parse("flowName", &flow.name)?;
        let definition = serde_json::to_string(flow)?;
        let now = Utc::now().timestamp_millis();

        let conn = self.db.lock();
        let existed = conn
            .query_row(
                "SELECT 1 FROM flows WHERE name = ?1",
                params![name.as_str()],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        conn.execute(
            "INSERT INTO flows (name, intent, url, definition, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT(name) DO UPDATE SET
                intent = excluded.intent,
                url = excluded.url,
                definition = excluded.definition,
                updated_at = excluded.updated_at",
            params![name.as_str(), flow.intent, flow.url, definition, now],
        )?;

        let outcome = if existed {
            SaveOutcome::Updated
        } else {
            SaveOutcome::Created
        };
        debug!(flow = %name, ?outcome, "Saved flow definition");
        Ok(outcome)
    }

    pub fn get_flow(&self, name: &Identifier) -> Result<Option<FlowDefinition>> {
        let conn = self.db.lock();
        let definition: Option<String> = conn
            .query_row(
                "SELECT definition FROM flows WHERE name = ?1",
                params![name.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        definition.map(|raw| parse_flow(&raw)).transpose()
    }

    /// All stored flows, ordered by name.
    pub fn list_flows(&self) -> Result<Vec<FlowDefinition>> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare("SELECT definition FROM flows ORDER BY name")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut flows = Vec::new();
        for row in rows {
            flows.push(parse_flow(&row?)?);
        }
        Ok(flows)
    }

    /// Flows whose name or intent contains the search term, ignoring case.
    pub fn search_flows(&self, query: &SearchQuery) -> Result<Vec<FlowDefinition>> {
        let matches: Vec<FlowDefinition> = self
            .list_flows()?
            .into_iter()
            .filter(|flow| query.is_match(&flow.name) || query.is_match(&flow.intent))
            .collect();
        debug!(term = %query, matches = matches.len(), "Searched flows");
        Ok(matches)
    }

    pub fn delete_flow(&self, name: &Identifier) -> Result<bool> {
        let conn = self.db.lock();
        let rows = conn.execute("DELETE FROM flows WHERE name = ?1", params![name.as_str()])?;
        if rows > 0 {
            info!(flow = %name, "Deleted flow definition");
        }
        Ok(rows > 0)
    }

    pub fn record_run(&self, run: &FlowRunResult) -> Result<()> {
        let flow_name = Identifier::parse("flowName", &run.flow_name)?;
        let payload = serde_json::to_string(run)?;

        let conn = self.db.lock();
        conn.execute(
            "INSERT INTO flow_runs (run_id, flow_name, verdict, duration_ms, started_at, completed_at, result)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                run.run_id.to_string(),
                flow_name.as_str(),
                run.verdict.as_str(),
                run.duration_ms as i64,
                run.started_at.timestamp_millis(),
                run.completed_at.timestamp_millis(),
                payload,
            ],
        )?;
        debug!(flow = %flow_name, run_id = %run.run_id, verdict = %run.verdict, "Recorded run");
        Ok(())
    }

    /// Most recent runs of a flow, newest first.
    pub fn recent_results(&self, query: &RecentResultsQuery) -> Result<Vec<FlowRunResult>> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare(
            "SELECT result FROM flow_runs
             WHERE flow_name = ?1
             ORDER BY started_at DESC, rowid DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(
            params![query.flow_name.as_str(), query.limit.get()],
            |row| row.get::<_, String>(0),
        )?;

        let mut results = Vec::new();
        for row in rows {
            let raw = row?;
            let run = serde_json::from_str(&raw).map_err(|err| StoreError::Corrupt {
                table: "flow_runs",
                detail: err.to_string(),
            })?;
            results.push(run);
        }
        Ok(results)
    }

    /// Verdict counts for runs started within `query.days` of `now`.
    pub fn run_summary(&self, query: &RunSummaryQuery, now: DateTime<Utc>) -> Result<RunSummary> {
        let cutoff = (now - Duration::days(i64::from(query.days.get()))).timestamp_millis();

        let conn = self.db.lock();
        let mut stmt = conn.prepare(
            "SELECT verdict, COUNT(*), AVG(duration_ms) FROM flow_runs
             WHERE flow_name = ?1 AND started_at >= ?2
             GROUP BY verdict",
        )?;
        let rows = stmt.query_map(params![query.flow_name.as_str(), cutoff], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, f64>(2)?,
            ))
        })?;

        let mut summary = RunSummary {
            flow_name: query.flow_name.to_string(),
            days: query.days.get(),
            ..RunSummary::default()
        };
        let mut weighted_duration = 0.0;
        for row in rows {
            let (verdict, count, avg) = row?;
            let count = count.max(0) as u64;
            match Verdict::parse(&verdict) {
                Some(Verdict::Pass) => summary.passed += count,
                Some(Verdict::Fail) => summary.failed += count,
                Some(Verdict::Error) => summary.errored += count,
                None => {
                    return Err(StoreError::Corrupt {
                        table: "flow_runs",
                        detail: format!("unknown verdict '{verdict}'"),
                    })
                }
            }
            summary.total += count;
            weighted_duration += avg * count as f64;
        }
        if summary.total > 0 {
            summary.avg_duration_ms = Some(weighted_duration / summary.total as f64);
        }
        Ok(summary)
    }
}

fn parse_flow(raw: &str) -> Result<FlowDefinition> {
    serde_json::from_str(raw).map_err(|err| StoreError::Corrupt {
        table: "flows",
        detail: err.to_string(),
    })
}
