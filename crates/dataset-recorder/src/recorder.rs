//! Filesystem implementation of the dataset sink.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info};

use flowlens_core_types::{RunId, StateIndex};
use workflow_core::{CapturedState, DatasetSink, SinkError, WorkflowRun};

use crate::naming::run_dir_name;

/// Writes one run's captures under `<root>/<app>_<task>_<timestamp>/`.
///
/// One recorder serves exactly one run; concurrent runs each construct
/// their own, which is what keeps the directory namespace collision-free.
pub struct FsDatasetRecorder {
    run_dir: PathBuf,
}

/// Per-state entry inside `run.json`. Screenshot bytes stay in their own
/// files; the summary only references them.
#[derive(Debug, Serialize, Deserialize)]
struct StateRecord {
    index: StateIndex,
    captured_at: DateTime<Utc>,
    url: String,
    screenshot_file: String,
    snapshot_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning: Option<String>,
}

/// The frozen run summary written as `run.json`.
#[derive(Debug, Serialize, Deserialize)]
struct RunSummary {
    run_id: RunId,
    app: String,
    task: String,
    starting_url: String,
    status: String,
    goal_achieved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    started_at: DateTime<Utc>,
    duration_seconds: f64,
    total_states: usize,
    states: Vec<StateRecord>,
}

impl FsDatasetRecorder {
    /// Recorder for one run starting now.
    pub fn new(root: impl AsRef<Path>, app: &str, task: &str) -> Self {
        Self::with_start_time(root, app, task, Utc::now())
    }

    pub fn with_start_time(
        root: impl AsRef<Path>,
        app: &str,
        task: &str,
        started_at: DateTime<Utc>,
    ) -> Self {
        let run_dir = root.as_ref().join(run_dir_name(app, task, started_at));
        Self { run_dir }
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    fn screenshot_file(state: &CapturedState) -> String {
        format!(
            "{:03}_state.{}",
            state.index,
            state.screenshot.format.extension()
        )
    }

    fn snapshot_file(state: &CapturedState) -> String {
        format!("{:03}_dom.json", state.index)
    }

    async fn ensure_dir(&self) -> Result<(), SinkError> {
        fs::create_dir_all(&self.run_dir)
            .await
            .map_err(|e| SinkError::new(format!("create {}: {e}", self.run_dir.display())))
    }
}

#[async_trait]
impl DatasetSink for FsDatasetRecorder {
    async fn record_state(&self, run_id: &RunId, state: &CapturedState) -> Result<(), SinkError> {
        self.ensure_dir().await?;

        let screenshot_path = self.run_dir.join(Self::screenshot_file(state));
        fs::write(&screenshot_path, &state.screenshot.bytes)
            .await
            .map_err(|e| SinkError::new(format!("write {}: {e}", screenshot_path.display())))?;

        let snapshot_path = self.run_dir.join(Self::snapshot_file(state));
        let snapshot_json = serde_json::to_vec_pretty(&state.snapshot)
            .map_err(|e| SinkError::new(format!("encode snapshot: {e}")))?;
        fs::write(&snapshot_path, snapshot_json)
            .await
            .map_err(|e| SinkError::new(format!("write {}: {e}", snapshot_path.display())))?;

        debug!(run_id = %run_id, index = state.index, "state persisted");
        Ok(())
    }

    async fn record_run(&self, run: &WorkflowRun) -> Result<(), SinkError> {
        self.ensure_dir().await?;

        let states = run
            .states
            .iter()
            .map(|state| StateRecord {
                index: state.index,
                captured_at: state.captured_at,
                url: state.url.clone(),
                screenshot_file: Self::screenshot_file(state),
                snapshot_file: Self::snapshot_file(state),
                action: state.trigger.as_ref().map(|d| d.describe()),
                reasoning: state
                    .trigger
                    .as_ref()
                    .filter(|d| !d.reasoning.is_empty())
                    .map(|d| d.reasoning.clone()),
            })
            .collect();

        let summary = RunSummary {
            run_id: run.run_id.clone(),
            app: run.app.clone(),
            task: run.task.clone(),
            starting_url: run.starting_url.clone(),
            status: run.status.as_str().to_string(),
            goal_achieved: run.goal_achieved,
            error: run.error.clone(),
            started_at: run.started_at,
            duration_seconds: run.duration.as_secs_f64(),
            total_states: run.state_count(),
            states,
        };

        let path = self.run_dir.join("run.json");
        let body = serde_json::to_vec_pretty(&summary)
            .map_err(|e| SinkError::new(format!("encode summary: {e}")))?;
        fs::write(&path, body)
            .await
            .map_err(|e| SinkError::new(format!("write {}: {e}", path.display())))?;

        info!(run_id = %run.run_id, dir = %self.run_dir.display(), "run summary persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use decision_client::ActionDecision;
    use driver_adapter::Screenshot;
    use page_perceiver::StructuralSnapshot;
    use std::time::Duration;
    use workflow_core::TerminalStatus;

    fn state(index: StateIndex, trigger: Option<ActionDecision>) -> CapturedState {
        CapturedState {
            index,
            captured_at: Utc::now(),
            screenshot: Screenshot::png(vec![1, 2, 3]),
            snapshot: StructuralSnapshot::from_page("https://x.example", &[]),
            url: "https://x.example".to_string(),
            trigger,
        }
    }

    fn run(states: Vec<CapturedState>) -> WorkflowRun {
        WorkflowRun {
            run_id: RunId::new(),
            app: "demo".to_string(),
            task: "press the button".to_string(),
            starting_url: "https://x.example".to_string(),
            states,
            status: TerminalStatus::Succeeded,
            goal_achieved: true,
            error: None,
            started_at: Utc::now(),
            duration: Duration::from_millis(1500),
        }
    }

    #[tokio::test]
    async fn test_states_and_summary_land_on_disk() {
        let root = tempfile::tempdir().unwrap();
        let recorder = FsDatasetRecorder::new(root.path(), "Demo App", "Press the button");
        let run_id = RunId::new();

        let first = state(1, None);
        let second = state(
            2,
            Some(ActionDecision::click("#go").with_reasoning("moving on")),
        );
        recorder.record_state(&run_id, &first).await.unwrap();
        recorder.record_state(&run_id, &second).await.unwrap();

        let full_run = run(vec![first, second]);
        recorder.record_run(&full_run).await.unwrap();

        let dir = recorder.run_dir();
        assert!(dir.join("001_state.png").exists());
        assert!(dir.join("001_dom.json").exists());
        assert!(dir.join("002_state.png").exists());
        assert!(dir.join("run.json").exists());

        let summary: RunSummary =
            serde_json::from_slice(&std::fs::read(dir.join("run.json")).unwrap()).unwrap();
        assert_eq!(summary.total_states, 2);
        assert_eq!(summary.status, "succeeded");
        assert_eq!(summary.states[1].action.as_deref(), Some("click #go"));
        assert_eq!(summary.states[1].reasoning.as_deref(), Some("moving on"));
        assert!(summary.states[0].action.is_none());
    }

    #[tokio::test]
    async fn test_run_dirs_are_keyed_per_run() {
        let root = tempfile::tempdir().unwrap();
        let at_a = Utc::now();
        let at_b = at_a + chrono::Duration::seconds(1);
        let a = FsDatasetRecorder::with_start_time(root.path(), "demo", "task", at_a);
        let b = FsDatasetRecorder::with_start_time(root.path(), "demo", "task", at_b);
        assert_ne!(a.run_dir(), b.run_dir());
    }

    #[tokio::test]
    async fn test_screenshot_bytes_round_trip() {
        let root = tempfile::tempdir().unwrap();
        let recorder = FsDatasetRecorder::new(root.path(), "demo", "task");
        let run_id = RunId::new();
        recorder.record_state(&run_id, &state(1, None)).await.unwrap();

        let bytes = std::fs::read(recorder.run_dir().join("001_state.png")).unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
    }
}
