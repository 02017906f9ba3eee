//! Integration tests for the staged pipeline over tempdir fixtures.
//!
//! Agent workspaces are pre-seeded with stub `main.py` entry points. The
//! sync stage fails for every fixture (the workspaces are not git
//! checkouts), which doubles as a check that sync failures degrade
//! gracefully while the pre-existing workspaces still run.

use deepfence_core::{
    AgentOutcome, AgentSpec, NullObserver, Pipeline, PipelineConfig, PipelineEvent,
    PipelineObserver, Roster, Stage,
};
use std::path::Path;
use std::sync::Mutex;

fn agent(name: &str) -> AgentSpec {
    AgentSpec {
        name: name.to_string(),
        repo: format!("/nonexistent/{name}.git"),
    }
}

fn seed_agent(base: &Path, name: &str, main_py: &str) {
    let workspace = base.join("agents").join(name);
    std::fs::create_dir_all(&workspace).unwrap();
    std::fs::write(workspace.join("main.py"), main_py).unwrap();
}

/// Test: end-to-end artifact layout for one mapper, one organizer, one reporter.
#[tokio::test]
async fn test_end_to_end_artifact_layout() {
    let base = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();

    seed_agent(
        base.path(),
        "m1",
        "import json\nopen('output.json', 'w').write(json.dumps({'x': 1}))\n",
    );
    seed_agent(
        base.path(),
        "o1",
        "import os\nos.makedirs('output', exist_ok=True)\nopen('output/summary.csv', 'w').write('a,b')\n",
    );
    seed_agent(
        base.path(),
        "r1",
        "import sys, os, json\n\
         assert os.path.isabs(sys.argv[1])\n\
         open('output.json', 'w').write(json.dumps({'y': 2}))\n\
         open('output.html', 'w').write('<html></html>')\n",
    );

    let roster = Roster {
        mapper_agents: vec![agent("m1")],
        organizer_agents: vec![agent("o1")],
        reporter_agent: Some(agent("r1")),
    };
    let config = PipelineConfig::new(base.path(), target.path());

    let result = Pipeline::run(&config, &roster, &NullObserver)
        .await
        .expect("pipeline failed");

    // All syncs failed (fixtures are not git repos), all agents still ran.
    assert_eq!(result.syncs.len(), 3);
    assert!(result.syncs.iter().all(|s| !s.ok));
    assert_eq!(result.succeeded_count(), 3);
    assert_eq!(result.failed_count(), 0);
    assert!(result.archived_to.is_none(), "first run has nothing to archive");

    let outputs = base.path().join("outputs");
    assert_eq!(
        std::fs::read_to_string(outputs.join("m1_output.json")).unwrap(),
        r#"{"x": 1}"#
    );
    assert_eq!(
        std::fs::read_to_string(outputs.join("o1/summary.csv")).unwrap(),
        "a,b"
    );
    assert_eq!(
        std::fs::read_to_string(outputs.join("r1_output.json")).unwrap(),
        r#"{"y": 2}"#
    );
    assert!(outputs.join("r1_report.html").exists());
}

/// Test: a second run archives the first run's entire output area.
#[tokio::test]
async fn test_second_run_archives_first() {
    let base = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();

    seed_agent(
        base.path(),
        "m1",
        "open('output.json', 'w').write('{}')\n",
    );

    let roster = Roster {
        mapper_agents: vec![agent("m1")],
        ..Default::default()
    };
    let config = PipelineConfig::new(base.path(), target.path());

    let first = Pipeline::run(&config, &roster, &NullObserver).await.unwrap();
    assert!(first.archived_to.is_none());

    let second = Pipeline::run(&config, &roster, &NullObserver).await.unwrap();
    let slot = second.archived_to.expect("second run should archive");
    assert_eq!(slot.file_name().unwrap(), "output-00001");
    assert!(slot.join("m1_output.json").exists());

    // Fresh output area was repopulated by the second run.
    assert!(base.path().join("outputs/m1_output.json").exists());
}

/// Test: a failing mapper does not block subsequent mappers.
#[tokio::test]
async fn test_mapper_failure_does_not_block_later_mappers() {
    let base = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();

    seed_agent(base.path(), "bad", "import sys\nsys.exit(1)\n");
    seed_agent(
        base.path(),
        "good",
        "open('output.json', 'w').write('{\"ok\": true}')\n",
    );

    let roster = Roster {
        mapper_agents: vec![agent("bad"), agent("good")],
        ..Default::default()
    };
    let config = PipelineConfig::new(base.path(), target.path());

    let result = Pipeline::run(&config, &roster, &NullObserver).await.unwrap();

    assert_eq!(result.failed_count(), 1);
    assert_eq!(result.succeeded_count(), 1);
    assert!(matches!(
        result.mappers[0].outcome,
        AgentOutcome::Failed { exit_code: 1, .. }
    ));

    let outputs = base.path().join("outputs");
    assert!(!outputs.join("bad_output.json").exists());
    assert!(outputs.join("good_output.json").exists());
}

/// Test: organizers with identical relative artifact names never collide.
#[tokio::test]
async fn test_organizer_namespace_isolation() {
    let base = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();

    seed_agent(
        base.path(),
        "o1",
        "import os\nos.makedirs('output', exist_ok=True)\nopen('output/data.txt', 'w').write('from o1')\n",
    );
    seed_agent(
        base.path(),
        "o2",
        "import os\nos.makedirs('output', exist_ok=True)\nopen('output/data.txt', 'w').write('from o2')\n",
    );

    let roster = Roster {
        organizer_agents: vec![agent("o1"), agent("o2")],
        ..Default::default()
    };
    let config = PipelineConfig::new(base.path(), target.path());

    Pipeline::run(&config, &roster, &NullObserver).await.unwrap();

    let outputs = base.path().join("outputs");
    assert_eq!(
        std::fs::read_to_string(outputs.join("o1/data.txt")).unwrap(),
        "from o1"
    );
    assert_eq!(
        std::fs::read_to_string(outputs.join("o2/data.txt")).unwrap(),
        "from o2"
    );
}

/// Test: an agent whose sync and workspace are both absent is reported as
/// missing its entry point, without aborting the stage.
#[tokio::test]
async fn test_unsynced_agent_reported_missing() {
    let base = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();

    seed_agent(
        base.path(),
        "present",
        "open('output.json', 'w').write('{}')\n",
    );

    let roster = Roster {
        mapper_agents: vec![agent("absent"), agent("present")],
        ..Default::default()
    };
    let config = PipelineConfig::new(base.path(), target.path());

    let result = Pipeline::run(&config, &roster, &NullObserver).await.unwrap();

    assert!(matches!(
        result.mappers[0].outcome,
        AgentOutcome::EntrypointMissing
    ));
    assert!(result.mappers[1].outcome.succeeded());
    assert!(base.path().join("outputs/present_output.json").exists());
}

/// Test: the default stitch rule feeds the mapper graph into the reporter's
/// reports folder, and the final report is located under the reporter's
/// namespace.
#[tokio::test]
async fn test_stitch_and_report_discovery() {
    let base = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();

    // "mapper-agent" contributes a directory namespace via its output/ tree.
    seed_agent(
        base.path(),
        "mapper-agent",
        "import os\nos.makedirs('output', exist_ok=True)\n\
         open('output/topological-graph-output.json', 'w').write('{\"nodes\": []}')\n",
    );
    seed_agent(
        base.path(),
        "reporter",
        "import os\nos.makedirs('output/reports', exist_ok=True)\n\
         open('output/reports/cybersecurity-report.html', 'w').write('<h1>report</h1>')\n",
    );

    let roster = Roster {
        organizer_agents: vec![agent("mapper-agent")],
        reporter_agent: Some(agent("reporter")),
        ..Default::default()
    };
    let config = PipelineConfig::new(base.path(), target.path());

    let result = Pipeline::run(&config, &roster, &NullObserver).await.unwrap();

    assert_eq!(result.stitched.len(), 1);
    let outputs = base.path().join("outputs");
    assert_eq!(
        std::fs::read_to_string(
            outputs.join("reporter/reports/topological-graph-output.json")
        )
        .unwrap(),
        r#"{"nodes": []}"#
    );

    let report = result.report_path.expect("report should be discovered");
    assert!(report.ends_with("reporter/reports/cybersecurity-report.html"));
}

/// Test: duplicate agent names abort before any filesystem side effects.
#[tokio::test]
async fn test_invalid_roster_aborts_without_side_effects() {
    let base = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();

    let roster = Roster {
        mapper_agents: vec![agent("dup")],
        organizer_agents: vec![agent("dup")],
        ..Default::default()
    };
    let config = PipelineConfig::new(base.path(), target.path());

    let result = Pipeline::run(&config, &roster, &NullObserver).await;
    assert!(result.is_err());
    assert!(!base.path().join("agents").exists());
    assert!(!base.path().join("outputs").exists());
}

/// Observer recording stage transitions, to pin the stage order.
struct StageOrderObserver {
    stages: Mutex<Vec<&'static str>>,
}

impl PipelineObserver for StageOrderObserver {
    fn on_event(&self, event: &PipelineEvent) {
        if let PipelineEvent::StageStarted { stage } = event {
            self.stages.lock().unwrap().push(stage.name());
        }
    }
}

/// Test: stages run in the fixed order, each exactly once.
#[tokio::test]
async fn test_stage_order_is_fixed() {
    let base = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();

    seed_agent(
        base.path(),
        "m1",
        "open('output.json', 'w').write('{}')\n",
    );

    let roster = Roster {
        mapper_agents: vec![agent("m1")],
        ..Default::default()
    };
    let config = PipelineConfig::new(base.path(), target.path());
    let observer = StageOrderObserver {
        stages: Mutex::new(Vec::new()),
    };

    Pipeline::run(&config, &roster, &observer).await.unwrap();

    let stages = observer.stages.lock().unwrap();
    assert_eq!(
        *stages,
        vec![
            Stage::ArchivePrior.name(),
            Stage::PrepareDirs.name(),
            Stage::SyncAgents.name(),
            Stage::RunMappers.name(),
            Stage::RunOrganizers.name(),
            Stage::RunReporter.name(),
            Stage::Done.name(),
        ]
    );
}
