use formflow::{
    db,
    error::EngineError,
    form::FormStore,
    instance::{InstanceQueryService, InstanceStateMachine, InstanceStatus},
    submission::SubmissionRecorder,
    tenant::TenantContext,
    workflow::{NewWorkflow, TaskSpec, WorkflowStatus, WorkflowStore, WorkflowUpdate},
};
use serde_json::json;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

const TENANT: &str = "tenant-1";

fn ctx() -> TenantContext {
    TenantContext::new(TENANT.to_string(), "user-1".to_string())
}

async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    db::init_schema(&pool).await.expect("schema init");
    pool
}

struct Engine {
    forms: FormStore,
    workflows: WorkflowStore,
    machine: InstanceStateMachine,
    query: InstanceQueryService,
    recorder: SubmissionRecorder,
}

async fn engine() -> Engine {
    let pool = memory_pool().await;
    let workflows = WorkflowStore::new(pool.clone());
    Engine {
        forms: FormStore::new(pool.clone()),
        machine: InstanceStateMachine::new(pool.clone(), workflows.clone()),
        query: InstanceQueryService::new(pool.clone()),
        recorder: SubmissionRecorder::new(pool),
        workflows,
    }
}

/// Create a form and an ACTIVE workflow with tasks at the given sequence
/// values (task keys "step-{sequence}"). Returns (workflow_id, form_id).
async fn active_workflow(engine: &Engine, sequences: &[i64]) -> (String, String) {
    let form = engine
        .forms
        .create(&ctx(), "Intake Form", None)
        .await
        .expect("create form");
    let tasks = sequences
        .iter()
        .map(|s| TaskSpec {
            form_id: form.id.clone(),
            task_key: format!("step-{}", s),
            task_name: None,
            sequence: Some(*s),
            is_required: None,
        })
        .collect();
    let workflow = engine
        .workflows
        .create(
            TENANT,
            NewWorkflow {
                name: "Onboarding".to_string(),
                description: Some("New hire onboarding".to_string()),
                diagram: None,
                tasks,
            },
        )
        .await
        .expect("create workflow");
    engine
        .workflows
        .update(
            &workflow.id,
            TENANT,
            WorkflowUpdate {
                status: Some(WorkflowStatus::Active),
                ..Default::default()
            },
        )
        .await
        .expect("activate workflow");
    (workflow.id, form.id)
}

#[tokio::test]
async fn test_start_draft_workflow_fails() {
    let engine = engine().await;
    let form = engine.forms.create(&ctx(), "Form", None).await.unwrap();
    let workflow = engine
        .workflows
        .create(
            TENANT,
            NewWorkflow {
                name: "Draft flow".to_string(),
                description: None,
                diagram: None,
                tasks: vec![TaskSpec {
                    form_id: form.id,
                    task_key: "step-0".to_string(),
                    task_name: None,
                    sequence: Some(0),
                    is_required: None,
                }],
            },
        )
        .await
        .unwrap();

    let err = engine.machine.start(&workflow.id, &ctx(), None).await.unwrap_err();
    assert!(matches!(err, EngineError::WorkflowNotActive(_)));
}

#[tokio::test]
async fn test_start_active_workflow_with_zero_tasks() {
    let engine = engine().await;
    let (workflow_id, _) = active_workflow(&engine, &[]).await;

    let (instance, first_task) = engine.machine.start(&workflow_id, &ctx(), None).await.unwrap();
    assert_eq!(instance.status, InstanceStatus::Running);
    assert!(instance.current_task_key.is_none());
    assert!(first_task.is_none());
    assert_eq!(instance.variables, json!({}));
}

#[tokio::test]
async fn test_start_sets_first_task_and_variables() {
    let engine = engine().await;
    let (workflow_id, _) = active_workflow(&engine, &[0, 1]).await;

    let (instance, first_task) = engine
        .machine
        .start(&workflow_id, &ctx(), Some(json!({ "department": "sales" })))
        .await
        .unwrap();
    assert_eq!(instance.current_task_key.as_deref(), Some("step-0"));
    assert_eq!(first_task.unwrap().task_key, "step-0");
    assert_eq!(instance.variables, json!({ "department": "sales" }));
    assert!(instance.completed_at.is_none());
}

#[tokio::test]
async fn test_completing_non_current_task_fails_and_changes_nothing() {
    let engine = engine().await;
    let (workflow_id, form_id) = active_workflow(&engine, &[0, 1]).await;
    let (instance, _) = engine.machine.start(&workflow_id, &ctx(), None).await.unwrap();

    let err = engine
        .machine
        .complete_current_task(&instance.id, "step-1", json!({ "name": "Ada" }), &ctx())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotCurrentTask(_)));

    // The instance is unmodified and no submission was recorded.
    let view = engine.query.get(&instance.id, TENANT).await.unwrap();
    assert_eq!(view.instance.status, InstanceStatus::Running);
    assert_eq!(view.instance.current_task_key.as_deref(), Some("step-0"));
    let submissions = engine.recorder.list_for_form(&form_id).await.unwrap();
    assert!(submissions.is_empty());
}

#[tokio::test]
async fn test_completion_advances_through_all_tasks() {
    let engine = engine().await;
    let (workflow_id, form_id) = active_workflow(&engine, &[0, 1, 2]).await;
    let (instance, _) = engine.machine.start(&workflow_id, &ctx(), None).await.unwrap();

    let outcome = engine
        .machine
        .complete_current_task(&instance.id, "step-0", json!({ "a": 1 }), &ctx())
        .await
        .unwrap();
    assert!(!outcome.completed);
    assert_eq!(outcome.next_task.as_ref().unwrap().task_key, "step-1");
    assert_eq!(outcome.instance.current_task_key.as_deref(), Some("step-1"));

    let outcome = engine
        .machine
        .complete_current_task(&instance.id, "step-1", json!({ "b": 2 }), &ctx())
        .await
        .unwrap();
    assert!(!outcome.completed);
    assert_eq!(outcome.next_task.as_ref().unwrap().task_key, "step-2");

    let outcome = engine
        .machine
        .complete_current_task(&instance.id, "step-2", json!({ "c": 3 }), &ctx())
        .await
        .unwrap();
    assert!(outcome.completed);
    assert!(outcome.next_task.is_none());
    assert_eq!(outcome.instance.status, InstanceStatus::Completed);
    assert!(outcome.instance.current_task_key.is_none());
    assert!(outcome.instance.completed_at.is_some());

    // One submission per completed task, each linked to the instance.
    let submissions = engine.recorder.list_for_form(&form_id).await.unwrap();
    assert_eq!(submissions.len(), 3);
    assert!(submissions
        .iter()
        .all(|s| s.workflow_instance_id.as_deref() == Some(instance.id.as_str())));

    // The persisted row matches the returned instance.
    let view = engine.query.get(&instance.id, TENANT).await.unwrap();
    assert_eq!(view.instance.status, InstanceStatus::Completed);
    assert!(view.instance.completed_at.is_some());
}

/// Completing the task before a sequence gap finishes the workflow even
/// though a task with a larger sequence value exists.
#[tokio::test]
async fn test_gap_in_sequence_completes_instance_early() {
    let engine = engine().await;
    let (workflow_id, _) = active_workflow(&engine, &[0, 2]).await;
    let (instance, _) = engine.machine.start(&workflow_id, &ctx(), None).await.unwrap();

    let outcome = engine
        .machine
        .complete_current_task(&instance.id, "step-0", json!({}), &ctx())
        .await
        .unwrap();
    assert!(outcome.completed);
    assert_eq!(outcome.instance.status, InstanceStatus::Completed);
}

#[tokio::test]
async fn test_complete_unknown_instance_fails() {
    let engine = engine().await;

    let err = engine
        .machine
        .complete_current_task("no-such-instance", "step-0", json!({}), &ctx())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InstanceNotFound(_)));
}

#[tokio::test]
async fn test_get_is_idempotent() {
    let engine = engine().await;
    let (workflow_id, _) = active_workflow(&engine, &[0]).await;
    let (instance, _) = engine.machine.start(&workflow_id, &ctx(), None).await.unwrap();

    let first = engine.query.get(&instance.id, TENANT).await.unwrap();
    let second = engine.query.get(&instance.id, TENANT).await.unwrap();
    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::to_value(&second).unwrap()
    );
}

#[tokio::test]
async fn test_get_enforces_tenant_scope() {
    let engine = engine().await;
    let (workflow_id, _) = active_workflow(&engine, &[0]).await;
    let (instance, _) = engine.machine.start(&workflow_id, &ctx(), None).await.unwrap();

    let err = engine.query.get(&instance.id, "other-tenant").await.unwrap_err();
    assert!(matches!(err, EngineError::InstanceNotFound(_)));
}

#[tokio::test]
async fn test_task_detail_resolves_any_task_of_the_workflow() {
    let engine = engine().await;
    let (workflow_id, _) = active_workflow(&engine, &[0, 1]).await;
    let (instance, _) = engine.machine.start(&workflow_id, &ctx(), None).await.unwrap();

    // step-1 is not the current task but is still inspectable.
    let detail = engine
        .query
        .task_detail(&instance.id, "step-1", TENANT)
        .await
        .unwrap();
    assert_eq!(detail.task.task_key, "step-1");
    assert_eq!(detail.instance.current_task_key.as_deref(), Some("step-0"));

    let err = engine
        .query
        .task_detail(&instance.id, "no-such-task", TENANT)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::TaskNotFound(_)));
}

#[tokio::test]
async fn test_list_for_tenant_filters_by_workflow() {
    let engine = engine().await;
    let (workflow_a, _) = active_workflow(&engine, &[0]).await;
    let (workflow_b, _) = active_workflow(&engine, &[0]).await;
    engine.machine.start(&workflow_a, &ctx(), None).await.unwrap();
    engine.machine.start(&workflow_a, &ctx(), None).await.unwrap();
    engine.machine.start(&workflow_b, &ctx(), None).await.unwrap();

    let all = engine.query.list_for_tenant(TENANT, None).await.unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.iter().all(|v| v.workflow.is_some()));

    let only_a = engine
        .query
        .list_for_tenant(TENANT, Some(workflow_a.as_str()))
        .await
        .unwrap();
    assert_eq!(only_a.len(), 2);

    let other = engine.query.list_for_tenant("other-tenant", None).await.unwrap();
    assert!(other.is_empty());
}

/// Two concurrent completions of the same task: exactly one advances the
/// instance. The loser either hits the conditional-update conflict or
/// re-reads the already-advanced task key and fails the equality check.
#[tokio::test]
async fn test_concurrent_completion_has_exactly_one_winner() {
    let engine = engine().await;
    let (workflow_id, form_id) = active_workflow(&engine, &[0, 1]).await;
    let (instance, _) = engine.machine.start(&workflow_id, &ctx(), None).await.unwrap();

    let machine_a = engine.machine.clone();
    let machine_b = engine.machine.clone();
    let ctx_a = ctx();
    let ctx_b = ctx();
    let (first, second) = tokio::join!(
        machine_a.complete_current_task(&instance.id, "step-0", json!({ "by": "a" }), &ctx_a),
        machine_b.complete_current_task(&instance.id, "step-0", json!({ "by": "b" }), &ctx_b),
    );

    let winners = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one completion must win");

    let loser = if first.is_ok() { second } else { first };
    assert!(matches!(
        loser.unwrap_err(),
        EngineError::Conflict(_) | EngineError::NotCurrentTask(_)
    ));

    // The winner advanced the instance once; the loser's submission was
    // rolled back with its transaction.
    let view = engine.query.get(&instance.id, TENANT).await.unwrap();
    assert_eq!(view.instance.current_task_key.as_deref(), Some("step-1"));
    let submissions = engine.recorder.list_for_form(&form_id).await.unwrap();
    assert_eq!(submissions.len(), 1);
}
