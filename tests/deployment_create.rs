// ABOUTME: Integration tests for creating rolling deployments.
// ABOUTME: Covers instance counts, superseding, droplet validation, routes, audit and atomicity.

use capstan::audit::{AuditError, AuditEvent, AuditSink, MemoryAuditSink, UserAuditInfo};
use capstan::deploy::{
    DeployError, DeployErrorKind, DeploymentCreate, RevisionCreator, RouteCarryover,
    SequentialRevisions,
};
use capstan::model::{
    App, Deployment, DeploymentState, Droplet, Process, ProcessState, Revision, RouteMapping,
};
use capstan::store::{MemoryStore, Store, StoreError, Transaction};
use capstan::types::{ProcessType, RouteGuid};
use chrono::{Duration, Utc};
use std::sync::Arc;

struct Fixture {
    store: Arc<MemoryStore>,
    audit: Arc<MemoryAuditSink>,
    app: App,
    droplet: Droplet,
    web: Process,
}

impl Fixture {
    fn creator(&self) -> DeploymentCreate<MemoryStore> {
        DeploymentCreate::new(self.store.clone(), self.audit.clone())
    }

    fn deployments(&self) -> Vec<Deployment> {
        self.store
            .transaction(|tx| tx.deployments_for_app(&self.app.guid))
            .unwrap()
    }

    fn processes(&self) -> Vec<Process> {
        self.store
            .transaction(|tx| tx.processes_for_app(&self.app.guid))
            .unwrap()
    }

    fn mappings(&self, process: &Process) -> Vec<RouteMapping> {
        self.store
            .transaction(|tx| tx.route_mappings_for_process(&process.guid))
            .unwrap()
    }

    fn reload_app(&self) -> App {
        self.store.transaction(|tx| tx.app(&self.app.guid)).unwrap()
    }
}

fn user() -> UserAuditInfo {
    UserAuditInfo::new("123")
        .with_email("connor@example.com")
        .with_name("braa")
}

/// An app with a started web process running 3 instances and a staged droplet.
fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let app = App::new("dora", "space-guid", "org-guid");
    let droplet = Droplet::new(&app.guid).with_sha256("droplet-sha256");

    let mut web = Process::new(&app.guid, ProcessType::Web);
    web.instances = 3;
    web.state = ProcessState::Started;
    web.command = Some("bundle exec rackup".to_string());
    web.memory_mb = 512;
    web.created_at = Utc::now() - Duration::hours(1);

    store
        .transaction(|tx| {
            tx.insert_app(app.clone())?;
            tx.insert_droplet(droplet.clone())?;
            tx.insert_process(web.clone())
        })
        .unwrap();

    Fixture {
        store,
        audit: Arc::new(MemoryAuditSink::new()),
        app,
        droplet,
        web,
    }
}

fn deploying_process(fx: &Fixture, deployment: &Deployment) -> Process {
    let guid = deployment.deploying_web_process.clone().unwrap();
    fx.store
        .transaction(|tx| tx.process(&guid))
        .unwrap()
        .expect("deploying process stored")
}

struct FailingAuditSink;

impl AuditSink for FailingAuditSink {
    fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        Err(AuditError::RecordFailed {
            event_type: event.event_type,
            reason: "sink offline".to_string(),
        })
    }
}

/// Writes a revision, then refuses it.
struct RejectingRevisions;

impl RevisionCreator for RejectingRevisions {
    fn create(
        &self,
        tx: &mut dyn Transaction,
        app: &App,
        droplet: &Droplet,
    ) -> Result<Revision, DeployError> {
        SequentialRevisions.create(tx, app, droplet)?;
        Err(DeployError::Revision("revision quota exceeded".to_string()))
    }
}

// =============================================================================
// Instance counts and superseding
// =============================================================================

#[test]
fn first_deployment_records_live_instance_count() {
    let fx = fixture();

    let deployment = fx
        .creator()
        .create(&fx.app.guid, Some(&fx.droplet.guid), &user())
        .unwrap();

    assert_eq!(deployment.state, DeploymentState::Deploying);
    assert_eq!(deployment.original_web_process_instance_count, 3);
    assert_eq!(deployment.droplet.as_ref(), Some(&fx.droplet.guid));
    assert_eq!(fx.deployments().len(), 1);
}

#[test]
fn superseding_deployment_keeps_recorded_count() {
    let fx = fixture();

    let mut prior = Deployment::new(&fx.app.guid, DeploymentState::Deploying);
    prior.original_web_process_instance_count = 7;
    prior.created_at = Utc::now() - Duration::minutes(5);
    fx.store
        .transaction(|tx| tx.insert_deployment(prior.clone()))
        .unwrap();

    let deployment = fx
        .creator()
        .create(&fx.app.guid, Some(&fx.droplet.guid), &user())
        .unwrap();

    assert_eq!(deployment.original_web_process_instance_count, 7);

    let stored = fx.deployments();
    let prior_now = stored.iter().find(|d| d.guid == prior.guid).unwrap();
    assert_eq!(prior_now.state, DeploymentState::Deployed);
    let newest = stored.iter().find(|d| d.guid == deployment.guid).unwrap();
    assert_eq!(newest.state, DeploymentState::Deploying);
}

#[test]
fn finished_deployments_are_not_superseded() {
    let fx = fixture();

    let mut canceled = Deployment::new(&fx.app.guid, DeploymentState::Canceled);
    canceled.original_web_process_instance_count = 9;
    fx.store
        .transaction(|tx| tx.insert_deployment(canceled.clone()))
        .unwrap();

    let deployment = fx
        .creator()
        .create(&fx.app.guid, Some(&fx.droplet.guid), &user())
        .unwrap();

    assert_eq!(deployment.original_web_process_instance_count, 3);
    let stored = fx.deployments();
    let canceled_now = stored.iter().find(|d| d.guid == canceled.guid).unwrap();
    assert_eq!(canceled_now.state, DeploymentState::Canceled);
}

#[test]
fn repeated_creates_supersede_in_turn() {
    let fx = fixture();
    let creator = fx.creator();

    let first = creator
        .create(&fx.app.guid, Some(&fx.droplet.guid), &user())
        .unwrap();
    let second = creator
        .create(&fx.app.guid, Some(&fx.droplet.guid), &user())
        .unwrap();

    assert_eq!(second.original_web_process_instance_count, 3);
    assert_eq!(second.revision.as_ref().unwrap().version, 2);
    assert_eq!(first.revision.as_ref().unwrap().version, 1);

    let deploying: Vec<_> = fx
        .deployments()
        .into_iter()
        .filter(Deployment::is_deploying)
        .collect();
    assert_eq!(deploying.len(), 1);
    assert_eq!(deploying[0].guid, second.guid);
}

// =============================================================================
// Droplet validation
// =============================================================================

#[test]
fn missing_droplet_fails_without_mutation() {
    let fx = fixture();

    let err = fx.creator().create(&fx.app.guid, None, &user()).unwrap_err();

    assert!(matches!(err, DeployError::SetCurrentDroplet));
    assert_eq!(err.kind(), DeployErrorKind::Validation);
    assert!(err
        .to_string()
        .contains("Ensure the droplet exists and belongs to this app"));
    assert!(fx.deployments().is_empty());
    assert_eq!(fx.processes().len(), 1);
    assert!(fx.reload_app().droplet.is_none());
    assert!(fx.audit.events().is_empty());
}

#[test]
fn droplet_of_another_app_is_rejected() {
    let fx = fixture();
    let other = App::new("other", "space-guid", "org-guid");
    let foreign = Droplet::new(&other.guid).with_sha256("other-sha");
    fx.store
        .transaction(|tx| {
            tx.insert_app(other.clone())?;
            tx.insert_droplet(foreign.clone())
        })
        .unwrap();

    let err = fx
        .creator()
        .create(&fx.app.guid, Some(&foreign.guid), &user())
        .unwrap_err();

    assert!(matches!(err, DeployError::SetCurrentDroplet));
    assert!(fx.deployments().is_empty());
    assert!(fx.reload_app().droplet.is_none());
}

#[test]
fn unknown_droplet_is_rejected() {
    let fx = fixture();
    let unknown = Droplet::new(&fx.app.guid);

    let err = fx
        .creator()
        .create(&fx.app.guid, Some(&unknown.guid), &user())
        .unwrap_err();

    assert!(matches!(err, DeployError::SetCurrentDroplet));
}

#[test]
fn unknown_app_is_a_validation_error() {
    let fx = fixture();
    let ghost = App::new("ghost", "space-guid", "org-guid");

    let err = fx
        .creator()
        .create(&ghost.guid, Some(&fx.droplet.guid), &user())
        .unwrap_err();

    assert!(matches!(err, DeployError::Store(StoreError::AppNotFound(_))));
    assert_eq!(err.kind(), DeployErrorKind::Validation);
}

#[test]
fn app_without_web_process_is_rejected() {
    let store = Arc::new(MemoryStore::new());
    let app = App::new("worker-only", "space-guid", "org-guid");
    let droplet = Droplet::new(&app.guid).with_sha256("sha");
    let worker = Process::new(&app.guid, ProcessType::parse("worker").unwrap());
    store
        .transaction(|tx| {
            tx.insert_app(app.clone())?;
            tx.insert_droplet(droplet.clone())?;
            tx.insert_process(worker.clone())
        })
        .unwrap();

    let err = DeploymentCreate::new(store.clone(), Arc::new(MemoryAuditSink::new()))
        .create(&app.guid, Some(&droplet.guid), &user())
        .unwrap_err();

    assert!(matches!(err, DeployError::NoWebProcess(_)));
    let app_now = store.transaction(|tx| tx.app(&app.guid)).unwrap();
    assert!(app_now.droplet.is_none());
}

// =============================================================================
// Droplet assignment and the deploying process
// =============================================================================

#[test]
fn assigns_droplet_and_records_previous_one() {
    let fx = fixture();
    let creator = fx.creator();

    let first = creator
        .create(&fx.app.guid, Some(&fx.droplet.guid), &user())
        .unwrap();
    assert!(first.previous_droplet.is_none());
    assert_eq!(fx.reload_app().droplet.as_ref(), Some(&fx.droplet.guid));

    let next = Droplet::new(&fx.app.guid).with_sha256("next-sha");
    fx.store
        .transaction(|tx| tx.insert_droplet(next.clone()))
        .unwrap();

    let second = creator
        .create(&fx.app.guid, Some(&next.guid), &user())
        .unwrap();
    assert_eq!(second.previous_droplet.as_ref(), Some(&fx.droplet.guid));
    assert_eq!(fx.reload_app().droplet.as_ref(), Some(&next.guid));
}

#[test]
fn deploying_process_clones_web_process() {
    let fx = fixture();

    let deployment = fx
        .creator()
        .create(&fx.app.guid, Some(&fx.droplet.guid), &user())
        .unwrap();
    let deploying = deploying_process(&fx, &deployment);

    assert_eq!(deploying.process_type, ProcessType::DeployingWeb);
    assert_eq!(deploying.deployment.as_ref(), Some(&deployment.guid));
    assert_eq!(deploying.instances, 1);
    assert!(deploying.is_started());
    assert_eq!(deploying.command.as_deref(), Some("bundle exec rackup"));
    assert_eq!(deploying.memory_mb, 512);
    assert_eq!(
        deploying.revision.as_ref(),
        deployment.revision.as_ref().map(|r| &r.guid)
    );
    assert_ne!(deploying.guid, fx.web.guid);
    assert_eq!(
        deploying.type_label(),
        format!("web-deployment-{}", deployment.guid)
    );
}

#[test]
fn oldest_web_process_is_the_one_cloned() {
    let fx = fixture();
    let now = Utc::now();

    // Inserted out of order; the fixture web process is an hour old.
    let mut newer = Process::new(&fx.app.guid, ProcessType::Web);
    newer.command = Some("newer".to_string());
    newer.created_at = now - Duration::minutes(10);

    let mut oldest = Process::new(&fx.app.guid, ProcessType::Web);
    oldest.command = Some("oldest".to_string());
    oldest.instances = 5;
    oldest.created_at = now - Duration::hours(3);

    fx.store
        .transaction(|tx| {
            tx.insert_process(newer.clone())?;
            tx.insert_process(oldest.clone())
        })
        .unwrap();

    let deployment = fx
        .creator()
        .create(&fx.app.guid, Some(&fx.droplet.guid), &user())
        .unwrap();

    assert_eq!(deployment.original_web_process_instance_count, 5);
    assert_eq!(
        deploying_process(&fx, &deployment).command.as_deref(),
        Some("oldest")
    );
}

#[test]
fn history_records_deploying_process() {
    let fx = fixture();

    let deployment = fx
        .creator()
        .create(&fx.app.guid, Some(&fx.droplet.guid), &user())
        .unwrap();
    let history = fx
        .store
        .transaction(|tx| tx.historical_related_processes(&deployment.guid))
        .unwrap();

    assert_eq!(history.len(), 1);
    assert_eq!(
        Some(&history[0].process_guid),
        deployment.deploying_web_process.as_ref()
    );
    assert_eq!(
        history[0].process_type,
        format!("web-deployment-{}", deployment.guid)
    );
}

// =============================================================================
// Route carryover
// =============================================================================

#[test]
fn routes_are_carried_over_with_weights() {
    let fx = fixture();
    let route_a = RouteGuid::generate();
    let route_b = RouteGuid::generate();
    fx.store
        .transaction(|tx| {
            tx.insert_route_mapping(
                RouteMapping::new(&fx.app.guid, &route_a, &fx.web.guid).with_weight(3),
            )?;
            tx.insert_route_mapping(RouteMapping::new(&fx.app.guid, &route_b, &fx.web.guid))
        })
        .unwrap();

    let deployment = fx
        .creator()
        .create(&fx.app.guid, Some(&fx.droplet.guid), &user())
        .unwrap();
    let deploying = deploying_process(&fx, &deployment);
    let carried = fx.mappings(&deploying);

    assert_eq!(carried.len(), 2);
    let a = carried.iter().find(|m| m.route == route_a).unwrap();
    let b = carried.iter().find(|m| m.route == route_b).unwrap();
    assert_eq!(a.weight, Some(3));
    assert_eq!(b.weight, None);

    // The source keeps its own mappings.
    assert_eq!(fx.mappings(&fx.web).len(), 2);
}

#[test]
fn repeated_carryover_adds_no_duplicates() {
    let fx = fixture();
    let route = RouteGuid::generate();
    let target = Process::new(&fx.app.guid, ProcessType::Web);
    fx.store
        .transaction(|tx| {
            tx.insert_process(target.clone())?;
            tx.insert_route_mapping(RouteMapping::new(&fx.app.guid, &route, &fx.web.guid))
        })
        .unwrap();

    let (first, second) = fx
        .store
        .transaction(|tx| {
            let first = RouteCarryover::carry_over(tx, &fx.web.guid, &target.guid)?;
            let second = RouteCarryover::carry_over(tx, &fx.web.guid, &target.guid)?;
            Ok::<_, StoreError>((first, second))
        })
        .unwrap();

    assert_eq!(first, 1);
    assert_eq!(second, 0);
    assert_eq!(fx.mappings(&target).len(), 1);
}

// =============================================================================
// Audit
// =============================================================================

#[test]
fn records_deployment_audit_event() {
    let fx = fixture();

    let deployment = fx
        .creator()
        .create(&fx.app.guid, Some(&fx.droplet.guid), &user())
        .unwrap();
    let event = fx.audit.last().expect("audit event recorded");

    assert_eq!(fx.audit.events().len(), 1);
    assert_eq!(event.event_type, "audit.app.deployment.create");
    assert_eq!(event.actor, "123");
    assert_eq!(event.actor_type, "user");
    assert_eq!(event.actor_name.as_deref(), Some("connor@example.com"));
    assert_eq!(event.actor_username.as_deref(), Some("braa"));
    assert_eq!(event.actee, fx.app.guid.to_string());
    assert_eq!(event.actee_type, "app");
    assert_eq!(event.actee_name, "dora");
    assert_eq!(event.space_guid, "space-guid");
    assert_eq!(event.organization_guid, "org-guid");
    assert_eq!(
        event.metadata["droplet_guid"],
        serde_json::Value::String(fx.droplet.guid.to_string())
    );
    assert_eq!(
        event.metadata["deployment_guid"],
        serde_json::Value::String(deployment.guid.to_string())
    );
}

// =============================================================================
// Atomicity
// =============================================================================

#[test]
fn audit_failure_rolls_back_everything() {
    let fx = fixture();
    let route = RouteGuid::generate();
    let mut prior = Deployment::new(&fx.app.guid, DeploymentState::Deploying);
    prior.created_at = Utc::now() - Duration::minutes(5);
    fx.store
        .transaction(|tx| {
            tx.insert_deployment(prior.clone())?;
            tx.insert_route_mapping(RouteMapping::new(&fx.app.guid, &route, &fx.web.guid))
        })
        .unwrap();

    let err = DeploymentCreate::new(fx.store.clone(), Arc::new(FailingAuditSink))
        .create(&fx.app.guid, Some(&fx.droplet.guid), &user())
        .unwrap_err();

    assert!(matches!(err, DeployError::Audit(_)));
    assert_eq!(err.kind(), DeployErrorKind::Collaborator);

    let deployments = fx.deployments();
    assert_eq!(deployments.len(), 1);
    assert_eq!(deployments[0].state, DeploymentState::Deploying);
    assert_eq!(fx.processes().len(), 1);
    assert!(fx.reload_app().droplet.is_none());
    let revisions = fx
        .store
        .transaction(|tx| tx.revisions_for_app(&fx.app.guid))
        .unwrap();
    assert!(revisions.is_empty());
}

#[test]
fn revision_failure_rolls_back_everything() {
    let fx = fixture();
    let route = RouteGuid::generate();
    fx.store
        .transaction(|tx| {
            tx.insert_route_mapping(RouteMapping::new(&fx.app.guid, &route, &fx.web.guid))
        })
        .unwrap();

    let err = fx
        .creator()
        .with_revisions(Arc::new(RejectingRevisions))
        .create(&fx.app.guid, Some(&fx.droplet.guid), &user())
        .unwrap_err();

    assert!(matches!(err, DeployError::Revision(_)));
    assert_eq!(err.kind(), DeployErrorKind::Collaborator);

    assert!(fx.deployments().is_empty());
    assert_eq!(fx.processes().len(), 1);
    assert_eq!(fx.mappings(&fx.web).len(), 1);
    assert!(fx.reload_app().droplet.is_none());
    let revisions = fx
        .store
        .transaction(|tx| tx.revisions_for_app(&fx.app.guid))
        .unwrap();
    assert!(revisions.is_empty());
    assert!(fx.audit.events().is_empty());
}

#[test]
fn unavailable_store_aborts_create() {
    let fx = fixture();
    fx.store.set_available(false);

    let err = fx
        .creator()
        .create(&fx.app.guid, Some(&fx.droplet.guid), &user())
        .unwrap_err();

    assert!(matches!(err, DeployError::Store(StoreError::Unavailable(_))));
    assert_eq!(err.kind(), DeployErrorKind::Transaction);
    assert!(fx.audit.events().is_empty());

    fx.store.set_available(true);
    assert!(fx.deployments().is_empty());
}
