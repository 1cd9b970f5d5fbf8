#![cfg(feature = "emitter")]

use std::sync::{mpsc, Mutex};
use std::time::Duration;

use scanpack_rust::{
    Feedback, FeedbackKind, InMemoryPersistentStore, InMemoryUserDirectory, ScanEvent, Workflow,
    WorkflowConfig,
};

type FeedbackWorkflow = Workflow<InMemoryPersistentStore, InMemoryUserDirectory>;

fn workflow() -> FeedbackWorkflow {
    let directory = InMemoryUserDirectory::new().with_user("U1", "Somchai");
    Workflow::start(WorkflowConfig::default(), InMemoryPersistentStore::new(), directory).unwrap()
}

fn listen(workflow: &mut FeedbackWorkflow, kind: FeedbackKind) -> mpsc::Receiver<Feedback> {
    let (tx, rx) = mpsc::channel();
    let tx = Mutex::new(tx);
    workflow.feedback_mut().on(kind, move |feedback: Feedback| {
        if let Ok(tx) = tx.lock() {
            let _ = tx.send(feedback);
        }
    });
    rx
}

#[test]
fn rejected_scan_emits_error_cue() {
    let mut workflow = workflow();
    let rejected = listen(&mut workflow, FeedbackKind::ScanRejected);

    workflow.on_scan(ScanEvent::new(1, "U9"));

    let feedback = rejected.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(feedback.value.as_deref(), Some("U9"));
    assert_eq!(feedback.message, "operator U9 not found");
}

#[test]
fn staged_and_committed_scans_emit_success_cues() {
    let mut workflow = workflow();
    let accepted = listen(&mut workflow, FeedbackKind::ScanAccepted);
    let committed = listen(&mut workflow, FeedbackKind::BatchCommitted);

    workflow.on_scan(ScanEvent::new(1, "U1"));
    workflow.on_scan(ScanEvent::new(2, "T1"));
    workflow.on_scan(ScanEvent::new(3, "P1"));
    let receipt = workflow.commit().unwrap();

    let mut staged_counts: Vec<usize> = (0..3)
        .map(|_| accepted.recv_timeout(Duration::from_secs(2)).unwrap().staged)
        .collect();
    staged_counts.sort_unstable();
    assert_eq!(staged_counts, vec![0, 0, 1]);

    let feedback = committed.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(feedback.value.as_deref(), Some(receipt.batch_id.as_str()));
    assert_eq!(feedback.staged, 0);
    assert_eq!(workflow.feedback_mut().emitted(), 4);
}

#[test]
fn failed_commit_emits_batch_failed() {
    let mut workflow = workflow();
    let failed = listen(&mut workflow, FeedbackKind::BatchFailed);

    workflow.on_scan(ScanEvent::new(1, "U1"));
    assert!(workflow.commit().is_err());

    let feedback = failed.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(feedback.message, "commit failed: nothing is staged");
    assert!(failed.recv_timeout(Duration::from_millis(100)).is_err());
}

#[test]
fn ignored_scans_emit_nothing() {
    let mut workflow = workflow();
    let event = ScanEvent::new(1, "U1");
    workflow.on_scan(event.clone());
    let before = workflow.feedback_mut().emitted();

    workflow.on_scan(event);
    workflow.on_scan(ScanEvent::new(2, ""));
    assert_eq!(workflow.feedback_mut().emitted(), before);
}
