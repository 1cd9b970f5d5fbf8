mod support;

use scanpack_rust::{
    DuplicateScope, LotStep, PairStep, PairingConflict, ScanMode, ScanOutcome, WorkflowConfig,
    WorkflowError, WorkflowState,
};
use support::{start, FlakyStore, Scanner};

#[test]
fn lot_mode_rejects_second_scan_of_staged_key() {
    let config = WorkflowConfig::default().with_default_mode(ScanMode::Lot);
    let mut workflow = start(config, FlakyStore::new());
    let mut scanner = Scanner::new();

    assert!(matches!(scanner.scan(&mut workflow, "U1"), ScanOutcome::SignedIn(_)));
    assert_eq!(
        scanner.scan(&mut workflow, "PRODX"),
        ScanOutcome::KeyLocked("PRODX".into())
    );
    assert!(scanner.scan(&mut workflow, "T1").staged_id().is_some());

    let staged = workflow.staged();
    assert_eq!(staged.len(), 1);
    assert_eq!(staged[0].primary_key, "T1");
    assert_eq!(staged[0].secondary_key, "PRODX");

    let outcome = scanner.scan(&mut workflow, "T1");
    assert_eq!(
        outcome.error(),
        Some(&WorkflowError::DuplicatePrimaryKey {
            key: "T1".into(),
            scope: DuplicateScope::Staged,
        })
    );
    assert_eq!(workflow.staged_count(), 1);
    assert_eq!(
        workflow.state(),
        &WorkflowState::Lot(LotStep::AwaitingPrimary {
            locked: "PRODX".into()
        })
    );
}

#[test]
fn pair_mode_rejects_primary_scanned_twice() {
    let mut workflow = start(WorkflowConfig::default(), FlakyStore::new());
    let mut scanner = Scanner::new();
    scanner.scan(&mut workflow, "U1");

    assert_eq!(
        scanner.scan(&mut workflow, "T2"),
        ScanOutcome::PrimaryHeld("T2".into())
    );
    let outcome = scanner.scan(&mut workflow, "T2");
    assert_eq!(
        outcome.error(),
        Some(&WorkflowError::InvalidPairing {
            value: "T2".into(),
            reason: PairingConflict::PendingPrimary,
        })
    );
    assert_eq!(workflow.staged_count(), 0);
    assert_eq!(workflow.state(), &WorkflowState::Pair(PairStep::AwaitingPrimary));

    scanner.scan(&mut workflow, "T2");
    assert!(scanner.scan(&mut workflow, "B2").staged_id().is_some());

    let staged = workflow.staged();
    assert_eq!(staged.len(), 1);
    assert_eq!(staged[0].primary_key, "T2");
    assert_eq!(staged[0].secondary_key, "B2");
}

#[test]
fn successful_commit_persists_exactly_the_batch() {
    let store = FlakyStore::new();
    let mut workflow = start(WorkflowConfig::default(), store.clone());
    let mut scanner = Scanner::new();
    scanner.scan_all(&mut workflow, &["U1", "T1", "P1", "T2", "P2", "T3", "P3"]);
    assert_eq!(workflow.staged_count(), 3);

    let receipt = workflow.commit().unwrap();
    assert_eq!(receipt.committed_count, 3);
    assert_eq!(receipt.primary_keys, vec!["T1", "T2", "T3"]);
    assert_eq!(workflow.staged_count(), 0);
    assert_eq!(workflow.committed_total(), 3);

    let rows = store.inner().rows().unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|row| row.batch_id == receipt.batch_id));
    assert!(rows.iter().all(|row| row.committed_at == receipt.committed_at));
    assert!(rows.iter().all(|row| row.operator_id == "U1"));
}

#[test]
fn failed_commit_keeps_the_buffer() {
    let store = FlakyStore::new();
    let mut workflow = start(WorkflowConfig::default(), store.clone());
    let mut scanner = Scanner::new();
    scanner.scan_all(&mut workflow, &["U1", "T1", "P1", "T2", "P2"]);
    let before: Vec<_> = workflow.staged().into_iter().cloned().collect();

    store.fail_writes(true);
    let err = workflow.commit().unwrap_err();
    assert!(matches!(err, WorkflowError::CommitFailure(_)));

    let after: Vec<_> = workflow.staged().into_iter().cloned().collect();
    assert_eq!(after, before);
    assert_eq!(workflow.committed_total(), 0);
    assert!(store.inner().is_empty().unwrap());
    assert!(workflow.notice().is_some());

    store.fail_writes(false);
    let receipt = workflow.commit().unwrap();
    assert_eq!(receipt.committed_count, 2);
    assert_eq!(workflow.committed_total(), 2);
    assert!(workflow.notice().is_none());
}

#[test]
fn persisted_key_is_rejected_in_a_later_session() {
    let store = FlakyStore::new();
    let mut first = start(WorkflowConfig::default(), store.clone());
    let mut scanner = Scanner::new();
    scanner.scan_all(&mut first, &["U1", "T1", "P1"]);
    first.commit().unwrap();

    let mut second = start(WorkflowConfig::default(), store);
    let mut scanner = Scanner::new();
    scanner.scan_all(&mut second, &["U2", "T1"]);
    let outcome = scanner.scan(&mut second, "P9");
    assert_eq!(
        outcome.error(),
        Some(&WorkflowError::DuplicatePrimaryKey {
            key: "T1".into(),
            scope: DuplicateScope::Persisted,
        })
    );
    assert_eq!(second.state(), &WorkflowState::Pair(PairStep::AwaitingPrimary));
    assert_eq!(second.staged_count(), 0);
}
