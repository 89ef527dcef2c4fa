use super::common::*;
use crate::matching::domain::{
    AssignmentEvent, AssignmentEventKind, CaseId, CaseStatus, LawyerId,
};
use crate::matching::repository::{AssignmentRepository, RepositoryError};
use crate::matching::InMemoryAssignmentStore;

fn assigned_event(case_id: &str, lawyer_id: &str) -> AssignmentEvent {
    AssignmentEvent {
        case_id: CaseId(case_id.to_string()),
        lawyer_id: LawyerId(lawyer_id.to_string()),
        kind: AssignmentEventKind::Assigned,
        at: now(),
        metadata: Default::default(),
    }
}

#[test]
fn duplicate_case_conflicts() {
    let store = InMemoryAssignmentStore::default();
    store.insert_case(case("c-1")).expect("first insert");
    assert_eq!(
        store.insert_case(case("c-1")).expect_err("duplicate"),
        RepositoryError::Conflict
    );
}

#[test]
fn failed_transaction_discards_staged_writes() {
    let store = InMemoryAssignmentStore::with_lawyers(vec![lawyer("l-1")]);
    store.insert_case(case("c-1")).expect("insert");

    let result: Result<(), _> = store.transaction(|tx| {
        tx.reserve_capacity(&LawyerId("l-1".to_string()))?;
        tx.append_event(assigned_event("c-1", "l-1"))?;
        Err(RepositoryError::Unavailable("downstream write failed".to_string()))
    });

    assert!(result.is_err());
    assert_eq!(stored_lawyer(&store, "l-1").active_cases, 2);
    assert!(store.events().expect("events").is_empty());
}

#[test]
fn committed_transaction_is_visible() {
    let store = InMemoryAssignmentStore::with_lawyers(vec![lawyer("l-1")]);
    store.insert_case(case("c-1")).expect("insert");

    let reserved = store
        .transaction(|tx| {
            let lawyer = tx.reserve_capacity(&LawyerId("l-1".to_string()))?;
            tx.append_event(assigned_event("c-1", "l-1"))?;
            Ok(lawyer)
        })
        .expect("commit");

    assert_eq!(reserved.active_cases, 3);
    assert_eq!(stored_lawyer(&store, "l-1").active_cases, 3);
    assert_eq!(case_events(&store, "c-1").len(), 1);
    assert!(case_events(&store, "c-2").is_empty());
}

#[test]
fn reserve_refuses_full_or_unavailable_lawyers() {
    let mut full = lawyer("full");
    full.active_cases = full.max_capacity;
    let mut away = lawyer("away");
    away.available = false;
    let store = InMemoryAssignmentStore::with_lawyers(vec![full, away]);

    for id in ["full", "away"] {
        let lawyer_id = LawyerId(id.to_string());
        let err = store
            .transaction(|tx| tx.reserve_capacity(&lawyer_id))
            .expect_err("no slot");
        assert_eq!(err, RepositoryError::CapacityExhausted(lawyer_id.clone()));
    }

    let missing = store
        .transaction(|tx| tx.reserve_capacity(&LawyerId("ghost".to_string())))
        .expect_err("unknown lawyer");
    assert_eq!(missing, RepositoryError::NotFound);
}

#[test]
fn rejection_frees_slot_and_stamps_time() {
    let mut idle = lawyer("l-1");
    idle.active_cases = 0;
    let store = InMemoryAssignmentStore::with_lawyers(vec![idle]);

    let updated = store
        .transaction(|tx| tx.record_rejection(&LawyerId("l-1".to_string()), now()))
        .expect("recorded");

    assert_eq!(updated.active_cases, 0);
    assert_eq!(updated.performance.rejected, 3);
    assert_eq!(updated.performance.last_rejection_at, Some(now()));
}

#[test]
fn upsert_replaces_existing_lawyer() {
    let store = InMemoryAssignmentStore::with_lawyers(vec![lawyer("l-1")]);
    let mut changed = lawyer("l-1");
    changed.max_capacity = 25;
    store.upsert_lawyer(changed).expect("upsert");
    store.upsert_lawyer(lawyer("l-2")).expect("insert");

    let pool = store.candidate_pool().expect("pool");
    assert_eq!(pool.len(), 2);
    assert_eq!(pool[0].max_capacity, 25);
    assert_eq!(pool[1].id, LawyerId("l-2".to_string()));
}

#[test]
fn transaction_sees_its_own_writes() {
    let store = InMemoryAssignmentStore::with_lawyers(vec![lawyer("l-1")]);
    store.insert_case(case("c-1")).expect("insert");

    let (second, status) = store
        .transaction(|tx| {
            let l1 = LawyerId("l-1".to_string());
            tx.reserve_capacity(&l1)?;
            let second = tx.reserve_capacity(&l1)?;

            let mut case = tx.case(&CaseId("c-1".to_string()))?;
            case.status = CaseStatus::Assigned;
            tx.update_case(&case)?;
            Ok((second, tx.case(&case.id)?.status))
        })
        .expect("commit");

    assert_eq!(second.active_cases, 4);
    assert_eq!(status, CaseStatus::Assigned);
    assert_eq!(stored_lawyer(&store, "l-1").active_cases, 4);
    assert_eq!(stored_case(&store, "c-1").status, CaseStatus::Assigned);
}

#[test]
fn failed_transaction_keeps_earlier_events() {
    let store = InMemoryAssignmentStore::with_lawyers(vec![lawyer("l-1")]);
    store.insert_case(case("c-1")).expect("insert");
    store
        .transaction(|tx| tx.append_event(assigned_event("c-1", "l-1")))
        .expect("first commit");

    let result: Result<(), _> = store.transaction(|tx| {
        tx.append_event(assigned_event("c-1", "l-1"))?;
        Err(RepositoryError::Conflict)
    });

    assert!(result.is_err());
    assert_eq!(case_events(&store, "c-1").len(), 1);
}

#[test]
fn updating_unknown_case_fails() {
    let store = InMemoryAssignmentStore::default();
    let err = store
        .transaction(|tx| tx.update_case(&case("ghost")))
        .expect_err("case was never inserted");
    assert_eq!(err, RepositoryError::NotFound);
}
