use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};

use crate::config::MatchingConfig;
use crate::matching::domain::{
    AssignmentEvent, Case, CaseId, CaseStatus, ClaimType, ComplexityTier, CoverageEntry,
    Jurisdiction, Lawyer, LawyerId, PerformanceRecord, UrgencyTier,
};
use crate::matching::repository::{
    AssignmentNotifier, AssignmentRepository, AssignmentTransaction, NotificationError,
    RepositoryError,
};
use crate::matching::{AssignmentService, FixedClock, InMemoryAssignmentStore};

pub(crate) fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// Wednesday 2025-03-12 12:00 UTC.
pub(crate) fn now() -> DateTime<Utc> {
    at(2025, 3, 12, 12)
}

pub(crate) fn utc_offset() -> FixedOffset {
    FixedOffset::east_opt(0).expect("valid offset")
}

pub(crate) fn matching_config() -> MatchingConfig {
    MatchingConfig {
        office_hours_offset: utc_offset(),
        ..MatchingConfig::default()
    }
}

pub(crate) fn case(id: &str) -> Case {
    Case {
        id: CaseId(id.to_string()),
        claim_type: ClaimType::WrongfulDismissal,
        jurisdiction: Jurisdiction {
            province: "Buenos Aires".to_string(),
            city: Some("La Plata".to_string()),
            court_system: None,
        },
        estimated_amount: 2_500_000.0,
        monthly_salary: None,
        complexity: ComplexityTier::Medium,
        urgency: UrgencyTier::Normal,
        required_certifications: Vec::new(),
        created_at: now() - Duration::days(1),
        status: CaseStatus::Pending,
        assigned_lawyer: None,
        assigned_at: None,
        reassignment_attempts: 0,
        rejected_by: BTreeSet::new(),
    }
}

/// Strong fit for `case`: scores 98.5.
pub(crate) fn lawyer(id: &str) -> Lawyer {
    Lawyer {
        id: LawyerId(id.to_string()),
        name: format!("Lawyer {id}"),
        coverage: vec![CoverageEntry {
            province: "Buenos Aires".to_string(),
            cities: vec!["La Plata".to_string(), "CABA".to_string()],
            court_system: None,
        }],
        specializations: BTreeSet::from([ClaimType::WrongfulDismissal]),
        certifications: BTreeSet::new(),
        active_cases: 2,
        max_capacity: 10,
        performance: PerformanceRecord {
            assigned: 20,
            accepted: 18,
            rejected: 2,
            success_rate: 85.0,
            avg_response_hours: 3.0,
            last_rejection_at: None,
        },
        available: true,
        leave: None,
        office_hours: None,
        years_of_experience: 8,
    }
}

/// Province-only coverage, no matching specialization: scores 68.95 for `case`.
pub(crate) fn fallback_lawyer(id: &str) -> Lawyer {
    Lawyer {
        id: LawyerId(id.to_string()),
        name: format!("Lawyer {id}"),
        coverage: vec![CoverageEntry {
            province: "Buenos Aires".to_string(),
            cities: vec!["Mar del Plata".to_string()],
            court_system: None,
        }],
        specializations: BTreeSet::from([ClaimType::UnpaidWages]),
        certifications: BTreeSet::new(),
        active_cases: 6,
        max_capacity: 10,
        performance: PerformanceRecord {
            assigned: 10,
            accepted: 6,
            rejected: 1,
            success_rate: 60.0,
            avg_response_hours: 14.0,
            last_rejection_at: None,
        },
        available: true,
        leave: None,
        office_hours: None,
        years_of_experience: 4,
    }
}

/// Out of jurisdiction and overloaded: scores 16.5 for `case`.
pub(crate) fn weak_lawyer(id: &str) -> Lawyer {
    Lawyer {
        id: LawyerId(id.to_string()),
        name: format!("Lawyer {id}"),
        coverage: vec![CoverageEntry {
            province: "Mendoza".to_string(),
            cities: Vec::new(),
            court_system: None,
        }],
        specializations: BTreeSet::from([ClaimType::Harassment]),
        certifications: BTreeSet::new(),
        active_cases: 9,
        max_capacity: 10,
        performance: PerformanceRecord {
            assigned: 10,
            accepted: 3,
            rejected: 1,
            success_rate: 20.0,
            avg_response_hours: 30.0,
            last_rejection_at: None,
        },
        available: true,
        leave: None,
        office_hours: None,
        years_of_experience: 1,
    }
}

pub(crate) type TestService = AssignmentService<InMemoryAssignmentStore, RecordingNotifier>;

pub(crate) fn build_service_with(
    lawyers: Vec<Lawyer>,
    config: MatchingConfig,
) -> (
    TestService,
    Arc<InMemoryAssignmentStore>,
    Arc<RecordingNotifier>,
) {
    let store = Arc::new(InMemoryAssignmentStore::with_lawyers(lawyers));
    let notifier = Arc::new(RecordingNotifier::default());
    let service = AssignmentService::with_clock(
        store.clone(),
        notifier.clone(),
        config,
        Arc::new(FixedClock(now())),
    );
    (service, store, notifier)
}

pub(crate) fn build_service(
    lawyers: Vec<Lawyer>,
) -> (
    TestService,
    Arc<InMemoryAssignmentStore>,
    Arc<RecordingNotifier>,
) {
    build_service_with(lawyers, matching_config())
}

pub(crate) fn stored_lawyer(store: &InMemoryAssignmentStore, id: &str) -> Lawyer {
    store
        .lawyer(&LawyerId(id.to_string()))
        .expect("store readable")
        .expect("lawyer present")
}

pub(crate) fn stored_case(store: &InMemoryAssignmentStore, id: &str) -> Case {
    store
        .fetch_case(&CaseId(id.to_string()))
        .expect("store readable")
        .expect("case present")
}

pub(crate) fn case_events(store: &InMemoryAssignmentStore, id: &str) -> Vec<AssignmentEvent> {
    store
        .events_for(&CaseId(id.to_string()))
        .expect("store readable")
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    sent: Mutex<Vec<(CaseId, LawyerId)>>,
}

impl RecordingNotifier {
    pub(crate) fn sent(&self) -> Vec<(CaseId, LawyerId)> {
        self.sent.lock().expect("notifier mutex poisoned").clone()
    }
}

impl AssignmentNotifier for RecordingNotifier {
    fn notify_assigned(&self, case: &Case, lawyer: &Lawyer) -> Result<(), NotificationError> {
        self.sent
            .lock()
            .expect("notifier mutex poisoned")
            .push((case.id.clone(), lawyer.id.clone()));
        Ok(())
    }
}

pub(crate) struct UnreachableNotifier;

impl AssignmentNotifier for UnreachableNotifier {
    fn notify_assigned(&self, _case: &Case, _lawyer: &Lawyer) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("smtp relay down".to_string()))
    }
}

/// Write failure injected into transactions by [`FaultyStore`].
pub(crate) enum Fault {
    /// Every event append fails.
    EventLogDown,
    /// The lawyer looks free in the pool but is full by the time capacity is reserved.
    FilledUp(LawyerId),
}

/// Delegates to the in-memory store and injects one kind of write failure.
pub(crate) struct FaultyStore {
    pub(crate) inner: InMemoryAssignmentStore,
    pub(crate) fault: Fault,
}

impl AssignmentRepository for FaultyStore {
    fn insert_case(&self, case: Case) -> Result<Case, RepositoryError> {
        self.inner.insert_case(case)
    }

    fn fetch_case(&self, id: &CaseId) -> Result<Option<Case>, RepositoryError> {
        self.inner.fetch_case(id)
    }

    fn candidate_pool(&self) -> Result<Vec<Lawyer>, RepositoryError> {
        self.inner.candidate_pool()
    }

    fn events_for(&self, id: &CaseId) -> Result<Vec<AssignmentEvent>, RepositoryError> {
        self.inner.events_for(id)
    }

    fn transaction<T, F>(&self, work: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&mut dyn AssignmentTransaction) -> Result<T, RepositoryError>,
    {
        self.inner.transaction(|tx| {
            let mut faulty = FaultyTransaction {
                inner: tx,
                fault: &self.fault,
            };
            work(&mut faulty)
        })
    }
}

struct FaultyTransaction<'a> {
    inner: &'a mut dyn AssignmentTransaction,
    fault: &'a Fault,
}

impl AssignmentTransaction for FaultyTransaction<'_> {
    fn case(&self, id: &CaseId) -> Result<Case, RepositoryError> {
        self.inner.case(id)
    }

    fn update_case(&mut self, case: &Case) -> Result<(), RepositoryError> {
        self.inner.update_case(case)
    }

    fn reserve_capacity(&mut self, id: &LawyerId) -> Result<Lawyer, RepositoryError> {
        match self.fault {
            Fault::FilledUp(full) if full == id => {
                Err(RepositoryError::CapacityExhausted(id.clone()))
            }
            _ => self.inner.reserve_capacity(id),
        }
    }

    fn record_rejection(
        &mut self,
        id: &LawyerId,
        at: DateTime<Utc>,
    ) -> Result<Lawyer, RepositoryError> {
        self.inner.record_rejection(id, at)
    }

    fn record_acceptance(&mut self, id: &LawyerId) -> Result<Lawyer, RepositoryError> {
        self.inner.record_acceptance(id)
    }

    fn append_event(&mut self, event: AssignmentEvent) -> Result<(), RepositoryError> {
        match self.fault {
            Fault::EventLogDown => Err(RepositoryError::Unavailable(
                "event log offline".to_string(),
            )),
            Fault::FilledUp(_) => self.inner.append_event(event),
        }
    }
}

pub(crate) fn build_faulty_service(
    lawyers: Vec<Lawyer>,
    fault: Fault,
) -> (
    AssignmentService<FaultyStore, RecordingNotifier>,
    InMemoryAssignmentStore,
    Arc<RecordingNotifier>,
) {
    let inner = InMemoryAssignmentStore::with_lawyers(lawyers);
    let store = Arc::new(FaultyStore {
        inner: inner.clone(),
        fault,
    });
    let notifier = Arc::new(RecordingNotifier::default());
    let service = AssignmentService::with_clock(
        store,
        notifier.clone(),
        matching_config(),
        Arc::new(FixedClock(now())),
    );
    (service, inner, notifier)
}
