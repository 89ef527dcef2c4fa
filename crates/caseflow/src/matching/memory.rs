use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use super::domain::{AssignmentEvent, Case, CaseId, Lawyer, LawyerId};
use super::repository::{AssignmentRepository, AssignmentTransaction, RepositoryError};

#[derive(Debug, Default)]
struct StoreState {
    cases: HashMap<CaseId, Case>,
    lawyers: Vec<Lawyer>,
    events: Vec<AssignmentEvent>,
}

impl StoreState {
    fn apply(&mut self, staged: StagedWrites) {
        self.cases.extend(staged.cases);
        for lawyer in &mut self.lawyers {
            if let Some(updated) = staged.lawyers.get(&lawyer.id) {
                *lawyer = updated.clone();
            }
        }
        self.events.extend(staged.events);
    }
}

/// Process-local store. Transactions stage the records they touch and the events
/// they append, then apply them under the same lock, so readers never see half a commit.
#[derive(Debug, Default, Clone)]
pub struct InMemoryAssignmentStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryAssignmentStore {
    pub fn with_lawyers(lawyers: Vec<Lawyer>) -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState {
                lawyers,
                ..StoreState::default()
            })),
        }
    }

    pub fn upsert_lawyer(&self, lawyer: Lawyer) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        match state.lawyers.iter_mut().find(|existing| existing.id == lawyer.id) {
            Some(existing) => *existing = lawyer,
            None => state.lawyers.push(lawyer),
        }
        Ok(())
    }

    pub fn lawyer(&self, id: &LawyerId) -> Result<Option<Lawyer>, RepositoryError> {
        let state = self.lock()?;
        Ok(state.lawyers.iter().find(|lawyer| &lawyer.id == id).cloned())
    }

    pub fn events(&self) -> Result<Vec<AssignmentEvent>, RepositoryError> {
        Ok(self.lock()?.events.clone())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, StoreState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }
}

impl AssignmentRepository for InMemoryAssignmentStore {
    fn insert_case(&self, case: Case) -> Result<Case, RepositoryError> {
        let mut state = self.lock()?;
        if state.cases.contains_key(&case.id) {
            return Err(RepositoryError::Conflict);
        }
        state.cases.insert(case.id.clone(), case.clone());
        Ok(case)
    }

    fn fetch_case(&self, id: &CaseId) -> Result<Option<Case>, RepositoryError> {
        Ok(self.lock()?.cases.get(id).cloned())
    }

    fn candidate_pool(&self) -> Result<Vec<Lawyer>, RepositoryError> {
        Ok(self.lock()?.lawyers.clone())
    }

    fn events_for(&self, id: &CaseId) -> Result<Vec<AssignmentEvent>, RepositoryError> {
        Ok(self
            .lock()?
            .events
            .iter()
            .filter(|event| &event.case_id == id)
            .cloned()
            .collect())
    }

    fn transaction<T, F>(&self, work: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&mut dyn AssignmentTransaction) -> Result<T, RepositoryError>,
    {
        let mut state = self.lock()?;
        let (output, staged) = {
            let mut tx = MemoryTransaction {
                base: &state,
                staged: StagedWrites::default(),
            };
            let output = work(&mut tx)?;
            (output, tx.staged)
        };
        state.apply(staged);
        Ok(output)
    }
}

#[derive(Default)]
struct StagedWrites {
    cases: HashMap<CaseId, Case>,
    lawyers: HashMap<LawyerId, Lawyer>,
    events: Vec<AssignmentEvent>,
}

struct MemoryTransaction<'a> {
    base: &'a StoreState,
    staged: StagedWrites,
}

impl MemoryTransaction<'_> {
    fn lawyer_mut(&mut self, id: &LawyerId) -> Result<&mut Lawyer, RepositoryError> {
        match self.staged.lawyers.entry(id.clone()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let current = self
                    .base
                    .lawyers
                    .iter()
                    .find(|lawyer| &lawyer.id == id)
                    .cloned()
                    .ok_or(RepositoryError::NotFound)?;
                Ok(entry.insert(current))
            }
        }
    }
}

impl AssignmentTransaction for MemoryTransaction<'_> {
    fn case(&self, id: &CaseId) -> Result<Case, RepositoryError> {
        self.staged
            .cases
            .get(id)
            .or_else(|| self.base.cases.get(id))
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    fn update_case(&mut self, case: &Case) -> Result<(), RepositoryError> {
        if !self.staged.cases.contains_key(&case.id) && !self.base.cases.contains_key(&case.id) {
            return Err(RepositoryError::NotFound);
        }
        self.staged.cases.insert(case.id.clone(), case.clone());
        Ok(())
    }

    fn reserve_capacity(&mut self, id: &LawyerId) -> Result<Lawyer, RepositoryError> {
        let lawyer = self.lawyer_mut(id)?;
        if !lawyer.available || !lawyer.has_capacity() {
            return Err(RepositoryError::CapacityExhausted(id.clone()));
        }
        lawyer.active_cases += 1;
        lawyer.performance.record_assignment();
        Ok(lawyer.clone())
    }

    fn record_rejection(
        &mut self,
        id: &LawyerId,
        at: DateTime<Utc>,
    ) -> Result<Lawyer, RepositoryError> {
        let lawyer = self.lawyer_mut(id)?;
        lawyer.performance.record_rejection(at);
        lawyer.active_cases = lawyer.active_cases.saturating_sub(1);
        Ok(lawyer.clone())
    }

    fn record_acceptance(&mut self, id: &LawyerId) -> Result<Lawyer, RepositoryError> {
        let lawyer = self.lawyer_mut(id)?;
        lawyer.performance.record_acceptance();
        Ok(lawyer.clone())
    }

    fn append_event(&mut self, event: AssignmentEvent) -> Result<(), RepositoryError> {
        self.staged.events.push(event);
        Ok(())
    }
}
