use chrono::{DateTime, Utc};

use super::domain::{AssignmentEvent, Case, CaseId, Lawyer, LawyerId};

/// Storage abstraction so the assignment service can run against any backend.
///
/// Everything that mutates state goes through [`AssignmentRepository::transaction`];
/// an implementation must apply all writes made inside `work` or none of them.
pub trait AssignmentRepository: Send + Sync {
    fn insert_case(&self, case: Case) -> Result<Case, RepositoryError>;
    fn fetch_case(&self, id: &CaseId) -> Result<Option<Case>, RepositoryError>;
    /// Every lawyer in the directory, in directory order.
    fn candidate_pool(&self) -> Result<Vec<Lawyer>, RepositoryError>;
    fn events_for(&self, id: &CaseId) -> Result<Vec<AssignmentEvent>, RepositoryError>;

    fn transaction<T, F>(&self, work: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&mut dyn AssignmentTransaction) -> Result<T, RepositoryError>;
}

/// Write operations available inside one transaction.
pub trait AssignmentTransaction {
    fn case(&self, id: &CaseId) -> Result<Case, RepositoryError>;
    fn update_case(&mut self, case: &Case) -> Result<(), RepositoryError>;

    /// Re-checks the lawyer against current state and takes one slot.
    ///
    /// Fails with [`RepositoryError::CapacityExhausted`] when the lawyer is
    /// unavailable or full. Also counts the assignment in the performance record.
    fn reserve_capacity(&mut self, id: &LawyerId) -> Result<Lawyer, RepositoryError>;

    /// Counts a rejection, stamps the time, and frees the slot the case held.
    fn record_rejection(
        &mut self,
        id: &LawyerId,
        at: DateTime<Utc>,
    ) -> Result<Lawyer, RepositoryError>;

    fn record_acceptance(&mut self, id: &LawyerId) -> Result<Lawyer, RepositoryError>;

    fn append_event(&mut self, event: AssignmentEvent) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("lawyer {0} has no remaining capacity")]
    CapacityExhausted(LawyerId),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hook fired after an assignment commits (e-mail, chat, push adapters).
pub trait AssignmentNotifier: Send + Sync {
    fn notify_assigned(&self, case: &Case, lawyer: &Lawyer) -> Result<(), NotificationError>;
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Notifier that drops every message; useful for batch jobs and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl AssignmentNotifier for NoopNotifier {
    fn notify_assigned(&self, _case: &Case, _lawyer: &Lawyer) -> Result<(), NotificationError> {
        Ok(())
    }
}
