//! Case-to-lawyer matching: availability filtering, scoring, ranking, and the
//! assignment and rejection transactions.

pub mod availability;
pub mod clock;
pub mod domain;
pub mod memory;
pub mod ranking;
pub mod repository;
pub mod scoring;
pub mod service;

#[cfg(test)]
pub(crate) mod tests;

pub use availability::{AvailabilityFilter, Exclusion};
pub use clock::{Clock, FixedClock, SystemClock};
pub use domain::{
    AssignmentEvent, AssignmentEventKind, Case, CaseId, CaseStatus, ClaimType, ComplexityTier,
    CourtSystem, CoverageEntry, Jurisdiction, Lawyer, LawyerId, LeaveWindow, OfficeHours,
    PerformanceRecord, UrgencyTier,
};
pub use memory::InMemoryAssignmentStore;
pub use ranking::{rank, RankingPolicy};
pub use repository::{
    AssignmentNotifier, AssignmentRepository, AssignmentTransaction, NoopNotifier,
    NotificationError, RepositoryError,
};
pub use scoring::{MatchResult, ScoreCalculator, ScoreComponent, ScoreFactor};
pub use service::{
    Assignment, AssignmentError, AssignmentService, MatchOutcome, MatchRequest, Reassignment,
};
