use std::collections::BTreeSet;

use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for intake cases.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CaseId(pub String);

/// Identifier wrapper for lawyers in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LawyerId(pub String);

impl std::fmt::Display for CaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for LawyerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Claim categories produced by the intake pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimType {
    WrongfulDismissal,
    UnpaidWages,
    WorkplaceAccident,
    Harassment,
    Discrimination,
    UnregisteredEmployment,
    Other,
}

impl ClaimType {
    pub const fn label(self) -> &'static str {
        match self {
            ClaimType::WrongfulDismissal => "wrongful dismissal",
            ClaimType::UnpaidWages => "unpaid wages",
            ClaimType::WorkplaceAccident => "workplace accident",
            ClaimType::Harassment => "harassment",
            ClaimType::Discrimination => "discrimination",
            ClaimType::UnregisteredEmployment => "unregistered employment",
            ClaimType::Other => "other",
        }
    }
}

/// Court-system scope a case is filed under or a lawyer practices in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourtSystem {
    National,
    Federal,
    Provincial,
}

impl CourtSystem {
    /// National and federal courts hear cases regardless of province.
    pub const fn is_national(self) -> bool {
        matches!(self, CourtSystem::National | CourtSystem::Federal)
    }

    pub fn compatible_with(self, other: CourtSystem) -> bool {
        self.is_national() && self == other
    }
}

/// Where a case must be litigated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jurisdiction {
    pub province: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub court_system: Option<CourtSystem>,
}

impl Jurisdiction {
    pub fn describe(&self) -> String {
        match &self.city {
            Some(city) => format!("{}, {}", city, self.province),
            None => self.province.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityTier {
    Low,
    Medium,
    High,
    #[serde(other)]
    Unrecognized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyTier {
    Low,
    Normal,
    High,
    Critical,
}

/// Lifecycle of a case once it reaches the assignment engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Pending,
    Assigned,
    Accepted,
    /// Reassignment attempts ran out; a coordinator must pick a lawyer by hand.
    Escalated,
}

impl CaseStatus {
    pub const fn label(self) -> &'static str {
        match self {
            CaseStatus::Pending => "pending",
            CaseStatus::Assigned => "assigned",
            CaseStatus::Accepted => "accepted",
            CaseStatus::Escalated => "escalated",
        }
    }
}

/// Structured claim record handed over by the intake collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub id: CaseId,
    pub claim_type: ClaimType,
    pub jurisdiction: Jurisdiction,
    #[serde(default)]
    pub estimated_amount: f64,
    #[serde(default)]
    pub monthly_salary: Option<f64>,
    pub complexity: ComplexityTier,
    pub urgency: UrgencyTier,
    #[serde(default)]
    pub required_certifications: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default = "pending_status")]
    pub status: CaseStatus,
    #[serde(default)]
    pub assigned_lawyer: Option<LawyerId>,
    #[serde(default)]
    pub assigned_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reassignment_attempts: u32,
    #[serde(default)]
    pub rejected_by: BTreeSet<LawyerId>,
}

fn pending_status() -> CaseStatus {
    CaseStatus::Pending
}

impl Case {
    pub fn is_assigned_to(&self, lawyer_id: &LawyerId) -> bool {
        matches!(self.status, CaseStatus::Assigned | CaseStatus::Accepted)
            && self.assigned_lawyer.as_ref() == Some(lawyer_id)
    }

    pub(crate) fn assign(&mut self, lawyer_id: LawyerId, at: DateTime<Utc>) {
        self.status = CaseStatus::Assigned;
        self.assigned_lawyer = Some(lawyer_id);
        self.assigned_at = Some(at);
    }

    /// Clears the assignment after a rejection and bumps the attempt counter.
    pub(crate) fn release(&mut self, rejected_by: LawyerId) -> u32 {
        self.status = CaseStatus::Pending;
        self.assigned_lawyer = None;
        self.assigned_at = None;
        self.rejected_by.insert(rejected_by);
        self.reassignment_attempts += 1;
        self.reassignment_attempts
    }
}

/// One geographic or court-system scope a lawyer accepts cases from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageEntry {
    pub province: String,
    #[serde(default)]
    pub cities: Vec<String>,
    #[serde(default)]
    pub court_system: Option<CourtSystem>,
}

/// Counters tracked per lawyer across assignments.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub assigned: u32,
    pub accepted: u32,
    pub rejected: u32,
    /// Percentage of assigned cases that ended successfully, 0-100.
    pub success_rate: f64,
    pub avg_response_hours: f64,
    #[serde(default)]
    pub last_rejection_at: Option<DateTime<Utc>>,
}

impl PerformanceRecord {
    /// Accepted over assigned as a percentage. Zero when nothing was assigned yet.
    pub fn acceptance_rate(&self) -> f64 {
        if self.assigned == 0 {
            return 0.0;
        }
        f64::from(self.accepted) / f64::from(self.assigned) * 100.0
    }

    pub fn rejection_ratio(&self) -> f64 {
        if self.assigned == 0 {
            return 0.0;
        }
        f64::from(self.rejected) / f64::from(self.assigned)
    }

    pub(crate) fn record_assignment(&mut self) {
        self.assigned = self.assigned.saturating_add(1);
    }

    pub(crate) fn record_acceptance(&mut self) {
        self.accepted = self.accepted.saturating_add(1);
    }

    pub(crate) fn record_rejection(&mut self, at: DateTime<Utc>) {
        self.rejected = self.rejected.saturating_add(1);
        self.last_rejection_at = Some(at);
    }
}

/// Inclusive time range where the lawyer takes no new work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl LeaveWindow {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from <= at && at <= self.to
    }
}

/// Weekly office hours, hours are inclusive on both ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficeHours {
    pub days: Vec<Weekday>,
    pub start_hour: u32,
    pub end_hour: u32,
}

impl OfficeHours {
    pub fn covers(&self, weekday: Weekday, hour: u32) -> bool {
        self.days.contains(&weekday) && (self.start_hour..=self.end_hour).contains(&hour)
    }
}

/// Directory entry for a professional that can receive cases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lawyer {
    pub id: LawyerId,
    pub name: String,
    pub coverage: Vec<CoverageEntry>,
    pub specializations: BTreeSet<ClaimType>,
    #[serde(default)]
    pub certifications: BTreeSet<String>,
    pub active_cases: u32,
    pub max_capacity: u32,
    #[serde(default)]
    pub performance: PerformanceRecord,
    pub available: bool,
    #[serde(default)]
    pub leave: Option<LeaveWindow>,
    #[serde(default)]
    pub office_hours: Option<OfficeHours>,
    pub years_of_experience: u32,
}

impl Lawyer {
    pub fn has_capacity(&self) -> bool {
        self.active_cases < self.max_capacity
    }

    /// Active over capacity; a zero capacity reads as fully booked.
    pub fn occupancy(&self) -> f64 {
        if self.max_capacity == 0 {
            return 1.0;
        }
        f64::from(self.active_cases) / f64::from(self.max_capacity)
    }
}

/// Append-only audit trail entry kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentEventKind {
    Assigned,
    Accepted,
    Rejected,
    ReassignmentExhausted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentEvent {
    pub case_id: CaseId,
    pub lawyer_id: LawyerId,
    pub kind: AssignmentEventKind,
    pub at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: std::collections::BTreeMap<String, String>,
}
