use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::availability::AvailabilityFilter;
use super::clock::{Clock, SystemClock};
use super::domain::{
    AssignmentEvent, AssignmentEventKind, Case, CaseId, CaseStatus, Lawyer, LawyerId,
};
use super::ranking::{rank, RankingPolicy};
use super::repository::{AssignmentNotifier, AssignmentRepository, RepositoryError};
use super::scoring::{MatchResult, ScoreCalculator};
use crate::config::MatchingConfig;

/// Caller options for a matching round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRequest {
    #[serde(default)]
    pub auto_assign: bool,
    #[serde(default)]
    pub top_n: Option<usize>,
}

/// Committed binding between a case and a lawyer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub case: Case,
    pub lawyer_id: LawyerId,
    pub lawyer_name: String,
    pub score: Option<f64>,
    pub assigned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MatchOutcome {
    Assigned {
        assignment: Assignment,
        candidates: Vec<MatchResult>,
    },
    /// Nothing was committed; a coordinator picks from the ranked list.
    Suggested { candidates: Vec<MatchResult> },
}

impl MatchOutcome {
    pub fn candidates(&self) -> &[MatchResult] {
        match self {
            MatchOutcome::Assigned { candidates, .. } | MatchOutcome::Suggested { candidates } => {
                candidates
            }
        }
    }
}

/// Result of a rejection that was followed by a successful reassignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reassignment {
    pub rejected_by: LawyerId,
    pub attempt: u32,
    pub assignment: Assignment,
    pub candidates: Vec<MatchResult>,
}

/// How an assignment came about; recorded on the `assigned` event.
#[derive(Debug, Clone, Copy)]
enum AssignmentOrigin {
    Automatic,
    Manual,
    Reassignment { attempt: u32 },
}

impl AssignmentOrigin {
    fn label(self) -> &'static str {
        match self {
            AssignmentOrigin::Automatic => "automatic",
            AssignmentOrigin::Manual => "manual",
            AssignmentOrigin::Reassignment { .. } => "reassignment",
        }
    }
}

/// Service composing availability, scoring, ranking, and the repository transactions.
pub struct AssignmentService<R, N> {
    repository: Arc<R>,
    notifier: Arc<N>,
    clock: Arc<dyn Clock>,
    calculator: ScoreCalculator,
    config: MatchingConfig,
}

impl<R, N> AssignmentService<R, N>
where
    R: AssignmentRepository + 'static,
    N: AssignmentNotifier + 'static,
{
    pub fn new(repository: Arc<R>, notifier: Arc<N>, config: MatchingConfig) -> Self {
        Self::with_clock(repository, notifier, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        repository: Arc<R>,
        notifier: Arc<N>,
        config: MatchingConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            notifier,
            clock,
            calculator: ScoreCalculator::new(),
            config,
        }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    pub fn initial_policy(&self) -> RankingPolicy {
        RankingPolicy {
            min_score: self.config.min_score,
            top_n: self.config.top_n,
            auto_assign_score: self.config.auto_assign_score,
        }
    }

    /// Relaxed policy after a rejection: any candidate that clears the minimum is committed.
    pub fn reassignment_policy(&self) -> RankingPolicy {
        RankingPolicy {
            min_score: self.config.reassignment_min_score,
            top_n: self.config.reassignment_top_n,
            auto_assign_score: self.config.reassignment_min_score,
        }
    }

    /// Stores a case handed over by intake. Engine-owned fields start fresh.
    pub fn register_case(&self, mut case: Case) -> Result<Case, AssignmentError> {
        case.status = CaseStatus::Pending;
        case.assigned_lawyer = None;
        case.assigned_at = None;
        case.reassignment_attempts = 0;
        case.rejected_by.clear();

        let stored = self.repository.insert_case(case)?;
        debug!(case_id = %stored.id, claim_type = ?stored.claim_type, "case registered");
        Ok(stored)
    }

    pub fn get_case(&self, case_id: &CaseId) -> Result<Case, AssignmentError> {
        self.repository
            .fetch_case(case_id)?
            .ok_or_else(|| AssignmentError::CaseNotFound(case_id.clone()))
    }

    pub fn events(&self, case_id: &CaseId) -> Result<Vec<AssignmentEvent>, AssignmentError> {
        self.get_case(case_id)?;
        Ok(self.repository.events_for(case_id)?)
    }

    /// Availability filter, scoring, and ranking over an explicit snapshot. No writes.
    pub fn rank_candidates(
        &self,
        case: &Case,
        pool: &[Lawyer],
        policy: &RankingPolicy,
        now: DateTime<Utc>,
    ) -> Result<Vec<MatchResult>, AssignmentError> {
        let filter = AvailabilityFilter::new(now, self.config.office_hours_offset);
        let partition = filter.partition(
            pool.iter()
                .filter(|lawyer| !case.rejected_by.contains(&lawyer.id)),
        );

        for (lawyer_id, reason) in &partition.excluded {
            debug!(case_id = %case.id, %lawyer_id, ?reason, "lawyer excluded from round");
        }

        if partition.kept.is_empty() {
            return Err(AssignmentError::NoAvailableCandidates);
        }

        let scored = self.calculator.score_all(case, partition.kept, now);
        rank(scored, policy).map_err(|below| AssignmentError::InsufficientScore {
            best_score: below.best_score,
            min_score: below.min_score,
        })
    }

    /// Ranks the pool for a pending case and, when asked, commits the top candidate.
    pub fn match_case(
        &self,
        case_id: &CaseId,
        request: MatchRequest,
    ) -> Result<MatchOutcome, AssignmentError> {
        let case = self.get_case(case_id)?;
        ensure_pending(&case)?;

        let mut policy = self.initial_policy();
        if let Some(top_n) = request.top_n {
            policy.top_n = top_n.max(1);
        }

        let now = self.clock.now();
        let pool = self.repository.candidate_pool()?;
        let candidates = self.rank_candidates(&case, &pool, &policy, now)?;

        let best = &candidates[0];
        if !request.auto_assign || !policy.qualifies_for_auto_assign(best) {
            debug!(
                case_id = %case.id,
                best_score = best.score,
                auto_assign = request.auto_assign,
                "returning ranked suggestions"
            );
            return Ok(MatchOutcome::Suggested { candidates });
        }

        let assignment = self.commit_assignment(
            &case.id,
            &best.lawyer_id,
            Some(best.score),
            AssignmentOrigin::Automatic,
        )?;

        Ok(MatchOutcome::Assigned {
            assignment,
            candidates,
        })
    }

    /// Commits a coordinator's choice, typically one of the suggested candidates.
    pub fn assign(
        &self,
        case_id: &CaseId,
        lawyer_id: &LawyerId,
    ) -> Result<Assignment, AssignmentError> {
        let case = self.get_case(case_id)?;
        ensure_pending(&case)?;

        if case.rejected_by.contains(lawyer_id) {
            return Err(AssignmentError::InvalidState {
                case_id: case.id.clone(),
                reason: format!("lawyer {lawyer_id} already rejected this case"),
            });
        }

        let pool = self.repository.candidate_pool()?;
        let lawyer = pool
            .iter()
            .find(|lawyer| &lawyer.id == lawyer_id)
            .ok_or_else(|| AssignmentError::LawyerNotFound(lawyer_id.clone()))?;

        let now = self.clock.now();
        AvailabilityFilter::new(now, self.config.office_hours_offset)
            .check(lawyer)
            .map_err(|exclusion| AssignmentError::InvalidState {
                case_id: case.id.clone(),
                reason: format!("lawyer {lawyer_id} is {}", exclusion.label()),
            })?;

        let score = self.calculator.score(&case, lawyer, now).score;
        self.commit_assignment(&case.id, lawyer_id, Some(score), AssignmentOrigin::Manual)
    }

    /// Records that the assigned lawyer took the case.
    pub fn accept(&self, case_id: &CaseId, lawyer_id: &LawyerId) -> Result<Case, AssignmentError> {
        let case = self.get_case(case_id)?;
        ensure_assigned_to(&case, lawyer_id)?;
        ensure_status(&case, CaseStatus::Assigned, "accepted")?;

        let now = self.clock.now();
        let accepted = self
            .repository
            .transaction(|tx| {
                let mut case = tx.case(case_id)?;
                if case.status != CaseStatus::Assigned || !case.is_assigned_to(lawyer_id) {
                    return Err(RepositoryError::Conflict);
                }
                tx.record_acceptance(lawyer_id)?;
                case.status = CaseStatus::Accepted;
                tx.update_case(&case)?;
                tx.append_event(event(
                    &case.id,
                    lawyer_id,
                    AssignmentEventKind::Accepted,
                    now,
                    BTreeMap::new(),
                ))?;
                Ok(case)
            })
            .map_err(AssignmentError::TransactionFailure)?;

        info!(case_id = %accepted.id, %lawyer_id, "assignment accepted");
        Ok(accepted)
    }

    /// Applies a rejection and re-runs the pipeline without the rejecting lawyers.
    ///
    /// The rejection is committed even when no replacement is found; in that case
    /// the pipeline error is returned and the case stays pending.
    pub fn reject(
        &self,
        case_id: &CaseId,
        lawyer_id: &LawyerId,
        reason: Option<String>,
    ) -> Result<Reassignment, AssignmentError> {
        let case = self.get_case(case_id)?;
        ensure_assigned_to(&case, lawyer_id)?;
        ensure_status(&case, CaseStatus::Assigned, "rejected")?;

        let now = self.clock.now();
        let max_attempts = self.config.max_reassignment_attempts;
        let (attempt, exhausted) = self
            .repository
            .transaction(|tx| {
                let mut case = tx.case(case_id)?;
                if case.status != CaseStatus::Assigned || !case.is_assigned_to(lawyer_id) {
                    return Err(RepositoryError::Conflict);
                }

                tx.record_rejection(lawyer_id, now)?;
                let attempt = case.release(lawyer_id.clone());
                let exhausted = attempt > max_attempts;
                if exhausted {
                    case.status = CaseStatus::Escalated;
                }
                tx.update_case(&case)?;

                let mut metadata = BTreeMap::new();
                metadata.insert("attempt".to_string(), attempt.to_string());
                if let Some(reason) = &reason {
                    metadata.insert("reason".to_string(), reason.clone());
                }
                tx.append_event(event(
                    &case.id,
                    lawyer_id,
                    AssignmentEventKind::Rejected,
                    now,
                    metadata,
                ))?;

                if exhausted {
                    let mut metadata = BTreeMap::new();
                    metadata.insert("max_attempts".to_string(), max_attempts.to_string());
                    tx.append_event(event(
                        &case.id,
                        lawyer_id,
                        AssignmentEventKind::ReassignmentExhausted,
                        now,
                        metadata,
                    ))?;
                }

                Ok((attempt, exhausted))
            })
            .map_err(AssignmentError::TransactionFailure)?;

        info!(%case_id, %lawyer_id, attempt, "assignment rejected");

        if exhausted {
            warn!(%case_id, attempt, max_attempts, "reassignment attempts exhausted");
            return Err(AssignmentError::ReassignmentExhausted {
                case_id: case_id.clone(),
                attempts: attempt,
            });
        }

        // Fresh reads; nothing from the rejection transaction is reused.
        let case = self.get_case(case_id)?;
        let pool = self.repository.candidate_pool()?;
        let policy = self.reassignment_policy();
        let candidates = self.rank_candidates(&case, &pool, &policy, self.clock.now())?;

        // The relaxed policy auto-commits at its own minimum, so every ranked candidate qualifies.
        let picks: Vec<(LawyerId, f64)> = candidates
            .iter()
            .map(|candidate| (candidate.lawyer_id.clone(), candidate.score))
            .collect();

        for (candidate_id, score) in picks {
            match self.commit_assignment(
                case_id,
                &candidate_id,
                Some(score),
                AssignmentOrigin::Reassignment { attempt },
            ) {
                Ok(assignment) => {
                    return Ok(Reassignment {
                        rejected_by: lawyer_id.clone(),
                        attempt,
                        assignment,
                        candidates,
                    })
                }
                Err(AssignmentError::TransactionFailure(RepositoryError::CapacityExhausted(
                    taken,
                ))) => {
                    debug!(%case_id, lawyer_id = %taken, "candidate filled up, trying next");
                }
                Err(other) => return Err(other),
            }
        }

        // The rejection is already committed; the case waits in pending for `match_case`.
        warn!(%case_id, attempt, "every reassignment candidate filled up");
        Err(AssignmentError::NoAvailableCandidates)
    }

    fn commit_assignment(
        &self,
        case_id: &CaseId,
        lawyer_id: &LawyerId,
        score: Option<f64>,
        origin: AssignmentOrigin,
    ) -> Result<Assignment, AssignmentError> {
        let now = self.clock.now();
        let (case, lawyer) = self
            .repository
            .transaction(|tx| {
                let mut case = tx.case(case_id)?;
                if case.status != CaseStatus::Pending {
                    return Err(RepositoryError::Conflict);
                }

                let lawyer = tx.reserve_capacity(lawyer_id)?;
                case.assign(lawyer_id.clone(), now);
                tx.update_case(&case)?;

                let mut metadata = BTreeMap::new();
                metadata.insert("origin".to_string(), origin.label().to_string());
                if let Some(score) = score {
                    metadata.insert("score".to_string(), format!("{score:.2}"));
                }
                if let AssignmentOrigin::Reassignment { attempt } = origin {
                    metadata.insert("attempt".to_string(), attempt.to_string());
                }
                tx.append_event(event(
                    &case.id,
                    lawyer_id,
                    AssignmentEventKind::Assigned,
                    now,
                    metadata,
                ))?;

                Ok((case, lawyer))
            })
            .map_err(AssignmentError::TransactionFailure)?;

        info!(
            case_id = %case.id,
            lawyer_id = %lawyer.id,
            score = ?score,
            origin = origin.label(),
            active_cases = lawyer.active_cases,
            "case assigned"
        );

        if let Err(error) = self.notifier.notify_assigned(&case, &lawyer) {
            warn!(
                case_id = %case.id,
                lawyer_id = %lawyer.id,
                %error,
                "assignment notification failed"
            );
        }

        Ok(Assignment {
            lawyer_id: lawyer.id.clone(),
            lawyer_name: lawyer.name.clone(),
            score,
            assigned_at: now,
            case,
        })
    }
}

fn event(
    case_id: &CaseId,
    lawyer_id: &LawyerId,
    kind: AssignmentEventKind,
    at: DateTime<Utc>,
    metadata: BTreeMap<String, String>,
) -> AssignmentEvent {
    AssignmentEvent {
        case_id: case_id.clone(),
        lawyer_id: lawyer_id.clone(),
        kind,
        at,
        metadata,
    }
}

fn ensure_pending(case: &Case) -> Result<(), AssignmentError> {
    if case.status == CaseStatus::Pending {
        return Ok(());
    }
    Err(AssignmentError::InvalidState {
        case_id: case.id.clone(),
        reason: format!("case is {}, expected pending", case.status.label()),
    })
}

fn ensure_status(
    case: &Case,
    expected: CaseStatus,
    action: &str,
) -> Result<(), AssignmentError> {
    if case.status == expected {
        return Ok(());
    }
    Err(AssignmentError::InvalidState {
        case_id: case.id.clone(),
        reason: format!("case is {} and can no longer be {action}", case.status.label()),
    })
}

fn ensure_assigned_to(case: &Case, lawyer_id: &LawyerId) -> Result<(), AssignmentError> {
    if case.is_assigned_to(lawyer_id) {
        return Ok(());
    }
    Err(AssignmentError::InvalidState {
        case_id: case.id.clone(),
        reason: format!("case is not assigned to lawyer {lawyer_id}"),
    })
}

fn describe_best(best: &Option<f64>) -> String {
    match best {
        Some(score) => format!("best candidate scored {score:.2}"),
        None => "no candidates scored".to_string(),
    }
}

/// Error raised by the assignment service.
#[derive(Debug, thiserror::Error)]
pub enum AssignmentError {
    #[error("no available candidates for this case")]
    NoAvailableCandidates,
    #[error("no candidate reached the minimum score of {min_score:.2} ({})", describe_best(.best_score))]
    InsufficientScore {
        best_score: Option<f64>,
        min_score: f64,
    },
    #[error("case {case_id} was rejected {attempts} times; reassignment exhausted")]
    ReassignmentExhausted { case_id: CaseId, attempts: u32 },
    #[error("assignment transaction failed: {0}")]
    TransactionFailure(#[source] RepositoryError),
    #[error("case {0} not found")]
    CaseNotFound(CaseId),
    #[error("lawyer {0} not found")]
    LawyerNotFound(LawyerId),
    #[error("case {case_id}: {reason}")]
    InvalidState { case_id: CaseId, reason: String },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl AssignmentError {
    /// Only failed commits are safe to retry; nothing partial is left behind.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AssignmentError::TransactionFailure(_))
    }
}
