use crate::infra::{parse_claim_type, parse_timestamp, seed_directory, LoggingNotifier};
use caseflow::config::AppConfig;
use caseflow::error::AppError;
use caseflow::matching::{
    AssignmentService, Case, CaseId, CaseStatus, ClaimType, ComplexityTier, FixedClock,
    InMemoryAssignmentStore, Jurisdiction, MatchOutcome, MatchRequest, MatchResult, UrgencyTier,
};
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Claim type of the sample case (e.g. "wrongful dismissal", "unpaid_wages")
    #[arg(long, value_parser = parse_claim_type, default_value = "wrongful_dismissal")]
    pub(crate) claim_type: ClaimType,
    /// Province the claim is filed in
    #[arg(long, default_value = "Buenos Aires")]
    pub(crate) province: String,
    /// City the claim is filed in
    #[arg(long, default_value = "La Plata")]
    pub(crate) city: Option<String>,
    /// Evaluation instant (RFC 3339). Defaults to now.
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) at: Option<DateTime<Utc>>,
    /// How many ranked candidates to print
    #[arg(long, default_value_t = 3)]
    pub(crate) top: usize,
    /// Stop after the initial assignment instead of simulating a rejection
    #[arg(long)]
    pub(crate) skip_rejection: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        claim_type,
        province,
        city,
        at,
        top,
        skip_rejection,
    } = args;
    let now = at.unwrap_or_else(Utc::now);

    let store = Arc::new(InMemoryAssignmentStore::with_lawyers(seed_directory()));
    let service = AssignmentService::with_clock(
        store,
        Arc::new(LoggingNotifier),
        AppConfig::load()?.matching,
        Arc::new(FixedClock(now)),
    );

    let case = Case {
        id: CaseId("demo-001".to_string()),
        claim_type,
        jurisdiction: Jurisdiction {
            province,
            city,
            court_system: None,
        },
        estimated_amount: 3_200_000.0,
        monthly_salary: Some(850_000.0),
        complexity: ComplexityTier::Medium,
        urgency: UrgencyTier::High,
        required_certifications: Vec::new(),
        created_at: now - Duration::hours(2),
        status: CaseStatus::Pending,
        assigned_lawyer: None,
        assigned_at: None,
        reassignment_attempts: 0,
        rejected_by: BTreeSet::new(),
    };

    println!("Case assignment demo");
    let case = service.register_case(case)?;
    println!(
        "- Registered {} ({} claim, {})",
        case.id,
        case.claim_type.label(),
        case.jurisdiction.describe()
    );

    let suggestions = match service.match_case(
        &case.id,
        MatchRequest {
            auto_assign: false,
            top_n: Some(top),
        },
    ) {
        Ok(outcome) => outcome,
        Err(err) => {
            println!("  Matching failed: {err}");
            return Ok(());
        }
    };
    println!("\nRanked candidates");
    render_candidates(suggestions.candidates());

    let assignment = match service.match_case(
        &case.id,
        MatchRequest {
            auto_assign: true,
            top_n: None,
        },
    ) {
        Ok(MatchOutcome::Assigned { assignment, .. }) => assignment,
        Ok(MatchOutcome::Suggested { candidates }) => {
            let best = candidates.first().map(|c| c.score).unwrap_or_default();
            println!(
                "\nBest score {best:.2} is below the auto-assign threshold of {:.0}; a coordinator must choose.",
                service.config().auto_assign_score
            );
            return Ok(());
        }
        Err(err) => {
            println!("\nAuto assignment failed: {err}");
            return Ok(());
        }
    };
    println!(
        "\nAssigned to {} ({}) with score {:.2}",
        assignment.lawyer_name,
        assignment.lawyer_id,
        assignment.score.unwrap_or_default()
    );

    if skip_rejection {
        return Ok(());
    }

    println!("\nSimulating a rejection by {}", assignment.lawyer_name);
    match service.reject(
        &case.id,
        &assignment.lawyer_id,
        Some("conflict of interest".to_string()),
    ) {
        Ok(reassignment) => {
            println!(
                "- Attempt {}: reassigned to {} ({}) with score {:.2}",
                reassignment.attempt,
                reassignment.assignment.lawyer_name,
                reassignment.assignment.lawyer_id,
                reassignment.assignment.score.unwrap_or_default()
            );
            println!("  Candidates considered under the relaxed threshold:");
            render_candidates(&reassignment.candidates);
        }
        Err(err) => println!("- Reassignment did not complete: {err}"),
    }

    println!("\nEvent log");
    for event in service.events(&case.id)? {
        let details: Vec<String> = event
            .metadata
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        println!(
            "  - {} {:?} {} {}",
            event.at.format("%Y-%m-%d %H:%M"),
            event.kind,
            event.lawyer_id,
            details.join(" ")
        );
    }

    Ok(())
}

fn render_candidates(candidates: &[MatchResult]) {
    for (position, candidate) in candidates.iter().enumerate() {
        println!(
            "  {}. {} ({}) score {:.2}",
            position + 1,
            candidate.lawyer_name,
            candidate.lawyer_id,
            candidate.score
        );
        for reason in &candidate.reasons {
            println!("     + {reason}");
        }
        for warning in &candidate.warnings {
            println!("     ! {warning}");
        }
    }
}
