use chrono::{DateTime, Utc};

use super::super::domain::{Case, ComplexityTier, Lawyer, PerformanceRecord};
use super::weights::{
    CERTIFICATIONS_COMPLETE, CERTIFICATIONS_PARTIAL, HIGH_REJECTION_RATIO,
    JURISDICTION_CITY_MATCH, JURISDICTION_NATIONAL_COURT, JURISDICTION_PROVINCE_MATCH,
    PENALTY_BASE, PENALTY_HIGH_REJECTION, PENALTY_WINDOW_DAYS, RESPONSE_FULL_SCORE_HOURS,
    RESPONSE_ZERO_SCORE_HOURS, SPECIALIZATION_MATCH,
};

fn same_place(left: &str, right: &str) -> bool {
    left.trim().eq_ignore_ascii_case(right.trim())
}

/// The first coverage entry on the case's province decides; entries are not combined.
pub(crate) fn jurisdiction_score(case: &Case, lawyer: &Lawyer) -> f64 {
    let wanted = &case.jurisdiction;

    if let Some(entry) = lawyer
        .coverage
        .iter()
        .find(|entry| same_place(&entry.province, &wanted.province))
    {
        let city_covered = wanted
            .city
            .as_deref()
            .map(|city| entry.cities.iter().any(|covered| same_place(covered, city)))
            .unwrap_or(false);

        return if city_covered {
            JURISDICTION_CITY_MATCH
        } else {
            JURISDICTION_PROVINCE_MATCH
        };
    }

    let national_match = wanted.court_system.is_some_and(|case_court| {
        lawyer.coverage.iter().any(|entry| {
            entry
                .court_system
                .is_some_and(|court| court.compatible_with(case_court))
        })
    });

    if national_match {
        JURISDICTION_NATIONAL_COURT
    } else {
        0.0
    }
}

pub(crate) fn workload_score(lawyer: &Lawyer) -> f64 {
    match lawyer.occupancy() {
        o if o < 0.50 => 100.0,
        o if o < 0.75 => 75.0,
        o if o < 0.90 => 50.0,
        o if o < 1.0 => 20.0,
        _ => 0.0,
    }
}

pub(crate) fn specialization_score(case: &Case, lawyer: &Lawyer) -> f64 {
    let mut score = 0.0;
    if lawyer.specializations.contains(&case.claim_type) {
        score += SPECIALIZATION_MATCH;
    }

    let required = &case.required_certifications;
    let held = required
        .iter()
        .filter(|cert| lawyer.certifications.contains(cert.as_str()))
        .count();

    score += if required.is_empty() || held == required.len() {
        CERTIFICATIONS_COMPLETE
    } else if held > 0 {
        CERTIFICATIONS_PARTIAL
    } else {
        0.0
    };

    score.min(100.0)
}

pub(crate) fn response_score(avg_response_hours: f64) -> f64 {
    if avg_response_hours <= RESPONSE_FULL_SCORE_HOURS {
        100.0
    } else if avg_response_hours >= RESPONSE_ZERO_SCORE_HOURS {
        0.0
    } else {
        let span = RESPONSE_ZERO_SCORE_HOURS - RESPONSE_FULL_SCORE_HOURS;
        100.0 * (RESPONSE_ZERO_SCORE_HOURS - avg_response_hours) / span
    }
}

pub(crate) fn performance_score(record: &PerformanceRecord) -> f64 {
    let acceptance = record.acceptance_rate().clamp(0.0, 100.0);
    let success = record.success_rate.clamp(0.0, 100.0);
    acceptance * 0.4 + success * 0.4 + response_score(record.avg_response_hours) * 0.2
}

pub(crate) fn experience_score(complexity: ComplexityTier, years: u32) -> f64 {
    match complexity {
        ComplexityTier::Low => {
            if years >= 1 {
                100.0
            } else {
                50.0
            }
        }
        ComplexityTier::Medium => match years {
            5.. => 100.0,
            3..=4 => 80.0,
            _ => 50.0,
        },
        ComplexityTier::High => match years {
            10.. => 100.0,
            7..=9 => 80.0,
            5..=6 => 60.0,
            _ => 30.0,
        },
        ComplexityTier::Unrecognized => 70.0,
    }
}

/// Penalty for a recent rejection, decaying linearly to zero over the window.
pub(crate) fn rejection_penalty(record: &PerformanceRecord, now: DateTime<Utc>) -> f64 {
    let Some(last) = record.last_rejection_at else {
        return 0.0;
    };
    if record.assigned == 0 {
        return 0.0;
    }

    let days_since = (now - last).num_days().clamp(0, PENALTY_WINDOW_DAYS);
    if days_since >= PENALTY_WINDOW_DAYS {
        return 0.0;
    }

    let mut penalty = PENALTY_BASE;
    if record.rejection_ratio() > HIGH_REJECTION_RATIO {
        penalty += PENALTY_HIGH_REJECTION;
    }

    let window = PENALTY_WINDOW_DAYS as f64;
    penalty * (window - days_since as f64) / window
}
