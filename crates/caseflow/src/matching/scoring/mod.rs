mod rules;
pub mod weights;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Case, Lawyer, LawyerId};
use weights::WEIGHTS;

/// Factors that make up the composite match score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreFactor {
    Jurisdiction,
    Workload,
    Specialization,
    Performance,
    Experience,
    RejectionPenalty,
}

/// Discrete contribution to a match, kept so coordinators can audit a ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub factor: ScoreFactor,
    /// Raw subscore in 0-100, or the penalty in points.
    pub score: f64,
    pub weight: f64,
}

/// Scored candidate for one case. Built per call and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub lawyer_id: LawyerId,
    pub lawyer_name: String,
    pub score: f64,
    pub reasons: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub components: Vec<ScoreComponent>,
}

impl MatchResult {
    pub fn component(&self, factor: ScoreFactor) -> Option<f64> {
        self.components
            .iter()
            .find(|component| component.factor == factor)
            .map(|component| component.score)
    }
}

/// Stateless calculator; the same case, lawyer, and instant always give the same result.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreCalculator;

impl ScoreCalculator {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, case: &Case, lawyer: &Lawyer, now: DateTime<Utc>) -> MatchResult {
        let jurisdiction = rules::jurisdiction_score(case, lawyer);
        let workload = rules::workload_score(lawyer);
        let specialization = rules::specialization_score(case, lawyer);
        let performance = rules::performance_score(&lawyer.performance);
        let experience = rules::experience_score(case.complexity, lawyer.years_of_experience);
        let penalty = rules::rejection_penalty(&lawyer.performance, now);

        let weighted = jurisdiction * WEIGHTS.jurisdiction
            + workload * WEIGHTS.workload
            + specialization * WEIGHTS.specialization
            + performance * WEIGHTS.performance
            + experience * WEIGHTS.experience;
        let score = round_to_cents((weighted - penalty).clamp(0.0, 100.0));

        let mut reasons = Vec::new();
        let mut warnings = Vec::new();

        if jurisdiction >= 100.0 {
            reasons.push(format!("Covers {}", case.jurisdiction.describe()));
        } else if jurisdiction >= 70.0 {
            reasons.push(format!(
                "Practices in {} (partial jurisdiction match)",
                case.jurisdiction.province
            ));
        } else {
            warnings.push(format!(
                "No jurisdiction coverage for {}",
                case.jurisdiction.describe()
            ));
        }

        let occupancy = lawyer.occupancy();
        let load = format!("{}/{}", lawyer.active_cases, lawyer.max_capacity);
        if occupancy < 0.5 {
            reasons.push(format!("Low workload ({load} active cases)"));
        } else if occupancy < 0.8 {
            reasons.push(format!("Moderate workload ({load} active cases)"));
        } else {
            warnings.push(format!("High workload ({load} active cases)"));
        }

        if specialization >= 100.0 {
            reasons.push(format!(
                "Specialist in {} with required certifications",
                case.claim_type.label()
            ));
        } else if specialization >= 50.0 {
            reasons.push(format!("Handles {} claims", case.claim_type.label()));
        } else {
            warnings.push(format!("No {} specialization", case.claim_type.label()));
        }

        let acceptance = lawyer.performance.acceptance_rate();
        if acceptance >= 80.0 {
            reasons.push(format!("High acceptance rate ({acceptance:.0}%)"));
        } else if acceptance < 50.0 {
            warnings.push(format!("Low acceptance rate ({acceptance:.0}%)"));
        }

        if penalty > 0.0 {
            warnings.push(format!(
                "Recent rejection penalty (-{} points)",
                penalty.round() as i64
            ));
        }

        let components = vec![
            ScoreComponent {
                factor: ScoreFactor::Jurisdiction,
                score: jurisdiction,
                weight: WEIGHTS.jurisdiction,
            },
            ScoreComponent {
                factor: ScoreFactor::Workload,
                score: workload,
                weight: WEIGHTS.workload,
            },
            ScoreComponent {
                factor: ScoreFactor::Specialization,
                score: specialization,
                weight: WEIGHTS.specialization,
            },
            ScoreComponent {
                factor: ScoreFactor::Performance,
                score: performance,
                weight: WEIGHTS.performance,
            },
            ScoreComponent {
                factor: ScoreFactor::Experience,
                score: experience,
                weight: WEIGHTS.experience,
            },
            ScoreComponent {
                factor: ScoreFactor::RejectionPenalty,
                score: penalty,
                weight: 1.0,
            },
        ];

        MatchResult {
            lawyer_id: lawyer.id.clone(),
            lawyer_name: lawyer.name.clone(),
            score,
            reasons,
            warnings,
            components,
        }
    }

    pub fn score_all<'a, I>(&self, case: &Case, lawyers: I, now: DateTime<Utc>) -> Vec<MatchResult>
    where
        I: IntoIterator<Item = &'a Lawyer>,
    {
        lawyers
            .into_iter()
            .map(|lawyer| self.score(case, lawyer, now))
            .collect()
    }
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
pub(crate) use rules::{
    experience_score, jurisdiction_score, performance_score, rejection_penalty, response_score,
    specialization_score, workload_score,
};
