/// Weight applied to each subscore before summing.
#[derive(Debug, Clone, Copy)]
pub struct Weights {
    pub jurisdiction: f64,
    pub workload: f64,
    pub specialization: f64,
    pub performance: f64,
    pub experience: f64,
}

impl Weights {
    pub fn sum(&self) -> f64 {
        self.jurisdiction + self.workload + self.specialization + self.performance + self.experience
    }
}

pub const WEIGHTS: Weights = Weights {
    jurisdiction: 0.35,
    workload: 0.25,
    specialization: 0.20,
    performance: 0.15,
    experience: 0.05,
};

pub(crate) const JURISDICTION_CITY_MATCH: f64 = 100.0;
pub(crate) const JURISDICTION_PROVINCE_MATCH: f64 = 90.0;
pub(crate) const JURISDICTION_NATIONAL_COURT: f64 = 80.0;

pub(crate) const SPECIALIZATION_MATCH: f64 = 70.0;
pub(crate) const CERTIFICATIONS_COMPLETE: f64 = 30.0;
pub(crate) const CERTIFICATIONS_PARTIAL: f64 = 15.0;

pub(crate) const RESPONSE_FULL_SCORE_HOURS: f64 = 4.0;
pub(crate) const RESPONSE_ZERO_SCORE_HOURS: f64 = 24.0;

pub(crate) const PENALTY_WINDOW_DAYS: i64 = 7;
pub(crate) const PENALTY_BASE: f64 = 5.0;
pub(crate) const PENALTY_HIGH_REJECTION: f64 = 10.0;
pub(crate) const HIGH_REJECTION_RATIO: f64 = 0.30;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one() {
        assert!((WEIGHTS.sum() - 1.0).abs() < 1e-9);
    }
}
