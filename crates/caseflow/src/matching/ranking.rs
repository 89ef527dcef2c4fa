use serde::{Deserialize, Serialize};

use super::scoring::MatchResult;

/// Thresholds for one pass of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankingPolicy {
    pub min_score: f64,
    pub top_n: usize,
    /// Score the top candidate needs before it is committed without a human.
    pub auto_assign_score: f64,
}

impl Default for RankingPolicy {
    fn default() -> Self {
        Self {
            min_score: 50.0,
            top_n: 1,
            auto_assign_score: 80.0,
        }
    }
}

impl RankingPolicy {
    pub fn qualifies_for_auto_assign(&self, result: &MatchResult) -> bool {
        result.score >= self.auto_assign_score
    }
}

/// Nobody cleared the minimum score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BelowThreshold {
    pub best_score: Option<f64>,
    pub min_score: f64,
}

/// Sorts by score descending, keeping pool order for equal scores.
pub fn rank(
    mut results: Vec<MatchResult>,
    policy: &RankingPolicy,
) -> Result<Vec<MatchResult>, BelowThreshold> {
    // `sort_by` is stable.
    results.sort_by(|left, right| right.score.total_cmp(&left.score));

    let best_score = results.first().map(|result| result.score);
    results.retain(|result| result.score >= policy.min_score);

    if results.is_empty() {
        return Err(BelowThreshold {
            best_score,
            min_score: policy.min_score,
        });
    }

    results.truncate(policy.top_n.max(1));
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::domain::LawyerId;

    fn result(id: &str, score: f64) -> MatchResult {
        MatchResult {
            lawyer_id: LawyerId(id.to_string()),
            lawyer_name: id.to_uppercase(),
            score,
            reasons: Vec::new(),
            warnings: Vec::new(),
            components: Vec::new(),
        }
    }

    fn ids(results: &[MatchResult]) -> Vec<&str> {
        results.iter().map(|r| r.lawyer_id.0.as_str()).collect()
    }

    #[test]
    fn sorts_descending_and_truncates() {
        let policy = RankingPolicy {
            top_n: 2,
            ..RankingPolicy::default()
        };
        let ranked = rank(
            vec![result("a", 61.0), result("b", 92.5), result("c", 77.0)],
            &policy,
        )
        .expect("candidates clear threshold");
        assert_eq!(ids(&ranked), vec!["b", "c"]);
    }

    #[test]
    fn ties_keep_pool_order() {
        let policy = RankingPolicy {
            top_n: 4,
            ..RankingPolicy::default()
        };
        let ranked = rank(
            vec![
                result("first", 70.0),
                result("second", 85.0),
                result("third", 70.0),
                result("fourth", 70.0),
            ],
            &policy,
        )
        .expect("ranked");
        assert_eq!(ids(&ranked), vec!["second", "first", "third", "fourth"]);
    }

    #[test]
    fn filters_candidates_below_minimum() {
        let policy = RankingPolicy {
            min_score: 60.0,
            top_n: 3,
            ..RankingPolicy::default()
        };
        let ranked = rank(
            vec![result("a", 59.99), result("b", 60.0), result("c", 45.0)],
            &policy,
        )
        .expect("one candidate clears");
        assert_eq!(ids(&ranked), vec!["b"]);
    }

    #[test]
    fn reports_best_score_when_nobody_qualifies() {
        let err = rank(
            vec![result("a", 32.0), result("b", 48.5)],
            &RankingPolicy::default(),
        )
        .expect_err("nobody clears 50");
        assert_eq!(err.best_score, Some(48.5));
        assert_eq!(err.min_score, 50.0);
    }

    #[test]
    fn auto_assign_threshold_is_inclusive() {
        let policy = RankingPolicy::default();
        assert!(policy.qualifies_for_auto_assign(&result("a", 80.0)));
        assert!(!policy.qualifies_for_auto_assign(&result("b", 79.99)));
    }
}
