use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Critical,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionScore {
    pub dimension: String,
    pub score: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    pub category: String,
    pub location: String,
    pub description: String,
    pub affected_concepts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ValidationRecord {
    pub id: String,
    pub task_id: String,
    pub roadmap_id: String,
    pub validation_round: i64,
    pub is_valid: bool,
    pub overall_score: f64,
    pub critical_count: i64,
    pub warning_count: i64,
    /// JSON-encoded `Vec<DimensionScore>`.
    pub dimension_scores: String,
    /// JSON-encoded `Vec<ValidationIssue>`.
    pub issues: String,
    /// JSON-encoded `Vec<String>`.
    pub improvement_suggestions: String,
    pub validation_summary: Option<String>,
    pub created_at: String,
}

impl ValidationRecord {
    pub fn issues_value(&self) -> Vec<ValidationIssue> {
        serde_json::from_str(&self.issues).unwrap_or_default()
    }

    pub fn dimension_scores_value(&self) -> Vec<DimensionScore> {
        serde_json::from_str(&self.dimension_scores).unwrap_or_default()
    }
}

/// Computes `overall_score = Σ(score_i × weight_i) − 10·critical − 5·warning`,
/// clamped to `[0, 100]` (spec §4.6 "Scoring contract").
pub fn compute_overall_score(
    dimension_scores: &[DimensionScore],
    critical_count: usize,
    warning_count: usize,
) -> f64 {
    let weighted: f64 = dimension_scores.iter().map(|d| d.score * d.weight).sum();
    let penalized = weighted - 10.0 * critical_count as f64 - 5.0 * warning_count as f64;
    penalized.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_clamps_to_zero_with_heavy_penalties() {
        let dims = vec![DimensionScore { dimension: "clarity".into(), score: 80.0, weight: 1.0 }];
        let score = compute_overall_score(&dims, 10, 0);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn score_clamps_to_hundred() {
        let dims = vec![DimensionScore { dimension: "clarity".into(), score: 120.0, weight: 1.0 }];
        let score = compute_overall_score(&dims, 0, 0);
        assert_eq!(score, 100.0);
    }

    #[test]
    fn score_applies_weighted_sum_and_penalties() {
        let dims = vec![
            DimensionScore { dimension: "clarity".into(), score: 80.0, weight: 0.5 },
            DimensionScore { dimension: "coverage".into(), score: 60.0, weight: 0.5 },
        ];
        let score = compute_overall_score(&dims, 1, 2);
        assert_eq!(score, 70.0 - 10.0 - 10.0);
    }
}
