use serde::{Deserialize, Serialize};

// ============================================================================
// REGISTRO DE CLIENTE
// ============================================================================

/// Raw attributes collected by the form, before any encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub credit_score: f64,
    pub gender: String,
    pub age: u32,
    pub tenure: u32,
    pub balance: f64,
    pub num_of_products: u32,
    pub has_cr_card: u8,
    pub is_active_member: u8,
    pub estimated_salary: f64,
    pub geography: String,
}

// ============================================================================
// PREDICCION
// ============================================================================

/// Probabilities strictly above this value are reported as churn.
pub const CHURN_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    LikelyToChurn,
    NotLikelyToChurn,
}

impl Verdict {
    pub fn from_probability(probability: f64) -> Self {
        if probability > CHURN_THRESHOLD {
            Verdict::LikelyToChurn
        } else {
            Verdict::NotLikelyToChurn
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Verdict::LikelyToChurn => "The customer is likely to churn.",
            Verdict::NotLikelyToChurn => "The customer is not likely to churn.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub probability: f64,
    pub verdict: Verdict,
}

impl Prediction {
    pub fn new(probability: f64) -> Self {
        Self {
            probability,
            verdict: Verdict::from_probability(probability),
        }
    }

    /// Probability as shown to the user.
    pub fn display_probability(&self) -> String {
        format!("{:.2}", self.probability)
    }
}
