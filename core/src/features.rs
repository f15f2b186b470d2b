//! Fixed column schema of the encoded feature vector.
//!
//! The scaler and the model were fit against one column order:
//! the nine base columns below, followed by the one-hot geography columns in
//! the encoder's fitted category order. Changing this order does not fail,
//! it silently corrupts predictions.

use crate::encoding::{LabelEncoder, OneHotEncoder};
use crate::error::PredictError;
use crate::types::CustomerRecord;

pub const BASE_COLUMNS: [&str; 9] = [
    "CreditScore",
    "Gender",
    "Age",
    "Tenure",
    "Balance",
    "NumOfProducts",
    "HasCrCard",
    "IsActiveMember",
    "EstimatedSalary",
];

/// Full column list for a given geography encoder.
pub fn column_names(geography: &OneHotEncoder) -> Vec<String> {
    BASE_COLUMNS
        .iter()
        .map(|name| name.to_string())
        .chain(geography.feature_names_out())
        .collect()
}

pub fn column_count(geography: &OneHotEncoder) -> usize {
    BASE_COLUMNS.len() + geography.width()
}

/// Encodes the categorical fields and concatenates everything in schema order.
pub fn assemble(
    record: &CustomerRecord,
    gender: &LabelEncoder,
    geography: &OneHotEncoder,
) -> Result<Vec<f64>, PredictError> {
    let gender_code = gender.transform("gender", &record.gender)?;
    let geography_columns = geography.transform("geography", &record.geography)?;

    let mut features = Vec::with_capacity(column_count(geography));
    features.extend_from_slice(&[
        record.credit_score,
        gender_code as f64,
        f64::from(record.age),
        f64::from(record.tenure),
        record.balance,
        f64::from(record.num_of_products),
        f64::from(record.has_cr_card),
        f64::from(record.is_active_member),
        record.estimated_salary,
    ]);
    features.extend(geography_columns);

    if features.iter().any(|value| !value.is_finite()) {
        return Err(PredictError::NonFinite { stage: "input" });
    }

    Ok(features)
}
