use crate::artifacts::InferenceContext;
use crate::error::PredictError;
use crate::features;
use crate::types::{CustomerRecord, Prediction};

/// Runs one customer record through the fitted pipeline:
/// encode, assemble, scale, forward pass, threshold.
pub fn predict(
    context: &InferenceContext,
    record: &CustomerRecord,
) -> Result<Prediction, PredictError> {
    let assembled = features::assemble(record, context.gender(), context.geography())?;
    score_features(context, &assembled)
}

/// Scales an already assembled vector and evaluates the model on it.
pub fn score_features(
    context: &InferenceContext,
    assembled: &[f64],
) -> Result<Prediction, PredictError> {
    let scaled = context.scaler().transform(assembled)?;
    let probability = context.model().forward(&scaled)?;
    let prediction = Prediction::new(probability);

    log::debug!(
        "[PREDICT] probability={:.4} verdict={:?}",
        prediction.probability,
        prediction.verdict
    );

    Ok(prediction)
}
