use serde::{Deserialize, Serialize};

use super::math::{relu, sigmoid};
use crate::error::{ArtifactError, PredictError};

const ARTIFACT: &str = "model";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Sigmoid,
    Tanh,
    Linear,
}

impl Activation {
    fn apply(self, z: f64) -> f64 {
        match self {
            Activation::Relu => relu(z),
            Activation::Sigmoid => sigmoid(z),
            Activation::Tanh => z.tanh(),
            Activation::Linear => z,
        }
    }
}

/// Fully connected layer. `kernel` is laid out `[input][unit]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseLayer {
    pub units: usize,
    pub activation: Activation,
    pub kernel: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

impl DenseLayer {
    fn forward(&self, input: &[f64]) -> Vec<f64> {
        let mut output = self.bias.clone();
        for (value, row) in input.iter().zip(self.kernel.iter()) {
            for (acc, weight) in output.iter_mut().zip(row.iter()) {
                *acc += value * weight;
            }
        }
        for acc in output.iter_mut() {
            *acc = self.activation.apply(*acc);
        }
        output
    }

    fn validate(&self, index: usize, input_width: usize) -> Result<(), ArtifactError> {
        if self.units == 0 {
            return Err(ArtifactError::invalid(
                ARTIFACT,
                format!("layer {} has no units", index),
            ));
        }
        if self.kernel.len() != input_width {
            return Err(ArtifactError::invalid(
                ARTIFACT,
                format!(
                    "layer {} kernel has {} rows, expected {}",
                    index,
                    self.kernel.len(),
                    input_width
                ),
            ));
        }
        if let Some(row) = self.kernel.iter().position(|row| row.len() != self.units) {
            return Err(ArtifactError::invalid(
                ARTIFACT,
                format!("layer {} kernel row {} is not {} wide", index, row, self.units),
            ));
        }
        if self.bias.len() != self.units {
            return Err(ArtifactError::invalid(
                ARTIFACT,
                format!(
                    "layer {} bias has {} values, expected {}",
                    index,
                    self.bias.len(),
                    self.units
                ),
            ));
        }
        let finite = self
            .kernel
            .iter()
            .flatten()
            .chain(self.bias.iter())
            .all(|value| value.is_finite());
        if !finite {
            return Err(ArtifactError::invalid(
                ARTIFACT,
                format!("layer {} has non-finite parameters", index),
            ));
        }
        Ok(())
    }
}

/// Pretrained binary classifier. The last layer is a single sigmoid unit, so
/// the forward pass yields a probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseNetwork {
    pub model_id: String,
    pub input_dim: usize,
    pub layers: Vec<DenseLayer>,
}

impl DenseNetwork {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    pub fn parameter_count(&self) -> usize {
        self.layers
            .iter()
            .map(|layer| layer.kernel.len() * layer.units + layer.bias.len())
            .sum()
    }

    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.input_dim == 0 {
            return Err(ArtifactError::invalid(ARTIFACT, "input_dim is zero"));
        }
        if self.layers.is_empty() {
            return Err(ArtifactError::invalid(ARTIFACT, "no layers"));
        }

        let mut width = self.input_dim;
        for (index, layer) in self.layers.iter().enumerate() {
            layer.validate(index, width)?;
            width = layer.units;
        }

        if let Some(last) = self.layers.last() {
            if last.units != 1 || last.activation != Activation::Sigmoid {
                return Err(ArtifactError::invalid(
                    ARTIFACT,
                    "output layer must be a single sigmoid unit",
                ));
            }
        }

        Ok(())
    }

    pub fn forward(&self, input: &[f64]) -> Result<f64, PredictError> {
        if input.len() != self.input_dim {
            return Err(PredictError::ShapeMismatch {
                stage: "model",
                expected: self.input_dim,
                got: input.len(),
            });
        }

        let mut activations = input.to_vec();
        for layer in &self.layers {
            activations = layer.forward(&activations);
        }

        match activations.first() {
            Some(output) if output.is_finite() => Ok(*output),
            Some(_) => Err(PredictError::NonFinite { stage: "model" }),
            None => Err(PredictError::ShapeMismatch {
                stage: "model output",
                expected: 1,
                got: 0,
            }),
        }
    }
}
