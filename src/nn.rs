//! Tiny fully-connected network over flat `Vec<f32>` weights.
//!
//! No ML framework: forward pass and batch iRPROP- backprop are written
//! out by hand. Symmetric-sigmoid activations keep outputs in (-1, 1);
//! training stops early once no output misses its target by more than
//! the bit-fail limit.

use std::fs;
use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An output counts as failed while it is further than this from its
/// target.
pub const BIT_FAIL_LIMIT: f32 = 0.1;

const STEEPNESS: f32 = 0.5;
const STEP_INCREASE: f32 = 1.2;
const STEP_DECREASE: f32 = 0.5;
const STEP_MIN: f32 = 1e-6;
const STEP_MAX: f32 = 50.0;
const STEP_INITIAL: f32 = 0.1;

fn activate(x: f32) -> f32 {
    (STEEPNESS * x).tanh()
}

fn derivative(fx: f32) -> f32 {
    STEEPNESS * (1.0 - fx * fx)
}

/// Training batch: one input vector and one target vector per example.
pub struct TrainSet {
    pub inputs: Vec<Vec<f32>>,
    pub targets: Vec<Vec<f32>>,
}

/// Feed-forward net with one weight matrix per connection layer,
/// stored output-major with the bias as the trailing column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TinyNet {
    layers: Vec<usize>,
    weights: Vec<Vec<f32>>,
}

impl TinyNet {
    /// Fresh net with weights drawn uniformly from [-0.1, 0.1].
    pub fn new(layers: &[usize]) -> Self {
        let mut rng = rand::thread_rng();
        let weights = layers
            .windows(2)
            .map(|pair| {
                (0..(pair[0] + 1) * pair[1])
                    .map(|_| rng.gen_range(-0.1..0.1))
                    .collect()
            })
            .collect();
        Self {
            layers: layers.to_vec(),
            weights,
        }
    }

    pub fn input_len(&self) -> usize {
        self.layers[0]
    }

    /// Forward pass. The input must be sized to the input layer.
    pub fn run(&self, input: &[f32]) -> Vec<f32> {
        debug_assert_eq!(input.len(), self.layers[0]);
        let mut activation = input.to_vec();
        for (l, weights) in self.weights.iter().enumerate() {
            activation = self.forward_layer(l, weights, &activation);
        }
        activation
    }

    fn forward_layer(&self, l: usize, weights: &[f32], input: &[f32]) -> Vec<f32> {
        let n_in = self.layers[l];
        let n_out = self.layers[l + 1];
        let mut out = vec![0.0; n_out];
        for (o, slot) in out.iter_mut().enumerate() {
            let row = &weights[o * (n_in + 1)..(o + 1) * (n_in + 1)];
            let mut sum = row[n_in];
            for (w, x) in row[..n_in].iter().zip(input) {
                sum += w * x;
            }
            *slot = activate(sum);
        }
        out
    }

    /// Count of outputs across the batch that miss their target by more
    /// than the bit-fail limit.
    pub fn bit_fail(&self, data: &TrainSet) -> usize {
        data.inputs
            .iter()
            .zip(&data.targets)
            .map(|(input, target)| {
                self.run(input)
                    .iter()
                    .zip(target)
                    .filter(|(out, want)| (*out - *want).abs() > BIT_FAIL_LIMIT)
                    .count()
            })
            .sum()
    }

    /// Batch-train with iRPROP- for up to `max_epochs`, stopping early
    /// at zero bit fails. Returns the remaining bit-fail count.
    pub fn train(&mut self, data: &TrainSet, max_epochs: usize) -> usize {
        let mut steps: Vec<Vec<f32>> = self
            .weights
            .iter()
            .map(|w| vec![STEP_INITIAL; w.len()])
            .collect();
        let mut prev_grads: Vec<Vec<f32>> =
            self.weights.iter().map(|w| vec![0.0; w.len()]).collect();

        for _ in 0..max_epochs {
            let (grads, bit_fail) = self.batch_gradient(data);
            if bit_fail == 0 {
                return 0;
            }
            for l in 0..self.weights.len() {
                for i in 0..self.weights[l].len() {
                    let grad = grads[l][i];
                    let signal = prev_grads[l][i] * grad;
                    if signal > 0.0 {
                        steps[l][i] = (steps[l][i] * STEP_INCREASE).min(STEP_MAX);
                        self.weights[l][i] -= grad.signum() * steps[l][i];
                        prev_grads[l][i] = grad;
                    } else if signal < 0.0 {
                        // Overshot a minimum: shrink the step, skip the
                        // update, and forget the gradient sign.
                        steps[l][i] = (steps[l][i] * STEP_DECREASE).max(STEP_MIN);
                        prev_grads[l][i] = 0.0;
                    } else {
                        // signum(0.0) is 1.0, so a dead gradient must
                        // not move the weight
                        if grad != 0.0 {
                            self.weights[l][i] -= grad.signum() * steps[l][i];
                        }
                        prev_grads[l][i] = grad;
                    }
                }
            }
        }
        self.bit_fail(data)
    }

    fn batch_gradient(&self, data: &TrainSet) -> (Vec<Vec<f32>>, usize) {
        let mut grads: Vec<Vec<f32>> = self.weights.iter().map(|w| vec![0.0; w.len()]).collect();
        let mut bit_fail = 0;

        for (input, target) in data.inputs.iter().zip(&data.targets) {
            // Forward, keeping every layer's activation for backprop.
            let mut acts: Vec<Vec<f32>> = vec![input.clone()];
            for (l, weights) in self.weights.iter().enumerate() {
                let next = self.forward_layer(l, weights, &acts[l]);
                acts.push(next);
            }

            let out = acts.last().map(|a| a.as_slice()).unwrap_or(&[]);
            bit_fail += out
                .iter()
                .zip(target)
                .filter(|(o, t)| (*o - *t).abs() > BIT_FAIL_LIMIT)
                .count();

            // Output deltas, then walk the layers backwards.
            let mut delta: Vec<f32> = out
                .iter()
                .zip(target)
                .map(|(o, t)| (o - t) * derivative(*o))
                .collect();

            for l in (0..self.weights.len()).rev() {
                let n_in = self.layers[l];
                let input_act = &acts[l];
                for (o, d) in delta.iter().enumerate() {
                    let base = o * (n_in + 1);
                    for i in 0..n_in {
                        grads[l][base + i] += d * input_act[i];
                    }
                    grads[l][base + n_in] += d;
                }
                if l > 0 {
                    let mut next_delta = vec![0.0; n_in];
                    for (i, slot) in next_delta.iter_mut().enumerate() {
                        let mut sum = 0.0;
                        for (o, d) in delta.iter().enumerate() {
                            sum += self.weights[l][o * (n_in + 1) + i] * d;
                        }
                        *slot = sum * derivative(input_act[i]);
                    }
                    delta = next_delta;
                }
            }
        }
        (grads, bit_fail)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }

    /// Up to `restarts` fresh nets, each trained for `epochs`. Returns
    /// the first one to reach zero bit fails, or the last attempt.
    pub fn train_with_restarts(
        layers: &[usize],
        data: &TrainSet,
        restarts: usize,
        epochs: usize,
    ) -> TinyNet {
        let mut net = TinyNet::new(layers);
        for attempt in 1..=restarts {
            let fails = net.train(data, epochs);
            if fails == 0 {
                break;
            }
            log::debug!("{fails} bit fails after attempt {attempt}/{restarts}");
            if attempt < restarts {
                net = TinyNet::new(layers);
            }
        }
        net
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|_| Error::MissingArtifact(path.into()))?;
        serde_json::from_str(&raw).map_err(|_| Error::MissingArtifact(path.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_data() -> TrainSet {
        // Two-input OR
        TrainSet {
            inputs: vec![
                vec![0.0, 0.0],
                vec![1.0, 0.0],
                vec![0.0, 1.0],
                vec![1.0, 1.0],
            ],
            targets: vec![vec![0.0], vec![1.0], vec![1.0], vec![1.0]],
        }
    }

    #[test]
    fn test_trains_to_zero_bit_fail() {
        let data = toy_data();
        let net = TinyNet::train_with_restarts(&[2, 10, 1], &data, 10, 1000);
        assert_eq!(net.bit_fail(&data), 0);
        assert!(net.run(&[1.0, 0.0])[0] > 0.8);
        assert!(net.run(&[0.0, 0.0])[0] < 0.2);
    }

    #[test]
    fn test_save_load_preserves_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toy.net");
        let data = toy_data();
        let net = TinyNet::train_with_restarts(&[2, 10, 1], &data, 10, 1000);
        net.save(&path).unwrap();
        let loaded = TinyNet::load(&path).unwrap();
        for input in &data.inputs {
            assert_eq!(net.run(input), loaded.run(input));
        }
    }

    #[test]
    fn test_missing_artifact() {
        let err = TinyNet::load(Path::new("/nonexistent/no.net")).unwrap_err();
        assert!(matches!(err, Error::MissingArtifact(_)));
    }
}
