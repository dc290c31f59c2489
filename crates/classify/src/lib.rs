//! Topic and problem classification over pre-trained linear models.
//!
//! Models are trained offline and exported to JSON (per-topic token weights
//! plus a bias). Loading happens once at worker start; prediction is a pure
//! function of the input text.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

pub const UNCLASSIFIED: &str = "unclassified";

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("failed to read model file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid model format: {0}")]
    Format(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Deserialize)]
struct TopicModel {
    name: String,
    /// Probability a post must clear to receive this label. Fixed at export
    /// time, never adjusted at runtime.
    threshold: f64,
    bias: f64,
    weights: HashMap<String, f64>,
}

#[derive(Debug, Deserialize)]
struct TopicModelFile {
    topics: Vec<TopicModel>,
}

/// Multi-label topic classifier: one independent linear estimator per topic
/// from a fixed closed label set.
pub struct TopicClassifier {
    topics: Vec<TopicModel>,
}

impl TopicClassifier {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClassifyError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ClassifyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let classifier = Self::from_json(&raw)?;
        info!(
            path = %path.display(),
            topics = classifier.topics.len(),
            "loaded topic model"
        );
        Ok(classifier)
    }

    pub fn from_json(raw: &str) -> Result<Self, ClassifyError> {
        let file: TopicModelFile = serde_json::from_str(raw)?;
        Ok(Self {
            topics: file.topics,
        })
    }

    /// Labels whose probability clears the per-topic threshold, or
    /// `["unclassified"]` when none does (including empty input).
    pub fn predict(&self, text: &str) -> Vec<String> {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return vec![UNCLASSIFIED.to_string()];
        }

        let mut labels = Vec::new();
        for topic in &self.topics {
            let score: f64 = topic.bias
                + tokens
                    .iter()
                    .filter_map(|token| topic.weights.get(token))
                    .sum::<f64>();
            if sigmoid(score) > topic.threshold {
                labels.push(topic.name.clone());
            }
        }

        if labels.is_empty() {
            labels.push(UNCLASSIFIED.to_string());
        }
        labels
    }
}

#[derive(Debug, Deserialize)]
struct ProblemModelFile {
    bias: f64,
    weights: HashMap<String, f64>,
    #[serde(default = "default_problem_threshold")]
    threshold: f64,
}

fn default_problem_threshold() -> f64 {
    0.5
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProblemPrediction {
    pub is_problem: bool,
    pub probability: f64,
    /// Distance from the decision boundary rescaled to [0, 1].
    pub confidence: f64,
}

impl Default for ProblemPrediction {
    fn default() -> Self {
        Self {
            is_problem: false,
            probability: 0.0,
            confidence: 0.0,
        }
    }
}

/// Binary problem / not-problem classifier.
pub struct ProblemClassifier {
    model: ProblemModelFile,
}

impl ProblemClassifier {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClassifyError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ClassifyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let classifier = Self::from_json(&raw)?;
        info!(path = %path.display(), "loaded problem model");
        Ok(classifier)
    }

    pub fn from_json(raw: &str) -> Result<Self, ClassifyError> {
        let model: ProblemModelFile = serde_json::from_str(raw)?;
        Ok(Self { model })
    }

    pub fn predict(&self, text: &str) -> ProblemPrediction {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return ProblemPrediction::default();
        }

        let score: f64 = self.model.bias
            + tokens
                .iter()
                .filter_map(|token| self.model.weights.get(token))
                .sum::<f64>();
        let probability = sigmoid(score);

        ProblemPrediction {
            is_problem: probability >= self.model.threshold,
            probability,
            confidence: (probability - 0.5).abs() * 2.0,
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
