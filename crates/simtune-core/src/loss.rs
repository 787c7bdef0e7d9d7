//! Cosine-embedding similarity loss.
//!
//! For each pair `i` the cosine similarity `cos_i` between `a[i]` and `b[i]`
//! is compared with the label:
//!
//! - [`LossVariant::Margin`]: `1 - cos_i` when the pair is similar,
//!   `max(0, cos_i - margin)` when it is dissimilar.
//! - [`LossVariant::TargetCosine`]: `(cos_i - label_i)^2`.
//!
//! Contributions are reduced by mean (default) or sum. Zero-norm embeddings
//! are absorbed by `eps`; a cosine that is still undefined (NaN or infinite
//! input) is reported as [`LossError::NumericInstability`].

use serde::{Deserialize, Serialize};
use simtune_settings::types::{LossSettings, LossVariantKind};

pub use simtune_settings::types::{LabelDomainKind as LabelDomain, ReductionKind as Reduction};

use crate::errors::{LossError, Result};
use crate::normalize::cosine_similarity;

/// Default epsilon added to squared norms.
pub const DEFAULT_EPS: f32 = 1e-12;

/// Loss variant with its parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum LossVariant {
    /// Margin-based cosine embedding loss.
    Margin {
        /// Cosine similarity above which dissimilar pairs are penalized.
        margin: f32,
    },
    /// Squared distance between cosine similarity and the label.
    TargetCosine,
}

impl Default for LossVariant {
    fn default() -> Self {
        Self::Margin { margin: 0.0 }
    }
}

/// Stateless pairwise cosine-embedding loss.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CosineEmbeddingLoss {
    variant: LossVariant,
    domain: LabelDomain,
    reduction: Reduction,
    eps: f32,
}

impl Default for CosineEmbeddingLoss {
    fn default() -> Self {
        Self {
            variant: LossVariant::default(),
            domain: LabelDomain::Signed,
            reduction: Reduction::Mean,
            eps: DEFAULT_EPS,
        }
    }
}

impl CosineEmbeddingLoss {
    /// Create a loss with the given variant and label domain.
    ///
    /// Fails if a margin lies outside `[-1, 1]`.
    pub fn new(variant: LossVariant, domain: LabelDomain) -> Result<Self> {
        if let LossVariant::Margin { margin } = variant {
            if !margin.is_finite() || !(-1.0..=1.0).contains(&margin) {
                return Err(LossError::InvalidInput(format!(
                    "margin must lie in [-1, 1], got {margin}"
                )));
            }
        }
        Ok(Self {
            variant,
            domain,
            ..Self::default()
        })
    }

    /// Margin loss over signed `{-1, +1}` labels.
    pub fn with_margin(margin: f32) -> Result<Self> {
        Self::new(LossVariant::Margin { margin }, LabelDomain::Signed)
    }

    /// Build from loss settings.
    pub fn from_settings(s: &LossSettings) -> Result<Self> {
        let variant = match s.variant {
            LossVariantKind::Margin => LossVariant::Margin { margin: s.margin },
            LossVariantKind::TargetCosine => LossVariant::TargetCosine,
        };
        Self::new(variant, s.label_domain)?
            .with_eps(s.eps)
            .map(|l| l.with_reduction(s.reduction))
    }

    /// Replace the norm epsilon. Must be finite and positive.
    pub fn with_eps(mut self, eps: f32) -> Result<Self> {
        if !eps.is_finite() || eps <= 0.0 {
            return Err(LossError::InvalidInput(format!(
                "eps must be finite and positive, got {eps}"
            )));
        }
        self.eps = eps;
        Ok(self)
    }

    /// Replace the batch reduction.
    #[must_use]
    pub fn with_reduction(mut self, reduction: Reduction) -> Self {
        self.reduction = reduction;
        self
    }

    /// Loss variant.
    pub fn variant(&self) -> LossVariant {
        self.variant
    }

    /// Label domain.
    pub fn label_domain(&self) -> LabelDomain {
        self.domain
    }

    /// Label for a similar pair in this loss's domain.
    pub fn similar_label(&self) -> f32 {
        1.0
    }

    /// Label for a dissimilar pair in this loss's domain.
    pub fn dissimilar_label(&self) -> f32 {
        match self.domain {
            LabelDomain::Signed => -1.0,
            LabelDomain::Unit => 0.0,
        }
    }

    /// Reduced scalar loss over the batch.
    pub fn forward<A, B>(&self, a: &[A], b: &[B], labels: &[f32]) -> Result<f32>
    where
        A: AsRef<[f32]>,
        B: AsRef<[f32]>,
    {
        let contributions = self.per_pair(a, b, labels)?;
        let total: f64 = contributions.iter().map(|c| f64::from(*c)).sum();
        let reduced = match self.reduction {
            Reduction::Mean => total / contributions.len() as f64,
            Reduction::Sum => total,
        };
        if !reduced.is_finite() {
            return Err(LossError::NumericInstability(format!(
                "reduced loss is not finite: {reduced}"
            )));
        }
        Ok(reduced as f32)
    }

    /// Unreduced per-pair loss contributions.
    pub fn per_pair<A, B>(&self, a: &[A], b: &[B], labels: &[f32]) -> Result<Vec<f32>>
    where
        A: AsRef<[f32]>,
        B: AsRef<[f32]>,
    {
        if a.len() != b.len() || a.len() != labels.len() {
            return Err(LossError::InvalidInput(format!(
                "batch lengths differ: a={}, b={}, labels={}",
                a.len(),
                b.len(),
                labels.len()
            )));
        }
        if a.is_empty() {
            return Err(LossError::InvalidInput("empty batch".into()));
        }

        a.iter()
            .zip(b.iter())
            .zip(labels.iter())
            .enumerate()
            .map(|(i, ((ea, eb), &label))| self.pair_loss(i, ea.as_ref(), eb.as_ref(), label))
            .collect()
    }

    fn pair_loss(&self, i: usize, a: &[f32], b: &[f32], label: f32) -> Result<f32> {
        if a.len() != b.len() {
            return Err(LossError::InvalidInput(format!(
                "pair {i}: dimension mismatch ({} vs {})",
                a.len(),
                b.len()
            )));
        }
        if a.is_empty() {
            return Err(LossError::InvalidInput(format!("pair {i}: empty embedding")));
        }
        self.check_label(i, label)?;

        let cos = cosine_similarity(a, b, self.eps);
        if !cos.is_finite() {
            return Err(LossError::NumericInstability(format!(
                "pair {i}: cosine similarity is undefined ({cos})"
            )));
        }
        let cos = cos.clamp(-1.0, 1.0);

        let loss = match self.variant {
            LossVariant::Margin { margin } => {
                if label > 0.5 {
                    1.0 - cos
                } else {
                    (cos - f64::from(margin)).max(0.0)
                }
            }
            LossVariant::TargetCosine => {
                let diff = cos - f64::from(label);
                diff * diff
            }
        };
        Ok(loss as f32)
    }

    fn check_label(&self, i: usize, label: f32) -> Result<()> {
        let valid = match (self.domain, self.variant) {
            (LabelDomain::Signed, _) => label == 1.0 || label == -1.0,
            (LabelDomain::Unit, LossVariant::Margin { .. }) => label == 0.0 || label == 1.0,
            (LabelDomain::Unit, LossVariant::TargetCosine) => (0.0..=1.0).contains(&label),
        };
        if valid {
            Ok(())
        } else {
            Err(LossError::InvalidInput(format!(
                "pair {i}: label {label} outside {:?} domain",
                self.domain
            )))
        }
    }
}
