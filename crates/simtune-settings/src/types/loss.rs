//! Similarity loss settings.

use serde::{Deserialize, Serialize};

/// Which cosine loss to minimize.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LossVariantKind {
    /// `1 - cos` for similar pairs, `max(0, cos - margin)` for dissimilar pairs.
    #[default]
    Margin,
    /// Squared error between `cos` and the label.
    TargetCosine,
}

/// Domain labels are drawn from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LabelDomainKind {
    /// Exactly `-1` or `+1`.
    #[default]
    Signed,
    /// Any value in `[0, 1]`.
    Unit,
}

/// How per-pair contributions are combined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReductionKind {
    /// Arithmetic mean over the batch.
    #[default]
    Mean,
    /// Sum over the batch.
    Sum,
}

/// Loss configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LossSettings {
    /// Loss variant.
    pub variant: LossVariantKind,
    /// Margin for dissimilar pairs (margin variant only), in `[-1, 1]`.
    pub margin: f32,
    /// Added to squared norms before the cosine division.
    pub eps: f32,
    /// Label domain.
    pub label_domain: LabelDomainKind,
    /// Batch reduction.
    pub reduction: ReductionKind,
}

impl Default for LossSettings {
    fn default() -> Self {
        Self {
            variant: LossVariantKind::Margin,
            margin: 0.0,
            eps: 1e-12,
            label_domain: LabelDomainKind::Signed,
            reduction: ReductionKind::Mean,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_serializes_camel_case() {
        let v = serde_json::to_value(LossVariantKind::TargetCosine).unwrap();
        assert_eq!(v, "targetCosine");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let s: LossSettings = serde_json::from_str(r#"{"margin": 0.5}"#).unwrap();
        assert_eq!(s.margin, 0.5);
        assert_eq!(s.variant, LossVariantKind::Margin);
        assert_eq!(s.label_domain, LabelDomainKind::Signed);
        assert_eq!(s.reduction, ReductionKind::Mean);
    }

    #[test]
    fn unknown_variant_rejected() {
        let r = serde_json::from_str::<LossSettings>(r#"{"variant": "hinge"}"#);
        assert!(r.is_err());
    }
}
