//! Acceptance gate for reviewed artifact versions.
//!
//! The gate is deliberately asymmetric: a single factual complaint always
//! forces revision, while a small number of stylistic complaints is
//! tolerated.

use crate::artifact::{Artifact, Complaint, ReviewVerdict, Severity, Verdict};
use crate::config::CurationConfig;

/// Acceptance policy derived from the workspace configuration.
#[derive(Debug, Clone, Copy)]
pub struct GatePolicy {
    pub max_stylistic_complaints: usize,
    pub treat_unknown_severity_as: Severity,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            max_stylistic_complaints: 2,
            treat_unknown_severity_as: Severity::Factual,
        }
    }
}

impl GatePolicy {
    pub fn from_config(config: &CurationConfig) -> Self {
        Self {
            max_stylistic_complaints: config.max_stylistic_complaints,
            treat_unknown_severity_as: Severity::from_code(
                &config.treat_unknown_severity_as,
                Severity::Factual,
            ),
        }
    }
}

pub struct ReviewGate;

impl ReviewGate {
    /// Evaluate one artifact version against the policy.
    ///
    /// Any factual complaint yields `Revise` regardless of count; otherwise
    /// the version is accepted iff the complaint total is within
    /// `max_stylistic_complaints`.
    pub fn evaluate(
        artifact: &Artifact,
        complaints: &[Complaint],
        policy: &GatePolicy,
    ) -> ReviewVerdict {
        let factual_count = complaints
            .iter()
            .filter(|c| {
                Severity::from_code(&c.severity, policy.treat_unknown_severity_as)
                    == Severity::Factual
            })
            .count();
        let stylistic_count = complaints.len() - factual_count;

        let verdict = if factual_count > 0 {
            Verdict::Revise
        } else if complaints.len() <= policy.max_stylistic_complaints {
            Verdict::Accepted
        } else {
            Verdict::Revise
        };

        tracing::debug!(
            name = %artifact.name,
            version = artifact.version,
            factual = factual_count,
            stylistic = stylistic_count,
            verdict = %verdict,
            "review gate"
        );

        ReviewVerdict {
            verdict,
            complaints: complaints.to_vec(),
            factual_count,
            stylistic_count,
        }
    }
}
