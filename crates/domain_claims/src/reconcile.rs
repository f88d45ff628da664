//! Claim/analysis reconciliation
//!
//! Analyses are written by a separate pipeline and carry no guaranteed foreign
//! key to their claim. The association is recovered here with an ordered list
//! of heuristics; the first strategy that finds anything wins, and within a
//! strategy the first analysis in source order wins.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::analysis::FraudAnalysis;
use crate::claim::Claim;

/// Number of leading claim-id characters matched against analysis ids
pub const CLAIM_ID_PREFIX_LEN: usize = 6;

/// Heuristic that produced an association
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// `analysis.policy_number == claim.policy_number`
    PolicyNumber,
    /// `analysis.claim_reference == claim.policy_number`
    ClaimReference,
    /// `analysis.analysis_id` contains the claim id prefix
    AnalysisIdPrefix,
}

impl MatchStrategy {
    /// Strategies in the order they are tried
    pub const ORDER: [MatchStrategy; 3] = [
        MatchStrategy::PolicyNumber,
        MatchStrategy::ClaimReference,
        MatchStrategy::AnalysisIdPrefix,
    ];

    fn accepts(&self, claim: &Claim, analysis: &FraudAnalysis) -> bool {
        match self {
            MatchStrategy::PolicyNumber => {
                matches!((claim.policy_key(), analysis.policy_key()), (Some(ours), Some(theirs)) if ours == theirs)
            }
            MatchStrategy::ClaimReference => {
                matches!((claim.policy_key(), analysis.claim_reference_key()), (Some(ours), Some(theirs)) if ours == theirs)
            }
            MatchStrategy::AnalysisIdPrefix => {
                let prefix = claim.id.prefix(CLAIM_ID_PREFIX_LEN);
                !prefix.is_empty() && analysis.analysis_id.as_str().contains(prefix)
            }
        }
    }
}

/// A claim's reconciled analysis and the strategy that found it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match<'a> {
    pub analysis: &'a FraudAnalysis,
    pub strategy: MatchStrategy,
}

/// Finds the analysis belonging to `claim`, or `None`
pub fn find_analysis<'a>(claim: &Claim, analyses: &'a [FraudAnalysis]) -> Option<&'a FraudAnalysis> {
    match_analysis(claim, analyses).map(|m| m.analysis)
}

/// Like [`find_analysis`], also reporting which strategy matched
pub fn match_analysis<'a>(claim: &Claim, analyses: &'a [FraudAnalysis]) -> Option<Match<'a>> {
    MatchStrategy::ORDER.iter().find_map(|strategy| {
        analyses
            .iter()
            .find(|analysis| strategy.accepts(claim, analysis))
            .map(|analysis| Match {
                analysis,
                strategy: *strategy,
            })
    })
}

/// Lookup index over an analysis collection
///
/// Equality strategies are answered from hash maps holding the first
/// occurrence of each key; the id-prefix strategy falls back to a scan. The
/// answers are identical to [`match_analysis`] over the same slice.
pub struct AnalysisIndex<'a> {
    analyses: &'a [FraudAnalysis],
    by_policy: HashMap<&'a str, usize>,
    by_claim_reference: HashMap<&'a str, usize>,
}

impl<'a> AnalysisIndex<'a> {
    pub fn build(analyses: &'a [FraudAnalysis]) -> Self {
        let mut by_policy = HashMap::new();
        let mut by_claim_reference = HashMap::new();
        for (position, analysis) in analyses.iter().enumerate() {
            if let Some(key) = analysis.policy_key() {
                by_policy.entry(key).or_insert(position);
            }
            if let Some(key) = analysis.claim_reference_key() {
                by_claim_reference.entry(key).or_insert(position);
            }
        }
        Self {
            analyses,
            by_policy,
            by_claim_reference,
        }
    }

    pub fn lookup(&self, claim: &Claim) -> Option<Match<'a>> {
        let hit = |position: usize, strategy| Match {
            analysis: &self.analyses[position],
            strategy,
        };

        if let Some(policy) = claim.policy_key() {
            if let Some(&position) = self.by_policy.get(policy) {
                return Some(hit(position, MatchStrategy::PolicyNumber));
            }
            if let Some(&position) = self.by_claim_reference.get(policy) {
                return Some(hit(position, MatchStrategy::ClaimReference));
            }
        }

        self.analyses
            .iter()
            .find(|analysis| MatchStrategy::AnalysisIdPrefix.accepts(claim, analysis))
            .map(|analysis| Match {
                analysis,
                strategy: MatchStrategy::AnalysisIdPrefix,
            })
    }

    pub fn len(&self) -> usize {
        self.analyses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyses.is_empty()
    }
}

/// Reconciles every claim in order, returning one entry per claim
pub fn reconcile_all<'a, 'c>(
    claims: &'c [Claim],
    analyses: &'a [FraudAnalysis],
) -> Vec<(&'c Claim, Option<Match<'a>>)> {
    let index = AnalysisIndex::build(analyses);
    claims.iter().map(|claim| (claim, index.lookup(claim))).collect()
}
