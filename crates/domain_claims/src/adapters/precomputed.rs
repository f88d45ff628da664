//! Scoring pipeline adapter that returns a result computed elsewhere
//!
//! The HTTP surface receives the pipeline's verdict alongside the submission;
//! this adapter hands it to intake through the [`ScoringPipeline`] port so the
//! intake path is the same whichever way the verdict arrives.

use async_trait::async_trait;
use std::time::Duration;

use core_kernel::PortError;

use crate::intake::{ClaimSubmission, PipelineResult};
use crate::ports::ScoringPipeline;

#[derive(Debug, Clone)]
enum Verdict {
    Scored(PipelineResult),
    Failed(String),
}

/// A [`ScoringPipeline`] with a fixed answer
#[derive(Debug, Clone)]
pub struct PrecomputedScoring {
    verdict: Verdict,
    delay: Option<Duration>,
}

impl PrecomputedScoring {
    /// Answers with `result`
    pub fn scored(result: PipelineResult) -> Self {
        Self {
            verdict: Verdict::Scored(result),
            delay: None,
        }
    }

    /// Fails with `message`, as an unreachable pipeline would
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Failed(message.into()),
            delay: None,
        }
    }

    /// From an optional verdict; absent means the pipeline produced nothing
    pub fn from_option(result: Option<PipelineResult>) -> Self {
        match result {
            Some(result) => Self::scored(result),
            None => Self::failed("no scoring result was provided"),
        }
    }

    /// Answers only after `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl ScoringPipeline for PrecomputedScoring {
    async fn score(&self, _submission: &ClaimSubmission) -> Result<PipelineResult, PortError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.verdict {
            Verdict::Scored(result) => Ok(result.clone()),
            Verdict::Failed(message) => Err(PortError::ServiceUnavailable {
                service: format!("scoring pipeline ({})", message),
            }),
        }
    }
}
