//! Claim Review Domain
//!
//! This crate implements the reconciliation and review-state engine behind the
//! fraud review dashboard: claims filed by policyholders, fraud analyses
//! written by an independent scoring pipeline, and the human disposition of
//! both.
//!
//! # Review Lifecycle
//!
//! ```text
//! Submission -> Under Review ──┬─> Approved / Rejected
//!     │                        └─> Pending Manual Review ─> Approved / Rejected
//!     └─ scoring failed ─> Pending Manual Review
//! ```
//!
//! # Components
//!
//! - [`scoring`]: normalizes heterogeneous sub-scores onto one percent scale
//! - [`risk`]: priority tiers and display colors
//! - [`reconcile`]: pairs analyses with claims without a reliable foreign key
//! - [`review`]: the disposition state machine
//! - [`guard`]: at most one in-flight status change per record
//! - [`projection`] and [`live`]: the dashboard view kept current by change feeds
//! - [`intake`] and [`services`]: submission and review orchestration

pub mod status;
pub mod claim;
pub mod analysis;
pub mod risk;
pub mod scoring;
pub mod reconcile;
pub mod record;
pub mod review;
pub mod guard;
pub mod ports;
pub mod projection;
pub mod live;
pub mod intake;
pub mod services;
pub mod adapters;
pub mod error;

pub use status::{Collection, RecordRef, ReviewStatus, StatusFilter};
pub use claim::Claim;
pub use analysis::{AiAction, FraudAnalysis, ScoreCard, ScoreScale};
pub use risk::{classify, color_for, ColorToken, RiskLevel, RiskTier};
pub use scoring::normalize;
pub use reconcile::{find_analysis, match_analysis, reconcile_all, AnalysisIndex, MatchStrategy};
pub use record::ReviewRecord;
pub use review::{ReviewAction, ReviewDecision, ReviewPolicy, ReviewUpdate};
pub use guard::{ActionGuard, InFlightPermit};
pub use ports::{ChangeBatch, DocumentChange, DocumentStore, ListQuery, ScoringPipeline, Subscription};
pub use projection::{DashboardView, LiveCollection, ReviewBoard};
pub use live::{LiveBoard, SharedBoard};
pub use intake::{ClaimIntakeService, ClaimSubmission, IntakeOutcome, PipelineResult};
pub use services::{ReviewOutcome, ReviewService};
pub use error::ClaimError;
