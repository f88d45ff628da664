//! Claim record
//!
//! A filed vehicle-insurance claim as held by the document store. Descriptive
//! fields are written once by intake; only the review fields change afterwards.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{ClaimId, SessionContext, UserId};
use crate::status::ReviewStatus;

/// Who filed the claim
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimantRef {
    pub uid: Option<UserId>,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl From<&SessionContext> for ClaimantRef {
    fn from(session: &SessionContext) -> Self {
        Self {
            uid: Some(session.uid.clone()),
            email: session.email.clone(),
            display_name: session.display_name.clone(),
        }
    }
}

/// Insured person details
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsuredDetails {
    pub age: Option<u32>,
    pub sex: Option<String>,
    pub education_level: Option<String>,
    pub occupation: Option<String>,
    pub hobbies: Option<String>,
    pub relationship: Option<String>,
    pub zip: Option<String>,
    pub months_as_customer: Option<u32>,
    pub capital_gains: Option<Decimal>,
    pub capital_loss: Option<Decimal>,
}

/// Terms of the policy the claim is filed against
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyDetails {
    pub bind_date: Option<NaiveDate>,
    /// State the policy was written in
    pub state: Option<String>,
    /// Combined single limit, e.g. `250/500`
    pub csl: Option<String>,
    #[serde(alias = "deductable")]
    pub deductible: Option<Decimal>,
    pub annual_premium: Option<Decimal>,
    pub umbrella_limit: Option<Decimal>,
}

/// Vehicle details
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleDetails {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
}

/// Incident details
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncidentDetails {
    pub date: Option<NaiveDate>,
    pub incident_type: Option<String>,
    pub collision_type: Option<String>,
    pub severity: Option<String>,
    pub authorities_contacted: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub location: Option<String>,
    pub hour_of_day: Option<u8>,
    pub vehicles_involved: Option<u32>,
    pub bodily_injuries: Option<u32>,
    pub witnesses: Option<u32>,
    pub property_damage: Option<String>,
    pub police_report_available: Option<String>,
}

/// Total and itemized claim amounts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimAmounts {
    pub total: Decimal,
    pub injury: Decimal,
    pub property: Decimal,
    pub vehicle: Decimal,
}

impl ClaimAmounts {
    /// Sum of the itemized amounts
    pub fn itemized_total(&self) -> Decimal {
        self.injury + self.property + self.vehicle
    }

    pub fn has_negative(&self) -> bool {
        [self.total, self.injury, self.property, self.vehicle]
            .iter()
            .any(|a| a.is_sign_negative() && !a.is_zero())
    }
}

/// A filed insurance claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub id: ClaimId,
    #[serde(default)]
    pub policy_number: Option<String>,
    #[serde(default)]
    pub claimant: ClaimantRef,
    #[serde(default)]
    pub policy: PolicyDetails,
    #[serde(default)]
    pub insured: InsuredDetails,
    #[serde(default)]
    pub vehicle: VehicleDetails,
    #[serde(default)]
    pub incident: IncidentDetails,
    #[serde(default)]
    pub amounts: ClaimAmounts,
    #[serde(default)]
    pub description: Option<String>,
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reviewed_by: Option<String>,
    #[serde(default)]
    pub review_notes: Option<String>,
}

impl Claim {
    /// Creates a new claim awaiting review
    pub fn new(id: ClaimId, policy_number: Option<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            policy_number,
            claimant: ClaimantRef::default(),
            policy: PolicyDetails::default(),
            insured: InsuredDetails::default(),
            vehicle: VehicleDetails::default(),
            incident: IncidentDetails::default(),
            amounts: ClaimAmounts::default(),
            description: None,
            status: ReviewStatus::UnderReview,
            created_at,
            updated_at: created_at,
            reviewed_at: None,
            reviewed_by: None,
            review_notes: None,
        }
    }

    /// Policy number as stored, treating blank values as absent
    pub fn policy_key(&self) -> Option<&str> {
        self.policy_number.as_deref().filter(|p| !p.trim().is_empty())
    }

    /// Whether the dashboard should offer disposition actions
    pub fn is_reviewable(&self) -> bool {
        self.status.is_reviewable()
    }
}
