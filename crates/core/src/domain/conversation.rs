use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::StatusUpdateError;

/// Negotiation stage of a procurement conversation.
///
/// Any status may follow any other; the ordering below is the usual path a
/// negotiation takes, not an enforced sequence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversationStatus {
    #[default]
    InitialResearch,
    SpecificationConfirmation,
    QuotationRequestSubmitted,
    NegotiationTurn,
    AwaitingCounterpartyResponse,
    FinalAgreementReady,
    ConversationClosedFailure,
}

impl ConversationStatus {
    pub const ALL: [ConversationStatus; 7] = [
        Self::InitialResearch,
        Self::SpecificationConfirmation,
        Self::QuotationRequestSubmitted,
        Self::NegotiationTurn,
        Self::AwaitingCounterpartyResponse,
        Self::FinalAgreementReady,
        Self::ConversationClosedFailure,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InitialResearch => "INITIAL_RESEARCH",
            Self::SpecificationConfirmation => "SPECIFICATION_CONFIRMATION",
            Self::QuotationRequestSubmitted => "QUOTATION_REQUEST_SUBMITTED",
            Self::NegotiationTurn => "NEGOTIATION_TURN",
            Self::AwaitingCounterpartyResponse => "AWAITING_COUNTERPARTY_RESPONSE",
            Self::FinalAgreementReady => "FINAL_AGREEMENT_READY",
            Self::ConversationClosedFailure => "CONVERSATION_CLOSED_FAILURE",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::InitialResearch => "Starting research phase",
            Self::SpecificationConfirmation => "Confirming product specifications",
            Self::QuotationRequestSubmitted => "Quotation request has been submitted",
            Self::NegotiationTurn => "Active negotiation in progress",
            Self::AwaitingCounterpartyResponse => "Waiting for supplier response",
            Self::FinalAgreementReady => "Agreement is ready to finalize",
            Self::ConversationClosedFailure => "Negotiation failed or closed",
        }
    }

    /// Display hint only. Terminal statuses can still be overwritten.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::FinalAgreementReady | Self::ConversationClosedFailure)
    }
}

impl fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversationStatus {
    type Err = StatusUpdateError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| StatusUpdateError::InvalidStatus(value.to_string()))
    }
}

/// Entity identifiers scoping one agent invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    pub product_id: Option<String>,
    pub supplier_id: Option<String>,
    pub company_id: Option<String>,
}

impl RequestContext {
    pub fn new(
        product_id: impl Into<String>,
        supplier_id: impl Into<String>,
        company_id: impl Into<String>,
    ) -> Self {
        Self {
            product_id: Some(product_id.into()),
            supplier_id: Some(supplier_id.into()),
            company_id: Some(company_id.into()),
        }
    }

    pub fn is_complete(&self) -> bool {
        [&self.product_id, &self.supplier_id, &self.company_id]
            .into_iter()
            .all(|id| id.as_deref().is_some_and(|value| !value.trim().is_empty()))
    }

    pub fn is_empty(&self) -> bool {
        self.product_id.is_none() && self.supplier_id.is_none() && self.company_id.is_none()
    }

    /// Fields set on `other` replace the ones held here.
    pub fn merged_with(&self, other: &RequestContext) -> RequestContext {
        RequestContext {
            product_id: other.product_id.clone().or_else(|| self.product_id.clone()),
            supplier_id: other.supplier_id.clone().or_else(|| self.supplier_id.clone()),
            company_id: other.company_id.clone().or_else(|| self.company_id.clone()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRecord {
    pub product_id: Option<String>,
    pub supplier_id: Option<String>,
    pub company_id: Option<String>,
    pub status: ConversationStatus,
    pub note: Option<String>,
}
