//! Status enumerations and the idea lifecycle transition rules.
//!
//! Statuses are closed enums everywhere inside the pipeline; the record
//! store adapter is the only place that parses the store's string values,
//! and it does so case-insensitively ([`IdeaStatus::parse`],
//! [`StructureStatus::parse`]).

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Idea status
// ---------------------------------------------------------------------------

/// Review status of a [`PromptIdea`](crate::idea::PromptIdea).
///
/// `Approved` and `Declined` are terminal: no transition leads out of
/// either state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdeaStatus {
    /// Freshly created, not yet test-rendered.
    Proposed,
    /// A test render has been started for this idea.
    Pending,
    /// Approved and promoted into a structure.
    Approved,
    /// Explicitly declined by the reviewer.
    Declined,
}

impl IdeaStatus {
    /// Canonical store-facing label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Proposed => "Proposed",
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Declined => "Declined",
        }
    }

    /// Parse a stored status value, ignoring case.
    ///
    /// Used only at the store-adapter boundary; everything deeper works
    /// with the enum.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "proposed" => Some(Self::Proposed),
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "declined" => Some(Self::Declined),
            _ => None,
        }
    }

    /// Whether this state admits no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Declined)
    }

    /// Whether a transition from `self` to `to` is allowed.
    ///
    /// - `Proposed -> Pending` (first test render)
    /// - `Proposed | Pending -> Approved`
    /// - `Proposed | Pending -> Declined`
    pub fn can_transition(self, to: IdeaStatus) -> bool {
        match (self, to) {
            (Self::Proposed, Self::Pending) => true,
            (Self::Proposed | Self::Pending, Self::Approved) => true,
            (Self::Proposed | Self::Pending, Self::Declined) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for IdeaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Structure status
// ---------------------------------------------------------------------------

/// Status of a [`PromptStructure`](crate::structure::PromptStructure).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StructureStatus {
    /// Eligible for scoring and for informing future generation.
    Active,
    /// Retired from the candidate pool (store-side operation).
    Archived,
}

impl StructureStatus {
    /// Canonical store-facing label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Archived => "Archived",
        }
    }

    /// Parse a stored status value, ignoring case.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Some(Self::Active),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

impl std::fmt::Display for StructureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
