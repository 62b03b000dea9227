//! Statement nodes and their judge-assigned proof states.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::ids::StatementId;

/// Proof status of a statement.
///
/// Assigned exclusively by the remote judge — the client never sets a state
/// locally, it only mirrors what the latest snapshot says.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementState {
    /// Not yet evaluated.
    #[default]
    None,
    /// Accepted as a standalone fact.
    DirectlyProven,
    /// Evaluated as a consequence of its premises and accepted.
    ImpliedProven,
    /// Evaluated as a consequence of its premises and rejected.
    ImpliedUnproven,
}

impl StatementState {
    /// Whether the judge considers the statement proven (directly or by
    /// implication).
    #[must_use]
    pub const fn is_proven(self) -> bool {
        matches!(self, Self::DirectlyProven | Self::ImpliedProven)
    }
}

/// One statement row of a graph snapshot, as it appears on the wire.
///
/// `parents` are premises this statement is claimed to follow from;
/// `children` are conclusions it supports.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatementDto {
    /// Judge-assigned id.
    pub id: StatementId,
    /// The claim text.
    pub statement: String,
    /// Judge-assigned proof status.
    pub state: StatementState,
    /// Ids of premise statements.
    pub parents: Vec<StatementId>,
    /// Ids of conclusion statements.
    pub children: Vec<StatementId>,
}

/// A normalized statement node.
///
/// Unlike [`StatementDto`], parent/child links are sets: duplicate entries
/// in a snapshot row collapse, matching the "no duplicate edges between the
/// same ordered pair" rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Statement {
    /// Judge-assigned id.
    pub id: StatementId,
    /// The claim text.
    pub text: String,
    /// Judge-assigned proof status.
    pub state: StatementState,
    /// Premises this statement is claimed to follow from.
    pub parents: BTreeSet<StatementId>,
    /// Conclusions this statement supports.
    pub children: BTreeSet<StatementId>,
}

impl Statement {
    /// Normalize a snapshot row into a statement node.
    #[must_use]
    pub fn from_dto(dto: &StatementDto) -> Self {
        Self {
            id: dto.id,
            text: dto.statement.clone(),
            state: dto.state,
            parents: dto.parents.iter().copied().collect(),
            children: dto.children.iter().copied().collect(),
        }
    }
}
