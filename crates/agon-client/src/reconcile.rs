//! Snapshot reconciliation.
//!
//! Every `GameState` push is a full replace: the server is authoritative
//! and no delta format exists, which sidesteps incremental-consistency bugs
//! at the cost of discarding any local edit that raced with a snapshot in
//! flight. The one thing that must survive a pass is client-only layout
//! metadata: a node that stays in the graph keeps its pin, a node that
//! leaves loses it, and a node that later reappears under the same id comes
//! back unpinned.
//!
//! The merge produces a fresh view each pass — it never mutates the old one
//! in place, so a drag-driven pin update and a reconciliation can never
//! silently overwrite each other.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use agon_core::ids::StatementId;
use agon_core::statement::{Statement, StatementDto};

use crate::view::{GraphView, Pin, RenderEdge, RenderNode};

/// Merge an authoritative snapshot into a new [`GraphView`].
///
/// - Text and state always come from the snapshot.
/// - Pins carry forward for ids present in both `old` and the snapshot.
/// - Ids absent from the snapshot are dropped outright (no tombstoning).
/// - Edges are rebuilt in full from each row's child list, child → parent.
///
/// Idempotent: applying the same snapshot twice yields an identical view.
#[must_use]
pub fn reconcile(old: &GraphView, snapshot: &[StatementDto], root: StatementId) -> GraphView {
    let pins: HashMap<StatementId, Pin> = old
        .nodes()
        .iter()
        .filter_map(|n| n.pin.map(|p| (n.id, p)))
        .collect();

    let mut nodes = Vec::with_capacity(snapshot.len());
    let mut edges = Vec::new();
    let mut seen: HashSet<StatementId> = HashSet::with_capacity(snapshot.len());

    for dto in snapshot {
        let statement = Statement::from_dto(dto);
        if !seen.insert(statement.id) {
            warn!(id = %statement.id, "duplicate statement in snapshot, keeping first");
            continue;
        }
        nodes.push(RenderNode {
            id: statement.id,
            statement: statement.text,
            state: statement.state,
            pin: pins.get(&statement.id).copied(),
        });
        for child in &statement.children {
            edges.push(RenderEdge {
                source: *child,
                target: statement.id,
            });
        }
    }

    GraphView::from_parts(nodes, edges, root)
}
