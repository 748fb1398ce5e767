use serde::{Deserialize, Serialize};

use super::faction::FactionId;
use super::resource::ResourceKind;

/// One side of a trade: a resource kind and how much of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeLeg {
    pub kind: ResourceKind,
    pub amount: i64,
}

impl TradeLeg {
    pub fn new(kind: ResourceKind, amount: i64) -> Self {
        Self { kind, amount }
    }

    pub fn value(&self, crystal_price: f64) -> f64 {
        self.amount as f64 * self.kind.unit_value(crystal_price)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    LowRelationship,
    InsufficientStock,
    UnfavorableRatio,
    UnknownFaction,
    /// The receiving side has no room left under its resource cap.
    ReceiverFull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum TradeStatus {
    Pending,
    Accepted,
    Rejected(RejectReason),
}

/// A standing offer: `proposer` gives `offered` in exchange for `requested` from `target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeAgreement {
    pub id: u64,
    pub proposer: FactionId,
    pub target: FactionId,
    pub offered: TradeLeg,
    pub requested: TradeLeg,
    pub status: TradeStatus,
}

impl TradeAgreement {
    pub fn is_pending(&self) -> bool {
        self.status == TradeStatus::Pending
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueryKind {
    AllianceProposal,
    ImproveRelations { payment: i64 },
}

/// A queued diplomatic proposal, answered during the recipient's next turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiplomaticQuery {
    pub from: FactionId,
    pub to: FactionId,
    pub kind: QueryKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_with_reason() {
        let json =
            serde_json::to_value(TradeStatus::Rejected(RejectReason::LowRelationship)).unwrap();
        assert_eq!(json["status"], "rejected");
        assert_eq!(json["reason"], "low_relationship");
    }

    #[test]
    fn leg_value_uses_crystal_price() {
        let leg = TradeLeg::new(ResourceKind::Crystal, 100);
        assert!((leg.value(1.5) - 150.0).abs() < f64::EPSILON);
    }
}
