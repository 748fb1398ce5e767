use serde::{Deserialize, Serialize};

use crate::model::{FactionId, ResourceKind};

/// What the counterpart's message is trying to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    ResourceRequest,
    AllianceProposal,
    PeaceProposal,
    WarDeclaration,
    /// Pay the AI to attack a third faction.
    Provocation,
    Insult,
    RelationshipInquiry,
    ImproveRelations,
    Agree,
    Decline,
    Reset,
    FreeText,
}

/// Typed values extracted from the message alongside the intent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entities {
    /// Resource the counterpart asks for.
    pub resource: Option<ResourceKind>,
    pub amount: Option<i64>,
    /// Resource the counterpart offers in return.
    pub offer_resource: Option<ResourceKind>,
    pub offer_amount: Option<i64>,
    pub target_faction: Option<FactionId>,
    /// Menu choice, 1-based.
    pub choice: Option<u8>,
}

impl Entities {
    pub fn request(resource: ResourceKind, amount: i64) -> Self {
        Self {
            resource: Some(resource),
            amount: Some(amount),
            ..Self::default()
        }
    }

    pub fn offer(resource: ResourceKind, amount: i64) -> Self {
        Self {
            offer_resource: Some(resource),
            offer_amount: Some(amount),
            ..Self::default()
        }
    }

    pub fn target(faction: FactionId) -> Self {
        Self {
            target_faction: Some(faction),
            ..Self::default()
        }
    }

    pub fn choice(choice: u8) -> Self {
        Self {
            choice: Some(choice),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classified {
    pub intent: Intent,
    pub entities: Entities,
}

/// Turns raw chat text into an intent plus entities.
///
/// Implemented outside the engine; the negotiation machine only ever sees
/// the classified result.
pub trait IntentClassifier {
    fn classify(&self, text: &str) -> Classified;
}
