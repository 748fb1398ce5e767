use rand::RngCore;

use super::signal::{Signal, SignalKind};
use crate::model::{FactionId, World};

/// Context passed to every step of a faction's turn.
pub struct TurnContext<'a> {
    pub world: &'a mut World,
    pub rng: &'a mut dyn RngCore,
    /// Steps push signals here; the runner hands them to the caller.
    pub signals: &'a mut Vec<Signal>,
    /// The faction whose turn it is.
    pub faction: FactionId,
}

impl TurnContext<'_> {
    pub fn emit(&mut self, kind: SignalKind) {
        self.signals.push(Signal {
            turn: self.world.turn,
            kind,
        });
    }
}
