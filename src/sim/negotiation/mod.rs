//! Conversation state machine between an AI faction and a counterpart.
//!
//! Each `(ai, counterpart)` pair has its own [`NegotiationContext`]. Incoming
//! messages arrive already classified into an [`Intent`] plus [`Entities`];
//! the machine never looks at raw text itself.

mod evaluate;
mod intent;
mod provocation;

pub use evaluate::{
    Proposal, acceptance_threshold, attractiveness, availability_factor, counter_amount,
    need_factor,
};
pub use intent::{Classified, Entities, Intent, IntentClassifier};
pub use provocation::{PROVOCATION_BASE_PRICE, Quote, quote};

use std::collections::HashMap;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::model::{FactionId, RelationKind, ResourceKind, TradeLeg, World};
use crate::sim::diplomacy::alliance_acceptable;
use crate::sim::trade::TRADE_RELATION_BONUS;

/// Failed evaluations tolerated before the talks are called off.
pub const MAX_COUNTER_OFFERS: u32 = 3;

const HOSTILE_LEVEL: i64 = 20;
const INSULT_WAR_TURN: u32 = 14;
const INSULT_PENALTY_MIN: i64 = 10;
const INSULT_PENALTY_MAX: i64 = 30;
const DECLARED_WAR_PENALTY: i64 = 20;
const PEACE_MIN_LEVEL: i64 = 25;

struct ImprovementOption {
    kind: ResourceKind,
    cost: i64,
    gain: i64,
}

const IMPROVEMENT_OPTIONS: [ImprovementOption; 3] = [
    ImprovementOption {
        kind: ResourceKind::Currency,
        cost: 5000,
        gain: 10,
    },
    ImprovementOption {
        kind: ResourceKind::Crystal,
        cost: 3000,
        gain: 10,
    },
    ImprovementOption {
        kind: ResourceKind::Currency,
        cost: 20_000,
        gain: 25,
    },
];

const HOSTILE_REFUSALS: [&str; 3] = [
    "Your words confirm what we always knew about you. Leave.",
    "Speak to us like that again and our answer will come with steel.",
    "We have nothing to discuss with the likes of you.",
];

const UNKNOWN_PARTY_REPLY: &str = "We do not know who you are.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Stage {
    #[default]
    Idle,
    AskResourceType,
    AskResourceAmount,
    AskPlayerOffer,
    CounterOffer,
    Evaluate,
    Agreement,
    Rejection,
    ImproveRelationsChoice,
    ProvocationDeal,
}

impl Stage {
    /// Stages that wait for the counterpart's next message.
    pub fn awaits_reply(self) -> bool {
        matches!(
            self,
            Stage::AskResourceType
                | Stage::AskResourceAmount
                | Stage::AskPlayerOffer
                | Stage::CounterOffer
                | Stage::ImproveRelationsChoice
                | Stage::ProvocationDeal
        )
    }
}

/// Conversation state for one `(ai, counterpart)` pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NegotiationContext {
    pub stage: Stage,
    pub pending_resource: Option<ResourceKind>,
    pub pending_amount: Option<i64>,
    pub player_offer: Option<TradeLeg>,
    pub counter_offer: Option<TradeLeg>,
    pub counter_offer_count: u32,
    /// Target and price of a provocation awaiting payment.
    pub provocation: Option<(FactionId, i64)>,
    /// `Agreement` or `Rejection` for the last exchange that ran to a close.
    pub last_outcome: Option<Stage>,
}

impl NegotiationContext {
    fn reset(&mut self) {
        *self = Self::default();
    }

    fn close(&mut self, outcome: Stage) {
        self.reset();
        self.last_outcome = Some(outcome);
    }
}

/// Where a message goes, decided before any stage logic runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Reset,
    Insult,
    WarDeclaration,
    Inquiry,
    SwitchTopic,
    Continue,
    Dispatch,
}

struct Rule {
    applies: fn(Stage, Intent) -> bool,
    route: Route,
}

fn is_reset(_: Stage, intent: Intent) -> bool {
    intent == Intent::Reset
}

fn is_insult(_: Stage, intent: Intent) -> bool {
    intent == Intent::Insult
}

fn is_war(_: Stage, intent: Intent) -> bool {
    intent == Intent::WarDeclaration
}

fn is_inquiry(_: Stage, intent: Intent) -> bool {
    intent == Intent::RelationshipInquiry
}

fn is_new_topic(stage: Stage, intent: Intent) -> bool {
    stage.awaits_reply()
        && matches!(
            intent,
            Intent::AllianceProposal
                | Intent::PeaceProposal
                | Intent::Provocation
                | Intent::ImproveRelations
        )
}

fn is_mid_conversation(stage: Stage, _: Intent) -> bool {
    stage.awaits_reply()
}

fn always(_: Stage, _: Intent) -> bool {
    true
}

/// Checked top to bottom; the first matching rule wins.
const ROUTES: [Rule; 7] = [
    Rule {
        applies: is_reset,
        route: Route::Reset,
    },
    Rule {
        applies: is_insult,
        route: Route::Insult,
    },
    Rule {
        applies: is_war,
        route: Route::WarDeclaration,
    },
    Rule {
        applies: is_inquiry,
        route: Route::Inquiry,
    },
    Rule {
        applies: is_new_topic,
        route: Route::SwitchTopic,
    },
    Rule {
        applies: is_mid_conversation,
        route: Route::Continue,
    },
    Rule {
        applies: always,
        route: Route::Dispatch,
    },
];

pub fn route(stage: Stage, intent: Intent) -> Route {
    ROUTES
        .iter()
        .find(|rule| (rule.applies)(stage, intent))
        .map(|rule| rule.route)
        .unwrap_or(Route::Dispatch)
}

/// Per-pair negotiation sessions driven by classified chat messages.
#[derive(Debug)]
pub struct NegotiationStateMachine {
    contexts: HashMap<(FactionId, FactionId), NegotiationContext>,
    rng: SmallRng,
}

impl NegotiationStateMachine {
    pub fn new(seed: u64) -> Self {
        Self {
            contexts: HashMap::new(),
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn context(&self, ai: FactionId, counterpart: FactionId) -> Option<&NegotiationContext> {
        self.contexts.get(&(ai, counterpart))
    }

    pub fn stage(&self, ai: FactionId, counterpart: FactionId) -> Stage {
        self.context(ai, counterpart)
            .map(|c| c.stage)
            .unwrap_or_default()
    }

    /// Classify raw text with `classifier`, then handle it.
    pub fn handle_text(
        &mut self,
        world: &mut World,
        classifier: &dyn IntentClassifier,
        ai: FactionId,
        counterpart: FactionId,
        text: &str,
    ) -> String {
        let classified = classifier.classify(text);
        self.handle_message(world, ai, counterpart, classified.intent, &classified.entities)
    }

    /// Advance the `(ai, counterpart)` conversation and return the AI's reply.
    pub fn handle_message(
        &mut self,
        world: &mut World,
        ai: FactionId,
        counterpart: FactionId,
        intent: Intent,
        entities: &Entities,
    ) -> String {
        if !world.factions.contains_key(&ai) || !world.factions.contains_key(&counterpart) {
            warn!(ai, counterpart, "negotiation with unknown faction");
            return UNKNOWN_PARTY_REPLY.to_string();
        }

        let key = (ai, counterpart);
        let state = self.contexts.remove(&key).unwrap_or_default();
        let routed = route(state.stage, intent);
        debug!(ai, counterpart, ?intent, stage = ?state.stage, ?routed, "negotiation message");

        let mut session = Session {
            world,
            rng: &mut self.rng,
            ai,
            counterpart,
            state,
        };
        let reply = match routed {
            Route::Reset => session.reset(),
            Route::Insult => session.insult(),
            Route::WarDeclaration => session.war_declared(),
            Route::Inquiry => session.inquiry(),
            Route::SwitchTopic => {
                session.state.reset();
                session.dispatch(intent, entities)
            }
            Route::Continue => session.continue_stage(intent, entities),
            Route::Dispatch => session.dispatch(intent, entities),
        };
        self.contexts.insert(key, session.state);
        reply
    }
}

struct Session<'a> {
    world: &'a mut World,
    rng: &'a mut SmallRng,
    ai: FactionId,
    counterpart: FactionId,
    state: NegotiationContext,
}

impl Session<'_> {
    fn level(&self) -> i64 {
        self.world.diplomacy.level(self.ai, self.counterpart)
    }

    fn finish(&mut self, outcome: Stage) {
        debug!(ai = self.ai, counterpart = self.counterpart, ?outcome, "negotiation finished");
        self.state.close(outcome);
    }

    fn reset(&mut self) -> String {
        self.state.reset();
        "Very well, let us start over.".to_string()
    }

    fn insult(&mut self) -> String {
        self.state.reset();
        if self.level() < HOSTILE_LEVEL {
            let reply = HOSTILE_REFUSALS[self.rng.random_range(0..HOSTILE_REFUSALS.len())];
            if self.world.turn >= INSULT_WAR_TURN {
                self.world
                    .diplomacy
                    .set_kind(self.ai, self.counterpart, RelationKind::War);
                info!(ai = self.ai, counterpart = self.counterpart, "insult answered with war");
            }
            return reply.to_string();
        }
        let penalty = self.rng.random_range(INSULT_PENALTY_MIN..=INSULT_PENALTY_MAX);
        let level = self
            .world
            .diplomacy
            .adjust_level(self.ai, self.counterpart, -penalty);
        debug!(ai = self.ai, counterpart = self.counterpart, penalty, level, "insulted");
        "We will remember this insult.".to_string()
    }

    fn war_declared(&mut self) -> String {
        self.state.reset();
        self.world
            .diplomacy
            .set_kind(self.ai, self.counterpart, RelationKind::War);
        self.world
            .diplomacy
            .adjust_level(self.ai, self.counterpart, -DECLARED_WAR_PENALTY);
        info!(ai = self.ai, counterpart = self.counterpart, "war declared by counterpart");
        "So be it. Our armies will meet.".to_string()
    }

    fn inquiry(&self) -> String {
        let rel = self.world.diplomacy.get(self.ai, self.counterpart);
        format!(
            "Our relations stand at {}/100. We are at {}.",
            rel.level,
            rel.kind.as_str()
        )
    }

    fn dispatch(&mut self, intent: Intent, entities: &Entities) -> String {
        match intent {
            Intent::ResourceRequest => {
                self.state.reset();
                self.advance_request(entities)
            }
            Intent::AllianceProposal => self.alliance(),
            Intent::PeaceProposal => self.peace(),
            Intent::Provocation => self.provocation(entities),
            Intent::ImproveRelations => {
                self.state.stage = Stage::ImproveRelationsChoice;
                improvement_menu()
            }
            Intent::Agree | Intent::Decline => "There is nothing on the table.".to_string(),
            Intent::Reset => self.reset(),
            Intent::Insult => self.insult(),
            Intent::WarDeclaration => self.war_declared(),
            Intent::RelationshipInquiry => self.inquiry(),
            Intent::FreeText => self.small_talk(),
        }
    }

    fn continue_stage(&mut self, intent: Intent, entities: &Entities) -> String {
        if intent == Intent::Decline {
            self.finish(Stage::Rejection);
            return "As you wish.".to_string();
        }
        match self.state.stage {
            Stage::AskResourceType | Stage::AskResourceAmount => self.advance_request(entities),
            Stage::AskPlayerOffer => {
                let offer = offered_leg(entities);
                let entities = Entities {
                    offer_resource: offer.map(|o| o.kind),
                    offer_amount: offer.map(|o| o.amount),
                    ..Entities::default()
                };
                self.advance_request(&entities)
            }
            Stage::CounterOffer => self.answer_counter(intent, entities),
            Stage::ImproveRelationsChoice => self.improvement_choice(entities),
            Stage::ProvocationDeal => self.provocation_answer(intent),
            Stage::Idle | Stage::Evaluate | Stage::Agreement | Stage::Rejection => {
                self.dispatch(intent, entities)
            }
        }
    }

    fn small_talk(&self) -> String {
        match self.level() {
            l if l < HOSTILE_LEVEL => "State your business and go.".to_string(),
            l if l >= 80 => "Always a pleasure, friend. What can we do for you?".to_string(),
            _ => "We are listening.".to_string(),
        }
    }

    // --- Resource requests ---

    fn advance_request(&mut self, entities: &Entities) -> String {
        if let Some(resource) = entities.resource {
            self.state.pending_resource = Some(resource);
        }
        if let Some(amount) = entities.amount.filter(|a| *a > 0) {
            self.state.pending_amount = Some(amount);
        }
        if let (Some(kind), Some(amount)) = (entities.offer_resource, entities.offer_amount) {
            if amount > 0 {
                self.state.player_offer = Some(TradeLeg::new(kind, amount));
            }
        }

        match (
            self.state.pending_resource,
            self.state.pending_amount,
            self.state.player_offer,
        ) {
            (None, _, _) => {
                self.state.stage = Stage::AskResourceType;
                "Which resource do you need?".to_string()
            }
            (Some(resource), None, _) => {
                self.state.stage = Stage::AskResourceAmount;
                format!("How much {} do you need?", resource.as_str())
            }
            (Some(resource), Some(amount), None) => {
                self.state.stage = Stage::AskPlayerOffer;
                format!(
                    "And what do you offer in return for {amount} {}?",
                    resource.as_str()
                )
            }
            (Some(resource), Some(amount), Some(offer)) => {
                self.evaluate(TradeLeg::new(resource, amount), offer)
            }
        }
    }

    fn evaluate(&mut self, ai_gives: TradeLeg, ai_receives: TradeLeg) -> String {
        self.state.stage = Stage::Evaluate;
        let proposal = Proposal {
            ai_gives,
            ai_receives,
        };
        let score = attractiveness(self.world, self.ai, self.counterpart, proposal);
        let threshold = acceptance_threshold(self.level());
        debug!(ai = self.ai, counterpart = self.counterpart, score, threshold, "trade evaluated");
        if score >= threshold {
            return self.conclude(proposal);
        }

        self.state.counter_offer_count += 1;
        if self.state.counter_offer_count > MAX_COUNTER_OFFERS {
            self.finish(Stage::Rejection);
            return "We are going in circles. The talks are over.".to_string();
        }
        let Some(amount) = counter_amount(ai_receives.amount, score, threshold) else {
            self.finish(Stage::Rejection);
            return format!(
                "We cannot part with {} {} on any terms.",
                ai_gives.amount,
                ai_gives.kind.as_str()
            );
        };
        let counter = TradeLeg::new(ai_receives.kind, amount);
        self.state.counter_offer = Some(counter);
        self.state.stage = Stage::CounterOffer;
        format!(
            "That is not enough. Offer {} {} and we have a deal.",
            counter.amount,
            counter.kind.as_str()
        )
    }

    fn answer_counter(&mut self, intent: Intent, entities: &Entities) -> String {
        let (Some(resource), Some(amount)) = (self.state.pending_resource, self.state.pending_amount)
        else {
            self.finish(Stage::Rejection);
            return "We seem to have lost track. Let us start over.".to_string();
        };
        let ai_gives = TradeLeg::new(resource, amount);

        if intent == Intent::Agree {
            if let Some(counter) = self.state.counter_offer {
                return self.conclude(Proposal {
                    ai_gives,
                    ai_receives: counter,
                });
            }
        }
        if let Some(offer) = offered_leg(entities) {
            self.state.player_offer = Some(offer);
            return self.evaluate(ai_gives, offer);
        }
        match self.state.counter_offer {
            Some(counter) => format!(
                "Our offer stands: {} {} for {} {}.",
                counter.amount,
                counter.kind.as_str(),
                ai_gives.amount,
                ai_gives.kind.as_str()
            ),
            None => "Make us an offer.".to_string(),
        }
    }

    fn conclude(&mut self, proposal: Proposal) -> String {
        let Some(counterpart) = self.world.stock(self.counterpart) else {
            self.finish(Stage::Rejection);
            return UNKNOWN_PARTY_REPLY.to_string();
        };
        if counterpart.get(proposal.ai_receives.kind) < proposal.ai_receives.amount {
            self.finish(Stage::Rejection);
            return "Come back when you can actually pay.".to_string();
        }
        let ai_can_pay = self
            .world
            .stock(self.ai)
            .is_some_and(|s| s.get(proposal.ai_gives.kind) >= proposal.ai_gives.amount);
        if !ai_can_pay {
            self.finish(Stage::Rejection);
            return "We no longer have that much to spare.".to_string();
        }

        if let Err(reason) = self.world.exchange(
            self.ai,
            proposal.ai_gives,
            self.counterpart,
            proposal.ai_receives,
        ) {
            debug!(ai = self.ai, counterpart = self.counterpart, ?reason, "negotiated trade failed");
            self.finish(Stage::Rejection);
            return "Our treasuries cannot hold such a deal.".to_string();
        }
        self.world
            .diplomacy
            .adjust_level(self.ai, self.counterpart, TRADE_RELATION_BONUS);
        info!(
            ai = self.ai,
            counterpart = self.counterpart,
            gives = proposal.ai_gives.amount,
            receives = proposal.ai_receives.amount,
            "negotiated trade executed"
        );
        self.finish(Stage::Agreement);
        format!(
            "Agreed. We send {} {}, you send {} {}.",
            proposal.ai_gives.amount,
            proposal.ai_gives.kind.as_str(),
            proposal.ai_receives.amount,
            proposal.ai_receives.kind.as_str()
        )
    }

    // --- Diplomacy ---

    fn alliance(&mut self) -> String {
        self.state.reset();
        if self.world.diplomacy.allied(self.ai, self.counterpart) {
            return "We are already allies.".to_string();
        }
        if alliance_acceptable(self.world, self.ai, self.counterpart) {
            self.world
                .diplomacy
                .set_kind(self.ai, self.counterpart, RelationKind::Alliance);
            info!(ai = self.ai, counterpart = self.counterpart, "alliance agreed");
            return "We accept. From today our banners fly together.".to_string();
        }
        "We do not trust you enough for an alliance.".to_string()
    }

    fn peace(&mut self) -> String {
        self.state.reset();
        if !self.world.diplomacy.at_war(self.ai, self.counterpart) {
            return "We are not at war.".to_string();
        }
        let weaker = self.world.army_strength(self.ai) < self.world.army_strength(self.counterpart);
        if self.level() >= PEACE_MIN_LEVEL || weaker {
            self.world
                .diplomacy
                .set_kind(self.ai, self.counterpart, RelationKind::Peace);
            info!(ai = self.ai, counterpart = self.counterpart, "peace agreed");
            return "Enough blood has been spilled. We accept peace.".to_string();
        }
        "Peace? Not while we are winning.".to_string()
    }

    fn improvement_choice(&mut self, entities: &Entities) -> String {
        let option = entities
            .choice
            .and_then(|c| usize::from(c).checked_sub(1))
            .and_then(|i| IMPROVEMENT_OPTIONS.get(i));
        let Some(option) = option else {
            return improvement_menu();
        };
        if !self
            .world
            .transfer(self.counterpart, self.ai, option.kind, option.cost)
        {
            self.finish(Stage::Rejection);
            return "You lack the means for such a gesture.".to_string();
        }
        self.finish(Stage::Agreement);
        let level = self
            .world
            .diplomacy
            .adjust_level(self.ai, self.counterpart, option.gain);
        format!("A generous gesture. Our relations are now {level}/100.")
    }

    fn provocation(&mut self, entities: &Entities) -> String {
        self.state.reset();
        let Some(target) = entities.target_faction else {
            return "Against whom?".to_string();
        };
        let roll: f64 = self.rng.random();
        match quote(self.world, self.ai, self.counterpart, target, roll) {
            Quote::Refused => "We will not be dragged into that.".to_string(),
            Quote::Free => {
                self.declare_war_on(target);
                "For you, friend, gladly. Our armies march.".to_string()
            }
            Quote::Price(price) => {
                self.state.provocation = Some((target, price));
                self.state.stage = Stage::ProvocationDeal;
                format!("It can be done, for {price} currency.")
            }
        }
    }

    fn provocation_answer(&mut self, intent: Intent) -> String {
        let Some((target, price)) = self.state.provocation else {
            self.finish(Stage::Rejection);
            return "There is nothing on the table.".to_string();
        };
        if intent != Intent::Agree {
            return format!("Our price is {price} currency. Yes or no?");
        }
        if !self
            .world
            .transfer(self.counterpart, self.ai, ResourceKind::Currency, price)
        {
            self.finish(Stage::Rejection);
            return "You cannot afford our services.".to_string();
        }
        self.declare_war_on(target);
        self.finish(Stage::Agreement);
        "Payment received. Our armies march.".to_string()
    }

    fn declare_war_on(&mut self, target: FactionId) {
        self.world
            .diplomacy
            .set_kind(self.ai, target, RelationKind::War);
        info!(ai = self.ai, target, requester = self.counterpart, "war declared on request");
    }
}

fn offered_leg(entities: &Entities) -> Option<TradeLeg> {
    let kind = entities.offer_resource.or(entities.resource)?;
    let amount = entities.offer_amount.or(entities.amount)?;
    (amount > 0).then(|| TradeLeg::new(kind, amount))
}

fn improvement_menu() -> String {
    let options: Vec<String> = IMPROVEMENT_OPTIONS
        .iter()
        .enumerate()
        .map(|(i, o)| format!("{}) {} {} for +{}", i + 1, o.cost, o.kind.as_str(), o.gain))
        .collect();
    format!("How would you show your goodwill? {}", options.join("; "))
}
