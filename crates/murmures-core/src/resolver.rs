//! Turn lock-step and order application.

use murmures_protocol::{
    priority, Command, Coord, EngineState, Guid, OrderRequest, OrderState, TurnReport,
};
use tracing::{debug, info, warn};

use crate::behavior::{self, Flow};
use crate::{check_order, Actor, Engine, EngineError, InvariantViolation, Order, Rejection};

/// What happened to a submitted order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Submission {
    Rejected(Rejection),
    /// Buffered; these heroes still owe an order.
    Queued { awaiting: Vec<Guid> },
    /// The order completed the batch and the turn was resolved.
    Resolved { turn: u32 },
}

impl Engine {
    /// Validates and buffers one hero's order. The turn resolves as soon as
    /// every living hero has given one.
    pub fn submit_order(&mut self, request: &OrderRequest) -> Result<Submission, EngineError> {
        if let Err(reason) = self.gate(request) {
            debug!(hero = ?request.source_guid(), %reason, "order rejected");
            return Ok(Submission::Rejected(reason));
        }

        let order = Order::build(self, request)?;
        let completes_batch = self.awaiting_orders() == [order.source];
        let checkpoint = completes_batch.then(|| self.clone());

        let turn = self.game_turn;
        let hero = self.hero_mut(order.source)?;
        hero.state_order = OrderState::OrderGiven;
        hero.touch(turn);
        debug!(hero = %order.source, command = order.command.as_str(), target = %order.target, "order queued");
        self.order_queue.push(order);

        if let Some(checkpoint) = checkpoint {
            if let Err(err) = self.resolve_turn() {
                *self = checkpoint;
                return Err(err);
            }
            return Ok(Submission::Resolved {
                turn: self.game_turn,
            });
        }

        if let Some(next) = self
            .heroes
            .iter_mut()
            .find(|h| h.is_alive() && h.state_order != OrderState::OrderGiven)
        {
            next.state_order = OrderState::OrderInProgress;
        }
        Ok(Submission::Queued {
            awaiting: self.awaiting_orders(),
        })
    }

    fn gate(&self, request: &OrderRequest) -> Result<(), Rejection> {
        if matches!(
            self.state,
            EngineState::Init | EngineState::PlayerRegistered
        ) {
            return Err(Rejection::NotStarted);
        }
        check_order(self, request)?;
        let given = request
            .source_guid()
            .and_then(|guid| self.hero(guid))
            .is_some_and(|h| h.state_order == OrderState::OrderGiven);
        if given {
            return Err(Rejection::AlreadyOrdered);
        }
        Ok(())
    }

    /// Applies the buffered batch, refreshes vision, runs the AI and opens
    /// the next turn.
    pub(crate) fn resolve_turn(&mut self) -> Result<(), EngineError> {
        self.report_queue.clear();
        let orders = std::mem::take(&mut self.order_queue);
        info!(turn = self.game_turn, orders = orders.len(), "resolving turn");

        for (i, order) in orders.iter().enumerate() {
            if let Flow::LevelChanged = self.apply_order(order)? {
                let dropped = orders.len() - i - 1;
                if dropped > 0 {
                    debug!(dropped, "orders dropped after level change");
                }
                break;
            }
        }

        self.refresh_vision();
        self.run_ai();
        self.reset_hero_orders();
        self.game_turn += 1;
        debug!(
            turn = self.game_turn,
            reports = self.report_queue.len(),
            state = ?self.state,
            "turn resolved"
        );
        Ok(())
    }

    fn apply_order(&mut self, order: &Order) -> Result<Flow, EngineError> {
        let alive = self.hero(order.source).is_some_and(Actor::is_alive);
        if !alive {
            debug!(hero = %order.source, "order skipped, hero is dead");
            return Ok(Flow::Continue);
        }
        match order.command {
            Command::Move => {
                let behavior = self
                    .level
                    .tile(order.target)
                    .and_then(|tile| tile.behavior.clone());
                match behavior {
                    Some(behavior) => behavior::trigger(self, &behavior, order.source, order.target),
                    None => {
                        self.move_hero(order.source, order.target)?;
                        Ok(Flow::Continue)
                    }
                }
            }
            Command::Attack => {
                self.apply_attack(order)?;
                Ok(Flow::Continue)
            }
            Command::ChangeSkill => {
                let turn = self.game_turn;
                let hero = self.hero_mut(order.source)?;
                hero.active_skill = order.skill.clone();
                hero.touch(turn);
                Ok(Flow::Continue)
            }
        }
    }

    pub(crate) fn move_hero(&mut self, guid: Guid, to: Coord) -> Result<(), InvariantViolation> {
        let turn = self.game_turn;
        let hero = self.hero_mut(guid)?;
        let from = hero.position;
        hero.move_to(to, turn);
        self.report_queue
            .push(TurnReport::character_move(guid, from, to, priority::HERO_MOVE));
        Ok(())
    }

    fn apply_attack(&mut self, order: &Order) -> Result<(), InvariantViolation> {
        let skill_id = order
            .skill
            .clone()
            .ok_or_else(|| InvariantViolation::MalformedOrder(order.source).raise())?;
        let skill = self
            .templates
            .skill(&skill_id)
            .cloned()
            .ok_or_else(|| InvariantViolation::UnknownSkill(skill_id.clone()).raise())?;

        let turn = self.game_turn;
        let attacker = self.hero_mut(order.source)?;
        if attacker.active_skill.as_deref() != Some(skill_id.as_str()) {
            attacker.active_skill = Some(skill_id);
            attacker.touch(turn);
        }
        let origin = attacker.position;
        let attacker = order.source;
        let target = order.target;

        let hit = |actor: &Actor| {
            actor.position == target
                && actor.is_alive()
                && actor.guid() != attacker
                && actor.is_visible_to(attacker)
                && skill.target_audience.admits(actor.kind)
        };

        let mut deaths = Vec::new();
        let mut hero_died = false;
        for mob in self.level.mobs.iter_mut().filter(|m| hit(&**m)) {
            if strike(mob, origin, skill.damage, HERO_STRIKE, turn, &mut self.report_queue) {
                deaths.push(mob.position);
            }
        }
        for hero in self.heroes.iter_mut().filter(|h| hit(&**h)) {
            if strike(hero, origin, skill.damage, HERO_STRIKE, turn, &mut self.report_queue) {
                deaths.push(hero.position);
                hero_died = true;
            }
        }

        for at in deaths {
            self.mark_death(at);
        }
        if hero_died {
            self.declare_death();
        }
        Ok(())
    }

    pub(crate) fn mark_death(&mut self, at: Coord) {
        let turn = self.game_turn;
        let deco = self.config.death_decoration.clone();
        if let Some(tile) = self.level.tile_mut(at) {
            tile.set_ground_deco(deco, turn);
        }
    }

    pub(crate) fn declare_death(&mut self) {
        if self.state != EngineState::Death {
            warn!(turn = self.game_turn, "a hero has fallen, game over");
            self.state = EngineState::Death;
        }
    }
}

/// (projectile, damage) report priorities.
pub(crate) type StrikePriority = (i32, i32);

pub(crate) const HERO_STRIKE: StrikePriority = (priority::HERO_PROJECTILE, priority::HERO_DAMAGE);
pub(crate) const AI_STRIKE: StrikePriority = (priority::AI_PROJECTILE, priority::AI_DAMAGE);

/// Fires a projectile from `from` at `victim` and applies `damage`.
/// Returns true when the victim died from it.
pub(crate) fn strike(
    victim: &mut Actor,
    from: Coord,
    damage: i32,
    (projectile, impact): StrikePriority,
    turn: u32,
    reports: &mut Vec<TurnReport>,
) -> bool {
    reports.push(TurnReport::projectile(from, victim.position, projectile));
    reports.push(TurnReport::damage(victim.guid(), damage, impact));
    victim.take_damage(damage, turn);
    !victim.is_alive()
}
