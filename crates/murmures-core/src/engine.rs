use std::sync::Arc;

use murmures_protocol::{EngineState, Guid, OrderState, TurnReport};
use tracing::{debug, info};

use crate::{
    Actor, EngineConfig, EngineError, InvariantViolation, Level, LevelCatalog, MinimalUpdate,
    Order, Templates,
};

/// Hands out actor guids. Guids are never reused within an engine.
#[derive(Clone, Debug, Default)]
pub struct GuidAllocator {
    last: u64,
}

impl GuidAllocator {
    pub fn starting_after(last: u64) -> Self {
        Self { last }
    }

    pub fn allocate(&mut self) -> Guid {
        self.last += 1;
        Guid(self.last)
    }
}

/// The authoritative match state. Owned by one session and passed explicitly
/// (`&mut Engine`) into every operation that mutates it.
#[derive(Clone, Debug)]
pub struct Engine {
    pub(crate) config: EngineConfig,
    pub(crate) templates: Arc<Templates>,
    pub(crate) levels: LevelCatalog,
    pub(crate) state: EngineState,
    pub(crate) level: Level,
    pub(crate) heroes: Vec<Actor>,
    pub(crate) order_queue: Vec<Order>,
    pub(crate) report_queue: Vec<TurnReport>,
    pub(crate) game_turn: u32,
    pub(crate) guids: GuidAllocator,
}

impl Engine {
    pub fn new(
        templates: Arc<Templates>,
        levels: LevelCatalog,
        start_level: &str,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        let definition = levels
            .get(start_level)
            .ok_or_else(|| EngineError::UnknownLevel(start_level.to_string()))?;
        let mut guids = GuidAllocator::default();
        let level = Level::build(definition, &templates, &config, &mut guids)?;
        info!(level = %level.id(), mobs = level.mobs.len(), "engine created");

        Ok(Self {
            config,
            templates,
            levels,
            state: EngineState::Init,
            level,
            heroes: Vec::new(),
            order_queue: Vec::new(),
            report_queue: Vec::new(),
            game_turn: 0,
            guids,
        })
    }

    /// Adds a hero on the next unused starting point of the active level.
    pub fn register_hero(&mut self, template_id: &str) -> Result<Guid, EngineError> {
        if self.state == EngineState::Death {
            return Err(EngineError::GameOver);
        }
        let body = self
            .templates
            .body(template_id)
            .ok_or_else(|| EngineError::UnknownTemplate(template_id.to_string()))?;
        if !body.is_hero() {
            return Err(EngineError::NotAHero(template_id.to_string()));
        }
        let points = self.level.starting_points();
        let at = points
            .get(self.heroes.len())
            .or_else(|| points.first())
            .copied()
            .ok_or_else(|| EngineError::NoStartingPoint(self.level.id().to_string()))?;

        let guid = self.guids.allocate();
        let mut hero = Actor::from_body(guid, template_id, body, at, &self.config);
        hero.updated_turn = self.game_turn;
        self.heroes.push(hero);
        info!(hero = %guid, template = template_id, at = %at, "hero registered");

        match self.state {
            EngineState::Init => self.state = EngineState::PlayerRegistered,
            EngineState::Playing => self.refresh_vision(),
            _ => {}
        }
        Ok(guid)
    }

    /// Opens the first turn.
    pub fn start(&mut self) -> Result<(), EngineError> {
        match self.state {
            EngineState::Death => return Err(EngineError::GameOver),
            EngineState::Playing => return Ok(()),
            _ if self.heroes.is_empty() => return Err(EngineError::NoHeroes),
            _ => {}
        }
        self.state = EngineState::Playing;
        self.reset_hero_orders();
        self.refresh_vision();
        info!(heroes = self.heroes.len(), level = %self.level.id(), "game started");
        Ok(())
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn game_turn(&self) -> u32 {
        self.game_turn
    }

    pub fn tile_size(&self) -> u32 {
        self.config.tile_size
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn templates(&self) -> &Arc<Templates> {
        &self.templates
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn heroes(&self) -> &[Actor] {
        &self.heroes
    }

    pub fn hero(&self, guid: Guid) -> Option<&Actor> {
        self.heroes.iter().find(|h| h.guid() == guid)
    }

    pub(crate) fn hero_mut(&mut self, guid: Guid) -> Result<&mut Actor, InvariantViolation> {
        self.heroes
            .iter_mut()
            .find(|h| h.guid() == guid)
            .ok_or_else(|| InvariantViolation::HeroNotFound(guid).raise())
    }

    pub fn order_queue(&self) -> &[Order] {
        &self.order_queue
    }

    /// Effects of the last resolved turn, in emission order.
    pub fn report_queue(&self) -> &[TurnReport] {
        &self.report_queue
    }

    /// Heroes that still owe an order this turn.
    pub fn awaiting_orders(&self) -> Vec<Guid> {
        self.heroes
            .iter()
            .filter(|h| h.is_alive() && h.state_order != OrderState::OrderGiven)
            .map(Actor::guid)
            .collect()
    }

    pub fn minimal_update(&self) -> MinimalUpdate<'_> {
        let mut update = self.level.minimal_update();
        update
            .actors
            .extend(self.heroes.iter().filter(|h| h.to_update));
        update
    }

    pub fn clear_update_flags(&mut self) {
        self.level.clear_update_flags();
        for hero in &mut self.heroes {
            hero.to_update = false;
        }
    }

    /// First hero is prompted, the others wait.
    pub(crate) fn reset_hero_orders(&mut self) {
        for (i, hero) in self.heroes.iter_mut().enumerate() {
            hero.state_order = if i == 0 {
                OrderState::OrderInProgress
            } else {
                OrderState::WaitingForOrder
            };
        }
    }

    /// Replaces the active level with a fresh build of `level_id` and puts
    /// every hero on its starting points.
    pub(crate) fn change_level(&mut self, level_id: &str) -> Result<(), EngineError> {
        let definition = self
            .levels
            .get(level_id)
            .ok_or_else(|| InvariantViolation::UnknownLevel(level_id.to_string()).raise())?;
        let level = Level::build(definition, &self.templates, &self.config, &mut self.guids)?;
        let points = level.starting_points();
        if points.is_empty() {
            return Err(EngineError::NoStartingPoint(level_id.to_string()));
        }
        for (i, hero) in self.heroes.iter_mut().enumerate() {
            let at = points.get(i).copied().unwrap_or(points[0]);
            hero.on_vision.clear();
            hero.move_to(at, self.game_turn);
        }
        debug!(from = %self.level.id(), to = level_id, "level changed");
        self.level = level;
        Ok(())
    }
}
