use tracing::debug;

use crate::resolver::{strike, AI_STRIKE};
use crate::Engine;

impl Engine {
    /// Every living mob that has been spotted attacks the first hero, in
    /// registration order, that it can see and reach.
    pub(crate) fn run_ai(&mut self) {
        let turn = self.game_turn;
        let mut deaths = Vec::new();

        for mob in self.level.mobs.iter().filter(|m| m.char_spotted() && m.is_alive()) {
            let Some(hero) = self.heroes.iter_mut().find(|h| {
                h.is_alive()
                    && mob.is_visible_to(h.guid())
                    && mob.position.within(h.position, mob.range)
            }) else {
                continue;
            };
            debug!(mob = %mob.guid(), hero = %hero.guid(), damage = mob.default_damage, "mob attacks");
            if strike(
                hero,
                mob.position,
                mob.default_damage,
                AI_STRIKE,
                turn,
                &mut self.report_queue,
            ) {
                deaths.push(hero.position);
            }
        }

        if !deaths.is_empty() {
            for at in deaths {
                self.mark_death(at);
            }
            self.declare_death();
        }
    }
}
