use game_core::{Game, GamePhase, LifecycleEvent, ResourceInstance};

/// Which lifecycle event a watch-driven reconcile of a live Game stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Created,
    Resumed,
    TimerTick,
}

/// `first_sight` is true the first time this process reconciles the game.
///
/// A creation that failed for the current generation is not attempted again
/// until the spec changes, but the game still gets resume and timer checks.
pub fn classify(game: &Game, first_sight: bool) -> Trigger {
    let settled = match game.phase() {
        None => false,
        Some(GamePhase::Provisioned) => true,
        Some(GamePhase::Failed) => game.observed_generation() == game.metadata.generation,
    };
    match (settled, first_sight) {
        (false, _) => Trigger::Created,
        (true, true) => Trigger::Resumed,
        (true, false) => Trigger::TimerTick,
    }
}

impl Trigger {
    pub fn event(self, inst: ResourceInstance) -> LifecycleEvent {
        match self {
            Trigger::Created => LifecycleEvent::Created(inst),
            Trigger::Resumed => LifecycleEvent::Resumed(inst),
            Trigger::TimerTick => LifecycleEvent::TimerTick(inst),
        }
    }
}
