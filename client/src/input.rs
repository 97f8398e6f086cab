//! Local input sampling for the outbound publisher

use crate::game::LocalPlayer;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{ParticipantState, Position};

/// Directions held during one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl InputState {
    pub fn any(&self) -> bool {
        self.up || self.down || self.left || self.right
    }
}

/// Supplies the local participant's state once per tick
///
/// Implemented by whatever owns local input: a keyboard-driven game loop, a
/// scripted bot, or a test fixture.
pub trait LocalStateProvider {
    fn sample(&mut self, dt: f64) -> ParticipantState;
}

/// Headless provider that wanders around by holding random directions
pub struct Wanderer {
    player: LocalPlayer,
    rng: StdRng,
    input: InputState,
    hold_remaining: f64,
}

impl Wanderer {
    /// Probability of each direction being held when a new input is picked
    const PRESS_CHANCE: f64 = 0.35;
    const MIN_HOLD_SECS: f64 = 0.5;
    const MAX_HOLD_SECS: f64 = 2.0;

    /// Creates a wanderer; a seed makes the walk reproducible
    pub fn new(start: Position, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            player: LocalPlayer::new(start),
            rng,
            input: InputState::default(),
            hold_remaining: 0.0,
        }
    }

    pub fn current_input(&self) -> InputState {
        self.input
    }

    fn pick_input(&mut self) -> InputState {
        InputState {
            up: self.rng.gen_bool(Self::PRESS_CHANCE),
            down: self.rng.gen_bool(Self::PRESS_CHANCE),
            left: self.rng.gen_bool(Self::PRESS_CHANCE),
            right: self.rng.gen_bool(Self::PRESS_CHANCE),
        }
    }
}

impl LocalStateProvider for Wanderer {
    fn sample(&mut self, dt: f64) -> ParticipantState {
        self.hold_remaining -= dt;
        if self.hold_remaining <= 0.0 {
            self.input = self.pick_input();
            self.hold_remaining = self
                .rng
                .gen_range(Self::MIN_HOLD_SECS..Self::MAX_HOLD_SECS);
        }

        self.player.apply_input(self.input, dt);
        self.player.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 1.0 / 60.0;

    #[test]
    fn test_input_any() {
        assert!(!InputState::default().any());
        assert!(InputState {
            left: true,
            ..Default::default()
        }
        .any());
    }

    #[test]
    fn test_seeded_wanderers_agree() {
        let start = Position::new(400.0, 300.0);
        let mut a = Wanderer::new(start, Some(7));
        let mut b = Wanderer::new(start, Some(7));

        for _ in 0..600 {
            assert_eq!(a.sample(DT), b.sample(DT));
        }
    }

    #[test]
    fn test_input_held_between_picks() {
        let mut wanderer = Wanderer::new(Position::default(), Some(1));
        wanderer.sample(DT);
        let first = wanderer.current_input();

        // Every hold lasts at least MIN_HOLD_SECS
        for _ in 0..((Wanderer::MIN_HOLD_SECS / DT) as usize - 2) {
            wanderer.sample(DT);
            assert_eq!(wanderer.current_input(), first);
        }
    }

    #[test]
    fn test_moving_flag_tracks_input() {
        let mut wanderer = Wanderer::new(Position::default(), Some(42));
        for _ in 0..600 {
            let state = wanderer.sample(DT);
            assert_eq!(state.is_moving, wanderer.current_input().any());
            assert!(state.position.x.is_finite() && state.position.y.is_finite());
        }
    }
}
