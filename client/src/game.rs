use crate::input::InputState;
use shared::{Facing, ParticipantState, Position};

/// Units per second travelled while a direction is held
pub const MOVE_SPEED: f64 = 200.0;

/// The participant controlled on this machine
///
/// Rendered from local state, never from what the relay sends back.
#[derive(Debug, Clone)]
pub struct LocalPlayer {
    state: ParticipantState,
    move_speed: f64,
}

impl LocalPlayer {
    pub fn new(start: Position) -> Self {
        Self {
            state: ParticipantState {
                position: start,
                facing: Facing::Up,
                is_moving: false,
            },
            move_speed: MOVE_SPEED,
        }
    }

    /// Integrates one tick of directional input
    ///
    /// Opposite directions cancel out. Facing follows the last held
    /// direction in the order up, down, left, right.
    pub fn apply_input(&mut self, input: InputState, dt: f64) {
        let step = self.move_speed * dt;
        let state = &mut self.state;
        state.is_moving = false;

        if input.up {
            state.position.y -= step;
            state.facing = Facing::Up;
            state.is_moving = true;
        }
        if input.down {
            state.position.y += step;
            state.facing = Facing::Down;
            state.is_moving = true;
        }
        if input.left {
            state.position.x -= step;
            state.facing = Facing::Left;
            state.is_moving = true;
        }
        if input.right {
            state.position.x += step;
            state.facing = Facing::Right;
            state.is_moving = true;
        }
    }

    pub fn state(&self) -> ParticipantState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    const DT: f64 = 1.0 / 60.0;

    #[test]
    fn test_idle_input_keeps_position() {
        let mut player = LocalPlayer::new(Position::new(400.0, 300.0));
        player.apply_input(InputState::default(), DT);

        let state = player.state();
        assert_eq!(state.position, Position::new(400.0, 300.0));
        assert_eq!(state.facing, Facing::Up);
        assert!(!state.is_moving);
    }

    #[test]
    fn test_single_direction_moves_and_faces() {
        let mut player = LocalPlayer::new(Position::new(0.0, 0.0));
        let input = InputState {
            right: true,
            ..Default::default()
        };

        for _ in 0..60 {
            player.apply_input(input, DT);
        }

        let state = player.state();
        assert_approx_eq!(state.position.x, MOVE_SPEED, 1e-6);
        assert_eq!(state.position.y, 0.0);
        assert_eq!(state.facing, Facing::Right);
        assert!(state.is_moving);
    }

    #[test]
    fn test_later_direction_wins_facing() {
        let mut player = LocalPlayer::new(Position::new(0.0, 0.0));
        player.apply_input(
            InputState {
                up: true,
                left: true,
                ..Default::default()
            },
            DT,
        );

        let state = player.state();
        assert_eq!(state.facing, Facing::Left);
        assert_approx_eq!(state.position.x, -MOVE_SPEED * DT, 1e-9);
        assert_approx_eq!(state.position.y, -MOVE_SPEED * DT, 1e-9);
    }

    #[test]
    fn test_opposite_directions_cancel() {
        let mut player = LocalPlayer::new(Position::new(10.0, 10.0));
        player.apply_input(
            InputState {
                up: true,
                down: true,
                ..Default::default()
            },
            DT,
        );

        let state = player.state();
        assert_approx_eq!(state.position.y, 10.0, 1e-9);
        assert_eq!(state.facing, Facing::Down);
        assert!(state.is_moving);
    }

    #[test]
    fn test_stopping_clears_moving_flag() {
        let mut player = LocalPlayer::new(Position::default());
        player.apply_input(
            InputState {
                down: true,
                ..Default::default()
            },
            DT,
        );
        player.apply_input(InputState::default(), DT);

        let state = player.state();
        assert!(!state.is_moving);
        assert_eq!(state.facing, Facing::Down);
    }
}
