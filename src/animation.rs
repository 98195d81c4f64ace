//! Transition animation and the pointer follow behaviour.
//!
//! The [`AnimationController`] is the only writer of the transition material
//! state. Input handlers never touch the material: they queue
//! [`AnimationCommand`]s which the controller drains once per frame.

use std::collections::VecDeque;

use instant::Duration;

use crate::{config::AnimationSettings, input::PointerState, transition::TransitionParams};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimationState {
    Stopped,
    Running,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AnimationCommand {
    Start,
    Stop,
    Toggle,
    SetTransition(f32),
    NudgeTransition(f32),
    SetStrength(f32),
    NudgeStrength(f32),
    /// Swap texture A and B and restart the transition at `0`.
    CycleTextures,
}

/// What the material has to do after [`AnimationController::update`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnimationOutcome {
    /// The uniform values changed and must be uploaded.
    pub params_changed: bool,
    /// Texture A and B have to trade places.
    pub swap_textures: bool,
}

#[derive(Debug)]
pub struct AnimationController {
    state: AnimationState,
    commands: VecDeque<AnimationCommand>,
    speed: f32,
    time_scale: f32,
}

impl AnimationController {
    pub fn new(settings: &AnimationSettings) -> Self {
        Self {
            state: if settings.auto_animate {
                AnimationState::Running
            } else {
                AnimationState::Stopped
            },
            commands: VecDeque::new(),
            speed: settings.speed,
            time_scale: settings.time_scale,
        }
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn push(&mut self, command: AnimationCommand) {
        self.commands.push_back(command);
    }

    /// Drains the queued commands, then advances a running animation by `dt`.
    pub fn update(&mut self, params: &mut TransitionParams, dt: Duration) -> AnimationOutcome {
        let mut outcome = AnimationOutcome::default();
        while let Some(command) = self.commands.pop_front() {
            self.apply(command, params, &mut outcome);
        }

        if self.state == AnimationState::Running {
            let dt = dt.as_secs_f32();
            params.time += dt * self.time_scale;
            let next = params.transition() + dt * self.speed;
            if next >= 1.0 {
                params.set_transition(0.0);
                // Two cycles in one frame cancel out
                outcome.swap_textures = !outcome.swap_textures;
            } else {
                params.set_transition(next);
            }
            outcome.params_changed = true;
        }
        outcome
    }

    fn apply(
        &mut self,
        command: AnimationCommand,
        params: &mut TransitionParams,
        outcome: &mut AnimationOutcome,
    ) {
        match command {
            AnimationCommand::Start => self.set_state(AnimationState::Running),
            AnimationCommand::Stop => self.set_state(AnimationState::Stopped),
            AnimationCommand::Toggle => self.set_state(match self.state {
                AnimationState::Running => AnimationState::Stopped,
                AnimationState::Stopped => AnimationState::Running,
            }),
            AnimationCommand::SetTransition(value) => {
                params.set_transition(value);
                outcome.params_changed = true;
            }
            AnimationCommand::NudgeTransition(delta) => {
                params.set_transition(params.transition() + delta);
                outcome.params_changed = true;
            }
            AnimationCommand::SetStrength(value) => {
                params.set_strength(value);
                outcome.params_changed = true;
            }
            AnimationCommand::NudgeStrength(delta) => {
                params.set_strength(params.strength() + delta);
                outcome.params_changed = true;
            }
            AnimationCommand::CycleTextures => {
                params.set_transition(0.0);
                outcome.swap_textures = !outcome.swap_textures;
                outcome.params_changed = true;
            }
        }
    }

    fn set_state(&mut self, state: AnimationState) {
        if self.state != state {
            log::info!("Transition animation {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }
}

/// Eases a position towards the pointer.
#[derive(Clone, Copy, Debug)]
pub struct PointerFollow {
    /// Pointer NDC to world units.
    pub reach: f32,
    /// Seconds until roughly 63% of the remaining distance is covered.
    pub time_constant: f32,
}

impl Default for PointerFollow {
    fn default() -> Self {
        Self {
            reach: 0.5,
            time_constant: 1.0,
        }
    }
}

impl PointerFollow {
    /// Returns the new `[x, y]` after moving from `current` for `dt`.
    pub fn step(&self, current: [f32; 2], pointer: &PointerState, dt: Duration) -> [f32; 2] {
        let goal = [pointer.x * self.reach, pointer.y * self.reach];
        let alpha = 1.0 - (-dt.as_secs_f32() / self.time_constant.max(f32::EPSILON)).exp();
        [
            current[0] + (goal[0] - current[0]) * alpha,
            current[1] + (goal[1] - current[1]) * alpha,
        ]
    }
}
