//! Pointer and keyboard input that is not consumed by the orbit controller.

use winit::{
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, KeyEvent, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use crate::{animation::AnimationCommand, config::AnimationSettings};

/// Last known pointer position in normalized device coordinates.
///
/// `x` grows to the right and `y` grows upwards, both in `[-1, 1]` while the
/// pointer is inside the window. The value is kept when the pointer leaves.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerState {
    pub x: f32,
    pub y: f32,
}

impl PointerState {
    pub fn update(&mut self, position: PhysicalPosition<f64>, window: PhysicalSize<u32>) {
        let width = window.width.max(1) as f64;
        let height = window.height.max(1) as f64;
        self.x = (position.x / width * 2.0 - 1.0) as f32;
        self.y = (-(position.y / height) * 2.0 + 1.0) as f32;
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent, window: PhysicalSize<u32>) {
        if let WindowEvent::CursorMoved { position, .. } = event {
            self.update(*position, window);
        }
    }
}

/// Translates key presses into animation commands.
pub fn command_for_key(event: &KeyEvent, settings: &AnimationSettings) -> Option<AnimationCommand> {
    if event.state != ElementState::Pressed {
        return None;
    }
    let PhysicalKey::Code(code) = event.physical_key else {
        return None;
    };
    command_for_code(code, event.repeat, settings)
}

fn command_for_code(
    code: KeyCode,
    repeat: bool,
    settings: &AnimationSettings,
) -> Option<AnimationCommand> {
    match code {
        KeyCode::Space if !repeat => Some(AnimationCommand::Toggle),
        KeyCode::KeyC if !repeat => Some(AnimationCommand::CycleTextures),
        KeyCode::ArrowUp => Some(AnimationCommand::NudgeTransition(settings.transition_step)),
        KeyCode::ArrowDown => Some(AnimationCommand::NudgeTransition(-settings.transition_step)),
        KeyCode::ArrowRight => Some(AnimationCommand::NudgeStrength(settings.strength_step)),
        KeyCode::ArrowLeft => Some(AnimationCommand::NudgeStrength(-settings.strength_step)),
        _ => None,
    }
}
