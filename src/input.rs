use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Extracts the key from a key-press window event.
///
/// Auto-repeat presses count, so holding a key keeps stepping its joint. Releases,
/// keys without a known code, and every other event yield `None`. So do synthetic
/// presses, which winit sends for keys already held when the window gains focus.
pub fn key_press(event: &WindowEvent) -> Option<KeyCode> {
    match event {
        WindowEvent::KeyboardInput {
            event,
            is_synthetic,
            ..
        } => pressed_key(event.physical_key, event.state, *is_synthetic),
        _ => None,
    }
}

fn pressed_key(key: PhysicalKey, state: ElementState, synthetic: bool) -> Option<KeyCode> {
    match (key, state) {
        (PhysicalKey::Code(code), ElementState::Pressed) if !synthetic => Some(code),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::NativeKeyCode;

    #[test]
    fn presses_yield_their_key() {
        assert_eq!(
            pressed_key(PhysicalKey::Code(KeyCode::ArrowLeft), ElementState::Pressed, false),
            Some(KeyCode::ArrowLeft)
        );
    }

    #[test]
    fn releases_are_ignored() {
        assert_eq!(
            pressed_key(PhysicalKey::Code(KeyCode::KeyZ), ElementState::Released, false),
            None
        );
    }

    #[test]
    fn synthetic_presses_on_focus_are_ignored() {
        assert_eq!(
            pressed_key(PhysicalKey::Code(KeyCode::ArrowRight), ElementState::Pressed, true),
            None
        );
    }

    #[test]
    fn unidentified_keys_are_ignored() {
        let key = PhysicalKey::Unidentified(NativeKeyCode::Unidentified);
        assert_eq!(pressed_key(key, ElementState::Pressed, false), None);
    }

    #[test]
    fn other_events_are_ignored() {
        assert_eq!(key_press(&WindowEvent::CloseRequested), None);
        assert_eq!(key_press(&WindowEvent::RedrawRequested), None);
    }
}
