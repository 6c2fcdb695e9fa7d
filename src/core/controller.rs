/// Input button identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    PlayerOneUp,
    PlayerOneDown,
    PlayerTwoUp,
    PlayerTwoDown,
    /// Quits once a player has won
    Start,
    Escape,
    /// Ball speed presets 1 through 5
    Speed1,
    Speed2,
    Speed3,
    Speed4,
    Speed5,
}

impl Button {
    /// Ball speed selected by this button, if it is a speed preset
    pub fn ball_speed(self) -> Option<i32> {
        match self {
            Button::Speed1 => Some(1),
            Button::Speed2 => Some(2),
            Button::Speed3 => Some(3),
            Button::Speed4 => Some(4),
            Button::Speed5 => Some(5),
            _ => None,
        }
    }
}

/// Controller - handles button input states
pub trait Controller {
    /// Check if button is currently down
    fn is_down(&self, button: Button) -> bool;

    /// Get all currently pressed buttons
    fn get_down_keys(&self) -> &[Button];
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_button_hash() {
        let mut set = HashSet::new();
        set.insert(Button::PlayerOneUp);
        set.insert(Button::PlayerTwoDown);
        set.insert(Button::PlayerOneUp);

        assert!(set.contains(&Button::PlayerOneUp));
        assert!(!set.contains(&Button::Start));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_speed_presets() {
        assert_eq!(Button::Speed1.ball_speed(), Some(1));
        assert_eq!(Button::Speed5.ball_speed(), Some(5));
        assert_eq!(Button::Start.ball_speed(), None);
    }

    struct MockController {
        pressed: Vec<Button>,
    }

    impl Controller for MockController {
        fn is_down(&self, button: Button) -> bool {
            self.pressed.contains(&button)
        }

        fn get_down_keys(&self) -> &[Button] {
            &self.pressed
        }
    }

    #[test]
    fn test_controller_is_down() {
        let controller = MockController {
            pressed: vec![Button::PlayerOneUp, Button::Speed3],
        };

        assert!(controller.is_down(Button::PlayerOneUp));
        assert!(controller.is_down(Button::Speed3));
        assert!(!controller.is_down(Button::PlayerTwoUp));
        assert_eq!(controller.get_down_keys().len(), 2);
    }
}
