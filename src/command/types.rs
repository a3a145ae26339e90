//! Directional commands and the inputs that produce them.

use std::fmt;

/// One step request for the pointing servos. Sent as a bare text frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    XPlus,
    XMinus,
    YPlus,
    YMinus,
}

impl Command {
    /// Wire token for this command.
    pub fn token(self) -> &'static str {
        match self {
            Command::XPlus => "X+",
            Command::XMinus => "X-",
            Command::YPlus => "Y+",
            Command::YMinus => "Y-",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// On-screen jog buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JogButton {
    XPlus,
    XMinus,
    YPlus,
    YMinus,
}

/// Keyboard arrows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowKey {
    Up,
    Down,
    Left,
    Right,
}

/// A discrete operator input that maps to exactly one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JogInput {
    Button(JogButton),
    Key(ArrowKey),
}

impl From<JogButton> for Command {
    fn from(button: JogButton) -> Self {
        match button {
            JogButton::XPlus => Command::XPlus,
            JogButton::XMinus => Command::XMinus,
            JogButton::YPlus => Command::YPlus,
            JogButton::YMinus => Command::YMinus,
        }
    }
}

impl From<ArrowKey> for Command {
    fn from(key: ArrowKey) -> Self {
        match key {
            ArrowKey::Up => Command::YPlus,
            ArrowKey::Down => Command::YMinus,
            ArrowKey::Left => Command::XMinus,
            ArrowKey::Right => Command::XPlus,
        }
    }
}

impl From<JogInput> for Command {
    fn from(input: JogInput) -> Self {
        match input {
            JogInput::Button(button) => button.into(),
            JogInput::Key(key) => key.into(),
        }
    }
}

/// Command channel connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Connecting,
    Open,
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Connecting => write!(f, "Connecting"),
            ConnectionState::Open => write!(f, "Open"),
            ConnectionState::Closed => write!(f, "Closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrow_keys_map_without_cross_mapping() {
        assert_eq!(Command::from(ArrowKey::Up), Command::YPlus);
        assert_eq!(Command::from(ArrowKey::Down), Command::YMinus);
        assert_eq!(Command::from(ArrowKey::Left), Command::XMinus);
        assert_eq!(Command::from(ArrowKey::Right), Command::XPlus);
    }

    #[test]
    fn every_input_maps_to_exactly_one_token() {
        let expected = [
            (JogInput::Button(JogButton::XPlus), "X+"),
            (JogInput::Button(JogButton::XMinus), "X-"),
            (JogInput::Button(JogButton::YPlus), "Y+"),
            (JogInput::Button(JogButton::YMinus), "Y-"),
            (JogInput::Key(ArrowKey::Right), "X+"),
            (JogInput::Key(ArrowKey::Left), "X-"),
            (JogInput::Key(ArrowKey::Up), "Y+"),
            (JogInput::Key(ArrowKey::Down), "Y-"),
        ];
        for (input, token) in expected {
            assert_eq!(Command::from(input).token(), token, "{:?}", input);
        }
    }
}
