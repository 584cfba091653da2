use serde::{Deserialize, Serialize};

/// Which interval of the Pomodoro cycle a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    Focus,
    ShortBreak,
    LongBreak,
}

impl Mode {
    pub fn is_break(self) -> bool {
        !matches!(self, Mode::Focus)
    }

    /// Wire name, as stored in the persisted snapshot.
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Focus => "focus",
            Mode::ShortBreak => "shortBreak",
            Mode::LongBreak => "longBreak",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::Focus => "Focus",
            Mode::ShortBreak => "Short Break",
            Mode::LongBreak => "Long Break",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_camel_case() {
        assert_eq!(serde_json::to_string(&Mode::ShortBreak).unwrap(), "\"shortBreak\"");
        let m: Mode = serde_json::from_str("\"longBreak\"").unwrap();
        assert_eq!(m, Mode::LongBreak);
        assert_eq!(Mode::Focus.as_str(), "focus");
    }

    #[test]
    fn breaks_are_breaks() {
        assert!(!Mode::Focus.is_break());
        assert!(Mode::ShortBreak.is_break());
        assert!(Mode::LongBreak.is_break());
    }
}
