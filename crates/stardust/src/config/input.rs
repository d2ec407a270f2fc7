//! Supporting user-defined keybindings.

/// The user config for defining keybindings.
#[derive(serde::Serialize, serde::Deserialize, PartialEq, Eq, Debug, Clone)]
pub struct KeybindingConfigRaw {
    /// The modifier keys, like `CTRL`, `SHIFT`, etc.
    pub mods: Option<String>,
    /// The actual key, like a 'x' or `PageUp`.
    pub key: String,
}

/// All the possible actions a user can trigger in Stardust.
#[derive(serde::Serialize, serde::Deserialize, PartialEq, Eq, Debug, Clone, Copy, Hash)]
#[serde(rename_all = "snake_case")]
pub enum KeybindingAction {
    /// Raise the target number of particles.
    ParticlesMore,
    /// Lower the target number of particles.
    ParticlesFewer,
    /// Strengthen the pointer's gravity.
    GravityUp,
    /// Weaken the pointer's gravity.
    GravityDown,
    /// Make particles move faster.
    SpeedUp,
    /// Make particles move slower.
    SpeedDown,
    /// Switch to the next colour scheme.
    CycleColourMode,
    /// Switch between attracting and repelling.
    ToggleForceMode,
    /// Remove every particle.
    ClearParticles,
    /// Show or hide the settings panel.
    TogglePanel,
    /// Exit Stardust.
    Quit,
}

/// All the active user-configured keybindings.
pub type KeybindingsRaw = std::collections::HashMap<KeybindingAction, KeybindingConfigRaw>;

/// The user keybindings converted to native `termwiz::input::KeyEvent`s.
pub type KeybindingsAsEvents = std::collections::HashMap<KeybindingAction, termwiz::input::KeyEvent>;

impl TryFrom<KeybindingConfigRaw> for termwiz::input::KeyEvent {
    type Error = std::io::Error;

    /// `termwiz::input::KeyEvent` doesn't have an `impl From<String>` but it does derive
    /// `serde::Deserialize`, so we build a tiny TOML document and let the `toml` crate do the
    /// work. It saves manually mapping all the keycodes and modifiers.
    fn try_from(binding: KeybindingConfigRaw) -> std::result::Result<Self, Self::Error> {
        let key = if binding.key.chars().count() == 1 {
            format!("{{ Char = \"{}\" }}", binding.key)
        } else {
            format!("\"{}\"", binding.key)
        };

        let config = format!(
            "
                modifiers = {{ bits = 0 }}
                key = {key}
            ",
        );

        let mut key_event = toml::from_str::<Self>(&config).map_err(|error| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Couldn't parse keybinding ({binding:?}): {}", error.message()),
            )
        })?;

        if let Some(modifiers) = binding.mods {
            key_event.modifiers = modifiers.try_into().map_err(|error| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("Couldn't parse keybinding modifier: {error:?}"),
                )
            })?;
        }

        Ok(key_event)
    }
}

/// Find the action, if any, that a key press triggers.
///
/// Terminals differ about whether a shifted character like `+` or `G` also reports the `SHIFT`
/// modifier, so for character keys a stray `SHIFT` is ignored.
#[must_use]
pub fn find_action(
    keybindings: &KeybindingsAsEvents,
    pressed: &termwiz::input::KeyEvent,
) -> Option<KeybindingAction> {
    use termwiz::input::{KeyCode, Modifiers};

    let is_match = |binding: &termwiz::input::KeyEvent| {
        if binding.key != pressed.key {
            return false;
        }
        if binding.modifiers == pressed.modifiers {
            return true;
        }
        matches!(pressed.key, KeyCode::Char(_))
            && binding.modifiers == pressed.modifiers.difference(Modifiers::SHIFT)
    };

    keybindings
        .iter()
        .filter(|(_, binding)| is_match(binding))
        .map(|(action, _)| *action)
        .min_by_key(|action| format!("{action:?}"))
}

#[cfg(test)]
mod test {
    use super::*;

    fn run(config: &str) -> termwiz::input::KeyEvent {
        let parsed: KeybindingConfigRaw = toml::from_str(config).unwrap();
        parsed.try_into().unwrap()
    }

    fn key(character: char, modifiers: termwiz::input::Modifiers) -> termwiz::input::KeyEvent {
        termwiz::input::KeyEvent {
            modifiers,
            key: termwiz::input::KeyCode::Char(character),
        }
    }

    #[test]
    fn keybinding_plus() {
        let config = r#"
            key = "+"
        "#;
        assert_eq!(run(config), key('+', termwiz::input::Modifiers::NONE));
    }

    #[test]
    fn keybinding_capital_g() {
        let config = r#"
            key = "G"
        "#;
        assert_eq!(run(config), key('G', termwiz::input::Modifiers::NONE));
    }

    #[test]
    fn keybinding_escape() {
        let config = r#"
            key = "Escape"
        "#;
        let expected = termwiz::input::KeyEvent {
            modifiers: termwiz::input::Modifiers::NONE,
            key: termwiz::input::KeyCode::Escape,
        };
        assert_eq!(run(config), expected);
    }

    #[test]
    fn keybinding_ctrl_c() {
        let config = r#"
            mods = "CTRL"
            key = "c"
        "#;
        assert_eq!(run(config), key('c', termwiz::input::Modifiers::CTRL));
    }

    #[test]
    fn keybinding_ctrl_shift_x() {
        let config = r#"
            mods = "CTRL|SHIFT"
            key = "x"
        "#;
        assert_eq!(
            run(config),
            key(
                'x',
                termwiz::input::Modifiers::CTRL | termwiz::input::Modifiers::SHIFT
            )
        );
    }

    #[test]
    fn unknown_key_is_an_error() {
        let binding = KeybindingConfigRaw {
            mods: None,
            key: "NotAKey".into(),
        };
        let result: Result<termwiz::input::KeyEvent, _> = binding.try_into();
        assert!(result.is_err());
    }

    #[test]
    fn finding_actions() {
        let mut keybindings = KeybindingsAsEvents::new();
        keybindings.insert(
            KeybindingAction::GravityUp,
            key('G', termwiz::input::Modifiers::NONE),
        );
        keybindings.insert(
            KeybindingAction::Quit,
            key('c', termwiz::input::Modifiers::CTRL),
        );

        assert_eq!(
            find_action(&keybindings, &key('G', termwiz::input::Modifiers::NONE)),
            Some(KeybindingAction::GravityUp)
        );
        assert_eq!(
            find_action(&keybindings, &key('G', termwiz::input::Modifiers::SHIFT)),
            Some(KeybindingAction::GravityUp)
        );
        assert_eq!(
            find_action(&keybindings, &key('c', termwiz::input::Modifiers::CTRL)),
            Some(KeybindingAction::Quit)
        );
        assert_eq!(
            find_action(&keybindings, &key('c', termwiz::input::Modifiers::NONE)),
            None
        );
    }
}
