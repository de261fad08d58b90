//! Theme value handed to the rendered navigator.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub dark: bool,
    pub colors: ThemeColors,
}

/// Colors as `#rrggbb` / `rgb(...)` strings, passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeColors {
    pub primary: String,
    pub background: String,
    pub card: String,
    pub text: String,
    pub border: String,
}

impl Theme {
    pub fn light() -> Self {
        Self {
            dark: false,
            colors: ThemeColors {
                primary: "rgb(0, 122, 255)".into(),
                background: "rgb(242, 242, 242)".into(),
                card: "rgb(255, 255, 255)".into(),
                text: "rgb(28, 28, 30)".into(),
                border: "rgb(216, 216, 216)".into(),
            },
        }
    }

    pub fn dark() -> Self {
        Self {
            dark: true,
            colors: ThemeColors {
                primary: "rgb(10, 132, 255)".into(),
                background: "rgb(1, 1, 1)".into(),
                card: "rgb(18, 18, 18)".into(),
                text: "rgb(229, 229, 231)".into(),
                border: "rgb(39, 39, 41)".into(),
            },
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_light() {
        assert!(!Theme::default().dark);
        assert!(Theme::dark().dark);
    }

    #[test]
    fn deserializes_from_json() {
        let theme: Theme = serde_json::from_value(serde_json::to_value(Theme::dark()).unwrap()).unwrap();
        assert_eq!(theme, Theme::dark());
    }
}
