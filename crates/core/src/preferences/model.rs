//! Accessibility preference values

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Colour theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Theme {
    #[default]
    Default,
    HighContrast,
    Dark,
    Dyslexia,
}

impl Theme {
    pub const ALL: [Theme; 4] = [Self::Default, Self::HighContrast, Self::Dark, Self::Dyslexia];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::HighContrast => "high-contrast",
            Self::Dark => "dark",
            Self::Dyslexia => "dyslexia",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == value.trim())
            .ok_or_else(|| Error::validation("theme", format!("unsupported theme '{}'", value)))
    }
}

/// Font scale applied to the document root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontScale {
    #[default]
    Normal,
    Large,
    XLarge,
}

impl FontScale {
    pub const ALL: [FontScale; 3] = [Self::Normal, Self::Large, Self::XLarge];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Large => "large",
            Self::XLarge => "xlarge",
        }
    }
}

impl fmt::Display for FontScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FontScale {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str() == value.trim())
            .ok_or_else(|| {
                Error::validation("fontSize", format!("unsupported font size '{}'", value))
            })
    }
}

/// Parse a stored boolean; only `true` and `false` are accepted
pub fn parse_flag(field: &'static str, value: &str) -> Result<bool, Error> {
    match value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(Error::validation(field, format!("expected true or false, got '{}'", other))),
    }
}

/// Snapshot of the accessibility settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub theme: Theme,
    pub font_size: FontScale,
    pub reduced_motion: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let prefs = Preferences::default();
        assert_eq!(prefs.theme, Theme::Default);
        assert_eq!(prefs.font_size, FontScale::Normal);
        assert!(!prefs.reduced_motion);
    }

    #[test]
    fn test_parse_values() {
        assert_eq!("high-contrast".parse::<Theme>().unwrap(), Theme::HighContrast);
        assert_eq!("xlarge".parse::<FontScale>().unwrap(), FontScale::XLarge);
        assert!("neon".parse::<Theme>().is_err());
        assert!("huge".parse::<FontScale>().is_err());
        assert!(parse_flag("reducedMotion", "true").unwrap());
        assert!(parse_flag("reducedMotion", "1").is_err());
    }

    #[test]
    fn test_serialized_shape() {
        let prefs = Preferences {
            theme: Theme::HighContrast,
            font_size: FontScale::XLarge,
            reduced_motion: true,
        };
        assert_eq!(
            serde_json::to_value(prefs).unwrap(),
            serde_json::json!({
                "theme": "high-contrast",
                "fontSize": "xlarge",
                "reducedMotion": true
            })
        );
    }
}
