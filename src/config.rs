//! Render configuration: palette, theme and image geometry.
//!
//! Stored as an optional JSON file; every field may be omitted:
//! ```json
//! {
//!   "theme": "dark",
//!   "width": 2000,
//!   "height": 1500,
//!   "state_colors": { "NORMAL": "#3498db", "ALERT_CLOSE": "#e74c3c" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{AnalysisError, Result};

/// An sRGB color written as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl FromStr for Rgb {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AnalysisError::Config(format!("invalid color \"{s}\"")));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| AnalysisError::Config(format!("invalid color \"{s}\"")))
        };
        Ok(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn background(&self) -> Rgb {
        match self {
            Theme::Light => Rgb(255, 255, 255),
            Theme::Dark => Rgb(17, 17, 17),
        }
    }

    pub fn foreground(&self) -> Rgb {
        match self {
            Theme::Light => Rgb(33, 33, 33),
            Theme::Dark => Rgb(230, 230, 230),
        }
    }

    pub fn grid(&self) -> Rgb {
        match self {
            Theme::Light => Rgb(220, 220, 220),
            Theme::Dark => Rgb(60, 60, 60),
        }
    }
}

/// Everything the renderers need besides the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub theme: Theme,
    pub histogram_bins: usize,
    pub distance_color: String,
    pub reflectance_color: String,
    pub density_color: String,
    /// Colors for known state labels.
    pub state_colors: BTreeMap<String, String>,
    /// Cycled through, in first-appearance order, for labels without an entry.
    pub fallback_palette: Vec<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let state_colors = [
            ("NORMAL", "#3498db"),
            ("OBJECT_DETECTED", "#2ecc71"),
            ("ALERT_CLOSE", "#e74c3c"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        RenderConfig {
            width: 2000,
            height: 1500,
            theme: Theme::Light,
            histogram_bins: 30,
            distance_color: "#1f77b4".to_string(),
            reflectance_color: "#2ca02c".to_string(),
            density_color: "#d62728".to_string(),
            state_colors,
            fallback_palette: ["#9b59b6", "#f39c12", "#1abc9c", "#e67e22", "#7f8c8d"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl RenderConfig {
    /// Loads the config from a JSON file at `path` and validates it.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AnalysisError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: RenderConfig = serde_json::from_str(&content)
            .map_err(|e| AnalysisError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(AnalysisError::Config("image size must be non-zero".into()));
        }
        if self.histogram_bins == 0 {
            return Err(AnalysisError::Config("histogram_bins must be non-zero".into()));
        }
        if self.fallback_palette.is_empty() {
            return Err(AnalysisError::Config("fallback_palette must not be empty".into()));
        }
        for color in [&self.distance_color, &self.reflectance_color, &self.density_color]
            .into_iter()
            .chain(self.state_colors.values())
            .chain(self.fallback_palette.iter())
        {
            color.parse::<Rgb>()?;
        }
        Ok(())
    }

    pub fn distance_rgb(&self) -> Rgb {
        parse_or(&self.distance_color, Rgb(31, 119, 180))
    }

    pub fn reflectance_rgb(&self) -> Rgb {
        parse_or(&self.reflectance_color, Rgb(44, 160, 44))
    }

    pub fn density_rgb(&self) -> Rgb {
        parse_or(&self.density_color, Rgb(214, 39, 40))
    }

    /// One color per label of `states`, in the same order.
    pub fn state_palette(&self, states: &[&str]) -> Vec<Rgb> {
        let mut next_fallback = 0;
        states
            .iter()
            .map(|state| match self.state_colors.get(*state) {
                Some(hex) => parse_or(hex, Rgb(128, 128, 128)),
                None => {
                    let hex = self
                        .fallback_palette
                        .get(next_fallback % self.fallback_palette.len().max(1));
                    next_fallback += 1;
                    hex.map(|h| parse_or(h, Rgb(128, 128, 128)))
                        .unwrap_or(Rgb(128, 128, 128))
                }
            })
            .collect()
    }
}

fn parse_or(hex: &str, fallback: Rgb) -> Rgb {
    hex.parse().unwrap_or(fallback)
}
