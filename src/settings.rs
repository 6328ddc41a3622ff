//! Runtime settings
//!
//! Selects the simulation step for the device class. Persisting settings
//! is left to the host page.

use serde::{Deserialize, Serialize};

use crate::consts::{DESKTOP_TIME_STEP_MS, MAX_UPDATES, MOBILE_TIME_STEP_MS};
use crate::tuning::TuningError;

/// Device class the game is running on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Platform {
    #[default]
    Desktop,
    Mobile,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Desktop => "Desktop",
            Platform::Mobile => "Mobile",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "desktop" | "pc" => Some(Platform::Desktop),
            "mobile" | "phone" | "tablet" => Some(Platform::Mobile),
            _ => None,
        }
    }

    /// Guess the platform from a browser user agent string
    pub fn from_user_agent(ua: &str) -> Self {
        let ua = ua.to_lowercase();
        if ["android", "iphone", "ipad", "mobile"].iter().any(|m| ua.contains(m)) {
            Platform::Mobile
        } else {
            Platform::Desktop
        }
    }

    /// Fixed simulation step in milliseconds
    pub fn time_step_ms(&self) -> f64 {
        match self {
            Platform::Desktop => DESKTOP_TIME_STEP_MS,
            Platform::Mobile => MOBILE_TIME_STEP_MS,
        }
    }
}

/// Loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub platform: Platform,
    /// Maximum simulation updates per render callback
    pub max_updates: u32,
    /// Run seed; `None` lets the host pick one
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            platform: Platform::Desktop,
            max_updates: MAX_UPDATES,
            seed: None,
        }
    }
}

impl Settings {
    pub fn for_platform(platform: Platform) -> Self {
        Self {
            platform,
            ..Self::default()
        }
    }

    pub fn time_step_ms(&self) -> f64 {
        self.platform.time_step_ms()
    }

    /// Parse settings JSON (missing fields take defaults)
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        if self.max_updates == 0 {
            return Err(TuningError::Invalid {
                field: "max_updates",
                reason: "must be > 0".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mobile_runs_half_rate() {
        let desktop = Platform::Desktop.time_step_ms();
        let mobile = Platform::Mobile.time_step_ms();
        assert!((mobile - desktop * 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_user_agent_detection() {
        let ua = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)";
        assert_eq!(Platform::from_user_agent(ua), Platform::Mobile);
        let ua = "Mozilla/5.0 (X11; Linux x86_64) Gecko/20100101 Firefox/130.0";
        assert_eq!(Platform::from_user_agent(ua), Platform::Desktop);
    }

    #[test]
    fn test_settings_json() {
        let s = Settings::from_json(r#"{ "platform": "Mobile", "seed": 7 }"#).unwrap();
        assert_eq!(s.platform, Platform::Mobile);
        assert_eq!(s.max_updates, MAX_UPDATES);
        assert_eq!(s.seed, Some(7));
        assert!(Settings::from_json(r#"{ "max_updates": 0 }"#).is_err());
    }

    #[test]
    fn test_from_str() {
        assert_eq!(Platform::from_str("Mobile"), Some(Platform::Mobile));
        assert_eq!(Platform::from_str("pc"), Some(Platform::Desktop));
        assert_eq!(Platform::from_str("toaster"), None);
    }
}
