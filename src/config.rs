use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;

use crate::detect::Detection;

const DEFAULT_SCAN_STRIDE: u32 = 10;
const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.7;
const DEFAULT_PRE_ROLL_SECS: f64 = 2.0;
const DEFAULT_POST_ROLL_SECS: f64 = 2.0;
const DEFAULT_TARGET_CLASSES: &[u32] = &[0];

#[derive(Debug, Deserialize, Default)]
struct ClipConfigFile {
    scan_stride: Option<u32>,
    confidence_threshold: Option<f32>,
    pre_roll_seconds: Option<f64>,
    post_roll_seconds: Option<f64>,
    target_classes: Option<Vec<u32>>,
}

/// Run configuration shared by both scanning variants.
#[derive(Debug, Clone)]
pub struct ClipConfig {
    /// In sparse scan, submit every Nth frame to the detector.
    pub scan_stride: u32,
    /// Detections at or below this confidence never qualify.
    pub confidence_threshold: f32,
    /// Seconds of context captured before a triggering detection.
    pub pre_roll_seconds: f64,
    /// Seconds of context captured after the last qualifying detection.
    pub post_roll_seconds: f64,
    /// Class ids that can trigger or be drawn.
    pub target_classes: Vec<u32>,
}

impl Default for ClipConfig {
    fn default() -> Self {
        Self {
            scan_stride: DEFAULT_SCAN_STRIDE,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            pre_roll_seconds: DEFAULT_PRE_ROLL_SECS,
            post_roll_seconds: DEFAULT_POST_ROLL_SECS,
            target_classes: DEFAULT_TARGET_CLASSES.to_vec(),
        }
    }
}

impl ClipConfig {
    /// Load configuration: defaults, then the `CLIPSCAN_CONFIG` file if set,
    /// then environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("CLIPSCAN_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: ClipConfigFile) -> Self {
        Self {
            scan_stride: file.scan_stride.unwrap_or(DEFAULT_SCAN_STRIDE),
            confidence_threshold: file
                .confidence_threshold
                .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD),
            pre_roll_seconds: file.pre_roll_seconds.unwrap_or(DEFAULT_PRE_ROLL_SECS),
            post_roll_seconds: file.post_roll_seconds.unwrap_or(DEFAULT_POST_ROLL_SECS),
            target_classes: file
                .target_classes
                .unwrap_or_else(|| DEFAULT_TARGET_CLASSES.to_vec()),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(stride) = std::env::var("CLIPSCAN_STRIDE") {
            self.scan_stride = stride
                .parse()
                .map_err(|_| anyhow!("CLIPSCAN_STRIDE must be an integer"))?;
        }
        if let Ok(threshold) = std::env::var("CLIPSCAN_CONFIDENCE") {
            self.confidence_threshold = threshold
                .parse()
                .map_err(|_| anyhow!("CLIPSCAN_CONFIDENCE must be a float"))?;
        }
        if let Ok(secs) = std::env::var("CLIPSCAN_PRE_ROLL_SECS") {
            self.pre_roll_seconds = secs
                .parse()
                .map_err(|_| anyhow!("CLIPSCAN_PRE_ROLL_SECS must be a number of seconds"))?;
        }
        if let Ok(secs) = std::env::var("CLIPSCAN_POST_ROLL_SECS") {
            self.post_roll_seconds = secs
                .parse()
                .map_err(|_| anyhow!("CLIPSCAN_POST_ROLL_SECS must be a number of seconds"))?;
        }
        if let Ok(classes) = std::env::var("CLIPSCAN_TARGET_CLASSES") {
            let parsed = parse_class_list(&classes)?;
            if !parsed.is_empty() {
                self.target_classes = parsed;
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.scan_stride == 0 {
            return Err(anyhow!("scan_stride must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(anyhow!("confidence_threshold must be within [0, 1]"));
        }
        if self.pre_roll_seconds < 0.0 || self.post_roll_seconds < 0.0 {
            return Err(anyhow!("pre/post roll seconds must be non-negative"));
        }
        if self.target_classes.is_empty() {
            return Err(anyhow!("at least one target class is required"));
        }
        Ok(())
    }

    /// Frames owed to the pre-roll window at the given frame rate.
    pub fn pre_roll_frames(&self, fps: f64) -> u64 {
        (fps * self.pre_roll_seconds).floor().max(0.0) as u64
    }

    /// Frames owed to the post-roll window at the given frame rate.
    pub fn post_roll_frames(&self, fps: f64) -> u64 {
        (fps * self.post_roll_seconds).floor().max(0.0) as u64
    }

    /// A detection qualifies when it clears the confidence threshold and its
    /// class is targeted.
    pub fn is_qualifying(&self, detection: &Detection) -> bool {
        detection.confidence > self.confidence_threshold
            && self.target_classes.contains(&detection.class_id)
    }

    /// True when any detection in the slice qualifies.
    pub fn any_qualifying(&self, detections: &[Detection]) -> bool {
        detections.iter().any(|d| self.is_qualifying(d))
    }
}

fn read_config_file(path: &Path) -> Result<ClipConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

fn parse_class_list(value: &str) -> Result<Vec<u32>> {
    value
        .split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry
                .parse()
                .map_err(|_| anyhow!("invalid class id '{}' in class list", entry))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::BoundingBox;

    fn detection(class_id: u32, confidence: f32) -> Detection {
        Detection::new(
            class_id,
            confidence,
            BoundingBox {
                cx: 0.0,
                cy: 0.0,
                w: 1.0,
                h: 1.0,
            },
        )
    }

    #[test]
    fn defaults_match_recognized_options() {
        let cfg = ClipConfig::default();
        assert_eq!(cfg.scan_stride, 10);
        assert_eq!(cfg.confidence_threshold, 0.7);
        assert_eq!(cfg.pre_roll_seconds, 2.0);
        assert_eq!(cfg.post_roll_seconds, 2.0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn roll_windows_floor_to_whole_frames() {
        let cfg = ClipConfig::default();
        assert_eq!(cfg.pre_roll_frames(30.0), 60);
        assert_eq!(cfg.pre_roll_frames(29.97), 59);
        assert_eq!(cfg.post_roll_frames(0.0), 0);
    }

    #[test]
    fn qualifying_requires_threshold_and_class() {
        let cfg = ClipConfig {
            target_classes: vec![3, 4, 5],
            ..ClipConfig::default()
        };
        assert!(cfg.is_qualifying(&detection(4, 0.9)));
        // Threshold is strict: exactly 0.7 does not qualify.
        assert!(!cfg.is_qualifying(&detection(4, 0.7)));
        assert!(!cfg.is_qualifying(&detection(1, 0.9)));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut cfg = ClipConfig::default();
        cfg.scan_stride = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = ClipConfig::default();
        cfg.confidence_threshold = 1.5;
        assert!(cfg.validate().is_err());

        let mut cfg = ClipConfig::default();
        cfg.target_classes.clear();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn class_list_parsing() {
        assert_eq!(parse_class_list("3, 4,5").unwrap(), vec![3, 4, 5]);
        assert!(parse_class_list("3,x").is_err());
    }
}
