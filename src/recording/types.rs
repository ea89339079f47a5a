//! Recording workflow types

use crate::config_store::UserId;
use crate::error::{Error, Result};
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Fallback when the probe tool gives nothing usable
pub const DEFAULT_WIDTH: u32 = 1920;
pub const DEFAULT_HEIGHT: u32 = 1080;

/// Selectable clip length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DurationBucket {
    Seconds5,
    Seconds15,
    Seconds30,
    Minute,
}

impl DurationBucket {
    /// Buckets in the order they are offered
    pub const ALL: [DurationBucket; 4] = [
        DurationBucket::Seconds5,
        DurationBucket::Seconds15,
        DurationBucket::Seconds30,
        DurationBucket::Minute,
    ];

    /// Label shown on the choice ("05", "15", "30", "60")
    pub fn label(&self) -> &'static str {
        match self {
            DurationBucket::Seconds5 => "05",
            DurationBucket::Seconds15 => "15",
            DurationBucket::Seconds30 => "30",
            DurationBucket::Minute => "60",
        }
    }

    /// Capture tool duration bound (HH:MM:SS)
    pub fn time_arg(&self) -> &'static str {
        match self {
            DurationBucket::Seconds5 => "00:00:05",
            DurationBucket::Seconds15 => "00:00:15",
            DurationBucket::Seconds30 => "00:00:30",
            DurationBucket::Minute => "00:01:00",
        }
    }

    pub fn seconds(&self) -> u64 {
        match self {
            DurationBucket::Seconds5 => 5,
            DurationBucket::Seconds15 => 15,
            DurationBucket::Seconds30 => 30,
            DurationBucket::Minute => 60,
        }
    }
}

impl FromStr for DurationBucket {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "05" | "5" => Ok(DurationBucket::Seconds5),
            "15" => Ok(DurationBucket::Seconds15),
            "30" => Ok(DurationBucket::Seconds30),
            "60" => Ok(DurationBucket::Minute),
            other => Err(Error::Validation(format!("unknown duration bucket: {}", other))),
        }
    }
}

impl fmt::Display for DurationBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for DurationBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Video resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Per-user recording workflow state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingState {
    Idle,
    CameraSelected,
    DurationSelected,
    Capturing,
    Probing,
    Delivering,
    Done,
    Failed,
}

impl RecordingState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RecordingState::Done | RecordingState::Failed)
    }
}

/// One capture → probe → deliver run
#[derive(Debug, Clone)]
pub struct RecordingJob {
    pub user_id: UserId,
    pub tag: String,
    pub camera_name: String,
    pub stream_url: String,
    pub bucket: DurationBucket,
    /// Deterministic temp file (user + stream hash)
    pub output_path: PathBuf,
}

/// Terminal result of a recording job
#[derive(Debug, Clone, Serialize)]
pub struct RecordingOutcome {
    pub user_id: UserId,
    pub tag: String,
    pub bucket: DurationBucket,
    /// Done or Failed
    pub state: RecordingState,
    /// Stage that failed (None when Done)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<RecordingState>,
    /// Delivery attempts made
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RecordingOutcome {
    pub fn is_done(&self) -> bool {
        self.state == RecordingState::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_time_args() {
        assert_eq!(DurationBucket::Seconds5.time_arg(), "00:00:05");
        assert_eq!(DurationBucket::Seconds15.time_arg(), "00:00:15");
        assert_eq!(DurationBucket::Seconds30.time_arg(), "00:00:30");
        assert_eq!(DurationBucket::Minute.time_arg(), "00:01:00");
    }

    #[test]
    fn test_bucket_parse() {
        assert_eq!("05".parse::<DurationBucket>().unwrap(), DurationBucket::Seconds5);
        assert_eq!("5".parse::<DurationBucket>().unwrap(), DurationBucket::Seconds5);
        assert_eq!("60".parse::<DurationBucket>().unwrap(), DurationBucket::Minute);
        assert!(matches!("45".parse::<DurationBucket>(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_bucket_serializes_as_label() {
        let json = serde_json::to_string(&DurationBucket::ALL).unwrap();
        assert_eq!(json, r#"["05","15","30","60"]"#);
    }

    #[test]
    fn test_default_resolution() {
        assert_eq!(Resolution::default().to_string(), "1920x1080");
    }

    #[test]
    fn test_terminal_states() {
        assert!(RecordingState::Done.is_terminal());
        assert!(RecordingState::Failed.is_terminal());
        assert!(!RecordingState::Delivering.is_terminal());
    }
}
