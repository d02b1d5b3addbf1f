// ── Device domain types ──
//
// Shapes of the `DeviceInfo`, `DeviceState` and `IoState` stores. Every
// `Default` is the value the store holds before the first refresh.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Identity and storage of the device (`device/info`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeviceInfo {
    pub name: String,
    pub owner: String,
    pub model: String,
    pub serial_number: String,
    pub hardware_version: String,
    pub version: String,
    pub storage_stats: StorageStatistics,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Disk usage reported by the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageStatistics {
    /// Bytes available.
    pub free: Number,
    /// Bytes used.
    pub used: Number,
    /// Percentage used.
    pub used_pct: Number,
    /// Total bytes.
    pub total: Number,
    /// Storage is close to full.
    pub critical: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for StorageStatistics {
    fn default() -> Self {
        Self {
            free: Number::from(0_u8),
            used: Number::from(0_u8),
            used_pct: Number::from(0_u8),
            total: Number::from(0_u8),
            critical: false,
            extra: Map::new(),
        }
    }
}

/// Playback status (`device/state`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeviceState {
    pub play_state: PlayState,
    pub wait_state: Option<WaitState>,
    pub current_media: Option<QueueItem>,
    pub next_media: Option<QueueItem>,
    pub is_ready: bool,
    pub is_busy: bool,
    pub enable_fade_out: bool,
    pub progress: Progress,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            play_state: PlayState::Stopped,
            wait_state: None,
            current_media: None,
            next_media: None,
            is_ready: false,
            is_busy: true,
            enable_fade_out: false,
            progress: Progress::default(),
            extra: Map::new(),
        }
    }
}

wire_enum! {
    #[derive(Default)]
    pub enum PlayState {
        Playing = "playing",
        Paused = "paused",
        #[default]
        Stopped = "stopped",
    }
}

wire_enum! {
    /// What the device is waiting on before the next item plays.
    pub enum WaitState {
        Countdown = "countdown",
        Manual = "manual",
    }
}

/// Entry of the play queue.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueItem {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "mediaId")]
    pub media_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl QueueItem {
    pub fn new(id: impl Into<String>, media_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            media_id: media_id.into(),
            extra: Map::new(),
        }
    }
}

/// Position within the current item, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Progress {
    pub elapsed: Number,
    pub remaining: Number,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            elapsed: Number::from(0_u8),
            remaining: Number::from(0_u8),
            extra: Map::new(),
        }
    }
}

/// External input status (`device/io`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IoState {
    /// DMX signal present. `None` while unknown.
    pub dmx: Option<bool>,
    /// Detected genlock reference, e.g. `"1920x1080P50"`.
    pub gen_lock: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn device_state_initial_value() {
        let value = serde_json::to_value(DeviceState::default()).unwrap();
        assert_eq!(
            value,
            json!({
                "playState": "stopped",
                "waitState": null,
                "currentMedia": null,
                "nextMedia": null,
                "isReady": false,
                "isBusy": true,
                "enableFadeOut": false,
                "progress": {"elapsed": 0, "remaining": 0}
            })
        );
    }

    #[test]
    fn device_state_from_partial_payload() {
        let state: DeviceState = serde_json::from_value(json!({
            "playState": "playing",
            "currentMedia": {"_id": "q1", "mediaId": "m1"},
            "waitState": "countdown",
            "unknownField": 42
        }))
        .unwrap();

        assert_eq!(state.play_state, PlayState::Playing);
        assert_eq!(state.wait_state, Some(WaitState::Countdown));
        assert_eq!(
            state.current_media,
            Some(QueueItem::new("q1", "m1"))
        );
        assert_eq!(state.extra["unknownField"], 42);
        // absent fields keep their initial value
        assert!(state.is_busy);
    }

    #[test]
    fn unknown_values_are_kept_verbatim() {
        let raw = json!({
            "playState": "buffering",
            "waitState": "external",
            "currentMedia": {"_id": "q1"},
            "nextMedia": null,
            "isReady": true,
            "isBusy": false,
            "enableFadeOut": false,
            "progress": {"elapsed": 1250.5, "remaining": 300, "rate": 1},
            "firmwareChannel": "beta"
        });
        let state: DeviceState = serde_json::from_value(raw.clone()).unwrap();

        assert_eq!(state.play_state, PlayState::Other("buffering".into()));
        assert_eq!(state.wait_state.as_ref().map(WaitState::as_str), Some("external"));
        assert_eq!(state.current_media.as_ref().map(|q| q.media_id.as_str()), Some(""));
        assert_eq!(state.progress.elapsed.as_f64(), Some(1250.5));
        assert_eq!(state.progress.extra["rate"], 1);
        assert_eq!(
            serde_json::to_value(&state).unwrap(),
            json!({
                "playState": "buffering",
                "waitState": "external",
                "currentMedia": {"_id": "q1", "mediaId": ""},
                "nextMedia": null,
                "isReady": true,
                "isBusy": false,
                "enableFadeOut": false,
                "progress": {"elapsed": 1250.5, "remaining": 300, "rate": 1},
                "firmwareChannel": "beta"
            })
        );
    }

    #[test]
    fn play_state_strings() {
        assert_eq!(PlayState::Paused.to_string(), "paused");
        assert_eq!("stopped".parse::<PlayState>(), Ok(PlayState::Stopped));
        assert_eq!(PlayState::default(), PlayState::Stopped);
    }

    #[test]
    fn device_info_uses_wire_names() {
        let info: DeviceInfo = serde_json::from_value(json!({
            "name": "Stage Left",
            "serialNumber": "XC-0042",
            "storageStats": {"free": 10, "used": 30, "usedPct": 75.0, "total": 40, "critical": true}
        }))
        .unwrap();
        assert_eq!(info.serial_number, "XC-0042");
        assert!(info.storage_stats.critical);
        assert_eq!(info.storage_stats.total, Number::from(40_u8));
        assert_eq!(info.storage_stats.used_pct.as_f64(), Some(75.0));
        assert_eq!(info.version, "");
    }

    #[test]
    fn io_state_defaults_to_unknown() {
        assert_eq!(
            serde_json::to_value(IoState::default()).unwrap(),
            json!({"dmx": null, "genLock": null})
        );
    }
}
