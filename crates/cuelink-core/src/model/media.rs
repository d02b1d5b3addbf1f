// ── Library entities ──
//
// Items of the list stores. Only `_id` and the fields the device always
// sends are typed; anything else rides along in `extra` so a refresh
// never drops data the device reported.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A media file in the device library (`media`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaFile {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A stored playlist (`playlists`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A video test pattern (`settings/patterns`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestPattern {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "builtIn", default)]
    pub built_in: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
