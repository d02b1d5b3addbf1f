// ── Playback commands ──
//
// Fire-and-forget instructions sent over the push channel. Each command
// maps to one event name and an optional payload.

use serde_json::{Value, json};
use strum::{AsRefStr, Display, EnumString};

/// Reference point of a [`Command::Jump`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum JumpOrigin {
    #[default]
    Current,
    Start,
    End,
}

/// How a playlist is put into the play queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum QueueMode {
    /// Clear the queue first.
    #[default]
    Replace,
    /// Add after the existing items.
    Append,
}

/// A playback instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Play,
    Pause,
    Stop,
    TogglePlayPause,
    /// Mark a queue item as the one to play next.
    SetNext { id: String },
    /// Start the item marked as next (optionally without playing it).
    TakeNext { play: bool },
    /// Move the playhead by `milliseconds` relative to `from`.
    Jump { milliseconds: i64, from: JumpOrigin },
    NextFrame,
    /// Move the next-item marker through the queue.
    Skip { distance: i64 },
    /// Play a queue item right away.
    Goto { id: String },
}

impl Command {
    /// Move the next-item marker one entry up.
    pub fn queue_up() -> Self {
        Self::Skip { distance: -1 }
    }

    /// Move the next-item marker one entry down.
    pub fn queue_down() -> Self {
        Self::Skip { distance: 1 }
    }

    /// Event name on the push channel.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Play => "playback:play",
            Self::Pause => "playback:pause",
            Self::Stop => "playback:stop",
            Self::TogglePlayPause => "playback:togglePlayPause",
            Self::SetNext { .. } => "playback:set-next",
            Self::TakeNext { play: true } => "playback:take-next",
            Self::TakeNext { play: false } => "playback:take-next-without-play",
            Self::Jump { .. } => "playback:jump",
            Self::NextFrame => "playback:nextFrame",
            Self::Skip { .. } => "playback:skip",
            Self::Goto { .. } => "playback:goto",
        }
    }

    /// Event payload, if the command carries one.
    pub fn payload(&self) -> Option<Value> {
        match self {
            Self::SetNext { id } | Self::Goto { id } => Some(json!({ "_id": id })),
            // the device expects the misspelled key
            Self::Jump { milliseconds, from } => {
                Some(json!({ "from": from.as_ref(), "miliseconds": milliseconds }))
            }
            Self::Skip { distance } => Some(json!({ "distance": distance })),
            Self::Play
            | Self::Pause
            | Self::Stop
            | Self::TogglePlayPause
            | Self::TakeNext { .. }
            | Self::NextFrame => None,
        }
    }
}
