// ── Player session ──
//
// One device, one session: a `Channel` for the connection and a
// `StoreRegistry` mirroring its state, plus the playback and queue
// operations expressed on top of them.

use serde_json::{Value, json};
use tracing::debug;

use cuelink_api::{ClientConfig, TransportConfig, UploadFile};

use crate::channel::{Channel, ConnectionState};
use crate::command::{Command, JumpOrigin, QueueMode};
use crate::error::CoreError;
use crate::model::{MediaFile, Settings};
use crate::registry::StoreRegistry;
use crate::store::{SettingsStore, Store};

/// Folder id of the media library root.
pub const ROOT_FOLDER: &str = "_root";

/// A session with a single device.
///
/// ```rust,ignore
/// let player = Player::new(TransportConfig::default())?;
/// player.connect("192.168.2.21", 80).await?;
/// player.identify().await?;
/// ```
pub struct Player {
    channel: Channel,
    state: StoreRegistry,
}

impl Player {
    /// Create a disconnected session. Must be called inside a Tokio runtime.
    pub fn new(transport: TransportConfig) -> Result<Self, CoreError> {
        Self::with_address(ClientConfig::default(), transport)
    }

    /// Create a disconnected session for a known device. REST operations
    /// work right away; [`Player::open`] starts the push channel.
    pub fn with_address(address: ClientConfig, transport: TransportConfig) -> Result<Self, CoreError> {
        let channel = Channel::with_address(address, transport)?;
        let state = StoreRegistry::new(&channel);
        Ok(Self { channel, state })
    }

    /// The underlying channel, for raw requests and event subscriptions.
    pub fn client(&self) -> &Channel {
        &self.channel
    }

    /// The mirrored device state.
    pub fn state(&self) -> &StoreRegistry {
        &self.state
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.channel.connection_state()
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Connect to the device. Stores refresh in the background once the
    /// push channel is up.
    pub async fn connect(&self, host: &str, port: u16) -> Result<(), CoreError> {
        self.channel.connect(Some(ClientConfig::new(host, port))).await
    }

    /// Connect to the address the session was created with (or last
    /// connected to).
    pub async fn open(&self) -> Result<(), CoreError> {
        self.channel.connect(None).await
    }

    pub async fn disconnect(&self) {
        self.channel.disconnect().await;
    }

    /// Disconnect and stop mirroring. Every store is back at its initial
    /// value afterwards.
    pub async fn destroy(&self) {
        self.channel.disconnect().await;
        self.state.destroy().await;
    }

    // ── Playback ─────────────────────────────────────────────────

    /// Send a command; nothing happens while disconnected.
    pub fn send(&self, command: &Command) {
        debug!(command = command.event_name(), "sending command");
        self.channel.emit(command.event_name(), command.payload());
    }

    pub fn play(&self) {
        self.send(&Command::Play);
    }

    pub fn pause(&self) {
        self.send(&Command::Pause);
    }

    pub fn stop(&self) {
        self.send(&Command::Stop);
    }

    pub fn toggle_play_pause(&self) {
        self.send(&Command::TogglePlayPause);
    }

    /// Mark a queue item as next.
    pub fn set_next_media(&self, id: &str) {
        self.send(&Command::SetNext { id: id.to_owned() });
    }

    /// Take the next item, playing it unless `without_play`.
    pub fn take(&self, without_play: bool) {
        self.send(&Command::TakeNext { play: !without_play });
    }

    pub fn jump(&self, milliseconds: i64, from: JumpOrigin) {
        self.send(&Command::Jump { milliseconds, from });
    }

    /// Step one frame ahead (pauses playback).
    pub fn next_frame(&self) {
        self.send(&Command::NextFrame);
    }

    pub fn queue_up(&self) {
        self.send(&Command::queue_up());
    }

    pub fn queue_down(&self) {
        self.send(&Command::queue_down());
    }

    /// Move the next marker by `distance` entries (negative is up).
    pub fn queue_skip(&self, distance: i64) {
        self.send(&Command::Skip { distance });
    }

    pub fn queue_goto(&self, queue_item_id: &str) {
        self.send(&Command::Goto {
            id: queue_item_id.to_owned(),
        });
    }

    // ── Queue & device ───────────────────────────────────────────

    /// Put a playlist into the play queue.
    pub async fn load_playlist(&self, playlist_id: &str, mode: QueueMode) -> Result<(), CoreError> {
        self.channel
            .post::<Value>(
                &format!("queue/{mode}-playlist"),
                Some(&json!({ "_id": playlist_id })),
            )
            .await?;
        Ok(())
    }

    pub async fn queue_clear(&self) -> Result<(), CoreError> {
        self.channel.delete::<Value>("queue/all").await?;
        Ok(())
    }

    /// Blink the front panel so the unit can be found in a rack.
    pub async fn identify(&self) -> Result<(), CoreError> {
        self.channel
            .post::<Value>("device/info/identify", None)
            .await?;
        Ok(())
    }

    // ── Settings ─────────────────────────────────────────────────

    fn settings(&self) -> &Store<SettingsStore> {
        self.state.store::<SettingsStore>()
    }

    /// Update several settings at once (JSON object of wire names).
    pub async fn update_settings(&self, partial: Value) -> Result<Value, CoreError> {
        self.settings().update_partial(partial).await
    }

    /// Update one setting by wire name.
    pub async fn update_setting(&self, key: &str, value: Value) -> Result<Value, CoreError> {
        self.settings().update_field(key, value).await
    }

    /// Current settings as last reported by the device.
    pub fn current_settings(&self) -> Settings {
        self.settings().get()
    }

    pub async fn factory_reset(&self) -> Result<Value, CoreError> {
        self.settings().to_factory_defaults().await
    }

    pub async fn reboot(&self) -> Result<(), CoreError> {
        self.settings().reboot().await
    }

    // ── Media ────────────────────────────────────────────────────

    /// Upload files into a library folder (`None` for the root).
    pub async fn upload_media(
        &self,
        files: Vec<UploadFile>,
        parent_folder_id: Option<&str>,
    ) -> Result<Vec<MediaFile>, CoreError> {
        let folder = parent_folder_id.unwrap_or(ROOT_FOLDER);
        debug!(count = files.len(), folder, "uploading media");
        self.channel
            .upload_files("media", files, Some(&json!({ "parentFolderId": folder })))
            .await
    }
}
