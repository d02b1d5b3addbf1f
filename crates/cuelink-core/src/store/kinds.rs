// ── Store catalogue ──
//
// One marker type per remote resource. The registry table in
// `crate::registry` instantiates each of these exactly once.

use super::{StoreDescriptor, StoreKind};
use crate::model::{DeviceInfo, DeviceState, IoState, MediaFile, Playlist, Settings, TestPattern};

macro_rules! store_kind {
    ($(#[$meta:meta])* $kind:ident, $state:ty, $name:literal, $api:literal, $initial:expr) => {
        $(#[$meta])*
        pub struct $kind;

        impl StoreKind for $kind {
            type State = $state;

            const DESCRIPTOR: StoreDescriptor = StoreDescriptor {
                name: $name,
                api: $api,
            };

            fn initial_state() -> Self::State {
                $initial
            }
        }
    };
}

store_kind!(
    /// Identity and storage statistics.
    DeviceInfoStore, DeviceInfo, "DeviceInfo", "device/info", DeviceInfo::default()
);
store_kind!(
    /// Playback status: play state, current and next item, progress.
    DeviceStateStore, DeviceState, "DeviceState", "device/state", DeviceState::default()
);
store_kind!(
    /// DMX and genlock input status.
    IoStateStore, IoState, "IoState", "device/io", IoState::default()
);
store_kind!(
    /// The media library.
    MediaFileStore, Vec<MediaFile>, "MediaFile", "media", Vec::new()
);
store_kind!(PlaylistStore, Vec<Playlist>, "Playlist", "playlists", Vec::new());
store_kind!(
    /// Device configuration. Also carries the settings write operations.
    SettingsStore, Settings, "Settings", "settings", Settings::default()
);
store_kind!(
    /// Video test patterns, built-in and uploaded.
    TestPatternStore, Vec<TestPattern>, "TestPattern", "settings/patterns", Vec::new()
);
