// ── Domain model ──
//
// Typed shapes of every store value, with the device's wire names. Fields
// the device sends that no struct declares are kept in `extra`, and enum
// values outside the known set are kept verbatim in `Other`, so a store
// always mirrors exactly what the device reported.

/// Declares a string-valued wire enum with a catch-all `Other` variant.
///
/// Known values get a variant; anything else decodes to `Other(raw)` and
/// encodes back unchanged.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $wire:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
            /// A value this build doesn't know.
            Other(String),
        }

        impl $name {
            /// The value as sent on the wire.
            pub fn as_str(&self) -> &str {
                match self {
                    $( Self::$variant => $wire, )+
                    Self::Other(raw) => raw,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(match s {
                    $( $wire => Self::$variant, )+
                    other => Self::Other(other.to_owned()),
                })
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = <String as serde::Deserialize>::deserialize(deserializer)?;
                let Ok(value) = raw.parse::<Self>();
                Ok(value)
            }
        }
    };
}

pub mod device;
pub mod media;
pub mod settings;

pub use device::{
    DeviceInfo, DeviceState, IoState, PlayState, Progress, QueueItem, StorageStatistics, WaitState,
};
pub use media::{MediaFile, Playlist, TestPattern};
pub use settings::{
    AudioOutputMode, HdrMode, OutputColorDepth, OutputColorMode, PlayMode, Settings,
    VideoOutputMode,
};
