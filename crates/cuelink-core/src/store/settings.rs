// ── Settings writes ──
//
// Writes go to the device and nothing else: the cached value changes only
// when the device pushes the new state back (or on the next refresh).

use serde_json::{Map, Value};
use tracing::debug;

use super::{SettingsStore, Store, StoreKind};
use crate::error::CoreError;

const API: &str = SettingsStore::DESCRIPTOR.api;

impl Store<SettingsStore> {
    /// PUT the current settings overlaid with `partial` (a JSON object of
    /// wire field names). Returns the device's answer.
    pub async fn update_partial(&self, partial: Value) -> Result<Value, CoreError> {
        let Value::Object(partial) = partial else {
            return Err(CoreError::InvalidState {
                store: SettingsStore::DESCRIPTOR.name.into(),
                message: "settings update must be a JSON object".into(),
            });
        };

        let mut merged = match serde_json::to_value(self.get()) {
            Ok(Value::Object(current)) => current,
            _ => Map::new(),
        };
        debug!(fields = ?partial.keys().collect::<Vec<_>>(), "updating settings");
        merged.extend(partial);

        self.channel().put(API, Some(&Value::Object(merged))).await
    }

    /// Change a single setting by wire name.
    pub async fn update_field(&self, key: &str, value: Value) -> Result<Value, CoreError> {
        let mut partial = Map::new();
        partial.insert(key.to_owned(), value);
        self.update_partial(Value::Object(partial)).await
    }

    /// Restore factory settings on the device.
    pub async fn to_factory_defaults(&self) -> Result<Value, CoreError> {
        self.channel().delete(API).await
    }

    /// Reboot the device.
    pub async fn reboot(&self) -> Result<(), CoreError> {
        self.channel()
            .post::<Value>(&format!("{API}/reboot"), Some(&Value::Object(Map::new())))
            .await?;
        Ok(())
    }
}
