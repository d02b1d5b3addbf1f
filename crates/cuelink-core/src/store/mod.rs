// ── Typed state stores ──
//
// A `Store<K>` caches the value of one remote resource. Reads are
// synchronous, writes fully replace the value and notify observers over a
// `watch` channel. `AnyStore` erases the type for name-based access.

mod kinds;
mod settings;
mod stream;

use std::fmt::Debug;

use futures_util::StreamExt;
use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::debug;

use crate::channel::Channel;
use crate::error::CoreError;

pub use kinds::{
    DeviceInfoStore, DeviceStateStore, IoStateStore, MediaFileStore, PlaylistStore, SettingsStore,
    TestPatternStore,
};
pub use stream::{StateStream, StateWatchStream};

/// Identity of a store: logical name used in push events, and the REST
/// resource it mirrors (relative to `/api/`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreDescriptor {
    pub name: &'static str,
    pub api: &'static str,
}

/// Compile-time description of one store type.
pub trait StoreKind: Send + Sync + 'static {
    type State: Clone + PartialEq + Debug + Serialize + DeserializeOwned + Send + Sync + 'static;

    const DESCRIPTOR: StoreDescriptor;

    /// Value held before the first refresh and restored by `reset`.
    fn initial_state() -> Self::State;
}

// ── Store ────────────────────────────────────────────────────────

/// Local cache of one remote resource.
pub struct Store<K: StoreKind> {
    initial: K::State,
    state: watch::Sender<K::State>,
    channel: Channel,
}

impl<K: StoreKind> Store<K> {
    pub fn new(channel: Channel) -> Self {
        let initial = K::initial_state();
        let (state, _) = watch::channel(initial.clone());
        Self {
            initial,
            state,
            channel,
        }
    }

    pub fn name(&self) -> &'static str {
        K::DESCRIPTOR.name
    }

    pub fn api(&self) -> &'static str {
        K::DESCRIPTOR.api
    }

    pub fn initial(&self) -> &K::State {
        &self.initial
    }

    /// Current value.
    pub fn get(&self) -> K::State {
        self.state.borrow().clone()
    }

    /// Project the current value without cloning all of it.
    pub fn get_field<R>(&self, field: impl FnOnce(&K::State) -> R) -> R {
        field(&self.state.borrow())
    }

    /// Current value, then every replacement.
    ///
    /// Replacements are conflated: an observer that falls behind skips
    /// intermediate values and wakes to the latest one. Every `set` is
    /// still seen by observers that keep up.
    pub fn select(&self) -> StateStream<K::State> {
        StateStream::new(self.state.subscribe())
    }

    /// Current projection, then every change of it. Consecutive equal
    /// projections are emitted once; like [`select`](Self::select), a
    /// slow observer only sees the latest projection.
    pub fn select_field<R, F>(&self, field: F) -> BoxStream<'static, R>
    where
        F: Fn(&K::State) -> R + Send + 'static,
        R: PartialEq + Clone + Send + 'static,
    {
        distinct(self.state.subscribe(), field)
    }

    /// Replace the value and notify observers. Returns the value.
    pub fn set(&self, value: K::State) -> K::State {
        self.state.send_replace(value.clone());
        value
    }

    /// Restore the initial value.
    pub fn reset(&self) -> K::State {
        self.set(self.initial.clone())
    }

    /// Re-read the resource and replace the value with the answer.
    ///
    /// On failure the cached value is left as it was.
    pub async fn refresh(&self) -> Result<K::State, CoreError> {
        let value: K::State = self.channel.get(K::DESCRIPTOR.api).await?;
        debug!(store = K::DESCRIPTOR.name, "refreshed");
        Ok(self.set(value))
    }

    pub(crate) fn channel(&self) -> &Channel {
        &self.channel
    }
}

/// Map each value through `project` and drop consecutive duplicates.
fn distinct<T, R, F>(mut rx: watch::Receiver<T>, project: F) -> BoxStream<'static, R>
where
    T: Send + Sync + 'static,
    F: Fn(&T) -> R + Send + 'static,
    R: PartialEq + Clone + Send + 'static,
{
    async_stream::stream! {
        let mut last: Option<R> = None;
        loop {
            let value = project(&rx.borrow_and_update());
            if last.as_ref() != Some(&value) {
                last = Some(value.clone());
                yield value;
            }
            if rx.changed().await.is_err() {
                break;
            }
        }
    }
    .boxed()
}

// ── Type-erased access ───────────────────────────────────────────

/// Name-based view of a store with values as JSON.
pub trait AnyStore: Send + Sync {
    fn descriptor(&self) -> StoreDescriptor;

    /// Current value as JSON.
    fn value(&self) -> Value;

    /// One field of the current value; `Value::Null` if absent.
    /// See [`project_field`] for the path syntax.
    fn field(&self, path: &str) -> Value;

    fn initial_value(&self) -> Value;

    /// Replace the value from JSON. Fails with
    /// [`CoreError::InvalidState`] if it doesn't fit the store's shape.
    fn set_value(&self, value: Value) -> Result<(), CoreError>;

    fn reset(&self);

    fn refresh(&self) -> BoxFuture<'_, Result<(), CoreError>>;

    /// Current value (or field), then every change. The field variant
    /// drops consecutive duplicates.
    fn select_value(&self, field: Option<&str>) -> BoxStream<'static, Value>;
}

impl<K: StoreKind> AnyStore for Store<K> {
    fn descriptor(&self) -> StoreDescriptor {
        K::DESCRIPTOR
    }

    fn value(&self) -> Value {
        self.get_field(|state| to_json(state))
    }

    fn field(&self, path: &str) -> Value {
        project_field(&self.value(), path)
    }

    fn initial_value(&self) -> Value {
        to_json(&self.initial)
    }

    fn set_value(&self, value: Value) -> Result<(), CoreError> {
        let state: K::State =
            serde_json::from_value(value).map_err(|e| CoreError::InvalidState {
                store: K::DESCRIPTOR.name.into(),
                message: e.to_string(),
            })?;
        self.set(state);
        Ok(())
    }

    fn reset(&self) {
        Store::reset(self);
    }

    fn refresh(&self) -> BoxFuture<'_, Result<(), CoreError>> {
        Box::pin(async move {
            Store::refresh(self).await?;
            Ok(())
        })
    }

    fn select_value(&self, field: Option<&str>) -> BoxStream<'static, Value> {
        match field {
            None => WatchStream::new(self.state.subscribe())
                .map(|state| to_json(&state))
                .boxed(),
            Some(path) => {
                let path = path.to_owned();
                distinct(self.state.subscribe(), move |state: &K::State| {
                    project_field(&to_json(state), &path)
                })
            }
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Look up a dotted path (`"storageStats.free"`, `"0.name"`) in a JSON
/// value. Object keys match wire names; numeric segments index arrays.
pub fn project_field(value: &Value, path: &str) -> Value {
    path.split('.')
        .try_fold(value, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
        .cloned()
        .unwrap_or(Value::Null)
}
