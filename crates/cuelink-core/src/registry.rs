// ── Store registry ──
//
// Holds one instance of every store and keeps them in sync with the
// device: a full refresh on every (re)connect, then push events routed by
// store name. Routing runs in one task that awaits each reaction before
// reading the next event.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use futures_util::stream::BoxStream;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::channel::Channel;
use crate::error::CoreError;
use crate::event::{self, PushEvent, StateUpdate};
use crate::store::{
    AnyStore, DeviceInfoStore, DeviceStateStore, IoStateStore, MediaFileStore, PlaylistStore,
    SettingsStore, Store, StoreDescriptor, StoreKind, TestPatternStore,
};

// ── Store table ──────────────────────────────────────────────────

/// Maps a store kind to its slot in [`Stores`].
pub trait RegisteredStore: StoreKind + Sized {
    fn pick(stores: &Stores) -> &Store<Self>;
}

macro_rules! store_table {
    ($($field:ident: $kind:ty),+ $(,)?) => {
        /// Every store the device exposes, in registration order.
        pub struct Stores {
            $(pub $field: Store<$kind>,)+
        }

        impl Stores {
            pub const COUNT: usize = [$(stringify!($field)),+].len();

            /// Descriptors of every store, in registration order.
            pub const DESCRIPTORS: [StoreDescriptor; Self::COUNT] =
                [$(<$kind as StoreKind>::DESCRIPTOR),+];

            fn new(channel: &Channel) -> Self {
                Self {
                    $($field: Store::new(channel.clone()),)+
                }
            }

            /// All stores, in registration order.
            pub fn all(&self) -> [&dyn AnyStore; Self::COUNT] {
                [$(&self.$field as &dyn AnyStore),+]
            }

            pub fn find(&self, name: &str) -> Option<&dyn AnyStore> {
                $(
                    if name == <$kind as StoreKind>::DESCRIPTOR.name {
                        return Some(&self.$field);
                    }
                )+
                None
            }
        }

        $(
            impl RegisteredStore for $kind {
                fn pick(stores: &Stores) -> &Store<Self> {
                    &stores.$field
                }
            }
        )+
    };
}

store_table! {
    device_info: DeviceInfoStore,
    device_state: DeviceStateStore,
    io_state: IoStateStore,
    media_files: MediaFileStore,
    playlists: PlaylistStore,
    settings: SettingsStore,
    test_patterns: TestPatternStore,
}

// ── StoreRegistry ────────────────────────────────────────────────

/// Owner of all stores for one channel.
///
/// Cheaply cloneable; clones share the stores and the routing task.
#[derive(Clone)]
pub struct StoreRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    stores: Stores,
    cancel: CancellationToken,
    router: Mutex<Option<JoinHandle<()>>>,
    last_full_refresh: Mutex<Option<DateTime<Utc>>>,
    last_push_event: Mutex<Option<DateTime<Utc>>>,
}

impl StoreRegistry {
    /// Build every store and start routing the channel's events.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(channel: &Channel) -> Self {
        let inner = Arc::new(RegistryInner {
            stores: Stores::new(channel),
            cancel: CancellationToken::new(),
            router: Mutex::new(None),
            last_full_refresh: Mutex::new(None),
            last_push_event: Mutex::new(None),
        });

        // Subscribe before spawning so nothing sent after `new` returns is missed.
        let events = channel.subscribe_all();
        let handle = tokio::spawn(route_events(Arc::clone(&inner), events));
        if let Ok(mut router) = inner.router.lock() {
            *router = Some(handle);
        }

        Self { inner }
    }

    pub fn stores(&self) -> &Stores {
        &self.inner.stores
    }

    /// Typed handle to a store.
    pub fn store<K: RegisteredStore>(&self) -> &Store<K> {
        K::pick(&self.inner.stores)
    }

    /// Name-based handle to a store.
    pub fn store_by_name(&self, name: &str) -> Result<&dyn AnyStore, CoreError> {
        self.inner.stores.find(name).ok_or_else(|| CoreError::StoreNotFound {
            name: name.to_owned(),
        })
    }

    /// Names of all stores, in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.inner.stores.all().iter().map(|s| s.descriptor().name).collect()
    }

    /// Current value of a store (or one field of it) as JSON.
    pub fn get(&self, name: &str, field: Option<&str>) -> Result<Value, CoreError> {
        let store = self.store_by_name(name)?;
        Ok(match field {
            Some(path) => store.field(path),
            None => store.value(),
        })
    }

    /// Current value (or field) of a store, then every change.
    pub fn select(
        &self,
        name: &str,
        field: Option<&str>,
    ) -> Result<BoxStream<'static, Value>, CoreError> {
        Ok(self.store_by_name(name)?.select_value(field))
    }

    /// Refresh every store in registration order. Stops at the first
    /// failure; later stores are not attempted.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        self.inner.refresh_all().await
    }

    /// Refresh one store by name.
    pub async fn refresh_store(&self, name: &str) -> Result<(), CoreError> {
        self.store_by_name(name)?.refresh().await
    }

    /// Put every store back to its initial value.
    pub fn reset(&self) {
        for store in self.inner.stores.all() {
            store.reset();
        }
    }

    /// When the last full refresh completed.
    pub fn last_full_refresh(&self) -> Option<DateTime<Utc>> {
        self.inner.last_full_refresh.lock().ok().and_then(|t| *t)
    }

    /// When the last push event was routed.
    pub fn last_push_event(&self) -> Option<DateTime<Utc>> {
        self.inner.last_push_event.lock().ok().and_then(|t| *t)
    }

    /// Stop routing events, then reset every store. Waits for the routing
    /// task, so an event-triggered refresh in flight is abandoned.
    pub async fn destroy(&self) {
        self.inner.cancel.cancel();
        let router = self.inner.router.lock().ok().and_then(|mut r| r.take());
        if let Some(handle) = router {
            if let Err(e) = handle.await {
                warn!(error = %e, "event routing task failed");
            }
        }
        self.reset();
        debug!("store registry destroyed");
    }
}

impl RegistryInner {
    async fn refresh_all(&self) -> Result<(), CoreError> {
        for store in self.stores.all() {
            store.refresh().await?;
        }
        if let Ok(mut at) = self.last_full_refresh.lock() {
            *at = Some(Utc::now());
        }
        Ok(())
    }

    fn set_from_event(&self, update: StateUpdate) {
        let Some(store) = self.stores.find(&update.name) else {
            trace!(store = %update.name, "state for unknown store ignored");
            return;
        };
        if let Err(e) = store.set_value(update.state) {
            warn!(store = %update.name, error = %e, "pushed state does not fit store");
        }
    }

    async fn refresh_from_event(&self, name: &str) {
        let Some(store) = self.stores.find(name) else {
            trace!(store = name, "entity change for unknown store ignored");
            return;
        };
        debug!(store = name, "entity changed, refreshing");
        if let Err(e) = store.refresh().await {
            warn!(store = name, error = %e, "refresh after entity change failed");
        }
    }

    async fn handle(&self, event: &PushEvent) {
        if let Ok(mut at) = self.last_push_event.lock() {
            *at = Some(Utc::now());
        }

        match event.name.as_str() {
            event::CONNECT => {
                info!("connected, refreshing all stores");
                if let Err(e) = self.refresh_all().await {
                    warn!(error = %e, "full refresh after connect failed");
                }
            }
            event::STATE | event::RESET => {
                match serde_json::from_value::<StateUpdate>(event.data.clone()) {
                    Ok(update) => self.set_from_event(update),
                    Err(e) => warn!(event = %event.name, error = %e, "malformed state event"),
                }
            }
            event::ENTITY => match serde_json::from_value::<EntityTarget>(event.data.clone()) {
                Ok(target) => self.refresh_from_event(&target.name).await,
                Err(e) => warn!(error = %e, "malformed entity event"),
            },
            other => trace!(event = other, "event not routed"),
        }
    }
}

/// The part of an `event:entity` payload routing reads. The store is
/// re-read whatever the change was.
#[derive(Deserialize)]
struct EntityTarget {
    name: String,
}

/// Route events until cancelled or the channel goes away.
async fn route_events(inner: Arc<RegistryInner>, mut events: broadcast::Receiver<Arc<PushEvent>>) {
    loop {
        let received = tokio::select! {
            biased;
            () = inner.cancel.cancelled() => break,
            received = events.recv() => received,
        };

        match received {
            Ok(event) => {
                tokio::select! {
                    biased;
                    () = inner.cancel.cancelled() => break,
                    () = inner.handle(&event) => {}
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "event routing fell behind, resynchronizing");
                tokio::select! {
                    biased;
                    () = inner.cancel.cancelled() => break,
                    result = inner.refresh_all() => {
                        if let Err(e) = result {
                            warn!(error = %e, "resynchronizing refresh failed");
                        }
                    }
                }
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    debug!("event routing stopped");
}
