//! The settings host: owns the canonical settings document and the
//! advertising flag, drives the pairing handshake and keeps the single
//! authenticated peer in sync.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};

use data_error::{NearbyError, Result};
use data_settings::{SettingDefinition, SettingsSchema};
use fs_settings::{FileSettingsStore, SettingsStorage};
use nearby_common::message::decode_schema;
use nearby_common::{AppDetails, PairingChallenge, PeerMessage};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::HostConfig;
use crate::state::{ConnectionState, Session};
use crate::subscriber::{ConnectionEvent, HostSubscriber};
use crate::transport::{
    AdvertiseCompletion, AdvertiseOutcome, ConnectionLifecycle,
    PayloadListener, Transport,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Handle to a running settings host. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct NearbySettingsHost {
    inner: Arc<HostInner>,
}

struct HostInner {
    config: HostConfig,
    app_details: AppDetails,
    transport: Arc<dyn Transport>,
    storage: Mutex<Box<dyn SettingsStorage>>,
    schema: RwLock<Arc<SettingsSchema>>,
    /// Mirror of `Session::is_advertising` readable without the lock.
    is_advertising: AtomicBool,
    session: Mutex<Session>,
    subscribers: RwLock<HashMap<String, Arc<dyn HostSubscriber>>>,
}

impl NearbySettingsHost {
    /// Creates a host persisting to `config.storage_dir` when persistence is
    /// enabled.
    pub fn new(
        schema: SettingsSchema,
        transport: Arc<dyn Transport>,
        config: HostConfig,
        app_details: AppDetails,
    ) -> Self {
        let storage = FileSettingsStore::in_dir(
            config.app_id.clone(),
            &config.storage_dir,
        );
        Self::with_storage(
            schema,
            transport,
            config,
            app_details,
            Box::new(storage),
        )
    }

    /// Creates a host on top of an arbitrary storage backend.
    ///
    /// Previously persisted values are applied onto `schema` right away, and
    /// advertising starts if `config.auto_start` is set.
    pub fn with_storage(
        schema: SettingsSchema,
        transport: Arc<dyn Transport>,
        config: HostConfig,
        app_details: AppDetails,
        mut storage: Box<dyn SettingsStorage>,
    ) -> Self {
        let schema = match storage.load(&schema, config.enable_persistence) {
            Some(loaded) => {
                info!("Restored persisted settings");
                loaded
            }
            None => schema,
        };
        if let Some(violation) = schema.first_violation() {
            warn!(%violation, "Host started with an inconsistent schema");
        }

        let auto_start = config.auto_start;
        let host = Self {
            inner: Arc::new(HostInner {
                config,
                app_details,
                transport,
                storage: Mutex::new(storage),
                schema: RwLock::new(Arc::new(schema)),
                is_advertising: AtomicBool::new(false),
                session: Mutex::new(Session::default()),
                subscribers: RwLock::new(HashMap::new()),
            }),
        };

        if auto_start {
            host.start_advertising(|result| {
                if let Err(err) = result {
                    error!(%err, "Automatic advertising start failed");
                }
            });
        }
        host
    }

    /// Current settings snapshot.
    pub fn settings(&self) -> Arc<SettingsSchema> {
        self.inner.settings()
    }

    /// Visible settings of the current snapshot, in document order.
    pub fn visible_settings(&self) -> Vec<SettingDefinition> {
        self.settings()
            .visible_settings()
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn is_advertising(&self) -> bool {
        self.inner
            .is_advertising
            .load(Ordering::Acquire)
    }

    pub fn connection_state(&self) -> ConnectionState {
        lock(&self.inner.session).state().clone()
    }

    /// The challenge the user still has to answer, if any.
    pub fn pending_challenge(&self) -> Option<PairingChallenge> {
        lock(&self.inner.session)
            .pending_challenge()
            .cloned()
    }

    /// Registers a subscriber, replacing any previous one with the same ID.
    pub fn subscribe(&self, subscriber: Arc<dyn HostSubscriber>) {
        let subscriber_id = subscriber.get_id();
        debug!(%subscriber_id, "Subscribing");
        self.inner
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(subscriber_id, subscriber);
    }

    pub fn unsubscribe(&self, subscriber: Arc<dyn HostSubscriber>) {
        let subscriber_id = subscriber.get_id();
        let removed = self
            .inner
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&subscriber_id);
        if removed.is_none() {
            debug!(%subscriber_id, "Unsubscribe of unknown subscriber");
        }
    }

    /// Asks the transport to start advertising and reports the outcome
    /// through `on_complete`.
    ///
    /// The advertising flag is updated before `on_complete` runs: `true` on
    /// success, `false` on failure or cancellation.
    pub fn start_advertising(
        &self,
        on_complete: impl FnOnce(Result<()>) + Send + 'static,
    ) {
        let inner = self.inner.clone();
        self.request_advertising(Box::new(move |outcome| {
            on_complete(inner.advertise_outcome(outcome));
        }));
    }

    /// Starts advertising and waits until the transport confirms.
    ///
    /// If `cancel` fires first, advertising is stopped on a best-effort
    /// basis and [`NearbyError::Cancelled`] is returned.
    pub async fn start_advertising_async(
        &self,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let (tx, mut rx) = oneshot::channel();
        let inner = self.inner.clone();
        self.request_advertising(Box::new(move |outcome| {
            let result = inner.advertise_outcome(outcome);
            if let Err(Ok(())) = tx.send(result) {
                // The waiter gave up before the start was confirmed.
                inner.abort_advertising();
            }
        }));

        tokio::select! {
            biased;

            result = &mut rx => {
                return result.unwrap_or(Err(NearbyError::Cancelled));
            }
            () = cancel.cancelled() => {}
        }

        // Once closed, a late confirmation undoes its own start.
        rx.close();
        warn!("Advertising wait cancelled, stopping advertising");
        self.inner.abort_advertising();
        Err(NearbyError::Cancelled)
    }

    /// Stops advertising and forgets any peer.
    ///
    /// Fails with [`NearbyError::InvalidState`] when not advertising.
    pub fn stop_advertising(&self) -> Result<()> {
        self.inner.stop_advertising()
    }

    /// Like [`Self::stop_advertising`], running the transport call on the
    /// blocking pool.
    pub async fn stop_advertising_async(&self) -> Result<()> {
        if !self.is_advertising() {
            return Err(not_advertising());
        }
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || inner.stop_advertising())
            .await
            .map_err(anyhow::Error::from)?
    }

    /// Answers the pending pairing challenge with the symbol the user
    /// picked. Returns whether the connection was accepted.
    ///
    /// Either way the challenge is discarded; authentication completes when
    /// the transport reports the connection result.
    pub fn resolve_challenge(&self, selected: &str) -> Result<bool> {
        let resolution = lock(&self.inner.session)
            .resolve(selected)
            .ok_or_else(|| {
                NearbyError::invalid_state("No pairing challenge is pending")
            })?;
        let endpoint = resolution.endpoint;

        if resolution.accepted {
            info!(%endpoint, "Pairing confirmed, accepting connection");
            let listener: Arc<dyn PayloadListener> =
                HostCallbacks::for_host(&self.inner);
            if let Err(err) =
                self.inner
                    .transport
                    .accept_connection(&endpoint, listener)
            {
                lock(&self.inner.session).acceptance_failed(&endpoint);
                return Err(err);
            }
            self.inner
                .broadcast_connection(ConnectionEvent::Accepted { endpoint });
        } else {
            warn!(%endpoint, "Wrong pairing symbol, rejecting connection");
            self.inner
                .transport
                .reject_connection(&endpoint)?;
            self.inner
                .broadcast_connection(ConnectionEvent::Rejected { endpoint });
        }
        Ok(resolution.accepted)
    }

    /// Replaces the whole settings document.
    ///
    /// The document is checked first and refused (returning `false`) when a
    /// key is duplicated or a value fails validation. Accepted documents are
    /// persisted, announced to subscribers and pushed to the authenticated
    /// peer, if any.
    pub fn update_settings(&self, schema: SettingsSchema) -> bool {
        if let Some(violation) = schema.first_violation() {
            warn!(%violation, "Refusing settings update");
            return false;
        }

        self.inner.commit(|_| Some(schema));
        self.inner.push_to_peer();
        true
    }

    /// Sets a single value after validating it against its definition.
    pub fn update_setting(&self, key: &str, value: &str) -> bool {
        let committed = self.inner.commit(|current| {
            let Some(setting) = current.get(key) else {
                warn!(key, "Refusing update of unknown setting");
                return None;
            };
            if !setting.validate_value(value) {
                debug!(key, value, "Refusing invalid setting value");
                return None;
            }
            let updated = current.update_setting(key, value);
            if let Some(violation) = updated.first_violation() {
                warn!(%violation, "Refusing settings update");
                return None;
            }
            Some(updated)
        });
        if committed.is_none() {
            return false;
        }
        self.inner.push_to_peer();
        true
    }

    fn request_advertising(&self, completion: AdvertiseCompletion) {
        let config = &self.inner.config;
        debug!(
            device_label = %config.device_label,
            app_id = %config.app_id,
            strategy = %config.strategy,
            "Requesting advertising"
        );
        let lifecycle: Arc<dyn ConnectionLifecycle> =
            HostCallbacks::for_host(&self.inner);
        self.inner.transport.start_advertising(
            &config.device_label,
            &config.app_id,
            lifecycle,
            config.strategy,
            completion,
        );
    }
}

fn not_advertising() -> NearbyError {
    NearbyError::invalid_state("Can't stop advertising when not advertising")
}

impl HostInner {
    fn settings(&self) -> Arc<SettingsSchema> {
        self.schema
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn subscribers(&self) -> Vec<Arc<dyn HostSubscriber>> {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    fn broadcast_connection(&self, event: ConnectionEvent) {
        for subscriber in self.subscribers() {
            subscriber.notify_connection(event.clone());
        }
    }

    fn broadcast_advertising(&self, is_advertising: bool) {
        for subscriber in self.subscribers() {
            subscriber.notify_advertising(is_advertising);
        }
    }

    /// Replaces the document with what `edit` derives from the current one,
    /// persists it and notifies subscribers. `None` from `edit` leaves the
    /// document untouched.
    ///
    /// The storage lock is held from the read until the write is persisted,
    /// so concurrent edits are serialized and the stored document always
    /// matches the held one.
    fn commit<F>(&self, edit: F) -> Option<Arc<SettingsSchema>>
    where
        F: FnOnce(&SettingsSchema) -> Option<SettingsSchema>,
    {
        let schema = {
            let mut storage = lock(&self.storage);
            let schema = Arc::new(edit(&self.settings())?);
            *self
                .schema
                .write()
                .unwrap_or_else(PoisonError::into_inner) = schema.clone();

            if let Err(err) =
                storage.save(&schema, self.config.enable_persistence)
            {
                error!(%err, "Failed to persist settings");
            }
            schema
        };

        for subscriber in self.subscribers() {
            subscriber.notify_settings_changed(schema.clone());
        }
        Some(schema)
    }

    /// Re-pushes the document if a peer is authenticated.
    fn push_to_peer(&self) {
        let peer = lock(&self.session)
            .authenticated_peer()
            .map(str::to_owned);
        if let Some(endpoint) = peer {
            self.push_schema(&endpoint);
        }
    }

    /// Sends one payload. Failures are logged and not retried.
    fn send(&self, endpoint: &str, message: PeerMessage) {
        let bytes = match message.encode() {
            Ok(bytes) => bytes,
            Err(err) => {
                error!(%err, "Failed to encode payload");
                return;
            }
        };
        if let Err(err) = self.transport.send_payload(endpoint, bytes) {
            warn!(endpoint, %err, "Failed to send payload");
        }
    }

    fn push_schema(&self, endpoint: &str) {
        debug!(endpoint, "Pushing settings schema");
        let schema = SettingsSchema::clone(&self.settings());
        self.send(endpoint, PeerMessage::Schema(schema));
    }

    fn push_app_details(&self, endpoint: &str) {
        debug!(endpoint, "Pushing application details");
        self.send(
            endpoint,
            PeerMessage::AppDetails(self.app_details.clone()),
        );
    }

    fn advertise_outcome(&self, outcome: AdvertiseOutcome) -> Result<()> {
        let result = {
            let mut session = lock(&self.session);
            match outcome {
                AdvertiseOutcome::Started => {
                    session.advertising_started();
                    Ok(())
                }
                AdvertiseOutcome::Failed(reason) => {
                    session.advertising_failed();
                    Err(NearbyError::Transport(reason))
                }
                AdvertiseOutcome::Cancelled => {
                    session.advertising_failed();
                    Err(NearbyError::Cancelled)
                }
            }
        };
        let is_advertising = result.is_ok();
        self.is_advertising
            .store(is_advertising, Ordering::Release);

        match &result {
            Ok(()) => info!("Advertising started"),
            Err(err) => error!(%err, "Advertising did not start"),
        }
        self.broadcast_advertising(is_advertising);
        result
    }

    fn stop_advertising(&self) -> Result<()> {
        {
            let mut session = lock(&self.session);
            if !session.is_advertising() {
                return Err(not_advertising());
            }
            session.advertising_stopped();
            self.is_advertising
                .store(false, Ordering::Release);
        }

        self.transport.stop_advertising();
        info!("Advertising stopped");
        self.broadcast_advertising(false);
        Ok(())
    }

    /// Best-effort stop used when an advertising wait is cancelled; works
    /// whether or not the start had completed.
    fn abort_advertising(&self) {
        {
            let mut session = lock(&self.session);
            session.advertising_stopped();
            self.is_advertising
                .store(false, Ordering::Release);
        }
        self.transport.stop_advertising();
        self.broadcast_advertising(false);
    }

    fn connection_initiated(&self, endpoint: &str, auth_token: &str) {
        let challenge = PairingChallenge::for_token(auth_token);
        let admitted = lock(&self.session)
            .connection_initiated(endpoint, challenge.clone());

        if !admitted {
            warn!(endpoint, "Rejecting connection, another peer is active");
            if let Err(err) = self.transport.reject_connection(endpoint) {
                warn!(endpoint, %err, "Failed to reject connection");
            }
            self.broadcast_connection(ConnectionEvent::Rejected {
                endpoint: endpoint.to_owned(),
            });
            return;
        }

        debug!(endpoint, "Awaiting pairing confirmation");
        for subscriber in self.subscribers() {
            subscriber.notify_challenge(challenge.clone());
        }
    }

    fn connection_result(&self, endpoint: &str, success: bool) {
        let endpoint_owned = endpoint.to_owned();
        let result = lock(&self.session).connection_result(endpoint, success);
        match result {
            None => {
                debug!(endpoint, "Ignoring result for unknown connection");
                return;
            }
            Some(false) => {
                warn!(endpoint, "Connection could not be established");
                self.broadcast_connection(ConnectionEvent::Failed {
                    endpoint: endpoint_owned,
                });
                return;
            }
            Some(true) => {}
        }

        info!(endpoint, "Peer authenticated");
        self.push_schema(endpoint);
        self.push_app_details(endpoint);
        self.broadcast_connection(ConnectionEvent::Authenticated {
            endpoint: endpoint_owned,
        });
    }

    fn disconnected(&self, endpoint: &str) {
        let tracked = lock(&self.session).disconnected(endpoint);
        if tracked {
            info!(endpoint, "Peer disconnected");
            self.broadcast_connection(ConnectionEvent::Disconnected {
                endpoint: endpoint.to_owned(),
            });
        }
    }

    fn payload_received(&self, endpoint: &str, bytes: &[u8]) {
        let authenticated =
            lock(&self.session).authenticated_peer() == Some(endpoint);
        if !authenticated {
            warn!(endpoint, "Dropping payload from unauthenticated endpoint");
            return;
        }

        let Some(schema) = decode_schema(bytes) else {
            debug!(endpoint, len = bytes.len(), "Dropping non-schema payload");
            return;
        };
        if let Some(violation) = schema.first_violation() {
            warn!(endpoint, %violation, "Dropping invalid settings schema");
            return;
        }

        debug!(endpoint, "Applying settings from peer");
        self.commit(|_| Some(schema));
    }
}

/// Callbacks handed to the transport. The host is held weakly so a
/// transport keeping its callbacks does not keep the host alive.
struct HostCallbacks {
    host: Weak<HostInner>,
}

impl HostCallbacks {
    fn for_host(host: &Arc<HostInner>) -> Arc<Self> {
        Arc::new(Self {
            host: Arc::downgrade(host),
        })
    }

    fn host(&self) -> Option<Arc<HostInner>> {
        let host = self.host.upgrade();
        if host.is_none() {
            debug!("Host dropped, ignoring transport callback");
        }
        host
    }
}

impl ConnectionLifecycle for HostCallbacks {
    fn on_connection_initiated(&self, endpoint: &str, auth_token: &str) {
        if let Some(host) = self.host() {
            host.connection_initiated(endpoint, auth_token);
        }
    }

    fn on_connection_result(&self, endpoint: &str, success: bool) {
        if let Some(host) = self.host() {
            host.connection_result(endpoint, success);
        }
    }

    fn on_disconnected(&self, endpoint: &str) {
        if let Some(host) = self.host() {
            host.disconnected(endpoint);
        }
    }
}

impl PayloadListener for HostCallbacks {
    fn on_payload_received(&self, endpoint: &str, bytes: &[u8]) {
        if let Some(host) = self.host() {
            host.payload_received(endpoint, bytes);
        }
    }
}
