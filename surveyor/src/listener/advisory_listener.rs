/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

use crate::config::{AdvisoryConfig, ConfigError, ConnectionOptions};
use crate::handlers::AdvisoryDispatcher;
use crate::listener::subscriptions::SubscriptionSet;
use crate::listener::ListenerError;
use crate::metrics::JetStreamMetrics;
use crate::observability::events;
use crate::routing::ADVISORY_SUBSCRIPTIONS;
use crate::transport::{AdvisoryHandler, AdvisoryTransport};
use std::fmt::{Debug, Formatter};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const COMPONENT: &str = "advisory_listener";

/// Observable lifecycle state of an [`AdvisoryListener`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListenerState {
    Created,
    Running,
    Stopped,
}

/// Lifecycle phase plus every subscription this listener may hold.
///
/// Subscriptions are tracked in all phases: a start that is cancelled midway
/// leaves its subjects here with the phase still `Created`, and the next
/// `start` or `stop` releases them.
struct Lifecycle {
    phase: ListenerState,
    subscriptions: SubscriptionSet,
}

/// Keeps the dispatcher active only if the start it guards completes.
struct PendingActivation<'a> {
    dispatcher: &'a AdvisoryDispatcher,
    armed: bool,
}

impl<'a> PendingActivation<'a> {
    fn activate(dispatcher: &'a AdvisoryDispatcher) -> Self {
        dispatcher.activate();
        Self {
            dispatcher,
            armed: true,
        }
    }

    fn complete(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingActivation<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.dispatcher.deactivate();
        }
    }
}

/// Listens to one account's JetStream advisories and feeds the shared metrics.
///
/// A stopped listener cannot be restarted; build a new one instead.
pub struct AdvisoryListener {
    source_id: String,
    config: AdvisoryConfig,
    options: ConnectionOptions,
    dispatcher: Arc<AdvisoryDispatcher>,
    lifecycle: Mutex<Lifecycle>,
}

impl AdvisoryListener {
    /// Loads the account configuration at `config_path` and builds a listener
    /// in the `Created` state.
    ///
    /// `transport` must be connected for this account, with the options
    /// returned by [`ConnectionOptions::for_account`]; the listener counts
    /// whatever that connection delivers under its own account label.
    pub fn new(
        config_path: impl AsRef<Path>,
        options: &ConnectionOptions,
        transport: Arc<dyn AdvisoryTransport>,
        metrics: Arc<JetStreamMetrics>,
    ) -> Result<Self, ConfigError> {
        let config_path = config_path.as_ref();
        let config = AdvisoryConfig::load(config_path)?;

        Ok(Self::from_config(
            &config_path.display().to_string(),
            config,
            options,
            transport,
            metrics,
        ))
    }

    /// Builds a listener from an already validated configuration.
    pub fn from_config(
        source_id: &str,
        config: AdvisoryConfig,
        options: &ConnectionOptions,
        transport: Arc<dyn AdvisoryTransport>,
        metrics: Arc<JetStreamMetrics>,
    ) -> Self {
        let dispatcher = Arc::new(AdvisoryDispatcher::new(config.account(), metrics));
        dispatcher.deactivate();

        debug!(
            event = events::LISTENER_CREATED,
            component = COMPONENT,
            source_id,
            account = config.account(),
            "advisory listener created"
        );

        let handler: Arc<dyn AdvisoryHandler> = dispatcher.clone();
        let lifecycle = Lifecycle {
            phase: ListenerState::Created,
            subscriptions: SubscriptionSet::new(transport, handler),
        };

        Self {
            source_id: source_id.to_string(),
            options: options.for_account(&config),
            config,
            dispatcher,
            lifecycle: Mutex::new(lifecycle),
        }
    }

    pub fn id(&self) -> &str {
        self.config.id()
    }

    pub fn account(&self) -> &str {
        self.config.account()
    }

    pub fn config(&self) -> &AdvisoryConfig {
        &self.config
    }

    /// Connection options with this account's credentials applied.
    pub fn connection_options(&self) -> &ConnectionOptions {
        &self.options
    }

    pub async fn state(&self) -> ListenerState {
        self.lifecycle.lock().await.phase
    }

    /// Subscribes to the advisory subjects and moves to `Running`.
    ///
    /// On a refused subscription the listener stays in `Created` with no
    /// subscriptions left behind, and may be started again. If the returned
    /// future is dropped before it completes, the listener also stays in
    /// `Created`; whatever it subscribed so far is released by the next
    /// `start` or `stop`.
    pub async fn start(&self) -> Result<(), ListenerError> {
        let mut lifecycle = self.lifecycle.lock().await;
        let lifecycle = &mut *lifecycle;
        let account = self.config.account();

        match lifecycle.phase {
            ListenerState::Created => {}
            ListenerState::Running => return Err(ListenerError::AlreadyRunning),
            ListenerState::Stopped => return Err(ListenerError::Stopped),
        }

        if let Err(err) = self.config.validate(&self.source_id) {
            warn!(
                event = events::LISTENER_START_REJECTED,
                component = COMPONENT,
                account,
                err = %err,
                "refusing to start with invalid configuration"
            );
            return Err(err.into());
        }

        if !lifecycle.subscriptions.is_empty() {
            debug!(
                event = events::LISTENER_START_RESUMED,
                component = COMPONENT,
                account,
                leftover = ?lifecycle.subscriptions.subjects(),
                "releasing subscriptions of an interrupted start"
            );
            lifecycle.subscriptions.unsubscribe_all(account).await;
        }

        let activation = PendingActivation::activate(&self.dispatcher);
        lifecycle
            .subscriptions
            .subscribe_all(ADVISORY_SUBSCRIPTIONS, account)
            .await?;
        activation.complete();

        info!(
            event = events::LISTENER_STARTED,
            component = COMPONENT,
            account,
            subjects = ?lifecycle.subscriptions.subjects(),
            "advisory listener started"
        );
        lifecycle.phase = ListenerState::Running;
        Ok(())
    }

    /// Tears down every subscription and moves to `Stopped`. Safe to call in
    /// any state; once it returns this listener increments nothing.
    pub async fn stop(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        let lifecycle = &mut *lifecycle;
        let account = self.config.account();

        self.dispatcher.deactivate();

        let previous = std::mem::replace(&mut lifecycle.phase, ListenerState::Stopped);
        if lifecycle.subscriptions.is_empty() {
            debug!(
                event = events::LISTENER_STOP_NOOP,
                component = COMPONENT,
                account,
                ?previous,
                "advisory listener was not running"
            );
            return;
        }

        lifecycle.subscriptions.unsubscribe_all(account).await;
        info!(
            event = events::LISTENER_STOPPED,
            component = COMPONENT,
            account,
            ?previous,
            "advisory listener stopped"
        );
    }
}

impl Debug for AdvisoryListener {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdvisoryListener")
            .field("source_id", &self.source_id)
            .field("account", &self.config.account())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::{AdvisoryListener, ListenerState};
    use crate::config::{AdvisoryConfig, ConnectionOptions};
    use crate::listener::ListenerError;
    use crate::metrics::JetStreamMetrics;
    use crate::transport::{AdvisoryHandler, AdvisoryTransport, StatusCode, TransportStatus};
    use async_trait::async_trait;
    use prometheus::Registry;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex as StdMutex};
    use std::time::Duration;

    #[derive(Default)]
    struct CountingTransport {
        subscribes: AtomicUsize,
        unsubscribes: AtomicUsize,
        refuse_after: Option<usize>,
    }

    #[async_trait]
    impl AdvisoryTransport for CountingTransport {
        async fn subscribe(
            &self,
            _subject: &str,
            _handler: Arc<dyn AdvisoryHandler>,
        ) -> Result<(), TransportStatus> {
            let made = self.subscribes.load(Ordering::SeqCst);
            if self.refuse_after == Some(made) {
                return Err(TransportStatus::fail_with_code(
                    StatusCode::PermissionDenied,
                    "refused in test",
                ));
            }
            self.subscribes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn unsubscribe(
            &self,
            _subject: &str,
            _handler: Arc<dyn AdvisoryHandler>,
        ) -> Result<(), TransportStatus> {
            self.unsubscribes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Accepts subscriptions but never answers the one at `stall_at`, which
    /// the server has already registered by then.
    struct StallingTransport {
        stall_at: usize,
        calls: AtomicUsize,
        live: StdMutex<HashSet<String>>,
    }

    impl StallingTransport {
        fn new(stall_at: usize) -> Self {
            Self {
                stall_at,
                calls: AtomicUsize::new(0),
                live: StdMutex::default(),
            }
        }

        fn live_count(&self) -> usize {
            self.live.lock().expect("lock live").len()
        }
    }

    #[async_trait]
    impl AdvisoryTransport for StallingTransport {
        async fn subscribe(
            &self,
            subject: &str,
            _handler: Arc<dyn AdvisoryHandler>,
        ) -> Result<(), TransportStatus> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            self.live
                .lock()
                .expect("lock live")
                .insert(subject.to_string());
            if call == self.stall_at {
                futures::future::pending::<()>().await;
            }
            Ok(())
        }

        async fn unsubscribe(
            &self,
            subject: &str,
            _handler: Arc<dyn AdvisoryHandler>,
        ) -> Result<(), TransportStatus> {
            if self.live.lock().expect("lock live").remove(subject) {
                Ok(())
            } else {
                Err(TransportStatus::fail_with_code(
                    StatusCode::NotFound,
                    "no such subscription",
                ))
            }
        }
    }

    fn listener(
        transport: Arc<dyn AdvisoryTransport>,
        config: AdvisoryConfig,
    ) -> AdvisoryListener {
        let metrics = JetStreamMetrics::register(&Registry::new()).expect("registration");
        AdvisoryListener::from_config(
            "inline",
            config,
            &ConnectionOptions::new(["nats://127.0.0.1:4222"]),
            transport,
            Arc::new(metrics),
        )
    }

    fn global() -> AdvisoryConfig {
        AdvisoryConfig::from_slice("inline", br#"{"name": "global"}"#).expect("valid config")
    }

    #[tokio::test]
    async fn start_then_stop_walks_the_state_machine() {
        let transport = Arc::new(CountingTransport::default());
        let listener = listener(transport.clone(), global());

        assert_eq!(listener.state().await, ListenerState::Created);
        listener.start().await.expect("start");
        assert_eq!(listener.state().await, ListenerState::Running);
        assert!(listener.dispatcher.is_active());

        listener.stop().await;
        assert_eq!(listener.state().await, ListenerState::Stopped);
        assert!(!listener.dispatcher.is_active());

        let subscribed = transport.subscribes.load(Ordering::SeqCst);
        assert_eq!(subscribed, crate::routing::ADVISORY_SUBSCRIPTIONS.len());
        assert_eq!(transport.unsubscribes.load(Ordering::SeqCst), subscribed);
    }

    #[tokio::test]
    async fn stop_is_idempotent_and_final() {
        let transport = Arc::new(CountingTransport::default());
        let listener = listener(transport.clone(), global());

        listener.start().await.expect("start");
        listener.stop().await;
        listener.stop().await;

        let subscribed = transport.subscribes.load(Ordering::SeqCst);
        assert_eq!(transport.unsubscribes.load(Ordering::SeqCst), subscribed);
        assert!(matches!(
            listener.start().await,
            Err(ListenerError::Stopped)
        ));
    }

    #[tokio::test]
    async fn stop_before_start_subscribes_nothing() {
        let transport = Arc::new(CountingTransport::default());
        let listener = listener(transport.clone(), global());

        listener.stop().await;

        assert_eq!(listener.state().await, ListenerState::Stopped);
        assert_eq!(transport.subscribes.load(Ordering::SeqCst), 0);
        assert_eq!(transport.unsubscribes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn double_start_is_rejected() {
        let transport = Arc::new(CountingTransport::default());
        let listener = listener(transport, global());

        listener.start().await.expect("start");
        assert!(matches!(
            listener.start().await,
            Err(ListenerError::AlreadyRunning)
        ));
        listener.stop().await;
    }

    #[tokio::test]
    async fn refused_subscription_leaves_listener_created() {
        let transport = Arc::new(CountingTransport {
            refuse_after: Some(1),
            ..Default::default()
        });
        let listener = listener(transport.clone(), global());

        let err = listener.start().await.expect_err("refused");

        assert!(matches!(err, ListenerError::Subscribe { .. }));
        assert_eq!(listener.state().await, ListenerState::Created);
        assert!(!listener.dispatcher.is_active());
        assert_eq!(transport.subscribes.load(Ordering::SeqCst), 1);
        assert_eq!(transport.unsubscribes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn start_revalidates_configuration() {
        let transport = Arc::new(CountingTransport::default());
        let listener = listener(transport.clone(), AdvisoryConfig::default());

        let err = listener.start().await.expect_err("invalid config");

        assert_eq!(
            err.to_string(),
            "invalid JetStream advisory configuration: inline: name is required"
        );
        assert_eq!(listener.state().await, ListenerState::Created);
        assert_eq!(transport.subscribes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn interrupted_start_is_released_by_stop() {
        let transport = Arc::new(StallingTransport::new(1));
        let listener = listener(transport.clone(), global());

        let interrupted =
            tokio::time::timeout(Duration::from_millis(50), listener.start()).await;

        assert!(interrupted.is_err(), "start should still be pending");
        assert_eq!(listener.state().await, ListenerState::Created);
        assert!(!listener.dispatcher.is_active());
        assert_eq!(transport.live_count(), 2);

        listener.stop().await;

        assert_eq!(listener.state().await, ListenerState::Stopped);
        assert_eq!(transport.live_count(), 0);
    }

    #[tokio::test]
    async fn start_after_interrupted_start_replaces_leftovers() {
        let transport = Arc::new(StallingTransport::new(0));
        let listener = listener(transport.clone(), global());

        let interrupted =
            tokio::time::timeout(Duration::from_millis(50), listener.start()).await;
        assert!(interrupted.is_err(), "start should still be pending");
        assert_eq!(transport.live_count(), 1);

        listener.start().await.expect("second start");

        assert_eq!(listener.state().await, ListenerState::Running);
        assert_eq!(
            transport.live_count(),
            crate::routing::ADVISORY_SUBSCRIPTIONS.len()
        );

        listener.stop().await;
        assert_eq!(transport.live_count(), 0);
    }

    #[test]
    fn connection_options_carry_account_credentials() {
        let config = AdvisoryConfig::from_slice(
            "inline",
            br#"{"name": "global", "credential": "/etc/nats/global.creds"}"#,
        )
        .expect("valid config");
        let listener = listener(Arc::new(CountingTransport::default()), config);

        assert_eq!(
            listener.connection_options().credentials,
            "/etc/nats/global.creds"
        );
        assert_eq!(listener.account(), "global");
    }
}
