// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Watching a module for changed testing packages
//!
//! A [`Watcher`] lazily starts one registry task per module. The task
//! owns the scanner, the latest snapshot and every subscriber; handles
//! talk to it through a message queue. Each subscriber gets a
//! single-slot [`DiffStream`]: a diff the subscriber has not picked up
//! by the next tick is withdrawn and replaced by one against the
//! snapshot the subscriber actually holds.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use lookout_packages::{DEFAULT_IGNORED, Module, PackageSnapshot, Scanner, diff};
use lookout_source::{Parser, SuiteFramework};
use lookout_tests::{GoRunner, TestRunner};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::diff::Diff;
use crate::error::WatchError;
use crate::package::PackageContext;
use crate::slot::{SlotReceiver, SlotSender, slot};

/// Capacity of the registry's message queue
const MESSAGE_QUEUE: usize = 32;

/// Stream of diffs delivered to one subscriber
pub type DiffStream = SlotReceiver<Diff>;

/// Settings of a watcher
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Directory inside the watched module
    pub dir: PathBuf,
    /// Time between two scans
    pub interval: Duration,
    /// Time a package's test run may take
    pub timeout: Duration,
    /// Directory names skipped while scanning
    pub ignored: Vec<String>,
    /// Suite framework test files are parsed for
    pub framework: SuiteFramework,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            interval: Duration::from_millis(200),
            timeout: Duration::from_secs(10),
            ignored: DEFAULT_IGNORED.iter().map(ToString::to_string).collect(),
            framework: SuiteFramework::default(),
        }
    }
}

/// Identifies a subscriber of a watcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

enum Message {
    Register {
        reply: oneshot::Sender<(DiffStream, SubscriberId)>,
    },
    Quit(SubscriberId),
    QuitAll {
        reply: oneshot::Sender<()>,
    },
    IsWatched {
        reply: oneshot::Sender<bool>,
    },
}

/// Watches a Go module and delivers diffs of its testing packages
#[derive(Debug)]
pub struct Watcher {
    config: WatcherConfig,
    runner: Arc<dyn TestRunner>,
    control: Mutex<Option<mpsc::Sender<Message>>>,
}

impl Watcher {
    /// Create a watcher running tests with `go`
    #[must_use]
    pub fn new(config: WatcherConfig) -> Self {
        Self::with_runner(config, Arc::new(GoRunner::default()))
    }

    /// Create a watcher running tests with the given runner
    #[must_use]
    pub fn with_runner(config: WatcherConfig, runner: Arc<dyn TestRunner>) -> Self {
        Self {
            config,
            runner,
            control: Mutex::new(None),
        }
    }

    /// Subscribe to the module's diffs
    ///
    /// The first diff reports every testing package of the module.
    ///
    /// # Errors
    ///
    /// Returns `WatchError::ModuleNotFound` if the configured directory is
    /// not inside a Go module.
    pub async fn watch(&self) -> Result<(DiffStream, SubscriberId), WatchError> {
        let sender = {
            let mut control = self.control.lock().await;
            match control.as_ref().filter(|s| !s.is_closed()) {
                Some(sender) => sender.clone(),
                None => {
                    let sender = self.start()?;
                    *control = Some(sender.clone());
                    sender
                }
            }
        };
        let (reply, response) = oneshot::channel();
        sender
            .send(Message::Register { reply })
            .await
            .map_err(|_| WatchError::Stopped)?;
        response.await.map_err(|_| WatchError::Stopped)
    }

    /// Unsubscribe `id`, closing its stream
    pub async fn quit(&self, id: SubscriberId) {
        if let Some(sender) = self.sender().await {
            let _ = sender.send(Message::Quit(id)).await;
        }
    }

    /// Close every stream and stop the registry
    ///
    /// A later [`Watcher::watch`] starts a fresh registry.
    pub async fn quit_all(&self) {
        let Some(sender) = self.control.lock().await.take() else {
            return;
        };
        let (reply, done) = oneshot::channel();
        if sender.send(Message::QuitAll { reply }).await.is_ok() {
            let _ = done.await;
        }
    }

    /// Whether anyone is subscribed
    pub async fn is_watched(&self) -> bool {
        let Some(sender) = self.sender().await else {
            return false;
        };
        let (reply, response) = oneshot::channel();
        if sender.send(Message::IsWatched { reply }).await.is_err() {
            return false;
        }
        response.await.unwrap_or(false)
    }

    async fn sender(&self) -> Option<mpsc::Sender<Message>> {
        self.control.lock().await.clone()
    }

    fn start(&self) -> Result<mpsc::Sender<Message>, WatchError> {
        let module = Module::find(&self.config.dir)?;
        info!(
            module = %module.name(),
            root = %module.root().display(),
            "watching module"
        );
        let scanner = Scanner::new(module.root(), self.config.ignored.iter().cloned());
        let context = Arc::new(PackageContext {
            module,
            parser: Parser::new(self.config.framework.clone()),
            runner: Arc::clone(&self.runner),
            timeout: self.config.timeout,
        });
        let (sender, receiver) = mpsc::channel(MESSAGE_QUEUE);
        let registry = Registry {
            scanner: Some(scanner),
            ignored: self.config.ignored.clone(),
            context,
            current: Arc::new(PackageSnapshot::default()),
            subscribers: HashMap::new(),
        };
        tokio::spawn(registry.run(receiver, self.config.interval));
        Ok(sender)
    }
}

struct Subscriber {
    slot: SlotSender<Diff>,
    /// Snapshot the subscriber holds
    last_polled: Arc<PackageSnapshot>,
    /// Snapshot of the diff placed in the slot
    last_reported: Option<Arc<PackageSnapshot>>,
}

impl Subscriber {
    fn new(slot: SlotSender<Diff>) -> Self {
        Self {
            slot,
            last_polled: Arc::new(PackageSnapshot::default()),
            last_reported: None,
        }
    }

    /// Offer `current`, returning whether a diff was placed in the slot
    fn offer(&mut self, current: &Arc<PackageSnapshot>, context: &Arc<PackageContext>) -> bool {
        if self.slot.take().is_some() {
            self.last_reported = None;
        } else if let Some(reported) = self.last_reported.take() {
            self.last_polled = reported;
        }
        let Some(d) = diff(current, &self.last_polled) else {
            return false;
        };
        self.slot.replace(Diff::new(d, Arc::clone(context)));
        self.last_reported = Some(Arc::clone(current));
        true
    }
}

struct Registry {
    scanner: Option<Scanner>,
    ignored: Vec<String>,
    context: Arc<PackageContext>,
    current: Arc<PackageSnapshot>,
    subscribers: HashMap<SubscriberId, Subscriber>,
}

impl Registry {
    async fn run(mut self, mut messages: mpsc::Receiver<Message>, interval: Duration) {
        let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                message = messages.recv() => {
                    let Some(message) = message else {
                        break;
                    };
                    match message {
                        Message::Register { reply } => {
                            let (sender, stream) = slot();
                            let id = SubscriberId::new();
                            self.subscribers.insert(id, Subscriber::new(sender));
                            debug!(subscriber = %id, "subscribed");
                            let _ = reply.send((stream, id));
                        }
                        Message::Quit(id) => {
                            if let Some(subscriber) = self.subscribers.remove(&id) {
                                subscriber.slot.close();
                                debug!(subscriber = %id, "unsubscribed");
                            }
                        }
                        Message::QuitAll { reply } => {
                            self.close_all();
                            let _ = reply.send(());
                            break;
                        }
                        Message::IsWatched { reply } => {
                            let _ = reply.send(!self.subscribers.is_empty());
                        }
                    }
                }
                _ = ticker.tick() => self.tick().await,
            }
        }
        self.close_all();
        info!(module = %self.context.module.name(), "stopped watching");
    }

    async fn tick(&mut self) {
        self.subscribers.retain(|id, subscriber| {
            let connected = !subscriber.slot.is_disconnected();
            if !connected {
                debug!(subscriber = %id, "stream dropped");
            }
            connected
        });
        if self.subscribers.is_empty() {
            return;
        }

        let mut scanner = self
            .scanner
            .take()
            .unwrap_or_else(|| Scanner::new(self.context.module.root(), self.ignored.iter().cloned()));
        match tokio::task::spawn_blocking(move || {
            let snapshot = scanner.scan();
            (scanner, snapshot)
        })
        .await
        {
            Ok((scanner, snapshot)) => {
                self.scanner = Some(scanner);
                self.current = Arc::new(snapshot);
            }
            Err(e) => {
                warn!(error = %e, "scan failed");
                return;
            }
        }

        for (id, subscriber) in &mut self.subscribers {
            if subscriber.offer(&self.current, &self.context) {
                debug!(subscriber = %id, packages = self.current.len(), "diff queued");
            }
        }
    }

    fn close_all(&mut self) {
        for (_, subscriber) in self.subscribers.drain() {
            subscriber.slot.close();
        }
    }
}
