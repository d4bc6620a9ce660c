//! Typed update bus.
//!
//! Background workers hold a [`Publisher`] and push [`Update`]s into an
//! mpsc channel. The consumer thread owns the [`Bus`] and calls
//! [`Bus::pump`] from its loop; handlers only ever run there, in the order
//! updates were published.
use crate::models::{
    Category, CountryStatisticsView, CountryTimeseriesPoint, DownloadState, GlobalStatistics,
};
use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

/// One publication. Each variant belongs to exactly one [`Topic`].
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    GlobalUpdated(GlobalStatistics),
    CountriesUpdated(Vec<CountryStatisticsView>),
    TimeseriesUpdated {
        country_code: String,
        points: Vec<CountryTimeseriesPoint>,
    },
    StateChanged {
        category: Category,
        state: DownloadState,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Topic {
    GlobalUpdated,
    CountriesUpdated,
    TimeseriesUpdated,
    StateChanged(Category),
}

impl Update {
    pub fn topic(&self) -> Topic {
        match self {
            Update::GlobalUpdated(_) => Topic::GlobalUpdated,
            Update::CountriesUpdated(_) => Topic::CountriesUpdated,
            Update::TimeseriesUpdated { .. } => Topic::TimeseriesUpdated,
            Update::StateChanged { category, .. } => Topic::StateChanged(*category),
        }
    }
}

/// Sending half, cheap to clone into worker threads.
#[derive(Debug, Clone)]
pub struct Publisher {
    tx: Sender<Update>,
}

impl Publisher {
    /// Queue `update` for delivery on the consumer thread. Dropped silently
    /// once the bus is gone.
    pub fn publish(&self, update: Update) {
        if self.tx.send(update).is_err() {
            log::debug!("bus closed, dropping update");
        }
    }
}

/// Handle returned by [`Bus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Subscription(u64);

type Handler = Box<dyn FnMut(&Update)>;

/// Receiving half plus the handler table. Not `Send`: it lives on the
/// consumer thread.
pub struct Bus {
    tx: Sender<Update>,
    rx: Receiver<Update>,
    next_id: u64,
    handlers: BTreeMap<Subscription, (Topic, Handler)>,
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx,
            next_id: 0,
            handlers: BTreeMap::new(),
        }
    }

    pub fn publisher(&self) -> Publisher {
        Publisher {
            tx: self.tx.clone(),
        }
    }

    pub fn subscribe(
        &mut self,
        topic: Topic,
        handler: impl FnMut(&Update) + 'static,
    ) -> Subscription {
        let id = Subscription(self.next_id);
        self.next_id += 1;
        self.handlers.insert(id, (topic, Box::new(handler)));
        id
    }

    /// Remove a handler. Unknown or already removed subscriptions are ignored.
    pub fn unsubscribe(&mut self, subscription: Subscription) {
        self.handlers.remove(&subscription);
    }

    pub fn on_global(
        &mut self,
        mut handler: impl FnMut(&GlobalStatistics) + 'static,
    ) -> Subscription {
        self.subscribe(Topic::GlobalUpdated, move |u| {
            if let Update::GlobalUpdated(g) = u {
                handler(g)
            }
        })
    }

    pub fn on_countries(
        &mut self,
        mut handler: impl FnMut(&[CountryStatisticsView]) + 'static,
    ) -> Subscription {
        self.subscribe(Topic::CountriesUpdated, move |u| {
            if let Update::CountriesUpdated(list) = u {
                handler(list)
            }
        })
    }

    pub fn on_timeseries(
        &mut self,
        mut handler: impl FnMut(&str, &[CountryTimeseriesPoint]) + 'static,
    ) -> Subscription {
        self.subscribe(Topic::TimeseriesUpdated, move |u| {
            if let Update::TimeseriesUpdated { country_code, points } = u {
                handler(country_code, points)
            }
        })
    }

    pub fn on_state(
        &mut self,
        category: Category,
        mut handler: impl FnMut(DownloadState) + 'static,
    ) -> Subscription {
        self.subscribe(Topic::StateChanged(category), move |u| {
            if let Update::StateChanged { state, .. } = u {
                handler(*state)
            }
        })
    }

    /// Deliver everything queued so far. Returns how many updates were
    /// dispatched.
    pub fn pump(&mut self) -> usize {
        let mut n = 0;
        while let Ok(update) = self.rx.try_recv() {
            self.dispatch(&update);
            n += 1;
        }
        n
    }

    /// Wait up to `timeout` for one update, then drain the rest.
    pub fn pump_timeout(&mut self, timeout: Duration) -> usize {
        match self.rx.recv_timeout(timeout) {
            Ok(update) => {
                self.dispatch(&update);
                1 + self.pump()
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => 0,
        }
    }

    /// Keep delivering until `done` returns true for a delivered update or
    /// `timeout` elapses. Returns whether `done` was satisfied.
    pub fn pump_until(
        &mut self,
        timeout: Duration,
        mut done: impl FnMut(&Update) -> bool,
    ) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                return false;
            }
            match self.rx.recv_timeout(left) {
                Ok(update) => {
                    self.dispatch(&update);
                    if done(&update) {
                        return true;
                    }
                }
                Err(_) => return false,
            }
        }
    }

    fn dispatch(&mut self, update: &Update) {
        let topic = update.topic();
        for (t, handler) in self.handlers.values_mut() {
            if *t == topic {
                handler(update);
            }
        }
    }
}
