use std::{
    collections::HashMap,
    future::Future,
    sync::Arc,
    time::{Duration, SystemTime},
};

use poise::serenity_prelude::{ChannelId, EditMessage, Http, MessageId};
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{sleep, Instant},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::{
    tournament::announcement::{Announcement, REGISTRATION_CLOSED},
    BotError,
};

/// Longest time between two edits of a running countdown.
pub const TICK: Duration = Duration::from_secs(60);

/// Something that displays a countdown, usually the registration field of an announcement.
pub trait CountdownTarget: Send + Sync + 'static {
    /// Shows the time left before the deadline.
    fn refresh(&self, remaining: Duration) -> impl Future<Output = Result<(), BotError>> + Send;

    /// Shows that the deadline has passed.
    fn close(&self) -> impl Future<Output = Result<(), BotError>> + Send;
}

/// How a ticker ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerOutcome {
    /// The deadline passed and the closing text was written.
    Closed,
    /// The deadline passed but writing the closing text failed.
    CloseFailed,
    /// An edit failed while the countdown was running.
    EditFailed,
    /// Cancelled from the outside before the deadline.
    Cancelled,
}

/// A registration deadline, both as a unix timestamp for display and as a monotonic instant.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    pub timestamp: i64,
    at: Instant,
}

impl Deadline {
    /// A deadline `after` from now.
    pub fn after(after: Duration) -> Self {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default();
        Self {
            timestamp: (now + after).as_secs() as i64,
            at: Instant::now() + after,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }
}

/// Handle to a running ticker. Dropping it does not stop the ticker, cancelling does.
#[derive(Debug)]
pub struct CountdownHandle {
    cancel: CancellationToken,
    task: JoinHandle<TickerOutcome>,
}

impl CountdownHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the ticker to end. A panicked or aborted ticker counts as cancelled.
    pub async fn join(self) -> TickerOutcome {
        self.task.await.unwrap_or(TickerOutcome::Cancelled)
    }
}

/// Starts a ticker for `target` that runs until `deadline` or until cancelled.
pub fn spawn<T: CountdownTarget>(target: T, deadline: Deadline) -> CountdownHandle {
    let cancel = CancellationToken::new();
    let task = tokio::spawn(run(target, deadline, cancel.clone()));
    CountdownHandle { cancel, task }
}

async fn run<T: CountdownTarget>(
    target: T,
    deadline: Deadline,
    cancel: CancellationToken,
) -> TickerOutcome {
    loop {
        let nap = deadline.remaining().min(TICK);
        tokio::select! {
            _ = cancel.cancelled() => return TickerOutcome::Cancelled,
            _ = sleep(nap) => {}
        }

        let remaining = deadline.remaining();
        if remaining.is_zero() {
            break;
        }
        if let Err(e) = target.refresh(remaining).await {
            warn!("Stopping countdown, the announcement could not be edited: {}", e);
            return TickerOutcome::EditFailed;
        }
    }

    match target.close().await {
        Ok(()) => TickerOutcome::Closed,
        Err(e) => {
            debug!("Could not write the closing text of a countdown: {}", e);
            TickerOutcome::CloseFailed
        }
    }
}

/// Every ticker started by this process, keyed by the message it edits.
#[derive(Debug, Clone, Default)]
pub struct Countdowns {
    tickers: Arc<Mutex<HashMap<MessageId, CountdownHandle>>>,
}

impl Countdowns {
    /// Keeps `handle` reachable through `message_id`, dropping tickers that already ended.
    pub async fn track(&self, message_id: MessageId, handle: CountdownHandle) {
        let mut tickers = self.tickers.lock().await;
        tickers.retain(|_, ticker| !ticker.is_finished());
        if let Some(previous) = tickers.insert(message_id, handle) {
            previous.cancel();
        }
    }

    /// Stops the ticker bound to `message_id`. Returns whether one was running.
    pub async fn cancel(&self, message_id: MessageId) -> bool {
        match self.tickers.lock().await.remove(&message_id) {
            Some(ticker) => {
                let running = !ticker.is_finished();
                ticker.cancel();
                running
            }
            None => false,
        }
    }

    /// Stops every ticker and waits for them to end.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) {
        let tickers: Vec<_> = self.tickers.lock().await.drain().map(|(_, t)| t).collect();
        info!("Stopping {} countdown(s)", tickers.len());
        for ticker in &tickers {
            ticker.cancel();
        }
        futures::future::join_all(tickers.into_iter().map(CountdownHandle::join)).await;
    }

    pub async fn len(&self) -> usize {
        self.tickers.lock().await.len()
    }
}

/// A posted announcement whose registration field is kept up to date.
pub struct AnnouncementMessage {
    pub http: Arc<Http>,
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub announcement: Announcement,
}

impl AnnouncementMessage {
    async fn show(&self, registration: &str) -> Result<(), BotError> {
        self.channel_id
            .edit_message(
                &self.http,
                self.message_id,
                EditMessage::new().embed(self.announcement.embed(registration)),
            )
            .await?;
        Ok(())
    }
}

impl CountdownTarget for AnnouncementMessage {
    fn refresh(&self, remaining: Duration) -> impl Future<Output = Result<(), BotError>> + Send {
        async move { self.show(&self.announcement.countdown(remaining)).await }
    }

    fn close(&self) -> impl Future<Output = Result<(), BotError>> + Send {
        self.show(REGISTRATION_CLOSED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::Mutex as StdMutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Edit {
        Refresh { at: u64, remaining: u64 },
        Close { at: u64 },
    }

    /// Records every edit along with the elapsed (paused) time.
    #[derive(Clone)]
    struct Recorder {
        start: Instant,
        edits: Arc<StdMutex<Vec<Edit>>>,
        fail_refresh_after: Option<usize>,
        fail_close: bool,
    }

    impl Recorder {
        fn new() -> Self {
            Self {
                start: Instant::now(),
                edits: Arc::default(),
                fail_refresh_after: None,
                fail_close: false,
            }
        }

        fn edits(&self) -> Vec<Edit> {
            self.edits.lock().unwrap().clone()
        }
    }

    impl CountdownTarget for Recorder {
        fn refresh(&self, remaining: Duration) -> impl Future<Output = Result<(), BotError>> + Send {
            let mut edits = self.edits.lock().unwrap();
            let result = match self.fail_refresh_after {
                Some(limit) if edits.len() >= limit => Err(anyhow!("Unknown Message")),
                _ => {
                    edits.push(Edit::Refresh {
                        at: self.start.elapsed().as_secs(),
                        remaining: remaining.as_secs(),
                    });
                    Ok(())
                }
            };
            async move { result }
        }

        fn close(&self) -> impl Future<Output = Result<(), BotError>> + Send {
            let result = if self.fail_close {
                Err(anyhow!("Missing Permissions"))
            } else {
                self.edits.lock().unwrap().push(Edit::Close {
                    at: self.start.elapsed().as_secs(),
                });
                Ok(())
            };
            async move { result }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn edits_every_minute_then_closes_once() {
        let recorder = Recorder::new();
        let handle = spawn(recorder.clone(), Deadline::after(Duration::from_secs(125)));

        assert_eq!(handle.join().await, TickerOutcome::Closed);
        assert_eq!(
            recorder.edits(),
            vec![
                Edit::Refresh { at: 60, remaining: 65 },
                Edit::Refresh { at: 120, remaining: 5 },
                Edit::Close { at: 125 },
            ]
        );

        sleep(Duration::from_secs(600)).await;
        assert_eq!(recorder.edits().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn short_deadline_closes_without_refreshing() {
        let recorder = Recorder::new();
        let handle = spawn(recorder.clone(), Deadline::after(Duration::from_secs(30)));

        assert_eq!(handle.join().await, TickerOutcome::Closed);
        assert_eq!(recorder.edits(), vec![Edit::Close { at: 30 }]);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_edit_stops_without_closing() {
        let mut recorder = Recorder::new();
        recorder.fail_refresh_after = Some(1);
        let handle = spawn(recorder.clone(), Deadline::after(Duration::from_secs(600)));

        assert_eq!(handle.join().await, TickerOutcome::EditFailed);
        assert_eq!(
            recorder.edits(),
            vec![Edit::Refresh { at: 60, remaining: 540 }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failed_close_ends_quietly() {
        let mut recorder = Recorder::new();
        recorder.fail_close = true;
        let handle = spawn(recorder.clone(), Deadline::after(Duration::from_secs(90)));

        assert_eq!(handle.join().await, TickerOutcome::CloseFailed);
        assert_eq!(
            recorder.edits(),
            vec![Edit::Refresh { at: 60, remaining: 30 }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_ticker_never_edits_again() {
        let recorder = Recorder::new();
        let handle = spawn(recorder.clone(), Deadline::after(Duration::from_secs(3600)));

        sleep(Duration::from_secs(150)).await;
        handle.cancel();

        assert_eq!(handle.join().await, TickerOutcome::Cancelled);
        assert_eq!(recorder.edits().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn registry_cancels_by_message() {
        let countdowns = Countdowns::default();
        let recorder = Recorder::new();
        countdowns
            .track(
                MessageId::new(1),
                spawn(recorder.clone(), Deadline::after(Duration::from_secs(3600))),
            )
            .await;
        countdowns
            .track(
                MessageId::new(2),
                spawn(recorder.clone(), Deadline::after(Duration::from_secs(3600))),
            )
            .await;
        assert_eq!(countdowns.len().await, 2);

        assert!(countdowns.cancel(MessageId::new(1)).await);
        assert!(!countdowns.cancel(MessageId::new(1)).await);
        assert!(!countdowns.cancel(MessageId::new(3)).await);
        assert_eq!(countdowns.len().await, 1);

        countdowns.shutdown().await;
        assert_eq!(countdowns.len().await, 0);

        sleep(Duration::from_secs(7200)).await;
        assert!(recorder.edits().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn finished_tickers_are_pruned() {
        let countdowns = Countdowns::default();
        let recorder = Recorder::new();
        countdowns
            .track(
                MessageId::new(1),
                spawn(recorder.clone(), Deadline::after(Duration::from_secs(10))),
            )
            .await;

        sleep(Duration::from_secs(20)).await;
        countdowns
            .track(
                MessageId::new(2),
                spawn(recorder.clone(), Deadline::after(Duration::from_secs(3600))),
            )
            .await;

        assert_eq!(countdowns.len().await, 1);
        assert_eq!(recorder.edits(), vec![Edit::Close { at: 10 }]);
        countdowns.shutdown().await;
    }
}
