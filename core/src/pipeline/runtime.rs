//! Serialised event loop around [`PipelineState`].
//!
//! Location updates, gyroscope updates and control commands are queued on one
//! channel and applied by a single task. The recording timer lives in the same
//! task and is only polled while a session is active, so once a stop has been
//! acknowledged no further row can be written.

use crate::pipeline::state::{PipelineSnapshot, PipelineState};
use crate::prelude::{PipelineError, PipelineResult, RecordingError};
use crate::recording::TickOutcome;
use crate::signal::{GyroSample, SpeedSample};
use chrono::Local;
use log::{debug, error, info};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Interval, MissedTickBehavior};

const EVENT_QUEUE_DEPTH: usize = 256;

type Reply = oneshot::Sender<Result<(), RecordingError>>;

#[derive(Debug)]
pub enum PipelineEvent {
    Location(SpeedSample),
    Gyro(GyroSample),
    Annotate(String),
    StartRecording(Reply),
    StopRecording(Reply),
    Shutdown,
}

/// Cloneable producer side of the pipeline.
#[derive(Clone)]
pub struct PipelineHandle {
    events: mpsc::Sender<PipelineEvent>,
    snapshots: watch::Receiver<PipelineSnapshot>,
}

impl PipelineHandle {
    async fn send(&self, event: PipelineEvent) -> PipelineResult<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| PipelineError::Closed)
    }

    async fn request(&self, build: impl FnOnce(Reply) -> PipelineEvent) -> PipelineResult<()> {
        let (reply, response) = oneshot::channel();
        self.send(build(reply)).await?;
        response.await.map_err(|_| PipelineError::Closed)??;
        Ok(())
    }

    pub async fn location(&self, sample: SpeedSample) -> PipelineResult<()> {
        self.send(PipelineEvent::Location(sample)).await
    }

    pub async fn gyro(&self, sample: GyroSample) -> PipelineResult<()> {
        self.send(PipelineEvent::Gyro(sample)).await
    }

    pub async fn annotate(&self, text: impl Into<String>) -> PipelineResult<()> {
        self.send(PipelineEvent::Annotate(text.into())).await
    }

    pub async fn start_recording(&self) -> PipelineResult<()> {
        self.request(PipelineEvent::StartRecording).await
    }

    /// Resolves once the session is closed and its timer cancelled.
    pub async fn stop_recording(&self) -> PipelineResult<()> {
        self.request(PipelineEvent::StopRecording).await
    }

    pub async fn shutdown(&self) -> PipelineResult<()> {
        self.send(PipelineEvent::Shutdown).await
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> PipelineSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified after every applied event.
    pub fn subscribe(&self) -> watch::Receiver<PipelineSnapshot> {
        self.snapshots.clone()
    }
}

/// Moves `state` into a new task and returns its handle. The task hands the
/// state back when it stops. Must be called inside a tokio runtime.
pub fn spawn(state: PipelineState) -> (PipelineHandle, JoinHandle<PipelineState>) {
    let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
    let (snapshot_tx, snapshot_rx) = watch::channel(state.snapshot());
    let task = tokio::spawn(run(state, events_rx, snapshot_tx));
    (
        PipelineHandle {
            events: events_tx,
            snapshots: snapshot_rx,
        },
        task,
    )
}

fn recording_timer(period: Duration) -> Interval {
    let mut timer = time::interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    timer
}

async fn run(
    mut state: PipelineState,
    mut events: mpsc::Receiver<PipelineEvent>,
    snapshots: watch::Sender<PipelineSnapshot>,
) -> PipelineState {
    let period = Duration::from_millis(state.config().record_interval_ms);
    let mut timer: Option<Interval> = None;

    loop {
        let event = match timer.as_mut() {
            Some(interval) => tokio::select! {
                // Timer first so a busy queue cannot hold back due rows.
                biased;
                _ = interval.tick() => {
                    if let TickOutcome::Written(row) = state.record_tick(Local::now().naive_local()) {
                        debug!("recorded row at {}", row.timestamp);
                    }
                    let _ = snapshots.send(state.snapshot());
                    continue;
                }
                event = events.recv() => event,
            },
            None => events.recv().await,
        };

        let Some(event) = event else {
            break;
        };

        let acknowledgement = match event {
            PipelineEvent::Location(sample) => {
                state.on_location(sample);
                None
            }
            PipelineEvent::Gyro(sample) => {
                state.on_gyro(sample);
                None
            }
            PipelineEvent::Annotate(text) => {
                state.annotate(text);
                None
            }
            PipelineEvent::StartRecording(reply) => {
                let result = state.start_recording(Local::now().naive_local());
                if result.is_ok() {
                    timer = Some(recording_timer(period));
                }
                Some((reply, result))
            }
            PipelineEvent::StopRecording(reply) => {
                timer = None;
                Some((reply, state.stop_recording()))
            }
            PipelineEvent::Shutdown => break,
        };

        // Snapshot goes out before the reply.
        let _ = snapshots.send(state.snapshot());
        if let Some((reply, result)) = acknowledgement {
            let _ = reply.send(result);
        }
    }

    if state.is_recording() {
        if let Err(err) = state.stop_recording() {
            error!("closing recording on shutdown: {}", err);
        }
    }
    let _ = snapshots.send(state.snapshot());
    info!("pipeline event loop stopped");
    state
}
