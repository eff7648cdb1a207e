use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;

use crate::domain::dtmf::{self, ToneTiming};
use crate::domain::errors::PlaybackError;
use crate::domain::ports::ToneOutput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackProgress {
    /// Tone for the character at this index of the code is sounding.
    Digit(usize),
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Completed,
    Cancelled,
}

/// Plays pickup codes on a single tone output, one code at a time.
pub struct PickupCodePlayer<O> {
    output: O,
    timing: ToneTiming,
    state: Mutex<PlayerState>,
    /// Id of the most recently stopped session.
    cancel: watch::Sender<u64>,
}

#[derive(Debug, Default)]
struct PlayerState {
    playing: bool,
    session: u64,
}

fn lock(state: &Mutex<PlayerState>) -> MutexGuard<'_, PlayerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One claimed playback. Clears the busy flag however playback ends,
/// including a dropped future.
struct Session<'a> {
    id: u64,
    state: &'a Mutex<PlayerState>,
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        lock(self.state).playing = false;
    }
}

/// Forwards digit progress and reports `Finished` once, when dropped.
struct ProgressSink<F: FnMut(PlaybackProgress)>(F);

impl<F: FnMut(PlaybackProgress)> ProgressSink<F> {
    fn digit(&mut self, index: usize) {
        (self.0)(PlaybackProgress::Digit(index));
    }
}

impl<F: FnMut(PlaybackProgress)> Drop for ProgressSink<F> {
    fn drop(&mut self) {
        (self.0)(PlaybackProgress::Finished);
    }
}

impl<O: ToneOutput> PickupCodePlayer<O> {
    pub fn new(output: O, timing: ToneTiming) -> Self {
        let (cancel, _) = watch::channel(0);
        Self {
            output,
            timing,
            state: Mutex::new(PlayerState::default()),
            cancel,
        }
    }

    pub fn timing(&self) -> &ToneTiming {
        &self.timing
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn is_playing(&self) -> bool {
        lock(&self.state).playing
    }

    /// Play `code` tone by tone.
    ///
    /// Fails with [`PlaybackError::AlreadyPlaying`] without touching the
    /// running sequence if another playback is in progress. Otherwise
    /// `on_progress` receives `Finished` exactly once when playback ends,
    /// whether it completed, was stopped, the output failed, or the
    /// returned future was dropped.
    pub async fn play<F>(&self, code: &str, on_progress: F) -> Result<PlaybackOutcome, PlaybackError>
    where
        F: FnMut(PlaybackProgress) + Send,
    {
        let session = match self.claim() {
            Ok(session) => session,
            Err(e) => {
                log::warn!("pickup code playback rejected: already playing");
                return Err(e);
            }
        };
        self.play_session(session, code, on_progress).await
    }

    fn claim(&self) -> Result<Session<'_>, PlaybackError> {
        let mut state = lock(&self.state);
        if state.playing {
            return Err(PlaybackError::AlreadyPlaying);
        }
        state.playing = true;
        state.session += 1;
        Ok(Session {
            id: state.session,
            state: &self.state,
        })
    }

    async fn play_session<F>(
        &self,
        session: Session<'_>,
        code: &str,
        on_progress: F,
    ) -> Result<PlaybackOutcome, PlaybackError>
    where
        F: FnMut(PlaybackProgress) + Send,
    {
        // A stop that lands before this point is still visible here.
        let mut cancel = self.cancel.subscribe();
        let mut progress = ProgressSink(on_progress);

        let events = dtmf::encode(code, &self.timing);
        log::debug!(
            "playing {} tones over {} ms",
            events.len(),
            dtmf::sequence_length(&events).as_millis()
        );

        self.run(&events, session.id, &mut cancel, &mut progress).await
    }

    async fn run<F>(
        &self,
        events: &[dtmf::ToneEvent],
        session: u64,
        cancel: &mut watch::Receiver<u64>,
        progress: &mut ProgressSink<F>,
    ) -> Result<PlaybackOutcome, PlaybackError>
    where
        F: FnMut(PlaybackProgress) + Send,
    {
        for event in events {
            if !pause(cancel, session, event.settle).await {
                return Ok(PlaybackOutcome::Cancelled);
            }
            progress.digit(event.index);
            if let Err(e) = self.output.start_tone(event.tone, event.duration) {
                self.output.stop();
                return Err(e);
            }
            if !pause(cancel, session, event.hold).await {
                return Ok(PlaybackOutcome::Cancelled);
            }
            if !event.gap.is_zero() && !pause(cancel, session, event.gap).await {
                return Ok(PlaybackOutcome::Cancelled);
            }
        }
        Ok(PlaybackOutcome::Completed)
    }

    /// Stop the in-flight sequence, silencing the current tone.
    pub fn stop(&self) {
        let state = lock(&self.state);
        if state.playing {
            self.cancel.send_replace(state.session);
            drop(state);
            self.output.stop();
        }
    }
}

/// Sleep for `duration`; `false` if `session` was stopped first.
async fn pause(cancel: &mut watch::Receiver<u64>, session: u64, duration: Duration) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duration) => true,
        _ = cancelled(cancel, session) => false,
    }
}

async fn cancelled(cancel: &mut watch::Receiver<u64>, session: u64) {
    loop {
        if *cancel.borrow_and_update() == session {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
