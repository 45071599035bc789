//! Status LED sequencer
//!
//! Requests are queued and only picked up between two passes of the current
//! pattern. A finished one-shot pattern leaves the LED dark until the next
//! request arrives.

use super::pattern::{LedPattern, PatternTable};
use super::LedState;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Drives a single on/off output
pub trait StatusPin: Send {
    fn set_level(&mut self, high: bool);
}

/// Pin that only logs its level changes
#[derive(Debug, Default)]
pub struct TracePin;

impl StatusPin for TracePin {
    fn set_level(&mut self, high: bool) {
        trace!("[LED] level {}", if high { "on" } else { "off" });
    }
}

/// Tracks which pattern is showing
#[derive(Debug)]
pub struct LedSequencer {
    table: PatternTable,
    current: LedState,
}

impl LedSequencer {
    pub fn new(table: PatternTable) -> Self {
        Self {
            table,
            current: LedState::None,
        }
    }

    pub fn current(&self) -> LedState {
        self.current
    }

    pub fn pattern(&self) -> Option<&LedPattern> {
        self.table.get(self.current)
    }

    /// Switch to `state`; returns whether the showing pattern changed
    pub fn request(&mut self, state: LedState) -> bool {
        if self.table.is_error(self.current) {
            return false;
        }
        if state == self.current || self.table.get(state).is_none() {
            return false;
        }

        debug!("[LED] {:?} -> {:?}", self.current, state);
        self.current = state;
        true
    }

    /// Whether the current pattern plays again when nothing else is queued
    pub fn repeats(&self) -> bool {
        self.pattern().is_some_and(|p| p.repeatable || p.error)
    }
}

async fn play<P: StatusPin>(pin: &mut P, pattern: &LedPattern) {
    for step in &pattern.steps {
        pin.set_level(step.level);
        tokio::time::sleep(step.duration).await;
    }
    pin.set_level(false);
}

/// Show requested states on `pin` until every sender is dropped
pub async fn run_status_led<P: StatusPin>(
    mut pin: P,
    table: PatternTable,
    mut requests: mpsc::Receiver<LedState>,
) {
    let mut sequencer = LedSequencer::new(table);

    loop {
        if let Some(pattern) = sequencer.pattern().cloned() {
            play(&mut pin, &pattern).await;
        }

        match requests.try_recv() {
            Ok(state) => {
                sequencer.request(state);
                continue;
            }
            Err(mpsc::error::TryRecvError::Disconnected) => break,
            Err(mpsc::error::TryRecvError::Empty) => {}
        }

        if sequencer.repeats() {
            continue;
        }

        match requests.recv().await {
            Some(state) => {
                sequencer.request(state);
            }
            None => break,
        }
    }

    debug!("[LED] request channel closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::time::Instant;

    #[derive(Clone, Default)]
    struct RecordingPin {
        levels: Arc<Mutex<Vec<(bool, Instant)>>>,
    }

    impl RecordingPin {
        fn highs(&self) -> usize {
            self.levels.lock().unwrap().iter().filter(|(level, _)| *level).count()
        }
    }

    impl StatusPin for RecordingPin {
        fn set_level(&mut self, high: bool) {
            self.levels.lock().unwrap().push((high, Instant::now()));
        }
    }

    #[test]
    fn test_same_state_is_ignored() {
        let mut seq = LedSequencer::new(PatternTable::default());
        assert!(seq.request(LedState::Streaming));
        assert!(!seq.request(LedState::Streaming));
        assert_eq!(seq.current(), LedState::Streaming);
    }

    #[test]
    fn test_error_state_is_sticky() {
        let mut seq = LedSequencer::new(PatternTable::default());
        assert!(seq.request(LedState::WifiError));
        assert!(!seq.request(LedState::WifiConnected));
        assert!(!seq.request(LedState::CameraError));
        assert_eq!(seq.current(), LedState::WifiError);
        assert!(seq.repeats());
    }

    #[test]
    fn test_one_shot_does_not_repeat() {
        let mut seq = LedSequencer::new(PatternTable::default());
        assert!(!seq.repeats());
        seq.request(LedState::WifiConnected);
        assert!(!seq.repeats());
        seq.request(LedState::WifiConnecting);
        assert!(seq.repeats());
    }

    #[tokio::test(start_paused = true)]
    async fn test_connected_pattern_plays_once() {
        let pin = RecordingPin::default();
        let (tx, rx) = mpsc::channel(4);
        let task = tokio::spawn(run_status_led(pin.clone(), PatternTable::default(), rx));

        tx.send(LedState::WifiConnected).await.unwrap();
        // idle pattern (1 s) then five blinks (2 s), then nothing
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(pin.highs(), 5);

        drop(tx);
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeating_pattern_keeps_blinking() {
        let pin = RecordingPin::default();
        let (tx, rx) = mpsc::channel(4);
        tx.send(LedState::WifiConnecting).await.unwrap();
        let task = tokio::spawn(run_status_led(pin.clone(), PatternTable::default(), rx));

        // 1 s idle, then 800 ms periods
        tokio::time::sleep(Duration::from_millis(1000 + 800 * 4 + 100)).await;
        assert_eq!(pin.highs(), 5);

        drop(tx);
        task.abort();
    }
}
