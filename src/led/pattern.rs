//! Blink patterns for the status LED

use super::LedState;
use std::collections::HashMap;
use std::time::Duration;

/// One level held for a fixed time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternStep {
    pub level: bool,
    pub duration: Duration,
}

impl PatternStep {
    pub const fn on(ms: u64) -> Self {
        Self {
            level: true,
            duration: Duration::from_millis(ms),
        }
    }

    pub const fn off(ms: u64) -> Self {
        Self {
            level: false,
            duration: Duration::from_millis(ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedPattern {
    pub steps: Vec<PatternStep>,
    /// Played again once it finishes and nothing else was requested
    pub repeatable: bool,
    /// Error patterns are sticky: once shown, no other state replaces them
    pub error: bool,
}

impl LedPattern {
    fn new(steps: Vec<PatternStep>, repeatable: bool, error: bool) -> Self {
        Self {
            steps,
            repeatable,
            error,
        }
    }

    /// Wall time of one pass through the pattern
    pub fn period(&self) -> Duration {
        self.steps.iter().map(|step| step.duration).sum()
    }
}

/// Pattern for every known state
#[derive(Debug, Clone)]
pub struct PatternTable {
    patterns: HashMap<LedState, LedPattern>,
}

impl PatternTable {
    pub fn get(&self, state: LedState) -> Option<&LedPattern> {
        self.patterns.get(&state)
    }

    pub fn is_error(&self, state: LedState) -> bool {
        self.get(state).is_some_and(|pattern| pattern.error)
    }
}

impl Default for PatternTable {
    fn default() -> Self {
        use PatternStep as S;

        let connected = (0..5).flat_map(|_| [S::on(200), S::off(200)]).collect();

        let patterns = HashMap::from([
            (LedState::None, LedPattern::new(vec![S::off(1000)], false, false)),
            (LedState::Streaming, LedPattern::new(vec![S::on(1000)], true, false)),
            (
                LedState::StoppedStreaming,
                LedPattern::new(vec![S::off(1000)], true, false),
            ),
            (
                LedState::CameraError,
                LedPattern::new(
                    vec![S::on(300), S::off(300), S::on(300), S::off(300)],
                    true,
                    true,
                ),
            ),
            (
                LedState::WifiConnecting,
                LedPattern::new(vec![S::on(400), S::off(400)], true, false),
            ),
            (LedState::WifiConnected, LedPattern::new(connected, false, false)),
            (
                LedState::WifiError,
                LedPattern::new(
                    vec![S::on(200), S::off(100), S::on(500), S::off(100), S::on(200)],
                    true,
                    true,
                ),
            ),
        ]);

        Self { patterns }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_state_has_a_pattern() {
        let table = PatternTable::default();
        for state in LedState::ALL {
            let pattern = table.get(state).unwrap();
            assert!(!pattern.steps.is_empty(), "{state:?}");
        }
    }

    #[test]
    fn test_connected_blinks_five_times_once() {
        let table = PatternTable::default();
        let pattern = table.get(LedState::WifiConnected).unwrap();

        assert_eq!(pattern.steps.iter().filter(|s| s.level).count(), 5);
        assert_eq!(pattern.period(), Duration::from_millis(2000));
        assert!(!pattern.repeatable);
    }

    #[test]
    fn test_error_states() {
        let table = PatternTable::default();
        let errors: Vec<_> = LedState::ALL.into_iter().filter(|s| table.is_error(*s)).collect();
        assert_eq!(errors, vec![LedState::CameraError, LedState::WifiError]);
    }
}
