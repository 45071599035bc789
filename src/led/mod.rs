//! Status LED feedback
//!
//! Subsystems report what they are doing by queueing a [`LedState`]; the
//! sequencer task turns that into a blink pattern on the status pin.

mod pattern;
mod sequencer;

pub use pattern::PatternTable;
pub use sequencer::{run_status_led, TracePin};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedState {
    None,
    Streaming,
    StoppedStreaming,
    CameraError,
    WifiConnecting,
    WifiConnected,
    WifiError,
}

impl LedState {
    pub const ALL: [LedState; 7] = [
        LedState::None,
        LedState::Streaming,
        LedState::StoppedStreaming,
        LedState::CameraError,
        LedState::WifiConnecting,
        LedState::WifiConnected,
        LedState::WifiError,
    ];
}
