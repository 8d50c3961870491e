use std::fmt;

/// Lifecycle of an acquisition pipeline.
///
/// `Idle -> Configured -> Armed -> Retrieved -> Converted -> Persisted -> Idle`.
/// `Stopped` is terminal and reachable from every state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Configured,
    Armed,
    Retrieved,
    Converted,
    Persisted,
    Stopped,
}

/// Steps of `configure`, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigStep {
    Power,
    Buffers,
    BufferCheck,
    Region,
    AutonomousFeatures,
    Exposure,
    Gain,
    EmbeddedTimestamp,
    TriggerMode,
}

impl fmt::Display for ConfigStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConfigStep::Power => "power",
            ConfigStep::Buffers => "buffers",
            ConfigStep::BufferCheck => "buffer check",
            ConfigStep::Region => "region of interest",
            ConfigStep::AutonomousFeatures => "autonomous features",
            ConfigStep::Exposure => "exposure",
            ConfigStep::Gain => "gain",
            ConfigStep::EmbeddedTimestamp => "embedded timestamp",
            ConfigStep::TriggerMode => "trigger mode",
        };
        f.write_str(name)
    }
}
