//! Loop detection for agent executions
//!
//! Standalone component: consumes a caller-supplied stream of execution
//! records and flags repeating or stalled patterns before they burn
//! budget. Detections are advisory; callers decide whether to block.

mod config;
mod detector;
mod ring;

pub use config::LoopDetectorConfig;
pub use detector::{
    ExecutionEntry, LoopDetectionResult, LoopDetector, LoopMetrics, LoopType, SuggestedAction,
};
pub use ring::RingBuffer;
