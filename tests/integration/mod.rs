//! Integration test modules for midibridge

pub mod lifecycle;
pub mod pipeline;
pub mod publish_failure;
