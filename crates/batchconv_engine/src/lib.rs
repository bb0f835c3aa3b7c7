//! Batch converter engine: conversion backend client, batch orchestration and
//! the worker that runs batches off the UI thread.
mod engine;
mod orchestrator;
mod progress;
mod service;
mod types;

pub use engine::EngineHandle;
pub use orchestrator::{BatchOrchestrator, FailurePolicy};
pub use progress::{ChannelProgressSink, NullProgressSink, ProgressSink};
pub use service::{
    CommandConverter, CommandSettings, ConversionService, INPUT_PLACEHOLDER,
    OUTPUT_DIR_PLACEHOLDER, SYMBOL_FILE_PLACEHOLDER,
};
pub use types::{
    BatchError, BatchProgress, BatchReport, ConversionError, ConversionOutcome, ConversionRequest,
    EngineEvent, FailureKind, FileStage, OutcomeStatus, RunId,
};
