//! Batch mode: many questions from one file, answered in order.

mod processor;
mod reader;

pub use processor::{BatchProcessor, BatchResult, BatchSummary, OutputFormat};
pub use reader::read_questions;
