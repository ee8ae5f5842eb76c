//! Sequential back-end of the selection

use super::{process_chunk, ChunkResult};
use crate::{channel::Tagger, event::EventTable};

/// Process chunks one after the other
///
/// Processing stops at the first failing chunk, whose error ends the output.
///
pub fn run_selection_impl(tagger: &dyn Tagger, chunks: Vec<EventTable>) -> Vec<ChunkResult> {
    let mut results = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        let result = process_chunk(tagger, chunk);
        let failed = result.is_err();
        results.push(result);
        if failed {
            break;
        }
    }
    results
}
