//! This module takes care of scheduling the selection work, encapsulating use
//! of multiple threads and anything else that will come in the future

#[cfg(feature = "multi-threading")]
mod multi_threading;
#[cfg(not(feature = "multi-threading"))]
mod sequential;

use crate::{
    channel::{TaggedEvents, Tagger},
    cutflow::CutFlow,
    error::Result,
    event::EventTable,
};
use tracing::info;

/// Results of running a channel over a whole event table
#[derive(Clone, Debug, Default)]
pub struct SelectionOutput {
    /// Per-event decisions and augmented events, in input order
    pub tagged: TaggedEvents,

    /// Cut flow accumulated over every chunk
    pub cutflow: CutFlow,
}

/// Outcome of processing one chunk of events
type ChunkResult = Result<(TaggedEvents, CutFlow)>;

/// Run a channel on one chunk of events, recording its cut flow
fn process_chunk(tagger: &dyn Tagger, chunk: EventTable) -> ChunkResult {
    let mut cutflow = CutFlow::new();
    let tagged = tagger.select(chunk, &mut cutflow)?;
    Ok((tagged, cutflow))
}

/// Run a channel over a table of events, in the manner that was configured at
/// build time.
///
/// Events are processed in chunks of `chunk_size`. Results are reassembled in
/// chunk order, so the output does not depend on the chunk size nor on the
/// execution back-end. The first chunk that fails aborts the whole run.
///
pub fn run_selection(
    tagger: &dyn Tagger,
    events: EventTable,
    chunk_size: usize,
) -> Result<SelectionOutput> {
    // Should have already been checked at configuration time, but bugs happen
    assert!(chunk_size > 0, "Chunks must hold at least one event");

    // An empty table still goes through the channel once, so that the output
    // carries the channel's fields and gate names
    let num_events = events.num_events();
    let chunks = if num_events == 0 {
        vec![events]
    } else {
        events.chunks(chunk_size)
    };
    info!(
        channel = tagger.name(),
        num_events,
        num_chunks = chunks.len(),
        "Starting selection"
    );

    // Process the chunks...
    let results = {
        // ...in sequential mode
        #[cfg(not(feature = "multi-threading"))]
        {
            sequential::run_selection_impl(tagger, chunks)
        }

        // ...in multi-threaded mode
        #[cfg(feature = "multi-threading")]
        {
            multi_threading::run_selection_impl(tagger, chunks)
        }
    };

    // Reassemble the results in chunk order
    let mut parts = Vec::with_capacity(results.len());
    let mut cutflow = CutFlow::new();
    for result in results {
        let (tagged, chunk_cutflow) = result?;
        parts.push(tagged);
        cutflow.merge(chunk_cutflow);
    }
    let tagged = TaggedEvents::concat(parts);
    info!(
        channel = tagger.name(),
        num_events,
        num_passed = tagged.num_passed(),
        "Selection complete"
    );
    Ok(SelectionOutput { tagged, cutflow })
}
