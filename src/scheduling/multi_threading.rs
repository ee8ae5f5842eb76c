//! Multi-threaded back-end of the selection

use super::{process_chunk, ChunkResult};
use crate::{channel::Tagger, event::EventTable};
use std::sync::Mutex;

/// Process chunks in parallel
///
/// Results are reported in chunk order, whatever order the chunks were
/// actually processed in.
///
pub fn run_selection_impl(tagger: &dyn Tagger, chunks: Vec<EventTable>) -> Vec<ChunkResult> {
    let accumulator = OrderedResults::new(chunks.len());

    // This function is a synchronization scope: it will only return
    // once all inner tasks have been executed
    rayon::scope(|scope| {
        for (chunk_id, chunk) in chunks.into_iter().enumerate() {
            let accumulator = &accumulator;
            scope.spawn(move |_| {
                accumulator.set_task_result(chunk_id, process_chunk(tagger, chunk));
            });
        }
    });

    accumulator.into_results()
}

/// Storage for the results of parallel tasks, indexed by task
struct OrderedResults {
    results: Box<[Mutex<Option<ChunkResult>>]>,
}
//
impl OrderedResults {
    /// Set up results storage for N parallel tasks
    fn new(num_tasks: usize) -> Self {
        Self {
            results: (0..num_tasks)
                .map(|_| Mutex::new(None))
                .collect::<Vec<_>>()
                .into_boxed_slice(),
        }
    }

    /// Record the result of the n-th task
    fn set_task_result(&self, task_id: usize, result: ChunkResult) {
        let mut lock = self.results[task_id]
            .lock()
            .expect("Mutex data should be valid");
        assert!(lock.is_none(), "Tasks should not report results twice");
        *lock = Some(result);
    }

    /// Extract the results in task order
    fn into_results(self) -> Vec<ChunkResult> {
        self.results
            .into_vec()
            .into_iter()
            .map(|entry| {
                entry
                    .into_inner()
                    .expect("Mutex data should be valid")
                    .expect("Result should be ready")
            })
            .collect()
    }
}
