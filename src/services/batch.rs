use crate::sink::{RawRow, RawSink};
use log::{debug, error};

/// Upper bound on rows per raw insert call imposed by the sink.
pub const MAX_BATCH_SIZE: usize = 1000;
pub const DEFAULT_BATCH_SIZE: usize = MAX_BATCH_SIZE;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub calls: usize,
    pub written: usize,
    pub failed_batches: usize,
}

/// Writes raw rows in fixed-size chunks. A rejected chunk is logged and
/// counted, never retried; the remaining chunks are still attempted.
pub struct BatchWriter<'a, S: RawSink + ?Sized> {
    sink: &'a mut S,
    database: &'a str,
    batch_size: usize,
}

impl<'a, S: RawSink + ?Sized> BatchWriter<'a, S> {
    pub fn new(sink: &'a mut S, database: &'a str, batch_size: usize) -> Self {
        BatchWriter {
            sink,
            database,
            batch_size: batch_size.clamp(1, MAX_BATCH_SIZE),
        }
    }

    pub fn write(&mut self, table: &str, rows: &[RawRow]) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for (index, chunk) in rows.chunks(self.batch_size).enumerate() {
            summary.calls += 1;
            match self.sink.insert_rows(self.database, table, chunk) {
                Ok(n) => {
                    summary.written += n;
                    debug!("{}: batch {} wrote {} row(s)", table, index + 1, n);
                }
                Err(e) => {
                    summary.failed_batches += 1;
                    error!(
                        "{}: batch {} ({} row(s)) rejected, not retried: {}",
                        table,
                        index + 1,
                        chunk.len(),
                        e
                    );
                }
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::memory::MemoryStore;
    use serde_json::Map;

    fn rows(n: usize) -> Vec<RawRow> {
        (0..n)
            .map(|i| RawRow {
                key: format!("player_{i}"),
                columns: Map::new(),
            })
            .collect()
    }

    #[test]
    fn chunks_into_fixed_size_calls() {
        let mut store = MemoryStore::default();
        let summary = BatchWriter::new(&mut store, "fantasy_football", 1000).write("fpl_player_gameweek", &rows(2500));

        assert_eq!(summary, BatchSummary { calls: 3, written: 2500, failed_batches: 0 });
        let sizes: Vec<usize> = store.raw_calls.iter().map(|(_, n)| *n).collect();
        assert_eq!(sizes, vec![1000, 1000, 500]);
        assert_eq!(store.raw.len(), 2500);
    }

    #[test]
    fn empty_input_issues_no_calls() {
        let mut store = MemoryStore::default();
        let summary = BatchWriter::new(&mut store, "fantasy_football", 1000).write("fpl_leagues", &[]);
        assert_eq!(summary.calls, 0);
        assert!(store.raw_calls.is_empty());
    }

    #[test]
    fn failed_batch_is_skipped_not_retried() {
        let mut store = MemoryStore::default();
        store.fail_raw_calls.insert(1);
        let summary = BatchWriter::new(&mut store, "fantasy_football", 10).write("fpl_bootstrap_static", &rows(25));

        assert_eq!(summary, BatchSummary { calls: 3, written: 15, failed_batches: 1 });
        assert_eq!(store.raw_calls.len(), 3);
        assert!(!store.raw.keys().any(|(_, _, k)| k == "player_10"));
        assert!(store.raw.keys().any(|(_, _, k)| k == "player_20"));
    }

    #[test]
    fn batch_size_is_capped_by_sink_limit() {
        let mut store = MemoryStore::default();
        let summary = BatchWriter::new(&mut store, "fantasy_football", 5000).write("fpl_player_gameweek", &rows(1500));
        assert_eq!(summary.calls, 2);
        assert_eq!(store.raw_calls[0].1, 1000);
    }
}
