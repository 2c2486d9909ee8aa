//! Item import pipeline
//!
//! Runs Extract → Transform → Load for one source, strictly in order. Each
//! phase waits for the previous phase's full output; the first failure
//! ends the run.
//!
//! # Tracing
//!
//! Every run opens an `item_import` span with these fields:
//!
//! | field                | recorded                      |
//! |----------------------|-------------------------------|
//! | `etl.filename`       | when the run starts           |
//! | `etl.rows.extracted` | after extract                 |
//! | `etl.rows.valid`     | after transform               |
//! | `etl.rows.inserted`  | after load                    |
//! | `etl.state`          | once, `complete` or `failed`  |
//! | `etl.failed_phase`   | on failure                    |
//! | `etl.error.kind`     | on failure                    |
//! | `otel.status_code`   | `OK` or `ERROR` at the end    |
//!
//! The `extract`, `transform` and `load` spans are its children and close
//! before the next phase starts, whether the phase succeeded or not.

use std::io::Read;

use tracing::{debug, error, field, info, info_span, Instrument, Span};

use crate::error::ImportResult;
use crate::loader::ItemLoader;
use crate::reader::{CsvRecordReader, RawRecord};
use crate::transform::ItemValidator;

/// Lifecycle of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Extracting,
    Transforming,
    Loading,
    Complete,
    Failed,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Extracting => "extracting",
            RunState::Transforming => "transforming",
            RunState::Loading => "loading",
            RunState::Complete => "complete",
            RunState::Failed => "failed",
        }
    }

    /// Complete and Failed are terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Complete | RunState::Failed)
    }

    fn is_active(&self) -> bool {
        matches!(
            self,
            RunState::Extracting | RunState::Transforming | RunState::Loading
        )
    }

    /// Whether `next` is a legal transition from this state
    pub fn can_transition_to(&self, next: RunState) -> bool {
        match (self, next) {
            (RunState::Idle, RunState::Extracting)
            | (RunState::Extracting, RunState::Transforming)
            | (RunState::Transforming, RunState::Loading)
            | (RunState::Loading, RunState::Complete) => true,
            (current, RunState::Failed) => current.is_active(),
            _ => false,
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters for one run, returned as the run summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRun {
    pub source: String,
    pub extracted: usize,
    pub valid: usize,
    pub inserted: usize,
    pub state: RunState,
}

impl ImportRun {
    fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            extracted: 0,
            valid: 0,
            inserted: 0,
            state: RunState::Idle,
        }
    }

    fn advance(&mut self, next: RunState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal run transition {} -> {}",
            self.state,
            next
        );
        debug!(from = %self.state, to = %next, "Run state transition");
        self.state = next;
    }

    /// Rows dropped by validation
    pub fn dropped(&self) -> usize {
        self.extracted - self.valid
    }

    /// One-line human readable summary
    pub fn summary(&self) -> String {
        format!(
            "Imported {}: {} extracted, {} valid, {} inserted",
            self.source, self.extracted, self.valid, self.inserted
        )
    }
}

/// Sequences reader, validator and loader for one source at a time
pub struct ImportPipeline {
    reader: CsvRecordReader,
    validator: ItemValidator,
    loader: ItemLoader,
}

impl ImportPipeline {
    pub fn new(reader: CsvRecordReader, validator: ItemValidator, loader: ItemLoader) -> Self {
        Self {
            reader,
            validator,
            loader,
        }
    }

    /// Import the CSV file at `path`
    pub async fn run(&self, path: &str) -> ImportResult<ImportRun> {
        self.execute(path, |reader| reader.extract_path(path)).await
    }

    /// Import from an already opened byte stream, labelled `source` in logs
    /// and spans
    pub async fn run_reader<R: Read>(&self, source: &str, input: R) -> ImportResult<ImportRun> {
        self.execute(source, move |reader| reader.extract(source, input))
            .await
    }

    async fn execute<F>(&self, source: &str, extract: F) -> ImportResult<ImportRun>
    where
        F: FnOnce(&CsvRecordReader) -> ImportResult<Vec<RawRecord>>,
    {
        let span = info_span!(
            "item_import",
            etl.filename = %source,
            etl.rows.extracted = field::Empty,
            etl.rows.valid = field::Empty,
            etl.rows.inserted = field::Empty,
            etl.state = field::Empty,
            etl.failed_phase = field::Empty,
            etl.error.kind = field::Empty,
            otel.status_code = field::Empty,
        );

        let run_span = span.clone();
        async move {
            info!(filename = %source, "Starting item import");

            let mut run = ImportRun::new(source);
            match self.phases(&mut run, &run_span, extract).await {
                Ok(()) => {
                    run.advance(RunState::Complete);
                    run_span.record("etl.state", run.state.as_str());
                    run_span.record("otel.status_code", "OK");
                    info!(
                        filename = %source,
                        inserted = run.inserted,
                        "Item import complete for {}: inserted {} items",
                        source,
                        run.inserted
                    );
                    Ok(run)
                },
                Err(e) => {
                    let phase = e.phase();
                    run.advance(RunState::Failed);
                    run_span.record("etl.state", run.state.as_str());
                    run_span.record("etl.failed_phase", phase.as_str());
                    run_span.record("etl.error.kind", e.kind());
                    run_span.record("otel.status_code", "ERROR");
                    error!(
                        filename = %source,
                        phase = %phase,
                        kind = e.kind(),
                        error = %e,
                        "Item import failed"
                    );
                    Err(e)
                },
            }
        }
        .instrument(span)
        .await
    }

    async fn phases<F>(&self, run: &mut ImportRun, span: &Span, extract: F) -> ImportResult<()>
    where
        F: FnOnce(&CsvRecordReader) -> ImportResult<Vec<RawRecord>>,
    {
        run.advance(RunState::Extracting);
        let records = {
            let _phase = info_span!("extract", rows = field::Empty).entered();
            let records = extract(&self.reader)?;
            Span::current().record("rows", records.len());
            records
        };
        run.extracted = records.len();
        span.record("etl.rows.extracted", run.extracted);

        run.advance(RunState::Transforming);
        let items = {
            let _phase = info_span!("transform", rows = field::Empty).entered();
            let items = self.validator.transform(records);
            Span::current().record("rows", items.len());
            items
        };
        run.valid = items.len();
        span.record("etl.rows.valid", run.valid);
        if run.dropped() > 0 {
            info!(dropped = run.dropped(), "Dropped rows without a name");
        }

        run.advance(RunState::Loading);
        run.inserted = self
            .loader
            .load(items)
            .instrument(info_span!("load", rows = run.valid))
            .await?;
        span.record("etl.rows.inserted", run.inserted);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let path = [
            RunState::Idle,
            RunState::Extracting,
            RunState::Transforming,
            RunState::Loading,
            RunState::Complete,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_failed_only_from_active_states() {
        assert!(RunState::Extracting.can_transition_to(RunState::Failed));
        assert!(RunState::Transforming.can_transition_to(RunState::Failed));
        assert!(RunState::Loading.can_transition_to(RunState::Failed));
        assert!(!RunState::Idle.can_transition_to(RunState::Failed));
        assert!(!RunState::Complete.can_transition_to(RunState::Failed));
    }

    #[test]
    fn test_terminal_states_do_not_move() {
        for next in [RunState::Idle, RunState::Extracting, RunState::Complete, RunState::Failed] {
            assert!(!RunState::Failed.can_transition_to(next));
            assert!(!RunState::Complete.can_transition_to(next));
        }
        assert!(RunState::Failed.is_terminal());
        assert!(RunState::Complete.is_terminal());
    }

    #[test]
    fn test_no_skipping_phases() {
        assert!(!RunState::Idle.can_transition_to(RunState::Loading));
        assert!(!RunState::Extracting.can_transition_to(RunState::Complete));
    }

    #[test]
    fn test_run_summary() {
        let run = ImportRun {
            source: "items.csv".to_string(),
            extracted: 3,
            valid: 2,
            inserted: 2,
            state: RunState::Complete,
        };
        assert_eq!(run.dropped(), 1);
        assert_eq!(run.summary(), "Imported items.csv: 3 extracted, 2 valid, 2 inserted");
    }
}
