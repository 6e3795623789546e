use std::io::Write;

use tracing::debug;

use crate::config::RunnerConfig;
use crate::error::{ModuleError, TranscriptError};
use crate::runner::Runner;
use crate::symbols::SymbolTable;
use crate::transcript::{Checker, Evaluator, Transcript, TranscriptReport};

/// A runnable recipe module: its symbols plus the transcripts written
/// alongside them.
#[derive(Debug)]
pub struct Module {
    name: String,
    table: SymbolTable,
    transcripts: Vec<Transcript>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: SymbolTable::new(),
            transcripts: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &SymbolTable {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut SymbolTable {
        &mut self.table
    }

    pub fn transcripts(&self) -> &[Transcript] {
        &self.transcripts
    }

    /// Parses and attaches a transcript. Transcripts are checked in the
    /// order they were attached.
    pub fn transcript(&mut self, name: &str, text: &str) -> Result<&mut Self, TranscriptError> {
        let transcript = Transcript::parse(format!("{}.{}", self.name, name), text)?;
        self.transcripts.push(transcript);
        Ok(self)
    }

    /// What running the module directly does: check every transcript, then
    /// call the selected symbols.
    ///
    /// Transcript failures are reported in the returned summary and never
    /// stop the run. A failing call ends it with an error.
    pub fn run_main<W, E>(
        &self,
        out: &mut W,
        evaluator: &mut E,
        config: &RunnerConfig,
    ) -> Result<TranscriptReport, ModuleError>
    where
        W: Write + ?Sized,
        E: Evaluator + ?Sized,
    {
        let checker = Checker::new(config.verbose_transcripts);
        let mut summary = TranscriptReport::new(&self.name);
        for transcript in &self.transcripts {
            summary.merge(checker.check(out, transcript, evaluator)?);
        }
        debug!(
            module = %self.name,
            attempted = summary.attempted,
            failed = summary.failed,
            "transcripts done"
        );

        let predicate = config.predicate()?;
        Runner::new(config.clone()).run(out, &self.table, predicate.as_ref())?;
        Ok(summary)
    }
}

// =============================================================================
// Tests
// =============================================================================
