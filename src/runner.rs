use std::io::{self, Write};

use itertools::Itertools;
use regex::Regex;
use tracing::debug;

use crate::config::RunnerConfig;
use crate::error::RunError;
use crate::symbols::{Symbol, SymbolTable};

// =============================================================================
// Selection predicates
// =============================================================================

/// Decides whether a name belongs to a run.
pub trait Predicate {
    fn matches(&self, name: &str) -> bool;
}

impl<F> Predicate for F
where
    F: Fn(&str) -> bool,
{
    fn matches(&self, name: &str) -> bool {
        self(name)
    }
}

#[derive(Debug, Clone)]
pub struct Prefix(String);

impl Prefix {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self(prefix.into())
    }
}

impl Predicate for Prefix {
    fn matches(&self, name: &str) -> bool {
        name.starts_with(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(regex: Regex) -> Self {
        Self(regex)
    }
}

impl Predicate for Pattern {
    fn matches(&self, name: &str) -> bool {
        self.0.is_match(name)
    }
}

// =============================================================================
// Selection
// =============================================================================

/// One entry picked for a run, borrowed straight from the table.
#[derive(Debug, Clone, Copy)]
pub struct Selected<'t> {
    pub name: &'t str,
    pub symbol: &'t Symbol,
}

/// Entries whose name satisfies `predicate`, in table order.
pub fn select<'t, P>(table: &'t SymbolTable, predicate: &P) -> Vec<Selected<'t>>
where
    P: Predicate + ?Sized,
{
    table
        .iter()
        .filter(|(name, _)| predicate.matches(name))
        .map(|(name, symbol)| Selected { name, symbol })
        .collect()
}

// =============================================================================
// Runner
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct Runner {
    config: RunnerConfig,
}

impl Runner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Prints the selected symbols, then calls each one after its banner.
    ///
    /// The first failure ends the run; whatever was already written stays.
    pub fn run<W, P>(&self, out: &mut W, table: &SymbolTable, predicate: &P) -> Result<(), RunError>
    where
        W: Write + ?Sized,
        P: Predicate + ?Sized,
    {
        let selected = select(table, predicate);
        debug!(
            selected = selected.len(),
            total = table.len(),
            "selected symbols"
        );

        writeln!(out, "[{}]", selected.iter().map(|s| s.symbol).join(", "))?;

        let separator = self.config.separator();
        for entry in &selected {
            writeln!(out, "call {} {}", entry.symbol, separator)?;
            // banner must land before anything the callee prints
            out.flush()?;
            debug!(name = entry.name, "invoking");
            entry.symbol.invoke(entry.name)?;
        }
        Ok(())
    }
}

/// Runs `predicate`'s picks from `table` against stdout with default settings.
pub fn call_funcs<P>(table: &SymbolTable, predicate: &P) -> Result<(), RunError>
where
    P: Predicate + ?Sized,
{
    let mut stdout = io::stdout();
    Runner::default().run(&mut stdout, table, predicate)
}

// =============================================================================
// Tests
// =============================================================================
