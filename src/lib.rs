// Recipe Book Harness
// Shared helpers for the runnable recipe modules: an explicit symbol table,
// the selective runner that calls every `test_*` entry, and a checker for
// `>>>` transcripts embedded next to the recipes.

pub mod config;
pub mod error;
pub mod logging;
pub mod module;
pub mod runner;
pub mod symbols;
pub mod transcript;

pub use config::{RunnerConfig, Selection};
pub use error::{ConfigError, ModuleError, RunError, TranscriptError};
pub use module::Module;
pub use runner::{call_funcs, select, Pattern, Predicate, Prefix, Runner, Selected};
pub use symbols::{name_of, DemoResult, Function, Symbol, SymbolTable};
pub use transcript::{Checker, Evaluator, Example, Expected, Transcript, TranscriptReport};
