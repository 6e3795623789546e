// Shared helper module, runnable on its own: checks its transcript, then
// calls every `test_*` symbol it defines.
//
// Run with: cargo run --bin common_util [runner.toml]

use std::cell::RefCell;
use std::env;
use std::io;
use std::path::Path;
use std::process;
use std::rc::Rc;

use colored::Colorize;
use cookbook::{
    logging, name_of, select, DemoResult, Evaluator, Module, Prefix, Runner, RunnerConfig,
    SymbolTable, TranscriptError,
};
use itertools::Itertools;

// =============================================================================
// Module symbols
// =============================================================================

fn test_sample() -> DemoResult {
    println!("i'm {}", name_of(&test_sample));
    Ok(())
}

// =============================================================================
// Transcript session
// =============================================================================

const RUNNER_TRANSCRIPT: &str = r#"
Every symbol, in the order it was defined.
    >>> names
    [test_a, helper, test_b, fail_x, fail_y, answer]

Selecting by prefix keeps that order.
    >>> select test_
    [<function test_a>, <function test_b>]
    >>> select nothing_
    []

A run lists its picks, then calls each one after a banner.
    >>> run test_
    [<function test_a>, <function test_b>]
    call <function test_a> ==============================
    call <function test_b> ==============================
    >>> calls
    [test_a, test_b]

The first failure ends the run: fail_x gets its banner, fail_y never runs.
    >>> run fail_
    error: [<function fail_x>, <function fail_y>]
    call <function fail_x> ==============================
    call to fail_x() failed: runtime error
    >>> calls
    []
    >>> call answer
    error: 'answer' is not callable (value "42")
"#;

type CallLog = Rc<RefCell<Vec<String>>>;

/// Evaluates transcript commands against a small demo table.
struct Session {
    table: SymbolTable,
    calls: CallLog,
}

impl Session {
    fn new() -> Self {
        let calls = CallLog::default();
        let record = |name: &'static str| {
            let log = Rc::clone(&calls);
            move || -> DemoResult {
                log.borrow_mut().push(name.to_string());
                Ok(())
            }
        };

        let mut table = SymbolTable::new();
        table
            .def("test_a", record("test_a"))
            .def("helper", record("helper"))
            .def("test_b", record("test_b"))
            .def("fail_x", || anyhow::bail!("runtime error"))
            .def("fail_y", record("fail_y"))
            .value("answer", "42");
        Self { table, calls }
    }

    /// Captured run output; on failure the error follows whatever was
    /// already printed.
    fn run(&self, prefix: &str) -> Result<String, String> {
        let mut out = Vec::new();
        let result = Runner::default().run(&mut out, &self.table, &Prefix::new(prefix));
        let printed = String::from_utf8_lossy(&out).into_owned();
        match result {
            Ok(()) => Ok(printed),
            Err(err) => Err(format!("{printed}{err}")),
        }
    }
}

impl Evaluator for Session {
    fn eval(&mut self, source: &str) -> Result<String, String> {
        let (command, arg) = source
            .split_once(' ')
            .map_or((source, ""), |(command, arg)| (command, arg.trim()));

        match command {
            "names" => Ok(format!("[{}]", self.table.names().join(", "))),
            "select" => Ok(format!(
                "[{}]",
                select(&self.table, &Prefix::new(arg))
                    .iter()
                    .map(|entry| entry.symbol)
                    .join(", ")
            )),
            "run" => self.run(arg),
            "call" => {
                let symbol = self
                    .table
                    .get(arg)
                    .ok_or_else(|| format!("name '{arg}' is not defined"))?;
                symbol.invoke(arg).map_err(|err| err.to_string())?;
                Ok(String::new())
            }
            "calls" => Ok(format!("[{}]", self.calls.borrow_mut().drain(..).join(", "))),
            other => Err(format!("unknown command: {other}")),
        }
    }
}

fn common_util_module() -> Result<Module, TranscriptError> {
    let mut module = Module::new("common_util");
    module.table_mut().def_fn(test_sample);
    module.transcript("runner", RUNNER_TRANSCRIPT)?;
    Ok(module)
}

// =============================================================================
// Main
// =============================================================================

fn main() {
    logging::init();

    if let Err(err) = run_module() {
        eprintln!("{}", format!("✗ {err:#}").red());
        process::exit(1);
    }
}

fn run_module() -> anyhow::Result<()> {
    let config = match env::args().nth(1) {
        Some(path) => RunnerConfig::load(Path::new(&path))?,
        None => RunnerConfig::default(),
    };
    let module = common_util_module()?;

    let mut session = Session::new();
    let mut stdout = io::stdout();
    let summary = module.run_main(&mut stdout, &mut session, &config)?;

    if summary.is_success() {
        println!("{}", format!("✓ {} finished", module.name()).green());
    } else {
        println!(
            "{}",
            format!(
                "✓ {} finished, {} of {} transcript examples failed",
                module.name(),
                summary.failed,
                summary.attempted
            )
            .yellow()
        );
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
