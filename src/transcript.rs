// Transcript checks: `>>>` examples written next to a recipe, replayed
// through an evaluator and compared literally with the text shown.

use std::io::Write;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::TranscriptError;

lazy_static! {
    static ref PROMPT: Regex =
        Regex::new(r"^(?P<indent>[ \t]*)>>>(?: (?P<source>.*))?$").expect("prompt pattern");
    static ref CONTINUATION: Regex =
        Regex::new(r"^[ \t]*\.\.\.(?: (?P<source>.*))?$").expect("continuation pattern");
}

const ERROR_MARKER: &str = "error: ";
const RULE_WIDTH: usize = 70;

// =============================================================================
// Parsed form
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expected {
    Output(String),
    /// The evaluator must fail with exactly this message.
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Example {
    pub source: String,
    pub want: Expected,
    /// 1-based line of the `>>>` prompt.
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub name: String,
    pub examples: Vec<Example>,
}

struct Pending {
    line: usize,
    indent: usize,
    source: Vec<String>,
    want: Vec<String>,
}

impl Pending {
    fn finish(self) -> Example {
        let want = match self.want.split_first() {
            Some((first, rest)) if first.starts_with(ERROR_MARKER) => {
                let mut message = vec![first[ERROR_MARKER.len()..].to_string()];
                message.extend(rest.iter().cloned());
                Expected::Error(message.join("\n"))
            }
            _ => Expected::Output(self.want.join("\n")),
        };
        Example {
            source: self.source.join("\n"),
            want,
            line: self.line,
        }
    }
}

fn strip_indent(line: &str, indent: usize) -> &str {
    let leading = line.len() - line.trim_start_matches([' ', '\t']).len();
    &line[leading.min(indent)..]
}

impl Transcript {
    /// Parses transcript text.
    ///
    /// Lines outside an example (prose, `# comments`) are skipped. Expected
    /// output runs until a blank line or the next prompt.
    pub fn parse(name: impl Into<String>, text: &str) -> Result<Self, TranscriptError> {
        let name = name.into();
        let mut examples = Vec::new();
        let mut current: Option<Pending> = None;

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;

            if let Some(caps) = PROMPT.captures(raw) {
                if let Some(pending) = current.take() {
                    examples.push(pending.finish());
                }
                let source = caps.name("source").map_or("", |m| m.as_str());
                if source.trim().is_empty() {
                    continue;
                }
                current = Some(Pending {
                    line: line_no,
                    indent: caps.name("indent").map_or(0, |m| m.as_str().len()),
                    source: vec![source.to_string()],
                    want: Vec::new(),
                });
                continue;
            }

            if let Some(caps) = CONTINUATION.captures(raw) {
                match current.as_mut() {
                    Some(pending) if pending.want.is_empty() => {
                        let more = caps.name("source").map_or("", |m| m.as_str());
                        pending.source.push(more.to_string());
                        continue;
                    }
                    Some(_) => {}
                    None => {
                        return Err(TranscriptError::Syntax {
                            name,
                            line: line_no,
                            message: "continuation line without a prompt".to_string(),
                        })
                    }
                }
            }

            if raw.trim().is_empty() {
                if let Some(pending) = current.take() {
                    examples.push(pending.finish());
                }
                continue;
            }

            if let Some(pending) = current.as_mut() {
                pending.want.push(strip_indent(raw, pending.indent).to_string());
            }
        }

        if let Some(pending) = current.take() {
            examples.push(pending.finish());
        }

        Ok(Self { name, examples })
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }
}

// =============================================================================
// Evaluation
// =============================================================================

/// A session that turns example source into printed text.
///
/// One evaluator serves every example of a transcript, so state set up by an
/// earlier example is visible to later ones.
pub trait Evaluator {
    fn eval(&mut self, source: &str) -> Result<String, String>;
}

impl<F> Evaluator for F
where
    F: FnMut(&str) -> Result<String, String>,
{
    fn eval(&mut self, source: &str) -> Result<String, String> {
        self(source)
    }
}

fn normalize(text: &str) -> String {
    let mut lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

fn outcome_matches(want: &Expected, got: &Result<String, String>) -> bool {
    match (want, got) {
        (Expected::Output(want), Ok(text)) => normalize(want) == normalize(text),
        (Expected::Error(want), Err(message)) => normalize(want) == normalize(message),
        _ => false,
    }
}

// =============================================================================
// Report
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub transcript: String,
    pub line: usize,
    pub source: String,
    pub want: Expected,
    pub got: Result<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptReport {
    pub name: String,
    pub attempted: usize,
    pub failed: usize,
    pub failures: Vec<Failure>,
}

impl TranscriptReport {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attempted: 0,
            failed: 0,
            failures: Vec::new(),
        }
    }

    pub fn passed(&self) -> usize {
        self.attempted - self.failed
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    pub fn merge(&mut self, other: TranscriptReport) {
        self.attempted += other.attempted;
        self.failed += other.failed;
        self.failures.extend(other.failures);
    }
}

// =============================================================================
// Checker
// =============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct Checker {
    verbose: bool,
}

fn write_block<W: Write + ?Sized>(out: &mut W, text: &str) -> std::io::Result<()> {
    for line in text.lines() {
        writeln!(out, "    {line}")?;
    }
    Ok(())
}

fn write_expected<W: Write + ?Sized>(out: &mut W, label: &str, want: &Expected) -> std::io::Result<()> {
    match want {
        Expected::Output(text) if text.trim().is_empty() => writeln!(out, "{label} nothing"),
        Expected::Output(text) => {
            writeln!(out, "{label}:")?;
            write_block(out, text)
        }
        Expected::Error(message) => {
            writeln!(out, "{label}:")?;
            write_block(out, &format!("{ERROR_MARKER}{message}"))
        }
    }
}

impl Checker {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Replays every example; a failing example is reported and the rest
    /// still run.
    pub fn check<W, E>(
        &self,
        out: &mut W,
        transcript: &Transcript,
        evaluator: &mut E,
    ) -> Result<TranscriptReport, TranscriptError>
    where
        W: Write + ?Sized,
        E: Evaluator + ?Sized,
    {
        let mut report = TranscriptReport::new(&transcript.name);

        for example in &transcript.examples {
            if self.verbose {
                writeln!(out, "Trying:")?;
                write_block(out, &example.source)?;
                write_expected(out, "Expecting", &example.want)?;
            }

            let got = evaluator.eval(&example.source);
            report.attempted += 1;

            if outcome_matches(&example.want, &got) {
                if self.verbose {
                    writeln!(out, "ok")?;
                }
                continue;
            }

            warn!(transcript = %transcript.name, line = example.line, "transcript example failed");
            report.failed += 1;
            self.write_failure(out, &transcript.name, example, &got)?;
            report.failures.push(Failure {
                transcript: transcript.name.clone(),
                line: example.line,
                source: example.source.clone(),
                want: example.want.clone(),
                got,
            });
        }

        debug!(
            transcript = %transcript.name,
            attempted = report.attempted,
            failed = report.failed,
            "transcript checked"
        );

        if self.verbose || !report.is_success() {
            self.write_summary(out, &report)?;
        }
        Ok(report)
    }

    fn write_failure<W: Write + ?Sized>(
        &self,
        out: &mut W,
        name: &str,
        example: &Example,
        got: &Result<String, String>,
    ) -> std::io::Result<()> {
        writeln!(out, "{}", "*".repeat(RULE_WIDTH))?;
        writeln!(out, "Line {}, in {}", example.line, name)?;
        writeln!(out, "Failed example:")?;
        write_block(out, &example.source)?;
        write_expected(out, "Expected", &example.want)?;
        let got = match got {
            Ok(text) => Expected::Output(text.clone()),
            Err(message) => Expected::Error(message.clone()),
        };
        write_expected(out, "Got", &got)
    }

    fn write_summary<W: Write + ?Sized>(
        &self,
        out: &mut W,
        report: &TranscriptReport,
    ) -> std::io::Result<()> {
        writeln!(out, "{} tests in {}", report.attempted, report.name)?;
        writeln!(out, "{} passed and {} failed.", report.passed(), report.failed)?;
        if report.is_success() {
            writeln!(out, "Test passed.")
        } else {
            writeln!(out, "***Test Failed*** {} failures.", report.failed)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
    # numbers echo back
    >>> echo 1
    1
    >>> echo a b
    a b

    # multi-line source
    >>> echo first
    ... echo second
    first
    second
    >>>
"#;

    fn echo(source: &str) -> Result<String, String> {
        let mut out = Vec::new();
        for line in source.lines() {
            if line == "echo" {
                out.push(String::new());
                continue;
            }
            match line.strip_prefix("echo ") {
                Some(rest) => out.push(rest.to_string()),
                None => return Err(format!("unknown command: {line}")),
            }
        }
        Ok(out.join("\n"))
    }

    fn check_quiet(text: &str) -> (TranscriptReport, String) {
        let transcript = Transcript::parse("sample", text).unwrap();
        let mut out = Vec::new();
        let mut evaluator = echo;
        let report = Checker::new(false)
            .check(&mut out, &transcript, &mut evaluator)
            .unwrap();
        (report, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_parse_examples() {
        let transcript = Transcript::parse("sample", SAMPLE).unwrap();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript.examples[0].source, "echo 1");
        assert_eq!(transcript.examples[0].want, Expected::Output("1".to_string()));
        assert_eq!(transcript.examples[0].line, 3);
        assert_eq!(transcript.examples[2].source, "echo first\necho second");
        assert_eq!(
            transcript.examples[2].want,
            Expected::Output("first\nsecond".to_string())
        );
    }

    #[test]
    fn test_parse_expected_error() {
        let text = ">>> explode\nerror: unknown command: explode\n";
        let transcript = Transcript::parse("errors", text).unwrap();
        assert_eq!(
            transcript.examples[0].want,
            Expected::Error("unknown command: explode".to_string())
        );
    }

    #[test]
    fn test_parse_example_without_output() {
        let transcript = Transcript::parse("quiet", ">>> echo\n>>> echo x\nx\n").unwrap();
        assert_eq!(transcript.examples[0].want, Expected::Output(String::new()));
        assert_eq!(transcript.examples[1].source, "echo x");
    }

    #[test]
    fn test_parse_prose_only() {
        let transcript = Transcript::parse("prose", "just words\n# and a comment\n").unwrap();
        assert!(transcript.is_empty());
    }

    #[test]
    fn test_parse_stray_continuation() {
        let result = Transcript::parse("broken", "intro\n... echo orphan\n");
        assert!(matches!(
            result,
            Err(TranscriptError::Syntax { line: 2, .. })
        ));
    }

    #[test]
    fn test_dots_inside_output_are_output() {
        let transcript = Transcript::parse("dots", ">>> echo x\nx\n...\n").unwrap();
        assert_eq!(
            transcript.examples[0].want,
            Expected::Output("x\n...".to_string())
        );
    }

    #[test]
    fn test_check_all_pass() {
        let (report, output) = check_quiet(SAMPLE);
        assert_eq!(report.attempted, 3);
        assert!(report.is_success());
        assert!(output.is_empty());
    }

    #[test]
    fn test_check_reports_mismatch_and_continues() {
        let text = ">>> echo 1\n2\n>>> echo 3\n3\n";
        let (report, output) = check_quiet(text);
        assert_eq!(report.attempted, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.failures[0].line, 1);
        assert!(output.contains("Line 1, in sample"));
        assert!(output.contains("Expected:\n    2\nGot:\n    1\n"));
        assert!(output.ends_with("1 passed and 1 failed.\n***Test Failed*** 1 failures.\n"));
    }

    #[test]
    fn test_check_expected_error() {
        let text = ">>> boom\nerror: unknown command: boom\n";
        let (report, _) = check_quiet(text);
        assert!(report.is_success());
    }

    #[test]
    fn test_error_when_output_expected() {
        let text = ">>> boom\nsomething\n";
        let (report, output) = check_quiet(text);
        assert_eq!(report.failed, 1);
        assert!(output.contains("Got:\n    error: unknown command: boom\n"));
    }

    #[test]
    fn test_trailing_whitespace_ignored() {
        let transcript = Transcript::parse("ws", ">>> pad\nvalue\n").unwrap();
        let mut out = Vec::new();
        let mut evaluator = |_: &str| Ok::<_, String>("value   \n\n".to_string());
        let report = Checker::default()
            .check(&mut out, &transcript, &mut evaluator)
            .unwrap();
        assert!(report.is_success());
    }

    #[test]
    fn test_evaluator_state_carries_over() {
        let transcript =
            Transcript::parse("state", ">>> push 1\n>>> push 2\n>>> total\n3\n").unwrap();
        let mut total = 0;
        let mut evaluator = |source: &str| -> Result<String, String> {
            if let Some(n) = source.strip_prefix("push ") {
                total += n.parse::<i32>().map_err(|e| e.to_string())?;
                Ok(String::new())
            } else {
                Ok(total.to_string())
            }
        };
        let mut out = Vec::new();
        let report = Checker::default()
            .check(&mut out, &transcript, &mut evaluator)
            .unwrap();
        assert!(report.is_success());
    }

    #[test]
    fn test_verbose_output() {
        let transcript = Transcript::parse("verbose", ">>> echo hi\nhi\n>>> echo\n").unwrap();
        let mut out = Vec::new();
        let mut evaluator = echo;
        Checker::new(true)
            .check(&mut out, &transcript, &mut evaluator)
            .unwrap();
        let expected = "Trying:\n    echo hi\nExpecting:\n    hi\nok\n\
                        Trying:\n    echo\nExpecting nothing\nok\n\
                        2 tests in verbose\n2 passed and 0 failed.\nTest passed.\n";
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn test_merge_reports() {
        let (mut first, _) = check_quiet(">>> echo 1\n1\n");
        let (second, _) = check_quiet(">>> echo 1\n9\n");
        first.merge(second);
        assert_eq!(first.attempted, 2);
        assert_eq!(first.failed, 1);
        assert_eq!(first.passed(), 1);
        assert_eq!(first.failures.len(), 1);
    }
}
