//! Test execution engine.

use std::time::Instant;

use tsf_core::{Arg, EscapeContext, FormatConfig, Formatter};

use crate::args::ArgSpec;
use crate::diff;
use crate::fixtures::{EscapeMode, FixtureCase, FixtureSet};
use crate::structured_log::{LogEmitter, LogEntry, LogLevel, Outcome};
use crate::verify::VerificationResult;

/// Runs fixture sets and collects verification results.
pub struct TestRunner {
    /// Name of the test campaign.
    pub campaign: String,
    /// Configuration cases start from before their own overrides.
    pub base_config: FormatConfig,
}

impl TestRunner {
    /// Create a new test runner with default sizing.
    #[must_use]
    pub fn new(campaign: impl Into<String>) -> Self {
        Self {
            campaign: campaign.into(),
            base_config: FormatConfig::default(),
        }
    }

    /// Start cases from `config` instead of the defaults.
    #[must_use]
    pub fn with_config(mut self, config: FormatConfig) -> Self {
        self.base_config = config;
        self
    }

    /// Run all fixtures in a set and return results.
    pub fn run(&self, fixture_set: &FixtureSet) -> Vec<VerificationResult> {
        fixture_set
            .cases
            .iter()
            .map(|case| self.run_case(case))
            .collect()
    }

    /// Run a set, writing one log record per case to `log`.
    pub fn run_logged<W: std::io::Write>(
        &self,
        fixture_set: &FixtureSet,
        log: &mut LogEmitter<W>,
    ) -> std::io::Result<Vec<VerificationResult>> {
        let results = self.run(fixture_set);
        for result in &results {
            let (level, outcome) = if result.passed {
                (LogLevel::Info, Outcome::Pass)
            } else if result.actual.starts_with("unsupported:") {
                (LogLevel::Error, Outcome::Error)
            } else {
                (LogLevel::Warn, Outcome::Fail)
            };
            let mut entry = LogEntry::new("", level, "case_result")
                .with_case(&fixture_set.family, &result.case_name)
                .with_format(&result.format)
                .with_outcome(outcome)
                .with_latency_ns(result.latency_ns);
            if !result.passed {
                entry = entry.with_details(serde_json::json!({
                    "campaign": self.campaign,
                    "expected": result.expected,
                    "actual": result.actual,
                }));
            }
            log.emit_entry(entry)?;
        }
        Ok(results)
    }

    fn run_case(&self, case: &FixtureCase) -> VerificationResult {
        let started = Instant::now();
        let (actual, diff) = execute_case(case, self.base_config);
        let latency_ns = u64::try_from(started.elapsed().as_nanos()).unwrap_or(u64::MAX);
        log::debug!("[{}] {} -> {:?}", self.campaign, case.name, actual);
        VerificationResult {
            case_name: case.name.clone(),
            section: case.section.clone(),
            format: case.format.clone(),
            passed: actual == case.expected_output,
            expected: case.expected_output.clone(),
            actual,
            diff,
            latency_ns,
        }
    }
}

/// Formatter settings for `case` layered over `base`.
#[must_use]
pub fn case_config(case: &FixtureCase, base: FormatConfig) -> FormatConfig {
    let mut config = base;
    if let Some(n) = case.stack_capacity {
        config = config.with_stack_capacity(n);
    }
    if let Some(n) = case.growth_ceiling {
        config = config.with_growth_ceiling(n);
    }
    config
}

/// Escape callbacks for `mode`.
#[must_use]
pub fn escape_context(mode: EscapeMode) -> EscapeContext<'static> {
    match mode {
        EscapeMode::None => EscapeContext::default(),
        EscapeMode::Sql => EscapeContext::sql(),
    }
}

fn execute_case(case: &FixtureCase, base: FormatConfig) -> (String, Option<String>) {
    let specs = match ArgSpec::parse_all(case.args.as_slice()) {
        Ok(specs) => specs,
        Err(err) => {
            let actual = format!("unsupported:{err}");
            let diff_out = Some(diff::render_diff(&case.expected_output, &actual));
            return (actual, diff_out);
        }
    };
    let args: Vec<Arg<'_>> = specs.iter().map(ArgSpec::as_arg).collect();
    let formatter = Formatter::new()
        .with_escapes(escape_context(case.escapes))
        .with_config(case_config(case, base));

    let actual = match formatter.format(&case.format, &args) {
        Ok(out) => out,
        Err(err) => format!("unsupported:{err}"),
    };
    let diff_out = if actual == case.expected_output {
        None
    } else {
        Some(diff::render_diff(&case.expected_output, &actual))
    };
    (actual, diff_out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> FixtureSet {
        FixtureSet::from_json(
            r#"{
                "version":"v1",
                "family":"smoke",
                "captured_at":"2026-10-18T00:00:00Z",
                "cases":[
                    {"name":"pass","section":"integers","format":"%05d","args":["i32:-42"],"expected_output":"-0042"},
                    {"name":"fail","section":"integers","format":"%d","args":["i32:1"],"expected_output":"2"},
                    {"name":"bad_arg","section":"args","format":"%d","args":["i9:1"],"expected_output":"1"},
                    {"name":"sql","section":"escapes","format":"%q","args":["str:it's"],"expected_output":"'it''s'","escapes":"sql"},
                    {"name":"ceiling","section":"sizing","format":"%40d","args":["i32:1"],"expected_output":"                ","growth_ceiling":16,"stack_capacity":0}
                ]
            }"#,
        )
        .expect("valid fixture json")
    }

    #[test]
    fn runner_reports_each_case() {
        let results = TestRunner::new("smoke").run(&fixture());
        let passed: Vec<bool> = results.iter().map(|r| r.passed).collect();
        assert_eq!(passed, vec![true, false, false, true, true]);
        assert!(results[0].diff.is_none());
        assert!(results[1].diff.as_deref().unwrap().contains("-2\n+1\n"));
        assert!(results[2].actual.starts_with("unsupported:unknown argument kind"));
    }

    #[test]
    fn logged_run_writes_one_line_per_case() {
        let mut log = LogEmitter::new(Vec::new(), "unit");
        let results = TestRunner::new("smoke")
            .run_logged(&fixture(), &mut log)
            .unwrap();
        let text = String::from_utf8(log.into_inner()).unwrap();
        assert_eq!(text.lines().count(), results.len());
        assert!(text.lines().nth(1).unwrap().contains("\"outcome\":\"fail\""));
        assert!(text.lines().nth(2).unwrap().contains("\"outcome\":\"error\""));
    }

    #[test]
    fn case_overrides_layer_on_base() {
        let set = fixture();
        let base = FormatConfig::new().with_stack_capacity(32);
        let config = case_config(&set.cases[0], base);
        assert_eq!(config, base);
        let config = case_config(&set.cases[4], base);
        assert_eq!(config.stack_capacity(), 0);
        assert_eq!(config.growth_ceiling(), 16);
    }
}
