// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data-quality checks on the staging table.
//!
//! A check runs two SQL scripts, takes one scalar from each and compares
//! them. The result is posted to Slack; with severity `halt` a failed check
//! makes the process exit with 1 so the scheduler stops the pipeline.

use crate::db::Warehouse;
use crate::error::Result;
use crate::models::Scalar;
use crate::services::notify::SlackNotifier;
use std::fmt;
use std::path::{Path, PathBuf};

/// Comparison applied as `result_1 <op> result_2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operator {
    Equals,
    GreaterEquals,
    Greater,
    LessEquals,
    Less,
    NotEqual,
    /// Any other name. Never errors, always compares as failed.
    Unrecognized(String),
}

impl Operator {
    pub fn parse(name: &str) -> Self {
        match name {
            "equals" => Operator::Equals,
            "greater_equals" => Operator::GreaterEquals,
            "greater" => Operator::Greater,
            "less_equals" => Operator::LessEquals,
            "less" => Operator::Less,
            "not_equal" => Operator::NotEqual,
            other => Operator::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Operator::Equals => "equals",
            Operator::GreaterEquals => "greater_equals",
            Operator::Greater => "greater",
            Operator::LessEquals => "less_equals",
            Operator::Less => "less",
            Operator::NotEqual => "not_equal",
            Operator::Unrecognized(name) => name.as_str(),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a failed check should stop the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Severity {
    Halt,
    /// Anything but `halt`; the original label is kept for logging.
    Warn(String),
}

impl Severity {
    pub fn parse(level: &str) -> Self {
        if level == "halt" {
            Severity::Halt
        } else {
            Severity::Warn(level.to_string())
        }
    }
}

/// Compare two scalars. Unordered pairs (e.g. a `Null`) fail every ordering.
pub fn compare(result_1: &Scalar, result_2: &Scalar, operator: &Operator) -> bool {
    match operator {
        Operator::Equals => result_1 == result_2,
        Operator::GreaterEquals => result_1 >= result_2,
        Operator::Greater => result_1 > result_2,
        Operator::LessEquals => result_1 <= result_2,
        Operator::Less => result_1 < result_2,
        Operator::NotEqual => result_1 != result_2,
        Operator::Unrecognized(_) => false,
    }
}

/// Exit code for a finished check: 1 only for a failed `halt` check.
pub fn exit_code(passed: bool, severity: &Severity) -> i32 {
    match (passed, severity) {
        (false, Severity::Halt) => 1,
        _ => 0,
    }
}

/// Slack text for a check result.
pub fn result_message(
    script_1: &str,
    script_2: &str,
    operator: &Operator,
    passed: bool,
) -> String {
    let verdict = if passed {
        "Validation Test Passed!"
    } else {
        "Validation Test FAILED!"
    };
    format!("{}: {} / {} / {}", verdict, script_1, script_2, operator)
}

/// Scalars produced by a check and the comparison result.
#[derive(Debug, Clone)]
pub struct TestOutcome {
    pub result_1: Scalar,
    pub result_2: Scalar,
    pub passed: bool,
}

/// Run both scripts and compare their first values.
pub async fn execute_test(
    warehouse: &dyn Warehouse,
    script_1: &Path,
    script_2: &Path,
    operator: &Operator,
) -> Result<TestOutcome> {
    let result_1 = run_script(warehouse, script_1).await?;
    let result_2 = run_script(warehouse, script_2).await?;

    tracing::info!(
        result_1 = %result_1,
        result_2 = %result_2,
        operator = %operator,
        "Scripts executed"
    );

    let passed = compare(&result_1, &result_2, operator);
    if let Operator::Unrecognized(name) = operator {
        tracing::warn!(operator = %name, "Unknown comparison operator, check fails");
    }

    Ok(TestOutcome {
        result_1,
        result_2,
        passed,
    })
}

async fn run_script(warehouse: &dyn Warehouse, path: &Path) -> Result<Scalar> {
    let sql = tokio::fs::read_to_string(path).await?;
    warehouse.run_scalar_query(&sql).await
}

/// One validation invocation.
#[derive(Debug, Clone)]
pub struct ValidationCheck {
    pub script_1: PathBuf,
    pub script_2: PathBuf,
    pub operator: Operator,
    pub severity: Severity,
}

/// Result of running a check, including the exit code to use.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub outcome: TestOutcome,
    pub notified: bool,
    pub exit_code: i32,
}

impl ValidationCheck {
    /// Execute the check, notify, and work out the exit code.
    ///
    /// Script failures propagate; notification failures do not.
    pub async fn run(
        &self,
        warehouse: &dyn Warehouse,
        notifier: &SlackNotifier,
    ) -> Result<ValidationReport> {
        let outcome =
            execute_test(warehouse, &self.script_1, &self.script_2, &self.operator).await?;

        tracing::info!(
            script_1 = %self.script_1.display(),
            script_2 = %self.script_2.display(),
            passed = outcome.passed,
            "Validation test finished"
        );

        let message = result_message(
            &self.script_1.display().to_string(),
            &self.script_2.display().to_string(),
            &self.operator,
            outcome.passed,
        );
        let notified = notifier.send(&message).await;

        let exit_code = exit_code(outcome.passed, &self.severity);
        Ok(ValidationReport {
            outcome,
            notified,
            exit_code,
        })
    }
}
