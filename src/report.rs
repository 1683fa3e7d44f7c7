//! Run reports.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

use crate::error::EtsResult;
use crate::runner::{Outcome, TestInfo};
use crate::suite::Fixture;

#[derive(Debug, Clone, Serialize)]
pub struct TestRecord {
    pub class: String,
    pub test: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirement: Option<String>,
    pub description: String,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    pub duration_ms: u64,
}

impl TestRecord {
    pub fn new(class: &str, test: &TestInfo, duration: Duration) -> Self {
        Self {
            class: class.to_string(),
            test: test.name.to_string(),
            requirement: test.requirement.map(str::to_string),
            description: test.description.to_string(),
            outcome: Outcome::Pass,
            message: None,
            request: None,
            response: None,
            duration_ms: duration.as_millis() as u64,
        }
    }

    /// Attach summaries of the last request and response made by the test.
    pub fn attach_messages(&mut self, fixture: &Fixture) {
        if !fixture.request.is_empty() {
            self.request = Some(fixture.request.summarize());
        }
        if !fixture.response.is_empty() {
            self.response = Some(fixture.response.summarize());
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub skipped: usize,
    /// Percentage of passed tests among those not skipped
    pub pass_rate: f64,
}

impl Summary {
    pub fn from_results(results: &[TestRecord]) -> Self {
        let count = |outcome: Outcome| results.iter().filter(|r| r.outcome == outcome).count();
        let total = results.len();
        let passed = count(Outcome::Pass);
        let failed = count(Outcome::Fail);
        let errors = count(Outcome::Error);
        let skipped = count(Outcome::Skip);

        let applicable = total - skipped;
        let pass_rate = if applicable > 0 {
            (passed as f64 / applicable as f64) * 100.0
        } else {
            0.0
        };

        Self {
            total,
            passed,
            failed,
            errors,
            skipped,
            pass_rate,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub iut: String,
    pub timestamp: DateTime<Utc>,
    pub conformance_classes: Vec<String>,
    pub summary: Summary,
    pub results: Vec<TestRecord>,
}

impl RunReport {
    pub fn new(iut: &str, conformance_classes: Vec<String>, results: Vec<TestRecord>) -> Self {
        Self {
            iut: iut.to_string(),
            timestamp: Utc::now(),
            conformance_classes,
            summary: Summary::from_results(&results),
            results,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.summary.failed > 0 || self.summary.errors > 0
    }

    pub fn to_json(&self) -> EtsResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str("# CSW 3.0 Conformance Test Report\n\n");
        md.push_str(&format!("**IUT:** {}\n", self.iut));
        md.push_str(&format!(
            "**Date:** {}\n",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        if !self.conformance_classes.is_empty() {
            md.push_str(&format!(
                "**Declared conformance classes:** {}\n",
                self.conformance_classes.join(", ")
            ));
        }
        md.push('\n');

        md.push_str("## Summary\n\n");
        md.push_str("| Metric | Count |\n");
        md.push_str("|--------|-------|\n");
        md.push_str(&format!("| Total | {} |\n", self.summary.total));
        md.push_str(&format!("| Passed | {} |\n", self.summary.passed));
        md.push_str(&format!("| Failed | {} |\n", self.summary.failed));
        md.push_str(&format!("| Errors | {} |\n", self.summary.errors));
        md.push_str(&format!("| Skipped | {} |\n", self.summary.skipped));
        md.push_str(&format!(
            "| **Pass Rate** | **{:.2}%** |\n\n",
            self.summary.pass_rate
        ));

        md.push_str("## Results\n\n");
        md.push_str("| Class | Test | Outcome | Message |\n");
        md.push_str("|-------|------|---------|---------|\n");
        for r in &self.results {
            let test = match &r.requirement {
                Some(req) => format!("{} ({})", r.test, req),
                None => r.test.clone(),
            };
            md.push_str(&format!(
                "| {} | {} | {:?} | {} |\n",
                r.class,
                test,
                r.outcome,
                r.message
                    .as_deref()
                    .map(|m| m.lines().next().unwrap_or_default().replace('|', "\\|"))
                    .unwrap_or_else(|| "-".to_string())
            ));
        }

        let failed: Vec<_> = self
            .results
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::Fail | Outcome::Error))
            .collect();
        if !failed.is_empty() {
            md.push_str("\n## Failures\n");
            for r in failed {
                md.push_str(&format!("\n### {}::{}\n\n", r.class, r.test));
                if let Some(message) = &r.message {
                    md.push_str(&format!("{}\n", message));
                }
                if let Some(request) = &r.request {
                    md.push_str(&format!("\nRequest:\n```\n{}```\n", request));
                }
                if let Some(response) = &r.response {
                    md.push_str(&format!("\nResponse:\n```\n{}```\n", response));
                }
            }
        }

        md
    }
}
