//! Test execution.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Instant;

use crate::conformance;
use crate::error::EtsError;
use crate::report::{RunReport, TestRecord};
use crate::suite::{Fixture, SuiteContext};

/// Why a test did not pass.
#[derive(Debug)]
pub enum Failure {
    /// An assertion about the implementation under test did not hold
    Assertion(String),
    /// The test cannot be applied
    Skip(String),
    /// The test could not be carried out
    Error(EtsError),
}

impl From<EtsError> for Failure {
    fn from(e: EtsError) -> Self {
        Failure::Error(e)
    }
}

pub type Verdict = Result<(), Failure>;

pub fn fail(message: impl Into<String>) -> Failure {
    Failure::Assertion(message.into())
}

pub fn skip(message: impl Into<String>) -> Failure {
    Failure::Skip(message.into())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail,
    Skip,
    Error,
}

/// Static description of a single test.
#[derive(Debug, Clone, Copy)]
pub struct TestInfo {
    pub name: &'static str,
    /// Abstract test identifier, when the test implements a numbered one
    pub requirement: Option<&'static str>,
    pub description: &'static str,
}

/// A test class initialized for one run.
#[async_trait]
pub trait TestClass: Send + Sync {
    async fn run(&self, test: &TestInfo, ctx: &SuiteContext, fixture: &mut Fixture) -> Verdict;
}

/// Class-level setup; returns a skip reason when the class cannot run.
pub type ClassInit = fn(&SuiteContext) -> Result<Box<dyn TestClass>, String>;

/// Registry entry for a test class.
#[derive(Clone, Copy)]
pub struct ClassDescriptor {
    pub name: &'static str,
    /// Conformance class the IUT must implement for the tests to apply
    pub conformance_class: Option<&'static str>,
    pub tests: &'static [TestInfo],
    pub init: ClassInit,
}

/// All test classes, in execution order.
pub fn test_classes() -> Vec<ClassDescriptor> {
    vec![
        crate::capabilities::DESCRIPTOR,
        crate::opensearch::description::DESCRIPTOR,
        crate::opensearch::search::DESCRIPTOR,
        crate::opensearch::geo::DESCRIPTOR,
    ]
}

pub struct Executor<'a> {
    ctx: &'a SuiteContext,
    classes: Vec<ClassDescriptor>,
}

impl<'a> Executor<'a> {
    /// Executor for the classes named in `selection` (all when empty).
    pub fn new(ctx: &'a SuiteContext, selection: &[String]) -> Result<Self, EtsError> {
        let available = test_classes();
        for name in selection {
            if !available.iter().any(|c| c.name == name.as_str()) {
                return Err(EtsError::Precondition(format!("Unknown test class: {}", name)));
            }
        }
        let classes = available
            .into_iter()
            .filter(|c| selection.is_empty() || selection.iter().any(|s| s == c.name))
            .collect();
        Ok(Self { ctx, classes })
    }

    pub async fn run(&self) -> RunReport {
        let mut results = Vec::new();
        for descriptor in &self.classes {
            results.extend(self.run_class(descriptor).await);
        }

        let declared = self
            .ctx
            .capabilities_doc()
            .map(|doc| conformance::declared_classes(&doc))
            .unwrap_or_default();
        RunReport::new(self.ctx.iut.as_str(), declared, results)
    }

    async fn run_class(&self, descriptor: &ClassDescriptor) -> Vec<TestRecord> {
        tracing::info!("Running test class {}", descriptor.name);

        if let Some(class) = descriptor.conformance_class {
            let implemented = self
                .ctx
                .capabilities_doc()
                .map(|doc| conformance::is_implemented(&doc, class))
                .unwrap_or(false);
            if !implemented {
                let reason = format!("Conformance class {} is not implemented", class);
                tracing::info!("Skipping {}: {}", descriptor.name, reason);
                return skipped(descriptor, &reason);
            }
        }

        let instance = match (descriptor.init)(self.ctx) {
            Ok(instance) => instance,
            Err(reason) => {
                tracing::warn!("Skipping {}: {}", descriptor.name, reason);
                return skipped(descriptor, &reason);
            }
        };

        let mut records = Vec::with_capacity(descriptor.tests.len());
        for test in descriptor.tests {
            let mut fixture = Fixture::new();
            let start = Instant::now();
            let verdict = instance.run(test, self.ctx, &mut fixture).await;
            let duration = start.elapsed();

            let mut record = TestRecord::new(descriptor.name, test, duration);
            match verdict {
                Ok(()) => {
                    tracing::info!("{}::{} passed", descriptor.name, test.name);
                    record.outcome = Outcome::Pass;
                }
                Err(Failure::Skip(reason)) => {
                    tracing::info!("{}::{} skipped: {}", descriptor.name, test.name, reason);
                    record.outcome = Outcome::Skip;
                    record.message = Some(reason);
                }
                Err(Failure::Assertion(message)) => {
                    tracing::warn!("{}::{} failed: {}", descriptor.name, test.name, message);
                    record.outcome = Outcome::Fail;
                    record.message = Some(message);
                    record.attach_messages(&fixture);
                }
                Err(Failure::Error(e)) => {
                    tracing::error!("{}::{} error: {}", descriptor.name, test.name, e);
                    record.outcome = Outcome::Error;
                    record.message = Some(e.to_string());
                    record.attach_messages(&fixture);
                }
            }
            records.push(record);
        }
        records
    }
}

fn skipped(descriptor: &ClassDescriptor, reason: &str) -> Vec<TestRecord> {
    descriptor
        .tests
        .iter()
        .map(|test| {
            let mut record = TestRecord::new(descriptor.name, test, Default::default());
            record.outcome = Outcome::Skip;
            record.message = Some(reason.to_string());
            record
        })
        .collect()
}
