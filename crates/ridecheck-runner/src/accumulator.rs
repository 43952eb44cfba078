//! Ordered assertion queue with critical short-circuit

use crate::assertion::Assertion;
use crate::report::AssertionResult;

#[derive(Debug)]
struct QueuedAssertion<'a> {
    assertion: Assertion<'a>,
    critical: bool,
}

/// Collects assertions for one exchange and runs them in queue order.
///
/// A failing critical assertion stops the run: later assertions depend on
/// what it checked and would only add noise.
#[derive(Debug, Default)]
pub struct Accumulator<'a> {
    queue: Vec<QueuedAssertion<'a>>,
}

impl<'a> Accumulator<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self { queue: Vec::new() }
    }

    pub fn queue(&mut self, assertion: Assertion<'a>) {
        self.queue.push(QueuedAssertion {
            assertion,
            critical: false,
        });
    }

    pub fn queue_critical(&mut self, assertion: Assertion<'a>) {
        self.queue.push(QueuedAssertion {
            assertion,
            critical: true,
        });
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    /// Execute queued assertions in order.
    ///
    /// The result for the failing critical assertion is included; nothing
    /// after it is executed.
    #[must_use]
    pub fn execute_all(self) -> Vec<AssertionResult> {
        let mut results = Vec::with_capacity(self.queue.len());
        for queued in self.queue {
            let description = queued.assertion.describe();
            let outcome = queued.assertion.execute();
            let stop = queued.critical && outcome.is_err();
            results.push(AssertionResult {
                description,
                error: outcome.err(),
            });
            if stop {
                tracing::debug!(
                    executed = results.len(),
                    "critical assertion failed, skipping the rest"
                );
                break;
            }
        }
        results
    }
}
