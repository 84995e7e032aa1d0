//! Concurrent wait-and-collect over one generator process per contract.
//!
//! ## Run protocol
//!
//! 1. Spawn one task per descriptor into a `JoinSet`; all start immediately.
//! 2. Gather results as they finish, keyed by registry index.
//! 3. Stop gathering early when the run-wide deadline passes (`TimedOut`) or,
//!    with fail-fast, when a task fails (`Aborted`).
//! 4. On an early stop, abort what is left. Aborting drops the invocation,
//!    which kills the generator's whole process group.
//! 5. Every descriptor gets exactly one [`TaskReport`], in registry order.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinSet;
use tokio::time::Instant;

use abigen_core::{ContractDescriptor, Registry};

use crate::error::{DispatchError, TaskFailure};
use crate::generator::Generator;
use crate::report::{file_sha256, RunReport, TaskOutcome, TaskReport};

/// Knobs for a single run.
#[derive(Debug, Clone, Default)]
pub struct DispatchOptions {
    /// Run-wide limit; `None` waits forever.
    pub timeout: Option<Duration>,
    /// Abort the remaining contracts after the first failure.
    pub fail_fast: bool,
}

/// Drives a [`Generator`] over a registry.
pub struct Dispatcher<G> {
    generator: Arc<G>,
    options: DispatchOptions,
}

impl<G: Generator> Dispatcher<G> {
    pub fn new(generator: G, options: DispatchOptions) -> Self {
        Self {
            generator: Arc::new(generator),
            options,
        }
    }

    pub fn options(&self) -> &DispatchOptions {
        &self.options
    }

    /// Generate bindings for every contract in `registry` and wait for all of
    /// them. The registry is expected to be validated already.
    ///
    /// Per-contract problems land in the report; `Err` means the dispatcher
    /// itself broke (a generation task panicked).
    pub async fn run(&self, registry: &Registry) -> Result<RunReport, DispatchError> {
        let started_at = Utc::now();
        let clock = Instant::now();
        let contracts = registry.list();

        let mut set = JoinSet::new();
        for (index, contract) in contracts.iter().cloned().enumerate() {
            let generator = Arc::clone(&self.generator);
            tracing::info!(contract = %contract.name, "launching generation");
            set.spawn(async move { (index, run_task(generator.as_ref(), &contract).await) });
        }

        let mut slots: Vec<Option<TaskReport>> = vec![None; contracts.len()];
        let deadline = self.options.timeout.map(|t| clock + t);
        let mut cutoff = None;

        loop {
            let joined = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, set.join_next()).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        let after_ms = millis(clock.elapsed());
                        tracing::warn!(after_ms, "run timed out, stopping unfinished generations");
                        cutoff = Some(TaskFailure::TimedOut { after_ms });
                        break;
                    }
                },
                None => set.join_next().await,
            };
            let Some(joined) = joined else { break };
            let (index, report) = joined?;

            let failed = !report.is_success();
            slots[index] = Some(report);
            if failed && self.options.fail_fast {
                tracing::warn!("fail-fast: aborting remaining generations");
                cutoff = Some(TaskFailure::Aborted);
                break;
            }
        }

        if cutoff.is_some() {
            set.abort_all();
            while let Some(joined) = set.join_next().await {
                match joined {
                    // finished before the abort landed
                    Ok((index, report)) => slots[index] = Some(report),
                    Err(err) if err.is_cancelled() => {}
                    Err(err) => return Err(err.into()),
                }
            }
        }

        let elapsed = millis(clock.elapsed());
        let tasks = contracts
            .iter()
            .zip(slots)
            .map(|(contract, slot)| {
                slot.unwrap_or_else(|| {
                    let failure = cutoff.clone().unwrap_or(TaskFailure::Aborted);
                    TaskReport::failed(contract.name.clone(), failure, elapsed)
                })
            })
            .collect();

        let report = RunReport {
            started_at,
            duration_ms: elapsed,
            tasks,
        };
        tracing::info!(
            succeeded = report.succeeded().count(),
            failed = report.failed().count(),
            "generation run finished"
        );
        Ok(report)
    }
}

/// One contract, start to finish. Never fails: every outcome becomes a report.
async fn run_task<G: Generator>(generator: &G, contract: &ContractDescriptor) -> TaskReport {
    let started = Instant::now();
    let result = generator.invoke(contract).await;
    let duration_ms = millis(started.elapsed());

    let output = match result {
        Ok(output) => output,
        Err(err) => {
            tracing::warn!(contract = %contract.name, error = %err, "generator did not start");
            return TaskReport::failed(contract.name.clone(), err.into(), duration_ms);
        }
    };

    let (outcome, output_sha256) = if output.success() {
        match file_sha256(&contract.output).await {
            Ok(digest) => (TaskOutcome::Succeeded, Some(digest)),
            Err(err) => {
                tracing::warn!(contract = %contract.name, error = %err, "output file unreadable");
                let path = contract.output.clone();
                (TaskOutcome::Failed(TaskFailure::MissingOutput { path }), None)
            }
        }
    } else {
        tracing::warn!(contract = %contract.name, code = ?output.code, "generator failed");
        let failure = TaskFailure::Generation { code: output.code };
        (TaskOutcome::Failed(failure), None)
    };

    if output_sha256.is_some() {
        tracing::info!(contract = %contract.name, duration_ms, "bindings generated");
    }

    TaskReport {
        name: contract.name.clone(),
        outcome,
        duration_ms,
        output_sha256,
        stdout: output.stdout,
        stderr: output.stderr,
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Mutex;

    use abigen_core::GeneratorSpec;
    use tempfile::TempDir;

    use super::*;
    use crate::error::LaunchError;
    use crate::generator::GeneratorOutput;

    /// Writes a placeholder for every contract except those it is told to
    /// fail, hang on, or refuse to start.
    #[derive(Default)]
    struct ScriptedGenerator {
        calls: Mutex<Vec<(String, PathBuf, PathBuf)>>,
        fail: Vec<&'static str>,
        hang: Vec<&'static str>,
        unlaunchable: Vec<&'static str>,
        silent: Vec<&'static str>,
    }

    impl Generator for ScriptedGenerator {
        async fn invoke(
            &self,
            contract: &ContractDescriptor,
        ) -> Result<GeneratorOutput, LaunchError> {
            let name = contract.name.as_str();
            self.calls.lock().expect("lock").push((
                name.to_string(),
                contract.abi.clone(),
                contract.output.clone(),
            ));

            if listed(&self.unlaunchable, name) {
                return Err(LaunchError {
                    program: "abi-gen".to_string(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                });
            }
            if listed(&self.hang, name) {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            if listed(&self.fail, name) {
                return Ok(GeneratorOutput {
                    code: Some(2),
                    stdout: String::new(),
                    stderr: format!("error: cannot parse {}", contract.abi.display()),
                });
            }
            if !listed(&self.silent, name) {
                std::fs::write(&contract.output, format!("// bindings for {name}\n"))
                    .expect("write output");
            }
            Ok(GeneratorOutput {
                code: Some(0),
                ..GeneratorOutput::default()
            })
        }
    }

    fn listed(list: &[&str], name: &str) -> bool {
        list.iter().any(|n| *n == name)
    }

    fn registry(dir: &TempDir, names: &[&str]) -> Registry {
        Registry {
            generator: GeneratorSpec::default(),
            contracts: names
                .iter()
                .map(|n| {
                    ContractDescriptor::new(
                        *n,
                        dir.path().join(format!("{n}.json")),
                        dir.path().join(format!("{n}.rs")),
                    )
                })
                .collect(),
        }
    }

    fn names(report: &RunReport) -> Vec<&str> {
        report.tasks.iter().map(|t| t.name.as_str()).collect()
    }

    #[tokio::test]
    async fn invokes_each_contract_once_with_its_paths() {
        let dir = TempDir::new().expect("tempdir");
        let reg = registry(&dir, &["A", "B", "C"]);
        let dispatcher = Dispatcher::new(ScriptedGenerator::default(), DispatchOptions::default());

        let report = dispatcher.run(&reg).await.expect("run");

        assert!(report.is_success());
        assert_eq!(names(&report), ["A", "B", "C"]);
        let mut calls = dispatcher.generator.calls.lock().expect("lock").clone();
        calls.sort();
        let expected: Vec<_> = reg
            .list()
            .iter()
            .map(|c| (c.name.to_string(), c.abi.clone(), c.output.clone()))
            .collect();
        assert_eq!(calls, expected);
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_siblings() {
        let dir = TempDir::new().expect("tempdir");
        let reg = registry(&dir, &["A", "B", "C"]);
        let generator = ScriptedGenerator {
            fail: vec!["B"],
            ..ScriptedGenerator::default()
        };

        let report = Dispatcher::new(generator, DispatchOptions::default())
            .run(&reg)
            .await
            .expect("run");

        assert!(!report.is_success());
        assert_eq!(report.succeeded().count(), 2);
        let b = report.get("B").expect("B reported");
        assert_eq!(
            b.failure(),
            Some(&TaskFailure::Generation { code: Some(2) })
        );
        assert!(b.diagnostics().contains("cannot parse"));
        assert!(dir.path().join("A.rs").exists());
        assert!(dir.path().join("C.rs").exists());
    }

    #[tokio::test]
    async fn launch_error_is_recorded_per_contract() {
        let dir = TempDir::new().expect("tempdir");
        let reg = registry(&dir, &["A", "B"]);
        let generator = ScriptedGenerator {
            unlaunchable: vec!["A"],
            ..ScriptedGenerator::default()
        };

        let report = Dispatcher::new(generator, DispatchOptions::default())
            .run(&reg)
            .await
            .expect("run");

        assert!(matches!(
            report.get("A").and_then(TaskReport::failure),
            Some(TaskFailure::Launch { .. })
        ));
        assert!(report.get("B").expect("B").is_success());
    }

    #[tokio::test]
    async fn success_without_output_file_is_a_failure() {
        let dir = TempDir::new().expect("tempdir");
        let reg = registry(&dir, &["A"]);
        let generator = ScriptedGenerator {
            silent: vec!["A"],
            ..ScriptedGenerator::default()
        };

        let report = Dispatcher::new(generator, DispatchOptions::default())
            .run(&reg)
            .await
            .expect("run");

        assert!(matches!(
            report.tasks[0].failure(),
            Some(TaskFailure::MissingOutput { .. })
        ));
    }

    #[tokio::test]
    async fn timeout_reports_unfinished_contracts() {
        let dir = TempDir::new().expect("tempdir");
        let reg = registry(&dir, &["A", "Slow"]);
        let generator = ScriptedGenerator {
            hang: vec!["Slow"],
            ..ScriptedGenerator::default()
        };
        let options = DispatchOptions {
            timeout: Some(Duration::from_millis(300)),
            fail_fast: false,
        };

        let report = Dispatcher::new(generator, options)
            .run(&reg)
            .await
            .expect("run");

        assert!(report.get("A").expect("A").is_success());
        assert!(matches!(
            report.get("Slow").and_then(TaskReport::failure),
            Some(TaskFailure::TimedOut { after_ms }) if *after_ms >= 300
        ));
    }

    #[tokio::test]
    async fn fail_fast_aborts_the_rest() {
        let dir = TempDir::new().expect("tempdir");
        let reg = registry(&dir, &["Bad", "Slow"]);
        let generator = ScriptedGenerator {
            fail: vec!["Bad"],
            hang: vec!["Slow"],
            ..ScriptedGenerator::default()
        };
        let options = DispatchOptions {
            timeout: None,
            fail_fast: true,
        };

        let report = Dispatcher::new(generator, options)
            .run(&reg)
            .await
            .expect("run");

        assert_eq!(names(&report), ["Bad", "Slow"]);
        assert!(matches!(
            report.get("Bad").and_then(TaskReport::failure),
            Some(TaskFailure::Generation { .. })
        ));
        assert_eq!(
            report.get("Slow").and_then(TaskReport::failure),
            Some(&TaskFailure::Aborted)
        );
    }

    #[tokio::test]
    async fn without_fail_fast_everything_runs() {
        let dir = TempDir::new().expect("tempdir");
        let reg = registry(&dir, &["Bad", "Good"]);
        let generator = ScriptedGenerator {
            fail: vec!["Bad"],
            ..ScriptedGenerator::default()
        };

        let report = Dispatcher::new(generator, DispatchOptions::default())
            .run(&reg)
            .await
            .expect("run");

        assert!(report.get("Good").expect("Good").is_success());
        assert_eq!(report.failed().count(), 1);
    }
}
