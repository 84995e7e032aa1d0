//! The external generator seam.
//!
//! The dispatcher only knows [`Generator::invoke`]; [`CommandGenerator`] is the
//! real implementation that shells out to the ABI generator binary.
//!
//! On unix each generator runs as the leader of its own process group, and the
//! whole group is killed when the invocation ends or is dropped. A launcher
//! such as `cargo run` therefore cannot leave the real generator behind.

use std::ffi::OsString;
use std::future::Future;
use std::process::Stdio;

use tokio::process::Command;

use abigen_core::{ContractDescriptor, GeneratorSpec};

use crate::error::LaunchError;

/// Flags the generator expects, in order: name, ABI input, output file.
pub const NAME_FLAG: &str = "-c";
pub const ABI_FLAG: &str = "-j";
pub const OUTPUT_FLAG: &str = "-o";

/// What one generator run left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratorOutput {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl GeneratorOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Produces bindings for one contract.
///
/// Dropping the returned future must stop any work it started; the
/// dispatcher relies on that for timeouts and fail-fast.
pub trait Generator: Send + Sync + 'static {
    fn invoke(
        &self,
        contract: &ContractDescriptor,
    ) -> impl Future<Output = Result<GeneratorOutput, LaunchError>> + Send;
}

/// Runs `<program> <args..> -c <name> -j <abi> -o <output>` as a child process.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    spec: GeneratorSpec,
}

impl CommandGenerator {
    pub fn new(spec: GeneratorSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &GeneratorSpec {
        &self.spec
    }

    /// Every argument after the program name, for display and for `Command`.
    pub fn command_args(&self, contract: &ContractDescriptor) -> Vec<OsString> {
        self.spec
            .args
            .iter()
            .map(OsString::from)
            .chain(invocation_args(contract))
            .collect()
    }

    fn command(&self, contract: &ContractDescriptor) -> Command {
        let mut cmd = Command::new(&self.spec.program);
        cmd.args(self.command_args(contract))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);
        if let Some(dir) = &self.spec.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl Generator for CommandGenerator {
    async fn invoke(&self, contract: &ContractDescriptor) -> Result<GeneratorOutput, LaunchError> {
        let mut cmd = self.command(contract);
        tracing::debug!(contract = %contract.name, command = ?cmd.as_std(), "spawning generator");

        let launch_error = |source: std::io::Error| LaunchError {
            program: self.spec.program.clone(),
            source,
        };
        let child = cmd.spawn().map_err(launch_error)?;
        let _group = ProcessGroup::led_by(child.id());
        let output = child.wait_with_output().await.map_err(launch_error)?;

        Ok(GeneratorOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Kills every process in a generator's group when dropped.
///
/// Dropping the child handle alone only reaches the direct child.
#[derive(Debug)]
struct ProcessGroup {
    #[cfg_attr(not(unix), allow(dead_code))]
    leader: Option<u32>,
}

impl ProcessGroup {
    fn led_by(leader: Option<u32>) -> Self {
        Self { leader }
    }
}

#[cfg(unix)]
impl Drop for ProcessGroup {
    fn drop(&mut self) {
        use nix::errno::Errno;
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        let Some(pgid) = self.leader.and_then(|pid| i32::try_from(pid).ok()) else {
            return;
        };
        match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
            Ok(()) => tracing::debug!(pgid, "killed generator process group"),
            // already gone
            Err(Errno::ESRCH) => {}
            Err(err) => tracing::warn!(pgid, error = %err, "cannot kill generator process group"),
        }
    }
}

/// `-c <name> -j <abi> -o <output>` for one contract.
pub fn invocation_args(contract: &ContractDescriptor) -> [OsString; 6] {
    [
        NAME_FLAG.into(),
        contract.name.as_str().into(),
        ABI_FLAG.into(),
        contract.abi.clone().into_os_string(),
        OUTPUT_FLAG.into(),
        contract.output.clone().into_os_string(),
    ]
}
