use derive_more::{Display, Error};
use miette::Diagnostic;
use std::{
    ffi::OsString,
    io,
    path::{Path, PathBuf},
    process::{ExitStatus, Stdio},
};
use tokio::process::{Child, Command};

#[derive(Debug, Display, Error, Diagnostic)]
#[non_exhaustive]
pub enum ExecutorError {
    #[display("Cannot find {program:?}: {error}")]
    #[diagnostic(
        code(vaultwrap_executor::program_not_found),
        help("Make sure npm is installed and on the PATH, or pass its location with --npm.")
    )]
    ProgramNotFound {
        program: PathBuf,
        #[error(source)]
        error: which::Error,
    },

    #[display("Failed to spawn {program:?}: {error}")]
    #[diagnostic(code(vaultwrap_executor::spawn))]
    Spawn {
        program: PathBuf,
        #[error(source)]
        error: io::Error,
    },

    #[display("Failed to wait for {program:?}: {error}")]
    #[diagnostic(code(vaultwrap_executor::wait))]
    Wait {
        program: PathBuf,
        #[error(source)]
        error: io::Error,
    },
}

/// An external program invocation whose standard streams are those of the current process.
#[derive(Debug, Clone)]
pub struct ExternalCommand {
    program: PathBuf,
    args: Vec<OsString>,
    current_dir: PathBuf,
}

impl ExternalCommand {
    /// Locate `program` (a name on the `PATH` or a path) and prepare to run it in `current_dir`.
    pub fn new(program: &Path, current_dir: &Path) -> Result<Self, ExecutorError> {
        let resolved = which::which(program).map_err(|error| ExecutorError::ProgramNotFound {
            program: program.to_path_buf(),
            error,
        })?;
        Ok(ExternalCommand { program: resolved, args: Vec::new(), current_dir: current_dir.into() })
    }

    /// Append arguments.
    pub fn args<Args>(mut self, args: Args) -> Self
    where
        Args: IntoIterator,
        Args::Item: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Path of the resolved program.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Start the program without waiting for it.
    pub fn spawn(&self) -> Result<Child, ExecutorError> {
        let ExternalCommand { program, args, .. } = self;
        tracing::debug!(target: "vaultwrap::executor", ?program, ?args, "Spawn");
        Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.current_dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|error| ExecutorError::Spawn { program: self.program.clone(), error })
    }

    /// Wait for a child started by [`ExternalCommand::spawn`].
    pub async fn wait(&self, child: &mut Child) -> Result<ExitStatus, ExecutorError> {
        child
            .wait()
            .await
            .map_err(|error| ExecutorError::Wait { program: self.program.clone(), error })
    }

    /// Run the program to completion.
    pub async fn execute(&self) -> Result<ExitStatus, ExecutorError> {
        let mut child = self.spawn()?;
        self.wait(&mut child).await
    }
}

/// Exit code to report for a child that exited with `status`.
///
/// A child killed by a signal on unix maps to `128 + signal`, like shells do.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}
