//! Process pipelines built from explicit argument vectors
//!
//! External tools are chained with in-process stream plumbing instead of
//! shell command strings, so database names, hosts and credentials are
//! passed as plain process arguments and never interpolated into a shell.

use crate::error::{BackupError, Result};
use std::ffi::{OsStr, OsString};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;
use tracing::{debug, error};

/// One external tool invocation inside a pipeline
#[derive(Debug, Clone)]
pub struct Stage {
    program: PathBuf,
    args: Vec<OsString>,
}

impl Stage {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    fn render(&self) -> String {
        let mut out = self.program.display().to_string();
        for arg in &self.args {
            out.push(' ');
            out.push_str(&arg.to_string_lossy());
        }
        out
    }
}

/// A sequence of stages where each stage's stdout feeds the next stage's
/// stdin. The first stage may read from a file, the last may write to one.
///
/// Execution is synchronous and blocking with no built-in timeout; callers
/// wanting bounded latency must impose cancellation externally.
#[derive(Debug, Clone)]
pub struct Pipeline {
    stages: Vec<Stage>,
    stdin_file: Option<PathBuf>,
    stdout_file: Option<PathBuf>,
    quiet_stderr: bool,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            stdin_file: None,
            stdout_file: None,
            quiet_stderr: true,
        }
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Feed the first stage's stdin from a file
    pub fn stdin_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdin_file = Some(path.into());
        self
    }

    /// Write the last stage's stdout to a file
    pub fn stdout_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdout_file = Some(path.into());
        self
    }

    /// Send stage stderr to the null sink instead of capturing it
    pub fn quiet_stderr(mut self, quiet: bool) -> Self {
        self.quiet_stderr = quiet;
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Run all stages to completion. Fails with `ProcessFailed` carrying
    /// the exit code of the first failing stage.
    pub fn run(&self) -> Result<()> {
        if self.stages.is_empty() {
            return Ok(());
        }

        debug!(
            "Running pipeline: {}",
            self.stages
                .iter()
                .map(Stage::render)
                .collect::<Vec<_>>()
                .join(" | ")
        );

        let mut children: Vec<Child> = Vec::with_capacity(self.stages.len());
        let mut stderr_readers = Vec::with_capacity(self.stages.len());

        // A stage failing to start must not leave earlier stages behind
        // as zombies
        if let Err(e) = self.spawn_stages(&mut children, &mut stderr_readers) {
            for mut child in children {
                let _ = child.kill();
                let _ = child.wait();
            }
            return Err(e);
        }

        let mut failure: Option<i32> = None;
        for (i, mut child) in children.into_iter().enumerate() {
            let status = child.wait()?;
            let stderr = stderr_readers[i]
                .take()
                .and_then(|handle| handle.join().ok())
                .unwrap_or_default();

            if !status.success() && failure.is_none() {
                let code = status.code().unwrap_or(-1);
                error!("Stage failed: {}", self.stages[i].render());
                if !stderr.trim().is_empty() {
                    error!("Stderr: {}", stderr.trim());
                }
                failure = Some(code);
            } else if !stderr.trim().is_empty() {
                debug!("Stderr of {}: {}", self.stages[i].render(), stderr.trim());
            }
        }

        match failure {
            Some(code) => Err(BackupError::ProcessFailed(code)),
            None => Ok(()),
        }
    }

    fn spawn_stages(
        &self,
        children: &mut Vec<Child>,
        stderr_readers: &mut Vec<Option<JoinHandle<String>>>,
    ) -> Result<()> {
        let last = self.stages.len() - 1;

        for (i, stage) in self.stages.iter().enumerate() {
            let stdin = if i == 0 {
                match &self.stdin_file {
                    Some(path) => {
                        let file = File::open(path)
                            .map_err(|_| BackupError::FileNotReadable(path.clone()))?;
                        Stdio::from(file)
                    }
                    None => Stdio::null(),
                }
            } else {
                // Take the previous stage's stdout pipe
                let prev = children
                    .last_mut()
                    .and_then(|child| child.stdout.take())
                    .ok_or_else(|| {
                        BackupError::Io(std::io::Error::other("missing pipe between stages"))
                    })?;
                Stdio::from(prev)
            };

            let stdout = if i == last {
                match &self.stdout_file {
                    Some(path) => Stdio::from(File::create(path)?),
                    None => Stdio::null(),
                }
            } else {
                Stdio::piped()
            };

            let stderr = if self.quiet_stderr {
                Stdio::null()
            } else {
                Stdio::piped()
            };

            let mut child = Command::new(&stage.program)
                .args(&stage.args)
                .stdin(stdin)
                .stdout(stdout)
                .stderr(stderr)
                .spawn()?;

            // Drain stderr on a thread so a chatty tool cannot block on a
            // full pipe before we wait on it
            let reader = child.stderr.take().map(|mut pipe| {
                std::thread::spawn(move || {
                    let mut buf = String::new();
                    let _ = pipe.read_to_string(&mut buf);
                    buf
                })
            });
            stderr_readers.push(reader);
            children.push(child);
        }

        Ok(())
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_single_stage_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("out.txt");

        Pipeline::new()
            .stage(Stage::new("echo").arg("hello"))
            .stdout_file(&out)
            .run()
            .unwrap();

        assert_eq!(std::fs::read_to_string(&out).unwrap().trim(), "hello");
    }

    #[test]
    fn test_two_stage_pipe() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("out.txt");

        Pipeline::new()
            .stage(Stage::new("printf").arg("b\na\n"))
            .stage(Stage::new("sort"))
            .stdout_file(&out)
            .run()
            .unwrap();

        assert_eq!(std::fs::read_to_string(&out).unwrap(), "a\nb\n");
    }

    #[test]
    fn test_stdin_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("in.txt");
        let out = temp_dir.path().join("out.txt");
        std::fs::write(&input, "one\ntwo\n").unwrap();

        Pipeline::new()
            .stage(Stage::new("wc").arg("-l"))
            .stdin_file(&input)
            .stdout_file(&out)
            .run()
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(&out).unwrap().trim(),
            "2"
        );
    }

    #[test]
    fn test_failing_stage_reports_exit_code() {
        let err = Pipeline::new()
            .stage(Stage::new("false"))
            .run()
            .unwrap_err();
        assert!(matches!(err, BackupError::ProcessFailed(1)));
    }

    #[test]
    fn test_spawn_failure_reaps_earlier_stages() {
        // The first stage would block forever; a failed spawn of the
        // second must kill and reap it rather than abandon it
        let start = std::time::Instant::now();
        let err = Pipeline::new()
            .stage(Stage::new("sleep").arg("30"))
            .stage(Stage::new("/nonexistent/tool"))
            .run()
            .unwrap_err();
        assert!(matches!(err, BackupError::Io(_)));
        assert!(start.elapsed() < std::time::Duration::from_secs(10));
    }

    #[test]
    fn test_missing_stdin_file() {
        let err = Pipeline::new()
            .stage(Stage::new("cat"))
            .stdin_file("/nonexistent/input.sql")
            .run()
            .unwrap_err();
        assert!(matches!(err, BackupError::FileNotReadable(_)));
    }
}
