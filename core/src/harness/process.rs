use std::{
    io,
    process::{ExitStatus, Stdio},
    time::Duration,
};

use tokio::process::Command;

/// Exit code reported for a child killed on timeout (same as coreutils `timeout`).
pub const TIMEOUT_EXIT_CODE: i32 = 124;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captured {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
    pub timed_out: bool,
}

impl Captured {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == 0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,

        #[source]
        source: io::Error,
    },

    #[error("Failed to communicate with '{program}': {source}")]
    Communicate {
        program: String,

        #[source]
        source: io::Error,
    },
}

impl ProcessError {
    /// The program itself does not exist (as opposed to failing once started).
    pub fn is_program_missing(&self) -> bool {
        matches!(self, ProcessError::Spawn { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

pub fn program_name(cmd: &Command) -> String {
    cmd.as_std().get_program().to_string_lossy().into_owned()
}

/// Spawns `cmd` with stdin closed, captures stdout/stderr, and waits at most `time_limit`.
///
/// On timeout the child is killed and the result has `timed_out == true` and
/// `exit_code == TIMEOUT_EXIT_CODE`. `stdout`/`stderr` then hold whatever was read
/// before the kill; [`RunContext`](super::RunContext) drops it and reports a timeout.
pub async fn run(mut cmd: Command, time_limit: Duration) -> Result<Captured, ProcessError> {
    let program = self::program_name(&cmd);
    let start_at = tokio::time::Instant::now();

    let mut proc = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ProcessError::Spawn {
            program: program.clone(),
            source,
        })?;

    let pipe_error = |name: &str| ProcessError::Communicate {
        program: program.clone(),
        source: io::Error::new(io::ErrorKind::BrokenPipe, format!("Failed to open {}", name)),
    };
    let mut stdout = proc.stdout.take().ok_or_else(|| pipe_error("stdout"))?;
    let mut stderr = proc.stderr.take().ok_or_else(|| pipe_error("stderr"))?;

    let mut stdout_buf = Vec::new();
    let mut stderr_buf = Vec::new();

    let res = {
        let fut_stdout = tokio::io::copy(&mut stdout, &mut stdout_buf);
        let fut_stderr = tokio::io::copy(&mut stderr, &mut stderr_buf);
        let fut_exit_status = proc.wait();

        tokio::time::timeout(time_limit, async {
            tokio::try_join!(fut_stdout, fut_stderr, fut_exit_status)
        })
        .await
    };

    let elapsed = tokio::time::Instant::now().duration_since(start_at);

    let (exit_code, timed_out) = match res {
        Err(_) => {
            proc.kill()
                .await
                .unwrap_or_else(|e| log::warn!("Failed to kill timed-out '{}': {:#}", program, e));
            (TIMEOUT_EXIT_CODE, true)
        }

        Ok(Err(source)) => return Err(ProcessError::Communicate { program, source }),

        Ok(Ok((_, _, exit_status))) => (self::exit_code_of(exit_status), false),
    };

    Ok(Captured {
        exit_code,
        stdout: String::from_utf8_lossy(&stdout_buf).into(),
        stderr: String::from_utf8_lossy(&stderr_buf).into(),
        elapsed,
        timed_out,
    })
}

/// Signal deaths map to `128 + signo`, like a POSIX shell reports them.
fn exit_code_of(status: ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt as _;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    status.code().unwrap_or(-1)
}

#[cfg(test)]
mod test {
    use super::*;

    fn python(script: &str) -> Command {
        let mut cmd = Command::new("python3");
        cmd.args(["-c", script]);
        cmd
    }

    #[tokio::test]
    async fn captures_stdout_stderr_and_exit_code() {
        let cmd = python(r#"import sys; print("3"); print("oops", file=sys.stderr); sys.exit(42)"#);
        let res = dbg!(run(cmd, Duration::from_secs(10)).await).unwrap();
        assert_eq!(res.exit_code, 42);
        assert_eq!(res.stdout, "3\n");
        assert_eq!(res.stderr, "oops\n");
        assert!(!res.timed_out);
        assert!(!res.success());
    }

    #[tokio::test]
    async fn stdin_is_closed() {
        let cmd = python("import sys; print(len(sys.stdin.read()))");
        let res = run(cmd, Duration::from_secs(10)).await.unwrap();
        assert_eq!(res.stdout, "0\n");
        assert!(res.success());
    }

    #[tokio::test]
    async fn kills_on_timeout() {
        let cmd = python(r#"import time; print("started", flush=True); time.sleep(5)"#);
        let res = dbg!(run(cmd, Duration::from_millis(300)).await).unwrap();
        assert!(res.timed_out);
        assert_eq!(res.exit_code, TIMEOUT_EXIT_CODE);
        assert!(res.elapsed < Duration::from_secs(5));
        assert!(!res.success());
    }

    #[tokio::test]
    async fn missing_program_is_distinguishable() {
        let cmd = Command::new("solbench-surely-missing-program");
        let err = run(cmd, Duration::from_secs(1)).await.unwrap_err();
        assert!(err.is_program_missing());
    }
}
