use std::path::Path;

use super::{
    entrypoint,
    error::RunError,
    runner::{self, RunContext, RunOutput},
};

pub const ENTRY_POINTS: &[&str] = &["main.py", "solution.py"];
pub const EXTENSIONS: &[&str] = &["py"];

pub async fn run(dir: &Path, input_file: &Path, ctx: &RunContext) -> Result<RunOutput, RunError> {
    let entry = entrypoint::find(dir, ENTRY_POINTS, EXTENSIONS)?;

    let mut cmd = runner::command(&ctx.toolchain.python, dir);
    cmd.arg(&entry).arg(input_file);
    ctx.execute(cmd).await
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::*;
    use crate::harness::process::TIMEOUT_EXIT_CODE;

    fn solution_dir(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, contents) in files {
            fsutil::write(dir.path().join(name), contents).unwrap();
        }
        dir
    }

    #[tokio::test]
    async fn passes_input_path_and_runs_in_solution_dir() {
        let dir = solution_dir(&[
            (
                "main.py",
                "import os, sys\nprint(open(sys.argv[1]).read().strip())\nprint(os.path.basename(os.getcwd()))\n",
            ),
            ("input.txt", "3 4"),
        ]);
        let dir_name = dir.path().file_name().unwrap().to_string_lossy().to_string();

        let out = dbg!(run(dir.path(), &dir.path().join("input.txt"), &RunContext::default()).await)
            .unwrap();
        assert_eq!(out.exit_code, 0);
        assert_eq!(out.stdout, format!("3 4\n{}\n", dir_name));
    }

    #[tokio::test]
    async fn nonzero_exit_is_an_output_not_an_error() {
        let dir = solution_dir(&[("solution.py", "raise SystemExit(3)")]);
        let out = run(dir.path(), Path::new("unused"), &RunContext::default())
            .await
            .unwrap();
        assert_eq!(out.exit_code, 3);
    }

    #[tokio::test]
    async fn timeout_is_reported() {
        let dir = solution_dir(&[("main.py", "import time\ntime.sleep(10)\n")]);
        let mut ctx = RunContext::default();
        ctx.limits.execute = Duration::from_millis(300);

        let err = run(dir.path(), Path::new("unused"), &ctx).await.unwrap_err();
        assert!(matches!(err, RunError::Timeout { .. }));
        assert_eq!(err.exit_code(), TIMEOUT_EXIT_CODE);
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn empty_dir_has_no_entry_point() {
        let dir = solution_dir(&[]);
        let err = run(dir.path(), Path::new("unused"), &RunContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::EntryPointNotFound { .. }));
    }
}
