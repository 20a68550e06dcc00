//! A single process execution and its captured output.

use crate::env::EnvironmentVariable;
use crate::error::{Error, Result};
use std::fmt;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Callback receiving each line as the child produces it.
pub type LineCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// How often `wait_for_exit` polls a child that has a timeout.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long output readers may keep draining after the child has gone.
///
/// Pipes stay open while any process that inherited them is alive, so
/// readers of a child that left a background process behind may never see
/// end-of-file.
const FLUSH_GRACE: Duration = Duration::from_millis(100);

/// Exit code reported when the OS gives none (e.g. killed by a signal).
pub const UNKNOWN_EXIT_CODE: i32 = -1;

type SharedLines = Arc<Mutex<Vec<String>>>;

/// Wrapper for one run of an external executable.
///
/// Output is captured line by line on background threads: every line is
/// appended to an ordered buffer and handed to the matching callback, in the
/// order the child wrote it. There is no ordering between stdout and stderr.
///
/// The child is not reaped automatically; call [`wait_for_exit`] or
/// [`terminate`] before dropping the execution.
///
/// # Example
///
/// ```no_run
/// use procrun::ProcessExecution;
/// use std::time::Duration;
///
/// let mut exec = ProcessExecution::new("dsc")
///     .command("resource")
///     .args(["get", "--resource", "Microsoft/OSInfo"]);
/// exec.start().unwrap();
/// if exec.wait_for_exit(Some(Duration::from_secs(30))).unwrap() {
///     println!("{}", exec.all_output());
/// }
/// ```
///
/// [`wait_for_exit`]: ProcessExecution::wait_for_exit
/// [`terminate`]: ProcessExecution::terminate
pub struct ProcessExecution {
    executable: PathBuf,
    command: Option<String>,
    arguments: Vec<String>,
    input: Option<String>,
    environment: Vec<EnvironmentVariable>,
    on_output: Option<LineCallback>,
    on_error: Option<LineCallback>,
    output: SharedLines,
    errors: SharedLines,
    child: Option<Child>,
    readers: Vec<JoinHandle<()>>,
    exit_code: Option<i32>,
    terminated: bool,
}

impl ProcessExecution {
    /// Create an execution for the given executable.
    pub fn new(executable: impl AsRef<Path>) -> Self {
        Self {
            executable: executable.as_ref().to_path_buf(),
            command: None,
            arguments: Vec::new(),
            input: None,
            environment: Vec::new(),
            on_output: None,
            on_error: None,
            output: SharedLines::default(),
            errors: SharedLines::default(),
            child: None,
            readers: Vec::new(),
            exit_code: None,
            terminated: false,
        }
    }

    /// Set the command token passed ahead of the other arguments.
    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Add one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.arguments.push(arg.into());
        self
    }

    /// Add several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments.extend(args.into_iter().map(Into::into));
        self
    }

    /// Data written to the child's standard input, which is then closed.
    pub fn input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }

    /// Apply an environment variable to the child.
    pub fn env(mut self, variable: EnvironmentVariable) -> Self {
        self.environment.push(variable);
        self
    }

    /// Apply several environment variables, in order.
    pub fn envs(mut self, variables: impl IntoIterator<Item = EnvironmentVariable>) -> Self {
        self.environment.extend(variables);
        self
    }

    /// Receive stdout lines as they are produced.
    pub fn on_output_line(mut self, callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_output = Some(Arc::new(callback));
        self
    }

    /// Receive stderr lines as they are produced.
    pub fn on_error_line(mut self, callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(callback));
        self
    }

    /// Executable path.
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// All arguments the child sees, command token first.
    pub fn arguments(&self) -> Vec<&str> {
        self.command
            .iter()
            .chain(self.arguments.iter())
            .map(String::as_str)
            .collect()
    }

    /// The full command line, for display and diagnostics.
    pub fn command_line(&self) -> String {
        let mut line = self.executable.display().to_string();
        for arg in self.arguments() {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    /// Whether `start` has been called successfully.
    pub fn is_started(&self) -> bool {
        self.child.is_some()
    }

    /// Launch the process and begin capturing its output.
    ///
    /// Returns as soon as the child is running.
    pub fn start(&mut self) -> Result<&mut Self> {
        if self.child.is_some() {
            return Err(Error::AlreadyStarted {
                command_line: self.command_line(),
            });
        }

        let mut command = Command::new(&self.executable);
        command
            .args(self.arguments())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if self.input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            });

        for variable in &self.environment {
            let inherited = std::env::var(&variable.name).ok();
            command.env(&variable.name, variable.resolve(inherited.as_deref()));
        }

        log::debug!("Starting process: {}", self.command_line());

        let mut child = command.spawn().map_err(|source| Error::LaunchFailed {
            executable: self.executable.clone(),
            source,
        })?;

        if let Some(stdout) = child.stdout.take() {
            self.readers.push(spawn_reader(
                stdout,
                Arc::clone(&self.output),
                self.on_output.clone(),
            ));
        }
        if let Some(stderr) = child.stderr.take() {
            self.readers.push(spawn_reader(
                stderr,
                Arc::clone(&self.errors),
                self.on_error.clone(),
            ));
        }

        // Written on its own thread so a child that fills its stdout pipe
        // before reading all of stdin cannot deadlock against us. Detached:
        // the write ends once the child reads everything or closes stdin.
        if let (Some(input), Some(mut stdin)) = (self.input.clone(), child.stdin.take()) {
            thread::spawn(move || {
                if let Err(e) = stdin.write_all(input.as_bytes()) {
                    log::debug!("Failed to write process input: {e}");
                }
            });
        }

        self.child = Some(child);
        Ok(self)
    }

    /// Wait for the process to exit.
    ///
    /// `None` (or a timeout too large to represent) waits indefinitely.
    /// Returns `false` if the timeout elapsed first; the process is left
    /// running and the caller decides whether to terminate it. On `true`,
    /// [`exit_code`](Self::exit_code) is set and the output is complete,
    /// unless a process the child left behind still holds its pipes open
    /// when the timeout runs out. Readers of such a pipe are detached.
    pub fn wait_for_exit(&mut self, timeout: Option<Duration>) -> Result<bool> {
        let deadline = timeout.and_then(|limit| Instant::now().checked_add(limit));
        let status = match self.child.as_mut() {
            Some(_) if self.terminated => return Ok(false),
            Some(_) if self.exit_code.is_some() => return Ok(true),
            Some(child) => wait_child(child, deadline)?,
            None => {
                return Err(Error::NotStarted {
                    command_line: self.command_line(),
                });
            }
        };

        let Some(status) = status else {
            log::debug!("Timed out waiting for: {}", self.command_line());
            return Ok(false);
        };

        let flush_deadline = deadline.map(|at| at.max(Instant::now() + FLUSH_GRACE));
        self.flush_readers(flush_deadline);
        self.exit_code = Some(status.code().unwrap_or(UNKNOWN_EXIT_CODE));
        log::debug!(
            "Process exited with {:?}: {}",
            self.exit_code,
            self.command_line()
        );
        Ok(true)
    }

    /// Kill the process and reap it.
    ///
    /// Only the child itself is killed. Output still being drained after a
    /// short grace period is abandoned, so this never waits on processes the
    /// child started. Subsequent calls to `wait_for_exit` report `false`.
    pub fn terminate(&mut self) -> Result<()> {
        let Some(child) = self.child.as_mut() else {
            return Err(Error::NotStarted {
                command_line: self.command_line(),
            });
        };

        match child.kill() {
            Ok(()) => {}
            // Already exited
            Err(e) if e.kind() == io::ErrorKind::InvalidInput => {}
            Err(e) => return Err(e.into()),
        }
        child.wait()?;

        self.terminated = true;
        self.flush_readers(Some(Instant::now() + FLUSH_GRACE));
        log::debug!("Terminated process: {}", self.command_line());
        Ok(())
    }

    /// Exit code; `None` until a successful `wait_for_exit`.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Stdout lines captured so far, in order.
    pub fn output_lines(&self) -> Vec<String> {
        lock_lines(&self.output).clone()
    }

    /// Stderr lines captured so far, in order.
    pub fn error_lines(&self) -> Vec<String> {
        lock_lines(&self.errors).clone()
    }

    /// All stdout lines joined, each followed by a newline.
    pub fn all_output(&self) -> String {
        join_lines(&lock_lines(&self.output))
    }

    /// All stderr lines joined, each followed by a newline.
    pub fn all_errors(&self) -> String {
        join_lines(&lock_lines(&self.errors))
    }

    /// Join the output readers, detaching any still running at `deadline`.
    fn flush_readers(&mut self, deadline: Option<Instant>) {
        if let Some(deadline) = deadline {
            while !self.readers.iter().all(JoinHandle::is_finished) {
                let now = Instant::now();
                if now >= deadline {
                    log::debug!(
                        "Output of {} still open after exit; detaching readers",
                        self.command_line()
                    );
                    self.readers.clear();
                    return;
                }
                thread::sleep(POLL_INTERVAL.min(deadline - now));
            }
        }

        for reader in self.readers.drain(..) {
            if reader.join().is_err() {
                log::warn!("Output capture thread panicked");
            }
        }
    }
}

impl fmt::Debug for ProcessExecution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessExecution")
            .field("command_line", &self.command_line())
            .field("started", &self.is_started())
            .field("exit_code", &self.exit_code)
            .finish_non_exhaustive()
    }
}

fn wait_child(child: &mut Child, deadline: Option<Instant>) -> io::Result<Option<ExitStatus>> {
    let Some(deadline) = deadline else {
        return child.wait().map(Some);
    };

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

fn spawn_reader<R>(source: R, sink: SharedLines, callback: Option<LineCallback>) -> JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut reader = BufReader::new(source);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    let line = decode_line(&buf);
                    lock_lines(&sink).push(line.clone());
                    if let Some(callback) = &callback {
                        callback(&line);
                    }
                }
                Err(e) => {
                    log::debug!("Stopped reading process stream: {e}");
                    break;
                }
            }
        }
    })
}

fn decode_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches(['\n', '\r'])
        .to_string()
}

fn lock_lines(lines: &Mutex<Vec<String>>) -> std::sync::MutexGuard<'_, Vec<String>> {
    lines.lock().unwrap_or_else(PoisonError::into_inner)
}

fn join_lines(lines: &[String]) -> String {
    let mut joined = String::new();
    for line in lines {
        joined.push_str(line);
        joined.push('\n');
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_line_strips_line_endings() {
        assert_eq!(decode_line(b"hello\r\n"), "hello");
        assert_eq!(decode_line(b"hello\n"), "hello");
        assert_eq!(decode_line(b"no newline"), "no newline");
    }

    #[test]
    fn test_join_lines() {
        let lines = vec!["a".to_string(), "b".to_string()];
        assert_eq!(join_lines(&lines), "a\nb\n");
        assert_eq!(join_lines(&[]), "");
    }

    #[test]
    fn test_command_line_includes_command_token() {
        let exec = ProcessExecution::new("/usr/bin/dsc")
            .command("resource")
            .args(["get", "--resource", "Test/Echo"]);
        assert_eq!(
            exec.command_line(),
            "/usr/bin/dsc resource get --resource Test/Echo"
        );
        assert_eq!(exec.arguments(), vec!["resource", "get", "--resource", "Test/Echo"]);
    }

    #[test]
    fn test_wait_before_start_fails() {
        let mut exec = ProcessExecution::new("dsc");
        let err = exec.wait_for_exit(None).unwrap_err();
        assert!(matches!(err, Error::NotStarted { .. }));
        assert!(exec.exit_code().is_none());
    }

    #[test]
    fn test_terminate_before_start_fails() {
        let mut exec = ProcessExecution::new("dsc");
        assert!(matches!(
            exec.terminate().unwrap_err(),
            Error::NotStarted { .. }
        ));
    }

    #[test]
    fn test_launch_missing_executable() {
        let dir = tempfile::tempdir().unwrap();
        let mut exec = ProcessExecution::new(dir.path().join("does-not-exist"));
        let err = exec.start().unwrap_err();
        assert!(err.is_launch_failure());
        assert!(!exec.is_started());
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use std::sync::Mutex;

        fn sh(script: &str) -> ProcessExecution {
            ProcessExecution::new("sh").command("-c").arg(script)
        }

        #[test]
        fn test_start_twice_fails() {
            let mut exec = sh("true");
            exec.start().unwrap();
            let err = exec.start().unwrap_err();
            assert!(matches!(err, Error::AlreadyStarted { .. }));
            assert!(exec.wait_for_exit(None).unwrap());
        }

        #[test]
        fn test_captures_streams_in_order() {
            let mut exec = sh("echo one; echo two; echo oops >&2; echo three");
            exec.start().unwrap();
            assert!(exec.wait_for_exit(Some(Duration::from_secs(10))).unwrap());

            assert_eq!(exec.output_lines(), vec!["one", "two", "three"]);
            assert_eq!(exec.error_lines(), vec!["oops"]);
            assert_eq!(exec.all_output(), "one\ntwo\nthree\n");
            assert_eq!(exec.exit_code(), Some(0));
        }

        #[test]
        fn test_callbacks_receive_lines() {
            let seen = Arc::new(Mutex::new(Vec::new()));
            let seen_errors = Arc::new(Mutex::new(Vec::new()));
            let out = Arc::clone(&seen);
            let err = Arc::clone(&seen_errors);

            let mut exec = sh("echo a; echo b >&2; echo c")
                .on_output_line(move |line| out.lock().unwrap().push(line.to_string()))
                .on_error_line(move |line| err.lock().unwrap().push(line.to_string()));
            exec.start().unwrap();
            assert!(exec.wait_for_exit(None).unwrap());

            assert_eq!(*seen.lock().unwrap(), vec!["a", "c"]);
            assert_eq!(*seen_errors.lock().unwrap(), vec!["b"]);
        }

        #[test]
        fn test_exit_code() {
            let mut exec = sh("exit 3");
            exec.start().unwrap();
            assert!(exec.wait_for_exit(None).unwrap());
            assert_eq!(exec.exit_code(), Some(3));
        }

        #[test]
        fn test_input_is_written_to_stdin() {
            let mut exec = ProcessExecution::new("cat").input("hello\nworld\n");
            exec.start().unwrap();
            assert!(exec.wait_for_exit(Some(Duration::from_secs(10))).unwrap());
            assert_eq!(exec.output_lines(), vec!["hello", "world"]);
        }

        #[test]
        fn test_large_input_does_not_deadlock() {
            let line = "x".repeat(1023);
            let input: String = (0..1024).map(|_| format!("{line}\n")).collect();
            let mut exec = ProcessExecution::new("cat").input(input);
            exec.start().unwrap();
            assert!(exec.wait_for_exit(Some(Duration::from_secs(30))).unwrap());
            assert_eq!(exec.output_lines().len(), 1024);
        }

        #[test]
        fn test_timeout_then_terminate() {
            let mut exec = sh("sleep 5");
            exec.start().unwrap();
            assert!(!exec.wait_for_exit(Some(Duration::from_millis(50))).unwrap());
            assert!(exec.exit_code().is_none());

            exec.terminate().unwrap();
            assert!(!exec.wait_for_exit(Some(Duration::from_millis(10))).unwrap());
        }

        #[test]
        fn test_environment_override() {
            let mut exec = sh("echo \"$PROCRUN_TEST_VALUE\"").env(EnvironmentVariable::overriding(
                "PROCRUN_TEST_VALUE",
                "configured",
            ));
            exec.start().unwrap();
            assert!(exec.wait_for_exit(None).unwrap());
            assert_eq!(exec.output_lines(), vec!["configured"]);
        }

        #[test]
        fn test_environment_prepend_to_unset_variable() {
            let mut exec = sh("echo \"$PROCRUN_TEST_UNSET\"").env(
                EnvironmentVariable::prepending("PROCRUN_TEST_UNSET", "front").with_separator(""),
            );
            exec.start().unwrap();
            assert!(exec.wait_for_exit(None).unwrap());
            assert_eq!(exec.output_lines(), vec!["front"]);
        }

        #[test]
        fn test_background_process_does_not_hold_wait() {
            let mut exec = sh("sleep 3 & echo '{}'");
            exec.start().unwrap();

            let started = Instant::now();
            assert!(exec.wait_for_exit(Some(Duration::from_millis(200))).unwrap());
            assert!(started.elapsed() < Duration::from_secs(2));
            assert_eq!(exec.exit_code(), Some(0));
            assert_eq!(exec.output_lines(), vec!["{}"]);
        }

        #[test]
        fn test_terminate_does_not_wait_for_background_process() {
            let mut exec = sh("sleep 3 & sleep 5");
            exec.start().unwrap();
            assert!(!exec.wait_for_exit(Some(Duration::from_millis(100))).unwrap());

            let started = Instant::now();
            exec.terminate().unwrap();
            assert!(started.elapsed() < Duration::from_secs(2));
            assert!(!exec.wait_for_exit(None).unwrap());
        }

        #[test]
        fn test_huge_timeout_waits_without_deadline() {
            let mut exec = sh("echo ok");
            exec.start().unwrap();
            assert!(
                exec.wait_for_exit(Some(Duration::from_secs(u64::MAX)))
                    .unwrap()
            );
            assert_eq!(exec.output_lines(), vec!["ok"]);
        }

        #[test]
        fn test_wait_is_repeatable_after_exit() {
            let mut exec = sh("echo done");
            exec.start().unwrap();
            assert!(exec.wait_for_exit(None).unwrap());
            assert!(exec.wait_for_exit(Some(Duration::ZERO)).unwrap());
            assert_eq!(exec.output_lines(), vec!["done"]);
        }
    }
}
