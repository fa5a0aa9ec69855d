//! Pipeline Executor
//!
//! Runs one job to completion. All pipes are allocated up front, every task is
//! launched before the shell waits for any of them, and each pipe end is
//! closed in the shell as soon as the task using it has been launched so that
//! readers see end-of-stream once their writers are gone.

use std::ffi::CString;
use std::io::{self, Write};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::process::ExitStatus;

use log::{debug, error, warn};
use nix::errno::Errno;
use nix::libc;
use nix::sys::signal::{self, SigHandler, Signal};
use nix::sys::wait::{self, WaitStatus};
use nix::unistd::{self, ForkResult, Pid};

use super::builtins::Builtins;
use super::{COMMAND_NOT_EXECUTABLE_EXIT_STATUS, COMMAND_NOT_FOUND_EXIT_STATUS};
use crate::errors::{Error, ErrorKind, Result};
use crate::job::{Job, Status, Task};
use crate::util::KoishExitStatusExt;

/// The pipe between task `i` and task `i + 1`. An end is `None` once the
/// shell has closed its copy.
#[derive(Debug)]
struct Pipe {
    read: Option<OwnedFd>,
    write: Option<OwnedFd>,
}

/// Effective standard streams of a task; `None` means the shell's own stream.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Wiring {
    stdin: Option<RawFd>,
    stdout: Option<RawFd>,
}

impl Wiring {
    /// (source, target) pairs for the streams that must be replaced.
    fn redirections(&self) -> impl Iterator<Item = (RawFd, RawFd)> {
        let stdin = self.stdin.map(|fd| (fd, libc::STDIN_FILENO));
        let stdout = self.stdout.map(|fd| (fd, libc::STDOUT_FILENO));
        stdin.into_iter().chain(stdout)
    }
}

/// Executes `job`, returning the status of its last task, or the status of a
/// builtin that asked the shell to terminate.
///
/// A pipe allocation failure aborts the job before anything runs
/// (`ErrorKind::Pipe`). A fork failure is returned as `ErrorKind::Fork` and
/// must end the shell.
pub fn execute_job(job: &mut Job, builtins: &Builtins) -> Result<Status> {
    debug!("executing job '{}'", job);
    let mut pipes = create_pipes(job.len().saturating_sub(1))?;
    let mut terminated = None;

    for index in 0..job.len() {
        let wiring = wiring(&pipes, index);
        let task = &mut job.tasks_mut()[index];
        let result = run_task(task, builtins, wiring, &mut pipes);
        close_used_ends(&mut pipes, index);

        if let Some(status) = result? {
            if status.is_terminal() {
                debug!("'{}' requested termination, skipping the rest of the job", task);
                terminated = Some(status);
                break;
            }
        }
    }

    // Ends left open belong to tasks that will never run.
    drop(pipes);
    wait_for_tasks(job);

    let status = terminated.unwrap_or_else(|| {
        let last = job.tasks().last().and_then(Task::status);
        Status::Continue(last.unwrap_or_else(ExitStatus::from_success))
    });
    debug!("job '{}' finished: {}", job, status);
    job.set_last_status(status);
    Ok(status)
}

/// Runs or launches one task. Returns the task's status if it finished inside
/// the shell (builtin or skipped), `None` if it was forked.
fn run_task(
    task: &mut Task,
    builtins: &Builtins,
    wiring: Wiring,
    pipes: &mut Vec<Pipe>,
) -> Result<Option<Status>> {
    let program = match task.program() {
        Some(program) => program,
        None => {
            eprintln!("koish: empty command");
            task.set_status(ExitStatus::from_failure());
            return Ok(Some(Status::failure()));
        }
    };

    if builtins.is_builtin(program) {
        let status = run_builtin_command(task, builtins, wiring).unwrap_or_else(|e| {
            eprintln!("koish: {}", e);
            Status::failure()
        });
        task.set_status(status.exit_status());
        return Ok(Some(status));
    }

    run_external_command(task, wiring, pipes)?;
    Ok(None)
}

fn run_builtin_command(task: &Task, builtins: &Builtins, wiring: Wiring) -> Result<Status> {
    let _guard = StdioGuard::redirect(wiring)?;
    let status = builtins
        .run(task.argv(), &mut io::stdout())
        .unwrap_or_else(Status::failure);
    Ok(status)
}

fn run_external_command(task: &mut Task, wiring: Wiring, pipes: &mut Vec<Pipe>) -> Result<()> {
    let argv = match c_argv(task.argv()) {
        Ok(argv) => argv,
        Err(e) => {
            eprintln!("koish: {}", e);
            task.set_status(ExitStatus::from_failure());
            return Ok(());
        }
    };
    let not_found = format!(
        "koish: '{}' is not a valid command!\n",
        task.program().unwrap_or_default()
    );

    // Output still buffered in the shell would otherwise be written twice.
    let temp_result = io::stdout().flush();
    log_if_err!(temp_result, "failed to flush stdout before fork");

    // Safe because the shell is single-threaded and the child only
    // rewires descriptors before replacing its image.
    match unsafe { unistd::fork() } {
        Ok(ForkResult::Parent { child }) => {
            debug!("launched '{}' as {}", task, child);
            task.set_pid(child);
            Ok(())
        }
        Ok(ForkResult::Child) => exec_child(&argv, wiring, pipes, &not_found),
        Err(errno) => {
            error!("failed to fork '{}': {}", task, errno);
            Err(ErrorKind::Fork(errno).into())
        }
    }
}

/// Signals the Rust runtime ignores in the shell. Ignored dispositions
/// survive exec, so children get the defaults back.
const CHILD_DEFAULT_SIGNALS: &[Signal] = &[Signal::SIGPIPE];

/// Runs in the forked child: restores default signal handling, binds the
/// effective streams, closes every pipe descriptor and replaces the process
/// image.
fn exec_child(argv: &[CString], wiring: Wiring, pipes: &mut Vec<Pipe>, not_found: &str) -> ! {
    for &sig in CHILD_DEFAULT_SIGNALS {
        // Safe because SIG_DFL installs no handler code in this process.
        if let Err(errno) = unsafe { signal::signal(sig, SigHandler::SigDfl) } {
            report(&format!("koish: signal: {}\n", errno));
            child_exit(COMMAND_NOT_EXECUTABLE_EXIT_STATUS);
        }
    }

    for (source, target) in wiring.redirections() {
        if let Err(errno) = unistd::dup2(source, target) {
            report(&format!("koish: dup2: {}\n", errno));
            child_exit(COMMAND_NOT_EXECUTABLE_EXIT_STATUS);
        }
    }
    pipes.clear();

    let errno = match unistd::execvp(&argv[0], argv) {
        Ok(never) => match never {},
        Err(errno) => errno,
    };

    if errno == Errno::ENOENT {
        report(not_found);
        child_exit(COMMAND_NOT_FOUND_EXIT_STATUS);
    }

    report(&format!("koish: {}: {}\n", argv[0].to_string_lossy(), errno));
    child_exit(COMMAND_NOT_EXECUTABLE_EXIT_STATUS)
}

/// Ends the forked child without running the shell's exit handlers or
/// flushing buffers it inherited.
fn child_exit(code: i32) -> ! {
    // Safe because the child owns nothing that needs unwinding before exit.
    unsafe { libc::_exit(code) }
}

fn report(message: &str) {
    let _ = io::stderr().write_all(message.as_bytes());
}

fn c_argv(argv: &[String]) -> Result<Vec<CString>> {
    argv.iter()
        .map(|arg| {
            CString::new(arg.as_bytes())
                .map_err(|_| Error::from(ErrorKind::InvalidArgument(arg.clone())))
        })
        .collect()
}

/// Allocates `count` pipes. On failure the pipes created so far are closed.
fn create_pipes(count: usize) -> Result<Vec<Pipe>> {
    (0..count)
        .map(|_| {
            let (read, write) = unistd::pipe().map_err(|errno| Error::from(ErrorKind::Pipe(errno)))?;
            Ok(Pipe {
                read: Some(read),
                write: Some(write),
            })
        })
        .collect()
}

fn wiring(pipes: &[Pipe], index: usize) -> Wiring {
    let stdin = index
        .checked_sub(1)
        .and_then(|i| pipes.get(i))
        .and_then(|p| p.read.as_ref())
        .map(AsRawFd::as_raw_fd);
    let stdout = pipes
        .get(index)
        .and_then(|p| p.write.as_ref())
        .map(AsRawFd::as_raw_fd);
    Wiring { stdin, stdout }
}

/// Closes the shell's copies of the pipe ends task `index` was given.
fn close_used_ends(pipes: &mut [Pipe], index: usize) {
    if let Some(pipe) = index.checked_sub(1).and_then(|i| pipes.get_mut(i)) {
        pipe.read.take();
    }
    if let Some(pipe) = pipes.get_mut(index) {
        pipe.write.take();
    }
}

fn wait_for_tasks(job: &mut Job) {
    for task in job.tasks_mut() {
        if let Some(pid) = task.pid() {
            match wait_for_process(pid) {
                Ok(status) => {
                    debug!("{} exited with {}", pid, status);
                    task.set_status(status);
                }
                Err(e) => {
                    warn!("failed to wait for {}: {}", pid, e);
                    task.set_status(ExitStatus::from_failure());
                }
            }
        }
    }
}

fn wait_for_process(pid: Pid) -> Result<ExitStatus> {
    loop {
        match wait::waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, code)) => return Ok(ExitStatus::from_status(code)),
            Ok(WaitStatus::Signaled(_, signal, _)) => {
                return Ok(ExitStatus::from_status(128 + signal as i32))
            }
            Ok(_) | Err(Errno::EINTR) => continue,
            Err(errno) => return Err(errno.into()),
        }
    }
}

/// RAII struct that binds the shell's stdin/stdout to a builtin's effective
/// streams and restores the previous bindings when dropped.
struct StdioGuard {
    /// (target, saved duplicate of the target's previous binding)
    saved: Vec<(RawFd, OwnedFd)>,
}

impl StdioGuard {
    fn redirect(wiring: Wiring) -> Result<StdioGuard> {
        let temp_result = io::stdout().flush();
        log_if_err!(temp_result, "failed to flush stdout before redirecting");

        let mut guard = StdioGuard { saved: Vec::new() };
        for (source, target) in wiring.redirections() {
            guard.replace(source, target)?;
        }
        Ok(guard)
    }

    fn replace(&mut self, source: RawFd, target: RawFd) -> Result<()> {
        debug!("redirecting fd {} to fd {}", target, source);
        let saved = unistd::dup(target)?;
        // `saved` is a fresh descriptor owned by nobody else.
        let saved = unsafe { OwnedFd::from_raw_fd(saved) };
        unistd::dup2(source, target)?;
        self.saved.push((target, saved));
        Ok(())
    }
}

impl Drop for StdioGuard {
    fn drop(&mut self) {
        let temp_result = io::stdout().flush();
        log_if_err!(temp_result, "failed to flush builtin output");

        for (target, saved) in self.saved.drain(..).rev() {
            let temp_result = unistd::dup2(saved.as_raw_fd(), target);
            log_if_err!(temp_result, "failed to restore fd {}", target);
        }
    }
}
