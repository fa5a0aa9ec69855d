//! Job/Process Model
//!
//! A command line is an ordered sequence of [`Job`]s (split on `;`), each an
//! ordered sequence of [`Task`]s (split on `|`). The model is built fresh for
//! every input line and dropped once that line has been executed.

use std::fmt;
use std::process::ExitStatus;

use nix::unistd::Pid;

use crate::util::{self, KoishExitStatusExt};

/// Outcome of running a task or a job.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// Keep reading input. Carries the exit status of the task that produced it.
    Continue(ExitStatus),
    /// A builtin asked the shell to terminate with the given exit status.
    Terminate(ExitStatus),
}

impl Status {
    pub fn success() -> Self {
        Status::Continue(ExitStatus::from_success())
    }

    pub fn failure() -> Self {
        Status::Continue(ExitStatus::from_failure())
    }

    pub fn is_terminal(&self) -> bool {
        matches!(*self, Status::Terminate(_))
    }

    pub fn exit_status(&self) -> ExitStatus {
        match *self {
            Status::Continue(status) | Status::Terminate(status) => status,
        }
    }

    pub fn code(&self) -> i32 {
        util::exit_code(self.exit_status())
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::success()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Status::Continue(_) => write!(f, "continue ({})", self.code()),
            Status::Terminate(_) => write!(f, "terminate ({})", self.code()),
        }
    }
}

/// A single command within a pipeline.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Task {
    argv: Vec<String>,
    /// `pid` is None until the task is forked; builtins never get one.
    pid: Option<Pid>,
    status: Option<ExitStatus>,
}

impl Task {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_argv<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn push_arg<S: Into<String>>(&mut self, arg: S) {
        self.argv.push(arg.into());
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// The command name, if the task has any arguments at all.
    pub fn program(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.argv.is_empty()
    }

    pub fn pid(&self) -> Option<Pid> {
        self.pid
    }

    pub fn set_pid(&mut self, pid: Pid) {
        self.pid = Some(pid);
    }

    pub fn status(&self) -> Option<ExitStatus> {
        self.status
    }

    pub fn set_status(&mut self, status: ExitStatus) {
        self.status = Some(status);
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv.join(" "))
    }
}

/// A pipeline of tasks; task `i` writes into task `i + 1`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Job {
    tasks: Vec<Task>,
    last_status: Option<Status>,
}

impl Job {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn push_task(&mut self, task: Task) {
        self.tasks.push(task);
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn tasks_mut(&mut self) -> &mut [Task] {
        &mut self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn last_status(&self) -> Option<Status> {
        self.last_status
    }

    pub fn set_last_status(&mut self, status: Status) {
        self.last_status = Some(status);
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tasks: Vec<String> = self.tasks.iter().map(ToString::to_string).collect();
        write!(f, "{}", tasks.join(" | "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_program_is_first_argument() {
        let task = Task::with_argv(vec!["ls", "-la"]);
        assert_eq!(task.program(), Some("ls"));
        assert_eq!(task.argv(), &["ls".to_string(), "-la".to_string()]);
        assert!(Task::new().program().is_none());
    }

    #[test]
    fn task_starts_without_pid_or_status() {
        let mut task = Task::with_argv(vec!["true"]);
        assert!(task.pid().is_none());
        assert!(task.status().is_none());
        task.set_pid(Pid::from_raw(42));
        task.set_status(ExitStatus::from_status(3));
        assert_eq!(task.pid(), Some(Pid::from_raw(42)));
        assert_eq!(task.status().and_then(|s| s.code()), Some(3));
    }

    #[test]
    fn job_display_joins_tasks_with_pipes() {
        let mut job = Job::new();
        job.push_task(Task::with_argv(vec!["cat", "foo"]));
        job.push_task(Task::with_argv(vec!["wc", "-l"]));
        assert_eq!(job.to_string(), "cat foo | wc -l");
        assert_eq!(job.len(), 2);
    }

    #[test]
    fn status_terminal_and_codes() {
        assert!(!Status::success().is_terminal());
        assert_eq!(Status::failure().code(), 1);
        let exit = Status::Terminate(ExitStatus::from_status(7));
        assert!(exit.is_terminal());
        assert_eq!(exit.code(), 7);
        assert_eq!(exit.to_string(), "terminate (7)");
    }
}
