//! Koish Tokenizer
//!
//! Splits a raw line into argument tokens and partitions them into jobs and
//! tasks. A standalone `;` closes the current job, a standalone `|` closes the
//! current task. Nothing is quoted, escaped or expanded.

use crate::job::{Job, Task};

/// Characters that separate tokens.
const DELIMS: &[char] = &[' ', '\t', '\n', '\r'];

const JOB_SEPARATOR: &str = ";";
const TASK_SEPARATOR: &str = "|";

/// Tokenize `line` into jobs.
///
/// The result always holds at least one job and every job at least one task.
/// A task may have no arguments (e.g. an empty line); the executor reports
/// those instead of running them.
pub fn tokenize(line: &str) -> Vec<Job> {
    let mut jobs = Vec::new();
    let mut job = Job::new();
    let mut task = Task::new();

    for token in line.split(DELIMS).filter(|t| !t.is_empty()) {
        match token {
            JOB_SEPARATOR => {
                job.push_task(task);
                jobs.push(job);
                job = Job::new();
                task = Task::new();
            }
            TASK_SEPARATOR => {
                job.push_task(task);
                task = Task::new();
            }
            arg => task.push_arg(arg),
        }
    }

    job.push_task(task);
    jobs.push(job);
    jobs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argvs(job: &Job) -> Vec<Vec<&str>> {
        job.tasks()
            .iter()
            .map(|t| t.argv().iter().map(String::as_str).collect())
            .collect()
    }

    #[test]
    fn test_simple_command() {
        let jobs = tokenize("ls -la  /tmp");
        assert_eq!(jobs.len(), 1);
        assert_eq!(argvs(&jobs[0]), vec![vec!["ls", "-la", "/tmp"]]);
    }

    #[test]
    fn test_all_delimiters_split() {
        let jobs = tokenize("echo\ta\r\nb c\n");
        assert_eq!(argvs(&jobs[0]), vec![vec!["echo", "a", "b", "c"]]);
    }

    #[test]
    fn test_pipeline() {
        let jobs = tokenize("a | b | c");
        assert_eq!(jobs.len(), 1);
        assert_eq!(argvs(&jobs[0]), vec![vec!["a"], vec!["b"], vec!["c"]]);
    }

    #[test]
    fn test_job_sequence() {
        let jobs = tokenize("a ; b");
        assert_eq!(jobs.len(), 2);
        assert_eq!(argvs(&jobs[0]), vec![vec!["a"]]);
        assert_eq!(argvs(&jobs[1]), vec![vec!["b"]]);
    }

    #[test]
    fn test_mixed_jobs_and_pipelines() {
        let jobs = tokenize("printf x | wc -l ; false ; echo ok | cat");
        assert_eq!(jobs.len(), 3);
        assert_eq!(argvs(&jobs[0]), vec![vec!["printf", "x"], vec!["wc", "-l"]]);
        assert_eq!(argvs(&jobs[1]), vec![vec!["false"]]);
        assert_eq!(argvs(&jobs[2]), vec![vec!["echo", "ok"], vec!["cat"]]);
    }

    #[test]
    fn test_empty_line_has_one_empty_task() {
        for line in &["", "   ", "\t\r\n"] {
            let jobs = tokenize(line);
            assert_eq!(jobs.len(), 1);
            assert_eq!(jobs[0].len(), 1);
            assert!(jobs[0].tasks()[0].is_empty());
        }
    }

    #[test]
    fn test_separators_produce_empty_tasks() {
        let jobs = tokenize("| echo hi ;");
        assert_eq!(jobs.len(), 2);
        assert_eq!(argvs(&jobs[0]), vec![vec![], vec!["echo", "hi"]]);
        assert_eq!(argvs(&jobs[1]), vec![Vec::<&str>::new()]);
    }

    #[test]
    fn test_separators_must_stand_alone() {
        let jobs = tokenize("echo a;b c|d");
        assert_eq!(jobs.len(), 1);
        assert_eq!(argvs(&jobs[0]), vec![vec!["echo", "a;b", "c|d"]]);
    }

    #[test]
    fn test_no_separators_equals_whitespace_split() {
        let line = "grep -n needle haystack.txt";
        let jobs = tokenize(line);
        let expected: Vec<&str> = line.split_whitespace().collect();
        assert_eq!(argvs(&jobs[0]), vec![expected]);
    }
}
