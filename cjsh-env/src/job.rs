// This file is part of cjsh, a POSIX-compatible interactive shell.
// Copyright (C) 2025 Caden Finley
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Job management
//!
//! Every pipeline the shell forks becomes a [`Job`] in the [`JobList`].
//! Jobs are stored in a slab, so a job index is reused only after the
//! job has been removed. A job stays in the table until its final state
//! has been both reached and reported to the user.

pub mod fmt;
pub mod id;

pub use self::id::{JobId, JobIdError};

use crate::semantics::ExitStatus;
use nix::sys::signal::Signal;
use slab::Slab;

#[doc(no_inline)]
pub use nix::unistd::Pid;

/// State of one process of a job
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProcessState {
    /// Running or not yet reported
    Running,
    /// Stopped by the given signal
    Stopped(Signal),
    /// Exited normally
    Exited(ExitStatus),
    /// Terminated by a signal
    Signaled {
        signal: Signal,
        core_dumped: bool,
    },
}

impl ProcessState {
    /// Whether the process may still change state.
    #[must_use]
    pub fn is_alive(self) -> bool {
        matches!(self, ProcessState::Running | ProcessState::Stopped(_))
    }

    /// Exit status summarizing this state.
    #[must_use]
    pub fn exit_status(self) -> ExitStatus {
        match self {
            ProcessState::Running => ExitStatus::SUCCESS,
            ProcessState::Stopped(signal) | ProcessState::Signaled { signal, .. } => {
                ExitStatus::from_signal(signal)
            }
            ProcessState::Exited(status) => status,
        }
    }
}

/// One process of a job
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Process {
    pub pid: Pid,
    pub state: ProcessState,
}

/// Aggregate state of a job
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JobState {
    Running,
    Stopped,
    /// All processes exited; the status is the last process's
    Done(ExitStatus),
    /// The last process was killed by a signal
    Terminated(Signal),
}

/// Record of one pipeline
#[derive(Clone, Debug)]
pub struct Job {
    /// Process group; equals the pid of the first process and never
    /// changes
    pub pgid: Pid,
    /// Member processes in pipeline order
    pub processes: Vec<Process>,
    /// Source text of the pipeline, shown by `jobs`
    pub name: String,
    /// Whether the job runs in the background
    pub is_background: bool,
    /// Whether the current state has been reported to the user
    pub notified: bool,
    /// Whether the job was started reading stdin from the terminal
    pub reads_stdin_from_tty: bool,
}

impl Job {
    /// Creates a running job for the given process group.
    #[must_use]
    pub fn new(pgid: Pid, name: String) -> Job {
        Job {
            pgid,
            processes: Vec::new(),
            name,
            is_background: false,
            notified: false,
            reads_stdin_from_tty: false,
        }
    }

    /// Adds a member process in pipeline order.
    pub fn push_process(&mut self, pid: Pid) {
        self.processes.push(Process {
            pid,
            state: ProcessState::Running,
        });
    }

    /// Aggregate state of the job.
    ///
    /// A job is stopped if any live process is stopped, running if any
    /// process is running, and finished once every process has been
    /// reaped; the final status is the last process's.
    #[must_use]
    pub fn state(&self) -> JobState {
        if self
            .processes
            .iter()
            .any(|p| matches!(p.state, ProcessState::Stopped(_)))
        {
            return JobState::Stopped;
        }
        if self
            .processes
            .iter()
            .any(|p| p.state == ProcessState::Running)
        {
            return JobState::Running;
        }
        match self.processes.last().map(|p| p.state) {
            Some(ProcessState::Signaled { signal, .. }) => JobState::Terminated(signal),
            Some(ProcessState::Exited(status)) => JobState::Done(status),
            _ => JobState::Done(ExitStatus::SUCCESS),
        }
    }

    /// Whether the job has reached a final state.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self.state(), JobState::Done(_) | JobState::Terminated(_))
    }

    /// Exit status of the job per the default policy (last command).
    #[must_use]
    pub fn exit_status(&self) -> ExitStatus {
        self.processes
            .last()
            .map_or(ExitStatus::SUCCESS, |p| p.state.exit_status())
    }
}

/// The job table
#[derive(Clone, Debug)]
pub struct JobList {
    jobs: Slab<Job>,
    /// Index of the current job (`%+`)
    current: Option<usize>,
    /// Index of the previous job (`%-`)
    previous: Option<usize>,
    /// Pid of the most recent asynchronous command (`$!`)
    last_async_pid: Pid,
}

impl Default for JobList {
    fn default() -> JobList {
        JobList {
            jobs: Slab::new(),
            current: None,
            previous: None,
            last_async_pid: Pid::from_raw(0),
        }
    }
}

impl JobList {
    /// Adds a job, making it the current job.
    ///
    /// Returns the job's index, which is stable until removal.
    pub fn add(&mut self, job: Job) -> usize {
        let index = self.jobs.insert(job);
        if self.current != Some(index) {
            self.previous = self.current;
            self.current = Some(index);
        }
        index
    }

    /// Removes a job.
    pub fn remove(&mut self, index: usize) -> Option<Job> {
        let job = self.jobs.try_remove(index);
        if job.is_some() {
            if self.current == Some(index) {
                self.current = self.previous.take();
            } else if self.previous == Some(index) {
                self.previous = None;
            }
            if self.previous.is_none() {
                let current = self.current;
                let previous = self.iter().map(|(i, _)| i).find(|&i| Some(i) != current);
                self.previous = previous;
            }
        }
        job
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Job> {
        self.jobs.get(index)
    }

    #[must_use]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Job> {
        self.jobs.get_mut(index)
    }

    /// Number of jobs in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Iterates over jobs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Job)> {
        self.jobs.iter()
    }

    /// Index of the current job (`%+`).
    #[must_use]
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// Index of the previous job (`%-`).
    #[must_use]
    pub fn previous(&self) -> Option<usize> {
        self.previous
    }

    /// Finds the job containing the given process.
    #[must_use]
    pub fn find_by_pid(&self, pid: Pid) -> Option<usize> {
        self.jobs
            .iter()
            .find(|(_, job)| job.processes.iter().any(|p| p.pid == pid))
            .map(|(index, _)| index)
    }

    /// Finds the job with the given process group.
    #[must_use]
    pub fn find_by_pgid(&self, pgid: Pid) -> Option<usize> {
        self.jobs
            .iter()
            .find(|(_, job)| job.pgid == pgid)
            .map(|(index, _)| index)
    }

    /// Records a state change reported by `waitpid`.
    ///
    /// Returns the index of the affected job, if the pid belongs to one.
    /// A state change resets the job's notified flag; a stopped job
    /// becomes the current job.
    pub fn update_process(&mut self, pid: Pid, state: ProcessState) -> Option<usize> {
        let index = self.find_by_pid(pid)?;
        let job = &mut self.jobs[index];
        let process = job.processes.iter_mut().find(|p| p.pid == pid).unwrap();
        if process.state != state {
            process.state = state;
            job.notified = false;
        }
        if matches!(state, ProcessState::Stopped(_)) && self.current != Some(index) {
            self.previous = self.current;
            self.current = Some(index);
        }
        Some(index)
    }

    /// Pid of the most recent asynchronous command (`$!`).
    #[must_use]
    pub fn last_async_pid(&self) -> Pid {
        self.last_async_pid
    }

    /// Sets the pid reported by `$!`.
    pub fn set_last_async_pid(&mut self, pid: Pid) {
        self.last_async_pid = pid;
    }

    /// Removes finished jobs that have been reported, returning them.
    pub fn remove_finished_notified(&mut self) -> Vec<(usize, Job)> {
        let indices: Vec<usize> = self
            .jobs
            .iter()
            .filter(|(_, job)| job.is_finished() && job.notified)
            .map(|(index, _)| index)
            .collect();
        indices
            .into_iter()
            .filter_map(|index| self.remove(index).map(|job| (index, job)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(pid: i32) -> Job {
        let mut job = Job::new(Pid::from_raw(pid), format!("cmd{pid}"));
        job.push_process(Pid::from_raw(pid));
        job
    }

    #[test]
    fn pgid_is_first_process_pid() {
        let mut j = Job::new(Pid::from_raw(10), "p".to_string());
        j.push_process(Pid::from_raw(10));
        j.push_process(Pid::from_raw(11));
        assert_eq!(j.pgid, j.processes[0].pid);
    }

    #[test]
    fn aggregate_state() {
        let mut j = Job::new(Pid::from_raw(1), "p".to_string());
        j.push_process(Pid::from_raw(1));
        j.push_process(Pid::from_raw(2));
        assert_eq!(j.state(), JobState::Running);

        j.processes[0].state = ProcessState::Exited(ExitStatus(0));
        assert_eq!(j.state(), JobState::Running);

        j.processes[1].state = ProcessState::Stopped(Signal::SIGTSTP);
        assert_eq!(j.state(), JobState::Stopped);

        j.processes[1].state = ProcessState::Exited(ExitStatus(3));
        assert_eq!(j.state(), JobState::Done(ExitStatus(3)));
        assert_eq!(j.exit_status(), ExitStatus(3));

        j.processes[1].state = ProcessState::Signaled {
            signal: Signal::SIGKILL,
            core_dumped: false,
        };
        assert_eq!(j.state(), JobState::Terminated(Signal::SIGKILL));
    }

    #[test]
    fn indices_are_reused_only_after_removal() {
        let mut list = JobList::default();
        let a = list.add(job(1));
        let b = list.add(job(2));
        assert_ne!(a, b);
        list.remove(a);
        let c = list.add(job(3));
        assert_eq!(c, a);
    }

    #[test]
    fn current_and_previous_tracking() {
        let mut list = JobList::default();
        let a = list.add(job(1));
        assert_eq!(list.current(), Some(a));
        assert_eq!(list.previous(), None);
        let b = list.add(job(2));
        assert_eq!(list.current(), Some(b));
        assert_eq!(list.previous(), Some(a));
        list.remove(b);
        assert_eq!(list.current(), Some(a));
    }

    #[test]
    fn update_process_marks_unnotified() {
        let mut list = JobList::default();
        let index = list.add(job(7));
        list.get_mut(index).unwrap().notified = true;
        let updated = list.update_process(Pid::from_raw(7), ProcessState::Exited(ExitStatus(0)));
        assert_eq!(updated, Some(index));
        let job = list.get(index).unwrap();
        assert!(!job.notified);
        assert!(job.is_finished());
    }

    #[test]
    fn stopped_job_becomes_current() {
        let mut list = JobList::default();
        let a = list.add(job(1));
        let _b = list.add(job(2));
        list.update_process(Pid::from_raw(1), ProcessState::Stopped(Signal::SIGTSTP));
        assert_eq!(list.current(), Some(a));
    }

    #[test]
    fn remove_finished_notified_sweeps() {
        let mut list = JobList::default();
        let a = list.add(job(1));
        let b = list.add(job(2));
        list.update_process(Pid::from_raw(1), ProcessState::Exited(ExitStatus(0)));
        list.get_mut(a).unwrap().notified = true;
        let removed = list.remove_finished_notified();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].0, a);
        assert!(list.get(b).is_some());
    }

    #[test]
    fn last_async_pid_round_trip() {
        let mut list = JobList::default();
        assert_eq!(list.last_async_pid(), Pid::from_raw(0));
        list.set_last_async_pid(Pid::from_raw(42));
        assert_eq!(list.last_async_pid(), Pid::from_raw(42));
    }
}
