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

//! Formatting of `jobs` output lines

use super::{Job, JobList, JobState};
use std::fmt::Write as _;

impl JobState {
    /// State column of a `jobs` line.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            JobState::Running => "Running".to_string(),
            JobState::Stopped => "Stopped".to_string(),
            JobState::Done(status) if status.is_successful() => "Done".to_string(),
            JobState::Done(status) => format!("Done({status})"),
            JobState::Terminated(signal) => format!("Killed({})", &signal.as_str()[3..]),
        }
    }
}

/// Formats one `jobs` line: `[index+1] marker state command`.
#[must_use]
pub fn format_job(index: usize, job: &Job, jobs: &JobList) -> String {
    let marker = if jobs.current() == Some(index) {
        '+'
    } else if jobs.previous() == Some(index) {
        '-'
    } else {
        ' '
    };
    let mut line = String::new();
    write!(
        line,
        "[{}] {} {:<10} {}",
        index + 1,
        marker,
        job.state().describe(),
        job.name,
    )
    .unwrap();
    if job.is_background && job.state() == JobState::Running {
        line.push_str(" &");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::super::{Pid, ProcessState};
    use super::*;
    use crate::semantics::ExitStatus;
    use nix::sys::signal::Signal;

    fn sample_list() -> (JobList, usize, usize) {
        let mut jobs = JobList::default();
        let mut a = Job::new(Pid::from_raw(1), "sleep 10".to_string());
        a.push_process(Pid::from_raw(1));
        a.is_background = true;
        let a = jobs.add(a);
        let mut b = Job::new(Pid::from_raw(2), "vi notes".to_string());
        b.push_process(Pid::from_raw(2));
        let b = jobs.add(b);
        (jobs, a, b)
    }

    #[test]
    fn running_background_job_line() {
        let (jobs, a, _) = sample_list();
        let line = format_job(a, jobs.get(a).unwrap(), &jobs);
        assert_eq!(line, "[1] - Running    sleep 10 &");
    }

    #[test]
    fn current_marker_goes_to_latest_job() {
        let (jobs, _, b) = sample_list();
        let line = format_job(b, jobs.get(b).unwrap(), &jobs);
        assert!(line.starts_with("[2] +"), "{line}");
    }

    #[test]
    fn state_descriptions() {
        assert_eq!(JobState::Running.describe(), "Running");
        assert_eq!(JobState::Stopped.describe(), "Stopped");
        assert_eq!(JobState::Done(ExitStatus(0)).describe(), "Done");
        assert_eq!(JobState::Done(ExitStatus(2)).describe(), "Done(2)");
        assert_eq!(
            JobState::Terminated(Signal::SIGKILL).describe(),
            "Killed(KILL)"
        );
    }

    #[test]
    fn finished_job_has_no_ampersand() {
        let (mut jobs, a, _) = sample_list();
        jobs.update_process(Pid::from_raw(1), ProcessState::Exited(ExitStatus(0)));
        let line = format_job(a, jobs.get(a).unwrap(), &jobs);
        assert!(!line.ends_with('&'), "{line}");
    }
}
