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

//! `%`-prefixed job IDs
//!
//! `fg`, `bg`, `wait`, and `kill` accept job IDs: `%n` by number, `%%`
//! or `%+` for the current job, `%-` for the previous one, `%prefix`
//! by command prefix, and `%?substring` by command substring.

use super::JobList;
use thiserror::Error;

/// Parsed job ID
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum JobId {
    /// `%n` (1-based)
    Number(usize),
    /// `%%` or `%+`
    Current,
    /// `%-`
    Previous,
    /// `%prefix`
    CommandPrefix(String),
    /// `%?substring`
    CommandSubstring(String),
}

/// Job ID resolution failure
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum JobIdError {
    /// The string does not start with `%` or has an empty body.
    #[error("{0}: not a job ID")]
    NotAJobId(String),
    /// No job matches the ID.
    #[error("{0}: no such job")]
    NoSuchJob(String),
    /// A prefix or substring matches more than one job.
    #[error("{0}: ambiguous job specification")]
    Ambiguous(String),
}

impl JobId {
    /// Parses a `%…` job ID.
    pub fn parse(spec: &str) -> Result<JobId, JobIdError> {
        let Some(body) = spec.strip_prefix('%') else {
            return Err(JobIdError::NotAJobId(spec.to_string()));
        };
        match body {
            "" | "%" | "+" => Ok(JobId::Current),
            "-" => Ok(JobId::Previous),
            _ => {
                if let Ok(number) = body.parse::<usize>() {
                    Ok(JobId::Number(number))
                } else if let Some(substring) = body.strip_prefix('?') {
                    Ok(JobId::CommandSubstring(substring.to_string()))
                } else {
                    Ok(JobId::CommandPrefix(body.to_string()))
                }
            }
        }
    }

    /// Resolves this ID to a job index in the given table.
    pub fn resolve(&self, jobs: &JobList) -> Result<usize, JobIdError> {
        let missing = || JobIdError::NoSuchJob(self.to_string());
        match self {
            JobId::Current => jobs.current().ok_or_else(missing),
            JobId::Previous => jobs.previous().ok_or_else(missing),
            JobId::Number(number) => {
                let index = number.checked_sub(1).ok_or_else(missing)?;
                jobs.get(index).map(|_| index).ok_or_else(missing)
            }
            JobId::CommandPrefix(prefix) => {
                self.resolve_by(jobs, |name| name.starts_with(prefix.as_str()))
            }
            JobId::CommandSubstring(substring) => {
                self.resolve_by(jobs, |name| name.contains(substring.as_str()))
            }
        }
    }

    fn resolve_by<F>(&self, jobs: &JobList, matches: F) -> Result<usize, JobIdError>
    where
        F: Fn(&str) -> bool,
    {
        let mut found = None;
        for (index, job) in jobs.iter() {
            if matches(&job.name) {
                if found.is_some() {
                    return Err(JobIdError::Ambiguous(self.to_string()));
                }
                found = Some(index);
            }
        }
        found.ok_or_else(|| JobIdError::NoSuchJob(self.to_string()))
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobId::Number(number) => write!(f, "%{number}"),
            JobId::Current => f.write_str("%+"),
            JobId::Previous => f.write_str("%-"),
            JobId::CommandPrefix(prefix) => write!(f, "%{prefix}"),
            JobId::CommandSubstring(substring) => write!(f, "%?{substring}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Job, Pid};
    use super::*;

    fn named_job(pid: i32, name: &str) -> Job {
        let mut job = Job::new(Pid::from_raw(pid), name.to_string());
        job.push_process(Pid::from_raw(pid));
        job
    }

    #[test]
    fn parse_forms() {
        assert_eq!(JobId::parse("%%"), Ok(JobId::Current));
        assert_eq!(JobId::parse("%+"), Ok(JobId::Current));
        assert_eq!(JobId::parse("%"), Ok(JobId::Current));
        assert_eq!(JobId::parse("%-"), Ok(JobId::Previous));
        assert_eq!(JobId::parse("%3"), Ok(JobId::Number(3)));
        assert_eq!(
            JobId::parse("%sleep"),
            Ok(JobId::CommandPrefix("sleep".to_string()))
        );
        assert_eq!(
            JobId::parse("%?slee"),
            Ok(JobId::CommandSubstring("slee".to_string()))
        );
        assert_eq!(
            JobId::parse("42"),
            Err(JobIdError::NotAJobId("42".to_string()))
        );
    }

    #[test]
    fn resolve_number_and_markers() {
        let mut jobs = JobList::default();
        let a = jobs.add(named_job(1, "sleep 10"));
        let b = jobs.add(named_job(2, "make all"));
        assert_eq!(JobId::Number(a + 1).resolve(&jobs), Ok(a));
        assert_eq!(JobId::Current.resolve(&jobs), Ok(b));
        assert_eq!(JobId::Previous.resolve(&jobs), Ok(a));
        assert_eq!(
            JobId::Number(9).resolve(&jobs),
            Err(JobIdError::NoSuchJob("%9".to_string()))
        );
    }

    #[test]
    fn resolve_by_name() {
        let mut jobs = JobList::default();
        let a = jobs.add(named_job(1, "sleep 10"));
        let _b = jobs.add(named_job(2, "make all"));
        assert_eq!(JobId::parse("%sleep").unwrap().resolve(&jobs), Ok(a));
        assert_eq!(JobId::parse("%?lee").unwrap().resolve(&jobs), Ok(a));
        assert_eq!(
            JobId::parse("%missing").unwrap().resolve(&jobs),
            Err(JobIdError::NoSuchJob("%missing".to_string()))
        );
    }

    #[test]
    fn ambiguous_prefix() {
        let mut jobs = JobList::default();
        jobs.add(named_job(1, "sleep 10"));
        jobs.add(named_job(2, "sleep 20"));
        assert_eq!(
            JobId::parse("%sleep").unwrap().resolve(&jobs),
            Err(JobIdError::Ambiguous("%sleep".to_string()))
        );
    }
}
