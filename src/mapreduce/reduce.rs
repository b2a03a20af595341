use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, error, info};

use crate::mapreduce::codec::RecordReader;
use crate::mapreduce::error::{ReduceError, ReductionError, Result};
use crate::mapreduce::output::PendingOutput;
use crate::mapreduce::util::{reduce_name, KeyValue};

/// Phases of one reduce task execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    OpeningInputs,
    Reading,
    Grouping,
    Sorting,
    ReducingAndWriting,
    Done,
    Fatal,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskState::OpeningInputs => "OPENING_INPUTS",
            TaskState::Reading => "READING",
            TaskState::Grouping => "GROUPING",
            TaskState::Sorting => "SORTING",
            TaskState::ReducingAndWriting => "REDUCING_AND_WRITING",
            TaskState::Done => "DONE",
            TaskState::Fatal => "FATAL",
        };
        f.write_str(name)
    }
}

/// Application reduce function, called once per distinct key with every
/// value for that key.
pub trait Reducer: Sync {
    fn reduce(&self, key: &str, values: Vec<&str>) -> std::result::Result<String, ReductionError>;
}

impl<F> Reducer for F
where
    F: Fn(&str, Vec<&str>) -> String + Sync,
{
    fn reduce(&self, key: &str, values: Vec<&str>) -> std::result::Result<String, ReductionError> {
        Ok(self(key, values))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReduceSummary {
    pub shards: usize,
    pub records: usize,
    pub keys: usize,
    pub out_file: PathBuf,
}

/// Values for each key, in shard order and then arrival order within a shard.
///
/// The whole partition is held in memory, so the size of one reduce task is
/// bounded by available memory.
type Groups = HashMap<String, Vec<String>>;

/// One reduce task: reads `n_map` shards, groups by key, and writes one
/// reduced record per key in ascending key order.
#[derive(Debug, Clone)]
pub struct ReduceTask {
    job_name: String,
    reduce_task: usize,
    n_map: usize,
    out_file: PathBuf,
    shard_dir: PathBuf,
    parallel: bool,
}

impl ReduceTask {
    pub fn new(
        job_name: impl Into<String>,
        reduce_task: usize,
        n_map: usize,
        out_file: impl Into<PathBuf>,
    ) -> Self {
        ReduceTask {
            job_name: job_name.into(),
            reduce_task,
            n_map,
            out_file: out_file.into(),
            shard_dir: PathBuf::new(),
            parallel: false,
        }
    }

    /// Directory the shards live in. Defaults to the working directory.
    pub fn shard_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.shard_dir = dir.into();
        self
    }

    /// Reduce keys on the rayon pool. Output is identical either way.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn shard_path(&self, map_task: usize) -> PathBuf {
        self.shard_dir
            .join(reduce_name(&self.job_name, map_task, self.reduce_task))
    }

    /// Runs the task to completion. On error nothing is left at the output
    /// path that wasn't there before.
    pub fn run<R: Reducer + ?Sized>(&self, reducer: &R) -> Result<ReduceSummary> {
        self.execute(reducer).map_err(|e| {
            error!(
                job = %self.job_name,
                reduce_task = self.reduce_task,
                failed_in = %e.state(),
                error = %e,
                "reduce task entered {}", TaskState::Fatal
            );
            e
        })
    }

    fn execute<R: Reducer + ?Sized>(&self, reducer: &R) -> Result<ReduceSummary> {
        self.enter(TaskState::OpeningInputs);
        let shards = self.check_shards()?;

        self.enter(TaskState::Reading);
        let (groups, records) = self.read_groups(&shards)?;

        self.enter(TaskState::Sorting);
        let keys = sorted_keys(&groups);

        self.enter(TaskState::ReducingAndWriting);
        let written = if self.parallel {
            self.reduce_parallel(reducer, &keys, &groups)?
        } else {
            self.reduce_sequential(reducer, &keys, &groups)?
        };

        self.enter(TaskState::Done);
        info!(
            job = %self.job_name,
            reduce_task = self.reduce_task,
            shards = self.n_map,
            records,
            keys = written,
            out_file = %self.out_file.display(),
            "reduce task finished"
        );
        Ok(ReduceSummary {
            shards: self.n_map,
            records,
            keys: written,
            out_file: self.out_file.clone(),
        })
    }

    fn enter(&self, state: TaskState) {
        debug!(job = %self.job_name, reduce_task = self.reduce_task, %state, "state");
    }

    // Every shard is checked before any is read, so a missing shard fails the
    // task before any work is done.
    fn check_shards(&self) -> Result<Vec<PathBuf>> {
        (0..self.n_map)
            .map(|m| -> Result<_> {
                let path = self.shard_path(m);
                fs::metadata(&path).map_err(|source| ReduceError::InputOpen {
                    path: path.clone(),
                    source,
                })?;
                Ok(path)
            })
            .collect()
    }

    // One shard open at a time, so the descriptor count stays flat in n_map.
    fn read_groups(&self, shards: &[PathBuf]) -> Result<(Groups, usize)> {
        let mut groups = Groups::new();
        let mut records = 0;
        for (m, path) in shards.iter().enumerate() {
            let reader = RecordReader::open(path)?;
            debug!(shard = %path.display(), map_task = m, "opened shard");
            records += group_into(&mut groups, reader)?;
        }
        // Barrier: all shards are drained before any key is reduced.
        self.enter(TaskState::Grouping);
        debug!(records, keys = groups.len(), "grouped shards");
        Ok((groups, records))
    }

    fn reduce_sequential<R: Reducer + ?Sized>(
        &self,
        reducer: &R,
        keys: &[&str],
        groups: &Groups,
    ) -> Result<usize> {
        let mut out = PendingOutput::create(&self.out_file)?;
        for &key in keys {
            let value = invoke(reducer, key, groups)?;
            out.write_record(&KeyValue::new(key.to_owned(), value))?;
        }
        out.commit()
    }

    fn reduce_parallel<R: Reducer + ?Sized>(
        &self,
        reducer: &R,
        keys: &[&str],
        groups: &Groups,
    ) -> Result<usize> {
        let mut out = PendingOutput::create(&self.out_file)?;
        // Indexed collect keeps sorted order, and reports the first failing
        // key in that order.
        let reduced: Vec<String> = keys
            .par_iter()
            .map(|&key| invoke(reducer, key, groups))
            .collect::<Vec<_>>()
            .into_iter()
            .collect::<Result<_>>()?;

        for (&key, value) in keys.iter().zip(reduced) {
            out.write_record(&KeyValue::new(key.to_owned(), value))?;
        }
        out.commit()
    }
}

/// Appends every record of one shard to `groups`. Returns the record count.
fn group_into<R: std::io::Read>(groups: &mut Groups, reader: RecordReader<R>) -> Result<usize> {
    let mut records = 0;
    for kv in reader {
        let KeyValue { key, value } = kv?;
        groups.entry(key).or_default().push(value);
        records += 1;
    }
    Ok(records)
}

/// Distinct keys in ascending byte order.
fn sorted_keys(groups: &Groups) -> Vec<&str> {
    let mut keys: Vec<&str> = groups.keys().map(String::as_str).collect();
    keys.sort_unstable();
    keys
}

fn invoke<R: Reducer + ?Sized>(reducer: &R, key: &str, groups: &Groups) -> Result<String> {
    let values: Vec<&str> = groups
        .get(key)
        .map(|vs| vs.iter().map(String::as_str).collect())
        .unwrap_or_default();
    reducer
        .reduce(key, values)
        .map_err(|source| ReduceError::Reduction {
            key: key.to_owned(),
            source,
        })
}

/// Runs reduce task `reduce_task` of `job_name` over shards in the working
/// directory, writing to `out_file`.
pub fn do_reduce<R: Reducer + ?Sized>(
    job_name: &str,
    reduce_task: usize,
    out_file: impl AsRef<Path>,
    n_map: usize,
    reducer: &R,
) -> Result<ReduceSummary> {
    ReduceTask::new(job_name, reduce_task, n_map, out_file.as_ref()).run(reducer)
}
