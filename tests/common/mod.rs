#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use mr_reduce::mapreduce::codec::write_records;
use mr_reduce::mapreduce::{reduce_name, KeyValue, RecordReader};

/// Temporary directory removed on drop.
pub struct ScratchDir(PathBuf);

impl ScratchDir {
    pub fn new(tag: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("mr-{}-{:016x}", tag, rand::random::<u64>()));
        fs::create_dir_all(&dir).unwrap();
        ScratchDir(dir)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.0.join(name)
    }

    pub fn entries(&self) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(&self.0)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

pub fn kv(k: &str, v: &str) -> KeyValue {
    KeyValue::new(k.to_string(), v.to_string())
}

/// Writes one shard per entry of `shards`, as map task `i` would.
pub fn write_shards(dir: &Path, job: &str, reduce_task: usize, shards: &[Vec<KeyValue>]) {
    for (m, records) in shards.iter().enumerate() {
        write_records(dir.join(reduce_name(job, m, reduce_task)), records).unwrap();
    }
}

pub fn read_output(path: &Path) -> Vec<KeyValue> {
    RecordReader::open(path)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
}
