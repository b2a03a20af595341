use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use serde_json::de::IoRead;
use serde_json::error::Category;
use serde_json::StreamDeserializer;

use crate::mapreduce::error::{ReduceError, Result};
use crate::mapreduce::util::KeyValue;

/// Streams [`KeyValue`] records out of a shard.
///
/// A shard is a sequence of JSON objects separated by optional whitespace.
/// Running out of records and hitting a broken record are reported
/// differently: the former is `Ok(None)`, the latter an error.
pub struct RecordReader<R: Read> {
    path: PathBuf,
    records: StreamDeserializer<'static, IoRead<BufReader<R>>, KeyValue>,
    decoded: usize,
    done: bool,
}

impl RecordReader<File> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ReduceError::InputOpen {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(RecordReader::new(path, file))
    }
}

impl<R: Read> RecordReader<R> {
    /// `path` is only used to label errors.
    pub fn new(path: impl Into<PathBuf>, reader: R) -> Self {
        let records = serde_json::Deserializer::from_reader(BufReader::new(reader)).into_iter();
        RecordReader {
            path: path.into(),
            records,
            decoded: 0,
            done: false,
        }
    }

    pub fn next_record(&mut self) -> Result<Option<KeyValue>> {
        if self.done {
            return Ok(None);
        }
        match self.records.next() {
            Some(Ok(kv)) => {
                self.decoded += 1;
                Ok(Some(kv))
            }
            None => {
                self.done = true;
                Ok(None)
            }
            Some(Err(e)) => {
                self.done = true;
                Err(self.classify(e))
            }
        }
    }

    fn classify(&self, e: serde_json::Error) -> ReduceError {
        match e.classify() {
            Category::Io => ReduceError::Read {
                path: self.path.clone(),
                source: io::Error::from(e),
            },
            // Eof here means the stream stopped partway through a record.
            Category::Syntax | Category::Data | Category::Eof => ReduceError::MalformedRecord {
                path: self.path.clone(),
                record: self.decoded,
                source: e,
            },
        }
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<KeyValue>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

/// Encodes records one per line.
pub struct RecordWriter<W: Write> {
    path: PathBuf,
    out: BufWriter<W>,
    written: usize,
}

impl<W: Write> RecordWriter<W> {
    /// `path` is only used to label errors.
    pub fn new(path: impl Into<PathBuf>, writer: W) -> Self {
        RecordWriter {
            path: path.into(),
            out: BufWriter::new(writer),
            written: 0,
        }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn write_record(&mut self, kv: &KeyValue) -> Result<()> {
        serde_json::to_writer(&mut self.out, kv)
            .map_err(io::Error::from)
            .and_then(|_| self.out.write_all(b"\n"))
            .map_err(|source| ReduceError::Write {
                path: self.path.clone(),
                source,
            })?;
        self.written += 1;
        Ok(())
    }

    /// Flushes buffered records and hands back the underlying writer.
    pub fn finish(self) -> Result<W> {
        let path = self.path;
        self.out.into_inner().map_err(|e| ReduceError::Write {
            path,
            source: e.into_error(),
        })
    }
}

/// Writes `records` to a fresh file at `path`, replacing whatever was there.
///
/// This is the format map tasks produce shards in.
pub fn write_records<'a>(
    path: impl AsRef<Path>,
    records: impl IntoIterator<Item = &'a KeyValue>,
) -> Result<usize> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| ReduceError::OutputOpen {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = RecordWriter::new(path, file);
    for kv in records {
        writer.write_record(kv)?;
    }
    let written = writer.written();
    writer.finish()?;
    Ok(written)
}
