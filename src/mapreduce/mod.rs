pub mod apps;
pub mod codec;
pub mod error;
pub mod output;
pub mod reduce;
pub mod util;

pub use codec::{RecordReader, RecordWriter};
pub use error::{ReduceError, ReductionError, Result};
pub use reduce::{do_reduce, ReduceSummary, ReduceTask, Reducer, TaskState};
pub use util::{merge_name, reduce_name, KeyValue, ReduceFn};
