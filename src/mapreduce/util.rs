use serde::{Deserialize, Serialize};

/// One record of intermediate or reduce output.
///
/// Field names are capitalized on the wire since the merger reads
/// `{"Key": ..., "Value": ...}` objects.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: String, value: String) -> Self {
        KeyValue { key, value }
    }
}

pub type ReduceFn = fn(&str, Vec<&str>) -> String;

/// Name of the shard map task `map_task` wrote for reduce task `reduce_task`.
pub fn reduce_name(job_name: &str, map_task: usize, reduce_task: usize) -> String {
    format!("mrtmp.{}-{}-{}", job_name, map_task, reduce_task)
}

/// Name of the output file the merger expects from reduce task `reduce_task`.
pub fn merge_name(job_name: &str, reduce_task: usize) -> String {
    format!("mrtmp.{}-res-{}", job_name, reduce_task)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shard_and_output_names() {
        assert_eq!(reduce_name("wcseq", 3, 0), "mrtmp.wcseq-3-0");
        assert_eq!(reduce_name("job", 0, 12), "mrtmp.job-0-12");
        assert_eq!(merge_name("wcseq", 2), "mrtmp.wcseq-res-2");
    }

    #[test]
    fn wire_field_names() {
        let kv = KeyValue::new("a".to_string(), "1".to_string());
        assert_eq!(
            serde_json::to_string(&kv).unwrap(),
            r#"{"Key":"a","Value":"1"}"#
        );
    }
}
