// inverted index: values are the documents a word appeared in

pub fn reduce(_key: &str, mut values: Vec<&str>) -> String {
    values.sort();
    format!("{} {}", values.len(), values.join(","))
}

#[cfg(test)]
mod tests {
    use crate::mapreduce::apps::indexer::reduce;

    #[test]
    fn lists_documents_sorted() {
        assert_eq!(reduce("abc", vec!["file2", "file1"]), "2 file1,file2");
        assert_eq!(reduce("ghi", vec!["file1"]), "1 file1");
    }
}
