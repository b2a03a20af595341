// word count: each value is one occurrence

pub fn reduce(_key: &str, values: Vec<&str>) -> String {
    values.len().to_string()
}
