// sorted, space separated values

pub fn reduce(_key: &str, mut values: Vec<&str>) -> String {
    values.sort();
    values.join(" ")
}
