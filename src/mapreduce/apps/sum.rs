use crate::mapreduce::error::ReductionError;
use crate::mapreduce::reduce::Reducer;

/// Sums integer values. Fails on anything that isn't an integer.
pub struct Sum;

impl Reducer for Sum {
    fn reduce(&self, _key: &str, values: Vec<&str>) -> Result<String, ReductionError> {
        let mut total: i64 = 0;
        for v in values {
            let n: i64 = v
                .trim()
                .parse()
                .map_err(|_| ReductionError::new(format!("value {:?} is not an integer", v)))?;
            total = total
                .checked_add(n)
                .ok_or_else(|| ReductionError::from("sum overflows i64"))?;
        }
        Ok(total.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_text() {
        assert_eq!(Sum.reduce("a", vec!["1", "3"]).unwrap(), "4");
        assert_eq!(Sum.reduce("a", vec!["-5", " 2"]).unwrap(), "-3");
        assert_eq!(Sum.reduce("a", vec![]).unwrap(), "0");
    }

    #[test]
    fn rejects_non_numbers() {
        let err = Sum.reduce("a", vec!["1", "x"]).unwrap_err();
        assert_eq!(err.to_string(), "value \"x\" is not an integer");
        assert!(Sum.reduce("a", vec!["9223372036854775807", "1"]).is_err());
    }
}
