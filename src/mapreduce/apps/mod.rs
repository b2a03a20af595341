use crate::mapreduce::reduce::Reducer;
use crate::mapreduce::util::ReduceFn;

pub mod concat;
pub mod indexer;
pub mod sum;
pub mod wc;

/// Names accepted by [`get_app`].
pub const APPS: &[&str] = &["wc", "indexer", "concat", "sum"];

static WC: ReduceFn = wc::reduce;
static INDEXER: ReduceFn = indexer::reduce;
static CONCAT: ReduceFn = concat::reduce;

pub fn get_app(name: &str) -> Option<&'static dyn Reducer> {
    let app: &'static dyn Reducer = match name {
        "wc" => &WC,
        "indexer" => &INDEXER,
        "concat" => &CONCAT,
        "sum" => &sum::Sum,
        _ => return None,
    };
    Some(app)
}
