mod jsonl;

pub use jsonl::{flush_to_jsonl, read_jsonl};
