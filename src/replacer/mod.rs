//! Frame replacement policies.

mod lru_k;

pub use lru_k::{LRUK_REPLACER_CAPACITY, LRUK_REPLACER_K, LruKConfig, LruKReplacer};
