use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Compute a cache/dedup key from an operation name and its normalized
/// parameters.
///
/// The key is `"{operation}:{hash}"`: the readable prefix partitions the
/// shared keyspace by operation, the SipHash of the parameters keeps keys
/// short regardless of query length. The hash is stable within a process
/// lifetime, which is all an in-memory cache needs.
pub fn cache_key(operation: &str, params: &[&str]) -> String {
    let mut hasher = DefaultHasher::new();
    operation.hash(&mut hasher);
    for param in params {
        param.hash(&mut hasher);
    }
    format!("{operation}:{:016x}", hasher.finish())
}
