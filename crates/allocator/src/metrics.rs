//! Allocation counters.
//!
//! Recorded through the `metrics` facade; they are no-ops until the host
//! process installs a recorder.

use ::metrics::counter;

pub(crate) const BLOCKS_REGISTERED: &str = "subnetter_blocks_registered_total";
pub(crate) const BLOCKS_CARVED: &str = "subnetter_blocks_carved_total";
pub(crate) const ADDRESSES_ALLOCATED: &str = "subnetter_addresses_allocated_total";
pub(crate) const CONFLICTS: &str = "subnetter_conflicts_total";
pub(crate) const STORE_RETRIES: &str = "subnetter_store_retries_total";

pub(crate) fn block_registered() {
    counter!(BLOCKS_REGISTERED).increment(1);
}

pub(crate) fn blocks_carved(count: usize) {
    counter!(BLOCKS_CARVED).increment(count as u64);
}

/// `path` is `next` or `register`.
pub(crate) fn address_allocated(path: &'static str) {
    counter!(ADDRESSES_ALLOCATED, "path" => path).increment(1);
}

pub(crate) fn conflict(operation: &'static str) {
    counter!(CONFLICTS, "operation" => operation).increment(1);
}

pub(crate) fn store_retry(operation: &'static str) {
    counter!(STORE_RETRIES, "operation" => operation).increment(1);
}
