use crate::core::pipeline::resource::FunctionRef;
use sha2::{Digest, Sha256};

/// Id of the terminal state delivering the pipeline output.
pub const SINK_STATE_ID: &str = "Sink";

const FAN_OUT_HASH_LEN: usize = 8;

/// Compute the SHA-256 hash encoded as lowercase hex.
pub fn compute_sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Name of a `ForEach` state, derived from the ids of the states it runs.
/// Equal inputs always give equal names.
pub fn fan_out_state_id(accumulated_ids: &str) -> String {
    let digest = compute_sha256_hex(accumulated_ids.as_bytes());
    format!("Seq{}", &digest[..FAN_OUT_HASH_LEN])
}

pub fn invoke_state_id(function: &FunctionRef) -> String {
    format!("Map{}", function.id)
}

pub fn forward_state_id(function: &FunctionRef) -> String {
    format!("Try{}", function.id)
}

pub fn fail_state_id(function: &FunctionRef) -> String {
    format!("Err{}", function.id)
}
