//! Temp recording file naming

use crate::config_store::UserId;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use sha1::{Digest, Sha1};
use std::path::{Path, PathBuf};

/// URL-safe base64 of the SHA-1 of the seed
pub fn hashify(seed: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(seed);
    URL_SAFE.encode(hasher.finalize())
}

/// `{dir}/{user_id}_{hash(stream_url)}.mp4`
///
/// Same user + same stream always maps to the same file; anything else
/// gets its own.
pub fn recording_path(dir: &Path, user_id: UserId, stream_url: &str) -> PathBuf {
    let file_name = format!("{}_{}.mp4", user_id, hashify(stream_url.as_bytes()));
    dir.join(file_name)
}
