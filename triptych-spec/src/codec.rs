//! URL-safe export codec for specifications.
//!
//! A spec serializes to JSON without its data, compresses, and encodes to
//! a percent-encoded base64 string suitable for a URL query parameter.
//! Decoding validates the referenced dataset against a local store; the
//! round trip is lossless for the exportable (data-free) subset.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

use crate::error::TriptychSpecError;
use crate::unit::MultimodalSpec;

const COMPRESSION_LEVEL: i32 = 3;

/// Lookup of datasets available locally, keyed by name. The exported form
/// references data by name only, so decoding is valid only where the
/// dataset is separately available.
pub trait DatasetStore {
    fn contains(&self, name: &str) -> bool;
}

impl<S: std::hash::BuildHasher> DatasetStore for std::collections::HashSet<String, S> {
    fn contains(&self, name: &str) -> bool {
        std::collections::HashSet::contains(self, name)
    }
}

impl<V, S: std::hash::BuildHasher> DatasetStore for std::collections::HashMap<String, V, S> {
    fn contains(&self, name: &str) -> bool {
        self.contains_key(name)
    }
}

/// Serialize and compress a spec into its URL-safe exported form.
pub fn encode_spec(spec: &MultimodalSpec) -> Result<String, TriptychSpecError> {
    let json = serde_json::to_vec(spec)?;
    let compressed = zstd::encode_all(json.as_slice(), COMPRESSION_LEVEL)?;
    let encoded = URL_SAFE_NO_PAD.encode(compressed);
    Ok(urlencoding::encode(&encoded).into_owned())
}

/// Decode an exported spec, validating its dataset reference.
pub fn decode_spec(
    text: &str,
    store: &dyn DatasetStore,
) -> Result<MultimodalSpec, TriptychSpecError> {
    let unescaped = urlencoding::decode(text)?;
    let compressed = URL_SAFE_NO_PAD.decode(unescaped.as_bytes())?;
    let json = zstd::decode_all(compressed.as_slice())?;
    let spec: MultimodalSpec = serde_json::from_slice(&json)?;

    if !store.contains(&spec.dataset) {
        return Err(TriptychSpecError::UnknownDataset(spec.dataset));
    }
    Ok(spec)
}
