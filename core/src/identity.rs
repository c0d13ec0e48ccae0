//! Equality, hashing, and ordering for `HttpResource`.
//!
//! # Design
//! The identity of a resource is `(method, path, get, post, files)` where an
//! upload contributes its key and filename but not its content, so huge
//! payloads never have to be hashed and re-reading a file does not change a
//! resource's identity.
//!
//! The structural hash is computed once and cached. Equality checks method
//! and path directly and then trusts the cached hash for the parameter
//! lists, which makes frontier deduplication cheap.
//!
//! Ordering sorts by rendered URL, then by encoded body. Ties on both fall
//! back to the remaining identity fields so that `Ord` agrees with `Eq`.

use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::resource::HttpResource;

impl HttpResource {
    /// Cached 64-bit hash of the resource identity.
    pub fn identity_hash(&self) -> u64 {
        *self.cache.hash.get_or_init(|| {
            let mut hasher = DefaultHasher::new();
            self.method.hash(&mut hasher);
            self.path.hash(&mut hasher);
            self.get_params().hash(&mut hasher);
            self.post_params().hash(&mut hasher);
            self.file_params().len().hash(&mut hasher);
            for (key, filename) in self.file_identity() {
                key.hash(&mut hasher);
                filename.hash(&mut hasher);
            }
            hasher.finish()
        })
    }

    fn file_identity(&self) -> impl Iterator<Item = (&str, &str)> {
        self.file_params()
            .iter()
            .map(|f| (f.key.as_str(), f.filename()))
    }
}

impl Hash for HttpResource {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.identity_hash());
    }
}

impl PartialEq for HttpResource {
    fn eq(&self, other: &Self) -> bool {
        self.method == other.method
            && self.path == other.path
            && self.identity_hash() == other.identity_hash()
    }
}

impl Eq for HttpResource {}

impl PartialOrd for HttpResource {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HttpResource {
    fn cmp(&self, other: &Self) -> Ordering {
        self.url()
            .cmp(other.url())
            .then_with(|| self.encoded_data().cmp(other.encoded_data()))
            .then_with(|| self.method.cmp(&other.method))
            .then_with(|| self.path.cmp(&other.path))
            .then_with(|| self.get_params().cmp(other.get_params()))
            .then_with(|| self.post_params().cmp(other.post_params()))
            .then_with(|| self.file_identity().cmp(other.file_identity()))
    }
}
