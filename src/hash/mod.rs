mod hasher;

pub use hasher::{generate_hashes, Fingerprint, HashToken};
