//! Deterministic fixture file names.
//!
//! Directory entries in the image cost `0xe` bytes plus the name, so 18-byte
//! names make every entry exactly 32 bytes. That lets a case place an exact
//! amount of dirent metadata in one directory.

use sha2::{Digest, Sha256};
use std::collections::HashSet;

pub const NAME_LEN: usize = 18;
pub const FILE_BYTE_COUNT: usize = 0xe + NAME_LEN;

const _: () = assert!(FILE_BYTE_COUNT == 32);

/// `count` distinct lowercase names of `NAME_LEN` characters, stable for a given `seed`.
pub fn file_names(seed: &str, count: usize) -> Vec<String> {
    let mut seen = HashSet::with_capacity(count);
    let mut names = Vec::with_capacity(count);
    let mut index = 0u64;

    while names.len() < count {
        let name = name_for(seed, index);
        index += 1;
        if seen.insert(name.clone()) {
            names.push(name);
        }
    }
    names
}

fn name_for(seed: &str, index: u64) -> String {
    let digest = Sha256::new()
        .chain_update(seed.as_bytes())
        .chain_update(index.to_le_bytes())
        .finalize();
    digest
        .iter()
        .take(NAME_LEN)
        .map(|b| char::from(b'a' + b % 26))
        .collect()
}
