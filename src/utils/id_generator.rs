use std::sync::Arc;
use tinyrand::{Rand, RandRange};
use tinyrand_std::thread_rand;

/// Alphabet without the look-alikes 0/O and 1/I.
const VALID_CHARS: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub const CONNECTION_ID_LENGTH: usize = 8;

pub fn mini_id(length: usize) -> Arc<str> {
    mini_id_with(&mut thread_rand(), length)
}

pub fn mini_id_with<R: Rand>(rng: &mut R, length: usize) -> Arc<str> {
    let id: String = (0..length)
        .map(|_| VALID_CHARS[rng.next_range(0..VALID_CHARS.len())] as char)
        .collect();

    Arc::from(id)
}

pub fn connection_id() -> Arc<str> {
    mini_id(CONNECTION_ID_LENGTH)
}
