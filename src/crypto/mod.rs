pub mod hashing;

pub use hashing::{digests_equal, generate_token, hash_secret, hash_token};
