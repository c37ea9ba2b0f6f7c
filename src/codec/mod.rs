/// Capture filename codec
///
/// This module handles:
/// - Encoding a row identity (sequence + relative path) into a flat filename (filename.rs)
/// - Drawing the cache-busting nonce from an injectable source (nonce.rs)

pub mod filename;
pub mod nonce;

pub use filename::{decode, encode, encode_with, DecodedName, SEPARATOR};
pub use nonce::{FixedNonce, NonceSource, SeededNonce, ThreadNonce, MAX_NONCE};
