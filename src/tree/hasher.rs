//! Digest computation for property fingerprints using BLAKE3

use blake3::Hasher;
use std::io::{self, Read};

/// Width of an encoded digest in characters (32 bytes, lowercase hex)
pub const DIGEST_HEX_LEN: usize = 64;

/// Buffer size used when streaming binary content into a digest
const STREAM_BUFFER_SIZE: usize = 8192;

/// Encode a digest as lowercase hex
pub fn encode(hash: &blake3::Hash) -> String {
    hex::encode(hash.as_bytes())
}

/// Digest of a string, hex-encoded
pub fn digest_str(value: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(value.as_bytes());
    encode(&hasher.finalize())
}

/// Digest of an ordered sequence of strings, hex-encoded
///
/// Each element is length-prefixed (8 bytes, big-endian), so `["ab", "c"]`
/// and `["a", "bc"]` hash differently while order stays significant.
pub fn digest_sequence<'a, I>(values: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut hasher = Hasher::new();
    for value in values {
        hasher.update(&(value.len() as u64).to_be_bytes());
        hasher.update(value.as_bytes());
    }
    encode(&hasher.finalize())
}

/// Digest of streamed content, hex-encoded
///
/// The reader is consumed through a fixed buffer; the content itself is
/// never retained.
pub fn digest_reader<R: Read>(mut reader: R) -> io::Result<String> {
    let mut hasher = Hasher::new();
    let mut buf = [0u8; STREAM_BUFFER_SIZE];
    loop {
        let len = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(len) => len,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..len]);
    }
    Ok(encode(&hasher.finalize()))
}
