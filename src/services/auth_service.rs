use sha2::{Digest, Sha256};

/// A freshly generated API key. `plaintext` is shown once and never stored.
#[derive(Debug, Clone)]
pub struct GeneratedApiKey {
    pub plaintext: String,
    pub key_hash: String,
    pub key_prefix: String,
}

const KEY_PREFIX_LEN: usize = 8;

/// 32 random bytes, hex encoded.
pub fn generate_api_key() -> GeneratedApiKey {
    let raw: [u8; 32] = rand::random();
    let plaintext = hex::encode(raw);
    GeneratedApiKey {
        key_hash: hash_api_key(&plaintext),
        key_prefix: plaintext[..KEY_PREFIX_LEN].to_string(),
        plaintext,
    }
}

/// SHA-256 of the key, hex encoded. This is what gets stored and looked up.
pub fn hash_api_key(plaintext: &str) -> String {
    hex::encode(Sha256::digest(plaintext.as_bytes()))
}
