use rand::Rng;
use sha2::{Digest, Sha256};

/// 32 random bytes, hex encoded
pub fn random_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}

/// Private token identifying a job or affiliate owner, salted with the
/// contact email so two submissions never share a token
pub fn owner_token(email: &str) -> String {
    let salt: u64 = rand::thread_rng().gen();
    let digest = Sha256::digest(format!("{email}{salt}{}", random_token()).as_bytes());
    hex::encode(digest)
}
