//! Salted password digests.
//!
//! Stored format: `<salt_hex>$<digest_hex>` where the digest is HMAC-SHA256
//! keyed by the salt over the password bytes. Verification recomputes the
//! digest and compares in constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Salt length in bytes (hex-encoded to twice this in storage).
const SALT_LEN: usize = 16;

/// Digest a password with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    use rand::Rng;
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill(&mut salt);
    hash_with_salt(&salt, password)
}

fn hash_with_salt(salt: &[u8], password: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(salt).expect("HMAC can take key of any size");
    mac.update(password.as_bytes());
    let digest = mac.finalize().into_bytes();
    format!("{}${}", hex::encode(salt), hex::encode(digest))
}

/// Check a password against a stored digest.
///
/// Returns `false` for a malformed stored value rather than erroring, so a
/// corrupt row behaves exactly like a wrong password at the login boundary.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, digest_hex)) = stored.split_once('$') else {
        return false;
    };
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };
    let Ok(expected) = hex::decode(digest_hex) else {
        return false;
    };

    let mut mac = HmacSha256::new_from_slice(&salt).expect("HMAC can take key of any size");
    mac.update(password.as_bytes());
    // verify_slice is constant-time.
    mac.verify_slice(&expected).is_ok()
}
