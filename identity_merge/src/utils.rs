use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use ring::rand::SecureRandom;
use thiserror::Error;

fn fill_random(buf: &mut [u8]) -> Result<(), UtilError> {
    let rng = ring::rand::SystemRandom::new();
    rng.fill(buf)
        .map_err(|_| UtilError::Crypto("Failed to generate random bytes".to_string()))
}

/// Random URL-safe string built from `len` random bytes
pub fn gen_random_string(len: usize) -> Result<String, UtilError> {
    let mut bytes = vec![0u8; len];
    fill_random(&mut bytes)?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Random number in `0..upper`
pub(crate) fn gen_random_number(upper: u32) -> Result<u32, UtilError> {
    if upper == 0 {
        return Err(UtilError::Format("Upper bound must be positive".to_string()));
    }
    let mut bytes = [0u8; 4];
    fill_random(&mut bytes)?;
    Ok(u32::from_le_bytes(bytes) % upper)
}

#[derive(Debug, Error, Clone)]
pub enum UtilError {
    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Invalid format: {0}")]
    Format(String),
}
