use crate::errors::HashError;

/// Fill a fresh salt of `len` bytes from the operating system's CSPRNG.
///
/// # Errors
/// * `Rng` - The system random source is unavailable
pub(crate) fn random_salt(len: usize) -> Result<Vec<u8>, HashError> {
    let mut salt = vec![0u8; len];
    getrandom::fill(&mut salt).map_err(|e| HashError::Rng(e.to_string()))?;
    Ok(salt)
}
