use anyhow::{Context, Result};
use skydb_core::{DataKey, PublicKey};

pub fn parse_public_key(s: &str) -> Result<PublicKey> {
    let public_key: PublicKey = s
        .trim()
        .parse()
        .with_context(|| format!("invalid public key '{s}'"))?;
    public_key
        .verifying_key()
        .with_context(|| format!("'{s}' is not a valid Ed25519 public key"))?;
    Ok(public_key)
}

/// A plain data key, or a 64-char hex digest when `hashed` is set.
pub fn parse_data_key(s: &str, hashed: bool) -> Result<DataKey> {
    if hashed {
        return DataKey::from_hex(s.trim())
            .with_context(|| format!("invalid data key digest '{s}'"));
    }
    Ok(DataKey::from(s))
}
