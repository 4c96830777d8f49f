use std::fs;
use std::io::prelude::*;
use uuid::Uuid;

/// Read the token signing secret, generating one on first launch.
/// Rotating the file invalidates every token in circulation.
pub fn get_token_secret() -> std::io::Result<Vec<u8>> {
    let file_path = "./token-secret";
    let contents = fs::read(file_path);

    if let Ok(contents) = contents {
        return Ok(contents);
    }

    let mut secret = Vec::new();
    for _ in 0..4 {
        secret.extend_from_slice(Uuid::new_v4().as_bytes());
    }
    let mut file = fs::File::create(file_path)?;
    file.write_all(&secret)?;

    Ok(secret)
}
