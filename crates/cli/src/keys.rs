//! Key generation.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use litepub_common::request_signing::KeyPair;

use crate::error::CliError;

/// Parse an 8-character hex seed into the four bytes keygen expects.
pub(crate) fn parse_seed(seed: &str) -> Result<[u8; 4], CliError> {
    let bytes = hex::decode(seed.trim())
        .map_err(|e| CliError::Usage(format!("seed '{}' is not hex: {}", seed, e)))?;

    bytes
        .try_into()
        .map_err(|_| CliError::Usage(format!("seed '{}' must be exactly 4 bytes", seed)))
}

/// Write `pem` to `path`, readable by the owner only on unix.
fn write_private_key(path: &Path, pem: &str) -> Result<(), CliError> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(pem.as_bytes())?;
    Ok(())
}

/// Generate an RSA key pair.
///
/// The private key (PKCS#1 PEM) goes to `output` when given, otherwise to
/// stdout; the public key (PKIX PEM) is always printed.
pub fn generate(seed: Option<String>, output: Option<PathBuf>) -> Result<(), CliError> {
    let keypair = match seed.as_deref() {
        Some(seed) => {
            let seed = parse_seed(seed)?;
            log::warn!("deterministic keys are for testing only");
            KeyPair::generate_deterministic(seed)?
        }
        None => KeyPair::generate()?,
    };

    let private_pem = keypair.private_key_pem()?;
    match output {
        Some(path) => {
            write_private_key(&path, &private_pem)?;
            log::info!("wrote private key to {}", path.display());
        }
        None => print!("{}", private_pem),
    }
    print!("{}", keypair.public_key_pem()?);

    Ok(())
}
