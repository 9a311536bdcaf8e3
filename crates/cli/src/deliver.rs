//! Signed delivery of a prepared activity.

use std::fs;
use std::path::{Path, PathBuf};

use litepub_common::delivery::send_signed;
use litepub_common::fetch::ObjectFetcher;
use litepub_common::http_client::HttpClient;
use litepub_common::request_signing::{decode_private_key_pem, RequestSigner};
use litepub_common::settings::Settings;

use crate::error::CliError;

/// Build the signer from the `[signing]` section.
pub(crate) fn load_signer(settings: &Settings) -> Result<RequestSigner, CliError> {
    let signing = settings.require_signing()?;
    let pem = fs::read_to_string(Path::new(&signing.private_key_path))?;
    let private_key = decode_private_key_pem(&pem)?;

    Ok(RequestSigner::new(private_key, signing.key_id.clone()))
}

/// Send the JSON activity in `activity` to `target`, an inbox URL or
/// `name@domain`.
pub fn deliver<C: HttpClient>(
    fetcher: &ObjectFetcher<C>,
    settings: &Settings,
    target: &str,
    activity: PathBuf,
) -> Result<(), CliError> {
    let signer = load_signer(settings)?;
    let activity: serde_json::Value = serde_json::from_str(&fs::read_to_string(&activity)?)?;

    let response = send_signed(fetcher, &signer, target, &activity)?;
    let status = response.status();
    println!("{}", status);

    let body = String::from_utf8_lossy(response.body());
    if !body.trim().is_empty() {
        println!("{}", body);
    }

    if status.is_success() {
        Ok(())
    } else {
        Err(CliError::Federation(format!(
            "{} rejected the delivery with HTTP {}",
            target, status
        )))
    }
}
