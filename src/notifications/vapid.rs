use anyhow::{Context, Result};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use openssl::bn::BigNumContext;
use openssl::ec::{EcGroup, EcKey, PointConversionForm};
use openssl::nid::Nid;
use openssl::pkey::PKey;
use std::path::Path;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::config::Settings;

fn b64(b: Vec<u8>) -> String {
    URL_SAFE_NO_PAD.encode(b)
}

/// Private key PEM plus the base64url public key browsers subscribe with.
#[derive(Debug, Clone)]
pub struct VapidKeys {
    pub pem: String,
    pub public_key: String,
}

impl VapidKeys {
    /// `VAPID_PRIVATE_PEM` wins; otherwise the key file, generated when missing.
    pub async fn load(settings: &Settings) -> Result<Self> {
        if let Some(raw) = &settings.vapid_private_pem {
            let pem = normalize_pem(raw);
            let public_key = b64(public_key_from_pem(pem.as_bytes())
                .context("VAPID_PRIVATE_PEM is not a valid EC private key")?);
            info!("Using VAPID key from VAPID_PRIVATE_PEM");
            return Ok(VapidKeys { pem, public_key });
        }

        let path = &settings.vapid_key_path;
        let public_key = maybe_create_vapid_key(path)
            .await
            .with_context(|| format!("Failed to create/load VAPID key at: {}", path))?;
        let pem = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read VAPID key file at: {}", path))?;
        Ok(VapidKeys { pem, public_key })
    }
}

/// Undo the mangling PEM values pick up in env files: a `b'...'` wrapper and
/// escaped newlines.
pub fn normalize_pem(raw: &str) -> String {
    let mut pem = raw.trim();
    for quote in ['\'', '"'] {
        if let Some(inner) = pem
            .strip_prefix('b')
            .and_then(|s| s.strip_prefix(quote))
            .and_then(|s| s.strip_suffix(quote))
        {
            pem = inner;
        }
    }
    pem.replace("\\n", "\n").trim().to_string()
}

pub async fn maybe_create_vapid_key(path: &str) -> Result<String> {
    if Path::new(path).exists() {
        return Ok(b64(load_public_key(path).await.with_context(|| {
            format!("Failed to load existing VAPID key from: {}", path)
        })?));
    }

    generate_vapid_key(path).await
}

/// Writes a fresh key to `path`, refusing to overwrite, and returns the public key.
pub async fn generate_vapid_key(path: &str) -> Result<String> {
    Ok(b64(generate_and_save_key(path).await.with_context(
        || format!("Failed to generate and save VAPID key to: {}", path),
    )?))
}

async fn generate_and_save_key(path: &str) -> Result<Vec<u8>> {
    let (pem_bytes, public_key) = tokio::task::spawn_blocking(|| {
        let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1)?;
        let ec_key = EcKey::generate(&group)?;

        // uncompressed point, 65 bytes
        let mut ctx = BigNumContext::new()?;
        let public_key =
            ec_key
                .public_key()
                .to_bytes(&group, PointConversionForm::UNCOMPRESSED, &mut ctx)?;

        let pkey = PKey::from_ec_key(ec_key)?;
        let pem = pkey.private_key_to_pem_pkcs8()?;

        Ok::<_, openssl::error::ErrorStack>((pem, public_key))
    })
    .await?
    .context("Failed to generate VAPID key pair")?;

    let parent_dir = Path::new(path)
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Invalid VAPID key path (no parent directory): {}", path))?;

    if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
        return Err(anyhow::anyhow!(
            "Parent directory does not exist for VAPID key path: {} (parent: {})",
            path,
            parent_dir.display()
        ));
    }

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .with_context(|| format!("Failed to create VAPID key file at: {}", path))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = file
            .metadata()
            .await
            .with_context(|| format!("Failed to get metadata for VAPID key file: {}", path))?
            .permissions();
        perms.set_mode(0o600);
        tokio::fs::set_permissions(path, perms)
            .await
            .with_context(|| format!("Failed to set permissions for VAPID key file: {}", path))?;
    }

    file.write_all(&pem_bytes)
        .await
        .with_context(|| format!("Failed to write VAPID key to file: {}", path))?;
    Ok(public_key)
}

fn public_key_from_pem(pem: &[u8]) -> Result<Vec<u8>> {
    let pkey =
        PKey::private_key_from_pem(pem).context("Failed to parse PEM-encoded private key")?;
    let ec_key = pkey
        .ec_key()
        .context("Failed to extract EC key from PKey")?;

    let group = ec_key.group();
    let mut ctx = BigNumContext::new()?;
    let public_key =
        ec_key
            .public_key()
            .to_bytes(group, PointConversionForm::UNCOMPRESSED, &mut ctx)?;
    Ok(public_key)
}

async fn load_public_key(path: &str) -> Result<Vec<u8>> {
    let path = path.to_string();
    tokio::task::spawn_blocking(move || {
        let pem = std::fs::read(&path)
            .with_context(|| format!("Failed to read VAPID key file at: {}", path))?;
        public_key_from_pem(&pem)
    })
    .await?
}
