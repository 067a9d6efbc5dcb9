//! TLS client construction
//!
//! Services behind a private CA need that CA installed as a root
//! certificate before the client is built.

use crate::error::{Error, Result};
use reqwest::{Certificate, ClientBuilder};
use std::path::Path;
use tracing::debug;

/// Load every certificate from a PEM bundle
pub fn load_ca_bundle(path: &Path) -> Result<Vec<Certificate>> {
    let pem = std::fs::read(path)?;
    let certs = Certificate::from_pem_bundle(&pem).map_err(|e| {
        Error::tls(format!(
            "failed to parse CA bundle '{}': {e}",
            path.display()
        ))
    })?;
    if certs.is_empty() {
        return Err(Error::tls(format!(
            "no certificates found in '{}'",
            path.display()
        )));
    }
    Ok(certs)
}

/// Install the CA bundle at `path` as trusted roots on a client builder
pub fn secure_client(builder: ClientBuilder, path: &Path) -> Result<ClientBuilder> {
    let certs = load_ca_bundle(path)?;
    debug!(
        "Loaded {} CA certificate(s) from {}",
        certs.len(),
        path.display()
    );
    Ok(certs
        .into_iter()
        .fold(builder, ClientBuilder::add_root_certificate))
}
