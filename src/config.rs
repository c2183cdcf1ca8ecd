//! Configuration and environment selection.
//!
//! Reading a configuration file is left to the caller; these types only
//! deserialize with serde and supply defaults.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::core::{Company, CpeError};
use crate::signature::{DigestAlgorithm, Signer, SigningCredential};
use crate::soap::{Credentials, SoapClient};

/// Overrides the endpoint of every environment, e.g. to point at a mock.
pub const ENDPOINT_ENV_VAR: &str = "FACTURA_PE_ENDPOINT";

/// SUNAT environment the documents are sent to.
///
/// # Examples
/// ```rust
/// use std::str::FromStr;
/// use factura_pe::config::Environment;
///
/// let env = Environment::from_str("beta")?;
/// assert_eq!(env, Environment::Beta);
/// # Ok::<(), factura_pe::CpeError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// SUNAT's homologation service; accepts the public `MODDATOS` user.
    #[default]
    Beta,
    Production,
    /// An OSE (Operador de Servicios Electrónicos) with its own URL.
    Ose { url: String },
}

impl FromStr for Environment {
    type Err = CpeError;

    /// `beta`, `production`, or `ose:<url>`.
    fn from_str(s: &str) -> Result<Self, CpeError> {
        if let Some(url) = s.strip_prefix("ose:") {
            if url.is_empty() {
                return Err(CpeError::Config("OSE environment needs a URL".into()));
            }
            return Ok(Self::Ose {
                url: url.to_string(),
            });
        }
        match s.to_ascii_lowercase().as_str() {
            "beta" => Ok(Self::Beta),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(CpeError::Config(format!("invalid environment: {s}"))),
        }
    }
}

impl Environment {
    pub fn endpoint_url(&self) -> &str {
        match self {
            Self::Beta => "https://e-beta.sunat.gob.pe/ol-ti-itcpfegem-beta/billService",
            Self::Production => "https://e-factura.sunat.gob.pe/ol-ti-itcpfegem/billService",
            Self::Ose { url } => url,
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

/// Where the signing key and certificate live: either a PEM/DER pair or
/// a PKCS#12 archive.
#[derive(Clone, Default, Deserialize)]
pub struct SigningConfig {
    pub certificate_path: Option<PathBuf>,
    pub private_key_path: Option<PathBuf>,
    pub pkcs12_path: Option<PathBuf>,
    pub pkcs12_password: Option<String>,
    #[serde(default)]
    pub digest: DigestAlgorithm,
    /// Produce unsigned documents when no key is configured. Never
    /// enable against production.
    #[serde(default)]
    pub allow_unsigned: bool,
}

impl std::fmt::Debug for SigningConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningConfig")
            .field("certificate_path", &self.certificate_path)
            .field("private_key_path", &self.private_key_path)
            .field("pkcs12_path", &self.pkcs12_path)
            .field("pkcs12_password", &self.pkcs12_password.as_ref().map(|_| "<redacted>"))
            .field("digest", &self.digest)
            .field("allow_unsigned", &self.allow_unsigned)
            .finish()
    }
}

impl SigningConfig {
    /// Load the credential, or fall back to the unsigned or unconfigured
    /// signer when the paths are absent.
    pub fn signer(&self) -> Result<Signer, CpeError> {
        if let Some(archive) = &self.pkcs12_path {
            if self.private_key_path.is_some() || self.certificate_path.is_some() {
                return Err(CpeError::Config(
                    "pkcs12_path cannot be combined with certificate_path or private_key_path"
                        .into(),
                ));
            }
            let password = self.pkcs12_password.as_deref().unwrap_or_default();
            let credential = SigningCredential::from_pkcs12_file(archive, password)?;
            return Ok(Signer::new(credential).with_digest(self.digest));
        }

        let signer = match (&self.private_key_path, &self.certificate_path) {
            (Some(key), Some(cert)) => Signer::new(SigningCredential::from_files(key, cert)?),
            (None, None) if self.allow_unsigned => Signer::unsigned_test_mode(),
            (None, None) => Signer::unconfigured(),
            _ => {
                return Err(CpeError::Config(
                    "certificate_path and private_key_path must be set together".into(),
                ));
            }
        };
        Ok(signer.with_digest(self.digest))
    }
}

/// Everything needed to build an orchestrator.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub environment: Environment,
    pub credentials: Credentials,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    pub issuer: Company,
    #[serde(default)]
    pub signing: SigningConfig,
}

impl Config {
    pub fn new(environment: Environment, credentials: Credentials, issuer: Company) -> Self {
        Self {
            environment,
            credentials,
            timeout_secs: default_timeout_secs(),
            issuer,
            signing: SigningConfig::default(),
        }
    }

    /// The environment's URL unless `FACTURA_PE_ENDPOINT` is set.
    pub fn endpoint_url(&self) -> String {
        std::env::var(ENDPOINT_ENV_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.environment.endpoint_url().to_string())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn soap_client(&self) -> Result<SoapClient, CpeError> {
        SoapClient::new(self.endpoint_url(), self.credentials.clone(), self.timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_environments() {
        assert_eq!("BETA".parse::<Environment>().unwrap(), Environment::Beta);
        assert_eq!(
            "production".parse::<Environment>().unwrap(),
            Environment::Production
        );
        assert_eq!(
            "ose:https://ose.example.pe/ol-ti-itcpe/billService"
                .parse::<Environment>()
                .unwrap()
                .endpoint_url(),
            "https://ose.example.pe/ol-ti-itcpe/billService"
        );
        assert!("ose:".parse::<Environment>().is_err());
        assert!(matches!(
            "staging".parse::<Environment>(),
            Err(CpeError::Config(_))
        ));
    }

    #[test]
    fn deserializes_with_defaults() {
        let json = r#"{
            "credentials": {"username": "20123456789MODDATOS", "password": "moddatos"},
            "issuer": {"document_type": "6", "document_number": "20123456789", "name": "ACME S.A.C."}
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.environment, Environment::Beta);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.signing.digest, DigestAlgorithm::Sha1);
        assert!(!config.signing.allow_unsigned);
        assert!(!format!("{config:?}").contains("moddatos\""));
    }

    #[test]
    fn ose_from_json() {
        let env: Environment =
            serde_json::from_str(r#"{"ose": {"url": "https://ose.example.pe/billService"}}"#)
                .unwrap();
        assert_eq!(env.endpoint_url(), "https://ose.example.pe/billService");
    }

    #[test]
    fn signer_selection() {
        let unsigned = SigningConfig {
            allow_unsigned: true,
            ..Default::default()
        };
        assert_eq!(
            unsigned.signer().unwrap().mode(),
            Some(crate::core::SignatureMode::Unsigned)
        );
        assert_eq!(SigningConfig::default().signer().unwrap().mode(), None);

        let half = SigningConfig {
            certificate_path: Some("cert.pem".into()),
            ..Default::default()
        };
        assert!(matches!(half.signer(), Err(CpeError::Config(_))));

        let both = SigningConfig {
            pkcs12_path: Some("cert.pfx".into()),
            private_key_path: Some("key.pem".into()),
            ..Default::default()
        };
        assert!(matches!(both.signer(), Err(CpeError::Config(_))));
    }

    #[test]
    fn pkcs12_signer() {
        let fixtures = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
        let config = SigningConfig {
            pkcs12_path: Some(fixtures.join("signing_credential.p12")),
            pkcs12_password: Some("moddatos".into()),
            ..Default::default()
        };
        assert_eq!(
            config.signer().unwrap().mode(),
            Some(crate::core::SignatureMode::Signed)
        );
        assert!(!format!("{config:?}").contains("moddatos"));

        let wrong = SigningConfig {
            pkcs12_password: Some("otra".into()),
            ..config
        };
        assert!(matches!(wrong.signer(), Err(CpeError::Signing(_))));
    }
}
