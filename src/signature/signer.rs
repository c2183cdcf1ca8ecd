use std::path::Path;

use base64ct::{Base64, Encoding};
use quick_xml::Reader;
use quick_xml::events::Event;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::pkcs8::{DecodePrivateKey, EncodePublicKey};
use rsa::signature::{SignatureEncoding, Signer as _, Verifier as _};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use x509_cert::Certificate;
use x509_cert::der::{Decode, DecodePem, Encode};

use super::c14n::{Canonicalizer, in_scope_namespaces};
use crate::core::{CpeError, SignatureMode};
use crate::ubl::SIGNATURE_PLACEHOLDER;

pub const DSIG_NS: &str = "http://www.w3.org/2000/09/xmldsig#";
pub const C14N_METHOD: &str = "http://www.w3.org/TR/2001/REC-xml-c14n-20010315";
pub const ENVELOPED_SIGNATURE: &str = "http://www.w3.org/2000/09/xmldsig#enveloped-signature";

/// `Id` of the `ds:Signature` element, referenced from `cac:Signature`.
pub const SIGNATURE_ELEMENT_ID: &str = "SignatureST";

/// Digest (and matching RSA signature) algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// SHA-1 / rsa-sha1, as in SUNAT's published samples.
    #[default]
    Sha1,
    Sha256,
}

impl DigestAlgorithm {
    pub fn digest_uri(&self) -> &'static str {
        match self {
            Self::Sha1 => "http://www.w3.org/2000/09/xmldsig#sha1",
            Self::Sha256 => "http://www.w3.org/2001/04/xmlenc#sha256",
        }
    }

    pub fn signature_uri(&self) -> &'static str {
        match self {
            Self::Sha1 => "http://www.w3.org/2000/09/xmldsig#rsa-sha1",
            Self::Sha256 => "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256",
        }
    }

    fn from_digest_uri(uri: &str) -> Option<Self> {
        [Self::Sha1, Self::Sha256]
            .into_iter()
            .find(|a| a.digest_uri() == uri)
    }

    fn from_signature_uri(uri: &str) -> Option<Self> {
        [Self::Sha1, Self::Sha256]
            .into_iter()
            .find(|a| a.signature_uri() == uri)
    }

    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha1 => Sha1::digest(data).to_vec(),
            Self::Sha256 => Sha256::digest(data).to_vec(),
        }
    }

    fn sign(&self, key: &RsaPrivateKey, message: &[u8]) -> Result<Vec<u8>, CpeError> {
        let signature = match self {
            Self::Sha1 => SigningKey::<Sha1>::new(key.clone())
                .try_sign(message)
                .map(|s| s.to_vec()),
            Self::Sha256 => SigningKey::<Sha256>::new(key.clone())
                .try_sign(message)
                .map(|s| s.to_vec()),
        };
        signature.map_err(|e| CpeError::Signing(format!("RSA signing failed: {e}")))
    }

    fn verify(&self, key: &RsaPublicKey, message: &[u8], signature: &[u8]) -> bool {
        let Ok(signature) = Signature::try_from(signature) else {
            return false;
        };
        match self {
            Self::Sha1 => VerifyingKey::<Sha1>::new(key.clone())
                .verify(message, &signature)
                .is_ok(),
            Self::Sha256 => VerifyingKey::<Sha256>::new(key.clone())
                .verify(message, &signature)
                .is_ok(),
        }
    }
}

/// RSA private key plus the X.509 certificate embedded in `ds:KeyInfo`.
#[derive(Clone)]
pub struct SigningCredential {
    key: RsaPrivateKey,
    certificate_der: Vec<u8>,
}

impl std::fmt::Debug for SigningCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningCredential")
            .field("key", &"<redacted>")
            .field("certificate_der_len", &self.certificate_der.len())
            .finish()
    }
}

impl SigningCredential {
    /// PKCS#8 or PKCS#1 private key and certificate, both PEM.
    pub fn from_pem(private_key_pem: &str, certificate_pem: &str) -> Result<Self, CpeError> {
        let key = RsaPrivateKey::from_pkcs8_pem(private_key_pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(private_key_pem))
            .map_err(|e| CpeError::Signing(format!("unreadable PEM private key: {e}")))?;
        let certificate = Certificate::from_pem(certificate_pem.as_bytes())
            .map_err(|e| CpeError::Signing(format!("unreadable PEM certificate: {e}")))?;
        Self::from_parts(key, certificate)
    }

    /// PKCS#8 or PKCS#1 private key and certificate, both DER.
    pub fn from_der(private_key_der: &[u8], certificate_der: &[u8]) -> Result<Self, CpeError> {
        let key = RsaPrivateKey::from_pkcs8_der(private_key_der)
            .or_else(|_| RsaPrivateKey::from_pkcs1_der(private_key_der))
            .map_err(|e| CpeError::Signing(format!("unreadable DER private key: {e}")))?;
        let certificate = Certificate::from_der(certificate_der)
            .map_err(|e| CpeError::Signing(format!("unreadable DER certificate: {e}")))?;
        Self::from_parts(key, certificate)
    }

    /// Load both files, accepting PEM or DER for each.
    pub fn from_files(
        private_key_path: impl AsRef<Path>,
        certificate_path: impl AsRef<Path>,
    ) -> Result<Self, CpeError> {
        let read = |path: &Path| {
            std::fs::read(path).map_err(|e| {
                CpeError::Signing(format!("cannot read {}: {e}", path.display()))
            })
        };
        let key_bytes = read(private_key_path.as_ref())?;
        let cert_bytes = read(certificate_path.as_ref())?;

        let key = match pem_text(&key_bytes) {
            Some(pem) => RsaPrivateKey::from_pkcs8_pem(pem)
                .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
                .map_err(|e| CpeError::Signing(format!("unreadable private key: {e}")))?,
            None => RsaPrivateKey::from_pkcs8_der(&key_bytes)
                .or_else(|_| RsaPrivateKey::from_pkcs1_der(&key_bytes))
                .map_err(|e| CpeError::Signing(format!("unreadable private key: {e}")))?,
        };
        let certificate = match pem_text(&cert_bytes) {
            Some(pem) => Certificate::from_pem(pem.as_bytes()),
            None => Certificate::from_der(&cert_bytes),
        }
        .map_err(|e| CpeError::Signing(format!("unreadable certificate: {e}")))?;

        Self::from_parts(key, certificate)
    }

    /// PKCS#12 (`.pfx` / `.p12`) archive, the format SUNAT-issued
    /// certificates usually come in.
    ///
    /// The first private key in the archive is used, together with the
    /// certificate of its chain that matches it.
    pub fn from_pkcs12(der: &[u8], password: &str) -> Result<Self, CpeError> {
        let keystore = p12_keystore::KeyStore::from_pkcs12(der, password)
            .map_err(|e| CpeError::Signing(format!("unreadable PKCS#12 archive: {e}")))?;
        let (alias, chain) = keystore
            .private_key_chain()
            .ok_or_else(|| CpeError::Signing("PKCS#12 archive has no private key".into()))?;
        let key = RsaPrivateKey::from_pkcs8_der(chain.key())
            .map_err(|e| CpeError::Signing(format!("PKCS#12 key is not an RSA key: {e}")))?;

        for cert in chain.chain() {
            let Ok(certificate) = Certificate::from_der(cert.as_der()) else {
                continue;
            };
            if let Ok(credential) = Self::from_parts(key.clone(), certificate) {
                tracing::debug!(%alias, "PKCS#12 credential loaded");
                return Ok(credential);
            }
        }
        Err(CpeError::Signing(format!(
            "PKCS#12 entry {alias} has no certificate for its private key"
        )))
    }

    pub fn from_pkcs12_file(path: impl AsRef<Path>, password: &str) -> Result<Self, CpeError> {
        let path = path.as_ref();
        let der = std::fs::read(path)
            .map_err(|e| CpeError::Signing(format!("cannot read {}: {e}", path.display())))?;
        Self::from_pkcs12(&der, password)
    }

    fn from_parts(key: RsaPrivateKey, certificate: Certificate) -> Result<Self, CpeError> {
        let cert_spki = certificate
            .tbs_certificate
            .subject_public_key_info
            .to_der()
            .map_err(|e| CpeError::Signing(format!("certificate encoding: {e}")))?;
        let key_spki = key
            .to_public_key()
            .to_public_key_der()
            .map_err(|e| CpeError::Signing(format!("public key encoding: {e}")))?;
        if cert_spki != key_spki.as_bytes() {
            return Err(CpeError::Signing(
                "certificate does not belong to the private key".into(),
            ));
        }
        let certificate_der = certificate
            .to_der()
            .map_err(|e| CpeError::Signing(format!("certificate encoding: {e}")))?;
        Ok(Self {
            key,
            certificate_der,
        })
    }

    pub fn certificate_der(&self) -> &[u8] {
        &self.certificate_der
    }

    pub fn public_key(&self) -> RsaPublicKey {
        self.key.to_public_key()
    }
}

fn pem_text(bytes: &[u8]) -> Option<&str> {
    std::str::from_utf8(bytes)
        .ok()
        .filter(|s| s.trim_start().starts_with("-----BEGIN"))
}

#[derive(Debug, Clone)]
enum KeySource {
    Credential(Box<SigningCredential>),
    UnsignedTestMode,
    Missing,
}

/// Result of [`Signer::sign`].
#[derive(Debug, Clone)]
pub struct SignedXml {
    pub xml: String,
    pub mode: SignatureMode,
}

/// Embeds an enveloped XML signature into the UBL placeholder.
#[derive(Debug, Clone)]
pub struct Signer {
    source: KeySource,
    digest: DigestAlgorithm,
}

impl Signer {
    pub fn new(credential: SigningCredential) -> Self {
        Self {
            source: KeySource::Credential(Box::new(credential)),
            digest: DigestAlgorithm::default(),
        }
    }

    /// A signer with no credential. Every `sign` call fails.
    pub fn unconfigured() -> Self {
        Self {
            source: KeySource::Missing,
            digest: DigestAlgorithm::default(),
        }
    }

    /// Leaves the placeholder empty and reports [`SignatureMode::Unsigned`].
    /// For test environments only; SUNAT rejects unsigned documents.
    pub fn unsigned_test_mode() -> Self {
        Self {
            source: KeySource::UnsignedTestMode,
            digest: DigestAlgorithm::default(),
        }
    }

    pub fn with_digest(mut self, digest: DigestAlgorithm) -> Self {
        self.digest = digest;
        self
    }

    pub fn digest_algorithm(&self) -> DigestAlgorithm {
        self.digest
    }

    /// Mode of the documents this signer produces, if it can produce any.
    pub fn mode(&self) -> Option<SignatureMode> {
        match self.source {
            KeySource::Credential(_) => Some(SignatureMode::Signed),
            KeySource::UnsignedTestMode => Some(SignatureMode::Unsigned),
            KeySource::Missing => None,
        }
    }

    /// Sign `xml`, replacing the first signature placeholder.
    pub fn sign(&self, xml: &str) -> Result<SignedXml, CpeError> {
        if !xml.contains(SIGNATURE_PLACEHOLDER) {
            return Err(CpeError::Signing(format!(
                "signature placeholder {SIGNATURE_PLACEHOLDER} not found"
            )));
        }

        let credential = match &self.source {
            KeySource::Credential(credential) => credential,
            KeySource::UnsignedTestMode => {
                tracing::warn!("unsigned test mode, signature slot left empty");
                return Ok(SignedXml {
                    xml: xml.to_string(),
                    mode: SignatureMode::Unsigned,
                });
            }
            KeySource::Missing => {
                return Err(CpeError::Signing(
                    "no signing credential configured".into(),
                ));
            }
        };

        let canonical = Canonicalizer::new().canonicalize(xml)?;
        let digest_value = Base64::encode_string(&self.digest.digest(canonical.as_bytes()));
        let signed_info = signed_info_xml(self.digest, &digest_value);

        let mut scope = in_scope_namespaces(xml, "ext:ExtensionContent")?;
        scope.push(("ds".to_string(), DSIG_NS.to_string()));
        let canonical_signed_info = Canonicalizer::new()
            .inherit_namespaces(scope)
            .canonicalize(&signed_info)?;
        let signature_value =
            Base64::encode_string(&self.digest.sign(&credential.key, canonical_signed_info.as_bytes())?);

        let signature = format!(
            "<ds:Signature xmlns:ds=\"{DSIG_NS}\" Id=\"{SIGNATURE_ELEMENT_ID}\">{signed_info}\
             <ds:SignatureValue>{signature_value}</ds:SignatureValue>\
             <ds:KeyInfo><ds:X509Data><ds:X509Certificate>{}</ds:X509Certificate></ds:X509Data></ds:KeyInfo>\
             </ds:Signature>",
            Base64::encode_string(&credential.certificate_der),
        );
        let filled = format!("<ext:ExtensionContent>{signature}</ext:ExtensionContent>");

        tracing::debug!(
            digest = ?self.digest,
            bytes = canonical.len(),
            "document signed"
        );
        Ok(SignedXml {
            xml: xml.replacen(SIGNATURE_PLACEHOLDER, &filled, 1),
            mode: SignatureMode::Signed,
        })
    }
}

fn signed_info_xml(digest: DigestAlgorithm, digest_value: &str) -> String {
    format!(
        "<ds:SignedInfo>\
         <ds:CanonicalizationMethod Algorithm=\"{C14N_METHOD}\"></ds:CanonicalizationMethod>\
         <ds:SignatureMethod Algorithm=\"{}\"></ds:SignatureMethod>\
         <ds:Reference URI=\"\">\
         <ds:Transforms><ds:Transform Algorithm=\"{ENVELOPED_SIGNATURE}\"></ds:Transform></ds:Transforms>\
         <ds:DigestMethod Algorithm=\"{}\"></ds:DigestMethod>\
         <ds:DigestValue>{digest_value}</ds:DigestValue>\
         </ds:Reference>\
         </ds:SignedInfo>",
        digest.signature_uri(),
        digest.digest_uri(),
    )
}

/// Recompute the reference digest of a signed document and compare it
/// with its `ds:DigestValue`.
pub fn verify_digest(signed_xml: &str) -> Result<bool, CpeError> {
    let algorithm = find_attribute(signed_xml, "ds:DigestMethod", "Algorithm")?
        .and_then(|uri| DigestAlgorithm::from_digest_uri(&uri))
        .ok_or_else(|| CpeError::Signing("missing or unknown ds:DigestMethod".into()))?;
    let expected = find_text(signed_xml, "ds:DigestValue")?
        .ok_or_else(|| CpeError::Signing("missing ds:DigestValue".into()))?;

    let canonical = Canonicalizer::new()
        .exclude_element("ds:Signature")
        .canonicalize(signed_xml)?;
    let actual = Base64::encode_string(&algorithm.digest(canonical.as_bytes()));
    Ok(actual == expected.trim())
}

/// Check `ds:SignatureValue` over the canonical `ds:SignedInfo` with `key`.
pub fn verify_signature(signed_xml: &str, key: &RsaPublicKey) -> Result<bool, CpeError> {
    let algorithm = find_attribute(signed_xml, "ds:SignatureMethod", "Algorithm")?
        .and_then(|uri| DigestAlgorithm::from_signature_uri(&uri))
        .ok_or_else(|| CpeError::Signing("missing or unknown ds:SignatureMethod".into()))?;
    let value = find_text(signed_xml, "ds:SignatureValue")?
        .ok_or_else(|| CpeError::Signing("missing ds:SignatureValue".into()))?;
    let value: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    let signature = Base64::decode_vec(&value)
        .map_err(|e| CpeError::Signing(format!("invalid base64 signature: {e}")))?;

    let start = signed_xml
        .find("<ds:SignedInfo")
        .ok_or_else(|| CpeError::Signing("missing ds:SignedInfo".into()))?;
    let end = signed_xml[start..]
        .find("</ds:SignedInfo>")
        .map(|i| start + i + "</ds:SignedInfo>".len())
        .ok_or_else(|| CpeError::Signing("unterminated ds:SignedInfo".into()))?;

    let scope = in_scope_namespaces(signed_xml, "ds:Signature")?;
    let canonical = Canonicalizer::new()
        .inherit_namespaces(scope)
        .canonicalize(&signed_xml[start..end])?;
    Ok(algorithm.verify(key, canonical.as_bytes(), &signature))
}

fn find_text(xml: &str, qname: &str) -> Result<Option<String>, CpeError> {
    let mut reader = Reader::from_str(xml);
    let mut inside = false;
    let mut text = String::new();
    loop {
        match reader.read_event().map_err(|e| CpeError::Xml(e.to_string()))? {
            Event::Start(e) if e.name().as_ref() == qname.as_bytes() => inside = true,
            Event::Text(t) if inside => {
                text.push_str(&t.unescape().map_err(|e| CpeError::Xml(e.to_string()))?);
            }
            Event::End(e) if inside && e.name().as_ref() == qname.as_bytes() => {
                return Ok(Some(text));
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

fn find_attribute(xml: &str, qname: &str, attribute: &str) -> Result<Option<String>, CpeError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event().map_err(|e| CpeError::Xml(e.to_string()))? {
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == qname.as_bytes() => {
                return match e
                    .try_get_attribute(attribute)
                    .map_err(|e| CpeError::Xml(e.to_string()))?
                {
                    Some(attr) => Ok(Some(
                        attr.unescape_value()
                            .map_err(|e| CpeError::Xml(e.to_string()))?
                            .into_owned(),
                    )),
                    None => Ok(None),
                };
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}
