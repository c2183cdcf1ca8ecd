//! Enveloped XML digital signature for UBL documents.
//!
//! [`Signer::sign`] canonicalizes the rendered document, digests it, signs
//! the canonical `ds:SignedInfo` with the issuer's RSA key and places the
//! `ds:Signature` element in the empty `ext:ExtensionContent` slot.
//!
//! ```no_run
//! use factura_pe::signature::{Signer, SigningCredential};
//!
//! let credential = SigningCredential::from_files("key.pem", "cert.pem").unwrap();
//! let signed = Signer::new(credential).sign("<Invoice>...</Invoice>").unwrap();
//! println!("{}", signed.xml);
//! ```

mod c14n;
mod signer;

pub use c14n::{Canonicalizer, canonicalize, in_scope_namespaces};
pub use signer::{
    C14N_METHOD, DSIG_NS, DigestAlgorithm, ENVELOPED_SIGNATURE, SIGNATURE_ELEMENT_ID, SignedXml,
    Signer, SigningCredential, verify_digest, verify_signature,
};
