//! Build a factura, sign it and write the signed XML and its ZIP to the
//! current directory.
//!
//! ```sh
//! cargo run --example sign_and_package -- tests/fixtures/signing_key.pem tests/fixtures/signing_cert.pem
//! ```
//!
//! Without arguments the document is produced in unsigned test mode.

use chrono::NaiveDate;
use factura_pe::core::*;
use factura_pe::package::zip_single;
use factura_pe::signature::{Signer, SigningCredential, verify_digest};
use factura_pe::ubl;
use rust_decimal_macros::dec;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let signer = match args.as_slice() {
        [key, cert] => Signer::new(SigningCredential::from_files(key, cert)?),
        [] => Signer::unsigned_test_mode(),
        _ => return Err("usage: sign_and_package [KEY CERT]".into()),
    };

    let issue = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
    let issuer = CompanyBuilder::new("6", "20123456789", "ACME S.A.C.")
        .trade_name("ACME")
        .address("Av. Larco 123", "Miraflores", "Lima", "Lima", "PE")
        .build();
    let doc = DocumentBuilder::new(DocumentType::Factura, "F001", "123", issue)
        .issuer(issuer.clone())
        .customer(CompanyBuilder::new("6", "20987654321", "Cliente S.A.").build())
        .add_line(
            LineBuilder::new(dec!(10), "NIU", "Teclado mecánico", dec!(150))
                .tax(TaxType::Igv, "10", dec!(18))
                .product_code("TEC-001")
                .build(),
        )
        .add_line(
            LineBuilder::new(dec!(2), "ZZ", "Instalación", dec!(50))
                .tax(TaxType::Igv, "10", dec!(18))
                .build(),
        )
        .payment_terms("Contado", issue, dec!(1888))
        .build()?;

    println!("{} total {} {}", doc.id(), doc.total_amount, doc.currency_code);
    println!("{}", amount_in_words(doc.total_amount, &doc.currency_code));

    let xml = ubl::to_xml(&doc, &issuer)?;
    let signed = signer.sign(&xml)?;
    if signed.mode == SignatureMode::Signed {
        println!("digest verified: {}", verify_digest(&signed.xml)?);
    }

    let name = FileName::for_document(&doc);
    std::fs::write(name.xml(), &signed.xml)?;
    std::fs::write(name.zip(), zip_single(&name.xml(), signed.xml.as_bytes())?)?;
    println!("wrote {} and {}", name.xml(), name.zip());

    Ok(())
}
