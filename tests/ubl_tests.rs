#![cfg(feature = "ubl")]

use chrono::{NaiveDate, NaiveTime};
use factura_pe::core::*;
use factura_pe::ubl;
use quick_xml::Reader;
use quick_xml::events::Event;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn issuer() -> Company {
    CompanyBuilder::new("6", "20123456789", "ACME S.A.C.")
        .trade_name("ACME")
        .address("Av. Arequipa 123", "MIRAFLORES", "LIMA", "LIMA", "PE")
        .phone("+51 1 4445555")
        .build()
}

fn builder(document_type: DocumentType, series: &str) -> DocumentBuilder {
    DocumentBuilder::new(document_type, series, "123", date(2024, 3, 1))
        .issue_time(NaiveTime::from_hms_opt(9, 15, 0).unwrap())
        .issuer(issuer())
        .customer(CompanyBuilder::new("1", "45678912", "Juan Pérez & Hijos").build())
        .add_line(
            LineBuilder::new(dec!(2), "NIU", "Producto", dec!(100))
                .tax(TaxType::Igv, "10", dec!(18))
                .product_code("P-001")
                .build(),
        )
}

fn factura() -> Document {
    builder(DocumentType::Factura, "F001")
        .due_date(date(2024, 3, 31))
        .payment_terms("Credito", date(2024, 3, 31), dec!(236))
        .build()
        .unwrap()
}

/// Local names of the root's direct children, in order.
fn top_level_elements(xml: &str) -> Vec<String> {
    let mut reader = Reader::from_str(xml);
    let mut depth = 0;
    let mut names = Vec::new();
    loop {
        match reader.read_event().unwrap() {
            Event::Start(e) => {
                depth += 1;
                if depth == 2 {
                    names.push(String::from_utf8(e.name().as_ref().to_vec()).unwrap());
                }
            }
            Event::Empty(e) if depth == 1 => {
                names.push(String::from_utf8(e.name().as_ref().to_vec()).unwrap());
            }
            Event::End(_) => depth -= 1,
            Event::Eof => break,
            _ => {}
        }
    }
    names
}

#[test]
fn invoice_structure() {
    let doc = factura();
    let xml = ubl::to_xml(&doc, &doc.issuer).unwrap();

    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(xml.contains(&format!("xmlns=\"{}\"", ubl::ns::INVOICE)));
    assert!(xml.contains(&format!("xmlns:ext=\"{}\"", ubl::ns::EXT)));
    assert_eq!(xml.matches(ubl::SIGNATURE_PLACEHOLDER).count(), 1);

    assert_eq!(
        top_level_elements(&xml),
        [
            "ext:UBLExtensions",
            "cbc:UBLVersionID",
            "cbc:CustomizationID",
            "cbc:ID",
            "cbc:IssueDate",
            "cbc:IssueTime",
            "cbc:DueDate",
            "cbc:InvoiceTypeCode",
            "cbc:Note",
            "cbc:DocumentCurrencyCode",
            "cac:Signature",
            "cac:AccountingSupplierParty",
            "cac:AccountingCustomerParty",
            "cac:PaymentTerms",
            "cac:TaxTotal",
            "cac:LegalMonetaryTotal",
            "cac:InvoiceLine",
        ]
    );
}

#[test]
fn invoice_values() {
    let doc = factura();
    let xml = ubl::to_xml(&doc, &doc.issuer).unwrap();

    assert!(xml.contains("<cbc:UBLVersionID>2.1</cbc:UBLVersionID>"));
    assert!(xml.contains("<cbc:CustomizationID>2.0</cbc:CustomizationID>"));
    assert!(xml.contains("<cbc:ID>F001-123</cbc:ID>"));
    assert!(xml.contains("<cbc:IssueDate>2024-03-01</cbc:IssueDate>"));
    assert!(xml.contains("<cbc:IssueTime>09:15:00</cbc:IssueTime>"));
    assert!(xml.contains(
        "<cbc:InvoiceTypeCode listAgencyName=\"PE:SUNAT\" listName=\"Tipo de Documento\" \
         listURI=\"urn:pe:gob:sunat:cpe:see:gem:catalogos:catalogo01\">01</cbc:InvoiceTypeCode>"
    ));
    assert!(xml.contains(
        "<cbc:Note languageLocaleID=\"1000\">DOSCIENTOS TREINTA Y SEIS CON 00/100 SOLES</cbc:Note>"
    ));
    assert!(xml.contains("<cbc:PaymentMeansID>Credito</cbc:PaymentMeansID>"));
    assert!(xml.contains("<cbc:PayableAmount currencyID=\"PEN\">236.00</cbc:PayableAmount>"));
    assert!(xml.contains("<cbc:InvoicedQuantity unitCode=\"NIU\">2.00</cbc:InvoicedQuantity>"));
    // 100 * 1.18
    assert!(xml.contains("<cbc:PriceAmount currencyID=\"PEN\">118.00</cbc:PriceAmount>"));
    assert!(xml.contains("<cbc:PriceTypeCode>01</cbc:PriceTypeCode>"));
    assert!(xml.contains("<cbc:URI>#SignatureST</cbc:URI>"));
    assert!(xml.contains("<cbc:ID>IDSignST</cbc:ID>"));
    assert!(xml.contains("<cbc:AddressTypeCode>0000</cbc:AddressTypeCode>"));
    assert!(xml.contains("<cbc:Telephone>+51 1 4445555</cbc:Telephone>"));
    assert!(xml.contains("Juan Pérez &amp; Hijos"));
    assert!(xml.contains("<cbc:ID>P-001</cbc:ID>"));
}

#[test]
fn boleta_uses_invoice_schema() {
    let doc = builder(DocumentType::Boleta, "B001")
        .payment_terms("Contado", date(2024, 3, 1), dec!(236))
        .build()
        .unwrap();
    let xml = ubl::to_xml(&doc, &doc.issuer).unwrap();
    assert!(xml.contains("<Invoice xmlns="));
    assert!(xml.contains(">03</cbc:InvoiceTypeCode>"));
    assert!(!xml.contains("cbc:DueDate"));
}

#[test]
fn invoice_requires_payment_terms() {
    let doc = builder(DocumentType::Factura, "F001").build().unwrap();
    let err = ubl::to_xml(&doc, &doc.issuer).unwrap_err();
    assert!(matches!(err, CpeError::Validation(ref m) if m.contains("payment_terms")));

    let doc = builder(DocumentType::Factura, "F001")
        .payment_terms("  ", date(2024, 3, 1), dec!(236))
        .build()
        .unwrap();
    assert!(matches!(
        ubl::to_xml(&doc, &doc.issuer),
        Err(CpeError::Validation(_))
    ));
}

#[test]
fn credit_note() {
    let doc = builder(DocumentType::NotaCredito, "FC01")
        .related_document(DocumentType::Factura, "F001", "100")
        .related_document(DocumentType::Factura, "F001", "101")
        .build()
        .unwrap();
    let xml = ubl::to_xml(&doc, &doc.issuer).unwrap();

    assert!(xml.contains(&format!("<CreditNote xmlns=\"{}\"", ubl::ns::CREDIT_NOTE)));
    assert!(xml.contains("<cbc:ReferenceID>F001-100</cbc:ReferenceID>"));
    assert!(xml.contains("<cbc:ResponseCode>01</cbc:ResponseCode>"));
    assert!(xml.contains("<cbc:Description>Anulación de la operación</cbc:Description>"));
    assert_eq!(xml.matches("<cac:BillingReference>").count(), 2);
    assert!(xml.contains("<cbc:CreditedQuantity unitCode=\"NIU\">2.00</cbc:CreditedQuantity>"));
    assert!(xml.contains("<cac:LegalMonetaryTotal>"));
    assert!(!xml.contains("cac:PaymentTerms"));
    assert!(!xml.contains("cbc:InvoiceTypeCode"));

    let elements = top_level_elements(&xml);
    let pos = |name: &str| elements.iter().position(|e| e == name).unwrap();
    assert!(pos("cac:DiscrepancyResponse") < pos("cac:BillingReference"));
    assert!(pos("cac:BillingReference") < pos("cac:Signature"));
}

#[test]
fn debit_note() {
    let doc = builder(DocumentType::NotaDebito, "FD01")
        .related_document(DocumentType::Factura, "F001", "100")
        .build()
        .unwrap();
    let xml = ubl::to_debit_note_xml(&doc, &doc.issuer).unwrap();

    assert!(xml.contains(&format!("<DebitNote xmlns=\"{}\"", ubl::ns::DEBIT_NOTE)));
    assert!(xml.contains("<cbc:ResponseCode>02</cbc:ResponseCode>"));
    assert!(xml.contains("<cac:RequestedMonetaryTotal>"));
    assert!(xml.contains("<cbc:DebitedQuantity unitCode=\"NIU\">"));
    assert!(xml.contains("<cac:DebitNoteLine>"));
}

#[test]
fn note_requires_related_document() {
    let doc = builder(DocumentType::NotaCredito, "FC01").build().unwrap();
    let err = ubl::to_xml(&doc, &doc.issuer).unwrap_err();
    assert!(matches!(err, CpeError::Validation(ref m) if m.contains("related_documents")));
}

#[test]
fn tax_total_groups_by_type_and_code() {
    let doc = builder(DocumentType::Factura, "F001")
        .add_line(
            LineBuilder::new(dec!(1), "NIU", "Exonerado", dec!(50))
                .tax(TaxType::Igv, "20", dec!(0))
                .build(),
        )
        .add_line(
            LineBuilder::new(dec!(1), "NIU", "Otro gravado", dec!(10))
                .tax(TaxType::Igv, "10", dec!(18))
                .build(),
        )
        .payment_terms("Contado", date(2024, 3, 1), dec!(297.80))
        .build()
        .unwrap();
    let xml = ubl::to_xml(&doc, &doc.issuer).unwrap();

    // Document level: groups (IGV,10) and (IGV,20). Lines: one each.
    assert_eq!(xml.matches("<cac:TaxSubtotal>").count(), 2 + 3);
    assert!(xml.contains("<cbc:TaxableAmount currencyID=\"PEN\">210.00</cbc:TaxableAmount>"));
    assert!(xml.contains("<cbc:TaxAmount currencyID=\"PEN\">37.80</cbc:TaxAmount>"));
    assert!(xml.contains("<cbc:TaxableAmount currencyID=\"PEN\">50.00</cbc:TaxableAmount>"));
}

#[test]
fn output_is_deterministic() {
    let doc = factura();
    assert_eq!(
        ubl::to_xml(&doc, &doc.issuer).unwrap(),
        ubl::to_xml(&doc, &doc.issuer).unwrap()
    );
}
