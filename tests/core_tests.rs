use chrono::NaiveDate;
use factura_pe::core::*;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn issuer() -> Company {
    CompanyBuilder::new("6", "20123456789", "ACME S.A.C.")
        .trade_name("ACME")
        .address("Av. Arequipa 123", "MIRAFLORES", "LIMA", "LIMA", "PE")
        .email("facturas@acme.pe")
        .build()
}

fn customer() -> Company {
    CompanyBuilder::new("6", "20987654321", "Cliente S.A.").build()
}

fn igv_line(qty: rust_decimal::Decimal, price: rust_decimal::Decimal) -> DocumentLine {
    LineBuilder::new(qty, "NIU", "Producto", price)
        .tax(TaxType::Igv, "10", dec!(18))
        .build()
}

// --- Totals ---

#[test]
fn single_line_totals() {
    let doc = DocumentBuilder::new(DocumentType::Factura, "F001", "1", date(2024, 3, 1))
        .issuer(issuer())
        .customer(customer())
        .add_line(igv_line(dec!(2), dec!(100)))
        .payment_terms("Contado", date(2024, 3, 1), dec!(236))
        .build()
        .unwrap();

    assert_eq!(doc.sub_total, dec!(200));
    assert_eq!(doc.total_taxes, dec!(36));
    assert_eq!(doc.total_amount, dec!(236));
    assert_eq!(doc.status, DocumentStatus::Draft);
    assert_eq!(doc.currency_code, "PEN");
    assert_eq!(doc.id(), "F001-1");
}

#[test]
fn mixed_tax_groups() {
    let doc = DocumentBuilder::new(DocumentType::Factura, "F001", "2", date(2024, 3, 1))
        .issuer(issuer())
        .customer(customer())
        .add_line(igv_line(dec!(1), dec!(50)))
        .add_line(igv_line(dec!(3), dec!(10)))
        .add_line(
            LineBuilder::new(dec!(1), "NIU", "Libro", dec!(40))
                .tax(TaxType::Igv, "20", dec!(0))
                .build(),
        )
        .add_line(
            LineBuilder::new(dec!(2), "NIU", "Bolsa plástica", dec!(0.10))
                .tax(TaxType::Igv, "10", dec!(18))
                .tax(TaxType::Icbper, "10", dec!(500))
                .build(),
        )
        .build_unchecked()
        .unwrap();

    let ids: Vec<_> = doc.lines.iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, ["1", "2", "3", "4"]);

    let line_sum: rust_decimal::Decimal = doc.lines.iter().map(|l| l.total_price).sum();
    let tax_sum: rust_decimal::Decimal = doc.lines.iter().map(|l| l.total_tax_amount().unwrap()).sum();
    assert_eq!(doc.sub_total, line_sum);
    assert_eq!(doc.total_taxes, tax_sum);
    assert_eq!(doc.total_amount, doc.sub_total + doc.total_taxes);

    let groups = tax_subtotals(&doc.lines).unwrap();
    let igv10 = groups
        .iter()
        .find(|g| g.tax_type == TaxType::Igv && g.code == "10")
        .unwrap();
    assert_eq!(igv10.taxable_amount, dec!(80.20));
    assert_eq!(igv10.tax_amount, dec!(14.436));
    assert!(groups.iter().any(|g| g.tax_type == TaxType::Igv && g.code == "20"));
    assert!(groups.iter().any(|g| g.tax_type == TaxType::Icbper));
}

#[test]
fn explicit_recalculation_after_edit() {
    let mut doc = DocumentBuilder::new(DocumentType::Factura, "F001", "3", date(2024, 3, 1))
        .issuer(issuer())
        .customer(customer())
        .add_line(igv_line(dec!(1), dec!(100)))
        .build_unchecked()
        .unwrap();

    doc.lines[0].taxes[0].rate = dec!(10);
    assert_eq!(doc.lines[0].taxes[0].amount, dec!(18));

    calculate_totals(&mut doc).unwrap();
    assert_eq!(doc.lines[0].taxes[0].amount, dec!(10));
    assert_eq!(doc.total_taxes, dec!(10));
    assert_eq!(doc.total_amount, dec!(110));
}

// --- Validation ---

#[test]
fn invalid_documents_report_every_problem() {
    let result = DocumentBuilder::new(DocumentType::Factura, "", "1", date(2024, 3, 1))
        .currency("soles")
        .issuer(CompanyBuilder::new("1", "12345678", "").build())
        .customer(CompanyBuilder::new("Z", "", "").build())
        .build();

    let Err(CpeError::Validation(message)) = result else {
        panic!("expected validation error");
    };
    for field in [
        "series",
        "currency_code",
        "issuer.document_type",
        "issuer.document_number",
        "issuer.name",
        "customer.document_type",
        "customer.document_number",
        "lines",
    ] {
        assert!(message.contains(field), "{field} missing in {message}");
    }
}

#[test]
fn due_date_before_issue_date() {
    let doc = DocumentBuilder::new(DocumentType::Factura, "F001", "1", date(2024, 3, 10))
        .due_date(date(2024, 3, 1))
        .issuer(issuer())
        .customer(customer())
        .add_line(igv_line(dec!(1), dec!(1)))
        .build_unchecked()
        .unwrap();
    let errors = validate_document(&doc);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "due_date");
}

#[test]
fn unknown_igv_affectation_code() {
    let doc = DocumentBuilder::new(DocumentType::Factura, "F001", "1", date(2024, 3, 1))
        .issuer(issuer())
        .customer(customer())
        .add_line(
            LineBuilder::new(dec!(1), "NIU", "X", dec!(1))
                .tax(TaxType::Igv, "99", dec!(18))
                .build(),
        )
        .build_unchecked()
        .unwrap();
    let errors = validate_document(&doc);
    assert!(errors.iter().any(|e| e.field == "lines[0].taxes[0].code"));
}

#[test]
fn missing_parties_fail_before_validation() {
    let err = DocumentBuilder::new(DocumentType::Boleta, "B001", "1", date(2024, 3, 1))
        .customer(customer())
        .build_unchecked()
        .unwrap_err();
    assert!(err.to_string().contains("issuer"));
}

// --- Requests ---

#[test]
fn request_from_json() {
    let json = r#"{
        "type": "07",
        "serie": "FC01",
        "number": "15",
        "issue_date": "2024-04-02",
        "issue_time": "10:30:00",
        "currency_code": "USD",
        "customer": {"document_type": "6", "document_number": "20987654321", "name": "Cliente S.A."},
        "lines": [{
            "quantity": "1",
            "unit_code": "ZZ",
            "description": "Descuento",
            "unit_price": "50.00",
            "taxes": [{"type": "IGV", "code": "10", "rate": "18"}]
        }],
        "related_documents": [{"document_type": "01", "series": "F001", "number": "1"}]
    }"#;
    let request: CreateDocumentRequest = serde_json::from_str(json).unwrap();
    let doc = create_document(&request, &issuer()).unwrap();

    assert_eq!(doc.document_type, DocumentType::NotaCredito);
    assert_eq!(doc.id(), "FC01-15");
    assert_eq!(doc.issue_time.format("%H:%M:%S").to_string(), "10:30:00");
    assert_eq!(doc.total_amount, dec!(59));
    assert_eq!(doc.related_documents[0].id(), "F001-1");
    assert_eq!(doc.issuer, issuer());
}

#[test]
fn request_with_bad_time() {
    let json = r#"{
        "type": "01", "serie": "F001", "number": "1",
        "issue_date": "2024-04-02", "issue_time": "25:00",
        "currency_code": "PEN",
        "customer": {"document_type": "6", "document_number": "20987654321", "name": "C"},
        "lines": []
    }"#;
    let request: CreateDocumentRequest = serde_json::from_str(json).unwrap();
    let err = create_document(&request, &issuer()).unwrap_err();
    assert!(matches!(err, CpeError::Validation(ref m) if m.contains("issue_time")));
}

#[test]
fn request_with_overflowing_amounts() {
    let json = r#"{
        "type": "01", "serie": "F001", "number": "1",
        "issue_date": "2024-04-02",
        "currency_code": "PEN",
        "customer": {"document_type": "6", "document_number": "20987654321", "name": "C"},
        "lines": [
            {"quantity": "1", "unit_code": "NIU", "description": "Ok", "unit_price": "10",
             "taxes": [{"type": "IGV", "code": "10", "rate": "18"}]},
            {"quantity": "79228162514264337593543950335", "unit_code": "NIU", "description": "x",
             "unit_price": "2", "taxes": [{"type": "IGV", "code": "10", "rate": "18"}]}
        ]
    }"#;
    let request: CreateDocumentRequest = serde_json::from_str(json).unwrap();
    let err = create_document(&request, &issuer()).unwrap_err();
    assert!(matches!(err, CpeError::Validation(ref m) if m.contains("lines[1].total_price")));
}

#[test]
fn document_totals_overflow() {
    let huge = rust_decimal::Decimal::MAX;
    let result = DocumentBuilder::new(DocumentType::Factura, "F001", "9", date(2024, 3, 1))
        .issuer(issuer())
        .customer(customer())
        .add_line(
            LineBuilder::new(dec!(1), "NIU", "A", huge)
                .tax(TaxType::Igv, "20", dec!(0))
                .build(),
        )
        .add_line(
            LineBuilder::new(dec!(1), "NIU", "B", huge)
                .tax(TaxType::Igv, "20", dec!(0))
                .build(),
        )
        .build_unchecked();
    assert!(matches!(result, Err(CpeError::Validation(ref m)) if m.contains("sub_total")));
}

// --- Types and naming ---

#[test]
fn document_type_capabilities() {
    assert!(DocumentType::Boleta.requires_ticket_flow());
    assert!(!DocumentType::Factura.requires_ticket_flow());
    assert_eq!(DocumentType::NotaDebito.ubl_schema(), UblSchema::DebitNote);
    assert!(DocumentType::NotaCredito.requires_related_document());
    assert!(DocumentType::Boleta.requires_payment_terms());
    assert_eq!(DocumentType::from_code("08"), Some(DocumentType::NotaDebito));
    assert_eq!(DocumentType::from_code("09"), None);
}

#[test]
fn file_names() {
    let name = FileName::new("20123456789", DocumentType::Boleta, "B001", "99");
    assert_eq!(name.xml(), "20123456789-03-B001-99.xml");
    assert_eq!(name.clone().with_suffix("1").zip(), "20123456789-03-B001-99-1.zip");
    assert_eq!(name.to_string(), "20123456789-03-B001-99");
}

#[test]
fn cdr_acceptance_codes() {
    let cdr = |code: &str| Cdr {
        response_code: code.into(),
        description: String::new(),
        notes: Vec::new(),
    };
    assert!(cdr("0").is_accepted());
    assert!(cdr("4252").is_accepted());
    assert!(!cdr("2335").is_accepted());
    assert!(!cdr("0100").is_accepted());
    assert!(!cdr("").is_accepted());
}

// --- Amount in words ---

#[test]
fn amount_legends() {
    assert_eq!(
        amount_in_words(dec!(1234.56), "PEN"),
        "MIL DOSCIENTOS TREINTA Y CUATRO CON 56/100 SOLES"
    );
    assert_eq!(amount_in_words(dec!(1), "PEN"), "UNO CON 00/100 SOL");
    assert_eq!(
        amount_in_words(dec!(21000.5), "USD"),
        "VEINTIUN MIL CON 50/100 DÓLARES AMERICANOS"
    );
    assert_eq!(amount_in_words(dec!(100), "EUR"), "CIEN CON 00/100 EUROS");
    assert_eq!(amount_in_words(dec!(0.999), "PEN"), "UNO CON 00/100 SOL");
    assert_eq!(
        amount_in_words(dec!(2500000), "PEN"),
        "2500000 CON 00/100 SOLES"
    );
}
