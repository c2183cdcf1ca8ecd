//! Reading the CDR (Constancia de Recepción) out of an ApplicationResponse.

use super::response::XmlElement;
use crate::core::{Cdr, CpeError};
use crate::package::unzip_single;

/// Unzip an ApplicationResponse archive and read its CDR.
pub fn read_cdr(zip: &[u8]) -> Result<Cdr, CpeError> {
    let (name, content) = unzip_single(zip)?;
    let xml = String::from_utf8(content)
        .map_err(|e| CpeError::Xml(format!("{name} is not UTF-8: {e}")))?;
    let cdr = parse_cdr_xml(&xml)?;
    tracing::debug!(file = %name, code = %cdr.response_code, "CDR read");
    Ok(cdr)
}

/// Extract `DocumentResponse/Response/{ResponseCode, Description}` and the
/// top-level `Note` elements of an ApplicationResponse document.
pub fn parse_cdr_xml(xml: &str) -> Result<Cdr, CpeError> {
    let root = XmlElement::parse(xml)?;
    if root.local != "ApplicationResponse" {
        return Err(CpeError::Xml(format!(
            "expected ApplicationResponse, got {}",
            root.local
        )));
    }

    let response = root
        .child("DocumentResponse")
        .and_then(|r| r.child("Response"))
        .ok_or_else(|| CpeError::Xml("CDR without DocumentResponse/Response".into()))?;
    let response_code = response
        .child_text("ResponseCode")
        .ok_or_else(|| CpeError::Xml("CDR without ResponseCode".into()))?
        .to_string();

    Ok(Cdr {
        response_code,
        description: response
            .child_text("Description")
            .unwrap_or_default()
            .to_string(),
        notes: root
            .children
            .iter()
            .filter(|c| c.local == "Note")
            .map(|c| c.text.trim().to_string())
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::zip_single;

    const CDR: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ar:ApplicationResponse xmlns:ar="urn:oasis:names:specification:ubl:schema:xsd:ApplicationResponse-2" xmlns:cac="urn:oasis:names:specification:ubl:schema:xsd:CommonAggregateComponents-2" xmlns:cbc="urn:oasis:names:specification:ubl:schema:xsd:CommonBasicComponents-2">
  <cbc:ID>171234567890</cbc:ID>
  <cbc:Note>4252 - El dato ingresado como atributo @listName es incorrecto.</cbc:Note>
  <cac:DocumentResponse>
    <cac:Response>
      <cbc:ReferenceID>F001-1</cbc:ReferenceID>
      <cbc:ResponseCode>0</cbc:ResponseCode>
      <cbc:Description>La Factura numero F001-1, ha sido aceptada</cbc:Description>
    </cac:Response>
  </cac:DocumentResponse>
</ar:ApplicationResponse>"#;

    #[test]
    fn reads_zipped_cdr() {
        let zip = zip_single("R-20123456789-01-F001-1.xml", CDR.as_bytes()).unwrap();
        let cdr = read_cdr(&zip).unwrap();
        assert_eq!(cdr.response_code, "0");
        assert_eq!(cdr.description, "La Factura numero F001-1, ha sido aceptada");
        assert_eq!(cdr.notes.len(), 1);
        assert!(cdr.notes[0].starts_with("4252"));
        assert!(cdr.is_accepted());
    }

    #[test]
    fn rejection_code() {
        let xml = CDR.replace(">0</cbc:ResponseCode>", ">2335</cbc:ResponseCode>");
        let cdr = parse_cdr_xml(&xml).unwrap();
        assert_eq!(cdr.response_code, "2335");
        assert!(!cdr.is_accepted());
    }

    #[test]
    fn not_a_cdr() {
        assert!(matches!(parse_cdr_xml("<Invoice/>"), Err(CpeError::Xml(_))));
        let without_code = "<ApplicationResponse><DocumentResponse><Response/></DocumentResponse></ApplicationResponse>";
        assert!(parse_cdr_xml(without_code).is_err());
    }
}
