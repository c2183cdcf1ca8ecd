use super::types::{Document, DocumentType};

/// SUNAT archive name: `{ruc}-{type}-{series}-{number}[-suffix]`.
///
/// The same stem names the XML inside the archive and the archive itself,
/// e.g. `20123456789-01-F001-123.xml` inside `20123456789-01-F001-123.zip`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileName {
    issuer_ruc: String,
    type_code: String,
    series: String,
    number: String,
    suffix: Option<String>,
}

impl FileName {
    pub fn new(
        issuer_ruc: impl Into<String>,
        document_type: DocumentType,
        series: impl Into<String>,
        number: impl Into<String>,
    ) -> Self {
        Self {
            issuer_ruc: issuer_ruc.into(),
            type_code: document_type.code().to_string(),
            series: series.into(),
            number: number.into(),
            suffix: None,
        }
    }

    /// Name for a document, using its issuer's RUC.
    pub fn for_document(doc: &Document) -> Self {
        Self::new(
            &doc.issuer.document_number,
            doc.document_type,
            &doc.series,
            &doc.number,
        )
    }

    /// Append a suffix, e.g. for summaries (`RC`) sent on the same day.
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    /// Name without extension.
    pub fn stem(&self) -> String {
        let mut s = format!(
            "{}-{}-{}-{}",
            self.issuer_ruc, self.type_code, self.series, self.number
        );
        if let Some(suffix) = &self.suffix {
            s.push('-');
            s.push_str(suffix);
        }
        s
    }

    pub fn xml(&self) -> String {
        format!("{}.xml", self.stem())
    }

    pub fn zip(&self) -> String {
        format!("{}.zip", self.stem())
    }
}

impl std::fmt::Display for FileName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.stem())
    }
}
