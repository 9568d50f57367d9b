//! Typed records sent to the search backend.

use serde::Serialize;

/// A snippet read from disk, ready to be indexed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    pub id: String,
    pub text: String,
    pub document_id: String,
    pub lemma: Option<String>,
}

impl Snippet {
    pub fn record(&self) -> SnippetRecord<'_> {
        SnippetRecord {
            text: &self.text,
            document: &self.document_id,
            lemma: self.lemma.as_deref(),
        }
    }
}

/// A document synthesized from every snippet sharing its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    /// Snippet identifiers in natural order.
    pub sub: Vec<String>,
}

impl Document {
    pub fn record(&self) -> DocumentRecord<'_> {
        DocumentRecord { sub: &self.sub }
    }
}

/// Body of a `snippets` index operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnippetRecord<'a> {
    pub text: &'a str,
    pub document: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lemma: Option<&'a str>,
}

/// Body of a `documents` index operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentRecord<'a> {
    pub sub: &'a [String],
}

/// `{"index": {"_id": ...}}` line preceding each bulk body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkOperationHeader<'a> {
    pub index: IndexAction<'a>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexAction<'a> {
    #[serde(rename = "_id")]
    pub id: &'a str,
}

impl<'a> BulkOperationHeader<'a> {
    pub fn index(id: &'a str) -> Self {
        Self {
            index: IndexAction { id },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn snippet_record_omits_absent_lemma() {
        let snippet = Snippet {
            id: "a_paragraph_1".to_string(),
            text: "de kat zat".to_string(),
            document_id: "a".to_string(),
            lemma: None,
        };
        let value = serde_json::to_value(snippet.record()).unwrap();
        assert_eq!(value, json!({"text": "de kat zat", "document": "a"}));
    }

    #[test]
    fn snippet_record_includes_lemma_when_present() {
        let snippet = Snippet {
            id: "a_paragraph_1".to_string(),
            text: "de katten zaten".to_string(),
            document_id: "a".to_string(),
            lemma: Some("de kat zitten".to_string()),
        };
        let value = serde_json::to_value(snippet.record()).unwrap();
        assert_eq!(
            value,
            json!({"text": "de katten zaten", "document": "a", "lemma": "de kat zitten"})
        );
    }

    #[test]
    fn document_record_and_header_shapes() {
        let document = Document {
            id: "a".to_string(),
            sub: vec!["a_paragraph_1".to_string(), "a_paragraph_2".to_string()],
        };
        assert_eq!(
            serde_json::to_string(&document.record()).unwrap(),
            r#"{"sub":["a_paragraph_1","a_paragraph_2"]}"#
        );
        assert_eq!(
            serde_json::to_string(&BulkOperationHeader::index("a")).unwrap(),
            r#"{"index":{"_id":"a"}}"#
        );
    }
}
