use std::path::{Path, PathBuf};

use crate::error::{IndexerError, IndexerResult};

/// Separator between the document id and the fragment id of a snippet identifier.
pub const SEPARATOR: &str = "_paragraph_";

/// A parsed `<documentId>_paragraph_<fragmentId>` identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnippetIdentity {
    pub id: String,
    pub document_id: String,
    pub fragment_id: String,
}

impl SnippetIdentity {
    /// Parses one identifier; `line` is only used for error reporting.
    ///
    /// The split happens at the first separator, so the fragment id may itself
    /// contain `_paragraph_` and is kept verbatim.
    pub fn parse(identifier: &str, line: usize) -> IndexerResult<Self> {
        let (document_id, fragment_id) =
            identifier
                .split_once(SEPARATOR)
                .ok_or_else(|| IndexerError::MalformedIdentifier {
                    line,
                    identifier: identifier.to_string(),
                })?;
        Ok(Self {
            id: identifier.to_string(),
            document_id: document_id.to_string(),
            fragment_id: fragment_id.to_string(),
        })
    }

    /// `<base>/<documentId>/paragraph_<fragmentId>.txt`
    pub fn text_path(&self, base: &Path) -> PathBuf {
        base.join(&self.document_id)
            .join(format!("paragraph_{}.txt", self.fragment_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_first_separator() {
        let identity = SnippetIdentity::parse("doc_a_paragraph_3_paragraph_x", 1).unwrap();
        assert_eq!(identity.document_id, "doc_a");
        assert_eq!(identity.fragment_id, "3_paragraph_x");
        assert_eq!(identity.id, "doc_a_paragraph_3_paragraph_x");
    }

    #[test]
    fn fragment_id_is_not_required_to_be_numeric() {
        let identity = SnippetIdentity::parse("report_paragraph_12b", 1).unwrap();
        assert_eq!(identity.fragment_id, "12b");
        assert_eq!(
            identity.text_path(Path::new("/corpus")),
            PathBuf::from("/corpus/report/paragraph_12b.txt")
        );
    }

    #[test]
    fn empty_parts_are_kept_verbatim() {
        let identity = SnippetIdentity::parse("_paragraph_", 1).unwrap();
        assert_eq!(identity.document_id, "");
        assert_eq!(identity.fragment_id, "");
    }

    #[test]
    fn missing_separator_is_malformed() {
        let err = SnippetIdentity::parse("report-paragraph-1", 42).unwrap_err();
        match err {
            IndexerError::MalformedIdentifier { line, identifier } => {
                assert_eq!(line, 42);
                assert_eq!(identifier, "report-paragraph-1");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
