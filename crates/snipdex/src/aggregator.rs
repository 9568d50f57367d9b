//! Groups snippet identifiers by parent document.
//!
//! A document is only complete once the whole snippet stream has been read
//! (fragments may arrive in any order, with gaps), so the full
//! document → identifiers map stays in memory until [`DocumentAggregator::finalize`].
//! Memory grows with the number of distinct documents times their fragment count.

use std::collections::{HashMap, HashSet};

use crate::{
    natural_key::{natural_key, sort_natural},
    records::{Document, Snippet},
};

#[derive(Debug, Default)]
pub struct DocumentAggregator {
    documents: HashMap<String, HashSet<String>>,
}

impl DocumentAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, snippet: &Snippet) {
        self.observe_id(&snippet.document_id, &snippet.id);
    }

    /// Record `snippet_id` under `document_id`; repeated ids are kept once.
    pub fn observe_id(&mut self, document_id: &str, snippet_id: &str) {
        if let Some(members) = self.documents.get_mut(document_id) {
            if !members.contains(snippet_id) {
                members.insert(snippet_id.to_string());
            }
            return;
        }
        self.documents
            .entry(document_id.to_string())
            .or_default()
            .insert(snippet_id.to_string());
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Distinct snippet identifiers seen so far.
    pub fn snippet_count(&self) -> usize {
        self.documents.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Consume the aggregator into documents with naturally ordered `sub` lists.
    ///
    /// Documents themselves come out in natural order of their ids so that
    /// repeated runs over the same input submit identical batches.
    pub fn finalize(self) -> Vec<Document> {
        let mut documents: Vec<Document> = self
            .documents
            .into_iter()
            .map(|(id, members)| {
                let mut sub: Vec<String> = members.into_iter().collect();
                sort_natural(&mut sub);
                Document { id, sub }
            })
            .collect();
        documents.sort_by_cached_key(|document| (natural_key(&document.id), document.id.clone()));
        documents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_and_orders_fragments_naturally() {
        let mut aggregator = DocumentAggregator::new();
        for fragment in [10, 2, 1, 11, 9] {
            aggregator.observe_id("doc", &format!("doc_paragraph_{fragment}"));
        }
        aggregator.observe_id("other", "other_paragraph_1");

        let documents = aggregator.finalize();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].id, "doc");
        assert_eq!(
            documents[0].sub,
            vec![
                "doc_paragraph_1",
                "doc_paragraph_2",
                "doc_paragraph_9",
                "doc_paragraph_10",
                "doc_paragraph_11",
            ]
        );
        assert_eq!(documents[1].sub, vec!["other_paragraph_1"]);
    }

    #[test]
    fn duplicate_identifiers_are_kept_once() {
        let mut aggregator = DocumentAggregator::new();
        aggregator.observe_id("a", "a_paragraph_1");
        aggregator.observe_id("a", "a_paragraph_1");
        aggregator.observe_id("a", "a_paragraph_2");

        assert_eq!(aggregator.document_count(), 1);
        assert_eq!(aggregator.snippet_count(), 2);
        assert_eq!(
            aggregator.finalize()[0].sub,
            vec!["a_paragraph_1", "a_paragraph_2"]
        );
    }

    #[test]
    fn observe_uses_snippet_document_id() {
        let mut aggregator = DocumentAggregator::new();
        aggregator.observe(&Snippet {
            id: "b_paragraph_1".to_string(),
            text: String::new(),
            document_id: "b".to_string(),
            lemma: None,
        });
        let documents = aggregator.finalize();
        assert_eq!(documents[0].id, "b");
        assert_eq!(documents[0].sub, vec!["b_paragraph_1"]);
    }

    #[test]
    fn documents_come_out_in_natural_id_order() {
        let mut aggregator = DocumentAggregator::new();
        for document in ["doc10", "doc2", "doc1"] {
            aggregator.observe_id(document, &format!("{document}_paragraph_1"));
        }
        let ids: Vec<String> = aggregator.finalize().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["doc1", "doc2", "doc10"]);
    }

    #[test]
    fn empty_aggregator_finalizes_to_nothing() {
        let aggregator = DocumentAggregator::new();
        assert!(aggregator.is_empty());
        assert!(aggregator.finalize().is_empty());
    }
}
