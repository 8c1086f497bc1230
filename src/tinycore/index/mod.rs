pub mod disk;

use crate::tinycore::lexer::{self, Lexer};
use crate::tinycore::{DocId, TermFreq};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub docid: DocId,
    pub tf: TermFreq,
}

// Finished in-memory index, ready to serialise. Postings for one term
// are strictly increasing in docid.
pub struct MemoryIndex {
    pub vocab: HashMap<String, Vec<Posting>>,
    pub doc_lengths: Vec<u32>,
    pub primary_keys: Vec<String>,
}

impl MemoryIndex {
    pub fn get_document_count(&self) -> usize {
        self.doc_lengths.len()
    }

    pub fn get_term_count(&self) -> usize {
        self.vocab.len()
    }
}

pub struct IndexBuilder {
    vocab: HashMap<String, Vec<Posting>>,
    doc_lengths: Vec<u32>,
    primary_keys: Vec<String>,
    // None until the first <DOC> tag is seen
    current_doc: Option<DocId>,
    doc_length: u32,
    capture_primary_key: bool,
}

impl IndexBuilder {
    pub fn new() -> Self {
        IndexBuilder {
            vocab: HashMap::new(),
            doc_lengths: Vec::new(),
            primary_keys: Vec::new(),
            current_doc: None,
            doc_length: 0,
            capture_primary_key: false,
        }
    }

    pub fn index_line(&mut self, line: &str) {
        for token in Lexer::new(line) {
            if token == "<DOC>" {
                let next = match self.current_doc {
                    Some(docid) => {
                        self.doc_lengths.push(self.doc_length);
                        docid + 1
                    }
                    None => 0,
                };
                self.current_doc = Some(next);
                self.doc_length = 0;
                if next > 0 && next % 1000 == 0 {
                    log::debug!("{} documents scanned", next);
                }
            }
            if token == "<DOCNO>" {
                self.capture_primary_key = true;
            } else if self.capture_primary_key {
                // the identifier is echoed on result lines, keep it verbatim
                self.primary_keys.push(token.to_string());
                self.capture_primary_key = false;
                continue;
            }
            if token.starts_with('<') {
                continue;
            }
            let docid = match self.current_doc {
                Some(docid) => docid,
                // tokens before the first <DOC> belong to no document
                None => continue,
            };
            let term = lexer::normalize(token);
            let postings = self.vocab.entry(term).or_insert_with(Vec::new);
            if postings.len() == 0 || postings.last().unwrap().docid != docid {
                postings.push(Posting { docid, tf: 1 });
            } else {
                postings.last_mut().unwrap().tf += 1;
            }
            self.doc_length += 1;
        }
    }

    pub fn finish(mut self) -> MemoryIndex {
        // the final document has no <DOC> tag after it to close it
        if self.current_doc.is_some() {
            self.doc_lengths.push(self.doc_length);
        }
        if self.doc_lengths.len() != self.primary_keys.len() {
            log::warn!(
                "{} documents but {} primary keys, collection tagging is inconsistent",
                self.doc_lengths.len(),
                self.primary_keys.len()
            );
        }
        MemoryIndex {
            vocab: self.vocab,
            doc_lengths: self.doc_lengths,
            primary_keys: self.primary_keys,
        }
    }
}
