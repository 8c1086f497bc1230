use super::{rank, DocScore};
use crate::tinycore::error::{Error, Result};
use crate::tinycore::index::disk::DiskIndex;

pub const K1: f64 = 0.9;
pub const B: f64 = 0.4;

pub trait OkapiBm25 {
    fn rank_bm25(&mut self, terms: &[String], rsv: &mut Vec<f64>) -> Result<Vec<DocScore>>;
}

impl OkapiBm25 for DiskIndex {
    // The BM25 variant used here
    // for all query terms t: rsv[d] += ln(N/Nt) * ftd*(k1+1)/(ftd + k1*(1-b+b*(ld/lavg)))
    //   N: number of documents in the collection
    //   Nt: number of documents containing t
    //   ftd: frequency of t in document d
    //   ld: length of document d, lavg: average document length
    //   k1 = 0.9, b = 0.4
    fn rank_bm25(&mut self, terms: &[String], rsv: &mut Vec<f64>) -> Result<Vec<DocScore>> {
        let document_count = self.get_document_count();
        // the accumulator is reused across queries, the reset matters
        rsv.clear();
        rsv.resize(document_count, 0.0);
        let lavg = self.get_average_document_length();
        for term in terms {
            let postings = match self.postings(term)? {
                Some(postings) => postings,
                None => continue,
            };
            // a term found in every document has idf exactly zero and
            // cannot change the ranking
            if postings.len() == document_count {
                continue;
            }
            let idf = (document_count as f64 / postings.len() as f64).ln();
            for posting in &postings {
                let docid = posting.docid as usize;
                if docid >= document_count {
                    return Err(Error::CorruptIndex(format!(
                        "posting for \"{}\" references document {} of {}",
                        term, posting.docid, document_count
                    )));
                }
                let ld = self.get_document_length(posting.docid) as f64;
                let ftd = posting.tf as f64;
                rsv[docid] += idf * ftd * (K1 + 1.0) / (ftd + K1 * (1.0 - B + B * (ld / lavg)));
            }
        }
        Ok(rank(rsv))
    }
}
