use crate::tinycore::error::Result;
use crate::tinycore::index::disk::DiskIndex;
use crate::tinycore::query::Query;
use crate::tinycore::ranking::bm25::OkapiBm25;
use crate::tinycore::ranking::DocScore;
use std::io::Write;
use std::path::Path;

pub const RUN_NAME: &str = "JASSjr";

pub struct SearchResults {
    pub query_id: u64,
    pub hits: Vec<DocScore>,
}

pub struct SearchEngine {
    index: DiskIndex,
    // rsv accumulator, one slot per document, reused across queries
    rsv: Vec<f64>,
}

impl SearchEngine {
    pub fn open(dir: &Path) -> Result<Self> {
        let index = DiskIndex::open(dir)?;
        let rsv = vec![0.0; index.get_document_count()];
        Ok(SearchEngine { index, rsv })
    }

    pub fn get_document_count(&self) -> usize {
        self.index.get_document_count()
    }

    pub fn search(&mut self, line: &str) -> Result<SearchResults> {
        let query = Query::parse(line);
        if query.terms.is_empty() {
            log::warn!("query {} has no terms", query.id);
        }
        let hits = self.index.rank_bm25(&query.terms, &mut self.rsv)?;
        log::debug!("query {}: {} hits", query.id, hits.len());
        Ok(SearchResults {
            query_id: query.id,
            hits,
        })
    }

    // one TREC run line per hit, rank is 1-based
    pub fn write_results(&self, results: &SearchResults, out: &mut impl Write) -> Result<()> {
        for (rank, hit) in results.hits.iter().enumerate() {
            writeln!(
                out,
                "{} Q0 {} {} {:.4} {}",
                results.query_id,
                self.index.get_primary_key(hit.docid),
                rank + 1,
                hit.score,
                RUN_NAME
            )?;
        }
        Ok(())
    }
}
