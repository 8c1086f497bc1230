pub mod bm25;

use crate::tinycore::DocId;

pub const MAX_RESULTS: usize = 1000;

pub struct DocScore {
    pub docid: DocId,
    pub score: f64,
}

// Order documents by descending score, ties broken by the larger docid
// first, a strict total order. Zero-score documents are never emitted
// and output stops after MAX_RESULTS rows.
pub fn rank(rsv: &[f64]) -> Vec<DocScore> {
    let mut order: Vec<DocId> = (0..rsv.len() as DocId).collect();
    order.sort_unstable_by(|&a, &b| {
        rsv[b as usize]
            .total_cmp(&rsv[a as usize])
            .then(b.cmp(&a))
    });
    let mut results = Vec::new();
    for &docid in order.iter().take(MAX_RESULTS) {
        let score = rsv[docid as usize];
        if score == 0.0 {
            break;
        }
        results.push(DocScore { docid, score });
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orders_by_descending_score() {
        let rsv = [0.5, 2.0, 1.0];
        let docids: Vec<DocId> = rank(&rsv).iter().map(|r| r.docid).collect();
        assert_eq!(docids, vec![1, 2, 0]);
    }

    #[test]
    fn test_ties_break_to_larger_docid() {
        let rsv = [1.0, 1.0, 1.0];
        let docids: Vec<DocId> = rank(&rsv).iter().map(|r| r.docid).collect();
        assert_eq!(docids, vec![2, 1, 0]);
    }

    #[test]
    fn test_zero_scores_not_emitted() {
        let rsv = [0.0, 1.0, 0.0];
        let results = rank(&rsv);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].docid, 1);
    }

    #[test]
    fn test_cutoff_at_max_results() {
        let rsv = vec![1.0; MAX_RESULTS + 500];
        assert_eq!(rank(&rsv).len(), MAX_RESULTS);
    }

    #[test]
    fn test_empty() {
        assert!(rank(&[]).is_empty());
    }
}
