use crate::tinycore::lexer;

#[derive(Debug)]
pub struct Query {
    pub id: u64,
    pub terms: Vec<String>,
}

impl Query {
    // the first whitespace token is the query id when the whole token
    // parses as an unsigned integer, otherwise the id is 0 and the
    // token is scored as a term
    pub fn parse(line: &str) -> Self {
        let mut id = 0u64;
        let mut tokens = line.split_whitespace().peekable();
        if let Some(first) = tokens.peek() {
            if let Ok(parsed) = first.parse::<u64>() {
                id = parsed;
                tokens.next();
            }
        }
        let terms = tokens.map(lexer::normalize).collect();
        Query { id, terms }
    }
}
