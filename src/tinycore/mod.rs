pub mod corpus;
pub mod error;
pub mod index;
pub mod lexer;
pub mod query;
pub mod ranking;
pub mod search;

pub type DocId = u32;
pub type TermFreq = u32;
