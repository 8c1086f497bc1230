pub const MAX_TERM_BYTES: usize = 255;

// One-character-lookahead lexer over a single line of tagged text.
// Produces two kinds of token: tags ("<...>", including malformed ones
// that run to the end of the line) and maximal runs of alphanumerics
// and hyphens. Everything else is separator.
pub struct Lexer<'a> {
    line: &'a str,
    cursor: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(line: &'a str) -> Self {
        Lexer { line, cursor: 0 }
    }

    // tokens come back in original case and byte content, a borrowed
    // slice of the line
    pub fn next_token(&mut self) -> Option<&'a str> {
        let rest = &self.line[self.cursor..];
        let mut found = None;
        for (i, c) in rest.char_indices() {
            if c.is_alphanumeric() || c == '<' {
                found = Some((self.cursor + i, c));
                break;
            }
        }
        let (start, first) = match found {
            Some(found) => found,
            None => {
                self.cursor = self.line.len();
                return None;
            }
        };
        let end = if first == '<' {
            // a tag with no closing '>' swallows the rest of the line
            match self.line[start..].find('>') {
                Some(pos) => start + pos + 1,
                None => self.line.len(),
            }
        } else {
            let mut end = self.line.len();
            for (i, c) in self.line[start..].char_indices() {
                if !c.is_alphanumeric() && c != '-' {
                    end = start + i;
                    break;
                }
            }
            end
        };
        self.cursor = end;
        Some(&self.line[start..end])
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = &'a str;
    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

// lowercase, then clamp to the vocabulary's 255-byte term limit without
// splitting a multi-byte character
pub fn normalize(token: &str) -> String {
    let mut term = token.to_lowercase();
    if term.len() > MAX_TERM_BYTES {
        let mut cut = MAX_TERM_BYTES;
        while !term.is_char_boundary(cut) {
            cut -= 1;
        }
        term.truncate(cut);
    }
    term
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_and_punctuation() {
        let tokens: Vec<&str> = Lexer::new("Quarrel, sir! no; sir?").collect();
        assert_eq!(tokens, vec!["Quarrel", "sir", "no", "sir"]);
    }

    #[test]
    fn test_tags_and_words() {
        let tokens: Vec<&str> =
            Lexer::new("<DOC><DOCNO>WSJ870324-0001</DOCNO>John Blair</DOC>").collect();
        assert_eq!(
            tokens,
            vec!["<DOC>", "<DOCNO>", "WSJ870324-0001", "</DOCNO>", "John", "Blair", "</DOC>"]
        );
    }

    #[test]
    fn test_unterminated_tag_runs_to_end_of_line() {
        let tokens: Vec<&str> = Lexer::new("before <BAD attr=1 more").collect();
        assert_eq!(tokens, vec!["before", "<BAD attr=1 more"]);
    }

    #[test]
    fn test_hyphen_runs() {
        let tokens: Vec<&str> = Lexer::new("state-of-the-art x- -y").collect();
        assert_eq!(tokens, vec!["state-of-the-art", "x-", "y"]);
    }

    #[test]
    fn test_empty_line() {
        assert_eq!(Lexer::new("").next_token(), None);
        assert_eq!(Lexer::new("  .,;! ").next_token(), None);
    }

    #[test]
    fn test_unicode_words() {
        let tokens: Vec<&str> = Lexer::new("café au lait").collect();
        assert_eq!(tokens, vec!["café", "au", "lait"]);
    }

    #[test]
    fn test_normalize_folds_case() {
        assert_eq!(normalize("Apple"), "apple");
        assert_eq!(normalize("WSJ870324-0001"), "wsj870324-0001");
    }

    #[test]
    fn test_normalize_truncates_at_char_boundary() {
        let long = "a".repeat(300);
        assert_eq!(normalize(&long).len(), 255);
        // two bytes per character, 255 is never a boundary
        let wide = "é".repeat(200);
        let cut = normalize(&wide);
        assert_eq!(cut.len(), 254);
        assert!(cut.chars().all(|c| c == 'é'));
    }
}
