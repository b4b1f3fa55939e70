//! Naive, language-agnostic line classification.
//!
//! Each source line is split into comment, string, keyword and plain spans. There is
//! no grammar here: a comment marker claims the rest of the line, quoted spans are
//! matched on the same line only, and keywords are whole words from a fixed list.
//!
//! An unterminated quote (`print("oops`) does not open a string; the quote and
//! everything after it stay plain text.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Style category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenCategory {
    Comment,
    String,
    Keyword,
    Plain,
}

/// A classified slice of a single source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub category: TokenCategory,
}

/// Settings for the tokenizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntaxConfig {
    /// Marker that starts a line comment. Empty string disables comment detection.
    pub comment_marker: String,
    /// Words highlighted as keywords, matched on word boundaries.
    pub keywords: Vec<String>,
}

impl Default for SyntaxConfig {
    fn default() -> Self {
        SyntaxConfig {
            comment_marker: "//".to_string(),
            keywords: [
                "function", "return", "const", "let", "var", "if", "else", "for", "while",
                "import", "export", "from", "class", "new", "this",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
        }
    }
}

/// Compiled classifier for source lines.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    comment_marker: String,
    strings: Regex,
    keywords: Option<Regex>,
}

impl Tokenizer {
    pub fn new(config: &SyntaxConfig) -> Result<Tokenizer, regex::Error> {
        // one alternative per delimiter stands in for a back-referenced closing quote
        let strings = Regex::new(r#"'[^']*'|"[^"]*"|`[^`]*`"#)?;

        let words: Vec<String> = config
            .keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(regex::escape)
            .collect();
        let keywords = if words.is_empty() {
            None
        } else {
            Some(Regex::new(&format!(r"\b(?:{})\b", words.join("|")))?)
        };

        Ok(Tokenizer {
            comment_marker: config.comment_marker.clone(),
            strings,
            keywords,
        })
    }

    /// Split a line into ordered, non-overlapping tokens that cover it exactly.
    ///
    /// An empty line yields no tokens.
    pub fn tokenize<'a>(&self, line: &'a str) -> Vec<Token<'a>> {
        let (code, comment) = match self.comment_start(line) {
            Some(start) => (&line[..start], Some(&line[start..])),
            None => (line, None),
        };

        let mut claimed: Vec<(usize, usize, TokenCategory)> = self
            .strings
            .find_iter(code)
            .map(|m| (m.start(), m.end(), TokenCategory::String))
            .collect();

        if let Some(keywords) = &self.keywords {
            let strings_end = claimed.len();
            for m in keywords.find_iter(code) {
                let inside_string = claimed[..strings_end]
                    .iter()
                    .any(|&(start, end, _)| m.start() < end && start < m.end());
                if !inside_string {
                    claimed.push((m.start(), m.end(), TokenCategory::Keyword));
                }
            }
        }
        claimed.sort_by_key(|&(start, _, _)| start);

        let mut tokens = Vec::with_capacity(claimed.len() * 2 + 2);
        let mut cursor = 0;
        for (start, end, category) in claimed {
            if start > cursor {
                tokens.push(Token {
                    text: &code[cursor..start],
                    category: TokenCategory::Plain,
                });
            }
            tokens.push(Token {
                text: &code[start..end],
                category,
            });
            cursor = end;
        }
        if cursor < code.len() {
            tokens.push(Token {
                text: &code[cursor..],
                category: TokenCategory::Plain,
            });
        }

        if let Some(comment) = comment {
            tokens.push(Token {
                text: comment,
                category: TokenCategory::Comment,
            });
        }
        tokens
    }

    fn comment_start(&self, line: &str) -> Option<usize> {
        if self.comment_marker.is_empty() {
            None
        } else {
            line.find(self.comment_marker.as_str())
        }
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        // the built-in patterns are static and known to compile
        Tokenizer::new(&SyntaxConfig::default()).expect("default syntax compiles")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TokenCategory::*;

    fn classify(line: &str) -> Vec<(&str, TokenCategory)> {
        Tokenizer::default()
            .tokenize(line)
            .into_iter()
            .map(|t| (t.text, t.category))
            .collect()
    }

    fn assert_covers(line: &str) {
        let tokens = Tokenizer::default().tokenize(line);
        let joined = tokens.iter().map(|t| t.text).collect::<Vec<_>>().concat();
        assert_eq!(joined, line);
        assert!(tokens.iter().all(|t| !t.text.is_empty()));
    }

    #[test]
    fn comment_marker_at_start_claims_whole_line() {
        assert_eq!(classify("// just a note"), vec![("// just a note", Comment)]);
        assert_eq!(classify("//"), vec![("//", Comment)]);
    }

    #[test]
    fn comment_wins_over_strings_and_keywords() {
        assert_eq!(
            classify(r#"let x = 1; // return "nothing""#),
            vec![
                ("let", Keyword),
                (" x = 1; ", Plain),
                (r#"// return "nothing""#, Comment),
            ]
        );
    }

    #[test]
    fn keyword_inside_string_is_not_a_keyword() {
        let tokens = classify(r#"msg = "return this value""#);
        assert_eq!(
            tokens,
            vec![("msg = ", Plain), (r#""return this value""#, String)]
        );
        assert!(tokens.iter().all(|&(_, c)| c != Keyword));
    }

    #[test]
    fn keywords_need_word_boundaries() {
        assert_eq!(
            classify("format = returned"),
            vec![("format = returned", Plain)]
        );
        assert_eq!(
            classify("if (x) return y"),
            vec![
                ("if", Keyword),
                (" (x) ", Plain),
                ("return", Keyword),
                (" y", Plain)
            ]
        );
    }

    #[test]
    fn all_quote_styles_are_strings() {
        assert_eq!(
            classify(r#"a('x', "y", `z`)"#),
            vec![
                ("a(", Plain),
                ("'x'", String),
                (", ", Plain),
                (r#""y""#, String),
                (", ", Plain),
                ("`z`", String),
                (")", Plain),
            ]
        );
    }

    #[test]
    fn strings_do_not_span_mismatched_quotes() {
        assert_eq!(
            classify(r#"s = "it's" + 'x'"#),
            vec![
                ("s = ", Plain),
                (r#""it's""#, String),
                (" + ", Plain),
                ("'x'", String),
            ]
        );
    }

    #[test]
    fn unterminated_quote_stays_plain() {
        assert_eq!(
            classify(r#"print("oops, return"#),
            vec![
                (r#"print("oops, "#, Plain),
                ("return", Keyword),
            ]
        );
        assert_eq!(classify("it's"), vec![("it's", Plain)]);
    }

    #[test]
    fn empty_line_has_no_tokens() {
        assert!(classify("").is_empty());
    }

    #[test]
    fn tokens_cover_every_line_exactly() {
        for line in [
            "",
            "x = 1",
            "   // indented comment",
            r#"const s = "a" + 'b' // c"#,
            "héllo → wörld 'ünïcode' return",
            "'''",
            r#""""#,
            "class Foo extends Bar { constructor() { this.x = new Baz(); } }",
        ] {
            assert_covers(line);
        }
    }

    #[test]
    fn can_configure_marker_and_keywords() {
        let tokenizer = Tokenizer::new(&SyntaxConfig {
            comment_marker: "#".to_string(),
            keywords: vec!["def".to_string(), "".to_string()],
        })
        .expect("can build tokenizer");
        let tokens: Vec<_> = tokenizer
            .tokenize("def f(): # note")
            .into_iter()
            .map(|t| (t.text, t.category))
            .collect();
        assert_eq!(
            tokens,
            vec![("def", Keyword), (" f(): ", Plain), ("# note", Comment)]
        );
    }

    #[test]
    fn empty_marker_disables_comments() {
        let tokenizer = Tokenizer::new(&SyntaxConfig {
            comment_marker: std::string::String::new(),
            keywords: Vec::new(),
        })
        .expect("can build tokenizer");
        let tokens = tokenizer.tokenize("// not a comment");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].category, Plain);
    }
}
