//! A small lexer over operation and fragment templates.
//!
//! Templates are never parsed into an AST. The compiler only needs to find a
//! handful of constructs (fragment spreads, `$variable` references, the
//! signature parentheses and the outermost selection set) and splice the
//! original text around them, so tokens carry nothing but a kind and a byte
//! span into the source. String literals and `#` comments are consumed whole
//! so that nothing inside them is ever mistaken for a spread or a variable.

use std::ops::Range;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum TemplateTokenKind {
    /// `...`
    Ellipsis,
    Name,
    /// Numeric literals and anything else that is neither a name nor a
    /// punctuator.
    Other,
    Punctuator(char),
    /// A string or block string literal, quotes included.
    StringValue,
    /// `$name`, the `$` included in the span.
    Variable,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TemplateToken {
    pub kind: TemplateTokenKind,
    pub span: Range<usize>,
}
impl TemplateToken {
    pub fn is_punctuator(&self, ch: char) -> bool {
        self.kind == TemplateTokenKind::Punctuator(ch)
    }

    pub fn text<'src>(&self, source: &'src str) -> &'src str {
        &source[self.span.clone()]
    }

    /// For a [`TemplateTokenKind::Variable`] token, the variable name without
    /// its leading `$`.
    pub fn variable_name<'src>(&self, source: &'src str) -> &'src str {
        &source[self.span.start + 1..self.span.end]
    }
}

pub(crate) struct TemplateLexer<'src> {
    source: &'src str,
    curr_byte_offset: usize,
}

impl<'src> TemplateLexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            curr_byte_offset: 0,
        }
    }

    fn consume(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.curr_byte_offset += ch.len_utf8();
        Some(ch)
    }

    fn consume_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(ch) = self.peek_char() {
            if !pred(ch) {
                break;
            }
            self.consume();
        }
    }

    fn lex_block_string(&mut self) {
        // Opening `"""` has been consumed.
        loop {
            let remaining = self.remaining();
            if remaining.is_empty() {
                return;
            }
            if remaining.starts_with("\\\"\"\"") {
                self.curr_byte_offset += 4;
                continue;
            }
            if remaining.starts_with("\"\"\"") {
                self.curr_byte_offset += 3;
                return;
            }
            self.consume();
        }
    }

    fn lex_string(&mut self) {
        // Opening `"` has been consumed.
        if self.remaining().starts_with("\"\"") {
            self.curr_byte_offset += 2;
            return self.lex_block_string();
        }

        while let Some(ch) = self.consume() {
            match ch {
                '\\' => {
                    self.consume();
                },
                // Unterminated strings end at the line break.
                '"' | '\n' => return,
                _ => (),
            }
        }
    }

    fn next_token(&mut self) -> Option<TemplateToken> {
        self.skip_ignored();

        let start = self.curr_byte_offset;
        let ch = self.consume()?;
        let kind = match ch {
            '.' if self.remaining().starts_with("..") => {
                self.curr_byte_offset += 2;
                TemplateTokenKind::Ellipsis
            },

            '$' if self.peek_char().is_some_and(is_name_start) => {
                self.consume_while(is_name_continue);
                TemplateTokenKind::Variable
            },

            '"' => {
                self.lex_string();
                TemplateTokenKind::StringValue
            },

            ch if is_name_start(ch) => {
                self.consume_while(is_name_continue);
                TemplateTokenKind::Name
            },

            ch if ch == '-' || ch.is_ascii_digit() => {
                self.consume_while(|ch| {
                    ch.is_ascii_alphanumeric() || matches!(ch, '.' | '+' | '-')
                });
                TemplateTokenKind::Other
            },

            ch => TemplateTokenKind::Punctuator(ch),
        };

        Some(TemplateToken {
            kind,
            span: start..self.curr_byte_offset,
        })
    }

    fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn remaining(&self) -> &'src str {
        &self.source[self.curr_byte_offset..]
    }

    /// Skips whitespace, commas, byte-order marks and `#` comments.
    fn skip_ignored(&mut self) {
        while let Some(ch) = self.peek_char() {
            match ch {
                '#' => self.consume_while(|ch| ch != '\n' && ch != '\r'),
                ',' | '\u{feff}' => {
                    self.consume();
                },
                ch if ch.is_whitespace() => {
                    self.consume();
                },
                _ => return,
            }
        }
    }
}

impl Iterator for TemplateLexer<'_> {
    type Item = TemplateToken;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// Lex `source` into a token list.
pub(crate) fn tokenize(source: &str) -> Vec<TemplateToken> {
    TemplateLexer::new(source).collect()
}

/// Given the index of an opening `{`, `(` or `[` token, returns the index of
/// the token that closes it, or `None` when the template is unbalanced.
pub(crate) fn find_matching_close(
    tokens: &[TemplateToken],
    open_idx: usize,
) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, token) in tokens.iter().enumerate().skip(open_idx) {
        match token.kind {
            TemplateTokenKind::Punctuator('{' | '(' | '[') => depth += 1,
            TemplateTokenKind::Punctuator('}' | ')' | ']') => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx);
                }
            },
            _ => (),
        }
    }
    None
}

/// A `...path` fragment spread found in a template.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SpreadRef {
    /// The dot-delimited fragment path, exactly as written.
    pub path: String,
    /// Span of the path alone.
    pub path_span: Range<usize>,
    /// Span from the `...` through the end of the path.
    pub span: Range<usize>,
}

/// Finds every named fragment spread in `source`.
///
/// A spread is `...` followed by a name, optionally continued by `.name`
/// segments with no whitespace in between. Inline fragments (`... on Type`)
/// and directive-only inline fragments (`... @include(...)`) are skipped.
pub(crate) fn find_spreads(
    source: &str,
    tokens: &[TemplateToken],
) -> Vec<SpreadRef> {
    let mut spreads = vec![];
    let mut idx = 0;
    while idx < tokens.len() {
        let token = &tokens[idx];
        idx += 1;
        if token.kind != TemplateTokenKind::Ellipsis {
            continue;
        }
        let Some(first) = tokens.get(idx) else {
            break;
        };
        if first.kind != TemplateTokenKind::Name || first.text(source) == "on" {
            continue;
        }

        let path_start = first.span.start;
        let mut path_end = first.span.end;
        idx += 1;
        while let (Some(dot), Some(segment)) = (tokens.get(idx), tokens.get(idx + 1)) {
            let adjacent = dot.is_punctuator('.')
                && dot.span.start == path_end
                && segment.kind == TemplateTokenKind::Name
                && segment.span.start == dot.span.end;
            if !adjacent {
                break;
            }
            path_end = segment.span.end;
            idx += 2;
        }

        spreads.push(SpreadRef {
            path: source[path_start..path_end].to_string(),
            path_span: path_start..path_end,
            span: token.span.start..path_end,
        });
    }
    spreads
}

fn is_name_continue(ch: char) -> bool {
    ch == '_' || ch.is_ascii_alphanumeric()
}

fn is_name_start(ch: char) -> bool {
    ch == '_' || ch.is_ascii_alphabetic()
}
