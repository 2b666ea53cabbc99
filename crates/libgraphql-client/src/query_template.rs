use crate::CompileError;
use crate::OperationKind;
use crate::template_lexer;
use crate::template_lexer::TemplateToken;
use crate::template_lexer::TemplateTokenKind;
use std::ops::Range;

const AUTODECLARE_DIRECTIVE: &str = "autodeclare";

/// A prepared, not-yet-compiled operation.
///
/// Preparing a template touches neither the fragment registry nor the
/// network; fragment spreads are resolved each time the template is compiled,
/// so fragments registered after preparation are still picked up.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryTemplate {
    kind: OperationKind,
    source: String,
}
impl QueryTemplate {
    /// Whether the signature is literally `(@autodeclare)`.
    pub fn autodeclare(&self) -> bool {
        TemplateHeader::parse(&self.source)
            .is_ok_and(|header| header.signature == SignatureKind::Autodeclare)
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Prepare `source` as an operation of the given kind.
    ///
    /// A source that already opens with an operation keyword is kept
    /// verbatim. Anything else (typically a bare `{ ... }` selection set or a
    /// `($var: Type) { ... }` signature and selection set) is wrapped as
    /// `"<keyword> <source> "`.
    pub fn prepare(kind: OperationKind, source: impl AsRef<str>) -> Self {
        let source = source.as_ref();
        let tokens = template_lexer::tokenize(source);
        let has_keyword = tokens.first().is_some_and(|token| {
            token.kind == TemplateTokenKind::Name
                && matches!(token.text(source), "query" | "mutation" | "subscription")
        });

        let source =
            if has_keyword {
                source.to_string()
            } else {
                format!("{} {source} ", kind.keyword())
            };

        Self { kind, source }
    }

    pub fn source(&self) -> &str {
        self.source.as_str()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum SignatureKind {
    Absent,
    Autodeclare,
    Explicit,
}

/// The structural landmarks of an operation's text.
#[derive(Clone, Debug)]
pub(crate) struct TemplateHeader {
    pub operation_name: Option<String>,
    /// Byte offset of the `{` that opens the operation's selection set.
    pub selection_open: usize,
    /// Byte offset of the `}` that closes the operation's selection set.
    pub selection_close: usize,
    pub signature: SignatureKind,
    /// Span of the signature, parentheses included.
    pub signature_span: Option<Range<usize>>,
    /// Tokens strictly inside the signature parentheses.
    pub signature_tokens: Vec<TemplateToken>,
    /// Tokens of the outermost selection set, braces included.
    pub selection_tokens: Vec<TemplateToken>,
}
impl TemplateHeader {
    pub fn parse(source: &str) -> Result<Self, CompileError> {
        let unbalanced = || CompileError::UnbalancedTemplate {
            template: source.to_string(),
        };

        let tokens = template_lexer::tokenize(source);
        let mut idx = 0;
        let mut operation_name = None;

        let starts_with_keyword = tokens.first().is_some_and(|token| {
            token.kind == TemplateTokenKind::Name
                && matches!(token.text(source), "query" | "mutation" | "subscription")
        });
        if starts_with_keyword {
            idx += 1;
            if let Some(name) = tokens.get(idx)
                && name.kind == TemplateTokenKind::Name {
                operation_name = Some(name.text(source).to_string());
                idx += 1;
            }
        }

        let mut signature = SignatureKind::Absent;
        let mut signature_span = None;
        let mut signature_tokens = vec![];
        if tokens.get(idx).is_some_and(|token| token.is_punctuator('(')) {
            let close_idx = template_lexer::find_matching_close(&tokens, idx)
                .ok_or_else(unbalanced)?;
            signature_tokens = tokens[idx + 1..close_idx].to_vec();
            signature = match signature_tokens.as_slice() {
                [at, name] if at.is_punctuator('@')
                    && name.text(source) == AUTODECLARE_DIRECTIVE => SignatureKind::Autodeclare,
                _ => SignatureKind::Explicit,
            };
            signature_span = Some(tokens[idx].span.start..tokens[close_idx].span.end);
            idx = close_idx + 1;
        }

        let open_idx = tokens.iter()
            .skip(idx)
            .position(|token| token.is_punctuator('{'))
            .map(|offset| idx + offset)
            .ok_or_else(unbalanced)?;
        let close_idx = template_lexer::find_matching_close(&tokens, open_idx)
            .ok_or_else(unbalanced)?;

        Ok(Self {
            operation_name,
            selection_open: tokens[open_idx].span.start,
            selection_close: tokens[close_idx].span.start,
            signature,
            signature_span,
            signature_tokens,
            selection_tokens: tokens[open_idx..=close_idx].to_vec(),
        })
    }

    /// Names of every `$variable` referenced inside the selection set, in
    /// first-seen order.
    pub fn referenced_variables(&self, source: &str) -> Vec<String> {
        let mut names: Vec<String> = vec![];
        for token in &self.selection_tokens {
            if token.kind != TemplateTokenKind::Variable {
                continue;
            }
            let name = token.variable_name(source);
            if !names.iter().any(|seen| seen == name) {
                names.push(name.to_string());
            }
        }
        names
    }
}
