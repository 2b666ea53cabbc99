use crate::template_lexer::TemplateToken;
use crate::template_lexer::TemplateTokenKind;
use std::fmt;

/// One `$name: Type` entry of an operation signature.
#[derive(Clone, Debug, PartialEq)]
pub struct VariableDeclaration {
    pub(crate) default_value: Option<String>,
    pub(crate) name: String,
    pub(crate) type_annotation: String,
}
impl VariableDeclaration {
    pub fn default_value(&self) -> Option<&str> {
        self.default_value.as_deref()
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn new(name: impl Into<String>, type_annotation: impl Into<String>) -> Self {
        Self {
            default_value: None,
            name: name.into(),
            type_annotation: type_annotation.into(),
        }
    }

    pub fn type_annotation(&self) -> &str {
        self.type_annotation.as_str()
    }

    /// A copy of this declaration with the variable renamed to
    /// `<prefix>__<name>`.
    pub(crate) fn with_prefix(&self, prefix: &str) -> Self {
        Self {
            name: format!("{prefix}__{}", self.name),
            ..self.clone()
        }
    }

    /// Parse the declarations between a signature's parentheses.
    ///
    /// `tokens` are the tokens strictly inside the parentheses. Each
    /// declaration starts at a `$variable`; its type runs up to a `=`, a `@`
    /// or the next declaration, and an optional default value runs from the
    /// `=` up to the next declaration.
    pub(crate) fn parse_list(source: &str, tokens: &[TemplateToken]) -> Vec<Self> {
        let mut declarations = vec![];
        let mut idx = 0;
        while idx < tokens.len() {
            let token = &tokens[idx];
            idx += 1;
            if token.kind != TemplateTokenKind::Variable {
                continue;
            }

            if tokens.get(idx).is_some_and(|token| token.is_punctuator(':')) {
                idx += 1;
            }

            let type_start = idx;
            let mut depth = 0usize;
            while let Some(token) = tokens.get(idx) {
                match token.kind {
                    TemplateTokenKind::Variable => break,
                    TemplateTokenKind::Punctuator('=' | '@') if depth == 0 => break,
                    TemplateTokenKind::Punctuator('[') => depth += 1,
                    TemplateTokenKind::Punctuator(']') => depth = depth.saturating_sub(1),
                    _ => (),
                }
                idx += 1;
            }
            let type_annotation = span_text(source, &tokens[type_start..idx]);

            let mut default_value = None;
            if tokens.get(idx).is_some_and(|token| token.is_punctuator('=')) {
                idx += 1;
                let default_start = idx;
                while tokens.get(idx).is_some_and(|token| {
                    token.kind != TemplateTokenKind::Variable && !token.is_punctuator('@')
                }) {
                    idx += 1;
                }
                default_value = Some(span_text(source, &tokens[default_start..idx]));
            }

            declarations.push(Self {
                default_value,
                name: token.variable_name(source).to_string(),
                type_annotation,
            });
        }
        declarations
    }
}
impl fmt::Display for VariableDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}: {}", self.name, self.type_annotation)?;
        if let Some(default_value) = &self.default_value {
            write!(f, " = {default_value}")?;
        }
        Ok(())
    }
}

/// Joins declarations into the text that goes between signature parentheses.
pub(crate) fn join_declarations(declarations: &[VariableDeclaration]) -> String {
    declarations.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn span_text(source: &str, tokens: &[TemplateToken]) -> String {
    match (tokens.first(), tokens.last()) {
        (Some(first), Some(last)) => source[first.span.start..last.span.end].to_string(),
        _ => String::new(),
    }
}
