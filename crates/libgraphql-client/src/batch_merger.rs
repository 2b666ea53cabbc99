//! Combines independent operations into a single request.
//!
//! Each batch key moves through three states: empty, accumulating (one or
//! more entries merged) and drained (committed). [`BatchMerger::merge()`]
//! compiles an entry and namespaces its fields and variables under a
//! `merge<NNNN>` alias; [`BatchMerger::commit()`] drains the key into one
//! document, and [`PreparedCommit::settle()`] hands each entry its own slice
//! of the response.

use crate::AliasGenerator;
use crate::ClientError;
use crate::CompileError;
use crate::FragmentRegistry;
use crate::QueryCompiler;
use crate::QueryTemplate;
use crate::RandomAliasGenerator;
use crate::RequestError;
use crate::VariableDeclaration;
use crate::Variables;
use crate::alias_generator;
use crate::query_template::TemplateHeader;
use crate::template_lexer;
use crate::template_lexer::TemplateToken;
use crate::template_lexer::TemplateTokenKind;
use crate::variable_declaration;
use crate::variable_inference;
use indexmap::IndexMap;
use indexmap::IndexSet;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::task::Context;
use std::task::Poll;
use tokio::sync::oneshot;

type EntryOutcome = Result<serde_json::Map<String, Value>, ClientError>;

/// The eventual result of one merged entry.
///
/// Resolves once the entry's batch is committed, to
/// `{ <original field>: value }`, the same shape the operation would have
/// produced had it been sent on its own.
#[derive(Debug)]
pub struct PendingResult {
    receiver: oneshot::Receiver<EntryOutcome>,
}
impl Future for PendingResult {
    type Output = EntryOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|outcome| outcome.unwrap_or(Err(ClientError::PendingResultDropped)))
    }
}

/// A top-level field of a merged entry.
#[derive(Clone, Debug, PartialEq)]
struct ResponseField {
    /// `<alias>_<original>`, the key it comes back under.
    aliased: String,
    /// The response key the caller expects.
    original: String,
}

/// One operation waiting in a batch.
#[derive(Debug)]
pub struct MergeEntry {
    alias: String,
    batch_key: String,
    declarations: Vec<VariableDeclaration>,
    defaulted_variables: Vec<String>,
    fields: Vec<ResponseField>,
    fragments: IndexMap<String, String>,
    referenced_variables: Vec<String>,
    selection: String,
    sender: oneshot::Sender<EntryOutcome>,
    supplied_variables: Variables,
    variables: Variables,
}
impl MergeEntry {
    /// The `merge<NNNN>` prefix namespacing this entry.
    pub fn alias(&self) -> &str {
        self.alias.as_str()
    }

    pub fn batch_key(&self) -> &str {
        self.batch_key.as_str()
    }

    /// Signature declarations, already renamed to `<alias>__<name>`.
    pub fn declarations(&self) -> &[VariableDeclaration] {
        self.declarations.as_slice()
    }

    /// The first referenced variable that has neither a supplied value nor a
    /// default.
    fn missing_variable(&self) -> Option<&str> {
        self.referenced_variables.iter()
            .find(|name| {
                !self.supplied_variables.contains_key(name.as_str())
                    && !self.defaulted_variables.contains(name)
            })
            .map(String::as_str)
    }

    /// Original (un-aliased) names of the entry's top-level response fields.
    pub fn response_fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.original.as_str())
    }

    /// The entry's top-level selections with aliases applied.
    pub fn selection(&self) -> &str {
        self.selection.as_str()
    }

    /// Variable values keyed by `<alias>__<name>`.
    pub fn variables(&self) -> &Variables {
        &self.variables
    }
}

/// A drained batch, assembled into one document and ready to send.
#[derive(Debug)]
pub struct PreparedCommit {
    batch_key: String,
    document: String,
    entries: Vec<MergeEntry>,
    variables: Variables,
}
impl PreparedCommit {
    fn assemble(batch_key: &str, entries: Vec<MergeEntry>) -> Self {
        let declarations: Vec<VariableDeclaration> =
            entries.iter()
                .flat_map(|entry| entry.declarations.iter().cloned())
                .collect();

        let mut document =
            if declarations.is_empty() {
                "query {\n".to_string()
            } else {
                format!(
                    "query ({}) {{\n",
                    variable_declaration::join_declarations(&declarations),
                )
            };
        for entry in &entries {
            document.push_str(&entry.selection);
        }
        document.push_str(" }");

        let mut fragments = IndexMap::new();
        let mut variables = Variables::new();
        for entry in &entries {
            for (name, text) in &entry.fragments {
                fragments.entry(name.as_str()).or_insert(text.as_str());
            }
            variables.extend(entry.variables.clone());
        }
        for text in fragments.values() {
            document.push('\n');
            document.push_str(text);
        }

        Self {
            batch_key: batch_key.to_string(),
            document,
            entries,
            variables,
        }
    }

    pub fn batch_key(&self) -> &str {
        self.batch_key.as_str()
    }

    /// The merged document.
    pub fn document(&self) -> &str {
        self.document.as_str()
    }

    pub fn entries(&self) -> &[MergeEntry] {
        self.entries.as_slice()
    }

    /// Reject every entry with `error`, then hand the error back.
    pub fn reject(self, error: ClientError) -> ClientError {
        log::debug!(
            "Rejecting {} merged entries of batch `{}`: {error}",
            self.entries.len(),
            self.batch_key,
        );
        for entry in self.entries {
            // A dropped receiver just means nobody is waiting on that entry.
            let _ = entry.sender.send(Err(error.clone()));
        }
        error
    }

    /// Distribute the outcome of the single request.
    ///
    /// On success every entry resolves to its own fields under their original
    /// names, and the returned aggregate maps each original field name to the
    /// list of values of every entry that selected it, in merge order. On
    /// failure every entry is rejected with the same error.
    pub fn settle(
        self,
        outcome: Result<serde_json::Map<String, Value>, RequestError>,
    ) -> Result<serde_json::Map<String, Value>, ClientError> {
        let data = match outcome {
            Ok(data) => data,
            Err(err) => return Err(self.reject(err.into())),
        };

        let mut aggregate: IndexMap<String, Vec<Value>> = IndexMap::new();
        for entry in self.entries {
            let mut result = serde_json::Map::new();
            for field in &entry.fields {
                let value = data.get(&field.aliased).cloned().unwrap_or(Value::Null);
                aggregate.entry(field.original.to_string())
                    .or_default()
                    .push(value.clone());
                result.insert(field.original.to_string(), value);
            }
            let _ = entry.sender.send(Ok(result));
        }

        Ok(aggregate.into_iter()
            .map(|(name, values)| (name, Value::Array(values)))
            .collect())
    }

    /// Variable values of every entry, keyed by aliased name.
    pub fn variables(&self) -> &Variables {
        &self.variables
    }
}

/// Accumulates merged entries per batch key.
pub struct BatchMerger {
    alias_generator: Box<dyn AliasGenerator>,
    batches: IndexMap<String, Vec<MergeEntry>>,
}

impl BatchMerger {
    /// Drain `batch_key` into a [`PreparedCommit`].
    ///
    /// The key is drained even when this fails, so the next
    /// [`merge()`](Self::merge) starts a fresh batch. Fails with
    /// [`ClientError::EmptyCommit`] when nothing is pending, and with
    /// [`ClientError::MissingVariable`] (rejecting every drained entry) when
    /// an entry references a variable it was never given.
    pub fn commit(&mut self, batch_key: &str) -> Result<PreparedCommit, ClientError> {
        let entries = self.batches.shift_remove(batch_key).unwrap_or_default();
        if entries.is_empty() {
            return Err(ClientError::EmptyCommit {
                batch_key: batch_key.to_string(),
            });
        }

        let missing = entries.iter().find_map(|entry| {
            entry.missing_variable().map(|variable_name| ClientError::MissingVariable {
                alias: entry.alias.to_string(),
                variable_name: variable_name.to_string(),
            })
        });

        let prepared = PreparedCommit::assemble(batch_key, entries);
        if let Some(err) = missing {
            return Err(prepared.reject(err));
        }

        log::debug!(
            "Committing {} merged entries of batch `{batch_key}`.",
            prepared.entries.len(),
        );
        log::trace!("Merged document:\n{}", prepared.document);
        Ok(prepared)
    }

    /// Compile `template` and queue it under `batch_key`.
    ///
    /// Nothing is sent. Variables are not checked against the template until
    /// commit, so entries can be merged before every value is known.
    ///
    /// Fails with [`ClientError::TopLevelFragment`] when the template spreads
    /// a fragment (or an inline fragment) directly in its outermost
    /// selection set, since those fields could not be routed back.
    pub fn merge(
        &mut self,
        compiler: &QueryCompiler<'_>,
        batch_key: &str,
        template: &QueryTemplate,
        variables: Variables,
    ) -> Result<PendingResult, ClientError> {
        let alias = alias_generator::format_alias(self.alias_generator.next_code());
        let compiled = compiler.compile_declared(template, &variables)?;

        let operation = compiled.operation();
        let header = TemplateHeader::parse(operation)?;
        let fragments = isolate_fragments(
            compiler.fragment_registry(),
            compiled.fragment_names(),
            &alias,
        )?;
        let selection_body =
            operation[header.selection_open + 1..header.selection_close].trim_start();
        let (mut selection, fields) =
            alias_selections(selection_body, &alias, &fragments.isolated, batch_key)?;
        if !selection.ends_with('\n') {
            selection.push('\n');
        }

        let mut referenced_variables = header.referenced_variables(operation);
        for name in fragments.variables {
            if !referenced_variables.contains(&name) {
                referenced_variables.push(name);
            }
        }

        let supplied_variables = variable_inference::strip_modifiers(&variables);
        let aliased_variables =
            supplied_variables.iter()
                .map(|(name, value)| (format!("{alias}__{name}"), value.clone()))
                .collect();

        let (sender, receiver) = oneshot::channel();
        log::debug!("Merged `{alias}` into batch `{batch_key}`.");
        self.batches.entry(batch_key.to_string()).or_default().push(MergeEntry {
            alias: alias.to_string(),
            batch_key: batch_key.to_string(),
            declarations: compiled.declarations()
                .iter()
                .map(|declaration| declaration.with_prefix(&alias))
                .collect(),
            defaulted_variables: compiled.declarations()
                .iter()
                .filter(|declaration| declaration.default_value().is_some())
                .map(|declaration| declaration.name().to_string())
                .collect(),
            fields,
            fragments: fragments.definitions,
            referenced_variables,
            selection,
            sender,
            supplied_variables,
            variables: aliased_variables,
        });

        Ok(PendingResult { receiver })
    }

    pub fn new() -> Self {
        Self::with_alias_generator(RandomAliasGenerator::new())
    }

    /// Number of entries currently waiting under `batch_key`.
    pub fn pending_len(&self, batch_key: &str) -> usize {
        self.batches.get(batch_key).map_or(0, Vec::len)
    }

    pub fn with_alias_generator(alias_generator: impl AliasGenerator + 'static) -> Self {
        Self {
            alias_generator: Box::new(alias_generator),
            batches: IndexMap::new(),
        }
    }
}
impl Default for BatchMerger {
    fn default() -> Self {
        Self::new()
    }
}

/// The fragment definitions of one merged entry.
struct EntryFragments {
    /// Emitted name → `"\nfragment ..."` text.
    definitions: IndexMap<String, String>,
    /// Flat names of the fragments that got a per-entry copy.
    isolated: IndexSet<String>,
    /// Variables referenced from inside any of the fragments.
    variables: Vec<String>,
}

/// Collect the definitions of `fragment_names` (dependencies first) for the
/// entry aliased `alias`.
///
/// A fragment that references a variable, or spreads a fragment that does,
/// is emitted as a private copy named `<alias>_<flat_name>` with its
/// variables renamed to `<alias>__<name>`. Every other fragment keeps its
/// flat name and is shared between entries.
fn isolate_fragments(
    registry: &FragmentRegistry,
    fragment_names: &[String],
    alias: &str,
) -> Result<EntryFragments, CompileError> {
    let mut fragments = EntryFragments {
        definitions: IndexMap::new(),
        isolated: IndexSet::new(),
        variables: vec![],
    };

    for flat_name in fragment_names {
        let fragment = registry.fragment(flat_name).ok_or_else(|| {
            CompileError::FragmentNotFound {
                path: flat_name.to_string(),
            }
        })?;
        let body = fragment.body();
        let tokens = template_lexer::tokenize(body);

        let mut has_variables = false;
        for token in tokens.iter().filter(|token| token.kind == TemplateTokenKind::Variable) {
            has_variables = true;
            let name = token.variable_name(body);
            if !fragments.variables.iter().any(|seen| seen == name) {
                fragments.variables.push(name.to_string());
            }
        }
        let spreads_isolated =
            template_lexer::find_spreads(body, &tokens)
                .iter()
                .any(|spread| fragments.isolated.contains(spread.path.as_str()));

        if has_variables || spreads_isolated {
            let isolated_name = format!("{alias}_{flat_name}");
            let renamed = rename_for_entry(body, &tokens, alias, &fragments.isolated);
            fragments.definitions.insert(
                isolated_name.to_string(),
                format!("\nfragment {isolated_name} {renamed}"),
            );
            fragments.isolated.insert(flat_name.to_string());
        } else {
            fragments.definitions.insert(flat_name.to_string(), fragment.definition_text());
        }
    }

    Ok(fragments)
}

/// Whether `tokens[idx]` names a spread of a fragment in `isolated`.
fn is_isolated_spread(
    source: &str,
    tokens: &[TemplateToken],
    idx: usize,
    isolated: &IndexSet<String>,
) -> bool {
    idx > 0
        && tokens[idx - 1].kind == TemplateTokenKind::Ellipsis
        && tokens[idx].kind == TemplateTokenKind::Name
        && isolated.contains(tokens[idx].text(source))
}

/// Rename every `$variable` in a fragment body to `<alias>__<name>` and every
/// spread of an isolated fragment to `<alias>_<flat_name>`.
fn rename_for_entry(
    source: &str,
    tokens: &[TemplateToken],
    alias: &str,
    isolated: &IndexSet<String>,
) -> String {
    let mut renamed = String::with_capacity(source.len() * 2);
    let mut last_end = 0;
    for (idx, token) in tokens.iter().enumerate() {
        let replacement =
            if token.kind == TemplateTokenKind::Variable {
                format!("${alias}__{}", token.variable_name(source))
            } else if is_isolated_spread(source, tokens, idx, isolated) {
                format!("{alias}_{}", token.text(source))
            } else {
                continue;
            };
        renamed.push_str(&source[last_end..token.span.start]);
        renamed.push_str(&replacement);
        last_end = token.span.end;
    }
    renamed.push_str(&source[last_end..]);
    renamed
}

/// Prefix every `$variable` in `selections` with `<alias>__` and every
/// top-level field with `<alias>_`.
///
/// An un-aliased field `post(...)` becomes `<alias>_post:post(...)`; a field
/// that already carries an alias (`a: field`) keeps its field and has the
/// alias prefixed instead. Spreads of `isolated` fragments are pointed at the
/// entry's own copies. Top-level fragments are rejected.
fn alias_selections(
    selections: &str,
    alias: &str,
    isolated: &IndexSet<String>,
    batch_key: &str,
) -> Result<(String, Vec<ResponseField>), ClientError> {
    let tokens = template_lexer::tokenize(selections);
    let mut aliased = String::with_capacity(selections.len() * 2);
    let mut fields = vec![];
    let mut last_end = 0;
    let mut depth = 0usize;
    let mut prev: Option<&TemplateToken> = None;

    for (idx, token) in tokens.iter().enumerate() {
        let at_top_level = depth == 0;
        match token.kind {
            TemplateTokenKind::Punctuator('{' | '(' | '[') => depth += 1,
            TemplateTokenKind::Punctuator('}' | ')' | ']') => depth = depth.saturating_sub(1),

            TemplateTokenKind::Variable => {
                aliased.push_str(&selections[last_end..token.span.start]);
                aliased.push('$');
                aliased.push_str(alias);
                aliased.push_str("__");
                aliased.push_str(token.variable_name(selections));
                last_end = token.span.end;
            },

            TemplateTokenKind::Ellipsis if at_top_level => {
                return Err(ClientError::TopLevelFragment {
                    alias: alias.to_string(),
                    batch_key: batch_key.to_string(),
                });
            },

            TemplateTokenKind::Name if is_isolated_spread(selections, &tokens, idx, isolated) => {
                aliased.push_str(&selections[last_end..token.span.start]);
                aliased.push_str(alias);
                aliased.push('_');
                aliased.push_str(token.text(selections));
                last_end = token.span.end;
            },

            TemplateTokenKind::Name if at_top_level && starts_selection(prev) => {
                let name = token.text(selections);
                let response_key = format!("{alias}_{name}");
                aliased.push_str(&selections[last_end..token.span.start]);
                aliased.push_str(&response_key);
                let has_alias = tokens.get(idx + 1).is_some_and(|next| next.is_punctuator(':'));
                if !has_alias {
                    aliased.push(':');
                    aliased.push_str(name);
                }
                last_end = token.span.end;
                fields.push(ResponseField {
                    aliased: response_key,
                    original: name.to_string(),
                });
            },

            _ => (),
        }

        if at_top_level || depth == 0 {
            prev = Some(token);
        }
    }
    aliased.push_str(&selections[last_end..]);

    Ok((aliased, fields))
}

/// Whether a top-level name token, given the top-level token before it,
/// begins a new selection (as opposed to being the field after an alias or a
/// directive name).
fn starts_selection(prev: Option<&TemplateToken>) -> bool {
    !prev.is_some_and(|prev| matches!(prev.kind, TemplateTokenKind::Punctuator(':' | '@')))
}
