use crate::CompileError;
use crate::template_lexer;
use crate::template_lexer::TemplateTokenKind;
use indexmap::IndexMap;
use indexmap::IndexSet;

type Result<T> = std::result::Result<T, CompileError>;

/// A nested mapping of namespaces to fragment bodies, as accepted by
/// [`FragmentRegistry::register()`].
///
/// Deserializes from JSON objects whose leaves are fragment bodies:
///
/// ```
/// use libgraphql_client::FragmentTree;
///
/// let tree: FragmentTree = serde_json::from_str(r#"{
///     "user": "on User {name}",
///     "auth": { "user": "on User {token, ...user}" }
/// }"#).unwrap();
/// ```
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(untagged)]
pub enum FragmentTree {
    Body(String),
    Namespace(IndexMap<String, FragmentTree>),
}
impl FragmentTree {
    /// Build a [`FragmentTree::Namespace`] from `(name, subtree)` pairs.
    pub fn namespace<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<FragmentTree>,
    {
        Self::Namespace(
            entries.into_iter()
                .map(|(name, tree)| (name.into(), tree.into()))
                .collect(),
        )
    }

    fn flatten_into(&self, prefix: Option<&str>, out: &mut Vec<(String, String)>) {
        match self {
            Self::Body(body) => {
                // A bare body at the root has no path to live under.
                if let Some(path) = prefix {
                    out.push((path.to_string(), body.to_string()));
                }
            },
            Self::Namespace(entries) => {
                for (name, subtree) in entries {
                    let path = match prefix {
                        Some(prefix) => format!("{prefix}.{name}"),
                        None => name.to_string(),
                    };
                    subtree.flatten_into(Some(path.as_str()), out);
                }
            },
        }
    }
}
impl From<&str> for FragmentTree {
    fn from(body: &str) -> Self {
        Self::Body(body.to_string())
    }
}
impl From<String> for FragmentTree {
    fn from(body: String) -> Self {
        Self::Body(body)
    }
}

/// A single registered fragment.
#[derive(Clone, Debug, PartialEq)]
pub struct FragmentDefinition {
    body: String,
    flat_name: String,
    path: String,
}
impl FragmentDefinition {
    /// The `on Type {...}` text of this fragment, with any namespaced spreads
    /// inside it already flattened.
    pub fn body(&self) -> &str {
        self.body.as_str()
    }

    /// The definition exactly as it is appended to compiled documents:
    /// `"\nfragment <flat_name> <body>"`.
    pub fn definition_text(&self) -> String {
        format!("\nfragment {} {}", self.flat_name, self.body)
    }

    /// The path with every `.` replaced by `_`.
    pub fn flat_name(&self) -> &str {
        self.flat_name.as_str()
    }

    /// The dot-separated namespace path this fragment was registered under.
    pub fn path(&self) -> &str {
        self.path.as_str()
    }

    /// The type named by the fragment's `on <Type>` condition.
    pub fn type_condition(&self) -> &str {
        self.body.trim_start()
            .strip_prefix("on")
            .unwrap_or_default()
            .trim_start()
            .split(|ch: char| !(ch == '_' || ch.is_ascii_alphanumeric()))
            .next()
            .unwrap_or_default()
    }
}

/// The result of [`FragmentRegistry::resolve_spreads()`].
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedSpreads {
    /// The input text with every spread rewritten to `... <flat_name>`.
    pub rewritten_text: String,

    /// Flat names of every fragment required by the text, transitively.
    ///
    /// Each fragment appears once, after all of the fragments it spreads.
    pub used_fragments: Vec<String>,
}

/// Namespaced fragment storage for one client.
///
/// Fragments are keyed by their flat name, which is what compiled documents
/// refer to. Lookups accept either the dotted path or the flat name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FragmentRegistry {
    fragments: IndexMap<String, FragmentDefinition>,
}

impl FragmentRegistry {
    fn collect_dependencies(
        &self,
        fragment: &FragmentDefinition,
        visiting: &mut Vec<String>,
        used: &mut IndexSet<String>,
    ) -> Result<()> {
        if used.contains(fragment.flat_name()) {
            return Ok(());
        }

        if let Some(cycle_start) = visiting.iter().position(|name| name == fragment.flat_name()) {
            let mut cycle_path = visiting[cycle_start..].to_vec();
            cycle_path.push(fragment.flat_name.to_string());
            return Err(CompileError::FragmentCycleDetected { cycle_path });
        }

        visiting.push(fragment.flat_name.to_string());
        let tokens = template_lexer::tokenize(&fragment.body);
        for spread in template_lexer::find_spreads(&fragment.body, &tokens) {
            let dependency = self.lookup(&spread.path)?;
            self.collect_dependencies(dependency, visiting, used)?;
        }
        visiting.pop();

        used.insert(fragment.flat_name.to_string());
        Ok(())
    }

    /// Returns the definition text of every named fragment, in order.
    pub fn definition_texts<S: AsRef<str>>(&self, flat_names: &[S]) -> Result<Vec<String>> {
        flat_names.iter()
            .map(|name| self.lookup(name.as_ref()).map(FragmentDefinition::definition_text))
            .collect()
    }

    /// Look up a fragment by dotted path or flat name.
    pub fn fragment(&self, path: &str) -> Option<&FragmentDefinition> {
        self.fragments.get(&flatten_path(path))
    }

    /// Returns `"\nfragment <flat_name> <body>"` for the fragment at `path`.
    pub fn get(&self, path: &str) -> Result<String> {
        self.lookup(path).map(FragmentDefinition::definition_text)
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Snapshot of every registered fragment as `flat_name → definition text`,
    /// in registration order.
    pub fn list(&self) -> IndexMap<String, String> {
        self.fragments.iter()
            .map(|(flat_name, fragment)| (flat_name.to_string(), fragment.definition_text()))
            .collect()
    }

    fn lookup(&self, path: &str) -> Result<&FragmentDefinition> {
        self.fragment(path).ok_or_else(|| CompileError::FragmentNotFound {
            path: path.to_string(),
        })
    }

    pub fn new() -> Self {
        Self::default()
    }

    /// Register every fragment in `tree`.
    ///
    /// Registration is additive: fragments from earlier calls are kept, and a
    /// fragment registered again under the same path replaces the old body in
    /// place.
    pub fn register(&mut self, tree: &FragmentTree) -> Result<()> {
        let mut flattened = vec![];
        tree.flatten_into(None, &mut flattened);
        for (path, body) in flattened {
            self.register_fragment(&path, &body)?;
        }
        Ok(())
    }

    /// Register a single fragment body (`on Type {...}`) under a dotted path.
    pub fn register_fragment(&mut self, path: &str, body: &str) -> Result<()> {
        let tokens = template_lexer::tokenize(body);
        let well_formed = matches!(
            tokens.as_slice(),
            [on, type_name, ..]
                if on.kind == TemplateTokenKind::Name
                    && on.text(body) == "on"
                    && type_name.kind == TemplateTokenKind::Name
        );
        if !well_formed {
            return Err(CompileError::MalformedFragment {
                body: body.to_string(),
                path: path.to_string(),
            });
        }

        let flat_name = flatten_path(path);
        if let Some(existing) = self.fragments.get(&flat_name)
            && existing.path != path {
            return Err(CompileError::FlatNameCollision {
                existing_path: existing.path.to_string(),
                flat_name,
                path: path.to_string(),
            });
        }

        // Flatten nested spreads in place, keeping the author's spacing.
        let mut flat_body = String::with_capacity(body.len());
        let mut last_end = 0;
        for spread in template_lexer::find_spreads(body, &tokens) {
            flat_body.push_str(&body[last_end..spread.path_span.start]);
            flat_body.push_str(&flatten_path(&spread.path));
            last_end = spread.path_span.end;
        }
        flat_body.push_str(&body[last_end..]);

        log::trace!("Registered fragment `{path}` as `{flat_name}`.");
        self.fragments.insert(flat_name.to_string(), FragmentDefinition {
            body: flat_body,
            flat_name,
            path: path.to_string(),
        });
        Ok(())
    }

    /// Rewrite every fragment spread in `text` to `... <flat_name>` and
    /// collect every fragment the text requires, including fragments spread
    /// only from inside other fragments.
    ///
    /// Fails if a spread names an unregistered fragment or if fragments
    /// spread each other in a cycle.
    pub fn resolve_spreads(&self, text: &str) -> Result<ResolvedSpreads> {
        let tokens = template_lexer::tokenize(text);
        let mut rewritten_text = String::with_capacity(text.len());
        let mut last_end = 0;
        let mut used = IndexSet::new();
        let mut visiting = vec![];

        for spread in template_lexer::find_spreads(text, &tokens) {
            let fragment = self.lookup(&spread.path)?;
            rewritten_text.push_str(&text[last_end..spread.span.start]);
            rewritten_text.push_str("... ");
            rewritten_text.push_str(fragment.flat_name());
            last_end = spread.span.end;

            self.collect_dependencies(fragment, &mut visiting, &mut used)?;
        }
        rewritten_text.push_str(&text[last_end..]);

        Ok(ResolvedSpreads {
            rewritten_text,
            used_fragments: used.into_iter().collect(),
        })
    }
}

fn flatten_path(path: &str) -> String {
    path.replace('.', "_")
}
