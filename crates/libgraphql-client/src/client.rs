use crate::AliasGenerator;
use crate::BatchMerger;
use crate::ClientError;
use crate::ClientOptions;
use crate::CompileError;
use crate::FragmentRegistry;
use crate::FragmentTree;
use crate::GraphQLRequest;
use crate::OperationKind;
use crate::PendingResult;
use crate::QueryCompiler;
use crate::QueryTemplate;
use crate::RequestExecutor;
use crate::Variables;
use crate::variable_inference;
use indexmap::IndexMap;

type Result<T> = std::result::Result<T, ClientError>;

/// A GraphQL client bound to one endpoint.
///
/// Each client owns its own fragment registry and merge batches; nothing is
/// shared between instances.
pub struct GraphQLClient<TExecutor: RequestExecutor> {
    batch_merger: BatchMerger,
    executor: TExecutor,
    fragment_registry: FragmentRegistry,
    options: ClientOptions,
    url: Option<String>,
}

impl<TExecutor: RequestExecutor> GraphQLClient<TExecutor> {
    /// Compile `source` as a query against this client's fragments, inferring
    /// `(@autodeclare)` declarations from `variables`.
    pub fn build_query(&self, source: &str, variables: &Variables) -> Result<String> {
        let template = QueryTemplate::prepare(OperationKind::Query, source);
        Ok(self.compiler().compile(&template, Some(variables))?.document)
    }

    /// Send every operation merged under `batch_key` as one request.
    ///
    /// Each merged entry's [`PendingResult`] resolves to its own fields. The
    /// returned aggregate maps every top-level field name to the list of
    /// values returned for it across all entries, in merge order.
    pub async fn commit(&mut self, batch_key: &str) -> Result<serde_json::Map<String, serde_json::Value>> {
        let prepared = self.batch_merger.commit(batch_key)?;
        let Some(url) = self.url.clone() else {
            return Err(prepared.reject(ClientError::NoUrlConfigured));
        };

        let request = GraphQLRequest {
            headers: self.options.headers.clone(),
            method: self.options.method,
            operation_name: None,
            query: prepared.document().to_string(),
            url,
            variables: prepared.variables().clone(),
        };
        let outcome = self.executor.execute(request).await;
        prepared.settle(outcome)
    }

    fn compiler(&self) -> QueryCompiler<'_> {
        compiler_for(&self.fragment_registry, &self.options)
    }

    pub fn executor(&self) -> &TExecutor {
        &self.executor
    }

    /// Register every fragment in `tree`, in addition to those already
    /// registered.
    pub fn fragment(&mut self, tree: &FragmentTree) -> std::result::Result<(), CompileError> {
        self.fragment_registry.register(tree)
    }

    /// The definition of the fragment at `path`, e.g.
    /// `"fragment auth_error on Error {messages}"`.
    pub fn fragment_definition(&self, path: &str) -> std::result::Result<String, CompileError> {
        self.fragment_registry
            .get(path)
            .map(|text| text.trim_start().to_string())
    }

    pub fn fragment_registry(&self) -> &FragmentRegistry {
        &self.fragment_registry
    }

    /// Every registered fragment as `flat_name → "\nfragment ..."`.
    pub fn fragments(&self) -> IndexMap<String, String> {
        self.fragment_registry.list()
    }

    /// Add (or replace) headers sent with every subsequent request.
    pub fn headers<K, V>(&mut self, headers: impl IntoIterator<Item = (K, V)>) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.options.headers.extend(
            headers.into_iter().map(|(name, value)| (name.into(), value.into())),
        );
        self
    }

    /// Queue `template` under `batch_key` for a later [`commit()`](Self::commit).
    /// No request is sent.
    pub fn merge(
        &mut self,
        batch_key: &str,
        template: &QueryTemplate,
        variables: Variables,
    ) -> Result<PendingResult> {
        let Self { batch_merger, fragment_registry, options, .. } = self;
        batch_merger.merge(
            &compiler_for(fragment_registry, options),
            batch_key,
            template,
            variables,
        )
    }

    /// Prepare a mutation. See [`QueryTemplate::prepare()`].
    pub fn mutate(&self, source: &str) -> QueryTemplate {
        QueryTemplate::prepare(OperationKind::Mutation, source)
    }

    pub fn new(url: Option<String>, options: ClientOptions, executor: TExecutor) -> Self {
        Self {
            batch_merger: BatchMerger::new(),
            executor,
            fragment_registry: FragmentRegistry::new(),
            options,
            url,
        }
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Number of entries waiting to be committed under `batch_key`.
    pub fn pending_len(&self, batch_key: &str) -> usize {
        self.batch_merger.pending_len(batch_key)
    }

    /// Prepare a query. See [`QueryTemplate::prepare()`].
    pub fn query(&self, source: &str) -> QueryTemplate {
        QueryTemplate::prepare(OperationKind::Query, source)
    }

    /// Compile and send `template` on its own, returning the response's
    /// `data` object.
    pub async fn run(
        &self,
        template: &QueryTemplate,
        variables: Variables,
    ) -> Result<serde_json::Map<String, serde_json::Value>> {
        let url = self.url.clone().ok_or(ClientError::NoUrlConfigured)?;
        let compiled = self.compiler().compile(template, Some(&variables))?;

        let request = GraphQLRequest {
            headers: self.options.headers.clone(),
            method: self.options.method,
            operation_name: compiled.operation_name().map(str::to_string),
            query: compiled.document,
            url,
            variables: variable_inference::strip_modifiers(&variables),
        };
        Ok(self.executor.execute(request).await?)
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = Some(url.into());
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Replace the source of merge aliases, e.g. with a
    /// [`SequenceAliasGenerator`](crate::SequenceAliasGenerator) for
    /// reproducible documents.
    pub fn with_alias_generator(mut self, alias_generator: impl AliasGenerator + 'static) -> Self {
        self.batch_merger = BatchMerger::with_alias_generator(alias_generator);
        self
    }
}

/// The compiler every operation of a client goes through.
fn compiler_for<'fragreg>(
    fragment_registry: &'fragreg FragmentRegistry,
    options: &ClientOptions,
) -> QueryCompiler<'fragreg> {
    QueryCompiler::new(fragment_registry)
        .with_always_autodeclare(options.always_autodeclare)
}
