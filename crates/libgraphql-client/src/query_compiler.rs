use crate::CompileError;
use crate::FragmentRegistry;
use crate::OperationKind;
use crate::QueryTemplate;
use crate::VariableDeclaration;
use crate::Variables;
use crate::query_template::SignatureKind;
use crate::query_template::TemplateHeader;
use crate::variable_declaration;
use crate::variable_inference;

type Result<T> = std::result::Result<T, CompileError>;

/// The output of [`QueryCompiler::compile()`].
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledQuery {
    pub(crate) declarations: Vec<VariableDeclaration>,
    pub(crate) document: String,
    pub(crate) fragment_names: Vec<String>,
    pub(crate) fragments: Vec<String>,
    pub(crate) kind: OperationKind,
    pub(crate) operation: String,
    pub(crate) operation_name: Option<String>,
}
impl CompiledQuery {
    /// The variable declarations of the operation's signature, whether
    /// written by hand or inferred.
    pub fn declarations(&self) -> &[VariableDeclaration] {
        self.declarations.as_slice()
    }

    /// The complete document: the operation followed by every required
    /// fragment definition.
    pub fn document(&self) -> &str {
        self.document.as_str()
    }

    /// Flat names of the fragments appended to the document, in order.
    pub fn fragment_names(&self) -> &[String] {
        self.fragment_names.as_slice()
    }

    /// The appended fragment definitions, each `"\nfragment <flat_name> ..."`,
    /// in the same order as [`fragment_names()`](Self::fragment_names).
    pub fn fragments(&self) -> &[String] {
        self.fragments.as_slice()
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// The operation text alone, with spreads rewritten and the signature
    /// filled in, but without fragment definitions.
    pub fn operation(&self) -> &str {
        self.operation.as_str()
    }

    pub fn operation_name(&self) -> Option<&str> {
        self.operation_name.as_deref()
    }
}

/// Compiles [`QueryTemplate`]s into complete documents against one
/// [`FragmentRegistry`].
#[derive(Clone, Copy, Debug)]
pub struct QueryCompiler<'fragreg> {
    always_autodeclare: bool,
    fragment_registry: &'fragreg FragmentRegistry,
}
impl<'fragreg> QueryCompiler<'fragreg> {
    /// Compile `template`.
    ///
    /// An `(@autodeclare)` signature is replaced with declarations inferred
    /// from `variables`. Every fragment spread is rewritten to its flat name
    /// and every transitively required fragment definition is appended once.
    pub fn compile(
        &self,
        template: &QueryTemplate,
        variables: Option<&Variables>,
    ) -> Result<CompiledQuery> {
        self.compile_impl(template, variables, self.always_autodeclare)
    }

    /// Like [`compile()`](Self::compile) but a template with no signature at
    /// all is always given inferred declarations. Merged entries need their
    /// declarations even when their author left them implicit.
    pub(crate) fn compile_declared(
        &self,
        template: &QueryTemplate,
        variables: &Variables,
    ) -> Result<CompiledQuery> {
        self.compile_impl(template, Some(variables), true)
    }

    fn compile_impl(
        &self,
        template: &QueryTemplate,
        variables: Option<&Variables>,
        declare_when_absent: bool,
    ) -> Result<CompiledQuery> {
        let source = template.source();
        let header = TemplateHeader::parse(source)?;
        let empty_variables = Variables::new();
        let infer = || variable_inference::infer_declarations(
            &header.referenced_variables(source),
            variables.unwrap_or(&empty_variables),
        );

        let mut operation = source.to_string();
        let declarations = match (&header.signature, &header.signature_span) {
            (SignatureKind::Autodeclare, Some(span)) => {
                let declarations = infer();
                let replacement =
                    if declarations.is_empty() {
                        String::new()
                    } else {
                        format!("({})", variable_declaration::join_declarations(&declarations))
                    };
                // Drop the separating space along with empty parentheses.
                let start =
                    if replacement.is_empty() && source[..span.start].ends_with(' ') {
                        span.start - 1
                    } else {
                        span.start
                    };
                operation.replace_range(start..span.end, &replacement);
                declarations
            },

            (SignatureKind::Explicit, _) => {
                VariableDeclaration::parse_list(source, &header.signature_tokens)
            },

            (SignatureKind::Absent, _) if declare_when_absent => {
                let declarations = infer();
                if !declarations.is_empty() {
                    operation.insert_str(
                        header.selection_open,
                        &format!("({}) ", variable_declaration::join_declarations(&declarations)),
                    );
                }
                declarations
            },

            _ => vec![],
        };

        let resolved = self.fragment_registry.resolve_spreads(&operation)?;
        let fragments = self.fragment_registry.definition_texts(&resolved.used_fragments)?;
        let document =
            std::iter::once(resolved.rewritten_text.as_str())
                .chain(fragments.iter().map(String::as_str))
                .collect::<Vec<_>>()
                .join("\n");

        log::trace!("Compiled {} document:\n{document}", template.kind());
        Ok(CompiledQuery {
            declarations,
            document,
            fragment_names: resolved.used_fragments,
            fragments,
            kind: template.kind(),
            operation: resolved.rewritten_text,
            operation_name: header.operation_name,
        })
    }

    pub fn fragment_registry(&self) -> &'fragreg FragmentRegistry {
        self.fragment_registry
    }

    pub fn new(fragment_registry: &'fragreg FragmentRegistry) -> Self {
        Self {
            always_autodeclare: false,
            fragment_registry,
        }
    }

    /// When set, templates without any signature are compiled as though
    /// they had requested `(@autodeclare)`.
    pub fn with_always_autodeclare(mut self, always_autodeclare: bool) -> Self {
        self.always_autodeclare = always_autodeclare;
        self
    }
}
