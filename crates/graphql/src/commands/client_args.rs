use crate::fragment_loader;
use libgraphql_client::FragmentTree;
use libgraphql_client::OperationKind;
use libgraphql_client::QueryTemplate;
use libgraphql_client::Variables;
use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

/// Arguments shared by every command that compiles operations.
#[derive(Debug, clap::Args)]
pub(crate) struct ClientArgs {
    #[arg(
        help="Treat operations without a variable signature as though they \
             had requested `(@autodeclare)`.",
        long,
    )]
    pub autodeclare: bool,

    #[arg(
        default_values_t=[
            "graphql".to_string(),
            "gql".to_string(),
        ],
        help="Set of file extensions to filter to when searching for fragment \
             files within a directory.",
        long,
        value_delimiter = ',',
    )]
    fragment_file_exts: Vec<String>,

    #[arg(
        help="A JSON fragment tree, or a directory of fragment files whose \
             relative paths name the fragments (`auth/user.graphql` is \
             `auth.user`). May be repeated.",
        long="fragments",
        short='f',
    )]
    fragment_paths: Vec<PathBuf>,

    #[arg(
        help="Compile operations as mutations instead of queries.",
        long,
    )]
    mutation: bool,

    #[arg(
        help="Variables as a JSON object, or `@<path>` to read them from a \
             file.",
        long,
    )]
    variables: Option<String>,
}
impl ClientArgs {
    pub fn fragment_trees(&self) -> anyhow::Result<Vec<FragmentTree>> {
        let file_exts: HashSet<String> =
            self.fragment_file_exts.iter()
                .map(|ext| ext.trim_start_matches('.').to_string())
                .collect();

        log::debug!("Loading {} fragment libraries...", self.fragment_paths.len());
        self.fragment_paths.iter()
            .map(|path| fragment_loader::load_fragments(path, &file_exts))
            .collect()
    }

    pub fn kind(&self) -> OperationKind {
        if self.mutation {
            OperationKind::Mutation
        } else {
            OperationKind::Query
        }
    }

    pub fn load_template(&self, path: &Path) -> anyhow::Result<QueryTemplate> {
        let source = std::fs::read_to_string(path)?;
        Ok(QueryTemplate::prepare(self.kind(), source.trim()))
    }

    pub fn variables(&self) -> anyhow::Result<Variables> {
        match self.variables.as_deref() {
            Some(arg) => fragment_loader::load_variables(arg),
            None => Ok(Variables::new()),
        }
    }
}
