use crate::Cli;
use crate::CommandResult;
use crate::RunnableCommand;
use crate::commands::client_args::ClientArgs;
use crate::output_utils;
use libgraphql_client::FragmentRegistry;
use libgraphql_client::QueryCompiler;
use std::path::PathBuf;

#[derive(Debug, clap::Args)]
pub(crate) struct CompileCmd {
    #[command(flatten)]
    client_args: ClientArgs,

    #[arg(
        help="Path to the operation template to compile.",
        name="OPERATION_PATH",
    )]
    operation_path: PathBuf,
}
impl CompileCmd {
    fn compile(&self) -> anyhow::Result<String> {
        let mut fragment_registry = FragmentRegistry::new();
        for tree in self.client_args.fragment_trees()? {
            fragment_registry.register(&tree)?;
        }
        log::debug!("Registered {} fragments.", fragment_registry.len());

        let template = self.client_args.load_template(&self.operation_path)?;
        let variables = self.client_args.variables()?;
        let compiled =
            QueryCompiler::new(&fragment_registry)
                .with_always_autodeclare(self.client_args.autodeclare)
                .compile(&template, Some(&variables))?;
        Ok(compiled.document().to_string())
    }
}

#[inherent::inherent]
impl RunnableCommand for CompileCmd {
    pub async fn run(self, _cli: Cli) -> CommandResult {
        match self.compile() {
            Ok(document) => CommandResult::stdout(format_args!("{document}")),
            Err(e) => CommandResult::stderr(format_args!(
                "{} Failed to compile {:#?}: {e:#}",
                output_utils::RED_X,
                self.operation_path,
            )),
        }
    }
}
