mod client_args;
mod compile;
mod request;

use crate::Cli;
use crate::CommandResult;
use compile::CompileCmd;
use request::RequestCmd;

#[derive(Debug, clap::Parser)]
#[command(name = "graphql")]
pub(crate) enum CommandEnum {
    /// Compile an operation template and print the resulting document.
    Compile(Box<CompileCmd>),
    /// Compile one or more operation templates and send them to a GraphQL
    /// endpoint.
    Request(Box<RequestCmd>),
}
impl CommandEnum {
    pub(crate) async fn run(self, cli: Cli) -> CommandResult {
        match self {
            Self::Compile(cmd) => cmd.run(cli).await,
            Self::Request(cmd) => cmd.run(cli).await,
        }
    }
}
