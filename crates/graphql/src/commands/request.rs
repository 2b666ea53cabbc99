use crate::Cli;
use crate::CommandResult;
use crate::RunnableCommand;
use crate::commands::client_args::ClientArgs;
use crate::output_utils;
use libgraphql_client::ClientOptions;
use libgraphql_client::GraphQLClient;
use libgraphql_client::HttpMethod;
use libgraphql_client::ReqwestExecutor;
use std::path::PathBuf;

const BATCH_KEY: &str = "cli";

#[derive(Debug, clap::Args)]
pub(crate) struct RequestCmd {
    #[command(flatten)]
    client_args: ClientArgs,

    #[arg(
        help="Send POST bodies form-encoded instead of as JSON.",
        long,
    )]
    form: bool,

    #[arg(
        help="A `Name: value` header to send with the request. May be \
             repeated.",
        long="header",
        short='H',
    )]
    headers: Vec<String>,

    #[arg(
        default_value="POST",
        help="HTTP method to send the request with (`GET` or `POST`).",
        long,
    )]
    method: HttpMethod,

    #[arg(
        help="Paths to one or more operation templates. Multiple operations \
             are merged and sent as a single request.",
        name="OPERATION_PATHS",
        required=true,
    )]
    operation_paths: Vec<PathBuf>,

    #[arg(
        help="URL of the GraphQL endpoint.",
        long,
    )]
    url: String,
}
impl RequestCmd {
    fn client(&self) -> anyhow::Result<GraphQLClient<ReqwestExecutor>> {
        let options = ClientOptions {
            always_autodeclare: self.client_args.autodeclare,
            method: self.method,
            ..ClientOptions::default()
        };
        let executor =
            if self.form {
                ReqwestExecutor::new()?.form_encoded()
            } else {
                ReqwestExecutor::new()?
            };

        let mut client = GraphQLClient::new(Some(self.url.to_string()), options, executor);
        for tree in self.client_args.fragment_trees()? {
            client.fragment(&tree)?;
        }
        client.headers(self.parsed_headers()?);
        Ok(client)
    }

    fn parsed_headers(&self) -> anyhow::Result<Vec<(String, String)>> {
        self.headers.iter()
            .map(|header| match header.split_once(':') {
                Some((name, value)) => Ok((name.trim().to_string(), value.trim().to_string())),
                None => anyhow::bail!("Expected a `Name: value` header, found `{header}`"),
            })
            .collect()
    }

    async fn send(&self) -> anyhow::Result<serde_json::Value> {
        let mut client = self.client()?;
        let variables = self.client_args.variables()?;

        if let [operation_path] = self.operation_paths.as_slice() {
            let template = self.client_args.load_template(operation_path)?;
            let data = client.run(&template, variables).await?;
            return Ok(serde_json::Value::Object(data));
        }

        for operation_path in &self.operation_paths {
            let template = self.client_args.load_template(operation_path)?;
            // Each caller's slice is also in the aggregate, in merge order.
            let _pending = client.merge(BATCH_KEY, &template, variables.clone())?;
        }
        let aggregate = client.commit(BATCH_KEY).await?;
        log::info!(
            "{} Sent {} merged operations in one request.",
            output_utils::GREEN_CHECK,
            self.operation_paths.len(),
        );
        Ok(serde_json::Value::Object(aggregate))
    }
}

#[inherent::inherent]
impl RunnableCommand for RequestCmd {
    pub async fn run(self, _cli: Cli) -> CommandResult {
        let data = match self.send().await {
            Ok(data) => data,
            Err(e) => return CommandResult::stderr(format_args!(
                "{} Request to {} failed: {e:#}",
                output_utils::RED_X,
                self.url,
            )),
        };

        match serde_json::to_string_pretty(&data) {
            Ok(json) => CommandResult::stdout(format_args!("{json}")),
            Err(e) => CommandResult::stderr(format_args!(
                "{} Failed to print the response: {e}",
                output_utils::RED_X,
            )),
        }
    }
}
