use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use flytedeck_api::{AdminApi, AdminClient};
use flytedeck_types::{Identifier, ResourceType, WorkflowExecutionIdentifier};
use flytedeck_util::ConsoleConfig;

mod commands;

/// Watch executions and launch workflows from the terminal.
#[derive(Parser, Debug)]
#[command(name = "flytedeck", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Inspect workflow executions
    #[command(subcommand)]
    Execution(ExecutionCommand),
    /// Inspect registered workflows
    #[command(subcommand)]
    Workflow(WorkflowCommand),
    /// Launch a workflow version through its launch plan
    Launch(LaunchArgs),
}

#[derive(Subcommand, Debug)]
enum ExecutionCommand {
    /// Print phase changes until the execution finishes
    Watch(ExecutionArgs),
    /// Abort a running execution
    Terminate(TerminateArgs),
    /// Print the inputs and outputs of an execution or one of its nodes as JSON
    Data(DataArgs),
}

#[derive(Subcommand, Debug)]
enum WorkflowCommand {
    /// Print the launch inputs of a workflow version as JSON
    Inputs(EntityArgs),
}

#[derive(Args, Debug)]
struct ExecutionArgs {
    #[arg(long)]
    project: String,
    #[arg(long)]
    domain: String,
    #[arg(long)]
    name: String,
}

impl ExecutionArgs {
    fn identifier(&self) -> WorkflowExecutionIdentifier {
        WorkflowExecutionIdentifier {
            project: self.project.clone(),
            domain: self.domain.clone(),
            name: self.name.clone(),
        }
    }
}

#[derive(Args, Debug)]
struct TerminateArgs {
    #[command(flatten)]
    execution: ExecutionArgs,

    /// Reason recorded with the abort
    #[arg(long, default_value = "terminated from flytedeck")]
    cause: String,
}

#[derive(Args, Debug)]
struct DataArgs {
    #[command(flatten)]
    execution: ExecutionArgs,

    /// Node whose data to print instead of the execution's
    #[arg(long)]
    node_id: Option<String>,
}

#[derive(Args, Debug)]
struct EntityArgs {
    #[arg(long)]
    project: String,
    #[arg(long)]
    domain: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    version: String,
}

impl EntityArgs {
    fn identifier(&self, resource_type: ResourceType) -> Identifier {
        Identifier::new(resource_type, &self.project, &self.domain, &self.name, &self.version)
    }
}

#[derive(Args, Debug)]
struct LaunchArgs {
    #[command(flatten)]
    entity: EntityArgs,

    /// Input value as NAME=VALUE; repeat for each input
    #[arg(long = "input", value_name = "NAME=VALUE", value_parser = parse_key_value)]
    inputs: Vec<(String, String)>,

    /// Name for the new execution; generated by the server when omitted
    #[arg(long)]
    execution_name: Option<String>,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got '{raw}'")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = ConsoleConfig::load()?;
    let api: Arc<dyn AdminApi> = Arc::new(AdminClient::from_config(&config)?);

    match cli.command {
        Command::Execution(ExecutionCommand::Watch(args)) => {
            commands::watch_execution(api, args.identifier(), config.execution_refresh_interval).await
        }
        Command::Execution(ExecutionCommand::Terminate(args)) => {
            commands::terminate(api, args.execution.identifier(), &args.cause).await
        }
        Command::Execution(ExecutionCommand::Data(args)) => {
            commands::print_execution_data(api, args.execution.identifier(), args.node_id).await
        }
        Command::Workflow(WorkflowCommand::Inputs(args)) => {
            commands::print_workflow_inputs(api.as_ref(), &args.identifier(ResourceType::LaunchPlan)).await
        }
        Command::Launch(args) => {
            let id = args.entity.identifier(ResourceType::LaunchPlan);
            commands::launch(api.as_ref(), &id, args.inputs, args.execution_name).await
        }
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_launch_inputs() {
        let cli = Cli::try_parse_from([
            "flytedeck",
            "launch",
            "--project",
            "flyte",
            "--domain",
            "development",
            "--name",
            "core.hello",
            "--version",
            "v2",
            "--input",
            "count=3",
            "--input",
            "expr=a=b",
        ])
        .expect("valid arguments");

        let Command::Launch(args) = cli.command else {
            panic!("expected launch command");
        };
        assert_eq!(args.inputs, vec![("count".into(), "3".into()), ("expr".into(), "a=b".into())]);
        assert_eq!(args.entity.identifier(ResourceType::LaunchPlan).to_string(), "launch_plan/flyte/development/core.hello/v2");
    }

    #[test]
    fn terminate_defaults_cause() {
        let cli = Cli::try_parse_from([
            "flytedeck",
            "execution",
            "terminate",
            "--project",
            "flyte",
            "--domain",
            "development",
            "--name",
            "run-1",
        ])
        .expect("valid arguments");

        let Command::Execution(ExecutionCommand::Terminate(args)) = cli.command else {
            panic!("expected terminate command");
        };
        assert_eq!(args.cause, "terminated from flytedeck");
        assert_eq!(args.execution.identifier().to_string(), "flyte/development/run-1");
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse_key_value("count").is_err());
        assert!(parse_key_value("=3").is_err());
        assert_eq!(parse_key_value("empty="), Ok(("empty".into(), String::new())));
    }
}
