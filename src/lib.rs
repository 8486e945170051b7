// src/lib.rs

pub mod app;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod probe;
pub mod store;
pub mod types;

use std::collections::BTreeMap;

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use crate::app::Hub;
use crate::cli::{CliArgs, Command, EndpointCommand, PresetCommand, RunArgs, SiteCommand};
use crate::config::load_or_default;
use crate::engine::{NewPreset, RunRequest, RunTicket, create_preset, delete_preset, list_presets};
use crate::store::{NewCheck, NewEndpoint};

/// High-level entry point used by `main.rs`.
///
/// Loads the config, opens the record store and executes one command,
/// printing its result as JSON on stdout.
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_or_default(args.config.as_deref())?;
    let hub = Hub::open(cfg)?;

    match args.command {
        Command::Run(run) => run_suite(&hub, run).await,
        Command::Status { run_id } => print_json(&hub.resolver().status(run_id)?),
        Command::History { limit } => print_json(&hub.history(limit)?),
        Command::Preset(cmd) => preset_command(&hub, cmd).await,
        Command::Endpoint(cmd) => endpoint_command(&hub, cmd).await,
        Command::Site(cmd) => site_command(&hub, cmd).await,
    }
}

async fn run_suite(hub: &Hub, args: RunArgs) -> Result<()> {
    let request = RunRequest {
        suite_path: args.suite,
        variables: (!args.variables.is_empty()).then(|| args.variables.into_iter().collect()),
        extra_args: (!args.extra_args.is_empty()).then_some(args.extra_args),
    };
    let ticket = hub.orchestrator().submit(request)?;
    wait_and_report(hub, ticket).await
}

/// Print the accepted response, wait for the run, print its final status.
async fn wait_and_report(hub: &Hub, ticket: RunTicket) -> Result<()> {
    print_json(ticket.accepted())?;
    let accepted = ticket.wait().await;
    debug!(run_id = %accepted.run_id, "background run finished");
    print_json(&hub.resolver().status(accepted.run_id)?)
}

async fn preset_command(hub: &Hub, cmd: PresetCommand) -> Result<()> {
    match cmd {
        PresetCommand::Add {
            name,
            suite,
            variables,
            tags,
            extra_args,
        } => {
            let variables: BTreeMap<String, String> = variables.into_iter().collect();
            let preset = create_preset(
                hub.presets(),
                NewPreset {
                    name,
                    suite_path: suite,
                    variables: (!variables.is_empty()).then_some(variables),
                    tags,
                    extra_args,
                },
            )?;
            print_json(&preset)
        }
        PresetCommand::List => print_json(&list_presets(hub.presets())?),
        PresetCommand::Rm { id } => {
            delete_preset(hub.presets(), id)?;
            print_json(&serde_json::json!({ "deleted": true }))
        }
        PresetCommand::Run { id } => {
            let ticket = hub.orchestrator().submit_from_preset(id)?;
            wait_and_report(hub, ticket).await
        }
    }
}

async fn endpoint_command(hub: &Hub, cmd: EndpointCommand) -> Result<()> {
    let probes = hub.probes();
    match cmd {
        EndpointCommand::Add {
            name,
            url,
            method,
            headers,
            body,
        } => {
            let headers: BTreeMap<String, String> = headers.into_iter().collect();
            print_json(&probes.create_endpoint(NewEndpoint {
                name,
                method,
                url,
                headers: (!headers.is_empty()).then_some(headers),
                body,
            })?)
        }
        EndpointCommand::List => print_json(&probes.list_endpoints()?),
        EndpointCommand::Rm { id } => {
            probes.delete_endpoint(id)?;
            print_json(&serde_json::json!({ "deleted": true }))
        }
        EndpointCommand::Run { id } => print_json(&probes.run_endpoint(id).await?),
        EndpointCommand::RunAll => print_json(&probes.run_all_endpoints().await?),
    }
}

async fn site_command(hub: &Hub, cmd: SiteCommand) -> Result<()> {
    let probes = hub.probes();
    match cmd {
        SiteCommand::Add { url, label } => print_json(&probes.create_check(NewCheck { url, label })?),
        SiteCommand::List => print_json(&probes.list_checks()?),
        SiteCommand::Rm { id } => {
            probes.delete_check(id)?;
            print_json(&serde_json::json!({ "deleted": true }))
        }
        SiteCommand::Run { id } => print_json(&probes.run_check(id).await?),
        SiteCommand::RunAll => print_json(&probes.run_all_checks().await?),
        SiteCommand::Status => print_json(&probes.checks_with_status()?),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
