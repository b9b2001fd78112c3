use std::collections::{BTreeMap, HashMap};

use aws_config::{BehaviorVersion, Region};
use aws_sdk_cloudformation::error::DisplayErrorContext;
use aws_sdk_cloudformation::types::{Capability, OnFailure, StackStatus};
use aws_sdk_cloudformation::Client;

use crate::driver::CloudAssembly;
use crate::error::{Result, SynthError};

const POLL_INTERVAL: tokio::time::Duration = tokio::time::Duration::from_secs(3);

#[derive(Debug, Clone)]
pub struct DeployedStack {
    pub name: String,
    pub region: String,
    pub outputs: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StackState {
    Done,
    InProgress,
    Failed,
}

fn stack_state(status: &StackStatus) -> StackState {
    match status {
        StackStatus::CreateComplete |
        StackStatus::UpdateComplete |
        StackStatus::ImportComplete => StackState::Done,

        StackStatus::CreateInProgress |
        StackStatus::DeleteInProgress |
        StackStatus::ImportInProgress |
        StackStatus::ImportRollbackInProgress |
        StackStatus::ReviewInProgress |
        StackStatus::RollbackInProgress |
        StackStatus::UpdateCompleteCleanupInProgress |
        StackStatus::UpdateInProgress |
        StackStatus::UpdateRollbackCompleteCleanupInProgress |
        StackStatus::UpdateRollbackInProgress => StackState::InProgress,

        // rollbacks count as failures, the template we asked for is not what's deployed
        _ => StackState::Failed,
    }
}

/// an update that changes nothing is rejected by CloudFormation with this message
fn is_no_update(msg: &str) -> bool {
    msg.contains("No updates are to be performed")
}

fn is_missing_stack(msg: &str) -> bool {
    msg.contains("does not exist")
}

fn deploy_error(stack: &str, reason: impl Into<String>) -> SynthError {
    SynthError::DeployError { stack: stack.to_string(), reason: reason.into() }
}

async fn client_for(region: &str) -> Client {
    let shared_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await;
    Client::new(&shared_config)
}

/// deploys every stack of the assembly in order, waiting for each one to finish
/// before starting the next. Any failure stops the run.
pub async fn deploy_assembly(assembly: &CloudAssembly) -> Result<Vec<DeployedStack>> {
    let mut clients: HashMap<String, Client> = HashMap::new();
    let mut deployed = vec![];
    for stack in assembly.stacks.iter() {
        let region = &stack.env.region;
        if !clients.contains_key(region) {
            clients.insert(region.clone(), client_for(region).await);
        }
        let client = match clients.get(region) {
            Some(c) => c,
            None => return Err(deploy_error(&stack.name, format!("no client for region {region}"))),
        };
        tracing::info!(stack = %stack.name, %region, "deploying stack");
        let body = stack.template.to_json_pretty()?;
        let outputs = if create_or_update_stack(client, &stack.name, &body).await? {
            wait_for_output(client, &stack.name).await?
        } else {
            current_outputs(client, &stack.name).await?
        };
        for (key, value) in outputs.iter() {
            tracing::info!(stack = %stack.name, output = %key, %value, "stack output");
        }
        deployed.push(DeployedStack { name: stack.name.clone(), region: region.clone(), outputs });
    }
    Ok(deployed)
}

pub async fn does_stack_exist(client: &Client, name: &str) -> Result<bool> {
    match client.describe_stacks().stack_name(name).send().await {
        Ok(_) => Ok(true),
        Err(e) => {
            let e_str = format!("{}", DisplayErrorContext(&e));
            if is_missing_stack(&e_str) {
                return Ok(false);
            }
            Err(deploy_error(name, e_str))
        }
    }
}

async fn describe_stack(client: &Client, name: &str) -> Result<(StackState, aws_sdk_cloudformation::types::Stack)> {
    let resp = client.describe_stacks().stack_name(name).send().await
        .map_err(|e| deploy_error(name, format!("{}", DisplayErrorContext(&e))))?;
    let stack = match resp.stacks().first() {
        Some(s) => s,
        None => return Err(deploy_error(name, format!("Stack {name} not found"))),
    };
    let status = match stack.stack_status() {
        Some(s) => s,
        None => return Err(deploy_error(name, format!("Stack {name} has no status"))),
    };
    match stack_state(status) {
        StackState::Failed => {
            let reason = stack.stack_status_reason().unwrap_or("Failed to get stack failure reason");
            Err(deploy_error(name, format!("{}: {reason}", status.as_str())))
        }
        state => Ok((state, stack.clone())),
    }
}

fn collect_outputs(stack: &aws_sdk_cloudformation::types::Stack) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for output in stack.outputs() {
        if let (Some(key), Some(val)) = (output.output_key(), output.output_value()) {
            out.insert(key.to_string(), val.to_string());
        }
    }
    out
}

/// outputs of a stack that was left untouched
async fn current_outputs(client: &Client, name: &str) -> Result<BTreeMap<String, String>> {
    let resp = client.describe_stacks().stack_name(name).send().await
        .map_err(|e| deploy_error(name, format!("{}", DisplayErrorContext(&e))))?;
    match resp.stacks().first() {
        Some(stack) => Ok(collect_outputs(stack)),
        None => Err(deploy_error(name, format!("Stack {name} not found"))),
    }
}

pub async fn wait_for_output(client: &Client, name: &str) -> Result<BTreeMap<String, String>> {
    loop {
        tokio::time::sleep(POLL_INTERVAL).await;
        let (state, stack) = describe_stack(client, name).await?;
        if state == StackState::Done {
            return Ok(collect_outputs(&stack));
        }
        tracing::debug!(stack = name, status = ?stack.stack_status(), "still in progress");
    }
}

/// starts creating or updating the stack. Returns false if there was nothing to update.
pub async fn create_or_update_stack(client: &Client, name: &str, body: &str) -> Result<bool> {
    if does_stack_exist(client, name).await? {
        tracing::info!(stack = name, "updating");
        let res = client
            .update_stack()
            .capabilities(Capability::CapabilityNamedIam)
            .capabilities(Capability::CapabilityIam)
            .stack_name(name)
            .template_body(body)
            .send()
            .await;
        if let Err(e) = res {
            let e_str = format!("{}", DisplayErrorContext(&e));
            if is_no_update(&e_str) {
                tracing::info!(stack = name, "no changes");
                return Ok(false);
            }
            return Err(deploy_error(name, e_str));
        }
    } else {
        tracing::info!(stack = name, "creating");
        client
            .create_stack()
            .on_failure(OnFailure::Delete)
            .capabilities(Capability::CapabilityNamedIam)
            .capabilities(Capability::CapabilityIam)
            .stack_name(name)
            .template_body(body)
            .send()
            .await
            .map_err(|e| deploy_error(name, format!("{}", DisplayErrorContext(&e))))?;
    }
    Ok(true)
}
