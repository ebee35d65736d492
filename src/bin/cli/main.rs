use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use portfolio_catalog::{
    adapters::outbound::imaging::render_derivatives,
    domain::{
        models::{DerivativeMode, DerivativeVariant},
        naming,
        ordering::MoveDirection,
        value_objects::Namespace,
    },
};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::{collections::BTreeMap, path::PathBuf};

#[derive(Parser, Debug)]
#[command(name = "catalog-cli")]
#[command(about = "CLI for managing a portfolio catalog server", long_about = None)]
struct Cli {
    /// Server URL
    #[arg(short, long, env = "CATALOG_URL", default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the records of a namespace
    List { namespace: Namespace },

    /// Show one record
    Get { namespace: Namespace, id: String },

    /// Upload files directly to storage and commit a record referencing them
    Upload {
        namespace: Namespace,
        /// Files to upload, in display order
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Record field, repeatable (`--field title=Dusk`)
        #[arg(short, long = "field", value_parser = parse_key_value)]
        fields: Vec<(String, String)>,
        /// Only upload; print the keys instead of committing a record
        #[arg(long)]
        no_commit: bool,
    },

    /// Delete a record and its stored assets
    Delete { namespace: Namespace, id: String },

    /// Move a record one place within its year
    Move {
        namespace: Namespace,
        id: String,
        #[arg(value_parser = parse_direction)]
        direction: MoveDirection,
    },

    /// Assign explicit numbers (`<id>=<number>`) and renumber every year
    Reorder {
        namespace: Namespace,
        #[arg(required = true, value_parser = parse_key_value)]
        assignments: Vec<(String, String)>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadIntentResponse {
    record_id: String,
    files: Vec<UploadTicket>,
    #[serde(default)]
    pending_metadata: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadTicket {
    file_name: String,
    original: SignedTarget,
    #[serde(default)]
    derivatives: Vec<SignedTarget>,
}

#[derive(Debug, Deserialize)]
struct SignedTarget {
    key: String,
    url: String,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    variant: Option<DerivativeVariant>,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| format!("expected <key>=<value>, got '{}'", raw))
}

fn parse_direction(raw: &str) -> Result<MoveDirection, String> {
    match raw.to_ascii_lowercase().as_str() {
        "up" => Ok(MoveDirection::Up),
        "down" => Ok(MoveDirection::Down),
        other => Err(format!("expected up or down, got '{}'", other)),
    }
}

/// Record fields as JSON; `year` is numeric, everything else is text
fn fields_json(fields: &[(String, String)]) -> Result<Value> {
    let mut map = Map::new();
    for (key, value) in fields {
        let value = if key == "year" {
            let year: i64 = value
                .parse()
                .with_context(|| format!("year must be a number, got '{}'", value))?;
            Value::from(year)
        } else {
            Value::from(value.as_str())
        };
        map.insert(key.clone(), value);
    }
    Ok(Value::Object(map))
}

async fn expect_success(response: Response) -> Result<Value> {
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);
    if !status.is_success() {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("no error message");
        bail!("server returned {}: {}", status, message);
    }
    Ok(body)
}

async fn put_target(client: &Client, target: &SignedTarget, data: Vec<u8>) -> Result<()> {
    let mut request = client.put(&target.url).body(data);
    for (name, value) in &target.headers {
        request = request.header(name.as_str(), value.as_str());
    }
    let response = request
        .send()
        .await
        .with_context(|| format!("Failed to upload {}", target.key))?;
    if !response.status().is_success() {
        bail!("upload of {} failed with {}", target.key, response.status());
    }
    Ok(())
}

async fn upload(
    client: &Client,
    base: &str,
    namespace: Namespace,
    files: Vec<PathBuf>,
    fields: Vec<(String, String)>,
    no_commit: bool,
) -> Result<Value> {
    let mut contents = Vec::with_capacity(files.len());
    let mut descriptors = Vec::with_capacity(files.len());
    for path in &files {
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .with_context(|| format!("Unusable file name: {}", path.display()))?
            .to_string();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        descriptors.push(json!({
            "fileName": file_name,
            "mimeType": naming::mime_for_extension(extension),
        }));
        contents.push(data);
    }

    let metadata: BTreeMap<String, String> = fields.iter().cloned().collect();
    let response = client
        .post(format!("{}/api/{}/uploads/intent", base, namespace))
        .json(&json!({ "files": descriptors, "metadata": metadata }))
        .send()
        .await
        .context("Failed to request upload intent")?;
    let intent: UploadIntentResponse = serde_json::from_value(expect_success(response).await?)
        .context("Unexpected upload intent response")?;

    let client_plan = namespace
        .derivative_plan()
        .filter(|plan| plan.mode == DerivativeMode::ClientUploaded);

    let mut keys = Vec::with_capacity(intent.files.len());
    for (ticket, data) in intent.files.iter().zip(contents) {
        if let Some(plan) = client_plan {
            let original = data.clone();
            let specs = plan.specs.to_vec();
            let derivatives =
                tokio::task::spawn_blocking(move || render_derivatives(&original, &specs))
                    .await
                    .context("Derivative worker failed")?
                    .with_context(|| format!("Failed to render derivatives of {}", ticket.file_name))?;

            for derivative in derivatives {
                let target = ticket
                    .derivatives
                    .iter()
                    .find(|target| target.variant == Some(derivative.variant))
                    .with_context(|| {
                        format!("No upload URL for {} derivative", derivative.variant.as_str())
                    })?;
                put_target(client, target, derivative.data.to_vec()).await?;
            }
        }

        put_target(client, &ticket.original, data).await?;
        println!("uploaded {} -> {}", ticket.file_name, ticket.original.key);
        keys.push(ticket.original.key.clone());
    }

    if no_commit {
        return Ok(json!({
            "recordId": intent.record_id,
            "keys": keys,
            "pendingMetadata": intent.pending_metadata,
        }));
    }

    let response = client
        .post(format!("{}/api/{}/records", base, namespace))
        .json(&json!({
            "recordId": intent.record_id,
            "fields": fields_json(&fields)?,
            "assets": keys,
            "metadata": intent.pending_metadata,
        }))
        .send()
        .await
        .context("Failed to commit record")?;
    expect_success(response).await
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = Client::new();
    let base = cli.url.trim_end_matches('/');

    let output = match cli.command {
        Commands::List { namespace } => {
            let response = client
                .get(format!("{}/api/{}/records", base, namespace))
                .send()
                .await
                .context("Failed to list records")?;
            expect_success(response).await?
        }
        Commands::Get { namespace, id } => {
            let response = client
                .get(format!("{}/api/{}/records/{}", base, namespace, id))
                .send()
                .await
                .context("Failed to fetch record")?;
            expect_success(response).await?
        }
        Commands::Upload {
            namespace,
            files,
            fields,
            no_commit,
        } => upload(&client, base, namespace, files, fields, no_commit).await?,
        Commands::Delete { namespace, id } => {
            let response = client
                .delete(format!("{}/api/{}/records/{}", base, namespace, id))
                .send()
                .await
                .context("Failed to delete record")?;
            expect_success(response).await?
        }
        Commands::Move {
            namespace,
            id,
            direction,
        } => {
            let response = client
                .post(format!("{}/api/{}/records/{}/move", base, namespace, id))
                .json(&json!({ "direction": direction }))
                .send()
                .await
                .context("Failed to move record")?;
            expect_success(response).await?
        }
        Commands::Reorder {
            namespace,
            assignments,
        } => {
            let mut items = Vec::with_capacity(assignments.len());
            for (id, number) in assignments {
                let number: u32 = number
                    .parse()
                    .with_context(|| format!("number for '{}' must be positive", id))?;
                items.push(json!({ "id": id, "number": number }));
            }
            let response = client
                .post(format!("{}/api/{}/reorder", base, namespace))
                .json(&json!({ "items": items }))
                .send()
                .await
                .context("Failed to reorder records")?;
            expect_success(response).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
