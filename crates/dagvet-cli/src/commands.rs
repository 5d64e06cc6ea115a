use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use dagvet_agent::{host, AgentConfig, PathTruthyPolicy, Verdict};
use dagvet_codec::{decode, encode_block, identifier_of};
use dagvet_protocol::{Envelope, Message, MessageBody, MessageRegistry, NodeBundle, Start};
use dagvet_types::{Block, Cid, Value};
use serde_json::json;

use crate::cli::*;

/// Dispatch a parsed command line.
pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Cid(args) => cmd_cid(args, format),
        Command::Start(args) => cmd_start(args, format),
        Command::Inspect(args) => cmd_inspect(args, format),
        Command::Validate(args) => cmd_validate(args, format),
        Command::Config(args) => cmd_config(args),
    }
}

fn cmd_cid(args: CidArgs, format: OutputFormat) -> anyhow::Result<()> {
    let value = read_json_value(&args.file)?;
    let (cid, block) = encode_block(&value)?;
    match format {
        OutputFormat::Text => println!("{}  {} bytes", cid.to_string().yellow(), block.len()),
        OutputFormat::Json => print_json(&json!({ "cid": cid.to_string(), "bytes": block.len() }))?,
    }
    Ok(())
}

fn cmd_start(args: StartArgs, format: OutputFormat) -> anyhow::Result<()> {
    let values = args
        .files
        .iter()
        .map(|p| read_json_value(p))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let start = build_start(&values, args.keyed)?;
    let bytes = start.encode()?;
    fs::write(&args.out, &bytes).with_context(|| format!("writing {}", args.out.display()))?;

    match format {
        OutputFormat::Text => {
            println!("{} Wrote start envelope to {}", "✓".green().bold(), args.out.display());
            println!("  Tip: {}", start.tip.to_string().yellow());
            println!("  Nodes: {}", start.nodes.len());
            println!("  Size: {} bytes", bytes.len());
        }
        OutputFormat::Json => print_json(&json!({
            "out": args.out.display().to_string(),
            "tip": start.tip.to_string(),
            "nodes": start.nodes.len(),
            "bytes": bytes.len(),
        }))?,
    }
    Ok(())
}

fn cmd_inspect(args: InspectArgs, format: OutputFormat) -> anyhow::Result<()> {
    let bytes = fs::read(&args.file).with_context(|| format!("reading {}", args.file.display()))?;
    let message = MessageRegistry::standard().decode(&bytes)?;
    let description = describe(&message);
    match format {
        OutputFormat::Text => {
            println!("Type: {}", message.type_tag().cyan().bold());
            println!("{}", serde_json::to_string_pretty(&description)?);
        }
        OutputFormat::Json => print_json(&description)?,
    }
    Ok(())
}

fn cmd_validate(args: ValidateArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => AgentConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AgentConfig::default(),
    };
    let bytes = fs::read(&args.file).with_context(|| format!("reading {}", args.file.display()))?;
    let start = Start::from_envelope(&Envelope::decode_with_limit(&bytes, config.max_message_bytes)?)?;

    let policy = Arc::new(PathTruthyPolicy::new(args.path.as_str()));
    let runtime = tokio::runtime::Runtime::new()?;
    let verdict = runtime.block_on(host::validate(&start, policy, &config))?;

    match format {
        OutputFormat::Text => {
            let shown = match &verdict {
                Verdict::Ok => "ok".green().bold(),
                Verdict::Invalid => "invalid".red().bold(),
                Verdict::Other(s) => s.yellow().bold(),
            };
            println!("{} at {} → {}", start.tip.to_string().dimmed(), args.path, shown);
        }
        OutputFormat::Json => print_json(&json!({
            "tip": start.tip.to_string(),
            "path": args.path,
            "result": verdict.as_str(),
        }))?,
    }

    if !verdict.is_ok() {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_config(args: ConfigArgs) -> anyhow::Result<()> {
    let config = match &args.file {
        Some(path) => AgentConfig::load(path)?,
        None => AgentConfig::default(),
    };
    print!("{}", config.to_toml_string()?);
    Ok(())
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_json_value(path: &Path) -> anyhow::Result<Value> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let json: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    Value::from_json(&json).with_context(|| format!("converting {}", path.display()))
}

/// Encode each value as a block; the first one is the tip.
fn build_start(values: &[Value], keyed: bool) -> anyhow::Result<Start> {
    let blocks = values
        .iter()
        .map(encode_block)
        .collect::<Result<Vec<(Cid, Block)>, _>>()?;
    let Some(tip) = blocks.first().map(|(cid, _)| *cid) else {
        bail!("at least one document is required");
    };
    let nodes = if keyed {
        NodeBundle::Keyed(blocks)
    } else {
        NodeBundle::Sequence(blocks.into_iter().map(|(_, block)| block).collect())
    };
    Ok(Start::new(tip, nodes))
}

fn describe_node(cid: &Cid, block: &Block) -> serde_json::Value {
    json!({
        "cid": cid.to_string(),
        "bytes": block.len(),
        "value": decode(block.as_bytes()).map(|v| v.to_json()).unwrap_or(serde_json::Value::Null),
    })
}

fn describe(message: &Message) -> serde_json::Value {
    match message {
        Message::Start(start) => {
            let nodes: Vec<_> = match &start.nodes {
                NodeBundle::Sequence(blocks) => blocks
                    .iter()
                    .map(|b| describe_node(&identifier_of(b.as_bytes()), b))
                    .collect(),
                NodeBundle::Keyed(pairs) => pairs.iter().map(|(c, b)| describe_node(c, b)).collect(),
            };
            json!({ "tip": start.tip.to_string(), "nodes": nodes })
        }
        Message::Finished(finished) => json!({ "result": finished.result.as_str() }),
        Message::GetNode(request) => json!({ "cid": request.cid.to_string() }),
        Message::GetNodeResponse(response) => describe_node(&response.cid, &response.node),
        Message::Unrecognized { payload, .. } => json!({
            "bytes": payload.len(),
            "value": decode(payload).map(|v| v.to_json()).unwrap_or(serde_json::Value::Null),
        }),
    }
}
