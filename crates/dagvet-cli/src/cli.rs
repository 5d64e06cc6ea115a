use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "dagvet",
    about = "dagvet: validate Merkle DAGs shipped as DAG-CBOR blocks",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Encode a JSON document as DAG-CBOR and print its CID
    Cid(CidArgs),
    /// Build a start envelope from JSON documents
    Start(StartArgs),
    /// Decode an envelope and print its contents
    Inspect(InspectArgs),
    /// Run a start envelope through an agent and report the verdict
    Validate(ValidateArgs),
    /// Print the effective agent configuration
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct CidArgs {
    /// JSON file; links are written `{"/": "<cid>"}`
    pub file: PathBuf,
}

#[derive(Args)]
pub struct StartArgs {
    /// JSON files, one block each; the first is the tip
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
    /// Where to write the envelope
    #[arg(short, long)]
    pub out: PathBuf,
    /// Emit nodes as a CID-keyed map instead of a list
    #[arg(long)]
    pub keyed: bool,
}

#[derive(Args)]
pub struct InspectArgs {
    pub file: PathBuf,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Encoded start envelope
    pub file: PathBuf,
    /// Path below the tip whose value must be truthy
    #[arg(short, long, default_value = "tree/ok")]
    pub path: String,
    /// Agent configuration (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct ConfigArgs {
    /// Agent configuration (TOML); defaults are shown when omitted
    pub file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_cid() {
        let cli = Cli::try_parse_from(["dagvet", "cid", "doc.json"]).unwrap();
        if let Command::Cid(args) = cli.command {
            assert_eq!(args.file, PathBuf::from("doc.json"));
        } else { panic!("wrong command"); }
        assert_eq!(cli.format, OutputFormat::Text);
    }

    #[test]
    fn parse_start() {
        let cli = Cli::try_parse_from(["dagvet", "start", "a.json", "b.json", "-o", "s.cbor", "--keyed"]).unwrap();
        if let Command::Start(args) = cli.command {
            assert_eq!(args.files.len(), 2);
            assert_eq!(args.out, PathBuf::from("s.cbor"));
            assert!(args.keyed);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_start_needs_files() {
        assert!(Cli::try_parse_from(["dagvet", "start", "-o", "s.cbor"]).is_err());
    }

    #[test]
    fn parse_validate_defaults() {
        let cli = Cli::try_parse_from(["dagvet", "validate", "s.cbor"]).unwrap();
        if let Command::Validate(args) = cli.command {
            assert_eq!(args.path, "tree/ok");
            assert!(args.config.is_none());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::try_parse_from(["dagvet", "inspect", "s.cbor", "--format", "json", "-v"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.format, OutputFormat::Json);
    }
}
