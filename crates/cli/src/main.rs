mod cmd;
mod logging;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use cmd::compile::Target;

#[derive(Debug, Parser)]
#[command(
    name = "cval",
    version,
    about = "Compile declarative field descriptions into object schemas, wire schemas and validators"
)]
struct Cli {
    /// Configuration file (default: $XDG_CONFIG_HOME/combined-validator/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Validate configuration and print resolved settings
    Doctor,

    /// Print the normalized form of a schema
    Normalize(CompileArgs),

    /// Print the wire schema (JSON Type Definition) of a schema
    Wire(CompileArgs),

    /// Print the object schema built from a schema
    ObjectSchema(CompileArgs),

    /// Keep the declared fields of a document, type-checked
    Extract(ExtractArgs),
}

#[derive(Debug, Args)]
pub struct CompileArgs {
    /// Schema file (JSON or YAML)
    pub schema: PathBuf,

    /// Private schema merged over the public one
    #[arg(long)]
    pub private: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// Schema file (JSON or YAML)
    pub schema: PathBuf,

    /// Document to extract from (JSON or YAML)
    pub data: PathBuf,

    /// Also check enums, length rules and cross-field rules
    #[arg(long)]
    pub validate: bool,
}

fn main() {
    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Doctor => cmd::doctor::run(config),
        Commands::Normalize(args) => cmd::compile::run(&cmd::load_config(config), Target::Normalized, &args),
        Commands::Wire(args) => cmd::compile::run(&cmd::load_config(config), Target::Wire, &args),
        Commands::ObjectSchema(args) => {
            cmd::compile::run(&cmd::load_config(config), Target::ObjectSchema, &args)
        }
        Commands::Extract(args) => cmd::extract::run(&cmd::load_config(config), &args),
    }

    logging::shutdown();
}
