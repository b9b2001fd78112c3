use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use privatelink_proxy::variables::Variables;
use privatelink_proxy::{assembly, deploy, synthesize, AppConfig, CloudAssembly};

#[derive(Parser, Debug)]
#[command(name = "privatelink-proxy", version, about = "Synthesize and deploy a PrivateLink reverse proxy")]
struct Cli {
    /// log as json lines instead of human readable text
    #[arg(long, env = "PRIVATELINK_PROXY_LOG_JSON", global = true)]
    log_json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// write every stack template, the manifest and deploy.sh to the output directory
    Synth {
        #[command(flatten)]
        input: Input,
        #[arg(long, env = "PRIVATELINK_PROXY_OUT", default_value = "out")]
        out: PathBuf,
    },
    /// print the stacks in deployment order
    List {
        #[command(flatten)]
        input: Input,
    },
    /// create or update every stack in order
    Deploy {
        #[command(flatten)]
        input: Input,
    },
}

#[derive(Args, Debug)]
struct Input {
    #[arg(long, short, env = "PRIVATELINK_PROXY_CONFIG", default_value = "config/proxy.toml")]
    config: PathBuf,
    /// values for `${NAME}` placeholders in the config. Takes precedence over the environment.
    #[arg(long, env = "PRIVATELINK_PROXY_ENV_FILE")]
    env_file: Option<PathBuf>,
}

impl Input {
    fn synthesize(&self) -> anyhow::Result<CloudAssembly> {
        let mut vars = Variables::from_process_env();
        if let Some(path) = &self.env_file {
            vars.load_dot_env(path)?;
        }
        let config = AppConfig::load(&self.config, &vars)
            .with_context(|| format!("Failed to load {}", self.config.display()))?;
        let assembly = synthesize(&config).context("Failed to synthesize stacks")?;
        Ok(assembly)
    }
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if json {
        builder.json().with_current_span(false).init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    match cli.command {
        Command::Synth { input, out } => {
            let assembly = input.synthesize()?;
            let written = assembly::write_assembly(&assembly, &out)?;
            for path in written {
                println!("{}", path.display());
            }
        }
        Command::List { input } => {
            let assembly = input.synthesize()?;
            for stack in assembly.stacks.iter() {
                println!("{}\t{}\t{}\t{}", stack.name, stack.kind, stack.env.account, stack.env.region);
            }
        }
        Command::Deploy { input } => {
            let assembly = input.synthesize()?;
            let deployed = deploy::deploy_assembly(&assembly).await?;
            for stack in deployed {
                for (key, value) in stack.outputs {
                    println!("{}.{key} = {value}", stack.name);
                }
            }
        }
    }
    Ok(())
}
