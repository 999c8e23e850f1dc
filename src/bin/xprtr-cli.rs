use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use xp_router::cohorts::{assign_cohorts, CohortAssignment, CohortStrategy};
use xp_router::config::load_routing;
use xp_router::upload::{
    upload_cohort_assignments, upload_services, ConfigSink, MemorySink, RedisSettings, RedisSink,
};

#[derive(Parser)]
#[command(name = "xprtr-cli")]
#[command(about = "Cohort assignment and configuration upload for the experiment router", long_about = None)]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SinkArgs {
    /// Redis password
    #[arg(short = 'p', long = "passwd", env = "REDIS_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Redis hostname
    #[arg(short = 'H', long, env = "REDIS_HOST", default_value = "localhost")]
    host: String,

    /// Redis port
    #[arg(short = 'P', long, env = "REDIS_PORT", default_value_t = 6379)]
    port: u16,

    /// Print the keys instead of writing them
    #[arg(long)]
    dry_run: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the version
    Version,
    /// Generate a YAML cohort assignment for a set of client ids
    ///
    /// Output schema:
    ///   cohort-strategy-name: <name>
    ///   cohorts:
    ///   - cohort-name: <cohort-name>
    ///     client-ids: [<client-id>, ...]
    AssignCohorts {
        /// Client ids or inclusive ranges, e.g. 7777 or 8888-9999
        #[arg(required = true)]
        client_id_ranges: Vec<String>,

        /// Cohort strategy (mod100, random)
        #[arg(short, long, default_value = "mod100")]
        strategy: String,

        /// Seed for the random strategy
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Upload a cohort assignment file (keys cohort-name:<strategy>:<client-id>)
    UploadCohortAssignments {
        /// YAML file produced by assign-cohorts
        yaml_file: PathBuf,

        #[command(flatten)]
        sink: SinkArgs,
    },
    /// Upload a routing document (keys treatment:<service>:<cohort>
    /// and treatment-details:<service>:<treatment>)
    UploadServices {
        /// YAML routing document
        yaml_file: PathBuf,

        #[command(flatten)]
        sink: SinkArgs,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "xp_router=info".into()),
        )
        .init();

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Version => {
            println!("Version: {}", env!("CARGO_PKG_VERSION"));
        }
        Commands::AssignCohorts {
            client_id_ranges,
            strategy,
            seed,
        } => {
            let strategy = CohortStrategy::from_name(&strategy, seed)?;
            eprintln!("Assigning cohorts using strategy \"{}\"...", strategy);

            let assignment = assign_cohorts(&client_id_ranges, strategy)?;
            let yaml = assignment.to_yaml()?;
            eprintln!(
                "{} client ids in {} cohorts",
                assignment.client_count(),
                assignment.cohorts.len()
            );
            print!("{}", yaml);
        }
        Commands::UploadCohortAssignments { yaml_file, sink } => {
            let assignment = CohortAssignment::from_yaml(&read(&yaml_file)?)?;
            let sink = Sink::open(&sink).await?;
            let written = upload_cohort_assignments(sink.as_dyn(), &assignment).await?;
            sink.print_dry_run();
            eprintln!(
                "Uploaded {} cohort assignments from \"{}\".",
                written,
                yaml_file.display()
            );
        }
        Commands::UploadServices { yaml_file, sink } => {
            let table = load_routing(&yaml_file)?;
            let sink = Sink::open(&sink).await?;
            let written = upload_services(sink.as_dyn(), &table).await?;
            sink.print_dry_run();
            eprintln!(
                "Uploaded {} service keys from \"{}\".",
                written,
                yaml_file.display()
            );
        }
    }
    Ok(())
}

fn read(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    fs::read_to_string(path).map_err(|e| format!("cannot read {}: {}", path.display(), e).into())
}

enum Sink {
    Memory(MemorySink),
    Redis(RedisSink),
}

impl Sink {
    async fn open(args: &SinkArgs) -> Result<Self, Box<dyn std::error::Error>> {
        if args.dry_run {
            return Ok(Sink::Memory(MemorySink::new()));
        }
        let settings = RedisSettings {
            host: args.host.clone(),
            port: args.port,
            password: args.password.clone(),
        };
        Ok(Sink::Redis(RedisSink::connect(&settings).await?))
    }

    fn as_dyn(&self) -> &dyn ConfigSink {
        match self {
            Sink::Memory(sink) => sink,
            Sink::Redis(sink) => sink,
        }
    }

    /// Print what a dry run would have written.
    fn print_dry_run(&self) {
        if let Sink::Memory(sink) = self {
            for (key, value) in sink.entries() {
                println!("{} -> {}", key, value);
            }
        }
    }
}
