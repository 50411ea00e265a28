mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    config::ConfigSubcommand, goal::GoalSubcommand, key::KeySubcommand,
    routine::RoutineSubcommand, weekly::WeeklySubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "routine",
    about = "Habit tracker with an AI coach: mark days, see streaks, reflect weekly",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .routine/)
    #[arg(long, global = true, env = "ROUTINE_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Routine id (default: the single goal)
    #[arg(long, global = true)]
    routine: Option<u64>,

    /// Treat this day (YYYY-MM-DD) as today
    #[arg(long, global = true)]
    date: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize .routine/ in the current directory
    Init,

    /// Set or show the single goal
    Goal {
        #[command(subcommand)]
        subcommand: GoalSubcommand,
    },

    /// Manage multiple routines
    Routine {
        #[command(subcommand)]
        subcommand: RoutineSubcommand,
    },

    /// Mark today completed
    Done,

    /// Mark today skipped
    Skip,

    /// Streaks and success rate over the statistics window
    Stats,

    /// Success rate per week, oldest first
    Trend,

    /// Completed or not, day by day
    Daily,

    /// The last seven days
    Week,

    /// Every routine's marks for one month
    Calendar {
        /// Month as YYYY-MM (default: the current month)
        #[arg(long)]
        month: Option<String>,
    },

    /// Failure reasons by category
    Failures,

    /// Detect failure reasons in free text
    Classify { text: String },

    /// Write today's reflection and get coach feedback
    Reflect {
        text: String,
        /// Failure reason id (repeatable); detected from the text when omitted
        #[arg(long = "reason")]
        reasons: Vec<String>,
    },

    /// Weekly reflection
    Weekly {
        #[command(subcommand)]
        subcommand: WeeklySubcommand,
    },

    /// Suggested adjustments for this week
    Adjust,

    /// Talk to the coach
    Chat { message: Option<String> },

    /// Manage the coach API key
    Key {
        #[command(subcommand)]
        subcommand: KeySubcommand,
    },

    /// Show or validate .routine/config.yaml
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Serve the JSON API
    Serve {
        /// Port to listen on (0 = OS-assigned)
        #[arg(long, default_value = "0")]
        port: u16,

        /// Don't open browser automatically
        #[arg(long)]
        no_open: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    let ctx = cmd::Ctx {
        root: &root,
        json: cli.json,
        routine: cli.routine,
        date: cli.date.as_deref(),
    };

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Goal { subcommand } => cmd::goal::run(&ctx, subcommand),
        Commands::Routine { subcommand } => cmd::routine::run(&ctx, subcommand),
        Commands::Done => cmd::mark::run(&ctx, routine_core::types::DayStatus::Completed),
        Commands::Skip => cmd::mark::run(&ctx, routine_core::types::DayStatus::Skipped),
        Commands::Stats => cmd::stats::stats(&ctx),
        Commands::Trend => cmd::stats::trend(&ctx),
        Commands::Daily => cmd::stats::daily(&ctx),
        Commands::Week => cmd::stats::week(&ctx),
        Commands::Calendar { month } => cmd::calendar::run(&ctx, month.as_deref()),
        Commands::Failures => cmd::failures::failures(&ctx),
        Commands::Classify { text } => cmd::failures::classify(&ctx, &text),
        Commands::Reflect { text, reasons } => cmd::reflect::run(&ctx, &text, reasons),
        Commands::Weekly { subcommand } => cmd::weekly::run(&ctx, subcommand),
        Commands::Adjust => cmd::weekly::adjust(&ctx),
        Commands::Chat { message } => cmd::chat::run(&ctx, message.as_deref()),
        Commands::Key { subcommand } => cmd::key::run(&ctx, subcommand),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
        Commands::Serve { port, no_open } => cmd::serve::run(&root, port, no_open),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
