use anyhow::Result;
use apexdelta::cli::{AppContext, Cli, Commands};
use clap::Parser;

fn main() -> Result<()> {
    let cli = Cli::parse();

    apexdelta::infra::logging::init(cli.verbose, cli.no_color);
    if cli.no_color {
        owo_colors::set_override(false);
    }

    // Build a context once, pass everywhere
    let ctx = AppContext {
        quiet: cli.quiet,
        no_color: cli.no_color,
        dry_run: cli.dry_run,
    };

    match cli.command {
        Commands::Tests(args) => apexdelta::tests_run(args, &ctx),
        Commands::Delta(args) => apexdelta::delta_run(args, &ctx),
        Commands::Scan(args) => apexdelta::scan_run(args, &ctx),
        Commands::Init(args) => apexdelta::infra::config::init(args, &ctx),
        Commands::Completions(args) => apexdelta::completion::run(args, &ctx),
    }
}
