use clap::Parser;
use miette::Result;
use tracing_subscriber::EnvFilter;

use tolstack::cli::commands;
use tolstack::cli::{Cli, Commands};
use tolstack::core::Config;

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let mut config = Config::load();
    cli.global.apply(&mut config);
    config.validate()?;

    match cli.command {
        Commands::Stack(args) => commands::stack::run(args, &cli.global, &config),
        Commands::Ppk(args) => commands::ppk::run(args, &cli.global, &config),
        Commands::Norm(args) => commands::norm::run(args, &cli.global, &config),
        Commands::Thres(cmd) => commands::thres::run(cmd, &cli.global, &config),
        Commands::Pop(cmd) => commands::pop::run(cmd, &cli.global, &config),
        Commands::Pplot(args) => commands::pplot::run(args, &cli.global, &config),
    }
}

/// Logs go to stderr; `RUST_LOG` wins over `--verbose`
fn init_logging(verbose: bool) {
    let default = if verbose { "tolstack=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
