use clap::Parser;
use miette::Result;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use labtrack::cli::Cli;

fn main() -> Result<()> {
    // Install miette's fancy error handler for beautiful diagnostics
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

    // LABTRACK_LOG wins over -v; logs go to stderr so piped output stays clean
    let default_level = match (cli.global.quiet, cli.global.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "labtrack=debug",
        _ => "labtrack=trace",
    };
    let filter = EnvFilter::try_from_env("LABTRACK_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("warning: could not install logger: {}", e);
    }

    labtrack::cli::run(cli)
}
