use clap::Parser;
use miette::Result;
use fieldtrack::cli::{Cli, Commands};
use fieldtrack::core::{logging, Config};

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
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
    let global = cli.global;

    let config = Config::load_for(global.project.as_deref());
    logging::init(global.verbose, global.quiet, config.log.as_deref());

    match cli.command {
        Commands::Init(args) => fieldtrack::cli::commands::init::run(args),
        Commands::Import(args) => fieldtrack::cli::commands::import::run(args, &global),
        Commands::List(args) => fieldtrack::cli::commands::list::run(args, &global),
        Commands::Show(args) => fieldtrack::cli::commands::show::run(args, &global),
        Commands::Milestone(cmd) => fieldtrack::cli::commands::milestone::run(cmd, &global),
        Commands::Assign(args) => fieldtrack::cli::commands::assign::run(args, &global),
        Commands::Retire(args) => fieldtrack::cli::commands::retire::run(args, &global),
        Commands::Recompute(args) => fieldtrack::cli::commands::recompute::run(args, &global),
        Commands::Template(cmd) => fieldtrack::cli::commands::template::run(cmd, &global),
        Commands::Status(args) => fieldtrack::cli::commands::status::run(args, &global),
        Commands::Completions(args) => fieldtrack::cli::commands::completions::run(args),
    }
}
