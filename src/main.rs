use clap::Parser;
use securelookup::cli::commands::{self, add::AddArgs};
use securelookup::cli::{output, Cli, Commands};
use securelookup::vault::FilterOptions;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() {
    let cli = Cli::parse();

    // Diagnostics go to stderr so stdout stays clean for completions and tables.
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install logger: {e}");
    }

    let result = match cli.command {
        Commands::Init(ref args) => commands::init::execute(&cli, args),
        Commands::Add {
            ref name,
            ref archive,
            ref original,
            ref password,
            ref urls,
            ref notes,
            ref repo,
        } => commands::add::execute(
            &cli,
            AddArgs {
                name,
                archive: archive.as_deref(),
                original: original.as_deref(),
                password: password.as_deref(),
                urls,
                notes,
                repo: repo.as_deref(),
            },
        ),
        Commands::Find {
            ref keywords,
            mode,
            target,
            case_sensitive,
            backups,
            show_passwords,
        } => {
            let options = FilterOptions::new(keywords.iter().cloned())
                .mode(mode)
                .target(target)
                .case_sensitive(case_sensitive)
                .include_backups(backups);
            commands::find::execute(&cli, &options, show_passwords)
        }
        Commands::Drop {
            ref name,
            backups,
            force,
        } => commands::drop::execute(&cli, name, backups, force),
        Commands::Clean { ref repo, backups } => commands::clean::execute(&cli, repo, backups),
        Commands::Passwd { ref cipher } => commands::passwd::execute(&cli, cipher.as_deref()),
        Commands::Export { ref output, force } => commands::export::execute(&cli, output, force),
        Commands::Algorithms => commands::algorithms::execute(),
        Commands::Completions { shell } => commands::completions::execute(shell),
    };

    if let Err(e) = result {
        output::error(&e.user_message());
        std::process::exit(1);
    }
}
