// Binary entry point for the command-line timeline.
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};
use std::sync::Arc;
use taskline::cli::{self, Args, Command};
use taskline::config::Config;
use taskline::context::{SharedContext, StandardContext};
use taskline::quick_entry;
use taskline::store::{TaskStore, ViewFilter};
use taskline::vault::Vault;

#[tokio::main]
async fn main() -> Result<()> {
    let raw: Vec<String> = std::env::args().skip(1).collect();
    let args = cli::parse_args(&raw)?;

    if args.command == Command::Help {
        cli::print_help("taskline");
        return Ok(());
    }

    init_logging(args.verbose);

    let ctx: SharedContext = Arc::new(StandardContext::new(args.root.clone()));
    let config = Config::load_or_default(ctx.as_ref())?;
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());

    let vault_dir = args
        .vault
        .clone()
        .or_else(|| config.vault.clone().map(Into::into))
        .or_else(|| ctx.get_default_vault_path())
        .context("No vault configured; pass --vault <dir>")?;
    let vault = Vault::open(vault_dir);

    match &args.command {
        Command::Add { file, text } => {
            let file = match file {
                Some(f) => f.clone(),
                None => config
                    .default_entry_file(today)
                    .context("No inbox or daily note configured; name a file")?,
            };
            let body = quick_entry::expand(text, today);
            vault.append_task(&file, &config.section_for_new_tasks, &body)?;
            println!("{}: {}", file, quick_entry::task_line(&body));
        }
        Command::Toggle { file, line } => {
            let updated = vault.toggle_task(file, line - 1, today)?;
            println!("{}:{}: {}", file, line, updated.trim_end());
        }
        Command::Show => show(vault, &config, &args, today).await?,
        Command::Help => cli::print_help("taskline"),
    }
    Ok(())
}

async fn show(vault: Vault, config: &Config, args: &Args, today: NaiveDate) -> Result<()> {
    let store = Arc::new(TaskStore::new());
    let ticket = store.begin_pass();
    let scan_options = config.scan_options();
    let tasks = tokio::task::spawn_blocking(move || vault.scan(&scan_options))
        .await
        .context("Vault scan panicked")??;
    store.publish(ticket, tasks);

    let filter = ViewFilter {
        query: args.query.clone(),
        ..ViewFilter::default()
    };
    let timeline = store.view(today, &filter, &config.timeline_options());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&timeline)?);
    } else {
        print!("{}", cli::render_text(&timeline, config));
    }
    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    let config = ConfigBuilder::new().set_time_level(LevelFilter::Off).build();
    if let Err(e) = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto) {
        eprintln!("Failed to initialise logging: {}", e);
    }
}
