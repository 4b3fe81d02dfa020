use clap::{Parser, Subcommand};
use fitplay::{
    ActionOutcome, ClientConfig, DashboardClient, GameError, SessionController, SessionEvent,
    SystemClock, VariantKind, dashboard::DashboardPoller, ui,
};
use std::sync::Arc;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Parser)]
#[command(name = "fitplay", about = "Play FitPlay exercise games from the terminal")]
struct Cli {
    /// Server base URL; overrides FITPLAY_SERVER_URL.
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the games the server offers.
    Games,
    /// Play a game: press Enter for every rep, Ctrl-C to stop early.
    Play { game_type: String },
    /// Show the top scores for a game.
    Leaderboard { game_type: VariantKind },
    /// Show stats, weekly progress and achievement progress.
    Dashboard {
        /// Keep refreshing until Ctrl-C.
        #[arg(long)]
        watch: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env();
    if let Some(server) = cli.server.as_deref() {
        config = config.with_base_url(server);
    }

    match cli.command {
        Command::Games => {
            let controller = SessionController::connect(&config, Arc::new(SystemClock)).await?;
            for variant in controller.catalog().variants() {
                println!("{}", ui::render_catalog_entry(variant));
            }
        }
        Command::Play { game_type } => {
            let controller = SessionController::connect(&config, Arc::new(SystemClock)).await?;
            play(&controller, &game_type).await?;
        }
        Command::Leaderboard { game_type } => {
            let client = fitplay::GamesClient::new(&config)?;
            let entries = client.leaderboard(game_type).await?;
            println!("{}", ui::render_leaderboard(&entries));
        }
        Command::Dashboard { watch } => {
            let client = DashboardClient::new(&config)?;
            if watch {
                watch_dashboard(client, &config).await?;
            } else {
                println!("{}", ui::render_stats(&client.stats().await?));
                println!("{}", ui::render_week(&client.weekly_progress().await?));
                for (id, item) in client.achievement_progress().await? {
                    let name = item.name.unwrap_or(id);
                    println!("{name:<18} {}", ui::progress_bar(item.progress / 100.0));
                }
            }
        }
    }

    Ok(())
}

async fn play(controller: &SessionController, game_type: &str) -> Result<(), GameError> {
    let mut events = controller.subscribe();
    let started = controller.start(game_type).await?;
    if let Some(variant) = controller.catalog().get(started.kind) {
        println!("{}: {}", variant.name, variant.description);
    }
    println!("{}  (Enter = action, Ctrl-C = stop)", ui::action_prompt(started.kind));

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut input_open = true;
    loop {
        tokio::select! {
            line = input.next_line(), if input_open => match line {
                Ok(Some(_)) => match controller.submit_action().await {
                    Ok(ActionOutcome::Completed { .. }) => debug!("target reached"),
                    Ok(_) => {}
                    // Reported through the Finished event.
                    Err(err) => debug!("action ended with {err}"),
                },
                _ => input_open = false,
            },
            event = events.recv() => match event {
                Ok(SessionEvent::Ticked(snapshot) | SessionEvent::ActionRecorded(snapshot)) => {
                    println!("{}", ui::render_status(&snapshot));
                }
                Ok(SessionEvent::Started(_)) => {}
                Ok(SessionEvent::Finished { snapshot, outcome }) => {
                    println!("{}", ui::render_status(&snapshot));
                    match outcome {
                        Ok(result) => println!("{}", ui::render_result(&result)),
                        Err(reason) => println!(
                            "Could not reach the server ({reason}); estimated {} points, {} kcal.",
                            snapshot.metrics.points, snapshot.metrics.calories
                        ),
                    }
                    break;
                }
                Err(RecvError::Lagged(skipped)) => debug!("skipped {skipped} session events"),
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                match controller.finalize().await {
                    Ok(Some(_)) | Err(_) => {}
                    Ok(None) => break,
                }
            }
        }
    }
    Ok(())
}

async fn watch_dashboard(
    client: DashboardClient,
    config: &ClientConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let poller = DashboardPoller::spawn(client, config.refresh_interval);
    let mut view = poller.view();
    loop {
        tokio::select! {
            changed = view.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = view.borrow_and_update().clone();
                if let Some(stats) = &current.stats {
                    println!("{}", ui::render_stats(stats));
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    poller.stop();
    Ok(())
}
