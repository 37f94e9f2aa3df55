use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    load_settings, HttpRecordSource, InputAdapter, RecordSource, ReviewEvent, ReviewSession,
    ReviewSettings,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod render;

use commands::{parse_line, PromptCommand};

#[derive(Parser, Debug)]
#[command(about = "Screen records one at a time against a review backend")]
struct Args {
    /// Settings file (defaults to ./screener.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    project: Option<String>,
    /// Disable single-key shortcuts entirely
    #[arg(long, default_value_t = false)]
    no_keyboard_shortcuts: bool,
    #[arg(long, default_value_t = false)]
    no_undo_banner: bool,
    /// Seconds the undo banner stays open
    #[arg(long)]
    undo_window_secs: Option<u64>,
}

impl Args {
    fn apply(&self, settings: &mut ReviewSettings) {
        if let Some(v) = &self.server_url {
            settings.server_url = v.clone();
        }
        if let Some(v) = &self.project {
            settings.project_id = Some(v.clone());
        }
        if self.no_keyboard_shortcuts {
            settings.keyboard_shortcuts = false;
        }
        if self.no_undo_banner {
            settings.undo_banner = false;
        }
        if let Some(v) = self.undo_window_secs {
            settings.undo_window_secs = v;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref()).context("failed to load settings")?;
    args.apply(&mut settings);
    settings.validate()?;
    let project = settings.project()?;

    let source: Arc<dyn RecordSource> = Arc::new(HttpRecordSource::new(
        &settings.server_url,
        settings.request_timeout(),
    )?);
    let session = Arc::new(ReviewSession::new(
        source,
        project.clone(),
        settings.session_options(),
    ));

    let mut adapter = InputAdapter::new(settings.key_bindings, settings.keyboard_shortcuts);
    let listening = adapter.mount();
    let adapter = Arc::new(adapter);
    println!("{}", render::help(listening.then(|| adapter.bindings())));

    info!(%project, server_url = %settings.server_url, "starting review session");
    let mut events = session.subscribe_events();
    spawn_command(&session, |session| async move { session.start().await });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read input")? else {
                    break;
                };
                match parse_line(&line) {
                    Some(PromptCommand::Quit) => break,
                    Some(command) => handle_command(command, &session, &adapter).await,
                    None => println!("Unknown command; type `help`."),
                }
            }
            event = events.recv() => match event {
                Ok(event) => handle_event(event, &session, settings.undo_window()),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "presentation fell behind session events");
                    if let Some(text) = render::state(&session.state().await) {
                        println!("{text}");
                    }
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    info!(%project, "review session closed");
    Ok(())
}

fn spawn_command<F, Fut>(session: &Arc<ReviewSession>, command: F)
where
    F: FnOnce(Arc<ReviewSession>) -> Fut,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    tokio::spawn(command(Arc::clone(session)));
}

async fn handle_command(
    command: PromptCommand,
    session: &Arc<ReviewSession>,
    adapter: &Arc<InputAdapter>,
) {
    match command {
        PromptCommand::Input(event) => {
            let adapter = Arc::clone(adapter);
            spawn_command(session, |session| async move {
                adapter.dispatch(event, &session).await;
            });
        }
        PromptCommand::Retry => {
            spawn_command(session, |session| async move { session.retry().await });
        }
        PromptCommand::Reset => {
            spawn_command(session, |session| async move {
                session.reset().await;
                session.start().await;
            });
        }
        PromptCommand::Stats => {
            let view = session.refresh_statistics().await;
            println!("{}", render::statistics(&view));
        }
        PromptCommand::History => {
            let view = session.snapshot().await.statistics;
            println!("{}", render::history(&view.history));
        }
        PromptCommand::Help => {
            let bindings = adapter.is_listening().then(|| adapter.bindings());
            println!("{}", render::help(bindings));
        }
        PromptCommand::Quit => {}
    }
}

fn handle_event(event: ReviewEvent, session: &Arc<ReviewSession>, undo_window: Duration) {
    match event {
        ReviewEvent::StateChanged(state) => {
            if let Some(text) = render::state(&state) {
                println!("{text}");
            }
        }
        ReviewEvent::UndoBanner(banner) => {
            println!("{} (undo within {}s)", banner.message, undo_window.as_secs());
            let banner_id = banner.id;
            spawn_command(session, move |session| async move {
                tokio::time::sleep(undo_window).await;
                session.dismiss_undo_banner(banner_id).await;
            });
        }
        ReviewEvent::UndoBannerClosed(_) => {}
        ReviewEvent::SubmissionFailed { doc_id, label, error } => {
            println!("Could not save {label} for record #{doc_id}: {error}");
        }
        ReviewEvent::StatisticsUpdated(view) => {
            if let Some(snapshot) = &view.snapshot {
                println!(
                    "[{} included, {} excluded, {} remaining]",
                    snapshot.included,
                    snapshot.excluded,
                    snapshot.remaining()
                );
            }
        }
    }
}
