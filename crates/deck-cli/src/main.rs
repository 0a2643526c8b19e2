//! `deck-cli` — interactive front-end for the audio-deck engine.
//!
//! Resolves inputs (local files, remote URLs) into tracks and drives the
//! player facade from a stdin REPL:
//! - `play <input>` / `add <input>`
//! - `pause` / `resume` / `skip` / `stop` / `clear`
//! - `repeat off|one|track|all`, `shuffle on|off|toggle`
//! - `status` / `queue` / `quit`

mod commands;
mod config;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use audio_deck_engine::config::EngineConfig;
use audio_deck_engine::pipe_sink::PipeSink;
use audio_deck_engine::player::Player;
use audio_deck_engine::resolver::{
    LocalFileResolver, RemoteTrackResolver, RequestCache, RoutingResolver, TrackResolver,
};
use audio_deck_engine::routing_source::RoutingAudioSource;
use audio_deck_engine::source::AudioSource;
use audio_deck_engine::transcode::TranscodeSource;
use audio_deck_types::{PcmProfile, TrackKind, TrackRequest};

use crate::commands::{CliCommand, ShuffleArg, format_elapsed, parse_line, repeat_label};
use crate::config::CliConfig;

#[derive(Parser, Debug)]
#[command(name = "deck-cli", version)]
struct Args {
    /// Files or URLs to enqueue at startup.
    inputs: Vec<String>,

    /// Transcoder binary (decodes any input to raw PCM).
    #[arg(long)]
    transcoder: Option<String>,

    /// Player binary the PCM stream is piped into.
    #[arg(long)]
    player: Option<String>,

    /// Remote metadata prober binary.
    #[arg(long)]
    prober: Option<String>,

    /// Probe cache TTL in seconds (0 disables).
    #[arg(long)]
    cache_ttl: Option<u64>,

    /// Optional config file (TOML); flags override file values.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let file_cfg = match args.config.as_deref() {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    };
    let transcoder = args
        .transcoder
        .or(file_cfg.transcoder)
        .unwrap_or_else(|| "ffmpeg".to_string());
    let player_bin = args
        .player
        .or(file_cfg.player)
        .unwrap_or_else(|| "ffplay".to_string());
    let prober = args
        .prober
        .or(file_cfg.prober)
        .unwrap_or_else(|| "yt-dlp".to_string());
    let cache_ttl = args.cache_ttl.or(file_cfg.cache_ttl_secs).unwrap_or(300);

    let mut engine_config = EngineConfig::default();
    if let Some(capacity) = file_cfg.queue_capacity {
        engine_config.queue_capacity = capacity;
    }
    let profile = PcmProfile::default();

    tracing::info!(%transcoder, player = %player_bin, %prober, "deck-cli starting");

    // Remote first, local last, so URLs are never misread as paths.
    let cache = Arc::new(RequestCache::new());
    let resolver: Arc<dyn TrackResolver> = Arc::new(RoutingResolver::new(vec![
        Arc::new(
            RemoteTrackResolver::new()
                .with_command(prober.as_str())
                .with_cache(cache, Duration::from_secs(cache_ttl)),
        ),
        Arc::new(LocalFileResolver::new()),
    ]));

    let local_source: Arc<dyn AudioSource> =
        Arc::new(TranscodeSource::new(profile).with_command(transcoder.as_str()));
    let remote_source: Arc<dyn AudioSource> =
        Arc::new(TranscodeSource::new(profile).with_command(transcoder.as_str()));
    let source = Arc::new(
        RoutingAudioSource::new()
            .route(TrackKind::LocalFile, local_source)
            .route(TrackKind::Remote, remote_source),
    );
    let sink = Arc::new(PipeSink::new(profile).with_command(player_bin.as_str()));

    let player = Player::new(source, sink, engine_config);
    player.start();

    let resolve_cancel = CancellationToken::new();
    for input in &args.inputs {
        enqueue_input(&player, resolver.as_ref(), &resolve_cancel, input).await;
    }

    println!("deck-cli ready; try 'play <input>', 'status' or 'quit'");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !handle_line(&player, resolver.as_ref(), &resolve_cancel, &line).await {
                    break;
                }
            }
        }
    }

    resolve_cancel.cancel();
    player.shutdown().await;
    Ok(())
}

/// Apply one REPL line; returns false when the session should end.
async fn handle_line(
    player: &Player,
    resolver: &dyn TrackResolver,
    cancel: &CancellationToken,
    line: &str,
) -> bool {
    let command = match parse_line(line) {
        Ok(Some(command)) => command,
        Ok(None) => return true,
        Err(message) => {
            println!("{message}");
            return true;
        }
    };
    match command {
        CliCommand::Quit => return false,
        CliCommand::Play(input) => {
            if let Some(mut tracks) = resolve_input(resolver, cancel, &input).await {
                let first = tracks.remove(0);
                player.play_now(first).await;
                if !tracks.is_empty() {
                    player.enqueue(tracks).await;
                }
            }
        }
        CliCommand::Add(input) => enqueue_input(player, resolver, cancel, &input).await,
        CliCommand::Pause => player.pause().await,
        CliCommand::Resume => player.resume().await,
        CliCommand::Skip => player.skip().await,
        CliCommand::Stop => player.stop().await,
        CliCommand::Clear => player.clear().await,
        CliCommand::Repeat(mode) => player.set_repeat_mode(mode),
        CliCommand::Shuffle(arg) => {
            let on = match arg {
                ShuffleArg::On => true,
                ShuffleArg::Off => false,
                ShuffleArg::Toggle => !player.shuffle(),
            };
            player.set_shuffle(on);
        }
        CliCommand::Status => print_status(player),
        CliCommand::Queue => print_queue(player),
    }
    true
}

async fn resolve_input(
    resolver: &dyn TrackResolver,
    cancel: &CancellationToken,
    input: &str,
) -> Option<Vec<audio_deck_types::Track>> {
    let request = TrackRequest::new(input);
    match resolver.resolve(&request, cancel).await {
        Ok(tracks) if tracks.is_empty() => {
            println!("nothing found for {input}");
            None
        }
        Ok(tracks) => Some(tracks),
        Err(err) => {
            println!("cannot resolve {input}: {err}");
            None
        }
    }
}

async fn enqueue_input(
    player: &Player,
    resolver: &dyn TrackResolver,
    cancel: &CancellationToken,
    input: &str,
) {
    if let Some(tracks) = resolve_input(resolver, cancel, input).await {
        println!("queued {} track(s)", tracks.len());
        player.enqueue(tracks).await;
    }
}

fn print_status(player: &Player) {
    println!(
        "state: {:?}  repeat: {}  shuffle: {}",
        player.state(),
        repeat_label(player.repeat_mode()),
        if player.shuffle() { "on" } else { "off" },
    );
    if let Some(session) = player.current_session() {
        let since = session
            .started_at
            .elapsed()
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);
        println!(
            "  {} <{}> started {}s ago, elapsed {}",
            session.track.title,
            session.track.uri,
            since,
            format_elapsed(player.elapsed_ms().unwrap_or(0)),
        );
    }
}

fn print_queue(player: &Player) {
    let queue = player.queue_snapshot();
    if queue.is_empty() {
        println!("queue empty");
        return;
    }
    for (index, track) in queue.iter().enumerate() {
        println!("{:3}. {} <{}>", index + 1, track.title, track.uri);
    }
}
