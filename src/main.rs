use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use liner::enrich::{self, Enricher};
use liner::track::{self, TrackSeed};
use liner::{config, lyrics};
use std::time::{Duration, Instant};

#[derive(Debug, Parser)]
#[command(name = "liner", version, about = "Track metadata and synced-lyrics enrichment")]
struct Cli {
    /// Override config file path.
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct SeedArgs {
    title: String,
    artist: String,
    /// Album hint, forwarded to the lyrics lookup.
    #[arg(long)]
    album: Option<String>,
    /// Track length in seconds, used for timing synthesis.
    #[arg(long)]
    duration: Option<f64>,
}

impl SeedArgs {
    fn into_seed(self) -> TrackSeed {
        TrackSeed {
            title: self.title,
            artist: self.artist,
            album: self.album,
            duration_secs: self.duration,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve metadata for a track and print it.
    Metadata {
        #[command(flatten)]
        seed: SeedArgs,
    },
    /// Resolve lyrics for a track and print the timed lines.
    Lyrics {
        #[command(flatten)]
        seed: SeedArgs,
    },
    /// Dump the metadata response as JSON.
    MetadataJson {
        #[command(flatten)]
        seed: SeedArgs,
    },
    /// Dump the lyrics response as JSON.
    LyricsJson {
        #[command(flatten)]
        seed: SeedArgs,
    },
    /// Enrich a local audio file: metadata and lyrics, derived from its name.
    Enrich {
        file: std::path::PathBuf,
    },
    /// Resolve lyrics for a file and print lines in real time.
    Follow {
        file: std::path::PathBuf,
        /// Playback position to start from, in seconds.
        #[arg(long, default_value_t = 0.0)]
        from: f64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref()).context("load config")?;
    let enricher = Enricher::from_config(&cfg).context("build enricher")?;

    match cli.command {
        Command::Metadata { seed } => {
            let response = enricher.resolve_metadata(&seed.into_seed()).await?;
            print_metadata(&response);
        }
        Command::Lyrics { seed } => {
            let response = enricher.resolve_lyrics(&seed.into_seed()).await?;
            print_lyrics(&response);
        }
        Command::MetadataJson { seed } => {
            let response = enricher.resolve_metadata(&seed.into_seed()).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::LyricsJson { seed } => {
            let response = enricher.resolve_lyrics(&seed.into_seed()).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Enrich { file } => {
            let seed = TrackSeed::from_path(&file);
            let id = track::track_id(&file)?;
            println!("track {id}");
            let (metadata, lyrics) = tokio::join!(
                enricher.resolve_metadata(&seed),
                enricher.resolve_lyrics(&seed),
            );
            print_metadata(&metadata?);
            println!();
            print_lyrics(&lyrics?);
        }
        Command::Follow { file, from } => {
            let seed = TrackSeed::from_path(&file);
            let response = enricher.resolve_lyrics(&seed).await?;
            follow(&response.lyrics, from).await;
        }
    }

    Ok(())
}

fn print_metadata(response: &enrich::MetadataResponse) {
    let m = &response.metadata;
    println!("title:   {}", m.title);
    println!("artist:  {}", m.artist);
    println!("album:   {}", m.album);
    if let Some(duration) = m.duration_secs {
        println!("length:  {duration:.0}s");
    }
    if let Some(date) = &m.release_date {
        println!("date:    {date}");
    }
    if let Some(url) = &m.cover_art_url {
        println!("cover:   {url}");
    }
    if let Some(id) = &m.musicbrainz_id {
        println!("mbid:    {id}");
    }
    println!("source:  {}", response.source.as_str());
    if let Some(message) = &response.message {
        println!("note:    {message}");
    }
}

fn print_lyrics(response: &enrich::LyricsResponse) {
    println!("source:  {}", response.source.as_str());
    if let Some(message) = &response.message {
        println!("note:    {message}");
    }
    let synced = response.source.is_synced();
    for line in &response.lyrics {
        if synced {
            let mins = (line.time / 60.0) as u64;
            let secs = line.time % 60.0;
            println!("[{mins:02}:{secs:05.2}] {}", line.text);
        } else {
            println!("{}", line.text);
        }
    }
}

/// Print each line as it becomes current, starting at `from` seconds.
async fn follow(lines: &[lyrics::TimedLine], from: f64) {
    let Some(last) = lines.len().checked_sub(1) else {
        return;
    };
    let start = Instant::now();
    let mut shown: Option<usize> = None;

    loop {
        let t = from + start.elapsed().as_secs_f64();
        let current = lyrics::sync::active_line(lines, t);
        if current != shown
            && let Some(idx) = current
        {
            println!("{}", lines[idx].text);
            shown = current;
        }
        if current == Some(last) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}
