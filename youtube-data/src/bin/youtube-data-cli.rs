use eyre::{Context, bail};
use std::io::IsTerminal;
use tokio_stream::StreamExt;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use youtube_data::{Config, Error, Resource, SearchParams, YouTube};

const CONFIG_ENV: &str = "YOUTUBE_DATA_CONFIG";
const USAGE: &str = "usage: youtube-data-cli <video <id-or-url> | search <query> | playlist <id>>";

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_ansi(std::io::stdout().is_terminal())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        bail!(USAGE);
    };

    let config = match std::env::var_os(CONFIG_ENV) {
        Some(path) => Config::from_file(&path)
            .with_context(|| format!("load config from {}", path.to_string_lossy()))?,
        None => Config::from_env().context("load config from the environment")?,
    };
    let yt = YouTube::new(config).context("set up YouTube client")?;

    match (command.as_str(), rest) {
        ("video", [id]) => {
            let video = if id.contains('/') {
                yt.video_from_url(id)?
            } else {
                yt.video(id.as_str())?
            };
            print_fields(&video).await?;
        }
        ("search", words) if !words.is_empty() => {
            let query = words.join(" ");
            let mut results = yt.search(SearchParams::new(query).per_page(10))?.take(10);
            while let Some(result) = results.next().await {
                let result = result.context("fetch search results")?;
                println!("{result}");
            }
        }
        ("playlist", [id]) => {
            let playlist = yt.playlist(id.as_str())?;
            print_fields(&playlist).await?;

            // collect the first page of entries, then resolve them all in one request
            let ids = yt
                .playlist_items(id)?
                .take(50)
                .map(|item| item.map(|video| video.id().id().to_string()))
                .collect::<Result<Vec<_>, _>>()
                .await
                .context("list playlist items")?;
            for video in yt.videos(&ids).await.context("resolve playlist videos")? {
                match video.get("duration").await {
                    Ok(duration) => println!("{video} [{duration}]"),
                    Err(e) if e.is_not_found() => println!("{video} (unavailable)"),
                    Err(e) => return Err(e).context("fetch video duration"),
                }
            }
        }
        _ => bail!(USAGE),
    }

    Ok(())
}

async fn print_fields(resource: &Resource) -> eyre::Result<()> {
    eprintln!("==> {}", resource.id());
    for def in resource.kind().fields() {
        match resource.get(def.name).await {
            Ok(value) => eprintln!("  {:<20} {value}", def.name),
            Err(Error::FieldNotFound { .. }) => eprintln!("  {:<20} N/A", def.name),
            Err(e) => return Err(e).with_context(|| format!("fetch {}", resource.id())),
        }
    }
    Ok(())
}
