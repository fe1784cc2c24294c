use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use episode_feed::{
    github::{GithubContents, GithubRepo},
    ChannelInfo, FeedStore, GithubFeedStore, LocalFeedStore,
};
use paper_pulse::{
    audio::{AudioMerger, FfmpegMerger},
    notebook::{
        cdp::BrowserbaseProvider, GeneratorConfig, NotebookCredentials, NotebookLmGenerator,
        SessionPolicy,
    },
    publisher::{GithubMediaHost, HttpMediaHost},
    server::router,
    tracing::init_tracing_subscriber,
    FailurePolicy, MediaHost, PodcastPipeline, PodcastPipelineBuilder, SummaryGenerator,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Hosting {
    Github,
    Http,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SessionMode {
    PerLink,
    Shared,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PartialFailure {
    FailFast,
    BestEffort,
}

#[derive(Parser)]
#[command(
    name = "paper-pulse",
    about = "Turns arXiv links from emails into podcast episodes"
)]
struct Cli {
    /// Browserbase API key
    #[arg(long, env = "BROWSERBASE_API_KEY", hide_env_values = true)]
    browserbase_api_key: String,

    /// Browserbase CDP endpoint
    #[arg(
        long,
        env = "BROWSERBASE_CONNECT_URL",
        default_value = BrowserbaseProvider::DEFAULT_CONNECT_URL
    )]
    browserbase_connect_url: String,

    /// NotebookLM account email
    #[arg(long, env = "NOTEBOOKLM_EMAIL")]
    notebooklm_email: String,

    /// NotebookLM account password
    #[arg(long, env = "NOTEBOOKLM_PASSWORD", hide_env_values = true)]
    notebooklm_password: String,

    /// Seconds to wait for NotebookLM to finish generating audio
    #[arg(long, env = "GENERATION_WAIT_SECONDS", default_value = "300")]
    generation_wait_seconds: u64,

    /// Seconds to wait for each UI control to appear
    #[arg(long, env = "STEP_TIMEOUT_SECONDS", default_value = "30")]
    step_timeout_seconds: u64,

    #[arg(long, env = "SESSION_POLICY", value_enum, default_value = "per-link")]
    session_policy: SessionMode,

    /// Concurrent browser sessions with the per-link policy
    #[arg(long, env = "MAX_PARALLEL_SESSIONS", default_value = "3")]
    max_parallel_sessions: usize,

    #[arg(
        long,
        env = "PARTIAL_FAILURE_POLICY",
        value_enum,
        default_value = "fail-fast"
    )]
    partial_failure_policy: PartialFailure,

    /// Where episodes and the feed are published
    #[arg(long, env = "HOSTING", value_enum, default_value = "github")]
    hosting: Hosting,

    /// Repository as owner/name
    #[arg(long, env = "GITHUB_REPO")]
    github_repo: Option<String>,

    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    #[arg(long, env = "GITHUB_BRANCH", default_value = "main")]
    github_branch: String,

    /// Base URL episodes are served from, defaults to raw.githubusercontent.com
    #[arg(long, env = "PUBLIC_BASE_URL")]
    public_base_url: Option<String>,

    /// Generic file host upload endpoint
    #[arg(long, env = "UPLOAD_URL")]
    upload_url: Option<String>,

    #[arg(long, env = "UPLOAD_TOKEN", hide_env_values = true)]
    upload_token: Option<String>,

    /// Feed location: a path in the repository, or a local file
    #[arg(long, env = "FEED_PATH", default_value = "feed.xml")]
    feed_path: String,

    #[arg(long, env = "PODCAST_TITLE", default_value = "Daily AI Papers")]
    podcast_title: String,

    #[arg(long, env = "PODCAST_LINK", default_value = "https://arxiv.org")]
    podcast_link: String,

    #[arg(
        long,
        env = "PODCAST_DESCRIPTION",
        default_value = "Spoken summaries of the latest AI research papers from arXiv"
    )]
    podcast_description: String,

    /// ffmpeg binary, looked up on PATH when unset
    #[arg(long, env = "FFMPEG_PATH")]
    ffmpeg_path: Option<PathBuf>,

    /// Working directory for downloaded and merged audio
    #[arg(long, env = "WORKDIR", default_value = "/var/tmp/paper-pulse")]
    workdir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the email webhook
    Serve {
        #[arg(long, env = "BIND_ADDRESS", default_value = "0.0.0.0:80")]
        bind: SocketAddr,
    },
    /// Process a single email body read from a file and exit
    Run {
        #[arg(long)]
        email_file: PathBuf,
    },
}

fn github_contents(cli: &Cli) -> anyhow::Result<GithubContents> {
    let slug = cli.github_repo.as_deref().context("GITHUB_REPO is required")?;
    let token = cli
        .github_token
        .as_deref()
        .context("GITHUB_TOKEN is required")?;
    let repo = GithubRepo::parse(slug, &cli.github_branch)?;
    Ok(GithubContents::new(repo, token))
}

async fn launch<G, M, H, F>(
    command: Command,
    pipeline: PodcastPipeline<G, M, H, F>,
) -> anyhow::Result<()>
where
    G: SummaryGenerator + Send + Sync + 'static,
    M: AudioMerger + Send + Sync + 'static,
    H: MediaHost + Send + Sync + 'static,
    F: FeedStore + Send + Sync + 'static,
{
    match command {
        Command::Serve { bind } => {
            let listener = tokio::net::TcpListener::bind(bind)
                .await
                .with_context(|| format!("Failed to bind {bind}"))?;
            tracing::info!(%bind, "Listening for email webhooks");
            axum::serve(listener, router(Arc::new(pipeline))).await?;
        }
        Command::Run { email_file } => {
            let email_body = tokio::fs::read_to_string(&email_file)
                .await
                .with_context(|| format!("Failed to read {}", email_file.display()))?;
            let report = pipeline.run(&email_body).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let _guard = sentry::init((
        std::env::var("SENTRY_DSN").unwrap_or_default(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some("production".into()),
            ..Default::default()
        },
    ));

    let cli = Cli::parse();
    init_tracing_subscriber()?;

    let provider = BrowserbaseProvider::new(&cli.browserbase_api_key)
        .with_connect_url(&cli.browserbase_connect_url)
        .with_step_timeout(Duration::from_secs(cli.step_timeout_seconds));
    let session_policy = match cli.session_policy {
        SessionMode::PerLink => SessionPolicy::PerLink {
            max_parallel: cli.max_parallel_sessions,
        },
        SessionMode::Shared => SessionPolicy::Shared,
    };
    let config = GeneratorConfig::new(NotebookCredentials::new(
        &cli.notebooklm_email,
        &cli.notebooklm_password,
    ))
    .with_generation_wait(Duration::from_secs(cli.generation_wait_seconds))
    .with_session_policy(session_policy);

    let failure_policy = match cli.partial_failure_policy {
        PartialFailure::FailFast => FailurePolicy::FailFast,
        PartialFailure::BestEffort => FailurePolicy::BestEffort,
    };

    let builder = PodcastPipelineBuilder::new(&cli.workdir)
        .generator(NotebookLmGenerator::new(provider, config))
        .merger(FfmpegMerger::locate(cli.ffmpeg_path.clone()).context("ffmpeg is required")?)
        .channel(ChannelInfo::new(
            &cli.podcast_title,
            &cli.podcast_link,
            &cli.podcast_description,
        ))
        .failure_policy(failure_policy);

    tracing::info!(hosting = ?cli.hosting, workdir = ?cli.workdir, "Starting paper-pulse");

    match cli.hosting {
        Hosting::Github => {
            let contents = github_contents(&cli)?;
            let mut host = GithubMediaHost::new(contents.clone());
            if let Some(url) = &cli.public_base_url {
                host = host.with_public_base_url(url);
            }
            let pipeline = builder
                .media_host(host)
                .feed_store(GithubFeedStore::new(contents, &cli.feed_path))
                .build();
            launch(cli.command, pipeline).await
        }
        Hosting::Http => {
            let upload_url = cli.upload_url.as_deref().context("UPLOAD_URL is required")?;
            let mut host = HttpMediaHost::new(upload_url);
            if let Some(token) = &cli.upload_token {
                host = host.with_token(token);
            }
            let pipeline = builder
                .media_host(host)
                .feed_store(LocalFeedStore::new(&cli.feed_path))
                .build();
            launch(cli.command, pipeline).await
        }
    }
}
