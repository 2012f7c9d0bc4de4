//! CLI command implementations

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::api::{build_api, ChatTurn, VideoApi};
use crate::cli::args::ConfigCommand;
use crate::config::Settings;
use crate::flows::gallery::{display_filename, truncate_summary};
use crate::flows::{
    find_feedback, ChatSession, FeedbackRoute, FeedbackView, Gallery, ThumbnailState,
    ThumbnailWorker, UploadFlow, UploadState, EMPTY_FEEDBACK_MESSAGE,
};

/// Upload a clip and print the feedback it produced
pub async fn upload_video(
    settings: &Settings,
    file: Option<PathBuf>,
    url: Option<String>,
    json: bool,
) -> Result<()> {
    let mut flow = UploadFlow::new();
    flow.set_file(file);
    flow.set_url(url.unwrap_or_default());

    // Validate before anything touches the network.
    flow.validate()?;

    let api = build_api(settings)?;
    eprintln!("Uploading... the service analyses the clip before replying, this can take a few minutes.");

    match flow.submit(api.as_ref()).await {
        UploadState::Error(message) => anyhow::bail!("{}", message),
        UploadState::Success(_) => {}
        state => anyhow::bail!("Upload did not complete ({:?})", state),
    }

    let route = flow
        .take_route()
        .context("Upload finished without a video")?;

    if json {
        print_route_json(&route)?;
    } else {
        println!("Uploaded: {}", route.video_id);
        println!();
        print_feedback(&FeedbackView::from_route(route), settings);
    }

    Ok(())
}

#[derive(Serialize)]
struct GalleryRow<'a> {
    video_id: &'a str,
    filename: String,
    summary: &'a str,
    thumbnail: ThumbnailStatus<'a>,
}

#[derive(Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
enum ThumbnailStatus<'a> {
    NotRequested,
    Loading,
    Ready(&'a str),
    Failed(&'a str),
}

impl<'a> From<&'a ThumbnailState> for ThumbnailStatus<'a> {
    fn from(state: &'a ThumbnailState) -> Self {
        match state {
            ThumbnailState::NotRequested => Self::NotRequested,
            ThumbnailState::Loading => Self::Loading,
            ThumbnailState::Ready(url) => Self::Ready(url),
            ThumbnailState::Failed(message) => Self::Failed(message),
        }
    }
}

/// List analysed clips, generating missing thumbnails first
pub async fn show_gallery(settings: &Settings, generate: bool, json: bool) -> Result<()> {
    let api = build_api(settings)?;
    let mut gallery = Gallery::from_settings(settings);

    let videos = match api.list_videos().await {
        Ok(videos) => videos,
        Err(e) => {
            tracing::error!(error = %e, "Error fetching videos");
            gallery.load_failed();
            anyhow::bail!("{}", gallery.error().unwrap_or_default());
        }
    };

    let jobs = gallery.load(videos);
    if generate && !jobs.is_empty() {
        eprintln!("Generating {} missing thumbnail(s)...", jobs.len());
        settle_thumbnails(api, settings, &mut gallery, jobs).await;
    }

    // Without generation, "loading" only means the thumbnail is missing.
    let state_of = |video_id: &str| match gallery.thumbnail(video_id) {
        ThumbnailState::Loading if !generate => ThumbnailState::NotRequested,
        state => state,
    };

    if json {
        let states: Vec<ThumbnailState> = gallery
            .videos()
            .iter()
            .map(|v| state_of(&v.video_id))
            .collect();
        let rows: Vec<GalleryRow> = gallery
            .videos()
            .iter()
            .zip(&states)
            .map(|(video, state)| GalleryRow {
                video_id: &video.video_id,
                filename: display_filename(&video.filename),
                summary: &video.summary,
                thumbnail: state.into(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if gallery.videos().is_empty() {
        println!("No videos available. Upload a clip to get started!");
        return Ok(());
    }

    println!(
        "{:<26} {:<28} {:<30} {}",
        "ID", "File", "Thumbnail", "Summary"
    );
    println!("{}", "-".repeat(110));

    for video in gallery.videos() {
        let thumbnail = match state_of(&video.video_id) {
            ThumbnailState::NotRequested => "(missing)".to_string(),
            state => state.label().to_string(),
        };
        println!(
            "{:<26} {:<28} {:<30} {}",
            truncate(&video.video_id, 26),
            truncate(&display_filename(&video.filename), 28),
            truncate(&thumbnail, 30),
            truncate_summary(&video.summary, settings.gallery.summary_words)
        );
    }

    Ok(())
}

/// Generate (or retry) the thumbnail of a single clip
pub async fn generate_thumbnail(settings: &Settings, id: &str) -> Result<()> {
    let api = build_api(settings)?;
    let videos = api
        .list_videos()
        .await
        .context("Failed to load videos")?;
    let record = videos
        .into_iter()
        .find(|v| v.video_id == id)
        .context("Video not found")?;

    let mut gallery = Gallery::from_settings(settings);
    let jobs = gallery.load(vec![record]);
    if jobs.is_empty() {
        println!("Thumbnail: {}", gallery.thumbnail(id).label());
        return Ok(());
    }

    settle_thumbnails(api, settings, &mut gallery, jobs).await;

    match gallery.thumbnail(id) {
        ThumbnailState::Ready(url) => {
            println!("Thumbnail: {}", url);
            Ok(())
        }
        ThumbnailState::Failed(message) => anyhow::bail!("{}", message),
        state => anyhow::bail!("Thumbnail did not settle ({:?})", state),
    }
}

async fn settle_thumbnails(
    api: Arc<dyn VideoApi>,
    settings: &Settings,
    gallery: &mut Gallery,
    jobs: Vec<crate::flows::ThumbnailJob>,
) {
    let cancel = CancellationToken::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let worker = ThumbnailWorker::spawn(api, settings, &cancel, tx);

    worker.request_all(jobs);
    gallery.drain_until_settled(&mut rx).await;
    cancel.cancel();
}

/// Show the feedback for a clip
pub async fn show_feedback(settings: &Settings, id: &str, json: bool) -> Result<()> {
    let api = build_api(settings)?;
    let route = find_feedback(api.as_ref(), id)
        .await
        .context("Could not load feedback")?;

    if json {
        print_route_json(&route)?;
    } else {
        print_feedback(&FeedbackView::from_route(route), settings);
    }

    Ok(())
}

/// Chat about a clip, once or interactively
pub async fn chat(
    settings: &Settings,
    id: &str,
    message: Option<String>,
    summary: Option<String>,
) -> Result<()> {
    let api = build_api(settings)?;

    let summary = match summary {
        Some(summary) => summary,
        None => {
            find_feedback(api.as_ref(), id)
                .await
                .context("Could not look up the clip summary; pass --summary")?
                .state
                .summary
        }
    };

    let mut session = ChatSession::new(id, summary);

    if let Some(message) = message {
        session.set_input(message);
        if !session.submit(api.as_ref()).await {
            anyhow::bail!("Please enter a message");
        }
        if let Some(error) = session.error() {
            anyhow::bail!("{}", error);
        }
        print_transcript(session.transcript());
        return Ok(());
    }

    interactive_chat(api.as_ref(), &mut session).await
}

async fn interactive_chat(api: &dyn VideoApi, session: &mut ChatSession) -> Result<()> {
    println!("Chatting about {}. Empty lines are ignored, /quit to leave.", session.video_id());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"you> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim() == "/quit" {
            break;
        }

        session.set_input(line);
        if !session.submit(api).await {
            continue;
        }

        match session.error() {
            Some(error) => eprintln!("{}", error),
            None => {
                if let Some(turn) = session.transcript().last() {
                    println!("coach> {}", turn.ai);
                }
            }
        }
    }

    Ok(())
}

/// Handle config subcommands
pub fn config_command(settings: &Settings, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            let toml = toml::to_string_pretty(settings)?;
            println!("{}", toml);
        }
        ConfigCommand::Path => {
            let path = Settings::config_path()?;
            println!("{}", path.display());
        }
        ConfigCommand::Init { force } => {
            let path = Settings::config_path()?;
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at {}. Use --force to overwrite.",
                    path.display()
                );
            }
            Settings::write_default(&path)?;
            println!("Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: &'static str,
    detail: String,
}

#[derive(Serialize)]
struct DoctorReport {
    config_path: String,
    server: String,
    checks: Vec<DoctorCheck>,
}

/// Report configuration and whether the service answers
pub async fn run_doctor(settings: &Settings, json: bool) -> Result<()> {
    let report = collect_doctor_report(settings).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("clipcoach doctor");
    println!("config: {}", report.config_path);
    println!("server: {}", report.server);
    println!();

    for check in &report.checks {
        println!("{:<10} {:<8} {}", check.name, check.status, check.detail);
    }

    Ok(())
}

async fn collect_doctor_report(settings: &Settings) -> DoctorReport {
    let config_path = Settings::config_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|e| format!("unavailable ({})", e));

    let mut checks = Vec::new();

    match build_api(settings) {
        Ok(api) => {
            checks.push(DoctorCheck {
                name: "config",
                status: "ok",
                detail: "server.base_url is a valid URL".to_string(),
            });

            let (status, detail) = match api.list_videos().await {
                Ok(videos) => ("ok", format!("GET /api/videos returned {} video(s)", videos.len())),
                Err(e) => ("failed", e.to_string()),
            };
            checks.push(DoctorCheck {
                name: "service",
                status,
                detail,
            });
        }
        Err(e) => checks.push(DoctorCheck {
            name: "config",
            status: "failed",
            detail: e.to_string(),
        }),
    }

    DoctorReport {
        config_path,
        server: settings.base_url().to_string(),
        checks,
    }
}

// Helper functions

fn print_route_json(route: &FeedbackRoute) -> Result<()> {
    #[derive(Serialize)]
    struct RouteOutput<'a> {
        video_id: &'a str,
        state: &'a crate::api::FeedbackState,
    }

    let output = RouteOutput {
        video_id: &route.video_id,
        state: &route.state,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_feedback(view: &FeedbackView, settings: &Settings) {
    let Some(state) = view.state() else {
        println!("{}", EMPTY_FEEDBACK_MESSAGE);
        return;
    };

    if let Some(url) = view.video_url(settings.base_url()) {
        println!("Clip: {}", url);
    }
    if !state.summary.is_empty() {
        println!();
        println!("Summary:");
        println!("{}", state.summary);
    }

    for section in view.sections(settings.tui.show_chapter_times) {
        println!();
        println!("== {} ==", section.title);
        if section.items.is_empty() {
            println!("  {}", section.empty);
        }
        for item in &section.items {
            println!("  - {}", item);
        }
    }
}

fn print_transcript(transcript: &[ChatTurn]) {
    for turn in transcript {
        println!("you> {}", turn.user);
        println!("coach> {}", turn.ai);
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
