use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use imghost_client::core::config::Config;
use imghost_client::features::auth::{AuthService, LoginRequestDto, RegisterRequestDto};
use imghost_client::features::gallery::{
    GalleryLoader, GalleryQuery, LoadOutcome, OwnerFilter, SortOrder,
};
use imghost_client::features::uploads::models::original_mode_available;
use imghost_client::features::uploads::{
    QualityPreferences, QualityService, UploadEvent, UploadQueueManager,
};
use imghost_client::modules::http::{HttpRequestClient, RequestClient};
use imghost_client::modules::notify::{Notifier, TracingNotifier};
use imghost_client::shared::types::{format_size, UploadFile};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "\
imghost - command line client for the image host

USAGE:
  imghost upload [--quality N] [--original] [--strict] FILE...
  imghost list [--page N] [--sort time_desc] [--user ID]
  imghost delete ID
  imghost stats
  imghost register [--invite CODE]

Sort orders: time_asc, time_desc, size_asc, size_desc, name_asc, name_desc

Configuration is read from the environment or a .env file:
  IMGHOST_BASE_URL, IMGHOST_USERNAME, IMGHOST_PASSWORD, ...";

enum Command {
    Upload {
        quality: Option<u8>,
        original: bool,
        strict: bool,
        files: Vec<PathBuf>,
    },
    List {
        page: u32,
        sort: SortOrder,
        user_id: Option<i64>,
    },
    Delete {
        id: i64,
    },
    Stats,
    Register {
        invite_code: Option<String>,
    },
    Help,
}

fn parse_args() -> anyhow::Result<Command> {
    let mut args = pico_args::Arguments::from_env();

    if args.contains(["-h", "--help"]) {
        return Ok(Command::Help);
    }

    let command = match args.subcommand()?.as_deref() {
        Some("upload") => {
            let quality = args.opt_value_from_str("--quality")?;
            let original = args.contains("--original");
            let strict = args.contains("--strict");
            let files: Vec<PathBuf> = args.finish().into_iter().map(PathBuf::from).collect();
            if files.is_empty() {
                anyhow::bail!("No files to upload\n\n{}", USAGE);
            }
            return Ok(Command::Upload {
                quality,
                original,
                strict,
                files,
            });
        }
        Some("list") => Command::List {
            page: args.opt_value_from_str("--page")?.unwrap_or(1),
            sort: args.opt_value_from_str("--sort")?.unwrap_or_default(),
            user_id: args.opt_value_from_str("--user")?,
        },
        Some("delete") => Command::Delete {
            id: args.free_from_str()?,
        },
        Some("stats") => Command::Stats,
        Some("register") => Command::Register {
            invite_code: args.opt_value_from_str("--invite")?,
        },
        Some(other) => anyhow::bail!("Unknown command '{}'\n\n{}", other, USAGE),
        None => Command::Help,
    };

    let remaining = args.finish();
    if !remaining.is_empty() {
        anyhow::bail!("Unexpected arguments: {:?}", remaining);
    }

    Ok(command)
}

fn main() -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

async fn async_main() -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let command = parse_args()?;
    if let Command::Help = command {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    tracing::info!("Using image host at {}", config.server.base_url);

    let http = Arc::new(HttpRequestClient::new(
        &config.server,
        config.upload.chunk_size,
    )?);
    if let Err(e) = http.refresh_csrf_token().await {
        tracing::warn!("Continuing without CSRF token: {}", e);
    }

    let client: Arc<dyn RequestClient> = http.clone();
    let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);
    let auth = AuthService::new(Arc::clone(&client), Arc::clone(&notifier));

    if let Command::Register { invite_code } = &command {
        let Some((username, password)) = config.auth.credentials() else {
            anyhow::bail!("Set IMGHOST_USERNAME and IMGHOST_PASSWORD to register");
        };
        let user = auth
            .register(RegisterRequestDto {
                username: username.to_string(),
                password: password.to_string(),
                invite_code: invite_code.clone(),
            })
            .await?;
        println!("Registered {}", user.username);
        return Ok(());
    }

    if let Some((username, password)) = config.auth.credentials() {
        auth.login(LoginRequestDto {
            username: username.to_string(),
            password: password.to_string(),
        })
        .await?;

        // The token is bound to the session, which login replaced
        if let Err(e) = http.refresh_csrf_token().await {
            tracing::warn!("Failed to refresh CSRF token after login: {}", e);
        }
    }

    let gallery = GalleryLoader::new(
        Arc::clone(&client),
        Arc::clone(&notifier),
        config.gallery.header_text.clone(),
    );

    match command {
        Command::Upload {
            quality,
            original,
            strict,
            files,
        } => {
            let ceiling = QualityService::new(Arc::clone(&client))
                .fetch_ceiling()
                .await;
            let full_quality = original_mode_available(ceiling);
            if (original || strict) && !full_quality {
                tracing::warn!(
                    "Server caps quality at {}, ignoring --original/--strict",
                    ceiling
                );
            }

            let prefs = QualityPreferences {
                strict: strict && full_quality,
                original: original && full_quality,
                quality: quality.unwrap_or(config.upload.default_quality),
            };

            let mut uploads = Vec::with_capacity(files.len());
            for path in &files {
                let file = UploadFile::from_path(path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                uploads.push(file);
            }

            let (manager, handle, mut events) =
                UploadQueueManager::new(client, notifier, gallery, config.upload.grace_window);
            let worker = manager.spawn();
            handle.enqueue(uploads, prefs.resolve(ceiling))?;

            let mut failed = 0;
            while let Some(event) = events.recv().await {
                match event {
                    UploadEvent::Queued { name, size, .. } => {
                        tracing::info!("Queued {} ({})", name, format_size(size));
                    }
                    UploadEvent::Progress { id, percent } => {
                        tracing::debug!("Upload {}: {}%", id, percent);
                    }
                    UploadEvent::Transferred { id } => {
                        tracing::debug!("Upload {}: server processing", id);
                    }
                    UploadEvent::Completed { image, .. } => {
                        println!(
                            "{}\t{}",
                            image.original_name,
                            image.direct_url(http.base_url())
                        );
                    }
                    UploadEvent::Failed { message, .. } => {
                        eprintln!("Upload failed: {}", message);
                    }
                    UploadEvent::ShowDetail(image) => {
                        println!(
                            "{} {} {}",
                            image.dimensions(),
                            image.display_size(),
                            image.mime_type.as_deref().unwrap_or("")
                        );
                        println!("{}", image.markdown_link(http.base_url()));
                    }
                    UploadEvent::BatchFinished(summary) => {
                        failed = summary.failed;
                        break;
                    }
                    UploadEvent::Started { .. } | UploadEvent::Cleared => {}
                }
            }

            drop(handle);
            worker.await?;

            if failed > 0 {
                anyhow::bail!("{} upload(s) failed", failed);
            }
        }
        Command::List {
            page,
            sort,
            user_id,
        } => {
            let query = GalleryQuery::default()
                .with_page(page)
                .with_sort(sort)
                .with_owner_filter(user_id.map(|user_id| OwnerFilter {
                    user_id,
                    username: None,
                }));

            match gallery.load(query).await? {
                LoadOutcome::Failed(message) => anyhow::bail!(message),
                LoadOutcome::Applied | LoadOutcome::Stale => {}
            }

            let view = gallery.view();
            println!(
                "{} (page {}/{}, {} images)",
                view.header,
                view.current_page,
                view.pages.max(1),
                view.total
            );
            if view.is_empty() {
                println!("No images");
            }
            for image in &view.images {
                println!(
                    "{:>6}  {:<40}  {:>10}  {:>11}  {}",
                    image.id,
                    image.original_name,
                    image.display_size(),
                    image.dimensions(),
                    image.direct_url(http.base_url())
                );
            }
        }
        Command::Delete { id } => {
            gallery.delete_image(id).await?;
        }
        Command::Stats => {
            match auth.current_user().await? {
                Some(user) => println!("Logged in as {}", user.username),
                None => anyhow::bail!("Not logged in; set IMGHOST_USERNAME and IMGHOST_PASSWORD"),
            }
            println!("{}", auth.stats().await?.summary());
        }
        Command::Register { .. } | Command::Help => {}
    }

    Ok(())
}
