use axum::Router;
use log::{error, info, warn};
use mosaic_ssg::{BuildReport, CONFIG_FILE, SiteBuilder, SiteConfig, default_registry};
use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use std::error::Error;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{RecvTimeoutError, channel};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tower_http::services::ServeDir;

const DEBOUNCE_DURATION: Duration = Duration::from_millis(300);

const MASTER_LAYOUT: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{% block title %}{% if page.title is defined %}{{ page.title }} | {% endif %}{{ title }}{% endblock title %}</title>
  <link rel="stylesheet" href="{{ base_url }}/css/main.css">
</head>
<body>
  <main>
{% block body %}{{ content | default(value="") | safe }}{% endblock body %}
  </main>
</body>
</html>
"#;

const INDEX_TEMPLATE: &str = r#"{% extends "_layouts/master.tera" %}
{% block body %}
<h1>{{ title }}</h1>
<ul>
{% for path, entry in site.meta %}{% if entry.title is defined %}
  <li><a href="{{ base_url }}/{{ entry["target-path"] }}">{{ entry.title }}</a></li>
{% endif %}{% endfor %}
</ul>
{% endblock body %}
"#;

const ABOUT_PAGE: &str = r#"+++
title = "About"
extends = "_layouts/master.tera"
+++

# About

This page is written in **Markdown**.
"#;

const MAIN_STYLESHEET: &str = r#"@import "variables";

body {
  color: $text-color;
  font-family: sans-serif;
}
"#;

const STYLESHEET_VARIABLES: &str = "$text-color: #333;\n";

fn escape_toml_string(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for character in input.chars() {
        match character {
            '\\' => output.push_str("\\\\"),
            '"' => output.push_str("\\\""),
            '\n' => output.push_str("\\n"),
            '\r' => output.push_str("\\r"),
            '\t' => output.push_str("\\t"),
            control if control < '\u{0020}' => {
                output.push_str(&format!("\\u{:04X}", control as u32));
            }
            other => output.push(other),
        }
    }
    output
}

pub fn init_site(dir: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let root = match dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir()?,
    };

    if root.join(CONFIG_FILE).exists() {
        return Err(format!("{} already exists in {}", CONFIG_FILE, root.display()).into());
    }

    let source = root.join("source");
    fs::create_dir_all(source.join("_layouts"))?;
    fs::create_dir_all(source.join("css"))?;

    let name = root
        .canonicalize()
        .ok()
        .and_then(|path| path.file_name().map(|s| s.to_string_lossy().to_string()))
        .unwrap_or_else(|| "My Site".to_string());

    let escaped_name = escape_toml_string(&name);
    let config = format!(
        r#"title = "{escaped_name}"
base_url = ""

[build]
source = "source"
pretty = true
"#
    );
    fs::write(root.join(CONFIG_FILE), config)?;
    fs::write(
        root.join("mosaic.production.toml"),
        "base_url = \"https://example.com\"\n",
    )?;

    fs::write(source.join("_layouts").join("master.tera"), MASTER_LAYOUT)?;
    fs::write(source.join("index.tera"), INDEX_TEMPLATE)?;
    fs::write(source.join("about.md"), ABOUT_PAGE)?;
    fs::write(source.join("css").join("main.scss"), MAIN_STYLESHEET)?;
    fs::write(source.join("css").join("_variables.scss"), STYLESHEET_VARIABLES)?;

    info!("Initialized site in {}", root.display());

    Ok(())
}

pub fn build_site(
    input: Option<&Path>,
    environment: &str,
    pretty: Option<bool>,
) -> Result<BuildReport, Box<dyn Error>> {
    let root = input.unwrap_or(Path::new("."));
    let config = SiteConfig::load(root, environment)?;

    let mut options = config.options();
    if let Some(pretty) = pretty {
        options.pretty = pretty;
    }

    let source = config.source_dir();
    let destination = config.destination_dir();

    info!("Building {} for {}...", source.display(), environment);
    let start = Instant::now();

    let mut builder = SiteBuilder::new(config.cache_dir())
        .options(options)
        .handlers(default_registry(&source)?);
    let report = builder.build(&source, &destination, &config.variables)?;

    info!("Finished {} build in {:.2?}", environment, start.elapsed());

    Ok(report)
}

pub async fn serve_site(
    input: Option<&Path>,
    environment: &str,
    port: u16,
    open_browser: bool,
) -> Result<(), Box<dyn Error>> {
    build_site(input, environment, None)?;

    let root = input.unwrap_or(Path::new(".")).to_path_buf();
    let config = SiteConfig::load(&root, environment)?;
    let output_dir = config.destination_dir();
    let environment = environment.to_string();

    let (reload_tx, _) = broadcast::channel::<()>(16);
    let reload_tx = Arc::new(reload_tx);
    let reload_tx_clone = reload_tx.clone();

    let (notify_tx, notify_rx) = channel();

    let mut watcher = RecommendedWatcher::new(
        notify_tx,
        Config::default().with_poll_interval(Duration::from_millis(200)),
    )?;

    for path in watch_paths(&config) {
        let mode = if path.is_dir() {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher.watch(&path, mode)?;
    }

    std::thread::spawn(move || {
        loop {
            match notify_rx.recv() {
                Ok(_event) => {
                    loop {
                        match notify_rx.recv_timeout(DEBOUNCE_DURATION) {
                            Ok(_) => continue,
                            Err(RecvTimeoutError::Timeout) => break,
                            Err(RecvTimeoutError::Disconnected) => return,
                        }
                    }

                    info!("Changes detected, rebuilding...");

                    if let Err(error) = build_site(Some(&root), &environment, None) {
                        error!("Rebuild failed: {error}");
                    } else {
                        let _ = reload_tx_clone.send(());
                    }
                }
                Err(error) => {
                    error!("Watch error: {error}");
                    break;
                }
            }
        }
    });

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("Serving {} at http://{addr}", output_dir.display());
    info!("Press Ctrl+C to stop");

    if open_browser {
        let url = format!("http://localhost:{}", port);
        if let Err(error) = open::that(&url) {
            warn!("Failed to open browser: {error}");
        }
    }

    let livereload = tower_livereload::LiveReloadLayer::new();
    let reloader = livereload.reloader();

    let mut reload_rx = reload_tx.subscribe();
    tokio::spawn(async move {
        loop {
            if reload_rx.recv().await.is_ok() {
                reloader.reload();
            }
        }
    });

    let serve_dir = ServeDir::new(&output_dir).append_index_html_on_directories(true);

    let app = Router::new().fallback_service(serve_dir).layer(livereload);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// The source tree and whichever config files exist.
fn watch_paths(config: &SiteConfig) -> Vec<PathBuf> {
    std::iter::once(config.source_dir())
        .chain(config.config_files())
        .filter(|path| path.exists())
        .collect()
}
