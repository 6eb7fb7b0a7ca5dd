use clap::Parser;
use std::sync::Arc;
use stride_review::host::Host;
use stride_review::host::webdriver::WebDriverHost;
use stride_review::popup::{PopupController, PopupView};
use stride_review::{Extension, ExtensionConfig};
use tokio::sync::{mpsc, oneshot};

mod args;
use args::Args;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    if let Err(e) = run(args).await {
        ::log::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> stride_review::Result<()> {
    let mut config = match &args.config {
        Some(path) => ExtensionConfig::from_file(path)?,
        None => ExtensionConfig::default(),
    }
    .with_env_overrides();
    if let Some(state_file) = &args.state_file {
        config.state_file = state_file.clone();
    }

    println!("Note: page review requires a WebDriver server (e.g., ChromeDriver).");
    println!(
        "Set WEBDRIVER_URL environment variable if not using the default {}",
        config.webdriver_url
    );

    let (popup_tx, mut popup_rx) = mpsc::channel::<()>(4);
    let host = Arc::new(
        WebDriverHost::connect(&config.webdriver_url)
            .await?
            .with_popup_surface(popup_tx),
    );
    let running = Extension::new(config).launch(host.clone())?;

    // A result from an earlier automatic run shows up on the first open
    let pending = running.popup.mount().await;
    if pending != PopupView::Initial {
        print_view(&pending, args.html);
    }

    if args.watch {
        let popup = Arc::clone(&running.popup);
        let html = args.html;
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let surface = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    Some(()) = popup_rx.recv() => show_popup(&popup, html).await,
                    _ = &mut stop_rx => break,
                }
            }
            // Activations sent by the last automatic runs
            while popup_rx.try_recv().is_ok() {
                show_popup(&popup, html).await;
            }
        });

        for url in &args.urls {
            match host.navigate(url).await {
                Ok(event) => running.review_page_load(event).await,
                Err(e) => ::log::error!("Failed to load {}: {}", url, e),
            }
        }

        running.shutdown().await;
        if stop_tx.send(()).is_err() {
            ::log::debug!("Popup surface already stopped");
        }
        if let Err(e) = surface.await {
            ::log::error!("Popup surface failed: {}", e);
        }
    } else {
        let url = &args.urls[0];
        if args.urls.len() > 1 {
            ::log::warn!("Only {} is reviewed without --watch", url);
        }

        host.navigate(url).await?;
        let tab = host.active_tab().await?;
        host.inject_collector(tab).await?;

        let view = running.popup.analyze().await;
        print_view(&view, args.html);
        running.shutdown().await;
    }

    host.close().await;
    Ok(())
}

async fn show_popup(popup: &PopupController, html: bool) {
    let view = popup.mount().await;
    if view != PopupView::Initial {
        print_view(&view, html);
    }
}

fn print_view(view: &PopupView, html: bool) {
    match view {
        PopupView::Result(result) if html => println!("{}", result.markup),
        _ => println!("{}", view.render_text()),
    }
}
