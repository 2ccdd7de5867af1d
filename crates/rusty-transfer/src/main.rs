//! Rusty-Transfer: send ETH and ERC-20 tokens through your wallet provider

use eframe::egui;

use rusty_transfer_adapters::TransferAdapterConfig;

mod app;
mod bridge;
mod transfer_ui;
mod ui;

fn main() -> eyre::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = TransferAdapterConfig::from_env();
    tracing::info!(
        profile = ?config.runtime_profile,
        chain_id = config.chain_id,
        wallet_url = config.eip1193_proxy_url.as_deref().unwrap_or("-"),
        version = env!("GIT_HASH"),
        "Starting Rusty-Transfer"
    );

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Rusty-Transfer")
            .with_inner_size([960.0, 760.0])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty-Transfer",
        native_options,
        Box::new(move |cc| Ok(Box::new(app::App::new(cc, config)))),
    )
    .map_err(|e| eyre::eyre!("failed to run the desktop window: {e}"))
}
