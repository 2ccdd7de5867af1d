//! Main application state and update loop

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use alloy::primitives::B256;
use eframe::egui;

use rusty_transfer_adapters::TransferAdapterConfig;
use rusty_transfer_core::{
    AccountInfo, ChainError, HistoryRefresh, HistoryView, TransferRequest, TransferView, ViewState,
};

use crate::bridge::{TransferBridge, TransferInbox};
use crate::transfer_ui;
use crate::ui;

/// Pause before refetching the account after a failed attempt.
const ACCOUNT_RETRY_DELAY: Duration = Duration::from_secs(3);

const UNLOCK_PROMPT: &str = "Login/Unlock your wallet first, then press reload button to proceed";

type Slot<T> = Arc<Mutex<Option<T>>>;

/// The main application state
pub struct App {
    bridge: TransferBridge,
    /// Transfer board state
    view: TransferView,
    /// History table state
    history: HistoryView,
    /// Background account fetch result
    account_result: Slot<Result<AccountInfo, ChainError>>,
    /// Transfer items not yet applied to the view
    transfer_inbox: TransferInbox,
    /// Background history refresh result
    history_result: Slot<HistoryRefresh>,
    /// Earliest time for the next account fetch after an error
    account_retry_at: Option<Instant>,
}

impl App {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: TransferAdapterConfig) -> Self {
        Self {
            bridge: TransferBridge::new(config),
            view: TransferView::new(),
            history: HistoryView::new(),
            account_result: Arc::new(Mutex::new(None)),
            transfer_inbox: Arc::new(Mutex::new(Vec::new())),
            history_result: Arc::new(Mutex::new(None)),
            account_retry_at: None,
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(egui::Visuals::dark());

        self.check_account_result();
        self.drain_transfer_inbox();
        self.check_history_result();

        if self.view.needs_account_fetch() {
            match self.account_retry_at {
                Some(at) if at > Instant::now() => {
                    ctx.request_repaint_after(at.saturating_duration_since(Instant::now()));
                }
                _ => self.trigger_account_fetch(ctx),
            }
        }
        let latest = self.view.latest_tx_hash();
        if self.view.account().is_some() && self.history.should_refresh(latest) {
            self.trigger_history_refresh(ctx, latest);
        }

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.heading(
                    egui::RichText::new("💸 Rusty-Transfer")
                        .size(22.0)
                        .color(egui::Color32::from_rgb(0, 212, 170)),
                );
                ui.add_space(30.0);
                ui.separator();
                ui.label(format!("Chain {}", self.bridge.chain_id()));
                if self.bridge.is_deterministic() {
                    ui.label(
                        egui::RichText::new("development wallet")
                            .color(egui::Color32::from_rgb(220, 180, 50)),
                    )
                    .on_hover_text("No wallet URL configured; transfers stay in this process");
                }
            });
            ui.add_space(4.0);
        });

        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            ui.label(
                egui::RichText::new(format!(
                    "build {} · {}",
                    env!("GIT_HASH"),
                    env!("BUILD_TIME")
                ))
                .weak()
                .small(),
            );
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if let ViewState::FatalProviderError(reason) = self.view.state() {
                render_missing_provider(ui, reason);
                return;
            }
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.add_space(10.0);
                ui::styled_heading(ui, "Transfer Board");
                ui.add_space(5.0);

                ui::card(ui, |ui| transfer_ui::information::render_information(ui, &self.view));
                ui.add_space(10.0);

                let mut request = None;
                ui::card(ui, |ui| {
                    request = transfer_ui::board::render_transfer(ui, &mut self.view, &self.bridge);
                });
                if let Some(request) = request {
                    self.start_transfer(ctx, request);
                }
                ui.add_space(10.0);

                ui::card(ui, |ui| {
                    transfer_ui::history::render_history(ui, &self.history, &self.bridge)
                });
                ui.add_space(20.0);
            });
        });

        if self.view.is_awaiting_unlock() {
            self.render_unlock_dialog(ctx);
        }
    }
}

impl App {
    fn render_unlock_dialog(&mut self, ctx: &egui::Context) {
        egui::Window::new("Wallet locked")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(UNLOCK_PROMPT);
                ui.add_space(10.0);
                if ui::primary_button_enabled(ui, "Reload", true).clicked() {
                    tracing::info!("user requested reload after unlocking the wallet");
                    self.view.acknowledge_unlock();
                }
            });
    }

    fn trigger_account_fetch(&mut self, ctx: &egui::Context) {
        let Some(asset) = self.bridge.assets().get(self.view.form.asset_index).cloned() else {
            return;
        };
        if !self.view.begin_account_fetch() {
            return;
        }

        let bridge = self.bridge.clone();
        let result = Arc::clone(&self.account_result);
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            let fetched = bridge.account_info(&asset);
            if let Ok(mut guard) = result.lock() {
                *guard = Some(fetched);
            }
            ctx.request_repaint();
        });
    }

    fn check_account_result(&mut self) {
        if let Some(result) = take_slot(&self.account_result) {
            self.account_retry_at = match &result {
                Err(err) if !err.is_pending_approval() => Some(Instant::now() + ACCOUNT_RETRY_DELAY),
                _ => None,
            };
            self.view.apply_account(result);
        }
    }

    fn start_transfer(&mut self, ctx: &egui::Context, request: TransferRequest) {
        if !self.view.begin_transfer() {
            return;
        }
        tracing::info!(asset = request.asset.symbol(), amount = %request.amount, "starting transfer");

        let bridge = self.bridge.clone();
        let inbox = Arc::clone(&self.transfer_inbox);
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            bridge.run_transfer(request, &inbox, || ctx.request_repaint());
        });
    }

    fn drain_transfer_inbox(&mut self) {
        let items = match self.transfer_inbox.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(e) => {
                tracing::error!(error = %e, "transfer inbox poisoned");
                return;
            }
        };
        for (item, stage) in items {
            self.view.apply_transfer_item(item, stage);
        }
    }

    fn trigger_history_refresh(&mut self, ctx: &egui::Context, expected: Option<B256>) {
        self.history.begin_refresh(expected);

        let bridge = self.bridge.clone();
        let result = Arc::clone(&self.history_result);
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            let refresh = bridge.refresh_history(expected);
            if let Ok(mut guard) = result.lock() {
                *guard = Some(refresh);
            }
            ctx.request_repaint();
        });
    }

    fn check_history_result(&mut self) {
        if let Some(refresh) = take_slot(&self.history_result) {
            self.history.apply(refresh);
        }
    }
}

fn render_missing_provider(ui: &mut egui::Ui, reason: &str) {
    ui.add_space(40.0);
    ui.vertical_centered(|ui| {
        ui::styled_heading(ui, "No wallet provider detected");
        ui.add_space(10.0);
        ui.label("Start a wallet that exposes an EIP-1193 RPC endpoint and point RUSTY_TRANSFER_WALLET_URL at it, then restart.");
        ui.add_space(10.0);
        ui::error_message(ui, reason);
    });
}

fn take_slot<T>(slot: &Slot<T>) -> Option<T> {
    match slot.lock() {
        Ok(mut guard) => guard.take(),
        Err(e) => {
            tracing::error!(error = %e, "result slot poisoned");
            None
        }
    }
}
