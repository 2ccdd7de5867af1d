use egui::Ui;

use rusty_transfer_core::{TransferView, ViewState};

use crate::ui;

pub fn render_information(ui: &mut Ui, view: &TransferView) {
    ui::section_header(ui, "Information");

    match view.account() {
        Some(account) => {
            egui::Grid::new("information_grid")
                .num_columns(2)
                .spacing([10.0, 6.0])
                .show(ui, |ui| {
                    ui.label(egui::RichText::new("Address:").strong());
                    ui::copyable_value(ui, &account.address.to_string());
                    ui.end_row();

                    ui.label(egui::RichText::new("Balance:").strong());
                    ui.label(
                        egui::RichText::new(format!(
                            "{} {}",
                            account.balance.formatted,
                            account.asset.symbol()
                        ))
                        .monospace(),
                    );
                    ui.end_row();
                });
        }
        None if *view.state() == ViewState::FetchingAccount => {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Loading account...");
            });
        }
        None => {
            ui.label(egui::RichText::new("Wallet not connected").weak());
        }
    }

    if let Some(err) = view.last_error() {
        if view.log().failed_step().is_none() {
            ui::error_message(ui, err);
        }
    }
}
