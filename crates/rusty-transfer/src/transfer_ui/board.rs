use egui::Ui;

use rusty_transfer_core::{Asset, TransferEntry, TransferLog, TransferRequest, TransferView};

use crate::bridge::TransferBridge;
use crate::ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepStatus {
    Pending,
    Active,
    Complete,
    Failed,
}

/// Transfer form and progress. Returns a request when the user pressed "Transfer".
pub fn render_transfer(
    ui: &mut Ui,
    view: &mut TransferView,
    bridge: &TransferBridge,
) -> Option<TransferRequest> {
    ui::section_header(ui, "Transfer");

    let busy = view.is_busy();
    let assets = bridge.assets();
    let mut selected = view.form.asset_index;

    egui::Grid::new("transfer_form")
        .num_columns(2)
        .spacing([10.0, 8.0])
        .show(ui, |ui| {
            ui.label("Receiver:");
            ui::address_input(ui, &mut view.form.receiver, !busy);
            ui.end_row();

            ui.label("Amount:");
            ui.horizontal(|ui| {
                ui::number_input(ui, &mut view.form.amount, "0.0", !busy);
                ui.add_enabled_ui(!busy && assets.len() > 1, |ui| {
                    egui::ComboBox::from_id_salt("asset_select")
                        .selected_text(asset_label(assets.get(selected)))
                        .width(100.0)
                        .show_ui(ui, |ui| {
                            for (index, asset) in assets.iter().enumerate() {
                                ui.selectable_value(&mut selected, index, asset.symbol());
                            }
                        });
                });
            });
            ui.end_row();
        });
    if selected != view.form.asset_index {
        view.select_asset(selected);
    }

    ui.add_space(10.0);
    render_steps(ui, view.log(), busy);

    if let Some((stage, message)) = view.log().failed_step() {
        ui.add_space(6.0);
        ui::error_message(ui, &format!("{}: {message}", stage.label()));
    } else if view.is_transfer_done() {
        if let Some(tx_hash) = view.log().latest_tx_hash() {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui::success_message(ui, "Transfer confirmed");
                let hash = tx_hash.to_string();
                ui::explorer_link(ui, &ui::short_hex(&hash), &bridge.explorer_tx_url(tx_hash));
            });
        }
    }

    ui.add_space(12.0);
    let can_transfer = view.account().is_some()
        && !busy
        && !view.form.receiver.trim().is_empty()
        && !view.form.amount.trim().is_empty();
    let mut request = None;
    ui.horizontal(|ui| {
        if ui::primary_button_enabled(ui, "Transfer", can_transfer).clicked() {
            request = view.form.request(assets);
        }
        if busy {
            ui.spinner();
        }
    });
    request
}

fn asset_label(asset: Option<&Asset>) -> String {
    asset.map(|a| a.symbol().to_owned()).unwrap_or_default()
}

fn render_steps(ui: &mut Ui, log: &TransferLog, busy: bool) {
    let steps = log.steps().steps;
    ui.horizontal(|ui| {
        for (index, stage) in steps.iter().enumerate() {
            if index > 0 {
                ui.label(egui::RichText::new("───").weak());
            }
            let (icon, color) = match step_status(log, index, busy) {
                StepStatus::Complete => ("✔", egui::Color32::from_rgb(80, 200, 120)),
                StepStatus::Active => ("●", egui::Color32::from_rgb(0, 212, 170)),
                StepStatus::Failed => ("✖", egui::Color32::from_rgb(220, 80, 80)),
                StepStatus::Pending => ("○", ui.visuals().weak_text_color()),
            };
            ui.label(egui::RichText::new(icon).color(color).size(16.0));
            ui.label(egui::RichText::new(stage.label()).color(color));
        }
    });
}

fn step_status(log: &TransferLog, index: usize, busy: bool) -> StepStatus {
    if let Some((stage, _)) = log.failed_step() {
        if stage.index() == index {
            return StepStatus::Failed;
        }
    }
    let completed = log
        .entries()
        .iter()
        .filter(|entry| matches!(entry, TransferEntry::Event(event) if event.stage().is_some()))
        .count();
    if index < completed {
        StepStatus::Complete
    } else if index == completed && busy {
        StepStatus::Active
    } else {
        StepStatus::Pending
    }
}
