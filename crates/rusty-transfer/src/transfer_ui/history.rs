use egui::Ui;
use egui_extras::{Column, TableBuilder};

use rusty_transfer_core::HistoryView;

use crate::bridge::TransferBridge;
use crate::ui;

const COLUMNS: [&str; 6] = ["Date", "TX hash", "Sender", "Receiver", "Value", "Gas(Gwei)"];

pub fn render_history(ui: &mut Ui, history: &HistoryView, bridge: &TransferBridge) {
    ui::section_header(ui, "History");

    if history.rows().is_empty() {
        if history.is_loading() {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Loading transactions...");
            });
        } else {
            ui.label(egui::RichText::new("No transactions yet.").weak());
        }
        return;
    }

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .column(Column::auto().at_least(140.0))
        .columns(Column::auto().at_least(110.0), 3)
        .column(Column::auto().at_least(80.0))
        .column(Column::remainder())
        .header(22.0, |mut header| {
            for title in COLUMNS {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for row in history.rows() {
                body.row(20.0, |mut cells| {
                    cells.col(|ui| {
                        ui.label(row.date.as_str());
                    });
                    cells.col(|ui| {
                        let hash = row.hash.to_string();
                        ui::explorer_link(ui, &ui::short_hex(&hash), &bridge.explorer_tx_url(row.hash));
                    });
                    cells.col(|ui| {
                        ui.label(egui::RichText::new(ui::short_hex(&row.from)).monospace())
                            .on_hover_text(row.from.as_str());
                    });
                    cells.col(|ui| {
                        ui.label(egui::RichText::new(ui::short_hex(&row.to)).monospace())
                            .on_hover_text(row.to.as_str());
                    });
                    cells.col(|ui| {
                        ui.label(row.value.as_str());
                    });
                    cells.col(|ui| {
                        ui.label(row.gas.as_str());
                    });
                });
            }
        });
}
