use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::{AppState, View};

// ---------------------------------------------------------------------------
// Left side panel – axes and record list
// ---------------------------------------------------------------------------

/// Render the left panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("View");
    ui.horizontal(|ui: &mut Ui| {
        ui.selectable_value(&mut state.view, View::Table, "Table");
        ui.selectable_value(&mut state.view, View::Spectra, "Spectra");
    });
    ui.separator();

    let columns: Vec<String> = state
        .table
        .as_ref()
        .map(|t| t.columns().to_vec())
        .unwrap_or_default();

    if state.view == View::Table {
        column_picker(ui, "x axis", "x_column", &columns, &mut state.x_column);
        column_picker(ui, "y axis", "y_column", &columns, &mut state.y_column);
        ui.separator();
    }

    ui.strong("Records");
    if state.corpus.is_empty() {
        ui.label("No files loaded.");
        return;
    }
    ui.horizontal(|ui: &mut Ui| {
        if ui.small_button("All").clicked() {
            state.select_all();
        }
        if ui.small_button("None").clicked() {
            state.select_none();
        }
    });

    let names: Vec<String> = state.corpus.iter().map(|e| e.source.clone()).collect();
    let mut toggled = None;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for (idx, name) in names.iter().enumerate() {
                let label = std::path::Path::new(name)
                    .file_name()
                    .map(|f| f.to_string_lossy().into_owned())
                    .unwrap_or_else(|| name.clone());
                let color = state.colors.get(idx).copied().unwrap_or(Color32::GRAY);

                let mut checked = state.visible.contains(&idx);
                if ui
                    .checkbox(&mut checked, RichText::new(label).color(color))
                    .on_hover_text(name.as_str())
                    .changed()
                {
                    toggled = Some(idx);
                }
            }
        });

    if let Some(idx) = toggled {
        state.toggle_visible(idx);
    }
}

fn column_picker(ui: &mut Ui, label: &str, id: &str, columns: &[String], selected: &mut usize) {
    let current = columns
        .get(*selected)
        .cloned()
        .unwrap_or_else(|| format!("column {selected}"));
    ui.horizontal(|ui: &mut Ui| {
        ui.label(label);
        egui::ComboBox::from_id_salt(id)
            .selected_text(current)
            .show_ui(ui, |ui: &mut Ui| {
                for (i, col) in columns.iter().enumerate() {
                    ui.selectable_value(selected, i, col.as_str());
                }
            });
    });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        ui.label(format!(
            "{} records, {} visible",
            state.corpus.len(),
            state.visible.len()
        ));

        ui.separator();

        if ui
            .selectable_label(state.minmax_scaling, "Min-Max Scaling")
            .clicked()
        {
            state.minmax_scaling = !state.minmax_scaling;
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let files = rfd::FileDialog::new()
        .set_title("Open MXW files")
        .add_filter("MXW files", &["mxw", "MXW", "txt"])
        .add_filter("All files", &["*"])
        .pick_files();

    if let Some(paths) = files {
        state.add_files(&paths);
    }
}
