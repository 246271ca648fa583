use eframe::egui::{Color32, Ui};
use egui_plot::{Line, Plot, PlotPoints, Points};

use crate::state::{AppState, View};

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render whichever plot the state asks for.
pub fn central_plot(ui: &mut Ui, state: &AppState) {
    if state.corpus.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open MXW files to plot them  (File → Open…)");
        });
        return;
    }
    match state.view {
        View::Table => table_plot(ui, state),
        View::Spectra => spectra_plot(ui, state),
    }
}

/// One column against another across all records, joined in file order.
fn table_plot(ui: &mut Ui, state: &AppState) {
    let points = match state.table_points() {
        Ok(points) => points,
        Err(msg) => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.label(msg);
            });
            return;
        }
    };

    let x_name = state.column_name(state.x_column);
    let y_name = state.column_name(state.y_column);

    Plot::new("table_plot")
        .x_axis_label(x_name.clone())
        .y_axis_label(y_name.clone())
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            let line: PlotPoints = points.iter().copied().collect();
            plot_ui.line(
                Line::new(line)
                    .name(format!("{y_name} vs {x_name}"))
                    .color(Color32::LIGHT_BLUE)
                    .width(1.5),
            );
            for (i, p) in points.iter().enumerate() {
                let color = state
                    .colors
                    .get(i)
                    .copied()
                    .unwrap_or(Color32::LIGHT_BLUE);
                plot_ui.points(Points::new(vec![*p]).radius(3.0).color(color));
            }
        });
}

/// Selected spectrum of every visible record, coloured by file order.
fn spectra_plot(ui: &mut Ui, state: &AppState) {
    Plot::new("spectra_plot")
        .legend(egui_plot::Legend::default())
        .x_axis_label("Wavelength (nm)")
        .y_axis_label(if state.minmax_scaling {
            "Absorbance (scaled)"
        } else {
            "Absorbance"
        })
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for &idx in &state.visible {
                let Some(entry) = state.corpus.entries().get(idx) else {
                    continue;
                };
                let sp = entry.record.spectrum();
                let color = state
                    .colors
                    .get(idx)
                    .copied()
                    .unwrap_or(Color32::LIGHT_BLUE);

                let y_values: Vec<f64> = if state.minmax_scaling {
                    minmax(&sp.absorbance)
                } else {
                    sp.absorbance.clone()
                };

                let points: PlotPoints = sp
                    .wavelength
                    .iter()
                    .zip(y_values.iter())
                    .map(|(&xi, &yi)| [xi, yi])
                    .collect();

                let line = Line::new(points)
                    .name(&entry.source)
                    .color(color)
                    .width(1.5);
                plot_ui.line(line);
            }
        });
}

fn minmax(ys: &[f64]) -> Vec<f64> {
    let min = ys.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = ys.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if range.abs() < f64::EPSILON {
        vec![0.0; ys.len()]
    } else {
        ys.iter().map(|&y| (y - min) / range).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::minmax;

    #[test]
    fn minmax_scales_to_unit_range() {
        assert_eq!(minmax(&[1.0, 2.0, 3.0]), vec![0.0, 0.5, 1.0]);
        assert_eq!(minmax(&[0.4, 0.4]), vec![0.0, 0.0]);
        assert!(minmax(&[]).is_empty());
    }
}
