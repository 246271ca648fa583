use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Record colours
// ---------------------------------------------------------------------------

/// One colour per record along a blue → red hue sweep, so the order of a
/// titration series reads off the plot (first file blue, last file red).
pub fn record_colors(n: usize) -> Vec<Color32> {
    match n {
        0 => Vec::new(),
        1 => vec![hsl_to_color32(240.0)],
        _ => (0..n)
            .map(|i| hsl_to_color32(240.0 * (1.0 - i as f32 / (n - 1) as f32)))
            .collect(),
    }
}

fn hsl_to_color32(hue: f32) -> Color32 {
    let rgb: Srgb = Hsl::new(hue, 0.75, 0.5).into_color();
    Color32::from_rgb(
        (rgb.red * 255.0).round() as u8,
        (rgb.green * 255.0).round() as u8,
        (rgb.blue * 255.0).round() as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweep_runs_from_blue_to_red() {
        let colors = record_colors(3);
        assert_eq!(colors.len(), 3);
        let (first, last) = (colors[0], colors[2]);
        assert!(first.b() > first.r());
        assert!(last.r() > last.b());
        assert!(record_colors(0).is_empty());
        assert_eq!(record_colors(1).len(), 1);
    }
}
