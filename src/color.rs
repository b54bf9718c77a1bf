use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Curve colours
// ---------------------------------------------------------------------------

/// One colour per plotted curve, so a trace keeps its colour across plots.
#[derive(Debug, Clone, Copy)]
pub struct CurveColors {
    pub measured: Color32,
    pub calibrated: Color32,
    pub window: Color32,
    pub response: Color32,
    pub pulse: Color32,
}

impl Default for CurveColors {
    fn default() -> Self {
        let p = generate_palette(5);
        Self {
            measured: p.first().copied().unwrap_or(Color32::GRAY),
            calibrated: p.get(2).copied().unwrap_or(Color32::LIGHT_BLUE),
            window: p.get(1).copied().unwrap_or(Color32::YELLOW),
            response: p.get(3).copied().unwrap_or(Color32::LIGHT_GREEN),
            pulse: p.get(4).copied().unwrap_or(Color32::LIGHT_RED),
        }
    }
}
