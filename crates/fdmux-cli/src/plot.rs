//! Spectrum and spectrogram plot rendering.
//!
//! Plots are diagnostic only. They are rendered into RGB buffers and encoded
//! as PNG with fixed encoder settings so identical inputs give identical bytes.

use fdmux_dsp::{Spectrogram, Spectrum};
use png::{BitDepth, ColorType, Compression, Encoder, FilterType};
use std::io::Write;

/// Plot image dimensions.
pub const PLOT_WIDTH: u32 = 1024;
pub const PLOT_HEIGHT: u32 = 384;

/// Dynamic range shown by every plot, in dB below the loudest value.
const DYNAMIC_RANGE_DB: f64 = 80.0;

const BACKGROUND_COLOR: [u8; 3] = [32, 32, 32];
const GRID_COLOR: [u8; 3] = [56, 56, 56];
const SPECTRUM_COLOR: [u8; 3] = [64, 192, 255];
const MARKER_COLOR: [u8; 3] = [255, 128, 64];
const DIVIDER_COLOR: [u8; 3] = [200, 200, 200];

/// Heat map stops, from silent to loudest.
const HEAT_STOPS: [[u8; 3]; 5] = [
    [0, 0, 0],
    [40, 0, 120],
    [200, 30, 80],
    [255, 170, 0],
    [255, 255, 220],
];

/// Renders a one-sided magnitude spectrum as a PNG.
///
/// The x axis spans 0 Hz to the highest bin; each column shows the strongest
/// bin that falls in it on an 80 dB scale. Faint vertical lines mark every
/// kHz and `markers` (e.g. carrier frequencies) are drawn in orange.
pub fn render_spectrum_png(
    spectrum: &Spectrum,
    markers: &[f64],
) -> Result<Vec<u8>, png::EncodingError> {
    let w = PLOT_WIDTH as usize;
    let h = PLOT_HEIGHT as usize;
    let mut canvas = Canvas::new(w, h);

    let max_hz = spectrum.frequencies.last().copied().unwrap_or(0.0);
    let hz_per_column = if max_hz > 0.0 { max_hz / w as f64 } else { 0.0 };

    if hz_per_column > 0.0 {
        let mut khz = 1_000.0;
        while khz < max_hz {
            canvas.vline((khz / hz_per_column) as usize, GRID_COLOR);
            khz += 1_000.0;
        }
    }

    let columns = column_peaks(spectrum, w, hz_per_column);
    let peak = spectrum.peak_magnitude();
    for (x, &magnitude) in columns.iter().enumerate() {
        let level = db_level(magnitude, peak);
        let bar = (level * (h - 1) as f64).round() as usize;
        for y in (h - bar)..h {
            canvas.set(x, y, SPECTRUM_COLOR);
        }
    }

    if hz_per_column > 0.0 {
        for &marker in markers {
            if marker >= 0.0 && marker <= max_hz {
                canvas.vline((marker / hz_per_column) as usize, MARKER_COLOR);
            }
        }
    }

    canvas.encode()
}

/// Renders two spectrograms side by side: original on the left, recovered on
/// the right.
///
/// Both panels share one colour scale, referenced to the louder of the two.
pub fn render_spectrogram_comparison_png(
    original: &Spectrogram,
    recovered: &Spectrogram,
) -> Result<Vec<u8>, png::EncodingError> {
    let w = PLOT_WIDTH as usize;
    let h = PLOT_HEIGHT as usize;
    let panel_width = w / 2;
    let mut canvas = Canvas::new(w, h);

    let reference = original.max_power().max(recovered.max_power());
    draw_spectrogram(&mut canvas, original, 0, panel_width, reference);
    draw_spectrogram(&mut canvas, recovered, panel_width, panel_width, reference);
    canvas.vline(panel_width, DIVIDER_COLOR);

    canvas.encode()
}

fn draw_spectrogram(
    canvas: &mut Canvas,
    spectrogram: &Spectrogram,
    x0: usize,
    width: usize,
    reference: f64,
) {
    let frames = spectrogram.num_frames();
    let bins = spectrogram.frequencies.len();
    if frames == 0 || bins == 0 {
        return;
    }
    let h = canvas.height;

    for x in 0..width {
        let frame = &spectrogram.power[x * frames / width];
        for y in 0..h {
            // Low frequencies at the bottom.
            let bin = (h - 1 - y) * bins / h;
            let color = heat_color(db_level(frame[bin].sqrt(), reference.sqrt()));
            canvas.set(x0 + x, y, color);
        }
    }
}

/// Strongest magnitude per column; empty columns borrow the nearest bin.
fn column_peaks(spectrum: &Spectrum, num_columns: usize, hz_per_column: f64) -> Vec<f64> {
    let mut columns = vec![0.0_f64; num_columns];
    if hz_per_column <= 0.0 {
        return columns;
    }
    let mut filled = vec![false; num_columns];
    for (&f, &m) in spectrum.frequencies.iter().zip(&spectrum.magnitudes) {
        let x = ((f / hz_per_column) as usize).min(num_columns - 1);
        columns[x] = columns[x].max(m);
        filled[x] = true;
    }

    // Sparse spectra (fewer bins than columns) would otherwise show gaps.
    let bin_hz = spectrum.frequencies.get(1).copied().unwrap_or(hz_per_column);
    for x in 0..num_columns {
        if !filled[x] {
            let nearest = ((x as f64 * hz_per_column / bin_hz).round() as usize)
                .min(spectrum.magnitudes.len().saturating_sub(1));
            columns[x] = spectrum.magnitudes.get(nearest).copied().unwrap_or(0.0);
        }
    }
    columns
}

/// Maps an amplitude to [0, 1] on a dB scale relative to `reference`.
fn db_level(amplitude: f64, reference: f64) -> f64 {
    if amplitude <= 0.0 || reference <= 0.0 {
        return 0.0;
    }
    let db = 20.0 * (amplitude / reference).log10();
    ((db + DYNAMIC_RANGE_DB) / DYNAMIC_RANGE_DB).clamp(0.0, 1.0)
}

/// Piecewise-linear colour map over [`HEAT_STOPS`].
fn heat_color(level: f64) -> [u8; 3] {
    let scaled = level.clamp(0.0, 1.0) * (HEAT_STOPS.len() - 1) as f64;
    let i = (scaled.floor() as usize).min(HEAT_STOPS.len() - 2);
    let t = scaled - i as f64;
    let (lo, hi) = (HEAT_STOPS[i], HEAT_STOPS[i + 1]);
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    [mix(lo[0], hi[0]), mix(lo[1], hi[1]), mix(lo[2], hi[2])]
}

/// RGB pixel buffer.
struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Canvas {
    fn new(width: usize, height: usize) -> Self {
        let mut pixels = Vec::with_capacity(width * height * 3);
        for _ in 0..width * height {
            pixels.extend_from_slice(&BACKGROUND_COLOR);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    fn set(&mut self, x: usize, y: usize, color: [u8; 3]) {
        if x < self.width && y < self.height {
            let idx = (y * self.width + x) * 3;
            self.pixels[idx..idx + 3].copy_from_slice(&color);
        }
    }

    fn vline(&mut self, x: usize, color: [u8; 3]) {
        for y in 0..self.height {
            self.set(x, y, color);
        }
    }

    fn encode(&self) -> Result<Vec<u8>, png::EncodingError> {
        let mut buffer = Vec::new();
        encode_png_to_writer(
            &self.pixels,
            self.width as u32,
            self.height as u32,
            &mut buffer,
        )?;
        Ok(buffer)
    }
}

/// Encodes RGB buffer as PNG to a writer.
fn encode_png_to_writer<W: Write>(
    rgb_data: &[u8],
    width: u32,
    height: u32,
    writer: W,
) -> Result<(), png::EncodingError> {
    let mut encoder = Encoder::new(writer, width, height);
    encoder.set_color(ColorType::Rgb);
    encoder.set_depth(BitDepth::Eight);
    // Use fixed compression settings for determinism
    encoder.set_compression(Compression::Default);
    encoder.set_filter(FilterType::NoFilter);

    let mut png_writer = encoder.write_header()?;
    png_writer.write_image_data(rgb_data)?;

    Ok(())
}
