//! FFT-based Frequency Analysis
//!
//! Screens and monitors re-photographed by a camera leave a regular pixel
//! grid that shows up as mid-level energy away from the spectrum centre.

use rustfft::{num_complex::Complex, FftPlanner};
use std::ops::Range;

/// Half-height of the sampled band around the vertical centre
const BAND_HALF_HEIGHT: usize = 10;

/// Centre-shifted log-magnitude spectrum, `20 * ln(|F| + 1)`, row-major
#[derive(Debug, Clone)]
pub struct MagnitudeSpectrum {
    pub values: Vec<f64>,
    pub width: usize,
    pub height: usize,
}

impl MagnitudeSpectrum {
    /// Value at (row, col)
    pub fn at(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.width + col]
    }

    /// Mean over a rectangular region, clipped to the spectrum.
    /// None when the clipped region is empty.
    pub fn region_mean(&self, rows: Range<usize>, cols: Range<usize>) -> Option<f64> {
        let rows = rows.start.min(self.height)..rows.end.min(self.height);
        let cols = cols.start.min(self.width)..cols.end.min(self.width);
        if rows.is_empty() || cols.is_empty() {
            return None;
        }

        let mut sum = 0.0;
        for row in rows.clone() {
            for col in cols.clone() {
                sum += self.at(row, col);
            }
        }
        Some(sum / (rows.len() * cols.len()) as f64)
    }

    /// Mean energy of the high-frequency band to the right of the centre:
    /// rows `[ch - 10, ch + 10)`, columns `[cw + w/4, cw + w/3)`.
    ///
    /// On spectra under 20 rows the band start goes negative and counts
    /// back from the last row, like a Python slice.
    pub fn high_frequency_energy(&self) -> Option<f64> {
        let (ch, cw) = (self.height / 2, self.width / 2);
        let start = ch as isize - BAND_HALF_HEIGHT as isize;
        let rows = slice_range(start, ch + BAND_HALF_HEIGHT, self.height);
        let cols = (cw + self.width / 4)..(cw + self.width / 3);
        self.region_mean(rows, cols)
    }
}

/// Python `[start:end]` bounds over `len` items for a possibly negative start
fn slice_range(start: isize, end: usize, len: usize) -> Range<usize> {
    let start = if start < 0 {
        usize::try_from(start + len as isize).unwrap_or(0)
    } else {
        start as usize
    };
    let end = end.min(len);
    start.min(end)..end
}

/// 2-D FFT analyzer
pub struct SpectrumAnalyzer {
    /// FFT planner for efficient computation
    planner: FftPlanner<f64>,
}

impl SpectrumAnalyzer {
    /// Create a new spectrum analyzer
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }

    /// Compute the shifted log-magnitude spectrum of a row-major intensity image
    pub fn magnitude_spectrum(&mut self, pixels: &[f64], width: usize, height: usize) -> MagnitudeSpectrum {
        if width == 0 || height == 0 || pixels.len() != width * height {
            return MagnitudeSpectrum {
                values: Vec::new(),
                width: 0,
                height: 0,
            };
        }

        let mut buffer: Vec<Complex<f64>> = pixels.iter().map(|&v| Complex::new(v, 0.0)).collect();

        // Rows
        let row_fft = self.planner.plan_fft_forward(width);
        for row in buffer.chunks_exact_mut(width) {
            row_fft.process(row);
        }

        // Columns
        let col_fft = self.planner.plan_fft_forward(height);
        let mut column = vec![Complex::new(0.0, 0.0); height];
        for col in 0..width {
            for row in 0..height {
                column[row] = buffer[row * width + col];
            }
            col_fft.process(&mut column);
            for row in 0..height {
                buffer[row * width + col] = column[row];
            }
        }

        // Shift zero frequency to the centre: out[(i + n/2) % n] = in[i]
        let mut values = vec![0.0; width * height];
        for row in 0..height {
            let shifted_row = (row + height / 2) % height;
            for col in 0..width {
                let shifted_col = (col + width / 2) % width;
                let magnitude = buffer[row * width + col].norm();
                values[shifted_row * width + shifted_col] = 20.0 * (magnitude + 1.0).ln();
            }
        }

        MagnitudeSpectrum { values, width, height }
    }
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
