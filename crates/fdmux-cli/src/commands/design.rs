//! Design command implementation
//!
//! Prints Butterworth low-pass coefficients and a few response points, for
//! checking the recovery filter against reference tables.

use anyhow::Result;
use colored::Colorize;
use fdmux_dsp::FilterCoeffs;
use std::process::ExitCode;

use super::json_output::{
    error_codes, print_json, DesignOutput, DesignResult, GainReport, JsonError,
};

/// Run the design command
///
/// # Arguments
/// * `order` - Filter order
/// * `cutoff_hz` - Cutoff frequency in Hz
/// * `sample_rate` - Sample rate in Hz
/// * `json_output` - Whether to output machine-readable JSON
///
/// # Returns
/// Exit code: 0 on success, 1 on invalid parameters
pub fn run(order: usize, cutoff_hz: f64, sample_rate: u32, json_output: bool) -> Result<ExitCode> {
    let result = design(order, cutoff_hz, sample_rate);

    if json_output {
        let output = match result {
            Ok(result) => DesignOutput {
                success: true,
                errors: Vec::new(),
                result: Some(result),
            },
            Err(message) => DesignOutput {
                success: false,
                errors: vec![JsonError::new(error_codes::FILTER_DESIGN, message)],
                result: None,
            },
        };
        print_json(&output)?;
        return Ok(if output.success {
            ExitCode::SUCCESS
        } else {
            ExitCode::from(1)
        });
    }

    match result {
        Ok(result) => {
            print_design(&result);
            Ok(ExitCode::SUCCESS)
        }
        Err(message) => {
            println!("{} {}", "FAILED".red().bold(), message);
            Ok(ExitCode::from(1))
        }
    }
}

/// Designs the filter and measures its response.
pub fn design(order: usize, cutoff_hz: f64, sample_rate: u32) -> Result<DesignResult, String> {
    let coeffs = FilterCoeffs::butterworth_lowpass(order, cutoff_hz, sample_rate)
        .map_err(|e| e.to_string())?;

    let to_db = |gain: f64| 20.0 * gain.log10();
    let nyquist = sample_rate as f64 / 2.0;
    let double_cutoff = 2.0 * cutoff_hz;

    Ok(DesignResult {
        order,
        cutoff_hz,
        sample_rate,
        normalized_cutoff: cutoff_hz / nyquist,
        b: coeffs.b().to_vec(),
        a: coeffs.a().to_vec(),
        gain: GainReport {
            dc_db: to_db(coeffs.gain_at(0.0, sample_rate)),
            cutoff_db: to_db(coeffs.gain_at(cutoff_hz, sample_rate)),
            double_cutoff_db: (double_cutoff < nyquist)
                .then(|| to_db(coeffs.gain_at(double_cutoff, sample_rate))),
        },
        stable: coeffs.is_stable(),
    })
}

fn print_design(result: &DesignResult) {
    println!(
        "{} order {} Butterworth low-pass, {} Hz @ {} Hz (Wn = {:.6})",
        "Design:".cyan().bold(),
        result.order,
        result.cutoff_hz,
        result.sample_rate,
        result.normalized_cutoff
    );

    println!("\n{}", "b:".bold());
    for (k, tap) in result.b.iter().enumerate() {
        println!("  b[{}] = {:+.14e}", k, tap);
    }
    println!("\n{}", "a:".bold());
    for (k, tap) in result.a.iter().enumerate() {
        println!("  a[{}] = {:+.14e}", k, tap);
    }

    println!("\n{}", "Response:".bold());
    println!("  {:>14} {:>9.3} dB", "DC", result.gain.dc_db);
    println!("  {:>14} {:>9.3} dB", "cutoff", result.gain.cutoff_db);
    if let Some(db) = result.gain.double_cutoff_db {
        println!("  {:>14} {:>9.3} dB", "2 x cutoff", db);
    }

    let stability = if result.stable {
        "stable".green()
    } else {
        "UNSTABLE".red().bold()
    };
    println!("\n{} {}", "Poles:".dimmed(), stability);
}
