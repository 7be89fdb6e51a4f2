use crate::batch::BatchSummary;
use crate::constants::{INFO_PREFIX, OUTPUT_PREFIX, SAVED_PREFIX, SIZE_PREFIX, SUCCESS_PREFIX};
use crate::convert::ConversionResult;
use crate::utils::{format_signed_size, format_size, percentage_reduction, pluralize_files};

/// Overall reduction across a result set, `"0"` when it is empty.
pub fn total_percentage_reduction(results: &[ConversionResult]) -> String {
    if results.is_empty() {
        return "0".to_string();
    }
    let original = results.iter().map(ConversionResult::original_size).sum();
    let converted = results.iter().map(ConversionResult::webp_size).sum();
    percentage_reduction(original, converted)
}

pub fn selection_line(count: usize) -> String {
    format!("Selected {} {}", count, pluralize_files(count))
}

/// Lines describing one converted image.
pub fn card_lines(result: &ConversionResult) -> Vec<String> {
    vec![
        result.output_name().to_string(),
        format!("Original: {}", format_size(result.original_size())),
        format!("WebP: {}", format_size(result.webp_size())),
        format!(
            "Saved: {}%",
            percentage_reduction(result.original_size(), result.webp_size())
        ),
    ]
}

/// `Total space saved: X (Y%)`, or the growth when WebP came out larger.
pub fn savings_line(total_saved: i64, results: &[ConversionResult]) -> String {
    format_savings(total_saved, &total_percentage_reduction(results))
}

fn format_savings(total_saved: i64, percentage: &str) -> String {
    if total_saved < 0 {
        format!(
            "Total size increased: {} ({}%)",
            format_signed_size(-total_saved),
            percentage.trim_start_matches('-')
        )
    } else {
        format!(
            "Total space saved: {} ({}%)",
            format_signed_size(total_saved),
            percentage
        )
    }
}

pub fn print_selection(count: usize) {
    crate::info!("{} {}", INFO_PREFIX, selection_line(count));
}

pub fn print_cards(results: &[ConversionResult]) {
    for result in results {
        let mut lines = card_lines(result).into_iter();
        if let Some(name) = lines.next() {
            crate::info!("  🖼️  {}", name);
        }
        for line in lines {
            crate::info!("      {}", line);
        }
        crate::verbose!("      Preview: {}", result.preview().path().display());
    }
}

pub fn print_summary(summary: &BatchSummary, total_saved: i64, results: &[ConversionResult]) {
    crate::info!("\n{} Conversion Summary:", SIZE_PREFIX);
    crate::info!(
        "  {} Processed {} {}",
        OUTPUT_PREFIX,
        results.len(),
        pluralize_files(results.len())
    );
    if summary.failed > 0 {
        crate::info!(
            "  ⚠️  Skipped {} {} that could not be converted",
            summary.failed,
            pluralize_files(summary.failed)
        );
    }
    crate::info!("  {} {}", SAVED_PREFIX, savings_line(total_saved, results));
    crate::info!("  ⏱️  Total time: {:.2?}", summary.elapsed);
}

pub fn print_written(path: &std::path::Path) {
    crate::info!("{} Wrote {}", SUCCESS_PREFIX, path.display());
}
