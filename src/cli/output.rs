//! Output formatting for CLI

use crate::convert::ConversionStats;
use crate::inference::InferenceStats;

/// Summary printed after `infer`
pub fn format_inference_summary(stats: &InferenceStats) -> String {
    let mut output = format!(
        "Sampled {} row(s), discovered {} path(s)",
        stats.rows_sampled, stats.paths_discovered
    );
    if stats.sample_limit_reached {
        output.push_str(" (sample limit reached)");
    }
    output
}

/// Summary printed after `convert`
pub fn format_conversion_summary(stats: &ConversionStats) -> String {
    let mut output = format!(
        "Read {} row(s), converted {}",
        stats.rows_read, stats.rows_converted
    );
    if stats.rows_dropped > 0 {
        output.push_str(&format!(", dropped {}", stats.rows_dropped));
    }
    if stats.rows_failed > 0 {
        output.push_str(&format!(", failed {}", stats.rows_failed));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_summary_mentions_drops_only_when_present() {
        let clean = ConversionStats {
            rows_read: 3,
            rows_converted: 3,
            ..Default::default()
        };
        assert_eq!(format_conversion_summary(&clean), "Read 3 row(s), converted 3");

        let dropped = ConversionStats {
            rows_read: 3,
            rows_converted: 2,
            rows_dropped: 1,
            rows_failed: 0,
        };
        assert_eq!(
            format_conversion_summary(&dropped),
            "Read 3 row(s), converted 2, dropped 1"
        );
    }

    #[test]
    fn test_inference_summary() {
        let stats = InferenceStats {
            rows_sampled: 100,
            paths_discovered: 4,
            sample_limit_reached: true,
        };
        assert_eq!(
            format_inference_summary(&stats),
            "Sampled 100 row(s), discovered 4 path(s) (sample limit reached)"
        );
    }
}
