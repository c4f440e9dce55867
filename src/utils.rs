use std::time::Duration;

use tracing::info;

pub fn format_elapsed(duration: Duration) -> String {
    let total_ms = duration.as_millis();
    let (mins, secs, ms) = (total_ms / 60_000, (total_ms % 60_000) / 1000, total_ms % 1000);

    if mins > 0 {
        format!("{}m {}s {}ms", mins, secs, ms)
    } else if secs > 0 {
        format!("{}s {}ms", secs, ms)
    } else {
        format!("{}ms", ms)
    }
}

pub fn display_elapsed_time(duration: Duration) {
    info!("done in {}", format_elapsed(duration));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_largest_unit() {
        assert_eq!(format_elapsed(Duration::from_millis(42)), "42ms");
        assert_eq!(format_elapsed(Duration::from_millis(3_005)), "3s 5ms");
        assert_eq!(format_elapsed(Duration::from_millis(125_250)), "2m 5s 250ms");
    }
}
