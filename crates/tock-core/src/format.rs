//! Display formatting for elapsed and remaining durations.

/// Renders milliseconds as `MM:SS.CC`. Minutes grow past 99 without wrapping.
pub fn stopwatch(ms: u64) -> String {
    let total_seconds = ms / 1000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    let centis = (ms % 1000) / 10;
    format!("{minutes:02}:{seconds:02}.{centis:02}")
}

/// Renders milliseconds as `HH:MM:SS`, rounding partial seconds down.
pub fn countdown(ms: u64) -> String {
    let total_seconds = ms / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
