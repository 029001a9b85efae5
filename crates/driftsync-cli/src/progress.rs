//! Transfer progress display.

use indicatif::{ProgressBar, ProgressStyle};

/// Byte-granular progress bar for one transfer
pub struct TransferProgress {
    bar: ProgressBar,
}

impl TransferProgress {
    /// Create a progress bar for `total_bytes` of payload
    #[must_use]
    pub fn new(total_bytes: u64, filename: &str) -> Self {
        let bar = ProgressBar::new(total_bytes);

        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg}\n[{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")
                .expect("Invalid progress bar template")
                .progress_chars("=>-"),
        );

        bar.set_message(format!("Sending: {filename}"));

        Self { bar }
    }

    /// Move the bar to `transferred_bytes`
    pub fn update(&self, transferred_bytes: u64) {
        self.bar.set_position(transferred_bytes);
    }

    /// Adjust the total once the receiver's reply fixes the real amount
    /// to send (a resume pushes only the missing chunks)
    pub fn set_length(&self, total_bytes: u64) {
        self.bar.set_length(total_bytes);
    }

    /// Finish with a message
    pub fn finish_with_message(&self, msg: String) {
        self.bar.finish_with_message(msg);
    }

    /// Abandon the bar after a failure
    pub fn abandon(&self) {
        self.bar.abandon();
    }
}

/// Format bytes in human-readable form
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    format!("{size:.2} {}", UNITS[unit_idx])
}

/// Format a transfer rate in bytes per second
#[must_use]
pub fn format_speed(bytes_per_sec: f64) -> String {
    format!("{}/s", format_bytes(bytes_per_sec as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0.00 B");
        assert_eq!(format_bytes(1024), "1.00 KiB");
        assert_eq!(format_bytes(4 * 1024 * 1024), "4.00 MiB");
        assert_eq!(format_bytes(1024_u64.pow(3)), "1.00 GiB");
    }

    #[test]
    fn test_format_speed() {
        assert_eq!(format_speed(2048.0), "2.00 KiB/s");
    }
}
