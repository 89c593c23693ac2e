use lightbox_core::GalleryEntry;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing for the CLI.
///
/// Logs go to stderr so stdout stays machine-readable. `LOG_FORMAT=json`
/// switches to JSON lines.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Human-readable byte size.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

/// Render gallery entries as a fixed-width table.
pub fn render_gallery_table(entries: &[GalleryEntry]) -> String {
    if entries.is_empty() {
        return "No uploads found.\n".to_string();
    }

    let mut out = format!(
        "{:<44} {:<30} {:<5} {:>10} {:>20}\n",
        "Key", "Filename", "RAW", "Size", "Last Modified"
    );
    out.push_str(&"-".repeat(113));
    out.push('\n');

    for entry in entries {
        out.push_str(&format!(
            "{:<44} {:<30} {:<5} {:>10} {:>20}\n",
            truncate_string(&entry.key, 44),
            truncate_string(&entry.filename, 30),
            if entry.is_raw { "yes" } else { "no" },
            format_size(entry.size),
            entry.last_modified.format("%Y-%m-%d %H:%M:%S")
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use lightbox_core::Folder;

    #[test]
    fn truncate_string_short() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("", 5), "");
    }

    #[test]
    fn truncate_string_long() {
        assert_eq!(truncate_string("hello world", 8), "hello...");
        assert_eq!(truncate_string("abc", 2), "...");
    }

    #[test]
    fn truncate_string_multibyte() {
        assert_eq!(truncate_string("ééééééé", 5), "éé...");
    }

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(45 * 1024 * 1024), "45.0 MB");
    }

    #[test]
    fn gallery_table_rows() {
        let entry = GalleryEntry {
            key: "raw/20240102_030405_a1b2c3d4e5f6.cr2".to_string(),
            filename: "IMG_001.CR2".to_string(),
            folder: Folder::Raw,
            is_raw: true,
            size: 1024,
            last_modified: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            url: "http://localhost/processed/20240102_030405_a1b2c3d4e5f6.jpg".to_string(),
            thumbnail_url: "http://localhost/thumbnails/20240102_030405_a1b2c3d4e5f6.jpg"
                .to_string(),
            original_url: None,
            raw_original_url: Some(
                "http://localhost/raw/20240102_030405_a1b2c3d4e5f6.cr2".to_string(),
            ),
            has_derivatives: true,
        };

        let table = render_gallery_table(&[entry]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[2].contains("IMG_001.CR2"));
        assert!(lines[2].contains("2024-01-02 03:04:05"));
        assert!(lines[2].contains("1.0 KB"));

        assert_eq!(render_gallery_table(&[]), "No uploads found.\n");
    }
}
