use log::{error, info, warn};
use std::env;
use std::fs;
use std::path::Path;
use std::process;

use crate::config::CONFIG_FILE;

/// Where Rocket.toml points `template_dir`.
const TEMPLATE_DIR: &str = "templates";

/// Critical template files; the server cannot render without these
const CRITICAL_TEMPLATES: &[&str] = &["templates/dashboard.html.tera"];

/// Run all boot checks. Call this before Rocket launches.
/// Warns about missing optional files and aborts if templates are absent.
pub fn run() {
    info!("Thermoboard boot check starting...");

    let mut warnings = 0u32;
    let mut errors = 0u32;

    // ── 1. Template directory ──────────────────────────
    if !Path::new(TEMPLATE_DIR).is_dir() {
        error!("  MISSING template directory: {}", TEMPLATE_DIR);
        errors += 1;
    }

    // ── 2. Critical templates ──────────────────────────
    for file in CRITICAL_TEMPLATES {
        match fs::metadata(file) {
            Ok(meta) if meta.len() > 0 => {}
            Ok(_) => {
                error!("  Empty critical template: {}", file);
                errors += 1;
            }
            Err(_) => {
                error!("  MISSING critical template: {}", file);
                errors += 1;
            }
        }
    }

    // ── 3. Config file ─────────────────────────────────
    let config_path = env::var("THERMOBOARD_CONFIG").unwrap_or_else(|_| CONFIG_FILE.to_string());
    if !Path::new(&config_path).exists() {
        warn!("  {} not found (defaults and environment only)", config_path);
        warnings += 1;
    }

    // ── 4. Rocket.toml exists ──────────────────────────
    if !Path::new("Rocket.toml").exists() {
        warn!("  Rocket.toml not found (using Rocket defaults)");
        warnings += 1;
    }

    // ── Summary ────────────────────────────────────────
    if errors > 0 {
        error!(
            "Boot check FAILED: {} error(s), {} warning(s). Aborting.",
            errors, warnings
        );
        process::exit(1);
    }

    if warnings > 0 {
        warn!("Boot check passed with {} warning(s).", warnings);
    } else {
        info!("Boot check passed.");
    }
}
