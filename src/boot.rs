use log::{error, info, warn};
use std::fs;
use std::path::Path;
use std::process;

/// Required directories that will be created if missing
const REQUIRED_DIRS: &[&str] = &[
    "website",
    "website/db",
    "website/static",
    "website/static/css",
    "website/static/images",
    "website/templates",
    "website/templates/admin",
];

/// Admin pages render from these; the panel is unusable without them.
const CRITICAL_TEMPLATES: &[&str] = &[
    "website/templates/admin/base.html.tera",
    "website/templates/admin/login.html.tera",
    "website/templates/admin/dashboard.html.tera",
    "website/templates/admin/form.html.tera",
    "website/templates/admin/confirm_delete.html.tera",
];

const STATIC_ASSETS: &[&str] = &[
    "website/static/css/style.css",
    "website/static/css/admin.css",
    "website/static/images/placeholder.jpg",
];

/// Run all boot checks. Call this before Rocket launches.
/// Creates missing directories, warns about missing assets, and
/// aborts if critical files are absent.
pub fn run() {
    let (warnings, errors) = check(Path::new("."));

    if errors > 0 {
        error!(
            "Boot check FAILED: {} error(s), {} warning(s). Aborting.",
            errors, warnings
        );
        process::exit(1);
    }

    if warnings > 0 {
        warn!(
            "Boot check passed with {} warning(s). Some pages may look broken.",
            warnings
        );
    } else {
        info!("Boot check passed.");
    }
}

/// Returns `(warnings, errors)` for the site rooted at `root`.
fn check(root: &Path) -> (u32, u32) {
    info!("Boot check starting...");

    let mut warnings = 0u32;
    let mut errors = 0u32;

    // ── 1. Directories ─────────────────────────────────
    for dir in REQUIRED_DIRS {
        let path = root.join(dir);
        if !path.exists() {
            match fs::create_dir_all(&path) {
                Ok(_) => info!("  Created directory: {}", dir),
                Err(e) => {
                    error!("  FAILED to create directory {}: {}", dir, e);
                    errors += 1;
                }
            }
        }
    }

    // ── 2. Critical templates ──────────────────────────
    for file in CRITICAL_TEMPLATES {
        if !root.join(file).exists() {
            error!("  MISSING critical template: {}", file);
            errors += 1;
        }
    }

    // ── 3. Static assets ───────────────────────────────
    for file in STATIC_ASSETS {
        if !root.join(file).exists() {
            warn!("  Missing static asset: {}", file);
            warnings += 1;
        }
    }

    // ── 4. Database directory writable ──────────────────
    let db_dir = root.join("website/db");
    if db_dir.exists() {
        let test_file = db_dir.join(".write_test");
        match fs::write(&test_file, "test") {
            Ok(_) => {
                let _ = fs::remove_file(&test_file);
            }
            Err(e) => {
                error!("  Database directory not writable: {}", e);
                errors += 1;
            }
        }
    }

    // ── 5. Rocket.toml exists ───────────────────────────
    if !root.join("Rocket.toml").exists() {
        warn!("  Rocket.toml not found, using default config");
        warnings += 1;
    }

    (warnings, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_root_gets_directories_and_fails_on_templates() {
        let root = std::env::temp_dir().join(format!("valor-boot-{}", uuid::Uuid::new_v4()));
        let (warnings, errors) = check(&root);
        assert!(root.join("website/templates/admin").is_dir());
        assert_eq!(errors as usize, CRITICAL_TEMPLATES.len());
        assert_eq!(warnings as usize, STATIC_ASSETS.len() + 1);
        let _ = fs::remove_dir_all(&root);
    }
}
