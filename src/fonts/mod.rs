//! Font discovery for report rendering.
//!
//! The renderer prefers a bundled Roboto family and falls back to the Liberation Sans or DejaVu
//! Sans families shipped by most Linux distributions (and available as a layer on serverless
//! runtimes).

use std::env;
use std::path::{Path, PathBuf};

use genpdf::fonts::{self, FontData, FontFamily};
use log::{debug, warn};

use crate::error::{ReportError, Result};

/// Name of the bundled font family.
pub const DEFAULT_FONT_FAMILY_NAME: &str = "Roboto";

/// Overrides the bundled font directory.
pub const FONTS_DIR_ENV: &str = "REPORT_FONTS_DIR";

/// Overrides the directory searched for the system fallback family.
pub const SYSTEM_FONTS_DIR_ENV: &str = "REPORT_SYSTEM_FONTS_DIR";

const FONT_FILES: &[&str] = &[
    "Roboto-Regular.ttf",
    "Roboto-Bold.ttf",
    "Roboto-Italic.ttf",
    "Roboto-BoldItalic.ttf",
];

/// A system font family: display name, regular/bold/italic/bold-italic files, and the
/// directories it is usually installed in.
struct SystemFamily {
    name: &'static str,
    files: [&'static str; 4],
    directories: &'static [&'static str],
}

const SYSTEM_FAMILIES: &[SystemFamily] = &[
    SystemFamily {
        name: "LiberationSans",
        files: [
            "LiberationSans-Regular.ttf",
            "LiberationSans-Bold.ttf",
            "LiberationSans-Italic.ttf",
            "LiberationSans-BoldItalic.ttf",
        ],
        directories: &[
            "/usr/share/fonts/truetype/liberation",
            "/usr/share/fonts/liberation-sans",
            "/usr/share/fonts/liberation",
            "/opt/fonts",
        ],
    },
    SystemFamily {
        name: "DejaVuSans",
        files: [
            "DejaVuSans.ttf",
            "DejaVuSans-Bold.ttf",
            "DejaVuSans-Oblique.ttf",
            "DejaVuSans-BoldOblique.ttf",
        ],
        directories: &[
            "/usr/share/fonts/truetype/dejavu",
            "/usr/share/fonts/dejavu-sans-fonts",
            "/usr/share/fonts/dejavu",
            "/opt/fonts",
        ],
    },
];

fn env_path(var: &str) -> Option<PathBuf> {
    env::var_os(var).and_then(|value| {
        let path = PathBuf::from(value);
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    })
}

fn push_unique(candidates: &mut Vec<PathBuf>, candidate: PathBuf) {
    if !candidates.iter().any(|existing| existing == &candidate) {
        candidates.push(candidate);
    }
}

fn font_directory_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(path) = env_path(FONTS_DIR_ENV) {
        candidates.push(path);
    }

    if let Ok(current_exe) = env::current_exe() {
        if let Some(bin_dir) = current_exe.parent() {
            push_unique(&mut candidates, bin_dir.join("assets/fonts"));
        }
    }

    push_unique(
        &mut candidates,
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts"),
    );

    candidates
}

fn missing_files(path: &Path, files: &[&str]) -> Vec<String> {
    files
        .iter()
        .filter(|name| !path.join(name).is_file())
        .map(|name| name.to_string())
        .collect()
}

fn resolve_directory(
    candidates: Vec<PathBuf>,
    files: &[&str],
) -> std::result::Result<PathBuf, String> {
    let mut attempts = Vec::new();

    for candidate in candidates {
        if !candidate.is_dir() {
            attempts.push(format!("{} (directory missing)", candidate.display()));
            continue;
        }
        let missing = missing_files(&candidate, files);
        if missing.is_empty() {
            return Ok(candidate);
        }
        attempts.push(format!(
            "{} (missing files [{}])",
            candidate.display(),
            missing.join(", ")
        ));
    }

    if attempts.is_empty() {
        Err("no search paths were available".to_string())
    } else {
        Err(attempts.join(", "))
    }
}

fn load_family(directory: &Path, name: &str) -> Result<FontFamily<FontData>> {
    fonts::from_files(directory, name, None).map_err(|err| {
        ReportError::render(format!(
            "failed to load font family '{}' from {}: {}",
            name,
            directory.display(),
            err
        ))
    })
}

fn load_system_family(
    directory: &Path,
    family: &SystemFamily,
) -> std::result::Result<FontFamily<FontData>, String> {
    let load = |file: &str| {
        FontData::load(directory.join(file), None)
            .map_err(|err| format!("failed to load {}: {}", directory.join(file).display(), err))
    };
    let [regular, bold, italic, bold_italic] = family.files;
    Ok(FontFamily {
        regular: load(regular)?,
        bold: load(bold)?,
        italic: load(italic)?,
        bold_italic: load(bold_italic)?,
    })
}

fn system_fallback_family() -> std::result::Result<(&'static str, FontFamily<FontData>), String> {
    let mut attempts = Vec::new();

    for family in SYSTEM_FAMILIES {
        let mut candidates: Vec<PathBuf> = env_path(SYSTEM_FONTS_DIR_ENV).into_iter().collect();
        for directory in family.directories {
            push_unique(&mut candidates, PathBuf::from(directory));
        }

        let loaded = resolve_directory(candidates, &family.files)
            .and_then(|directory| load_system_family(&directory, family));
        match loaded {
            Ok(fonts) => return Ok((family.name, fonts)),
            Err(err) => attempts.push(format!("{}: {}", family.name, err)),
        }
    }

    Err(attempts.join("; "))
}

/// Returns the bundled Roboto family, or the system Liberation Sans family when the bundled
/// fonts cannot be found.
pub fn default_font_family() -> Result<FontFamily<FontData>> {
    let bundled = match resolve_directory(font_directory_candidates(), FONT_FILES) {
        Ok(directory) => {
            debug!("loading bundled fonts from {}", directory.display());
            return load_family(&directory, DEFAULT_FONT_FAMILY_NAME);
        }
        Err(attempts) => attempts,
    };

    match system_fallback_family() {
        Ok((name, family)) => {
            warn!("Bundled fonts unavailable ({bundled}); falling back to system '{name}' family.");
            Ok(family)
        }
        Err(fallback) => Err(ReportError::render(format!(
            "no usable fonts: bundled fonts unavailable (checked {bundled}); \
             system fallback unavailable (checked {fallback}). \
             Copy the Roboto family to assets/fonts or set {FONTS_DIR_ENV}."
        ))),
    }
}

/// Indicates whether a font family for rendering can be found on this machine.
pub fn default_fonts_available() -> bool {
    resolve_directory(font_directory_candidates(), FONT_FILES).is_ok()
        || system_fallback_family().is_ok()
}
