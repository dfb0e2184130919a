//! Handlers for the CLI commands.
use crate::cli::RunOpts;
use crate::log;
use crate::model::Model;
use crate::output::{create_output_directory, get_output_dir, write_report};
use crate::settings::{Settings, get_settings_file_path};
use anyhow::{Context, Result, ensure};
use chrono::Local;
use ::log::{info, warn};
use include_dir::{Dir, DirEntry, include_dir};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// The directory containing the bundled demo models.
const DEMOS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/demos");

/// Handle the `run` command.
pub fn handle_run_command(
    model_path: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    // Load program settings, if not provided
    let settings = if let Some(settings) = settings {
        settings
    } else {
        Settings::load().context("Failed to load settings.")?
    };

    let pathbuf: PathBuf;
    let output_path = if let Some(p) = opts.output_dir.as_deref() {
        p
    } else {
        pathbuf = get_output_dir(model_path)?;
        &pathbuf
    };

    let overwritten = create_output_directory(output_path, opts.overwrite || settings.overwrite)
        .with_context(|| {
            format!(
                "Failed to create output directory: {}",
                output_path.display()
            )
        })?;

    log::init(Some(&settings.log_level), Some(output_path))
        .context("Failed to initialise logging.")?;

    let model = Model::from_path(model_path).context("Failed to load model.")?;
    info!("Loaded model from {}", model_path.display());
    info!("Output folder: {}", output_path.display());

    // NB: We have to wait until the logger is initialised to display this warning
    if overwritten {
        warn!("Output folder will be overwritten");
    }

    let start_date = opts
        .start_date
        .unwrap_or_else(|| Local::now().date_naive());
    let report = crate::forecast::run(&model, None, start_date, settings.narrative_timeout())?;
    write_report(output_path, &report)?;
    info!(
        "Forecast complete: peak multiplier {} ({}) on {}",
        report.peak.multiplier, report.peak.severity, report.peak.date
    );

    Ok(())
}

/// Handle the `validate` command.
pub fn handle_validate_command(model_path: &Path, settings: Option<Settings>) -> Result<()> {
    // Load program settings, if not provided
    let settings = if let Some(settings) = settings {
        settings
    } else {
        Settings::load().context("Failed to load settings.")?
    };

    // No log files for the validate command
    log::init(Some(&settings.log_level), None).context("Failed to initialise logging.")?;

    Model::from_path(model_path).context("Failed to validate model.")?;
    info!("Model validation successful!");

    Ok(())
}

/// Handle the `demo list` command.
pub fn handle_demo_list_command() {
    for entry in DEMOS_DIR.dirs() {
        println!("{}", entry.path().display());
    }
}

/// Handle the `demo extract` command.
pub fn handle_demo_extract_command(name: &str, dest: Option<&Path>) -> Result<()> {
    let dest = dest.unwrap_or(Path::new(name));
    extract_demo(name, dest)
}

/// Extract the specified demo model to a new directory
fn extract_demo(name: &str, new_path: &Path) -> Result<()> {
    let sub_dir = DEMOS_DIR.get_dir(name).context("Demo model not found.")?;

    ensure!(
        !new_path.exists(),
        "Destination directory {} already exists",
        new_path.display()
    );

    fs::create_dir(new_path)?;
    for entry in sub_dir.entries() {
        match entry {
            DirEntry::Dir(_) => panic!("Subdirectories in demo models not supported"),
            DirEntry::File(f) => {
                let file_name = f.path().file_name().unwrap();
                let file_path = new_path.join(file_name);
                fs::write(&file_path, f.contents())?;
            }
        }
    }

    Ok(())
}

/// Create the settings file with the default contents, unless it already exists
fn ensure_settings_file_exists(file_path: &Path) -> Result<()> {
    if file_path.is_file() {
        return Ok(());
    }

    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).context("Failed to create settings directory.")?;
    }
    fs::write(file_path, Settings::default_file_contents())
        .context("Failed to write settings file.")?;

    Ok(())
}

/// Handle the `settings init` command.
pub fn handle_settings_init_command() -> Result<()> {
    let file_path = get_settings_file_path();
    ensure_settings_file_exists(&file_path)?;
    println!("{}", file_path.display());

    Ok(())
}

/// Handle the `settings path` command.
pub fn handle_settings_path_command() {
    println!("{}", get_settings_file_path().display());
}

/// Handle the `settings dump-default` command.
pub fn handle_settings_dump_default_command() {
    println!("{}", Settings::default_file_contents());
}

/// Handle the `demo run` command.
pub fn handle_demo_run_command(name: &str, opts: &RunOpts) -> Result<()> {
    let temp_dir = TempDir::new().context("Failed to create temporary directory.")?;
    let model_path = temp_dir.path().join(name);
    extract_demo(name, &model_path)?;
    handle_run_command(&model_path, opts, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_demos_dir_contains_mumbai() {
        assert!(DEMOS_DIR.get_dir("mumbai").is_some());
    }

    #[test]
    fn test_extract_demo() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("mumbai");
        extract_demo("mumbai", &dest).unwrap();
        assert!(dest.join("model.toml").is_file());
        assert!(dest.join("facilities.csv").is_file());

        // A second extraction must not clobber the first
        assert!(extract_demo("mumbai", &dest).is_err());
    }

    #[test]
    fn test_extract_demo_unknown_name() {
        let dir = tempdir().unwrap();
        assert!(extract_demo("atlantis", &dir.path().join("atlantis")).is_err());
    }

    #[test]
    fn test_ensure_settings_file_exists() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("config").join("settings.toml");

        ensure_settings_file_exists(&file_path).unwrap();
        assert_eq!(
            fs::read_to_string(&file_path).unwrap(),
            Settings::default_file_contents()
        );
    }

    #[test]
    fn test_ensure_settings_file_exists_keeps_existing() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("settings.toml");
        fs::write(&file_path, "log_level = \"warn\"\n").unwrap();

        ensure_settings_file_exists(&file_path).unwrap();
        assert_eq!(
            fs::read_to_string(&file_path).unwrap(),
            "log_level = \"warn\"\n"
        );
    }
}
