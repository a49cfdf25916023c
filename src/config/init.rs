use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::config::{get_config_path, Config};
use crate::scoring::{validate_catalog, Catalog, ControlFamily, FamilyCode};

/// Prompt user with a message and return their trimmed input.
fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    std::io::stdout()
        .flush()
        .context("Failed to flush stdout")?;
    let mut input = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read input")?;
    Ok(input.trim().to_string())
}

/// Prompt user with a message and a default value. Returns default if input is empty.
fn prompt_with_default(message: &str, default: &str) -> Result<String> {
    let input = prompt(&format!("{} [{}]: ", message, default))?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

/// Prompt user with a yes/no question. Returns bool based on input and default.
pub fn prompt_yes_no(message: &str, default_yes: bool) -> Result<bool> {
    let hint = if default_yes { "Y/n" } else { "y/N" };
    let input = prompt(&format!("{} [{}]: ", message, hint))?;
    Ok(parse_yes_no(&input, default_yes))
}

fn parse_yes_no(input: &str, default_yes: bool) -> bool {
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        default_yes
    } else {
        input == "y" || input == "yes"
    }
}

/// Parse a family weight typed at the prompt.
fn parse_weight(s: &str) -> Result<Decimal, String> {
    let weight: Decimal = s.trim().parse().map_err(|_| format!("'{}' is not a number", s))?;
    if weight <= Decimal::ZERO {
        return Err("weight must be positive".to_string());
    }
    Ok(weight)
}

/// Ask for custom families until the user stops.
fn prompt_families() -> Result<Vec<ControlFamily>> {
    let mut families: Vec<ControlFamily> = Vec::new();
    loop {
        let code = loop {
            let c = prompt("  Family code (e.g., 'AC'): ")?;
            match FamilyCode::parse(&c) {
                Ok(code) if families.iter().any(|f| f.code == code) => {
                    println!("  Family {} is already defined.", code)
                }
                Ok(code) => break code,
                Err(e) => println!("  Invalid: {}. Try again.", e),
            }
        };
        let name = loop {
            let n = prompt("  Family name: ")?;
            if !n.is_empty() {
                break n;
            }
            println!("  Family name is required.");
        };
        let weight = loop {
            let w = prompt("  Weight (e.g., '0.12'): ")?;
            match parse_weight(&w) {
                Ok(weight) => break weight,
                Err(e) => println!("  Invalid: {}. Try again.", e),
            }
        };
        families.push(ControlFamily { code, name, weight });

        if !prompt_yes_no("  Add another family?", true)? {
            break;
        }
    }
    Ok(families)
}

/// Run the interactive init wizard to create a config file.
///
/// If `default_path` is Some, uses that as the suggested config file path.
pub fn run_init_wizard(default_path: Option<PathBuf>) -> Result<()> {
    println!();
    println!("Control Score Configuration Wizard");
    println!("==================================");
    println!();

    // 1. Catalog
    println!("Each control family has a weight. The overall score is the weighted");
    println!("average of the families you have assessed.");
    let use_default = prompt_yes_no("Use the NIST SP 800-53 catalog (20 families)?", true)?;

    let catalog = if use_default {
        None
    } else {
        println!();
        println!("Define your families. Weights are relative and do not need to sum to 1.0.");
        let families = prompt_families()?;
        let catalog = Catalog { families };
        if let Err(errors) = validate_catalog(&catalog) {
            for error in errors {
                println!("  - {}", error);
            }
            anyhow::bail!("Catalog is invalid, nothing written");
        }
        Some(catalog)
    };

    // 2. Config path
    let default_config_path = default_path.unwrap_or_else(get_config_path);
    println!();
    let path_str = prompt_with_default(
        "Where should the config be saved?",
        &default_config_path.display().to_string(),
    )?;
    let config_path = PathBuf::from(&path_str);

    if config_path.exists() {
        let overwrite = prompt_yes_no(
            &format!(
                "Config already exists at {}. Overwrite?",
                config_path.display()
            ),
            false,
        )?;
        if !overwrite {
            println!("Aborted.");
            return Ok(());
        }
    }

    // 3. Write config
    let config = Config {
        catalog,
        session_path: None,
    };
    write_config(&config_path, &config)?;

    println!();
    println!("Config written to {}", config_path.display());
    println!("Run `control-score add <FAMILY> <CONTROL_ID> ...` to record an assessment.");

    Ok(())
}

/// Serialize a config to YAML, creating parent directories as needed.
pub fn write_config(path: &std::path::Path, config: &Config) -> Result<()> {
    let yaml = serde_saphyr::to_string(config)
        .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;

    crate::config::ensure_parent_dir(path)?;

    std::fs::write(path, &yaml)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    tracing::info!(path = %path.display(), "wrote config");
    Ok(())
}
