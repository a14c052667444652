use crate::config::{Config, Profile};
use crate::error::Result;
use crate::ledger::Ledger;
use crate::report::UpdateReport;
use crate::source::SourceRegistry;
use crate::updater::Updater;
use colored::Colorize;
use std::path::Path;

/// Install every addon whose latest version differs from the recorded one
pub fn execute_update<P: AsRef<Path>, Q: AsRef<Path>>(
    config_path: P,
    versions_path: Q,
    registry: &SourceRegistry,
) -> Result<()> {
    println!("{}", "Starting addon update process...".cyan().bold());

    // Step 1: Load and validate configuration
    println!("\n{}", "1. Reading configuration...".yellow());
    let Some(config) = load_config(config_path.as_ref())? else {
        return Ok(());
    };
    print_profiles(&config);

    // Step 2: Load recorded versions
    println!("\n{}", "2. Reading installed versions...".yellow());
    let mut updater = Updater::new(&config, registry, versions_path.as_ref())?;
    println!(
        "{}",
        format!("✓ {} addon(s) recorded", updater.ledger().len()).green()
    );

    // Step 3: Update
    println!("\n{}", "3. Updating addons...".yellow());
    let report = updater.update_addons()?;
    println!("{}", "✓ Update completed".green());

    print_update_report(&report);

    if report.is_empty() {
        println!("\n{}", "✨ All addons are up to date!".green().bold());
    } else {
        println!(
            "\n{}",
            format!("✨ Successfully updated {} addon(s)!", report.total_updates())
                .green()
                .bold()
        );
    }

    Ok(())
}

/// Report available updates without downloading anything
pub fn execute_check<P: AsRef<Path>, Q: AsRef<Path>>(
    config_path: P,
    versions_path: Q,
    registry: &SourceRegistry,
) -> Result<()> {
    println!("{}", "Checking for available updates...".cyan().bold());

    println!("\n{}", "1. Reading configuration...".yellow());
    let Some(config) = load_config(config_path.as_ref())? else {
        return Ok(());
    };
    print_profiles(&config);

    println!("\n{}", "2. Reading installed versions...".yellow());
    let mut updater = Updater::new(&config, registry, versions_path.as_ref())?;
    println!(
        "{}",
        format!("✓ {} addon(s) recorded", updater.ledger().len()).green()
    );

    println!("\n{}", "3. Checking for available updates...".yellow());
    let report = updater.check_addons()?;
    println!("{}", "✓ Check completed".green());

    print_available_updates(&report);

    Ok(())
}

/// Print the recorded versions of both profiles
pub fn execute_list<P: AsRef<Path>>(versions_path: P) -> Result<()> {
    let versions_path = versions_path.as_ref();
    println!("{}", "Listing installed addons...".cyan().bold());

    println!("\n{}", "1. Reading installed versions...".yellow());
    let ledger = Ledger::load(versions_path)?;
    println!("{}", "✓ Versions loaded".green());

    if ledger.is_empty() {
        println!("\n{}", "No addons have been installed yet".yellow());
        return Ok(());
    }

    println!("\n{}", "📦 Installed addons:".cyan().bold());
    for profile in Profile::UPDATE_ORDER {
        println!("\n{}", format!("{}:", profile).yellow().bold());
        let mut count = 0;
        for (addon_url, version) in ledger.entries(profile) {
            println!("  {} {}", addon_url.cyan(), display_version(version));
            count += 1;
        }
        if count == 0 {
            println!("  {}", "(none)".dimmed());
        }
    }

    println!("\n{}", "Summary:".cyan().bold());
    println!("  {} addon(s)", ledger.len().to_string().yellow());

    Ok(())
}

/// Returns `None` after writing a fresh config file for the user to fill in.
fn load_config(config_path: &Path) -> Result<Option<Config>> {
    if !config_path.exists() {
        Config::create_default(config_path)?;
        println!(
            "{}",
            format!(
                "No configuration found, created {}. Add your addon URLs and run again.",
                config_path.display()
            )
            .yellow()
        );
        return Ok(None);
    }

    let config = Config::load(config_path)?.validate()?;
    println!("{}", "✓ Configuration is valid".green());
    Ok(Some(config))
}

fn print_profiles(config: &Config) {
    for profile in Profile::UPDATE_ORDER {
        let section = config.profile(profile);
        if section.addons.is_empty() {
            continue;
        }
        println!(
            "   • {} {} addon(s) in {}",
            profile.to_string().bright_cyan(),
            section.addons.len(),
            section.path.dimmed()
        );
    }
    if config.total_addons() == 0 {
        println!("   {}", "No addons configured".dimmed());
    }
}

fn display_version(version: &str) -> String {
    if version.is_empty() {
        "(no version)".dimmed().to_string()
    } else {
        version.green().to_string()
    }
}

fn print_update_report(report: &UpdateReport) {
    if report.is_empty() {
        println!("\n{}", "No updates were found".yellow());
        return;
    }

    println!("\n{}", "Update Summary:".cyan().bold());
    println!(
        "  {} updated, {} already up to date",
        report.total_updates().to_string().green(),
        report.up_to_date
    );
    print_updates(report);
}

fn print_available_updates(report: &UpdateReport) {
    if report.is_empty() {
        println!("\n{}", "✨ All addons are up to date!".green().bold());
        return;
    }

    println!("\n{}", "📦 Available Updates:".cyan().bold());
    println!(
        "Found {} update(s), {} addon(s) up to date",
        report.total_updates(),
        report.up_to_date
    );
    print_updates(report);

    println!("\n{}", "To apply these updates, run:".dimmed());
    println!("  {}", "wow-addon-updater update".cyan());
}

fn print_updates(report: &UpdateReport) {
    for profile in Profile::UPDATE_ORDER {
        let mut updates = report.updates_for(profile).peekable();
        if updates.peek().is_none() {
            continue;
        }
        println!("\n{}:", profile.to_string().cyan());
        for update in updates {
            let old = update.old_version.as_deref().unwrap_or("not installed");
            println!(
                "  {} {} → {}",
                update.addon_url,
                old.red(),
                display_version(&update.new_version)
            );
        }
    }
}
