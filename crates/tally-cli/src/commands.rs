use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;

use crate::cli::*;
use crate::scenario::{RunReport, Scenario};

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Run(args) => cmd_run(&args.path, cli.format),
        Command::Check(args) => cmd_check(&args.path, cli.format),
    }
}

fn load(path: &Path) -> anyhow::Result<RunReport> {
    let input = fs::read_to_string(path)
        .with_context(|| format!("reading scenario {}", path.display()))?;
    let scenario = Scenario::from_toml_str(&input)
        .with_context(|| format!("parsing scenario {}", path.display()))?;
    scenario.run()
}

fn cmd_run(path: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let report = load(path)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_report(&report),
    }
    Ok(())
}

fn cmd_check(path: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let report = load(path)?;
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    let failed = report.steps.iter().filter(|s| !s.passed).count();
    if !report.is_success() {
        if format == OutputFormat::Text {
            print_report(&report);
        }
        bail!(
            "{failed} step(s) did not match expectations, {} audit violation(s)",
            report.violations.len()
        );
    }

    if format == OutputFormat::Text {
        println!(
            "{} {} steps, books balanced",
            "✓".green().bold(),
            report.steps.len()
        );
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    for step in &report.steps {
        let mark = if step.passed {
            "✓".green()
        } else {
            "✗".red()
        };
        let detail = match (&step.error_kind, &step.expected_error) {
            (Some(_), Some(_)) => format!("{} (expected)", step.detail).dimmed(),
            (Some(_), None) => step.detail.red(),
            (None, Some(expected)) => format!("{} (expected {expected})", step.detail).red(),
            (None, None) => step.detail.normal(),
        };
        println!("{mark} {:>3} {:<9} {detail}", step.index, step.op.bold());
    }

    println!();
    println!(
        "{:<12} {:>14} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "account".bold(),
        "id",
        "balance",
        "free",
        "pledged",
        "unclaimed",
        "claimed"
    );
    for row in &report.accounts {
        println!(
            "{:<12} {:>14} {:>10} {:>10} {:>10} {:>10} {:>10}",
            row.name.yellow(),
            row.account.cyan(),
            row.balance,
            row.free,
            row.pledged,
            row.unclaimed,
            row.claimed
        );
    }

    let pool = &report.pool;
    println!();
    println!(
        "supply {}  held {}  unissued {}  dust {}  issuances {}",
        pool.total_supply.to_string().bold(),
        pool.held,
        pool.unissued,
        pool.dust,
        pool.issuances
    );
    for issuance in &report.issuances {
        println!(
            "  #{:<3} at {} pool {} allocated {} dust {} over supply {}",
            issuance.index,
            issuance.issued_at,
            issuance.pool_amount,
            issuance.total_allocated,
            issuance.dust,
            issuance.total_supply
        );
    }

    if report.violations.is_empty() {
        println!("{} audit clean", "✓".green());
    } else {
        for violation in &report.violations {
            println!("{} {}", "✗".red().bold(), violation);
        }
    }
}
