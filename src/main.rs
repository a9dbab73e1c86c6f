//! semicircle-validate: headless check runner.
//!
//! Runs the built-in suite over the hardware table and the seeded
//! simulations, prints a colored summary, and exits non-zero on failure.

use std::time::Instant;

use colored::Colorize;
use rand::rngs::StdRng;
use rand::SeedableRng;

use semicircle_validate::scenarios;
use semicircle_validate::types::CheckResult;

const SEED: u64 = 42;

fn main() {
    let start = Instant::now();
    let mut rng = StdRng::seed_from_u64(SEED);

    println!("{}", "semicircle-validate".bold());
    println!("  Seed: {SEED}");
    println!("  Shots per hardware point: {}", scenarios::N_SHOTS);
    println!();

    println!("{}", "Running checks...".cyan());

    let results = vec![
        scenarios::hardware_semicircle(),
        scenarios::semicircle_constraint(&mut rng),
        scenarios::optimal_operating_point(&mut rng),
        scenarios::barren_plateau(&mut rng),
    ];

    for result in &results {
        print_result(result);
    }

    let elapsed = start.elapsed();

    println!();
    println!("{}", "=".repeat(60));

    let passed = results.iter().filter(|r| r.is_pass()).count();
    let failed = results.len() - passed;

    if failed == 0 {
        println!(
            "  {} {} passed in {:.2}s",
            "PASS".green(),
            passed.to_string().green(),
            elapsed.as_secs_f64()
        );
    } else {
        println!(
            "  {} {} passed, {} failed in {:.2}s",
            "FAIL".red(),
            passed,
            failed.to_string().red(),
            elapsed.as_secs_f64()
        );
    }

    println!("{}", "=".repeat(60));

    if failed > 0 {
        std::process::exit(1);
    }
}

fn print_result(result: &CheckResult) {
    match result {
        CheckResult::Pass { name, details } => {
            println!("  {} {}", "✓".green(), name);
            println!("      {}", details.dimmed());
        }
        CheckResult::Fail { name, reason } => {
            println!("  {} {}", "✗".red(), name.red());
            println!("      {reason}");
        }
        CheckResult::Error { name, error } => {
            println!("  {} {} (error)", "✗".red(), name.red());
            println!("      {error}");
        }
    }
}
