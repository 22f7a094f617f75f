use department_financials_sim::*;
use std::path::PathBuf;

fn main() {
    let output_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data"));

    let config = SimulationConfig::default();

    println!("📊 Synthetic Department Financials\n");
    println!("  Seed:        {}", config.seed);
    println!("  Range:       {} to {}", config.start_month, config.end_month);
    println!(
        "  Departments: {}",
        config
            .departments
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let output = match simulate_financials(&config) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        }
    };

    println!("\n🔧 Sampled parameters:");
    for (department, p) in &output.parameters {
        println!(
            "  {:<11} base {:>10.2}  growth {:>7.4}  amplitude {:.3}  noise {:.3}  shock p {:.3}",
            department.to_string(),
            p.base_level,
            p.growth_rate,
            p.season_amplitude,
            p.noise_sigma,
            p.shock_probability
        );
    }

    println!("\n📅 Yearly summary:");
    for year in &output.yearly {
        println!(
            "  {:<11} {}  budget ${:>14.2}  actual ${:>14.2}  variance {:>7.2}%  shocks {}",
            year.department.to_string(),
            year.period,
            year.budget,
            year.actual,
            year.pct_variance.unwrap_or(0.0) * 100.0,
            year.shock_count
        );
    }

    if !output.warnings.is_empty() {
        println!("\n⚠️  {} data quality warnings", output.warnings.len());
    }

    match write_outputs(&output, &output_dir) {
        Ok(paths) => {
            println!("\n✅ Wrote:");
            for path in paths {
                println!("  {}", path.display());
            }
        }
        Err(e) => {
            eprintln!("❌ Export failed: {}", e);
            std::process::exit(1);
        }
    }
}
