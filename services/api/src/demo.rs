use crate::infra::{build_portal, AppPortal};
use clap::Args;
use nagrik_neeti::config::AppConfig;
use nagrik_neeti::error::AppError;
use nagrik_neeti::format::{format_percentage, format_rupees};
use nagrik_neeti::portal::Dashboard;
use nagrik_neeti::seed::load_demo_data;

#[derive(Args, Debug, Default)]
pub(crate) struct SeedArgs {
    /// Print a side-by-side comparison of the first two seeded candidates as CSV
    #[arg(long)]
    pub(crate) compare: bool,
}

pub(crate) async fn run_seed(args: SeedArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let (store, portal) = build_portal(&config.backend);

    let summary = load_demo_data(store).await?;
    println!(
        "Loaded {} candidates, {} promises and {} feedback entries",
        summary.candidate_ids.len(),
        summary.promises,
        summary.feedback
    );

    let dashboard = portal.dashboard().await?;
    render_dashboard(&dashboard);

    if args.compare {
        if let [left, right, ..] = summary.candidate_ids.as_slice() {
            print_comparison(&portal, left, right).await?;
        }
    }
    Ok(())
}

fn render_dashboard(dashboard: &Dashboard) {
    let overview = &dashboard.overview;
    println!("\nDashboard overview");
    println!(
        "- {} candidates | {} promises | {} average fulfillment",
        overview.total_candidates,
        overview.total_promises,
        format_percentage(overview.average_fulfillment as f64, 0)
    );
    println!(
        "- Funds allocated {} | utilized {}",
        format_rupees(overview.total_funds_allocated as f64),
        format_rupees(overview.total_funds_utilized as f64)
    );

    println!("Top performers:");
    for (rank, entry) in dashboard.top_performers.iter().enumerate() {
        println!(
            "  {}. {} ({}, {}) {}",
            rank + 1,
            entry.name,
            entry.party,
            entry.constituency,
            format_percentage(entry.fulfillment as f64, 0)
        );
    }

    println!("Fund utilization:");
    for row in &dashboard.fund_chart {
        println!(
            "  - {}: {} of {} ({}, {:?})",
            row.name,
            format_rupees(row.utilized as f64),
            format_rupees(row.allocated as f64),
            format_percentage(row.utilization as f64, 0),
            row.health
        );
    }
}

async fn print_comparison(portal: &AppPortal, left: &str, right: &str) -> Result<(), AppError> {
    let comparison = portal.compare(left, right).await?;
    println!("\n{}", comparison.file_name());
    print!("{}", comparison.to_csv()?);
    Ok(())
}
