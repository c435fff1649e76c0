use std::env;
use tracker_grading::config::grade;
use tracker_grading::diagnostics::{ProjectReport, TrackerReport};
use tracker_grading::grading::grade_project;
use tracker_grading::io::{load_project, write_json_file};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let program = env::args()
        .next()
        .unwrap_or_else(|| "grade_demo".to_string());
    let config = grade::parse_cli(&program)?;

    let mut project = load_project(&config.input)?;
    let report = grade_project(&mut project, &config.options).map_err(|e| e.to_string())?;

    print_project_summary(&report);
    if config.output.summary {
        for tracker in &report.trackers {
            print_tracker_summary(tracker);
        }
    }

    if let Some(path) = &config.output.json_out {
        write_json_file(path, &report)?;
        println!("\nJSON report written to {}", path.display());
    } else {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("Failed to serialize JSON: {e}"))?;
        println!("\nJSON report:\n{json}");
    }
    Ok(())
}

fn print_project_summary(report: &ProjectReport) {
    println!("Grading summary for {}", report.name);
    println!("  trackers: {}", report.tracker_count);
    println!("  piles: {}", report.pile_count);
    println!("  graded piles: {}", report.graded_piles);
    println!("  total cut: {:.3}", report.total_cut);
    println!("  total fill: {:.3}", report.total_fill);
    println!("  violations: {}", report.violation_count);
}

fn print_tracker_summary(tracker: &TrackerReport) {
    let line = tracker
        .target_line
        .as_ref()
        .map(|stage| format!("slope={:.5} b={:.3}", stage.line.slope, stage.line.intercept))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "\nTracker {} ({:?}): {} piles, target line {line}, total {:.3} ms",
        tracker.tracker_id,
        tracker.kind,
        tracker.piles.len(),
        tracker.timings.total_ms
    );
    if let Some(search) = &tracker.line_search {
        println!(
            "  search {:?}: feasible={} accepted={} slope={:.5} b={:.3} cost={}",
            search.mode,
            search.feasible,
            search.accepted,
            search.slope,
            search.intercept,
            search
                .cost
                .map(|c| format!("{c:.4}"))
                .unwrap_or_else(|| "inf".to_string())
        );
    }
    if let Some(terrain) = &tracker.terrain {
        println!(
            "  terrain: pulled={} shifts=({:.4}, {:.4}) corrector iterations={} converged={} excess {:.4} -> {:.4} deg",
            terrain.pulled_piles,
            terrain.shift_before_correction,
            terrain.shift_after_correction,
            terrain.correction.iterations,
            terrain.correction.converged,
            terrain.correction.initial_excess_deg,
            terrain.correction.final_excess_deg
        );
    }
    if let Some(wings) = &tracker.deflection {
        println!(
            "  wings: south={:.3} north={:.3} max break={:.3} deg",
            wings.south_wing_deflection, wings.north_wing_deflection, wings.max_tracker_degree_break
        );
    }
    for pile in tracker.piles.iter().filter(|p| p.cut_fill != 0.0) {
        println!(
            "  pile {:>3}: ground {:.3} -> {:.3} ({:+.3})",
            pile.pile_in_tracker, pile.initial_elevation, pile.final_elevation, pile.cut_fill
        );
    }
    for v in &tracker.violations {
        println!(
            "  violation pile {:>3}: window [{:.3}, {:.3}] below={:.3} above={:.3}",
            v.pile_in_tracker, v.grading_window_min, v.grading_window_max, v.below_by, v.above_by
        );
    }
}
