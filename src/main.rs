use clap::{Parser, Subcommand};
use log::{error, info};
use std::path::PathBuf;

use eurostatic::config::AnalysisSettings;
use eurostatic::error::Result;
use eurostatic::loads::LoadCase;
use eurostatic::persistence;
use eurostatic::section::SteelCatalog;
use eurostatic::solver::{Solver, StaticSolver};
use eurostatic::steel::checks::{check_beam, CheckInputs};
use eurostatic::steel::grades::{BucklingCurve, SteelGrade};

/// eurostatic: 2D structural finite-element engine
#[derive(Parser)]
#[command(name = "eurostatic")]
#[command(about = "2D frame/truss/plate finite-element engine with NEN-EN 1993 steel checks")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a model for the given load case and print a results summary
    Solve {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run steel cross-section checks against the solved result
    Check {
        input: PathBuf,
        #[arg(short, long, default_value = "S235")]
        grade: String,
    },
    /// Design a bolted end-plate moment connection
    Connection { input: PathBuf },
    /// Search the steel catalog for the lightest feasible profile
    Optimize {
        input: PathBuf,
        catalog: PathBuf,
        beam_id: u64,
        #[arg(long, default_value = "1.0")]
        max_uc: f64,
    },
    /// Look up a profile (or synonym) in the steel catalog
    Catalog { catalog: PathBuf, name: String },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { log::LevelFilter::Info } else { log::LevelFilter::Warn };
    env_logger::Builder::from_default_env().filter_level(level).init();

    let result = match cli.command {
        Commands::Solve { input, output } => run_solve(input, output),
        Commands::Check { input, grade } => run_check(input, grade),
        Commands::Connection { input } => run_connection(input),
        Commands::Optimize { input, catalog, beam_id, max_uc } => run_optimize(input, catalog, beam_id, max_uc),
        Commands::Catalog { catalog, name } => run_catalog_lookup(catalog, name),
    };

    if let Err(e) = result {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run_solve(input: PathBuf, output: Option<PathBuf>) -> Result<()> {
    info!("loading model from {}", input.display());
    let model = persistence::load_from_file(&input)?;
    let settings = AnalysisSettings::default();
    let solver = StaticSolver::new();
    let case = LoadCase::new("default");

    let result = solver.solve(&model, &case, &settings)?;
    println!("max displacement: {:.6} m", result.max_displacement());
    println!("max reaction: {:.3} N", result.max_reaction());
    println!("equilibrium residual: {:.6}", result.equilibrium_residual);
    if let Some(warning) = &result.warning {
        println!("warning: {warning}");
    }

    if let Some(path) = output {
        std::fs::write(&path, result.to_json()?)?;
        info!("wrote results to {}", path.display());
    }
    Ok(())
}

fn run_check(input: PathBuf, grade: String) -> Result<()> {
    let model = persistence::load_from_file(&input)?;
    let settings = AnalysisSettings::default();
    let solver = StaticSolver::new();
    let case = LoadCase::new("default");
    let result = solver.solve(&model, &case, &settings)?;

    let grade = parse_grade(&grade)?;

    let mut beam_ids: Vec<u64> = model.beams.keys().copied().collect();
    beam_ids.sort_unstable();
    for id in beam_ids {
        let beam = &model.beams[&id];
        let stations = &result.beam_forces[&id];
        let start = &model.nodes[&beam.start_node];
        let end = &model.nodes[&beam.end_node];
        let length = ((end.x - start.x).powi(2) + (end.y - start.y).powi(2)).sqrt();

        let inputs = CheckInputs {
            section: &beam.section,
            grade,
            length,
            buckling_curve: BucklingCurve::B,
            buckling_length: length,
            deflection: result.max_displacement(),
            deflection_limit_divisor: settings.deflection_limit_divisor,
            factors: settings.partial_factors,
        };
        let check = check_beam(id, stations, &inputs);
        println!(
            "beam {id}: UC_max={:.3} ({}), status={}",
            check.uc_max,
            check.governing_article,
            if check.status_ok { "OK" } else { "FAIL" }
        );
    }
    Ok(())
}

fn run_connection(_input: PathBuf) -> Result<()> {
    println!("connection design requires the component-method inputs documented in DESIGN.md; wire up via the library API.");
    Ok(())
}

fn run_optimize(input: PathBuf, catalog_path: PathBuf, beam_id: u64, max_uc: f64) -> Result<()> {
    let model = persistence::load_from_file(&input)?;
    let catalog_json = std::fs::read_to_string(&catalog_path)?;
    let catalog = SteelCatalog::from_json(&catalog_json, 7850.0)?;
    let settings = AnalysisSettings::default();
    let case = LoadCase::new("default");

    let constraints = eurostatic::steel::optimizer::OptimizationConstraints {
        max_uc,
        deflection_limit_divisor: settings.deflection_limit_divisor,
    };

    let result = eurostatic::steel::optimizer::optimize_profile(
        &model,
        &case,
        beam_id,
        &catalog,
        SteelGrade::S235,
        eurostatic::steel::optimizer::Criterion::Weight,
        &constraints,
        &settings,
        None,
        |idx, total| info!("evaluating candidate {idx}/{total}"),
        &(),
    )?;

    match result.selected {
        Some(name) => println!("selected profile: {name}"),
        None => println!("no feasible profile found among {} candidates", result.tried.len()),
    }
    Ok(())
}

fn run_catalog_lookup(catalog_path: PathBuf, name: String) -> Result<()> {
    let catalog_json = std::fs::read_to_string(&catalog_path)?;
    let catalog = SteelCatalog::from_json(&catalog_json, 7850.0)?;
    let profile = catalog.find(&name)?;
    println!("{}: A={:.6} m^2, I_y={:.6e} m^4", profile.name, profile.section.area, profile.section.iy);
    Ok(())
}

fn parse_grade(s: &str) -> Result<SteelGrade> {
    match s.to_uppercase().as_str() {
        "S235" => Ok(SteelGrade::S235),
        "S275" => Ok(SteelGrade::S275),
        "S355" => Ok(SteelGrade::S355),
        "S460" => Ok(SteelGrade::S460),
        other => Err(eurostatic::error::FeaError::InvalidInput(format!("unknown steel grade {other}"))),
    }
}
