use pmres::prelude::*;
use pmres::StrError;
use russell_sparse::Genie;
use simplelog::{ColorChoice, LevelFilter, TermLogger, TerminalMode};
use structopt::StructOpt;

/// Command line options
#[derive(StructOpt, Debug)]
#[structopt(
    name = "pmres_solvent_1d",
    about = "Runs a vertical column with solvent injection at the top and production at the bottom"
)]
struct Options {
    /// Number of cells
    #[structopt(long, default_value = "10")]
    ncell: usize,

    /// Number of time steps
    #[structopt(long, default_value = "10")]
    nstep: usize,

    /// Time step size
    #[structopt(long, default_value = "1.0")]
    dt: f64,

    /// Activates the Todd-Longstaff miscible model
    #[structopt(long)]
    miscible: bool,

    /// Shows the Newton iterations
    #[structopt(short, long)]
    verbose: bool,
}

fn main() -> Result<(), StrError> {
    // parse options
    let options = Options::from_args();
    let level = if options.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    TermLogger::init(
        level,
        simplelog::Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .map_err(|_| "cannot initialize the logger")?;

    // input data
    let mut sample = Samples::column_water_oil_gas_solvent(options.ncell)?;
    sample.config.set_miscible(options.miscible)?;
    let pu = PhaseUsage::new(sample.config.water, sample.config.oil, sample.config.gas)?;
    let fluid = BlackoilFluid::new(pu, Samples::param_blackoil())?;
    let rock = RockCompressibility::new(100.0, 1e-5)?;
    let tables = Samples::solvent_tables(2.0 / 3.0, 2.0 / 3.0)?;
    let comm = SerialCommunicator;

    // model and states
    let mut model = BlackoilModel::new(
        &sample.config,
        &sample.grid,
        &sample.wells,
        &fluid,
        &rock,
        &comm,
        Some(ExtraProps::Solvent(&tables)),
    )?;
    let mut x = sample.state.clone();
    let mut xw = WellState::new(&sample.wells, &x)?;
    xw.set_solvent_fraction(&sample.wells, 0, 1.0)?;
    let mut solver = DirectSolver::new(Genie::Umfpack);

    // run
    let mut t = 0.0;
    for _ in 0..options.nstep {
        let n_iterations = model.step(options.dt, &mut x, &mut xw, &mut solver)?;
        t += options.dt;
        log::info!(
            "t = {:>8.3}: {:>2} iterations, bhp = {:?}, control = {:?}",
            t,
            n_iterations,
            xw.bhp.as_data(),
            xw.current_controls
        );
    }

    // results
    let thin_line = format!("{:─^1$}", "", 60);
    println!("{}", thin_line);
    println!("{:>6}{:>12}{:>12}{:>12}{:>12}", "cell", "pressure", "sw", "so", "ss");
    for c in 0..x.ncell() {
        println!(
            "{:>6}{:>12.4}{:>12.4}{:>12.4}{:>12.4}",
            c,
            x.pressure[c],
            x.sat(c, 0),
            x.sat(c, 1),
            x.solvent_saturation[c]
        );
    }
    println!("{}", thin_line);
    Ok(())
}
