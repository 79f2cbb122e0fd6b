use pmres::prelude::*;
use pmres::StrError;
use russell_lab::{approx_eq, Vector};
use russell_sparse::Genie;

#[test]
fn test_solvent_injection_one_cell_immiscible() -> Result<(), StrError> {
    // single cell filled with oil; the injector runs at BHP and injects pure solvent
    let sample = Samples::one_cell_solvent_injector(false)?;
    let pu = PhaseUsage::new(false, true, true)?;
    let fluid = BlackoilFluid::new(pu, Samples::param_blackoil())?;
    let rock = RockCompressibility::incompressible();
    let tables = Samples::solvent_tables(1.0, 1.0)?;
    let comm = SerialCommunicator;
    let mut model = BlackoilModel::new(
        &sample.config,
        &sample.grid,
        &sample.wells,
        &fluid,
        &rock,
        &comm,
        Some(ExtraProps::Solvent(&tables)),
    )?;

    // states
    let mut x = sample.state.clone();
    let mut xw = WellState::new(&sample.wells, &x)?;
    xw.set_solvent_fraction(&sample.wells, 0, 1.0)?;
    let mut solver = DirectSolver::new(Genie::Umfpack);

    // run
    let (opos, gpos) = (0, 1);
    let mut ss_old = x.solvent_saturation[0];
    let mut so_old = x.sat(0, opos);
    let mut p_old = x.pressure[0];
    for step in 0..3 {
        model.step(1.0, &mut x, &mut xw, &mut solver)?;
        let ss = x.solvent_saturation[0];
        let so = x.sat(0, opos);
        let sg = x.sat(0, gpos);
        println!("step = {}, p = {:.6}, so = {:.6}, sg = {:.3e}, ss = {:.6}", step, x.pressure[0], so, sg, ss);
        assert!(ss > ss_old);
        assert!(so < so_old);
        assert!(ss >= 0.0);
        approx_eq(sg, 0.0, 1e-10);
        approx_eq(so + sg + ss, 1.0, 1e-14);
        approx_eq(ss - ss_old, so_old - so, 1e-9);
        assert!(x.pressure[0] > p_old);
        assert!(x.pressure[0] < 150.0);
        ss_old = ss;
        so_old = so;
        p_old = x.pressure[0];
    }
    Ok(())
}

#[test]
fn test_solvent_injection_one_cell_miscible_without_mixing() -> Result<(), StrError> {
    // ω = 0 keeps the intrinsic viscosities and densities
    let sample = Samples::one_cell_solvent_injector(true)?;
    let pu = PhaseUsage::new(false, true, true)?;
    let fluid = BlackoilFluid::new(pu, Samples::param_blackoil())?;
    let rock = RockCompressibility::incompressible();
    let tables = Samples::solvent_tables(0.0, 0.0)?;
    let comm = SerialCommunicator;
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
    for _ in 0..2 {
        model.step(1.0, &mut x, &mut xw, &mut solver)?;
        let ss = x.solvent_saturation[0];
        let sum = x.sat(0, 0) + x.sat(0, 1) + ss;
        assert!(ss > 0.0);
        approx_eq(sum, 1.0, 1e-14);
    }
    Ok(())
}

#[test]
fn test_solvent_injection_one_cell_fixed_pressure() -> Result<(), StrError> {
    // water (at connate saturation) and oil with incompressible fluids; a rate-controlled
    // solvent injector and a BHP producer share the cell so that the pressure stays at 100
    let mut config = Config::new();
    config.set_phases(true, true, true)?.set_solvent(true)?;
    config.tol_cnv = 1e-10;
    config.tol_wells = 1e-10;
    config.tol_well_control = 1e-10;
    let pore_volume = 1.0;
    let grid = Grid::new(vec![pore_volume], vec![0.0], Vec::new(), Vec::new())?;
    let q_inj = 1.0;
    let wells = Wells::new(
        3,
        1,
        &[
            WellSpec {
                name: "INJ".to_string(),
                kind: WellType::Injector,
                depth_ref: 0.0,
                comp_frac: vec![0.0, 0.0, 1.0],
                cells: vec![0],
                wi: vec![1.0],
                controls: vec![WellControl::SurfaceRate {
                    target: q_inj,
                    distr: vec![0.0, 0.0, 1.0],
                }],
            },
            WellSpec {
                name: "PROD".to_string(),
                kind: WellType::Producer,
                depth_ref: 0.0,
                comp_frac: vec![0.0, 1.0, 0.0],
                cells: vec![0],
                wi: vec![10.0],
                controls: vec![WellControl::Bhp { target: 100.0 }],
            },
        ],
    )?;

    // water is immobile at sw = swc and the solvent is immobile below sgc
    let mut param = Samples::param_blackoil();
    param.c_w = 0.0;
    param.c_o = 0.0;
    param.swc = 0.2;
    param.sgc = 0.1;
    let pu = PhaseUsage::new(true, true, true)?;
    let fluid = BlackoilFluid::new(pu, param)?;
    let rock = RockCompressibility::incompressible();
    let tables = Samples::solvent_tables(1.0, 1.0)?;
    let comm = SerialCommunicator;
    let solvent = Some(ExtraProps::Solvent(&tables));
    let mut model = BlackoilModel::new(&config, &grid, &wells, &fluid, &rock, &comm, solvent)?;

    // states
    let mut x = ReservoirState::new(1, 100.0, 300.0, &[0.2, 0.8, 0.0])?;
    let mut xw = WellState::new(&wells, &x)?;
    xw.set_solvent_fraction(&wells, 0, 1.0)?;
    let mut solver = DirectSolver::new(Genie::Umfpack);

    // single step
    let dt = 1.0;
    model.step(dt, &mut x, &mut xw, &mut solver)?;
    let (p, sw, ss) = (x.pressure[0], x.sat(0, 0), x.solvent_saturation[0]);
    println!("p = {:.8}, sw = {:.8}, ss = {:.8}, qs_inj = {:?}", p, sw, ss, xw.well_rates.as_data());

    // the producer keeps the pressure close to its BHP
    assert!(p > 100.0);
    approx_eq(p, 100.0, 1e-2);

    // the injected reservoir volume fills the pore volume with solvent
    let b_s = tables.b_solvent(&Adb::constant(Vector::from(&[p]))).at(0);
    approx_eq(xw.well_rates[2], q_inj, 1e-8);
    approx_eq(ss, q_inj * dt / (b_s * pore_volume), 1e-8);
    approx_eq(ss, q_inj * dt / (80.0 * pore_volume), 1e-6);
    approx_eq(sw, 0.2, 1e-12);
    approx_eq(x.sat(0, 2), 0.0, 1e-12);
    Ok(())
}
