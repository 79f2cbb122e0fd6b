use pmres::prelude::*;
use pmres::StrError;
use russell_lab::approx_eq;
use russell_sparse::Genie;

#[test]
fn test_solvent_column_1d() -> Result<(), StrError> {
    // vertical column: rate-controlled solvent injector at the top; BHP producer at the bottom
    let ncell = 5;
    let sample = Samples::column_water_oil_gas_solvent(ncell)?;
    let pu = PhaseUsage::new(true, true, true)?;
    let fluid = BlackoilFluid::new(pu, Samples::param_blackoil())?;
    let rock = RockCompressibility::new(100.0, 1e-5)?;
    let tables = Samples::solvent_tables(2.0 / 3.0, 2.0 / 3.0)?;
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
    for _ in 0..3 {
        model.step(0.1, &mut x, &mut xw, &mut solver)?;
    }

    // check
    println!("pressure = {:?}", x.pressure.as_data());
    println!("solvent saturation = {:?}", x.solvent_saturation.as_data());
    for c in 0..ncell {
        let sum = x.sat(c, 0) + x.sat(c, 1) + x.sat(c, 2) + x.solvent_saturation[c];
        approx_eq(sum, 1.0, 1e-12);
        assert!(x.solvent_saturation[c] >= 0.0);
        assert!(x.pressure[c].is_finite() && x.pressure[c] > 0.0);
    }
    assert!(x.solvent_saturation[0] > 0.0);
    // the producer keeps its only control
    assert_eq!(xw.current_controls[1], 0);
    approx_eq(xw.bhp[1], 90.0, 1e-6);
    Ok(())
}
