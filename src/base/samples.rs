use super::{Config, Grid, ReservoirState, WellControl, WellSpec, WellType, Wells};
use crate::props::{ParamBlackoil, PolymerTables, SolventTables, Table1d};
use crate::StrError;

/// Holds the data of a sample problem
pub struct SampleProblem {
    pub config: Config,
    pub grid: Grid,
    pub wells: Wells,
    pub state: ReservoirState,
}

/// Holds some sample parameters and problems
pub struct Samples;

impl Samples {
    /// Returns sample parameters for a black-oil fluid (consistent but non-physical units)
    pub fn param_blackoil() -> ParamBlackoil {
        ParamBlackoil {
            p_ref: 100.0,
            b_w_ref: 1.0,
            c_w: 1e-5,
            mu_w: 0.5,
            b_o_ref: 0.8,
            c_o: 1e-3,
            mu_o: 2.0,
            swell: 5e-3,
            visc_rs: 0.0,
            b_g_ref: 100.0,
            mu_g: 0.02,
            rho_surface: [1000.0, 800.0, 1.0],
            rs_per_pressure: 0.5,
            rv_per_pressure: 1e-4,
            swc: 0.0,
            sorw: 0.0,
            sgc: 0.0,
            corey_n: [2.0, 2.0, 2.0],
            kr_max: [1.0, 1.0, 1.0],
            pcow_max: 0.0,
            pcgo_max: 0.0,
        }
    }

    /// Returns sample solvent tables with given mixing parameters
    pub fn solvent_tables(omega_viscosity: f64, omega_density: f64) -> Result<SolventTables, StrError> {
        let b_solvent = Table1d::new(&[10.0, 1000.0], &[8.0, 800.0])?;
        let mu_solvent = Table1d::constant(0.05);
        let mut tables = SolventTables::new(b_solvent, mu_solvent, 1.5)?;
        tables.set_mixing_parameters(omega_viscosity, omega_density)?;
        Ok(tables)
    }

    /// Returns sample polymer tables (full mixing, no dead pore volume)
    ///
    /// The viscosity multiplier goes from 1 to 3 over c ∈ [0, 2] and the adsorption isotherm
    /// from 0 to 1e-4 over the same range (rock density 2000, porosity 0.25).
    pub fn polymer_tables() -> Result<PolymerTables, StrError> {
        let visc_mult = Table1d::new(&[0.0, 2.0], &[1.0, 3.0])?;
        let mut tables = PolymerTables::new(visc_mult, 2.0)?;
        let adsorption = Table1d::new(&[0.0, 2.0], &[0.0, 1e-4])?;
        tables.set_adsorption(adsorption, 2000.0, 0.25)?;
        Ok(tables)
    }

    /// Returns a single cell filled with oil and a BHP-controlled gas/solvent injector
    ///
    /// Phases: oil and gas (dead oil, dry gas) with solvent. The caller sets the injected
    /// solvent fraction in the well state.
    pub fn one_cell_solvent_injector(miscible: bool) -> Result<SampleProblem, StrError> {
        let mut config = Config::new();
        config
            .set_phases(false, true, true)?
            .set_solvent(true)?
            .set_miscible(miscible)?;
        let grid = Grid::new(vec![1.0], vec![0.0], Vec::new(), Vec::new())?;
        let wells = Wells::new(
            2,
            1,
            &[WellSpec {
                name: "INJ".to_string(),
                kind: WellType::Injector,
                depth_ref: 0.0,
                comp_frac: vec![0.0, 1.0],
                cells: vec![0],
                wi: vec![1e-3],
                controls: vec![WellControl::Bhp { target: 150.0 }],
            }],
        )?;
        let state = ReservoirState::new(1, 100.0, 300.0, &[1.0, 0.0])?;
        Ok(SampleProblem {
            config,
            grid,
            wells,
            state,
        })
    }

    /// Returns a horizontal line of cells with a water/polymer injector and an oil producer
    ///
    /// Phases: water and dead oil with polymer; no gravity. Both wells run at BHP: the injector
    /// at 150 in the first cell, the producer at 50 in the last cell. The caller sets the
    /// injected polymer concentration in the well state.
    pub fn line_water_oil_polymer(ncell: usize) -> Result<SampleProblem, StrError> {
        let mut config = Config::new();
        config.set_phases(true, true, false)?.set_polymer(true)?;
        let grid = Grid::line(ncell, 10.0, 0.0, 0.5)?;
        let last = ncell - 1;
        let wells = Wells::new(
            2,
            ncell,
            &[
                WellSpec {
                    name: "INJ".to_string(),
                    kind: WellType::Injector,
                    depth_ref: 0.0,
                    comp_frac: vec![1.0, 0.0],
                    cells: vec![0],
                    wi: vec![0.1],
                    controls: vec![WellControl::Bhp { target: 150.0 }],
                },
                WellSpec {
                    name: "PROD".to_string(),
                    kind: WellType::Producer,
                    depth_ref: 0.0,
                    comp_frac: vec![0.0, 1.0],
                    cells: vec![last],
                    wi: vec![0.1],
                    controls: vec![WellControl::Bhp { target: 50.0 }],
                },
            ],
        )?;
        let state = ReservoirState::new(ncell, 100.0, 300.0, &[0.3, 0.7])?;
        Ok(SampleProblem {
            config,
            grid,
            wells,
            state,
        })
    }

    /// Returns a vertical column of cells with an injector at the top and a producer at the bottom
    ///
    /// Phases: water, oil, and gas (live oil) with solvent. The injector runs at a surface rate
    /// with a BHP limit; the producer runs at BHP.
    pub fn column_water_oil_gas_solvent(ncell: usize) -> Result<SampleProblem, StrError> {
        let mut config = Config::new();
        config
            .set_phases(true, true, true)?
            .set_disgas(true)?
            .set_solvent(true)?
            .set_gravity(9.81e-5)?;
        let grid = Grid::line(ncell, 10.0, 1.0, 0.5)?;
        let last = ncell - 1;
        let wells = Wells::new(
            3,
            ncell,
            &[
                WellSpec {
                    name: "INJ".to_string(),
                    kind: WellType::Injector,
                    depth_ref: 0.0,
                    comp_frac: vec![0.0, 0.0, 1.0],
                    cells: vec![0],
                    wi: vec![0.1],
                    controls: vec![
                        WellControl::SurfaceRate {
                            target: 200.0,
                            distr: vec![0.0, 0.0, 1.0],
                        },
                        WellControl::Bhp { target: 160.0 },
                    ],
                },
                WellSpec {
                    name: "PROD".to_string(),
                    kind: WellType::Producer,
                    depth_ref: last as f64,
                    comp_frac: vec![0.0, 1.0, 0.0],
                    cells: vec![last],
                    wi: vec![0.1],
                    controls: vec![WellControl::Bhp { target: 90.0 }],
                },
            ],
        )?;
        let mut state = ReservoirState::new(ncell, 100.0, 300.0, &[0.2, 0.7, 0.1])?;
        for c in 0..ncell {
            state.rs[c] = 50.0;
        }
        Ok(SampleProblem {
            config,
            grid,
            wells,
            state,
        })
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
