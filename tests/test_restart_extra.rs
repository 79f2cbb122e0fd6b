use pmres::prelude::*;
use pmres::StrError;

#[test]
fn test_restart_extra() -> Result<(), StrError> {
    // missing field
    let values = RestartValues::new();
    let extra = RestartExtra::read(&values)?;
    assert_eq!(extra.suggested_step, -1.0);

    // round trip through a file
    let mut values = RestartValues::new();
    let extra = RestartExtra { suggested_step: 0.25 };
    extra.write(&mut values);
    let path = format!("{}/test_restart_extra.json", DEFAULT_TEST_DIR);
    values.write_json(&path)?;
    let read = RestartValues::read_json(&path)?;
    assert_eq!(RestartExtra::read(&read)?, extra);

    // the reservoir state goes along with the restart values
    let sample = Samples::column_water_oil_gas_solvent(3)?;
    let path = format!("{}/test_restart_state.json", DEFAULT_TEST_DIR);
    sample.state.write_json(&path)?;
    let state = ReservoirState::read_json(&path)?;
    assert_eq!(state.saturation.as_data(), sample.state.saturation.as_data());
    assert_eq!(state.rs.as_data(), sample.state.rs.as_data());
    assert_eq!(state.hydrocarbon_state, sample.state.hydrocarbon_state);
    Ok(())
}
