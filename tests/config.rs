use anyhow::Result;
use stable_fluid_sim::{FluidError, FluidSimulation, SimulationConfig, SolverParams, StorageFormat};

#[test]
fn config_toml_roundtrip() -> Result<()> {
    let config = SimulationConfig::new(320, 200, StorageFormat::Float32).with_solver(SolverParams {
        jacobi_iterations: 48,
        viscosity: 0.002,
        warm_start_pressure: true,
        ..SolverParams::default()
    });
    let text = toml::to_string(&config)?;
    let recovered: SimulationConfig = toml::from_str(&text)?;
    assert_eq!(recovered, config);
    Ok(())
}

#[test]
fn partial_toml_fills_defaults() -> Result<()> {
    let text = r#"
width = 64
height = 32
format = "float16"

[solver]
splat_radius = 6.0
"#;
    let config: SimulationConfig = toml::from_str(text)?;
    assert_eq!(config.width, 64);
    assert_eq!(config.format, StorageFormat::Float16);
    assert_eq!(config.solver.splat_radius, 6.0);
    assert_eq!(config.solver.jacobi_iterations, 31);
    assert_eq!(config.solver.splat_force, 1.5);
    Ok(())
}

#[test]
fn empty_toml_is_the_default_config() -> Result<()> {
    let config: SimulationConfig = toml::from_str("")?;
    assert_eq!(config, SimulationConfig::default());
    assert_eq!(config.width, 256);
    assert_eq!(config.format, StorageFormat::Float16);
    Ok(())
}

#[test]
fn unknown_format_is_rejected() {
    let parsed: Result<SimulationConfig, _> = toml::from_str("format = \"float8\"");
    assert!(parsed.is_err());
}

#[test]
fn invalid_config_never_builds_a_simulation() {
    let config = SimulationConfig {
        solver: SolverParams {
            dye_strength: 2.0,
            ..SolverParams::default()
        },
        ..SimulationConfig::new(8, 8, StorageFormat::Float16)
    };
    let err = FluidSimulation::new(config).unwrap_err();
    assert!(matches!(err, FluidError::InvalidConfig(_)));
    assert!(err.to_string().contains("dye_strength"));
}
