//! Hot-path benchmarks for the coefficient builder and the Newton-Raphson time step, the two
//! pieces of the core that run once per time step for the full `10^4-10^5` step horizon named in
//! the purpose statement.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use gotenx_geometry::{CircularGeometryParams, Geometry};
use gotenx_physics::CoreProfiles;
use gotenx_physics::sources::{CompositeSource, FusionFuelMix, FusionSource, OhmicSource, SourceModel};
use gotenx_physics::transport::{ConstantTransport, TransportModel};
use gotenx_solve::boundary::{BoundaryConditions, EquationBoundary};
use gotenx_solve::coeffs::build_all_coefficients;
use gotenx_solve::newton::{NewtonConfig, solve_step};
use gotenx_solve::operator::StateVector;
use gotenx_solve::scaling::EquationScales;

fn scenario(n: usize) -> (Geometry, CoreProfiles, BoundaryConditions) {
    let geometry =
        Geometry::circular(&CircularGeometryParams { num_cells: n, major_radius: 6.2, minor_radius: 2.0, toroidal_field: 5.3, q_profile: None }).unwrap();
    let ion_temperature: Vec<f64> = (0..n).map(|i| 8000.0 - 70.0 * i as f64 / n as f64).collect();
    let electron_temperature = ion_temperature.clone();
    let profiles = CoreProfiles::new(ion_temperature, electron_temperature, vec![7e19; n], vec![0.0; n], 1e18).unwrap();
    let boundaries = BoundaryConditions {
        ion_temperature: EquationBoundary::symmetric_axis_with_edge_value(200.0),
        electron_temperature: EquationBoundary::symmetric_axis_with_edge_value(200.0),
        electron_density: EquationBoundary::symmetric_axis_with_edge_value(5e19),
        poloidal_flux: EquationBoundary::symmetric_axis_with_edge_value(0.0),
    };
    (geometry, profiles, boundaries)
}

fn bench_coefficient_builder(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_all_coefficients");
    for &n in &[30_usize, 100, 300] {
        let (geometry, profiles, boundaries) = scenario(n);
        let transport_model =
            ConstantTransport { ion_heat_diffusivity: 1.0, electron_heat_diffusivity: 1.0, particle_diffusivity: 0.3, particle_pinch_velocity: -0.05 };
        let transport = transport_model.evaluate(&profiles, &geometry).unwrap();
        let composite = CompositeSource::new(vec![Box::new(OhmicSource::new(1e-6))]);
        let sources = composite.evaluate(&profiles, &geometry).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |bencher, _| {
            bencher.iter(|| black_box(build_all_coefficients(&transport, &sources, &geometry, boundaries)));
        });
    }
    group.finish();
}

fn bench_newton_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("solve_step");
    for &n in &[30_usize, 100] {
        let (geometry, profiles, boundaries) = scenario(n);
        let transport_model =
            ConstantTransport { ion_heat_diffusivity: 1.0, electron_heat_diffusivity: 1.0, particle_diffusivity: 0.3, particle_pinch_velocity: -0.05 };
        let transport = transport_model.evaluate(&profiles, &geometry).unwrap();
        let composite = CompositeSource::new(vec![Box::new(FusionSource::new(FusionFuelMix::equal_mix()).unwrap()), Box::new(OhmicSource::new(1e-6))]);
        let sources = composite.evaluate(&profiles, &geometry).unwrap();
        let coeffs = build_all_coefficients(&transport, &sources, &geometry, boundaries);
        let state =
            StateVector::from_fields(profiles.ion_temperature(), profiles.electron_temperature(), profiles.electron_density(), profiles.poloidal_flux());

        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |bencher, _| {
            bencher.iter(|| {
                black_box(solve_step(&state, &state, 1e-3, &coeffs, &geometry, EquationScales::iter_baseline(), 1e18, &NewtonConfig::default()).unwrap())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_coefficient_builder, bench_newton_step);
criterion_main!(benches);
