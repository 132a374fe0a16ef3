use gotenx_geometry::{CircularGeometryParams, Geometry};
use gotenx_physics::profiles::CoreProfiles;
use gotenx_physics::sources::{
    CompositeSource, FusionFuelMix, FusionSource, IonElectronExchange, OhmicSource, SourceCategory, SourceModel,
};

fn iter_baseline_geometry(num_cells: usize) -> Geometry {
    Geometry::circular(&CircularGeometryParams {
        num_cells,
        major_radius: 6.2,
        minor_radius: 2.0,
        toroidal_field: 5.3,
        q_profile: None,
    })
    .expect("ITER-baseline geometry should validate")
}

#[test]
fn test_composite_source_sums_all_models() {
    let n = 50;
    let geometry = iter_baseline_geometry(n);
    let profiles = CoreProfiles::new(
        vec![8000.0; n],
        vec![8000.0; n],
        vec![8e19; n],
        (0..n).map(|i| i as f64 * 0.02).collect(),
        1e18,
    )
    .unwrap();

    let composite = CompositeSource::new(vec![
        Box::new(FusionSource::new(FusionFuelMix::equal_mix()).unwrap()),
        Box::new(OhmicSource::new(1e-6)),
        Box::new(IonElectronExchange),
    ]);

    let total = composite.evaluate(&profiles, &geometry).unwrap();
    assert_eq!(total.ion_heating.len(), n);
    assert!(total.ion_heating.iter().all(|value| value.is_finite()));
    assert!(total.electron_heating.iter().all(|value| value.is_finite()));
    assert_eq!(total.metadata.len(), 3);
}

#[test]
fn test_empty_composite_yields_zero_densities_and_empty_metadata() {
    let n = 20;
    let geometry = iter_baseline_geometry(n);
    let profiles = CoreProfiles::new(vec![1000.0; n], vec![1000.0; n], vec![1e20; n], vec![0.0; n], 1e18).unwrap();

    let composite = CompositeSource::new(vec![]);
    let total = composite.evaluate(&profiles, &geometry).unwrap();

    assert!(total.ion_heating.iter().all(|&value| value == 0.0));
    assert!(total.metadata.is_empty());
}

#[test]
fn test_source_additivity_matches_sum_of_individual_models() {
    let n = 30;
    let geometry = iter_baseline_geometry(n);
    let profiles = CoreProfiles::new(
        vec![9000.0; n],
        vec![9000.0; n],
        vec![8e19; n],
        (0..n).map(|i| i as f64 * 0.015).collect(),
        1e18,
    )
    .unwrap();

    let fusion_a = FusionSource::new(FusionFuelMix::equal_mix()).unwrap();
    let fusion_b = FusionSource::new(FusionFuelMix::equal_mix()).unwrap();

    let a_only = CompositeSource::new(vec![Box::new(fusion_a)]).evaluate(&profiles, &geometry).unwrap();
    let b_only = CompositeSource::new(vec![Box::new(fusion_b)]).evaluate(&profiles, &geometry).unwrap();
    let combined = CompositeSource::new(vec![
        Box::new(FusionSource::new(FusionFuelMix::equal_mix()).unwrap()),
        Box::new(FusionSource::new(FusionFuelMix::equal_mix()).unwrap()),
    ])
    .evaluate(&profiles, &geometry)
    .unwrap();

    for cell in 0..n {
        let expected = a_only.ion_heating[cell] + b_only.ion_heating[cell];
        assert!((combined.ion_heating[cell] - expected).abs() < expected.abs() * 1e-9 + 1e-9);
    }
    assert_eq!(combined.metadata.len(), a_only.metadata.len() + b_only.metadata.len());
}

#[test]
fn test_exchange_metadata_power_cancels_exactly() {
    let n = 20;
    let geometry = iter_baseline_geometry(n);
    let profiles = CoreProfiles::new(vec![9000.0; n], vec![5000.0; n], vec![8e19; n], vec![0.0; n], 1e18).unwrap();

    let composite = CompositeSource::new(vec![Box::new(IonElectronExchange)]);
    let total = composite.evaluate(&profiles, &geometry).unwrap();

    let entry = &total.metadata[0];
    assert_eq!(entry.category, SourceCategory::Other);
    assert!((entry.ion_power + entry.electron_power).abs() < 1e-6 * entry.ion_power.abs().max(1.0));
}

#[test]
fn test_integrated_power_matches_fusion_metadata_sum() {
    let n = 20;
    let geometry = iter_baseline_geometry(n);
    let profiles = CoreProfiles::new(vec![12000.0; n], vec![12000.0; n], vec![9e19; n], vec![0.0; n], 1e18).unwrap();

    let composite = CompositeSource::new(vec![Box::new(FusionSource::new(FusionFuelMix::equal_mix()).unwrap())]);
    let total = composite.evaluate(&profiles, &geometry).unwrap();

    let expected: f64 = total.metadata.iter().filter(|entry| entry.category == SourceCategory::Fusion).map(|entry| entry.ion_power + entry.electron_power).sum();
    assert!((total.integrated_power(SourceCategory::Fusion) - expected).abs() < 1e-9);
}
