//! Flat, profile-independent transport coefficients, useful as a baseline and in tests.

use gotenx_geometry::Geometry;

use crate::error::PhysicsError;
use crate::profiles::CoreProfiles;

use super::{TransportCoefficients, TransportModel};

/// Transport coefficients that are the same at every cell and every time step.
#[derive(Clone, Copy, Debug)]
pub struct ConstantTransport {
    /// Flat ion heat diffusivity, m²/s.
    pub ion_heat_diffusivity: f64,
    /// Flat electron heat diffusivity, m²/s.
    pub electron_heat_diffusivity: f64,
    /// Flat particle diffusivity, m²/s.
    pub particle_diffusivity: f64,
    /// Flat particle pinch velocity, m/s.
    pub particle_pinch_velocity: f64,
}

impl TransportModel for ConstantTransport {
    fn evaluate(
        &self,
        profiles: &CoreProfiles,
        _geometry: &Geometry,
    ) -> Result<TransportCoefficients, PhysicsError> {
        let n = profiles.num_cells();
        Ok(TransportCoefficients {
            ion_heat_diffusivity: vec![self.ion_heat_diffusivity; n],
            electron_heat_diffusivity: vec![self.electron_heat_diffusivity; n],
            particle_diffusivity: vec![self.particle_diffusivity; n],
            particle_pinch_velocity: vec![self.particle_pinch_velocity; n],
        })
    }

    fn name(&self) -> &'static str {
        "constant"
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use gotenx_geometry::CircularGeometryParams;

    #[test]
    fn test_constant_transport_is_flat() {
        let n = 10;
        let geometry = Geometry::circular(&CircularGeometryParams {
            num_cells: n,
            major_radius: 6.2,
            minor_radius: 2.0,
            toroidal_field: 5.3,
            q_profile: None,
        })
        .unwrap();
        let profiles = crate::profiles::CoreProfiles::new(vec![1000.0; n], vec![1000.0; n], vec![1e20; n], vec![0.0; n], 1e18).unwrap();
        let model = ConstantTransport {
            ion_heat_diffusivity: 1.0,
            electron_heat_diffusivity: 1.5,
            particle_diffusivity: 0.5,
            particle_pinch_velocity: -0.1,
        };
        let coeffs = model.evaluate(&profiles, &geometry).unwrap();
        assert!(coeffs.ion_heat_diffusivity.iter().all(|&value| value == 1.0));
        assert!(coeffs.particle_pinch_velocity.iter().all(|&value| value == -0.1));
    }
}
