//! A reduced neural-network surrogate transport closure.
//!
//! Mirrors the shape of a QuaLiKiz neural-network surrogate: a small feed-forward network maps
//! local dimensionless gradients to diffusivities, trading the cost of a gyrokinetic
//! quasilinear solve for a handful of matrix-vector products. The network here is a fixed,
//! hand-specified two-layer MLP rather than a trained checkpoint — enough to exercise the same
//! evaluate-per-cell interface a loaded network would use.

use gotenx_geometry::{Geometry, central_difference_gradient};
use ndarray::{Array1, Array2};

use crate::error::PhysicsError;
use crate::profiles::CoreProfiles;

use super::{MIN_DIFFUSIVITY, TransportCoefficients, TransportModel};

/// Hidden-layer width of the surrogate network.
const HIDDEN_UNITS: usize = 4;

/// Input feature count: `[R/L_Ti, R/L_Te, R/L_ne, q]`.
const INPUT_FEATURES: usize = 4;

fn relu(x: f64) -> f64 {
    x.max(0.0)
}

fn softplus(x: f64) -> f64 {
    // Keeps diffusivity positive without a hard clip, matching how a trained surrogate's
    // output layer is usually constrained.
    (1.0 + x.exp()).ln()
}

/// A small feed-forward surrogate predicting ion and electron heat diffusivity from local
/// normalised gradients and the safety factor.
#[derive(Clone, Debug)]
pub struct QlknnTransport {
    hidden_weights: Array2<f64>,
    hidden_bias: Array1<f64>,
    output_weights_ion: Array1<f64>,
    output_weights_electron: Array1<f64>,
}

impl Default for QlknnTransport {
    fn default() -> Self {
        // Fixed weights chosen so the surrogate responds monotonically to each input gradient;
        // not fit against any particular QuaLiKiz dataset.
        Self {
            hidden_weights: Array2::from_shape_vec(
                (HIDDEN_UNITS, INPUT_FEATURES),
                vec![
                    0.30, 0.10, 0.05, -0.02, 0.05, 0.30, 0.10, -0.01, 0.10, 0.05, 0.25, 0.01, 0.02,
                    0.02, 0.02, 0.20,
                ],
            )
            .expect("fixed weight shape matches HIDDEN_UNITS x INPUT_FEATURES"),
            hidden_bias: Array1::from_vec(vec![-0.5, -0.5, -0.3, -0.2]),
            output_weights_ion: Array1::from_vec(vec![0.4, 0.1, 0.1, 0.05]),
            output_weights_electron: Array1::from_vec(vec![0.1, 0.4, 0.1, 0.05]),
        }
    }
}

impl TransportModel for QlknnTransport {
    fn evaluate(
        &self,
        profiles: &CoreProfiles,
        geometry: &Geometry,
    ) -> Result<TransportCoefficients, PhysicsError> {
        let n = profiles.num_cells();
        let major_radius = geometry.major_radius();
        let q_profile = geometry.g0().clone() / geometry.radii();

        let ion_temperature = profiles.ion_temperature();
        let electron_temperature = profiles.electron_temperature();
        let electron_density = profiles.electron_density();

        let ti = Array1::from_vec(ion_temperature.to_vec());
        let te = Array1::from_vec(electron_temperature.to_vec());
        let ne = Array1::from_vec(electron_density.to_vec());

        let ti_grad = cell_centred_gradient(&ti, geometry);
        let te_grad = cell_centred_gradient(&te, geometry);
        let ne_grad = cell_centred_gradient(&ne, geometry);

        let mut ion_heat_diffusivity = vec![0.0; n];
        let mut electron_heat_diffusivity = vec![0.0; n];

        for cell in 0..n {
            let r_lti = -major_radius * ti_grad[cell] / ti[cell].max(1.0);
            let r_lte = -major_radius * te_grad[cell] / te[cell].max(1.0);
            let r_lne = -major_radius * ne_grad[cell] / ne[cell].max(1.0);
            let q = q_profile[cell];

            let features = Array1::from_vec(vec![r_lti, r_lte, r_lne, q]);
            let hidden = (self.hidden_weights.dot(&features) + &self.hidden_bias).mapv(relu);

            let ion_raw = hidden.dot(&self.output_weights_ion);
            let electron_raw = hidden.dot(&self.output_weights_electron);

            ion_heat_diffusivity[cell] = softplus(ion_raw).max(MIN_DIFFUSIVITY);
            electron_heat_diffusivity[cell] = softplus(electron_raw).max(MIN_DIFFUSIVITY);
        }

        Ok(TransportCoefficients {
            ion_heat_diffusivity,
            electron_heat_diffusivity,
            particle_diffusivity: vec![MIN_DIFFUSIVITY; n],
            particle_pinch_velocity: vec![0.0; n],
        })
    }

    fn name(&self) -> &'static str {
        "qlknn"
    }
}

fn cell_centred_gradient(values: &Array1<f64>, geometry: &Geometry) -> Vec<f64> {
    let n = values.len();
    let face_gradient = central_difference_gradient(values, geometry.cell_distances());
    (0..n).map(|cell| 0.5 * (face_gradient[cell] + face_gradient[cell + 1])).collect()
}
