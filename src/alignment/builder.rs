use crate::error::BuildError;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Number of VP modules.
pub const N_MODULES: usize = 52;
/// Distance from the module pivot to its tip, in micrometres.
pub const MODULE_HALF_WIDTH_UM: f64 = 100_000.0;
/// Part of the module that overhangs the pivot, in micrometres.
pub const OVERREACH_UM: f64 = 22_810.0;

const CLASS_ID_DETECTOR: u32 = 6;
const CLASS_ID_HALF: u32 = 1_008_106;

/// Whether a record carries computed values or the fixed all-zero entry.
///
/// The condition writer prints fixed entries as integer `0` and tilted ones
/// as doubles (`0.0` when an angle happens to vanish).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    #[default]
    Fixed,
    Tilted,
}

/// Rigid-body perturbation for one aligned element.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerturbationRecord {
    pub element_id: String,
    pub class_id: u32,
    #[serde(default)]
    pub kind: RecordKind,
    /// dPosXYZ in millimetres.
    pub translation: [f64; 3],
    /// dRotXYZ in radians.
    pub rotation: [f64; 3],
}

impl PerturbationRecord {
    fn zero(element_id: &str, class_id: u32) -> Self {
        Self {
            element_id: element_id.to_string(),
            class_id,
            kind: RecordKind::Fixed,
            translation: [0.0; 3],
            rotation: [0.0; 3],
        }
    }
}

/// Records for one scenario: the three system-level entries and the modules.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AlignmentConditions {
    pub global: Vec<PerturbationRecord>,
    pub modules: Vec<PerturbationRecord>,
}

/// Scenario knobs.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PerturbationParams {
    /// Tip displacement along x in micrometres.
    pub x_offset_um: f64,
    /// Tip displacement along y in micrometres.
    pub y_offset_um: f64,
    /// Relative Gaussian jitter of each module angle (0 disables).
    pub sigma: f64,
    /// Leave every other pair of modules unperturbed.
    pub alternate: bool,
    pub n_modules: usize,
    /// Seed for the jitter; `None` draws from the OS.
    pub seed: Option<u64>,
}

impl Default for PerturbationParams {
    fn default() -> Self {
        Self {
            x_offset_um: 0.0,
            y_offset_um: 0.0,
            sigma: 0.0,
            alternate: false,
            n_modules: N_MODULES,
            seed: None,
        }
    }
}

impl PerturbationParams {
    fn validate(&self) -> Result<(), BuildError> {
        for (name, value) in [("x_offset_um", self.x_offset_um), ("y_offset_um", self.y_offset_um)] {
            if !value.is_finite() {
                return Err(BuildError::InvalidParameter { name, value });
            }
        }
        if !self.sigma.is_finite() || self.sigma < 0.0 {
            return Err(BuildError::InvalidParameter {
                name: "sigma",
                value: self.sigma,
            });
        }
        if self.n_modules > 100 {
            return Err(BuildError::TooManyModules(self.n_modules));
        }
        Ok(())
    }
}

/// Builds the perturbation records for a scenario.
pub fn build(params: &PerturbationParams) -> Result<AlignmentConditions, BuildError> {
    params.validate()?;

    let global = vec![
        PerturbationRecord::zero("VPSystem", CLASS_ID_DETECTOR),
        PerturbationRecord::zero("VPLeft", CLASS_ID_HALF),
        PerturbationRecord::zero("VPRight", CLASS_ID_HALF),
    ];

    let nominal_rx = (params.x_offset_um / MODULE_HALF_WIDTH_UM).atan();
    let nominal_ry = (params.y_offset_um / MODULE_HALF_WIDTH_UM).atan();
    let mut rng = match params.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let mut modules = Vec::with_capacity(params.n_modules);
    for i in 0..params.n_modules {
        let name = format!("Module{i:02}");
        if params.alternate && (i / 2) % 2 == 0 {
            modules.push(PerturbationRecord::zero(&name, CLASS_ID_DETECTOR));
            continue;
        }
        let rx = jitter(&mut rng, nominal_rx, params.sigma)?;
        let ry = jitter(&mut rng, nominal_ry, params.sigma)?;
        let rz = 0.0;
        let (tx, tz) = compensating_translation(ry);
        modules.push(PerturbationRecord {
            element_id: name,
            class_id: CLASS_ID_DETECTOR,
            kind: RecordKind::Tilted,
            translation: [tx, 0.0, tz],
            rotation: [rx, ry, rz],
        });
    }

    debug!(
        "alignment: built {} module records (rx={:.3e}, ry={:.3e}, sigma={}, alternate={})",
        modules.len(),
        nominal_rx,
        nominal_ry,
        params.sigma,
        params.alternate
    );

    Ok(AlignmentConditions { global, modules })
}

/// In-plane shift that keeps the module reference point fixed under `ry`.
///
/// Returns `(tx, tz)` in millimetres.
fn compensating_translation(ry: f64) -> (f64, f64) {
    let width_mm = MODULE_HALF_WIDTH_UM / 1000.0;
    let lever = 1.0 - OVERREACH_UM / MODULE_HALF_WIDTH_UM;
    let tx = -width_mm * (1.0 - ry.cos()) * lever;
    let tz = -width_mm * ry.sin() * lever;
    (tx, tz)
}

/// Draws from N(nominal, sigma * |nominal|).
fn jitter<R: Rng>(rng: &mut R, nominal: f64, sigma: f64) -> Result<f64, BuildError> {
    let std_dev = sigma * nominal.abs();
    if std_dev <= 0.0 {
        return Ok(nominal);
    }
    let normal = Normal::new(nominal, std_dev).map_err(|_| BuildError::InvalidParameter {
        name: "sigma",
        value: sigma,
    })?;
    Ok(normal.sample(rng))
}
