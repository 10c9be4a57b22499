//! Synthesis of VP alignment conditions for hybrid-distortion scenarios.
//!
//! A scenario tilts every module as if its tip had been pushed by
//! `(x_offset, y_offset)` micrometres. The builder turns those offsets into
//! one rigid-body perturbation per module, plus the three system-level
//! records the reconstruction expects to find, and [`xml`] renders them in
//! the condition-database layout.
//!
//! Conventions
//! - rotations are `atan(offset / MODULE_HALF_WIDTH_UM)` about x and y;
//! - translations compensate the `ry` tilt so the module reference point
//!   stays put, and are expressed in millimetres;
//! - module records are named `Module00`..`Module51`.

mod builder;
pub mod xml;

pub use builder::{
    build, AlignmentConditions, PerturbationParams, PerturbationRecord, RecordKind,
    MODULE_HALF_WIDTH_UM, N_MODULES, OVERREACH_UM,
};
pub use xml::{parse_conditions, render_global_xml, render_modules_xml, write_condition_files};
