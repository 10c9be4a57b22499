use std::fs;
use vp_distortions::alignment::{
    build, parse_conditions, write_condition_files, PerturbationParams, MODULE_HALF_WIDTH_UM,
    N_MODULES,
};

fn params(x: f64, y: f64, alternate: bool) -> PerturbationParams {
    PerturbationParams {
        x_offset_um: x,
        y_offset_um: y,
        alternate,
        seed: Some(11),
        ..Default::default()
    }
}

#[test]
fn condition_files_reproduce_module_rotations() {
    let dir = tempfile::tempdir().unwrap();
    let global_path = dir.path().join("conditions/Global.xml");
    let modules_path = dir.path().join("conditions/Modules.xml");

    for &(x, y) in &[(50.0, 0.0), (-120.0, 35.0), (0.0, -7.5)] {
        let conditions = build(&params(x, y, false)).unwrap();
        write_condition_files(&conditions, &global_path, &modules_path).unwrap();

        let global = parse_conditions(&fs::read_to_string(&global_path).unwrap()).unwrap();
        assert_eq!(global.len(), 3);
        assert!(global
            .iter()
            .all(|r| r.translation == [0.0; 3] && r.rotation == [0.0; 3]));

        let modules = parse_conditions(&fs::read_to_string(&modules_path).unwrap()).unwrap();
        assert_eq!(modules.len(), N_MODULES);
        let rx = (x / MODULE_HALF_WIDTH_UM).atan();
        let ry = (y / MODULE_HALF_WIDTH_UM).atan();
        for (parsed, built) in modules.iter().zip(&conditions.modules) {
            assert_eq!(parsed.element_id, built.element_id);
            assert!((parsed.rotation[0] - rx).abs() < 1e-15);
            assert!((parsed.rotation[1] - ry).abs() < 1e-15);
            assert_eq!(parsed.rotation[2], 0.0);
            for i in 0..3 {
                assert!((parsed.translation[i] - built.translation[i]).abs() < 1e-15);
            }
        }
    }
}

#[test]
fn alternate_pattern_leaves_even_pairs_untouched() {
    let conditions = build(&params(80.0, -40.0, true)).unwrap();
    for (i, record) in conditions.modules.iter().enumerate() {
        if (i / 2) % 2 == 0 {
            assert_eq!(record.rotation, [0.0; 3], "module {i}");
            assert_eq!(record.translation, [0.0; 3], "module {i}");
        } else {
            assert!(record.rotation[0] != 0.0 && record.rotation[1] != 0.0, "module {i}");
        }
    }
}
