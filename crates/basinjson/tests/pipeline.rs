use basinjson::source::load_features;
use basinjson::{
    find_manifests, read_artifact, run_batch, simplify_geometry, BatchOptions, CombineWarning,
    ConventionResolver, Error, Geometry, GeometryError, SimplifyOptions, UniformStyler,
};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    manifests: PathBuf,
    regional: PathBuf,
    out: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let manifests = dir.path().join("model_versions");
        let regional = dir.path().join("data/regional");
        let out = dir.path().join("generated_basin_geojsons");
        for d in [&manifests, &regional, &out] {
            fs::create_dir_all(d).unwrap();
        }

        Self {
            _dir: dir,
            manifests,
            regional,
            out,
        }
    }

    fn manifest(&self, version: &str, basins: &[&str]) -> PathBuf {
        let mut text = String::from("basins:\n");
        for basin in basins {
            text.push_str(&format!("  - {basin}\n"));
        }
        let path = self.manifests.join(format!("{version}.yaml"));
        fs::write(&path, text).unwrap();
        path
    }

    fn outline(&self, rel: &str, contents: &str) {
        let path = self.regional.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn run(&self) -> basinjson::BatchReport {
        run_batch(
            &find_manifests(&self.manifests).unwrap(),
            &ConventionResolver::new(&self.regional),
            &UniformStyler::default(),
            &BatchOptions::default(),
            &self.out,
        )
    }

    fn artifact(&self, version: &str) -> PathBuf {
        self.out.join(format!("{version}_basins.geojson.gz"))
    }
}

fn square_feature() -> String {
    json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {"name": "alpha"},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]]]
            }
        }]
    })
    .to_string()
}

fn source_files(path: &Path) -> Vec<String> {
    read_artifact(path)
        .unwrap()
        .features
        .iter()
        .map(|f| f.source_file().unwrap().to_owned())
        .collect()
}

#[test]
fn missing_basin_is_skipped_with_a_warning() {
    let fx = Fixture::new();
    fx.manifest("2p07", &["alpha", "beta"]);
    fx.outline("alpha/alpha.geojson", &square_feature());

    let report = fx.run();

    assert!(report.is_success());
    let outcome = &report.outcomes[0];
    let success = outcome.result.as_ref().unwrap();
    assert_eq!(
        success.warnings,
        [CombineWarning::MissingBasin {
            basin: "beta".into()
        }]
    );
    assert_eq!(source_files(&fx.artifact("2p07")), ["alpha.geojson"]);
}

#[test]
fn empty_manifest_fails_alone() {
    let fx = Fixture::new();
    fx.manifest("1p0", &["ghost", "phantom"]);
    fx.manifest("2p0", &["alpha"]);
    fx.manifest("3p0", &[]);
    fx.outline("alpha/alpha.geojson", &square_feature());

    let report = fx.run();

    assert_eq!(report.total(), 3);
    assert_eq!(report.succeeded(), 1);
    assert!(fx.artifact("2p0").is_file());

    let failed: Vec<_> = report
        .failures()
        .map(|(outcome, err)| {
            assert!(matches!(err, Error::EmptyResult { .. }));
            outcome.version.clone()
        })
        .collect();
    assert_eq!(failed, ["1p0", "3p0"]);
    assert!(report.to_string().starts_with("Processing complete: 1/3"));
}

#[test]
fn versioned_basin_name_resolves_by_clean_name() {
    let fx = Fixture::new();
    fx.manifest("2p07", &["coast_v19p1"]);
    fx.outline("coast/coast_outline_WGS84.txt", "0 0\n0 1\n1 1\n0 0\n");
    fx.outline("coast/coast_outline_WGS84_1.geojson", &square_feature());

    let report = fx.run();
    assert!(report.is_success());

    assert_eq!(
        source_files(&fx.artifact("2p07")),
        ["coast_outline_WGS84.txt", "coast_outline_WGS84_1.geojson"]
    );
}

#[test]
fn huge_tolerance_keeps_polygons_closed_and_non_degenerate() {
    let fx = Fixture::new();
    fx.manifest("2p07", &["alpha"]);
    fx.outline("alpha/alpha.geojson", &square_feature());

    let report = run_batch(
        &[fx.manifests.join("2p07.yaml")],
        &ConventionResolver::new(&fx.regional),
        &UniformStyler::default(),
        &BatchOptions {
            combine: basinjson::CombineOptions {
                simplify: true,
                geometry: basinjson::SimplifyOptions {
                    tolerance: 1000.0,
                    precision: 5,
                },
            },
            ..BatchOptions::default()
        },
        &fx.out,
    );
    assert!(report.is_success());

    let collection = read_artifact(&fx.artifact("2p07")).unwrap();
    let Some(Ok(Geometry::Polygon { coordinates })) = collection.features[0].parsed_geometry()
    else {
        panic!("expected a polygon");
    };
    let ring = &coordinates[0];
    assert_eq!(ring.first(), ring.last());

    let mut distinct = ring[..ring.len() - 1].to_vec();
    distinct.dedup();
    assert!(distinct.len() >= 3, "{ring:?}");
}

#[test]
fn styling_and_source_file_are_stamped_on_every_feature() {
    let fx = Fixture::new();
    fx.manifest("2p07", &["alpha"]);
    fx.outline("alpha/alpha.geojson", &square_feature());

    fx.run();
    let collection = read_artifact(&fx.artifact("2p07")).unwrap();
    let props = &collection.features[0].properties;

    assert_eq!(props["name"], json!("alpha"));
    assert_eq!(props["stroke"], json!("#ba0045"));
    assert_eq!(props["fill"], json!("#ba0045"));
    assert_eq!(props["stroke-width"], json!(1));
    assert_eq!(props["fill-opacity"], json!(0.3));
    assert_eq!(props["source_file"], json!("alpha.geojson"));
}

#[test]
fn reruns_produce_identical_bytes() {
    let fx = Fixture::new();
    fx.manifest("2p07", &["cant_v19p1", "nelson"]);
    fx.outline("cant/cant_outline_WGS84.geojson", &square_feature());
    fx.outline("cant/cant_outline_WGS84_1.txt", "172.1 -43.1\n172.2 -43.1\n172.2 -43.2\n");
    fx.outline("north/nested/nelson.txt", "173.0 -41.0\n173.1 -41.0\n173.1 -41.1\n");

    fx.run();
    let first = fs::read(fx.artifact("2p07")).unwrap();
    fx.run();
    let second = fs::read(fx.artifact("2p07")).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        source_files(&fx.artifact("2p07")),
        ["cant_outline_WGS84.geojson", "cant_outline_WGS84_1.txt", "nelson.txt"]
    );
}

#[test]
fn misshapen_basin_is_kept_as_read_beside_a_good_one() {
    let fx = Fixture::new();
    fx.manifest("2p07", &["alpha", "beta"]);
    fx.outline("alpha/alpha.geojson", &square_feature());
    let shallow = json!({"type": "Polygon", "coordinates": [[0, 0], [1, 1], [0, 1], [0, 0]]});
    fx.outline(
        "beta/beta.geojson",
        &json!({"type": "Feature", "properties": {}, "geometry": shallow.clone()}).to_string(),
    );

    let report = fx.run();

    assert!(report.is_success());
    assert_eq!(report.warning_count(), 1);
    let success = report.outcomes[0].result.as_ref().unwrap();
    assert!(matches!(
        &success.warnings[..],
        [CombineWarning::DegradedGeometry {
            feature_index: 1,
            error: GeometryError::Malformed { .. },
            ..
        }]
    ));

    let collection = read_artifact(&fx.artifact("2p07")).unwrap();
    assert_eq!(collection.features.len(), 2);
    assert_eq!(collection.features[1].geometry, Some(shallow));
    assert_eq!(collection.features[1].source_file(), Some("beta.geojson"));
}

#[test]
fn failed_write_leaves_other_artifacts_untouched() {
    let fx = Fixture::new();
    fx.manifest("2p07", &["alpha"]);
    fx.manifest("2p08", &["alpha"]);
    fx.outline("alpha/alpha.geojson", &square_feature());

    assert!(fx.run().is_success());
    let before_a = fs::read(fx.artifact("2p07")).unwrap();
    let before_b = fs::read(fx.artifact("2p08")).unwrap();

    // The temporary file for 2p08 cannot be created while a directory holds its name.
    fs::create_dir(fx.out.join(".2p08_basins.geojson.gz.tmp")).unwrap();
    fx.outline("alpha/alpha_1.txt", "5 5\n5 6\n6 6\n5 5\n");
    let report = fx.run();

    let failed: Vec<_> = report
        .failures()
        .map(|(outcome, err)| {
            assert!(matches!(err, Error::Write { .. }), "{err}");
            outcome.version.clone()
        })
        .collect();
    assert_eq!(failed, ["2p08"]);

    let after_a = fs::read(fx.artifact("2p07")).unwrap();
    assert_ne!(after_a, before_a);
    assert_eq!(source_files(&fx.artifact("2p07")), ["alpha.geojson", "alpha_1.txt"]);
    assert_eq!(fs::read(fx.artifact("2p08")).unwrap(), before_b);
    assert_eq!(source_files(&fx.artifact("2p08")), ["alpha.geojson"]);
}

#[test]
fn unclosed_legacy_ring_comes_out_closed() {
    let fx = Fixture::new();
    fx.outline("open/open.txt", "0 0\n0 1\n1 1\n1 0\n");

    let features = load_features(&fx.regional.join("open/open.txt")).unwrap();
    let Some(Ok(geometry)) = features[0].parsed_geometry() else {
        panic!("expected a geometry");
    };
    let out = simplify_geometry(&geometry, &SimplifyOptions::default());
    assert!(out.degraded.is_none());

    let Geometry::Polygon { coordinates } = out.geometry else {
        panic!("expected a polygon");
    };
    let ring = &coordinates[0];
    assert_eq!(ring.first(), ring.last());
    assert_eq!(ring.len(), 5, "{ring:?}");

    fx.manifest("2p07", &["open"]);
    assert!(fx.run().is_success());
    let collection = read_artifact(&fx.artifact("2p07")).unwrap();
    let Some(Ok(Geometry::Polygon { coordinates })) = collection.features[0].parsed_geometry()
    else {
        panic!("expected a polygon");
    };
    assert_eq!(coordinates[0].first(), coordinates[0].last());
}
