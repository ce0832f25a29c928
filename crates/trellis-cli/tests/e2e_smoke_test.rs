use std::{fs, path::PathBuf};

use tempfile::tempdir;

use trellis_cli::{Args, run};

/// Directory of the demo models, at the workspace root.
fn demos_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("demos")
}

/// Collects all .toml model files from a directory
fn collect_model_files(dir: PathBuf) -> Vec<PathBuf> {
    let mut files = if let Ok(entries) = fs::read_dir(&dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("toml")
            })
            .collect()
    } else {
        Vec::new()
    };

    // Sort for consistent test output
    files.sort();
    files
}

fn args(input: PathBuf, output: &std::path::Path) -> Args {
    Args {
        input: input.to_string_lossy().to_string(),
        output: Some(output.to_string_lossy().to_string()),
        log_level: "off".to_string(),
        ..Default::default()
    }
}

#[test]
fn e2e_smoke_test_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let demos = collect_model_files(demos_dir());

    assert!(!demos.is_empty(), "No demo models found in demos/");

    let mut failed_demos = Vec::new();

    for demo_path in &demos {
        let output_dir = temp_dir.path().join(demo_path.file_stem().unwrap());
        let args = Args {
            views: true,
            packages: true,
            contexts: true,
            ..args(demo_path.clone(), &output_dir)
        };

        if let Err(e) = run(&args) {
            failed_demos.push((demo_path.clone(), e));
        }
    }

    if !failed_demos.is_empty() {
        eprintln!("\nDemos that failed:");
        for (path, err) in &failed_demos {
            eprintln!("  - {}: {}", path.display(), err);
        }
        panic!("{} demo(s) failed unexpectedly", failed_demos.len());
    }
}

#[test]
fn e2e_main_diagram() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    run(&args(demos_dir().join("shop.toml"), temp_dir.path())).expect("run");

    let dot = fs::read_to_string(temp_dir.path().join("graph.dot")).expect("graph.dot written");
    assert!(dot.contains("digraph G"));
    assert!(dot.contains("LineItem"));
    assert!(!dot.contains("UMLOptions"));
}

#[test]
fn e2e_views_replace_main_diagram() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let args = Args {
        views: true,
        ..args(demos_dir().join("views.toml"), temp_dir.path())
    };
    run(&args).expect("run");

    for name in ["Geometry.dot", "AroundCanvas.dot", "Hierarchy.dot"] {
        assert!(temp_dir.path().join(name).is_file(), "{name} written");
    }
    assert!(!temp_dir.path().join("Base.dot").exists());
    assert!(!temp_dir.path().join("graph.dot").exists());
}

#[test]
fn e2e_single_view() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let args = Args {
        view: Some("views.Hierarchy".to_string()),
        ..args(demos_dir().join("views.toml"), temp_dir.path())
    };
    run(&args).expect("run");

    assert!(temp_dir.path().join("Hierarchy.dot").is_file());
    assert!(!temp_dir.path().join("Geometry.dot").exists());
}

#[test]
fn e2e_package_and_context_diagrams() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let args = Args {
        packages: true,
        contexts: true,
        ..args(demos_dir().join("shop.toml"), temp_dir.path())
    };
    run(&args).expect("run");

    assert!(temp_dir.path().join("shop/shop.dot").is_file());
    assert!(temp_dir.path().join("billing/billing.dot").is_file());
    assert!(temp_dir.path().join("shop/Order.dot").is_file());
    assert!(temp_dir.path().join("billing/Invoice.dot").is_file());
}

#[test]
fn e2e_unknown_view_fails() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let args = Args {
        view: Some("Nowhere".to_string()),
        ..args(demos_dir().join("views.toml"), temp_dir.path())
    };
    assert!(run(&args).is_err());
}

#[test]
fn e2e_missing_input_fails() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let result = run(&args(temp_dir.path().join("missing.toml"), temp_dir.path()));
    assert!(result.is_err());
}
