use std::{fs, path::PathBuf};

use serde_json::Value;
use tempfile::tempdir;

use trellis::config::OutputFormat;
use trellis_cli::{Args, run};

/// The demo layouts live at the workspace root.
fn demos_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("demos")
}

/// Collects all .json files from a directory
fn collect_json_files(dir: PathBuf) -> Vec<PathBuf> {
    let mut files = if let Ok(entries) = fs::read_dir(&dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json")
            })
            .collect()
    } else {
        Vec::new()
    };

    files.sort();
    files
}

fn path_string(path: PathBuf) -> String {
    path.to_string_lossy().to_string()
}

fn args(layouts: Vec<String>, output: String) -> Args {
    Args {
        layouts,
        current: None,
        repeating_groups: None,
        data: None,
        format: None,
        resolve: false,
        config: None,
        log_level: "off".to_string(),
        output: Some(output),
    }
}

#[test]
fn e2e_smoke_test_valid_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let layouts = collect_json_files(demos_dir());

    assert!(!layouts.is_empty(), "No demo layouts found in demos/");

    let mut failed = Vec::new();
    for layout in &layouts {
        let output = temp_dir.path().join(format!(
            "{}.txt",
            layout.file_stem().unwrap().to_string_lossy()
        ));
        let args = args(
            vec![path_string(layout.clone())],
            path_string(output),
        );

        if let Err(e) = run(&args) {
            failed.push((layout.clone(), e));
        }
    }

    if !failed.is_empty() {
        eprintln!("\nDemo layouts that failed:");
        for (path, err) in &failed {
            eprintln!("  - {}: {}", path.display(), err);
        }
        panic!("{} demo layout(s) failed unexpectedly", failed.len());
    }
}

#[test]
fn e2e_smoke_test_error_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let layouts = collect_json_files(demos_dir().join("errors"));

    assert!(!layouts.is_empty(), "No error layouts found in demos/errors/");

    let mut unexpectedly_succeeded = Vec::new();
    for layout in &layouts {
        let output = temp_dir.path().join("error.txt");
        let args = args(vec![path_string(layout.clone())], path_string(output));

        if run(&args).is_ok() {
            unexpectedly_succeeded.push(layout.clone());
        }
    }

    if !unexpectedly_succeeded.is_empty() {
        eprintln!("\nError layouts that unexpectedly succeeded:");
        for path in &unexpectedly_succeeded {
            eprintln!("  - {}", path.display());
        }
        panic!(
            "{} error layout(s) succeeded unexpectedly",
            unexpectedly_succeeded.len()
        );
    }
}

#[test]
fn e2e_resolve_layout_set() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let output = temp_dir.path().join("resolved.json");

    let mut args = args(
        vec![
            path_string(demos_dir().join("household.json")),
            path_string(demos_dir().join("summary.json")),
        ],
        path_string(output.clone()),
    );
    args.repeating_groups = Some(path_string(demos_dir().join("state").join("groups.json")));
    args.data = Some(path_string(demos_dir().join("state").join("data.json")));
    args.format = Some(OutputFormat::Json);
    args.resolve = true;

    run(&args).expect("Resolving the demo layout set failed");

    let value: Value = serde_json::from_str(&fs::read_to_string(output).unwrap()).unwrap();
    let household = value["household"].as_array().unwrap();
    let members = &household[1];
    assert_eq!(members["id"], "members");

    let rows = members["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["groupExpressions"]["edit"]["deleteButton"], true);
    assert_eq!(rows[1]["groupExpressions"]["edit"]["deleteButton"], false);

    let pets_of_tim = &rows[1]["items"][2];
    assert_eq!(pets_of_tim["id"], "pets-1");
    assert_eq!(pets_of_tim["hidden"], true);
    assert_eq!(
        pets_of_tim["rows"][0]["items"][0]["dataModelBindings"]["simpleBinding"],
        "Household.Members[1].Pets[0].Kind"
    );

    let summary = value["summary"].as_array().unwrap();
    assert_eq!(summary[1]["hidden"], false);
    assert_eq!(
        summary[1]["textResourceBindings"]["title"],
        "Phone: 555-0100"
    );
}

#[test]
fn e2e_flat_output_with_current_page() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let output = temp_dir.path().join("flat.txt");

    let mut args = args(
        vec![path_string(demos_dir().join("summary.json"))],
        path_string(output.clone()),
    );
    args.format = Some(OutputFormat::Flat);
    args.current = Some("summary".to_string());

    run(&args).expect("Rendering the summary page failed");

    assert_eq!(
        fs::read_to_string(output).unwrap(),
        "summary-title\nsummary-phone\n"
    );
}

#[test]
fn e2e_missing_layout_file() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let args = args(
        vec![path_string(temp_dir.path().join("absent.json"))],
        path_string(temp_dir.path().join("out.txt")),
    );

    assert!(run(&args).is_err());
}
