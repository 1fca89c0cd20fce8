//! Full passes: catalog + folder -> analysis -> batch -> rescan
//!
//! Tests that set SFA_AUDIO_FOLDER are marked #[serial].

use std::fs;
use std::path::Path;

use serial_test::serial;
use sfa_common::config::{load_config, TomlConfig, AUDIO_FOLDER_ENV_VAR};
use sfa_reconcile::catalog::{Catalog, JsonCatalog};
use sfa_reconcile::models::{ExpectedFile, Operation};
use sfa_reconcile::services::{IncludeAll, OperationExecutor, RuleSet};
use sfa_reconcile::workflow::{self, analyze, plan_batch};
use sfa_reconcile::{ProjectContext, SuffixMapping};
use tempfile::TempDir;

const CATALOG: &str = r#"[
    {"Reference": "0021", "Gloss": "dog", "SoundFile": "0021_dog.wav", "Phonetic": "dɔg"},
    {"Reference": "0022", "Gloss": "cat", "SoundFile": "0022_cat.wav", "Phonetic": ""},
    {"Reference": "0023", "Gloss": "bird", "SoundFile": "0023_bird.wav", "Phonetic": "bɜd"}
]"#;

const MAPPING: &str = "SoundFile\t\nPhonetic\t-phon\n";

struct Project {
    _audio: TempDir,
    data: TempDir,
    ctx: ProjectContext,
    catalog: JsonCatalog,
}

fn project(files: &[&str]) -> Project {
    let audio = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    for name in files {
        fs::write(audio.path().join(name), b"RIFF").unwrap();
    }
    let catalog_path = data.path().join("catalog.json");
    fs::write(&catalog_path, CATALOG).unwrap();

    Project {
        ctx: ProjectContext::new(audio.path()),
        catalog: JsonCatalog::open(&catalog_path).unwrap(),
        _audio: audio,
        data,
    }
}

fn filenames<'a>(files: impl IntoIterator<Item = &'a ExpectedFile>) -> Vec<&'a str> {
    files.into_iter().map(|e| e.filename.as_str()).collect()
}

#[test]
fn test_missing_and_orphaned() {
    let p = project(&[
        "0021_dog.wav",
        "0021_dog-phon.wav",
        "0022_cat.wav",
        "0023_old_name.wav",
        "junk.wav",
    ]);
    let mapping = SuffixMapping::parse_exchange(MAPPING).unwrap();
    let actual = workflow::scan_folder(&p.ctx).unwrap();

    let analysis = analyze(&p.ctx, p.catalog.records(), &actual, Some(&mapping), &IncludeAll);

    assert_eq!(
        filenames(&analysis.report.missing),
        vec!["0022_cat-phon.wav", "0023_bird.wav", "0023_bird-phon.wav"]
    );
    assert_eq!(analysis.report.orphaned, vec!["0023_old_name.wav", "junk.wav"]);

    let best = analysis
        .suggestions
        .iter()
        .find(|c| c.orphan == "0023_old_name.wav")
        .unwrap();
    assert_eq!(best.expected.filename, "0023_bird.wav");
    assert!(!best.auto_accept);
}

#[test]
fn test_rules_from_config_limit_expectations() {
    let p = project(&["0021_dog.wav", "0021_dog-phon.wav", "0022_cat.wav", "0023_bird.wav"]);
    let config_path = p.data.path().join("sfa.toml");
    fs::write(
        &config_path,
        r#"
[rules.Phonetic]
logic = "and"
conditions = [{ field = "Phonetic", operator = "not_empty" }]
"#,
    )
    .unwrap();
    let toml_config = load_config(Some(&config_path)).unwrap();
    let rules = RuleSet::from_config(&toml_config);

    let mapping = SuffixMapping::parse_exchange(MAPPING).unwrap();
    let actual = workflow::scan_folder(&p.ctx).unwrap();
    let analysis = analyze(&p.ctx, p.catalog.records(), &actual, Some(&mapping), &rules);

    // 0022 has no phonetic transcription, so no -phon recording is expected
    assert_eq!(filenames(&analysis.report.missing), vec!["0023_bird-phon.wav"]);
    assert!(analysis.report.orphaned.is_empty());
}

#[test]
fn test_planned_batch_converges() {
    let p = project(&[
        "0021_dog1.wav",
        "0021_dog-phon.wav",
        "0022_cat.wav",
        "0022_cat-phon.wav",
        "0023_bird.wav",
        "junk.wav",
    ]);
    let mapping = SuffixMapping::parse_exchange(MAPPING).unwrap();
    let actual = workflow::scan_folder(&p.ctx).unwrap();
    let analysis = analyze(&p.ctx, p.catalog.records(), &actual, Some(&mapping), &IncludeAll);

    let batch = plan_batch(&analysis);
    assert!(batch.contains(&Operation::move_to_holding("junk.wav")));
    assert!(batch.iter().any(|op| matches!(
        op,
        Operation::Rename { old_filename, new_filename, .. }
            if old_filename == "0021_dog1.wav" && new_filename == "0021_dog.wav"
    )));

    let report = OperationExecutor::new(&p.ctx).unwrap().execute(&batch).unwrap();
    assert!(report.success);
    assert_eq!(report.completed, 2);

    // Rescan: the moved file is gone from the top level, nothing is orphaned
    let rescanned = workflow::scan_folder(&p.ctx).unwrap();
    assert!(!rescanned.iter().any(|f| f == "junk.wav"));
    let again = analyze(&p.ctx, p.catalog.records(), &rescanned, Some(&mapping), &IncludeAll);
    assert!(again.report.orphaned.is_empty());
    assert_eq!(filenames(&again.report.missing), vec!["0023_bird-phon.wav"]);

    let todo = fs::read_to_string(p.ctx.todo_log_path()).unwrap();
    assert!(todo.contains("0023_bird-phon.wav"));
}

#[test]
fn test_discovered_suffixes_without_mapping() {
    let p = project(&[
        "0021_dog.wav",
        "0021_dog-phon.wav",
        "0021_dog-tone.wav",
        "0022_cat.wav",
        "0023_bird.wav",
    ]);
    let actual = workflow::scan_folder(&p.ctx).unwrap();
    let analysis = analyze(&p.ctx, p.catalog.records(), &actual, None, &IncludeAll);

    assert_eq!(analysis.resolution.vocabulary(), vec!["", "-phon", "-tone"]);
    assert_eq!(analysis.report.missing.len(), 4);
    assert!(analysis.report.orphaned.is_empty());
}

#[test]
fn test_catalog_updates_feed_next_pass() {
    let mut p = project(&["0022_cat.wav", "0022_black_cat.wav"]);
    let ctx = p.ctx.clone();
    p.catalog.update_field(1, "SoundFile", "0022_black_cat.wav").unwrap();
    p.catalog.save().unwrap();

    let reopened = JsonCatalog::open(p.catalog.path()).unwrap();
    let names = workflow::base_names(&ctx, reopened.records());
    assert_eq!(names, vec!["0021_dog.wav", "0022_black_cat.wav", "0023_bird.wav"]);

    let actual = workflow::scan_folder(&ctx).unwrap();
    let mapping = SuffixMapping::parse_exchange("SoundFile\t\n").unwrap();
    let analysis = analyze(&ctx, reopened.records(), &actual, Some(&mapping), &IncludeAll);
    assert_eq!(analysis.report.orphaned, vec!["0022_cat.wav"]);
}

#[test]
#[serial]
fn test_audio_folder_from_environment() {
    let temp_dir = TempDir::new().unwrap();
    std::env::set_var(AUDIO_FOLDER_ENV_VAR, temp_dir.path());

    let ctx = ProjectContext::from_config(None, &TomlConfig::default()).unwrap();
    assert_eq!(ctx.audio_folder, temp_dir.path());

    std::env::remove_var(AUDIO_FOLDER_ENV_VAR);
}

#[test]
#[serial]
fn test_cli_folder_beats_environment() {
    std::env::set_var(AUDIO_FOLDER_ENV_VAR, "/from/env");

    let ctx = ProjectContext::from_config(Some(Path::new("/from/cli")), &TomlConfig::default()).unwrap();
    assert_eq!(ctx.audio_folder, Path::new("/from/cli"));

    std::env::remove_var(AUDIO_FOLDER_ENV_VAR);
}
