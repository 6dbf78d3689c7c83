//! End-to-end release pipeline scenarios.

use cs_common::{BumpKind, Version};
use cs_core::release::{
    run_release, DirPublisher, NullPublisher, PrebuiltTree, ReleaseOptions,
};
use cs_manifest::{UpdateManifest, MANIFEST_FILE_NAME};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_tree(root: &Path, entries: &[(&str, &str)]) {
    for (rel, content) in entries {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
}

fn options(temp: &TempDir, bump: BumpKind) -> ReleaseOptions {
    let installer = temp.path().join("Setup.exe");
    if !installer.exists() {
        fs::write(&installer, "full-installer-payload").unwrap();
    }
    ReleaseOptions {
        bump,
        base_url: "https://releases.example.com/files".to_string(),
        installer,
        installer_url: "https://releases.example.com/Setup.exe".to_string(),
        mandatory: false,
        notes: "Correcciones y mejoras.".to_string(),
        out_dir: temp.path().join("out"),
    }
}

#[test]
fn test_successive_releases_advance_version_and_diff() {
    let temp = TempDir::new().unwrap();

    // First release: everything is new.
    let dist1 = temp.path().join("dist1");
    write_tree(
        &dist1,
        &[("app.bin", "v1"), ("templates/quote.html", "tmpl")],
    );
    let r1 = run_release(
        &options(&temp, BumpKind::Minor),
        &PrebuiltTree { source: dist1 },
        &mut NullPublisher,
    )
    .unwrap();
    assert_eq!(r1.version, Version::new(0, 1, 0));
    assert_eq!(r1.files, 2);
    assert_eq!(r1.delete, 0);

    // Second release: one change, one addition, one removal.
    let dist2 = temp.path().join("dist2");
    write_tree(&dist2, &[("app.bin", "v2"), ("help.pdf", "manual")]);
    let r2 = run_release(
        &options(&temp, BumpKind::Major),
        &PrebuiltTree { source: dist2 },
        &mut NullPublisher,
    )
    .unwrap();
    assert_eq!(r2.version, Version::new(1, 0, 0));

    let manifest =
        UpdateManifest::from_json(&fs::read_to_string(&r2.manifest_path).unwrap()).unwrap();
    assert_eq!(manifest.version, Version::new(1, 0, 0));
    assert_eq!(manifest.delete, vec!["templates/quote.html".to_string()]);
    assert!(manifest.find_file("app.bin").is_some());
    assert!(manifest.find_file("help.pdf").is_some());
    assert!(manifest.validate().is_ok());

    // Third release with no baseline changes still lists the full tree.
    let dist3 = temp.path().join("dist3");
    write_tree(&dist3, &[("app.bin", "v2"), ("help.pdf", "manual")]);
    let r3 = run_release(
        &options(&temp, BumpKind::Patch),
        &PrebuiltTree { source: dist3 },
        &mut NullPublisher,
    )
    .unwrap();
    assert_eq!(r3.version, Version::new(1, 0, 1));
    assert_eq!(r3.files, 2);
    assert_eq!(r3.delete, 0);
}

#[test]
fn test_published_share_holds_tree_and_manifest() {
    let temp = TempDir::new().unwrap();
    let dist = temp.path().join("dist");
    write_tree(&dist, &[("app.bin", "v1"), ("lib/core.dll", "dll")]);

    let share = temp.path().join("share");
    let mut publisher = DirPublisher {
        root: share.clone(),
    };
    let report = run_release(
        &options(&temp, BumpKind::Minor),
        &PrebuiltTree { source: dist },
        &mut publisher,
    )
    .unwrap();

    let published = share.join(report.version.to_string());
    assert_eq!(fs::read_to_string(published.join("app.bin")).unwrap(), "v1");
    assert_eq!(
        fs::read_to_string(published.join("lib/core.dll")).unwrap(),
        "dll"
    );

    let manifest =
        UpdateManifest::from_json(&fs::read_to_string(share.join(MANIFEST_FILE_NAME)).unwrap())
            .unwrap();
    assert_eq!(manifest.version, report.version);
    assert_eq!(manifest.sha256.len(), 64);
    assert_eq!(manifest.url, "https://releases.example.com/Setup.exe");
}

#[test]
fn test_manifest_never_mentions_protected_paths() {
    let temp = TempDir::new().unwrap();

    // A database and logs leaked into the first build.
    let dist1 = temp.path().join("dist1");
    write_tree(
        &dist1,
        &[
            ("app.bin", "v1"),
            ("sqlModels/app.sqlite3", "junk"),
            ("logs/build.log", "junk"),
        ],
    );
    run_release(
        &options(&temp, BumpKind::Minor),
        &PrebuiltTree { source: dist1 },
        &mut NullPublisher,
    )
    .unwrap();

    let dist2 = temp.path().join("dist2");
    write_tree(&dist2, &[("app.bin", "v2")]);
    let report = run_release(
        &options(&temp, BumpKind::Patch),
        &PrebuiltTree { source: dist2 },
        &mut NullPublisher,
    )
    .unwrap();

    let manifest =
        UpdateManifest::from_json(&fs::read_to_string(&report.manifest_path).unwrap()).unwrap();
    assert!(manifest.files.iter().all(|f| !f.path.contains("sqlModels")));
    assert!(manifest.delete.is_empty());
}
