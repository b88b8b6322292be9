//! Property tests for path derivation and shim rendering
//!
//! These tests verify, for arbitrary install locations:
//! - The application directory is `<resources>/app`
//! - The shim never contains a backslash and names the artifact exactly

use camino::{Utf8Path, Utf8PathBuf};
use guildium_installer::models::{HostPlatform, PlatformProfile, TerminationCommand};
use guildium_installer::services::patcher::{entrypoint_source, normalize_path};
use proptest::prelude::*;

fn segments() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[A-Za-z0-9 ._()'\"-]{1,12}", 1..6)
}

fn join(root: &str, segments: &[String]) -> Utf8PathBuf {
    let mut path = Utf8PathBuf::from(root);
    for segment in segments {
        path.push(segment);
    }
    path
}

proptest! {
    #[test]
    fn application_dir_is_resources_app(resources in segments(), modification in segments()) {
        for platform in HostPlatform::ALL {
            let profile = PlatformProfile::new(
                platform,
                "Guilded",
                TerminationCommand::new("pkill", ["-x", "Guilded"]),
                join("/", &resources),
                join("/", &modification),
            );
            let expected = profile.resources_dir().join("app");
            prop_assert_eq!(profile.application_dir(), expected.as_path());

            let moved = profile.with_overrides(Some(Utf8Path::new("/elsewhere")), None);
            prop_assert_eq!(moved.application_dir().as_str(), "/elsewhere/app");
        }
    }

    #[test]
    fn shim_requires_normalized_artifact(segments in segments()) {
        let artifact = Utf8PathBuf::from(format!("C:\\{}\\guildium.asar", segments.join("\\")));

        let source = entrypoint_source(&artifact).unwrap();

        prop_assert!(source.starts_with("require(") && source.ends_with(");"));
        let literal = &source["require(".len()..source.len() - ");".len()];
        let required: String = serde_json::from_str(literal).unwrap();
        prop_assert_eq!(&required, &normalize_path(&artifact));
        prop_assert!(!required.contains('\\'));
    }
}
