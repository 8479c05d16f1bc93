//! Property tests over random paths and contents

use super::memory_repo;
use gitstore::FileMode;
use proptest::prelude::*;
use std::collections::BTreeMap;

fn segment() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,6}"
}

fn path() -> impl Strategy<Value = String> {
    prop::collection::vec(segment(), 1..4).prop_map(|segments| segments.join("/"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_insert_then_read(
        path in path(),
        content in prop::collection::vec(any::<u8>(), 0..256),
    ) {
        let repo = memory_repo();
        repo.insert(&path, &mut content.as_slice(), FileMode::Regular).unwrap();
        prop_assert_eq!(repo.read(&path).unwrap(), content.clone());
        prop_assert_eq!(repo.size(&path).unwrap(), content.len() as u64);
    }

    #[test]
    fn prop_remove_everything_leaves_empty_root(
        files in prop::collection::btree_map(path(), "[a-z]{0,8}", 1..8)
    ) {
        let repo = memory_repo();
        // Drop paths that would need one of the others as a directory
        let files: BTreeMap<String, String> = files
            .iter()
            .filter(|(p, _)| !files.keys().any(|other| p.starts_with(&format!("{}/", other))))
            .filter(|(p, _)| !files.keys().any(|other| other.starts_with(&format!("{}/", p))))
            .map(|(p, c)| (p.clone(), c.clone()))
            .collect();

        for (p, c) in &files {
            repo.insert(p, &mut c.as_bytes(), FileMode::Regular).unwrap();
        }
        for (p, c) in &files {
            prop_assert_eq!(repo.read(p).unwrap(), c.as_bytes().to_vec());
        }
        for p in files.keys() {
            repo.remove(p).unwrap();
        }
        prop_assert!(repo.listdir("").unwrap().is_empty());
    }
}
