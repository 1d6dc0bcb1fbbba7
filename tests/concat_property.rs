// tests/concat_property.rs

use std::collections::BTreeMap;
use std::fs;

use proptest::prelude::*;
use tempfile::TempDir;

use assetpipe::pipeline::{collect_sources, concat, Asset};

fn line() -> impl Strategy<Value = String> {
    "[a-z;() ]{0,12}"
}

// Distinct file names with their contents, in a shuffled write order.
fn files() -> impl Strategy<Value = Vec<(String, String)>> {
    proptest::collection::btree_map("[a-z]{1,6}", line(), 1..8)
        .prop_map(|m: BTreeMap<String, String>| m.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

proptest! {
    #[test]
    fn concat_is_the_ordered_join(contents in proptest::collection::vec(line(), 1..10)) {
        let assets: Vec<Asset> = contents
            .iter()
            .enumerate()
            .map(|(i, c)| Asset::new(format!("{i}.js"), c.as_bytes()))
            .collect();

        let joined = concat(&assets, "app.js", "\n").expect("non-empty input");
        prop_assert_eq!(joined.path.to_str(), Some("app.js"));
        prop_assert_eq!(String::from_utf8(joined.contents).unwrap(), contents.join("\n"));

        let raw = concat(&assets, "app.js", "").expect("non-empty input");
        prop_assert_eq!(String::from_utf8(raw.contents).unwrap(), contents.concat());
    }

    #[test]
    fn trailing_newlines_are_not_doubled(contents in proptest::collection::vec(line(), 1..10)) {
        let assets: Vec<Asset> = contents
            .iter()
            .map(|c| Asset::new("x.js", format!("{c}\n")))
            .collect();

        let joined = concat(&assets, "app.js", "\n").expect("non-empty input");
        let expected: String = contents.iter().map(|c| format!("{c}\n")).collect();
        prop_assert_eq!(String::from_utf8(joined.contents).unwrap(), expected);
    }

    #[test]
    fn glob_order_does_not_depend_on_write_order(files in files()) {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("js")).unwrap();
        for (name, body) in &files {
            fs::write(dir.path().join("js").join(format!("{name}.js")), body).unwrap();
        }

        let entries = collect_sources(dir.path(), &["js/*.js".to_string()], None).unwrap();
        let assets: Vec<Asset> = entries
            .iter()
            .map(|e| Asset::new(e.relative.clone(), fs::read(&e.path).unwrap()))
            .collect();
        let joined = concat(&assets, "app.js", "\n").expect("at least one file");

        let mut sorted = files.clone();
        sorted.sort();
        let expected = sorted
            .iter()
            .map(|(_, body)| body.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        prop_assert_eq!(String::from_utf8(joined.contents).unwrap(), expected);
    }
}
