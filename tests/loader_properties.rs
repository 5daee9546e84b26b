// tests/loader_properties.rs

use std::path::Path;

use proptest::prelude::*;

use patrol::config::parse_watch_points;

/// One generated entry: which of `source` / `name` it carries.
#[derive(Debug, Clone, Copy)]
struct EntryShape {
    has_source: bool,
    has_name: bool,
}

fn entry_shapes(max: usize) -> impl Strategy<Value = Vec<EntryShape>> {
    proptest::collection::vec(
        (any::<bool>(), any::<bool>()).prop_map(|(has_source, has_name)| EntryShape {
            has_source,
            has_name,
        }),
        0..max,
    )
}

fn render(shapes: &[EntryShape]) -> String {
    if shapes.is_empty() {
        return "[]\n".to_string();
    }
    let mut yaml = String::new();
    for (i, shape) in shapes.iter().enumerate() {
        // Every entry carries an unrelated key so none is empty.
        yaml.push_str(&format!("- id: {i}\n"));
        if shape.has_source {
            yaml.push_str(&format!("  source: file_{i}.txt\n"));
        }
        if shape.has_name {
            yaml.push_str(&format!("  name: point_{i}\n"));
        }
    }
    yaml
}

proptest! {
    #[test]
    fn test_each_entry_is_judged_on_its_own(shapes in entry_shapes(12)) {
        let yaml = render(&shapes);
        let entries = parse_watch_points(&yaml, Path::new("/base")).unwrap();

        prop_assert_eq!(entries.len(), shapes.len());

        for (i, (shape, entry)) in shapes.iter().zip(&entries).enumerate() {
            let expect_valid = shape.has_source && shape.has_name;
            prop_assert_eq!(entry.is_ok(), expect_valid, "entry {}", i);

            match entry {
                Ok(wp) => {
                    let expected_name = format!("point_{i}");
                    prop_assert_eq!(wp.name(), expected_name.as_str());
                    let expected_path = Path::new("/base").join(format!("file_{i}.txt"));
                    prop_assert_eq!(wp.path(), expected_path.as_path());
                }
                Err(err) => prop_assert_eq!(err.index(), i),
            }
        }
    }
}
