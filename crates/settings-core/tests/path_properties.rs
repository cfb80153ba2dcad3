use proptest::prelude::*;
use settings_core::path::{get_path, set_path, unset_path};
use settings_core::{SettingValue, SettingsTree};

fn key() -> impl Strategy<Value = String> {
    "[a-c]"
}

fn leaf() -> impl Strategy<Value = SettingValue> {
    prop_oneof![
        Just(SettingValue::Null),
        any::<bool>().prop_map(SettingValue::Bool),
        any::<i64>().prop_map(SettingValue::Integer),
        "[a-z]{0,4}".prop_map(SettingValue::String),
    ]
}

fn value() -> impl Strategy<Value = SettingValue> {
    leaf().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..3).prop_map(SettingValue::Array),
            prop::collection::vec((key(), inner), 0..4)
                .prop_map(|entries| SettingValue::Object(entries.into_iter().collect())),
        ]
    })
}

fn tree() -> impl Strategy<Value = SettingsTree> {
    prop::collection::vec((key(), value()), 0..4)
        .prop_map(|entries| SettingsTree::from_inner(entries.into_iter().collect()))
}

fn dot_path() -> impl Strategy<Value = String> {
    prop::collection::vec(key(), 1..4).prop_map(|segments| segments.join("."))
}

fn parent_is_object(tree: &SettingsTree, path: &str) -> bool {
    match path.rsplit_once('.') {
        None => true,
        Some((parent, _)) => get_path(tree, parent).is_some_and(SettingValue::is_object),
    }
}

proptest! {
    #[test]
    fn unset_is_idempotent(t in tree(), k in dot_path()) {
        let once = unset_path(&t, &k);
        let twice = unset_path(&once, &k);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn set_then_unset_restores_tree(t in tree(), k in dot_path(), v in leaf()) {
        prop_assume!(get_path(&t, &k).is_none());
        prop_assume!(parent_is_object(&t, &k));

        let restored = unset_path(&set_path(&t, &k, v), &k);
        prop_assert_eq!(restored, t);
    }

    #[test]
    fn set_then_get_returns_value(t in tree(), k in dot_path(), v in value()) {
        let updated = set_path(&t, &k, v.clone());
        prop_assert_eq!(get_path(&updated, &k), Some(&v));
    }

    #[test]
    fn pure_edits_never_touch_input(t in tree(), k in dot_path(), v in leaf()) {
        let before = t.clone();
        let _ = set_path(&t, &k, v);
        let _ = unset_path(&t, &k);
        prop_assert_eq!(t, before);
    }
}
