//! 設定値のパス参照（`config get`）
//!
//! `cluster.name` や `machines[0].spec.privileged` のようなパスで
//! 設定の一部を取り出します。キーの大文字・小文字は区別しません。

use crate::error::{CoreError, Result};
use crate::model::ClusterSpec;
use serde_json::Value;

fn is_separator(c: char) -> bool {
    matches!(c, '.' | '[' | ']' | '"')
}

impl ClusterSpec {
    /// パスで指定された設定値を取得
    pub fn get_value(&self, path: &str) -> Result<Value> {
        let mut current = serde_json::to_value(self)?;

        for key in path.split(is_separator).filter(|k| !k.is_empty()) {
            current = match current {
                Value::Object(map) => map
                    .into_iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(key))
                    .map(|(_, value)| value)
                    .ok_or_else(|| CoreError::UnknownKey {
                        path: path.to_string(),
                        key: key.to_string(),
                    })?,
                Value::Array(items) => {
                    let index: usize = key.parse().map_err(|_| CoreError::InvalidIndex {
                        path: path.to_string(),
                        key: key.to_string(),
                    })?;
                    items
                        .into_iter()
                        .nth(index)
                        .ok_or_else(|| CoreError::InvalidIndex {
                            path: path.to_string(),
                            key: key.to_string(),
                        })?
                }
                _ => {
                    return Err(CoreError::UnknownKey {
                        path: path.to_string(),
                        key: key.to_string(),
                    });
                }
            };
        }

        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MachineSpec, MachineTemplate};

    fn config() -> ClusterSpec {
        let mut spec = ClusterSpec::default();
        spec.cluster.name = "clustername".to_string();
        spec.machines = vec![MachineTemplate {
            count: 3,
            spec: MachineSpec {
                name: "myName%d".to_string(),
                image: "myImage".to_string(),
                privileged: true,
                ..Default::default()
            },
        }];
        spec
    }

    #[test]
    fn test_get_simple_string() {
        let value = config().get_value("cluster.name").unwrap();
        assert_eq!(value, Value::String("clustername".to_string()));
    }

    #[test]
    fn test_get_array_element() {
        let value = config().get_value("machines[0].spec").unwrap();
        assert_eq!(value["image"], "myImage");
        assert_eq!(value["name"], "myName%d");
    }

    #[test]
    fn test_get_is_case_insensitive() {
        let value = config().get_value("machines[0].spec.Privileged").unwrap();
        assert_eq!(value, Value::Bool(true));

        let count = config().get_value("Machines[0].Count").unwrap();
        assert_eq!(count, Value::from(3));
    }

    #[test]
    fn test_get_empty_path_returns_everything() {
        let value = config().get_value("").unwrap();
        assert!(value.get("cluster").is_some());
        assert!(value.get("machines").is_some());
    }

    #[test]
    fn test_get_unknown_key() {
        let result = config().get_value("cluster.unknown");
        assert!(matches!(result, Err(CoreError::UnknownKey { .. })));
    }

    #[test]
    fn test_get_bad_index() {
        assert!(matches!(
            config().get_value("machines[x]"),
            Err(CoreError::InvalidIndex { .. })
        ));
        assert!(matches!(
            config().get_value("machines[5]"),
            Err(CoreError::InvalidIndex { .. })
        ));
    }
}
