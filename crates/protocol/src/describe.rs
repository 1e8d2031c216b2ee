//! Static capability metadata returned for `describe`

use crate::message::{DescribeResponse, Namespace, Var};
use std::collections::BTreeMap;

/// Namespace the pod's vars live in
pub const NAMESPACE: &str = "pod.babashka.filewatcher";

/// Var creating a watcher
pub const WATCH_VAR: &str = "watch*";

/// Var cancelling a watcher
pub const UNWATCH_VAR: &str = "unwatch";

/// Client-side wrapper evaluated by the host. It invokes `watch*` and routes
/// every message on the invoke channel to the user's callback.
const WATCH_CODE: &str = r#"
(defn watch
  ([path cb]
   (watch path cb {}))
  ([path cb opts]
   (babashka.pods/invoke
     "pod.babashka.filewatcher"
     'pod.babashka.filewatcher/watch*
     [path opts]
     {:handlers {:success (fn [event]
                            (cb (update event :type keyword)))
                 :error   (fn [{:keys [:ex-message :ex-data]}]
                            (binding [*out* *err*]
                              (println "ERROR:" ex-message)))}})
   nil))"#;

/// Build the describe reply
pub fn describe() -> DescribeResponse {
    let mut ops = BTreeMap::new();
    ops.insert("shutdown".to_string(), BTreeMap::new());

    DescribeResponse {
        format: "json".to_string(),
        namespaces: vec![Namespace {
            name: NAMESPACE.to_string(),
            vars: vec![
                Var {
                    name: "watch".to_string(),
                    code: Some(WATCH_CODE.to_string()),
                },
                Var {
                    name: WATCH_VAR.to_string(),
                    code: None,
                },
                Var {
                    name: UNWATCH_VAR.to_string(),
                    code: None,
                },
            ],
        }],
        ops,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Outbound;

    #[test]
    fn test_describe_lists_vars() {
        let describe = describe();
        assert_eq!(describe.format, "json");
        assert!(describe.ops.contains_key("shutdown"));

        let names: Vec<&str> = describe.namespaces[0]
            .vars
            .iter()
            .map(|v| v.name.as_str())
            .collect();
        assert_eq!(names, ["watch", "watch*", "unwatch"]);
    }

    #[test]
    fn test_describe_encodes() {
        let bytes = Outbound::Describe(describe()).encode().unwrap();
        let decoded: DescribeResponse = serde_bencode::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.namespaces[0].name, NAMESPACE);
        assert!(decoded.namespaces[0].vars[0]
            .code
            .as_deref()
            .is_some_and(|code| code.contains("watch*")));
        assert_eq!(decoded.namespaces[0].vars[1].code, None);
    }
}
