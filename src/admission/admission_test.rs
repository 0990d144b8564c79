//! Tests for the admission flow.

#[cfg(test)]
mod tests {
    use json_patch::{Patch, PatchOperation};
    use kube::core::admission::{AdmissionReview, Operation};
    use kube::core::{DynamicObject, Selector};
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::io;
    use std::sync::{Arc, Mutex};

    use crate::admission::{
        Exclusion, LookupError, MutationOutcome, PodAdmissionRequest, PodPresetMutator,
        PresetStore, MIRROR_POD_ANNOTATION, OPT_OUT_ANNOTATION,
    };
    use crate::api::{
        EnvVar, LabelSelector, LabelSelectorRequirement, ObjectMetaExt, Pod, PodPreset, Volume,
        VolumeMount,
    };
    use crate::inject::provenance_key;

    fn pod(annotations: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {
                "generateName": "web-",
                "namespace": "shop",
                "labels": {"app": "web"},
                "annotations": annotations
            },
            "spec": {"containers": [{"name": "app", "env": [{"name": "FOO", "value": "a"}]}]}
        })
    }

    fn request_json(object: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "uid": "req-1",
            "kind": {"group": "", "version": "v1", "kind": "Pod"},
            "resource": {"group": "", "version": "v1", "resource": "pods"},
            "namespace": "shop",
            "operation": "CREATE",
            "userInfo": {"username": "alice"},
            "object": object
        })
    }

    fn request(object: serde_json::Value) -> PodAdmissionRequest {
        serde_json::from_value(request_json(object)).unwrap()
    }

    fn env_preset(name: &str, selector: LabelSelector, env: Vec<EnvVar>) -> PodPreset {
        let mut preset = PodPreset::new(name);
        preset.metadata.namespace = Some("shop".to_string());
        preset.metadata.resource_version = Some("5".to_string());
        preset.spec.selector = selector;
        preset.spec.env = env;
        preset
    }

    fn web() -> LabelSelector {
        Selector::from_iter([("app", "web")]).into()
    }

    fn store(presets: Vec<PodPreset>) -> PresetStore {
        PresetStore::from_presets(presets, "default")
    }

    fn decode(pod: serde_json::Value) -> Pod {
        serde_json::from_value(pod).unwrap()
    }

    fn decode_patch(bytes: &[u8]) -> Patch {
        serde_json::from_slice(bytes).unwrap()
    }

    #[test]
    fn test_matching_presets_are_applied() {
        let mutator = PodPresetMutator::new(store(vec![
            env_preset("proxy", web(), vec![EnvVar::new("HTTP_PROXY", "http://proxy")]),
            env_preset(
                "other",
                Selector::from_iter([("app", "db")]).into(),
                vec![EnvVar::new("DB", "1")],
            ),
        ]));

        let outcome = mutator.mutate("shop", &decode(pod(serde_json::json!({})))).unwrap();

        let MutationOutcome::Applied { pod, presets } = outcome else {
            panic!("expected presets to be applied");
        };
        assert_eq!(presets, vec!["proxy".to_string()]);
        assert_eq!(
            pod.spec.containers[0].env,
            Some(vec![
                EnvVar::new("FOO", "a"),
                EnvVar::new("HTTP_PROXY", "http://proxy"),
            ])
        );
        assert_eq!(pod.metadata.annotation(&provenance_key("proxy")), Some("5"));
    }

    #[test]
    fn test_exclusions_skip_lookup() {
        let lookup_calls = Cell::new(0);
        let lookup = |_: &str| -> Result<Vec<PodPreset>, LookupError> {
            lookup_calls.set(lookup_calls.get() + 1);
            Ok(Vec::new())
        };
        let mutator = PodPresetMutator::new(lookup);

        let mirror = decode(pod(serde_json::json!({MIRROR_POD_ANNOTATION: "abc"})));
        assert_eq!(
            mutator.mutate("shop", &mirror).unwrap(),
            MutationOutcome::Excluded(Exclusion::MirrorPod)
        );

        let opted_out = decode(pod(serde_json::json!({OPT_OUT_ANNOTATION: "true"})));
        assert_eq!(
            mutator.mutate("shop", &opted_out).unwrap(),
            MutationOutcome::Excluded(Exclusion::OptOut)
        );
        assert_eq!(lookup_calls.get(), 0);

        let not_opted_out = decode(pod(serde_json::json!({OPT_OUT_ANNOTATION: "false"})));
        assert_eq!(
            mutator.mutate("shop", &not_opted_out).unwrap(),
            MutationOutcome::Unmatched
        );
        assert_eq!(lookup_calls.get(), 1);
    }

    #[test]
    fn test_conflict_fails_open() {
        let mutator = PodPresetMutator::new(store(vec![env_preset(
            "P1",
            web(),
            vec![EnvVar::new("FOO", "z")],
        )]));

        let response = mutator.handle(&request(pod(serde_json::json!({}))));
        assert!(response.allowed);
        assert_eq!(response.patch, None);

        let outcome = mutator.mutate("shop", &decode(pod(serde_json::json!({})))).unwrap();
        let MutationOutcome::Conflicted { presets, conflicts } = outcome else {
            panic!("expected a conflict");
        };
        assert_eq!(presets, vec!["P1".to_string()]);
        assert_eq!(conflicts.len(), 1);
    }

    #[test]
    fn test_conflicted_outcome_keeps_original_pod() {
        let original = decode(pod(serde_json::json!({})));
        let outcome = MutationOutcome::Conflicted {
            presets: vec!["P1".to_string()],
            conflicts: Default::default(),
        };
        assert_eq!(outcome.into_pod(original.clone()), original);
    }

    #[test]
    fn test_handle_emits_patch() {
        let mutator = PodPresetMutator::new(store(vec![env_preset(
            "proxy",
            web(),
            vec![EnvVar::new("HTTP_PROXY", "http://proxy")],
        )]));

        let response = mutator.handle(&request(pod(serde_json::json!({}))));

        assert!(response.allowed);
        assert_eq!(response.uid, "req-1");
        let wire = serde_json::to_value(&response).unwrap();
        assert_eq!(wire["patchType"], "JSONPatch");

        let patch = decode_patch(response.patch.as_deref().unwrap());
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            serde_json::json!([
                {
                    "op": "add",
                    "path": "/metadata/annotations/podpreset.admission.kubernetes.io~1podpreset-proxy",
                    "value": "5"
                },
                {
                    "op": "add",
                    "path": "/spec/containers/0/env/1",
                    "value": {"name": "HTTP_PROXY", "value": "http://proxy"}
                }
            ])
        );
    }

    fn pod_with_unmodelled_fields() -> serde_json::Value {
        serde_json::json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {"generateName": "web-", "namespace": "shop", "labels": {"app": "web"}},
            "spec": {
                "containers": [{
                    "name": "app",
                    "image": "nginx:1.25",
                    "env": [{
                        "name": "CA",
                        "valueFrom": {"fileKeyRef": {"volumeName": "certs", "path": "ca.env", "key": "CA"}}
                    }],
                    "volumeMounts": [{
                        "name": "data",
                        "mountPath": "/data",
                        "subPathExpr": "$(POD_NAME)",
                        "recursiveReadOnly": "IfPossible",
                        "readOnly": true
                    }]
                }],
                "volumes": [{"name": "data", "emptyDir": {}}]
            }
        })
    }

    fn logs_preset() -> PodPreset {
        let mut preset = env_preset("logs", web(), vec![EnvVar::new("G", "1")]);
        preset.spec.volumes = vec![Volume::empty_dir("logs")];
        preset.spec.volume_mounts = vec![VolumeMount::new("logs", "/var/log/app")];
        preset
    }

    #[test]
    fn test_patch_leaves_existing_entries_untouched() {
        let raw = pod_with_unmodelled_fields();
        let mutator = PodPresetMutator::new(store(vec![logs_preset()]));

        let response = mutator.handle(&request(raw.clone()));

        assert!(response.allowed);
        let patch = decode_patch(response.patch.as_deref().unwrap());
        assert!(patch.0.iter().all(|op| matches!(op, PatchOperation::Add(_))));

        let mut patched = raw.clone();
        json_patch::patch(&mut patched, &patch).unwrap();

        let container = &patched["spec"]["containers"][0];
        let original = &raw["spec"]["containers"][0];
        assert_eq!(container["env"][0], original["env"][0]);
        assert_eq!(container["volumeMounts"][0], original["volumeMounts"][0]);
        assert_eq!(patched["spec"]["volumes"][0], raw["spec"]["volumes"][0]);
        assert_eq!(
            container["volumeMounts"][1],
            serde_json::json!({"name": "logs", "mountPath": "/var/log/app"})
        );
        assert_eq!(container["env"][1], serde_json::json!({"name": "G", "value": "1"}));
    }

    #[test]
    fn test_patched_object_matches_mutated_pod() {
        let raw = pod_with_unmodelled_fields();
        let mutator = PodPresetMutator::new(store(vec![logs_preset()]));

        let response = mutator.handle(&request(raw.clone()));
        let mut patched = raw.clone();
        json_patch::patch(&mut patched, &decode_patch(response.patch.as_deref().unwrap()))
            .unwrap();

        let mutated = mutator
            .mutate("shop", &decode(raw.clone()))
            .unwrap()
            .into_pod(decode(raw));
        assert_eq!(patched, serde_json::to_value(&mutated).unwrap());
    }

    #[test]
    fn test_exclusion_reason_is_reported() {
        let mutator = PodPresetMutator::new(store(vec![env_preset("p", web(), Vec::new())]));
        let response = mutator.handle(&request(pod(serde_json::json!({MIRROR_POD_ANNOTATION: "x"}))));
        assert!(response.allowed);
        assert_eq!(response.result.message, "Mirror Pod");
    }

    #[test]
    fn test_non_create_requests_are_ignored() {
        let mutator = PodPresetMutator::new(store(vec![env_preset(
            "p",
            web(),
            vec![EnvVar::new("A", "1")],
        )]));
        let mut update = request(pod(serde_json::json!({})));
        update.operation = Operation::Update;

        let response = mutator.handle(&update);

        assert!(response.allowed);
        assert_eq!(response.patch, None);
    }

    #[test]
    fn test_malformed_pod_is_client_error() {
        let mutator = PodPresetMutator::new(store(Vec::new()));
        let response = mutator.handle(&request(serde_json::json!({"spec": {"containers": "nope"}})));
        assert!(!response.allowed);
        assert_eq!(response.result.code, 400);
    }

    #[test]
    fn test_missing_object_is_client_error() {
        let mutator = PodPresetMutator::new(store(Vec::new()));
        let mut missing = request(pod(serde_json::json!({})));
        missing.object = None;

        let response = mutator.handle(&missing);

        assert!(!response.allowed);
        assert_eq!(response.result.code, 400);
    }

    #[test]
    fn test_lookup_failure_is_server_error() {
        let mutator = PodPresetMutator::new(|ns: &str| -> Result<Vec<PodPreset>, LookupError> {
            Err(LookupError::new(ns, "connection refused"))
        });
        let response = mutator.handle(&request(pod(serde_json::json!({}))));
        assert!(!response.allowed);
        assert_eq!(response.result.code, 500);
        assert!(response.result.message.contains("connection refused"));
    }

    #[test]
    fn test_invalid_selector_is_server_error() {
        let broken = LabelSelector {
            match_expressions: Some(vec![LabelSelectorRequirement {
                key: "tier".to_string(),
                operator: "Near".to_string(),
                values: Some(vec!["web".to_string()]),
            }]),
            ..Default::default()
        };
        let mutator = PodPresetMutator::new(store(vec![env_preset("broken", broken, Vec::new())]));

        let response = mutator.handle(&request(pod(serde_json::json!({}))));

        assert!(!response.allowed);
        assert_eq!(response.result.code, 500);
        assert!(response.result.message.contains("broken"));
    }

    #[test]
    fn test_review_round_trip() {
        let mutator = PodPresetMutator::new(store(Vec::new()));
        let review: AdmissionReview<DynamicObject> = serde_json::from_value(serde_json::json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "request": request_json(pod(serde_json::json!({})))
        }))
        .unwrap();

        let answered = mutator.review(review);

        assert!(answered.request.is_none());
        let response = answered.response.unwrap();
        assert_eq!(response.uid, "req-1");
        assert!(response.allowed);

        let empty: AdmissionReview<DynamicObject> = serde_json::from_value(serde_json::json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview"
        }))
        .unwrap();
        assert!(!mutator.review(empty).response.unwrap().allowed);
    }

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_conflicts_are_logged_to_injected_dispatch() {
        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let mutator = PodPresetMutator::new(store(vec![env_preset(
            "P1",
            web(),
            vec![EnvVar::new("FOO", "z")],
        )]))
        .with_dispatch(tracing::Dispatch::new(subscriber));

        let _ = mutator.mutate("shop", &decode(pod(serde_json::json!({})))).unwrap();

        let output = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("conflict occurred while applying podpresets"));
        assert!(output.contains("P1"));
    }
}
