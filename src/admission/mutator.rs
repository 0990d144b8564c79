//! The PodPreset mutator.

use kube::core::admission::{AdmissionResponse, AdmissionReview};
use kube::core::DynamicObject;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, error, info, info_span, warn, Dispatch};

use super::{
    allowed, display_name, errored, is_pod_creation, patched, PodAdmissionRequest, PresetLookup,
};
use crate::api::{ObjectMetaExt, Pod, PodPreset};
use crate::error::AdmissionError;
use crate::inject::probe;
use crate::merge::Conflicts;
use crate::selector::{LabelSelectorMatcher, SelectorMatcher};

/// Annotation marking a static pod mirrored by the kubelet.
pub const MIRROR_POD_ANNOTATION: &str = "kubernetes.io/config.mirror";

/// Annotation by which a pod opts out of preset injection.
pub const OPT_OUT_ANNOTATION: &str = "podpreset.admission.kubernetes.io/exclude";

/// Exclusion is a reason a pod is never considered for injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    MirrorPod,
    OptOut,
}

impl Exclusion {
    /// Checks the exclusion markers of a pod.
    pub fn of(pod: &Pod) -> Option<Exclusion> {
        if pod.metadata.annotation(MIRROR_POD_ANNOTATION).is_some() {
            return Some(Exclusion::MirrorPod);
        }
        if pod.metadata.annotation(OPT_OUT_ANNOTATION) == Some("true") {
            return Some(Exclusion::OptOut);
        }
        None
    }
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exclusion::MirrorPod => f.write_str("Mirror Pod"),
            Exclusion::OptOut => f.write_str("Exclusion Annotation Present"),
        }
    }
}

/// MutationOutcome is the result of running a pod through the mutator.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    /// The pod carries an exclusion marker; no preset was looked up.
    Excluded(Exclusion),
    /// No preset in scope selects the pod.
    Unmatched,
    /// Matching presets conflict; the pod must be admitted unchanged.
    Conflicted {
        presets: Vec<String>,
        conflicts: Conflicts,
    },
    /// Every matching preset was injected.
    Applied { pod: Pod, presets: Vec<String> },
}

impl MutationOutcome {
    /// Returns the pod to admit: the mutated pod when presets were applied,
    /// otherwise `original`.
    pub fn into_pod(self, original: Pod) -> Pod {
        match self {
            MutationOutcome::Applied { pod, .. } => pod,
            _ => original,
        }
    }
}

/// PodPresetMutator injects the presets selecting a pod at admission time.
///
/// Log output goes to the injected dispatcher when one is set, and to the
/// caller's current dispatcher otherwise.
pub struct PodPresetMutator<L, M = LabelSelectorMatcher> {
    lookup: L,
    matcher: M,
    dispatch: Option<Dispatch>,
}

impl<L: PresetLookup> PodPresetMutator<L, LabelSelectorMatcher> {
    /// Creates a mutator evaluating selectors with Kubernetes semantics.
    pub fn new(lookup: L) -> Self {
        PodPresetMutator::with_matcher(lookup, LabelSelectorMatcher)
    }
}

impl<L: PresetLookup, M: SelectorMatcher> PodPresetMutator<L, M> {
    pub fn with_matcher(lookup: L, matcher: M) -> Self {
        PodPresetMutator {
            lookup,
            matcher,
            dispatch: None,
        }
    }

    /// Routes this mutator's log output to `dispatch`.
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    fn logged<T>(&self, f: impl FnOnce() -> T) -> T {
        match &self.dispatch {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, f),
            None => f(),
        }
    }

    /// Answers an AdmissionReview.
    pub fn review(&self, review: AdmissionReview<DynamicObject>) -> AdmissionReview<DynamicObject> {
        let request: PodAdmissionRequest = match review.try_into() {
            Ok(request) => request,
            Err(e) => {
                self.logged(|| error!(error = %e, "failed to parse admission request"));
                return AdmissionResponse::invalid(e.to_string()).into_review();
            }
        };
        self.handle(&request).into_review()
    }

    /// Handles one admission request.
    pub fn handle(&self, request: &PodAdmissionRequest) -> AdmissionResponse {
        self.logged(|| {
            let span = info_span!("podpreset-webhook", pod = %display_name(request), uid = %request.uid);
            let _enter = span.enter();

            if !is_pod_creation(request) {
                return allowed(request, "");
            }

            match self.admit(request) {
                Ok(response) => response,
                Err(e) => {
                    warn!(error = %e, "admission failed");
                    errored(request, e.status_code(), e.to_string())
                }
            }
        })
    }

    /// Decodes the pod, runs it through [`mutate`](Self::mutate) and, when
    /// presets were applied, answers with the JSON patch between the object
    /// as received and the re-encoded mutated pod.
    fn admit(&self, request: &PodAdmissionRequest) -> Result<AdmissionResponse, AdmissionError> {
        let object = request.object.as_ref().ok_or(AdmissionError::MissingObject)?;
        let original = serde_json::to_value(object).map_err(AdmissionError::Encode)?;
        let pod: Pod = serde_json::from_value(original.clone()).map_err(AdmissionError::Decode)?;

        let namespace = match request.namespace.as_deref() {
            Some(ns) if !ns.is_empty() => ns.to_string(),
            _ => pod.metadata.namespace().to_string(),
        };

        match self.mutate(&namespace, &pod)? {
            MutationOutcome::Excluded(exclusion) => Ok(allowed(request, exclusion.to_string())),
            MutationOutcome::Applied { pod: mutated, .. } => {
                let mutated = serde_json::to_value(&mutated).map_err(AdmissionError::Encode)?;
                Ok(patched(request, json_patch::diff(&original, &mutated))?)
            }
            MutationOutcome::Unmatched | MutationOutcome::Conflicted { .. } => {
                Ok(allowed(request, ""))
            }
        }
    }

    /// Runs a decoded pod through exclusion checks, preset lookup, selector
    /// filtering, conflict probing and, when clean, injection.
    pub fn mutate(&self, namespace: &str, pod: &Pod) -> Result<MutationOutcome, AdmissionError> {
        self.logged(|| -> Result<MutationOutcome, AdmissionError> {
            if let Some(exclusion) = Exclusion::of(pod) {
                debug!(pod = %pod.display_name(), reason = %exclusion, "skipping excluded pod");
                return Ok(MutationOutcome::Excluded(exclusion));
            }

            let presets = self.matching_presets(namespace, pod)?;
            if presets.is_empty() {
                debug!(pod = %pod.display_name(), "no podpresets match");
                return Ok(MutationOutcome::Unmatched);
            }

            let names: Vec<String> = presets.iter().map(|p| p.name().to_string()).collect();

            match probe(pod, &presets) {
                Ok(plan) => {
                    info!(
                        pod = %pod.display_name(),
                        presets = %names.join(","),
                        "applying podpresets"
                    );
                    Ok(MutationOutcome::Applied {
                        pod: plan.apply(pod.clone()),
                        presets: names,
                    })
                }
                Err(conflicts) => {
                    warn!(
                        pod = %pod.display_name(),
                        presets = %names.join(","),
                        conflicts = conflicts.len(),
                        error = %conflicts,
                        "conflict occurred while applying podpresets"
                    );
                    Ok(MutationOutcome::Conflicted {
                        presets: names,
                        conflicts,
                    })
                }
            }
        })
    }

    /// Lists the presets of `namespace` and keeps those selecting `pod`.
    pub fn matching_presets(
        &self,
        namespace: &str,
        pod: &Pod,
    ) -> Result<Vec<PodPreset>, AdmissionError> {
        let labels: BTreeMap<String, String> = pod.metadata.labels();
        let mut matching = Vec::new();

        for preset in self.lookup.list(namespace)? {
            let selected = self
                .matcher
                .matches(&preset.spec.selector, &labels)
                .map_err(|source| AdmissionError::Selector {
                    preset: preset.name().to_string(),
                    source,
                })?;
            if selected {
                matching.push(preset);
            }
        }

        Ok(matching)
    }
}
