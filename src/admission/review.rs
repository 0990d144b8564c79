//! Admission request filtering and responses.
//!
//! Requests and responses are the `kube` admission types. The object under
//! admission arrives as a [`DynamicObject`] so that nothing the API server
//! sent is lost before the pod is decoded.

use json_patch::Patch;
use kube::core::admission::{AdmissionRequest, AdmissionResponse, Operation, SerializePatchError};
use kube::core::{DynamicObject, Status};

/// An admission request carrying the raw object under admission.
pub type PodAdmissionRequest = AdmissionRequest<DynamicObject>;

/// Returns true for a CREATE of a core-group resource itself, the only
/// kind of request presets are injected on.
pub fn is_pod_creation(request: &PodAdmissionRequest) -> bool {
    request.operation == Operation::Create
        && request.resource.group.is_empty()
        && request.sub_resource.as_deref().map_or(true, str::is_empty)
}

/// Returns `namespace/name` for log output.
pub fn display_name(request: &PodAdmissionRequest) -> String {
    format!(
        "{}/{}",
        request.namespace.as_deref().unwrap_or_default(),
        request.name
    )
}

/// Admits the object unchanged.
pub fn allowed(request: &PodAdmissionRequest, reason: impl Into<String>) -> AdmissionResponse {
    let mut response = AdmissionResponse::from(request);
    response.result = Status {
        code: 200,
        message: reason.into(),
        ..Status::success()
    };
    response
}

/// Rejects the request with an error status.
pub fn errored(
    request: &PodAdmissionRequest,
    code: u16,
    message: impl Into<String>,
) -> AdmissionResponse {
    let message: String = message.into();
    let mut response = AdmissionResponse::from(request).deny(&message);
    response.result = Status::failure(&message, "").with_code(code);
    response
}

/// Admits the object with a JSON patch. An empty patch admits unchanged.
pub fn patched(
    request: &PodAdmissionRequest,
    patch: Patch,
) -> Result<AdmissionResponse, SerializePatchError> {
    if patch.0.is_empty() {
        return Ok(allowed(request, ""));
    }
    AdmissionResponse::from(request).with_patch(patch)
}
