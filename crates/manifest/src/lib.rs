//! Desired state for Game instances: one single-replica Deployment per game.

#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use game_core::DesiredWorkload;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{Container, ContainerPort, PodSpec, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use serde::{Deserialize, Serialize};

pub const DEFAULT_IMAGE: &str = "nginx:latest";
pub const DEFAULT_PORT: i32 = 80;
pub const REPLICAS: i32 = 1;
pub const APP_LABEL: &str = "app";
/// Annotation tying a Deployment back to the Game that owns it.
pub const OWNED_BY_ANNOTATION: &str = "game-controller/owned-by";

/// Builds desired workloads. Same settings and inputs always give an equal manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestBuilder {
    pub image: String,
    pub port: i32,
}

impl Default for ManifestBuilder {
    fn default() -> Self {
        Self { image: DEFAULT_IMAGE.to_string(), port: DEFAULT_PORT }
    }
}

impl ManifestBuilder {
    pub fn new(image: impl Into<String>, port: i32) -> Self {
        Self { image: image.into(), port }
    }

    pub fn build(&self, name: &str, namespace: &str) -> DesiredWorkload {
        DesiredWorkload {
            name: name.to_string(),
            namespace: namespace.to_string(),
            replicas: REPLICAS,
            image: self.image.clone(),
            port: self.port,
            labels: app_labels(name),
            annotations: BTreeMap::from([(OWNED_BY_ANNOTATION.to_string(), name.to_string())]),
        }
    }
}

/// Desired workload with the default image and port.
pub fn build(name: &str, namespace: &str) -> DesiredWorkload {
    ManifestBuilder::default().build(name, namespace)
}

fn app_labels(name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(APP_LABEL.to_string(), name.to_string())])
}

/// Render a desired workload as an `apps/v1` Deployment.
pub fn to_deployment(w: &DesiredWorkload) -> Deployment {
    let container = Container {
        name: w.name.clone(),
        image: Some(w.image.clone()),
        ports: Some(vec![ContainerPort { container_port: w.port, ..Default::default() }]),
        ..Default::default()
    };
    let template = PodTemplateSpec {
        metadata: Some(ObjectMeta { labels: Some(w.pod_labels().clone()), ..Default::default() }),
        spec: Some(PodSpec { containers: vec![container], ..Default::default() }),
    };
    Deployment {
        metadata: ObjectMeta {
            name: Some(w.name.clone()),
            namespace: Some(w.namespace.clone()),
            labels: Some(w.labels.clone()),
            annotations: Some(w.annotations.clone()),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(w.replicas),
            selector: LabelSelector { match_labels: Some(w.selector().clone()), ..Default::default() },
            template,
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_matches_pod_labels() {
        for name in ["g1", "tetris", "a-b-c", ""] {
            let w = build(name, "ns1");
            assert_eq!(w.selector(), w.pod_labels());
            assert_eq!(w.labels.get(APP_LABEL).map(String::as_str), Some(name));

            let d = to_deployment(&w);
            let spec = d.spec.unwrap();
            let tmpl_labels = spec.template.metadata.unwrap().labels.unwrap();
            assert_eq!(spec.selector.match_labels.unwrap(), tmpl_labels);
        }
    }

    #[test]
    fn build_is_deterministic() {
        assert_eq!(build("g1", "ns1"), build("g1", "ns1"));
        assert_eq!(to_deployment(&build("g1", "ns1")), to_deployment(&build("g1", "ns1")));
        assert_ne!(build("g1", "ns1"), build("g1", "ns2"));
    }

    #[test]
    fn defaults_and_traceability() {
        let w = build("g1", "ns1");
        assert_eq!(w.name, "g1");
        assert_eq!(w.namespace, "ns1");
        assert_eq!(w.replicas, 1);
        assert_eq!(w.image, "nginx:latest");
        assert_eq!(w.port, 80);
        assert_eq!(w.annotations.get(OWNED_BY_ANNOTATION).map(String::as_str), Some("g1"));
    }

    #[test]
    fn deployment_shape() {
        let d = to_deployment(&ManifestBuilder::new("ghcr.io/acme/arena:1.2", 8080).build("arena", "games"));
        let v = serde_json::to_value(&d).unwrap();
        assert_eq!(v["apiVersion"], "apps/v1");
        assert_eq!(v["kind"], "Deployment");
        assert_eq!(v["metadata"]["name"], "arena");
        assert_eq!(v["metadata"]["namespace"], "games");
        assert_eq!(v["metadata"]["annotations"]["game-controller/owned-by"], "arena");
        assert_eq!(v["spec"]["replicas"], 1);
        let c = &v["spec"]["template"]["spec"]["containers"][0];
        assert_eq!(c["name"], "arena");
        assert_eq!(c["image"], "ghcr.io/acme/arena:1.2");
        assert_eq!(c["ports"][0]["containerPort"], 8080);
    }
}
