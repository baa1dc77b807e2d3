// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

//! Unit tests for admission-webhook.
//!
//! These tests exercise the public validation API (validators, chains,
//! registry) on typed manifests without any HTTP layer.

#[path = "../common/mod.rs"]
mod common;

mod kind_tests {
    use admission_webhook::KindIdentity;

    #[test]
    fn test_canonical_keys() {
        assert_eq!(KindIdentity::core("v1", "Pod").to_string(), "/v1/Pod");
        assert_eq!(
            KindIdentity::new("apps", "v1", "StatefulSet").to_string(),
            "apps/v1/StatefulSet"
        );
        assert_eq!(
            KindIdentity::new("batch", "v1", "CronJob").registry_key(),
            "batch/v1/CronJob"
        );
    }
}

mod validator_tests {
    use crate::common::fixtures::{ContainerBuilder, compliant_container, pod, statefulset};
    use admission_webhook::webhooks::Validator;
    use admission_webhook::webhooks::policies::{
        ImageTagValidator, PodSpecLocation, PullPolicyValidator, ResourceRequirementsValidator,
    };

    #[test]
    fn test_compliant_statefulset_passes_every_validator() {
        let object = statefulset("web", vec![compliant_container("app")]);
        let location = PodSpecLocation::PodTemplate;
        let validators: Vec<Box<dyn Validator>> = vec![
            Box::new(ImageTagValidator::new(location)),
            Box::new(PullPolicyValidator::new(location)),
            Box::new(ResourceRequirementsValidator::new(location)),
        ];
        for validator in validators {
            let result = validator.validate(&object);
            assert!(result.valid, "{} rejected a compliant object", validator.name());
            assert!(result.errors.is_empty());
        }
    }

    #[test]
    fn test_image_tag_on_bare_pod() {
        let object = pod(
            "p",
            vec![
                ContainerBuilder::new("a").image("nginx").build(),
                ContainerBuilder::new("b").image("nginx:latest").build(),
            ],
        );
        let result = ImageTagValidator::new(PodSpecLocation::Pod).validate(&object);
        assert_eq!(
            result.errors,
            vec![
                "Container a does not have image tag set",
                "Container b uses image with 'latest' tag",
            ]
        );
    }

    #[test]
    fn test_requests_missing_reported_once_per_container() {
        let object = statefulset(
            "web",
            vec![
                ContainerBuilder::new("a").empty_resources().build(),
                ContainerBuilder::new("b").empty_resources().build(),
            ],
        );
        let result =
            ResourceRequirementsValidator::new(PodSpecLocation::PodTemplate).validate(&object);
        let request_errors: Vec<_> = result
            .errors
            .iter()
            .filter(|e| e.ends_with("does not have resource requests set"))
            .collect();
        assert_eq!(
            request_errors,
            vec![
                "Container a does not have resource requests set",
                "Container b does not have resource requests set",
            ]
        );
    }

    #[test]
    fn test_limits_only_has_no_request_violation() {
        let object = statefulset(
            "web",
            vec![ContainerBuilder::new("a").limits("1", "1Gi").build()],
        );
        let result =
            ResourceRequirementsValidator::new(PodSpecLocation::PodTemplate).validate(&object);
        assert!(result.valid);
        assert!(result.errors.iter().all(|e| !e.contains("requests")));
    }

    #[test]
    fn test_partial_requests_with_full_limits() {
        let object = statefulset(
            "web",
            vec![
                ContainerBuilder::new("a")
                    .limits("1", "1Gi")
                    .request("cpu", "100m")
                    .build(),
            ],
        );
        let result =
            ResourceRequirementsValidator::new(PodSpecLocation::PodTemplate).validate(&object);
        assert_eq!(
            result.errors,
            vec!["Container a does not have memory requests set"]
        );
    }
}

mod chain_tests {
    use crate::common::fixtures::{ContainerBuilder, compliant_container, statefulset};
    use admission_webhook::webhooks::policies::PodSpecLocation;
    use admission_webhook::webhooks::registry::workload_chain;

    #[test]
    fn test_scenario_untagged_image_without_resources() {
        let object = statefulset(
            "web",
            vec![ContainerBuilder::new("nginx").image("nginx").build()],
        );
        let result = workload_chain(PodSpecLocation::PodTemplate).validate(&object);
        assert!(!result.valid);
        assert_eq!(
            result.errors,
            vec![
                "Container nginx does not have image tag set",
                "Container nginx does not have resource requirements set",
            ]
        );
    }

    #[test]
    fn test_scenario_latest_and_always_with_limits() {
        let object = statefulset(
            "web",
            vec![
                ContainerBuilder::new("nginx")
                    .image("nginx:latest")
                    .pull_policy("Always")
                    .limits("1", "1Gi")
                    .build(),
            ],
        );
        let result = workload_chain(PodSpecLocation::PodTemplate).validate(&object);
        assert!(!result.valid);
        assert_eq!(
            result.errors,
            vec![
                "Container nginx uses image with 'latest' tag",
                "Container nginx uses imagePullPolicy 'Always'",
            ]
        );
    }

    #[test]
    fn test_scenario_fully_compliant() {
        let object = statefulset("web", vec![compliant_container("nginx")]);
        let result = workload_chain(PodSpecLocation::PodTemplate).validate(&object);
        assert!(result.valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_errors_grouped_by_validator_then_container() {
        let object = statefulset(
            "web",
            vec![
                ContainerBuilder::new("a").image("a").pull_policy("Always").build(),
                ContainerBuilder::new("b").image("b").pull_policy("Always").build(),
            ],
        );
        let result = workload_chain(PodSpecLocation::PodTemplate).validate(&object);
        assert_eq!(
            result.errors,
            vec![
                "Container a does not have image tag set",
                "Container b does not have image tag set",
                "Container a uses imagePullPolicy 'Always'",
                "Container b uses imagePullPolicy 'Always'",
                "Container a does not have resource requirements set",
                "Container b does not have resource requirements set",
            ]
        );
    }

    #[test]
    fn test_malformed_object_runs_every_validator() {
        let object = serde_json::json!({"kind": "StatefulSet", "spec": {"replicas": 3}});
        let result = workload_chain(PodSpecLocation::PodTemplate).validate(&object);
        assert!(!result.valid);
        assert_eq!(
            result.errors,
            vec![
                "Cannot check image tags: spec.template.spec.containers is missing",
                "Cannot check image pull policies: spec.template.spec.containers is missing",
                "Cannot check resource requirements: spec.template.spec.containers is missing",
            ]
        );
    }
}

mod registry_tests {
    use crate::common::fixtures::{
        compliant_container, cronjob, daemonset, deployment, job, pod, replicaset, statefulset,
    };
    use admission_webhook::{KindIdentity, Registry};

    #[test]
    fn test_every_builtin_kind_accepts_compliant_manifest() {
        let registry = Registry::builtin();
        let cases = [
            (KindIdentity::core("v1", "Pod"), pod("p", vec![compliant_container("c")])),
            (
                KindIdentity::new("apps", "v1", "Deployment"),
                deployment("d", vec![compliant_container("c")]),
            ),
            (
                KindIdentity::new("apps", "v1", "StatefulSet"),
                statefulset("s", vec![compliant_container("c")]),
            ),
            (
                KindIdentity::new("apps", "v1", "ReplicaSet"),
                replicaset("r", vec![compliant_container("c")]),
            ),
            (
                KindIdentity::new("apps", "v1", "DaemonSet"),
                daemonset("ds", vec![compliant_container("c")]),
            ),
            (
                KindIdentity::new("batch", "v1", "Job"),
                job("j", vec![compliant_container("c")]),
            ),
            (
                KindIdentity::new("batch", "v1", "CronJob"),
                cronjob("cj", vec![compliant_container("c")]),
            ),
        ];

        for (kind, object) in cases {
            let chain = registry.lookup(&kind).expect("builtin kind registered");
            let result = chain.validate(&object);
            assert!(result.valid, "{} rejected: {:?}", kind, result.errors);
        }
    }

    #[test]
    fn test_pod_chain_does_not_read_pod_template() {
        let registry = Registry::builtin();
        let chain = registry.lookup(&KindIdentity::core("v1", "Pod")).unwrap();
        let object = statefulset("s", vec![compliant_container("c")]);
        assert!(!chain.validate(&object).valid);
    }
}
