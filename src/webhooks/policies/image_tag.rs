//! Image tag policy.
//!
//! Every container image must name an explicit tag, and that tag must not be
//! `latest`. A digest pins the image, but `latest` is rejected even when a
//! digest follows it (`nginx:latest@sha256:...`).

use super::{ManifestObject, PodSpecLocation, ValidationResult, Validator, check_containers};

/// Tag state of an image reference
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageTag<'a> {
    /// No tag (`nginx`, `registry:5000/nginx`)
    Missing,
    /// The floating `latest` tag
    Latest,
    /// An explicit tag other than `latest`
    Tagged(&'a str),
    /// Pinned by content digest (`nginx@sha256:...`)
    Digest,
}

/// Classify an image reference.
///
/// Any `@digest` suffix is split off first. The tag is whatever follows the
/// last `:` of the remainder, unless that text contains a `/`, in which case
/// the colon belongs to a registry port. An untagged reference with a digest
/// is [`ImageTag::Digest`].
pub fn parse_image_tag(image: &str) -> ImageTag<'_> {
    let (reference, digest) = match image.split_once('@') {
        Some((reference, digest)) => (reference, Some(digest)),
        None => (image, None),
    };

    let tag = match reference.rsplit_once(':') {
        Some((_, tag)) if !tag.is_empty() && !tag.contains('/') => Some(tag),
        _ => None,
    };

    match (tag, digest) {
        (Some("latest"), _) => ImageTag::Latest,
        (Some(tag), _) => ImageTag::Tagged(tag),
        (None, Some(_)) => ImageTag::Digest,
        (None, None) => ImageTag::Missing,
    }
}

/// Rejects untagged and `latest`-tagged container images.
#[derive(Clone, Debug)]
pub struct ImageTagValidator {
    location: PodSpecLocation,
}

impl ImageTagValidator {
    pub fn new(location: PodSpecLocation) -> Self {
        Self { location }
    }
}

impl Validator for ImageTagValidator {
    fn name(&self) -> &str {
        "image-tag"
    }

    fn validate(&self, object: &ManifestObject) -> ValidationResult {
        check_containers(object, self.location, "image tags", |container, result| {
            let tag = container
                .image
                .as_deref()
                .map_or(ImageTag::Missing, parse_image_tag);

            match tag {
                ImageTag::Missing => result.reject(format!(
                    "Container {} does not have image tag set",
                    container.name
                )),
                ImageTag::Latest => result.reject(format!(
                    "Container {} uses image with 'latest' tag",
                    container.name
                )),
                ImageTag::Tagged(_) | ImageTag::Digest => {}
            }
        })
    }
}
