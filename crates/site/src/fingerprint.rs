//! Fingerprint combination.
//!
//! Individual fingerprints (content bytes, template bodies, configuration)
//! are BLAKE3 digests computed where the data lives. This module only
//! *combines* them: a composite digest per unit and a corpus digest for
//! aggregate artifacts. Combination is digest-of-digests with labelled,
//! NUL-separated fields, so the result is independent of how inputs were
//! enumerated and two different field splits can never collide.

use plume_content::ContentUnit;
use plume_render::{Aggregate, TemplateSet};

/// Composite fingerprint for one unit.
///
/// A unit's rendered output depends on exactly three things: its own source
/// bytes, the body of the template it renders with, and the render-affecting
/// configuration. Change any one and the composite changes.
pub fn composite(content: &str, template: &str, config: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    for (label, digest) in [("content", content), ("template", template), ("config", config)] {
        hasher.update(label.as_bytes());
        hasher.update(b":");
        hasher.update(digest.as_bytes());
        hasher.update(&[0]);
    }
    hasher.finalize().to_hex().to_string()
}

/// Corpus fingerprint: the invalidation basis for aggregate artifacts.
///
/// Covers the set of all slugs plus each unit's composite fingerprint (so
/// additions, removals and edits all register), every aggregate template's
/// fingerprint, and the configuration. Units are folded in slug order to
/// keep the digest independent of scan order.
pub fn corpus(units: &[(String, String)], templates: &TemplateSet, config: &str) -> String {
    let mut ordered: Vec<&(String, String)> = units.iter().collect();
    ordered.sort_by(|a, b| a.0.cmp(&b.0));

    let mut hasher = blake3::Hasher::new();
    for (slug, composite) in ordered {
        hasher.update(slug.as_bytes());
        hasher.update(b"=");
        hasher.update(composite.as_bytes());
        hasher.update(&[0]);
    }
    for aggregate in Aggregate::ALL {
        let name = aggregate.template();
        hasher.update(name.as_bytes());
        hasher.update(b"=");
        hasher.update(templates.fingerprint(name).unwrap_or_default().as_bytes());
        hasher.update(&[0]);
    }
    hasher.update(b"config=");
    hasher.update(config.as_bytes());
    hasher.finalize().to_hex().to_string()
}

/// Composite fingerprint for a parsed unit against a template set.
///
/// A unit whose template does not exist still gets a composite (with an
/// empty template digest); the build will fail that unit at render time
/// with a missing-template error rather than silently skipping it.
pub fn unit_composite(unit: &ContentUnit, templates: &TemplateSet, config: &str) -> String {
    composite(&unit.fingerprint, templates.fingerprint(&unit.front.template).unwrap_or_default(), config)
}
