use serde_yaml::{Mapping, Value};

use crate::{
    config::{Config, PolicyScope, Str},
    image::ImageRule,
    visit::{VisitMut, VisitorMut},
};

pub const IMAGE_KEY: &str = "image";
pub const PULL_POLICY_KEY: &str = "imagePullPolicy";

/// Rewrites every `image` field of a document and sets the sibling `imagePullPolicy`.
pub struct ImageInjector<'a> {
    rule: &'a ImageRule,
    policy: Str,
    scope: PolicyScope,
    rewritten: usize,
}

impl<'a> ImageInjector<'a> {
    pub fn new(rule: &'a ImageRule, policy: impl Into<Str>, scope: PolicyScope) -> Self {
        Self {
            rule,
            policy: policy.into(),
            scope,
            rewritten: 0,
        }
    }

    pub fn from_config(rule: &'a ImageRule, config: &Config) -> Self {
        Self::new(rule, config.policy.clone(), config.policy_scope)
    }

    pub fn inject(&mut self, document: &mut Value) {
        document.visit_with(self)
    }

    /// Number of images rewritten so far.
    pub fn rewritten(&self) -> usize {
        self.rewritten
    }

    fn rewrite_image(&mut self, image: &mut Value) -> bool {
        let Value::String(image) = image else {
            return false;
        };

        match self.rule.rewrite(image) {
            Some(new_image) => {
                tracing::debug!(old = %image, new = %new_image, "rewriting image");
                *image = new_image;
                self.rewritten += 1;
                true
            }
            None => false,
        }
    }
}

impl VisitorMut for ImageInjector<'_> {
    fn visit_mapping(&mut self, map: &mut Mapping) {
        if let Some(image) = map.get_mut(IMAGE_KEY) {
            let rewritten = self.rewrite_image(image);
            if rewritten || self.scope == PolicyScope::Always {
                // `insert` keeps the position of an existing key
                map.insert(
                    Value::String(PULL_POLICY_KEY.to_owned()),
                    Value::String(self.policy.to_string()),
                );
            }
        }

        self.walk_mapping(map)
    }
}
