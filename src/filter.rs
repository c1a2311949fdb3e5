// Copyright 2024 Saptak Santra
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Filters: an ordered, append-only conjunction of archetype-level
//! predicates, evaluated per-page with early short-circuit.

use crate::signature::Signature;

enum Layer {
    Exactly(Signature),
    IncludeExact(Signature),
    IncludeAny(Signature),
    ExcludeAny(Signature),
    ExcludeExact(Signature),
}

impl Layer {
    fn matches(&self, archetype: &Signature) -> bool {
        match self {
            Layer::Exactly(s) => archetype.equal_to(s),
            Layer::IncludeExact(s) => archetype.contains_all(s),
            Layer::IncludeAny(s) => archetype.contains_any(s),
            Layer::ExcludeAny(s) => !archetype.contains_any(s),
            Layer::ExcludeExact(s) => !archetype.contains_all(s),
        }
    }
}

/// A reusable, pure query predicate over archetypes. Layers compose as a
/// logical AND; build one with the builder methods and pass it to
/// [`crate::access::Access::query`].
#[derive(Default)]
pub struct Filter {
    layers: Vec<Layer>,
}

impl Filter {
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    pub fn exactly(mut self, signature: Signature) -> Self {
        self.layers.push(Layer::Exactly(signature));
        self
    }

    pub fn include_exact(mut self, signature: Signature) -> Self {
        self.layers.push(Layer::IncludeExact(signature));
        self
    }

    pub fn include_any(mut self, signature: Signature) -> Self {
        self.layers.push(Layer::IncludeAny(signature));
        self
    }

    pub fn exclude_any(mut self, signature: Signature) -> Self {
        self.layers.push(Layer::ExcludeAny(signature));
        self
    }

    pub fn exclude_exact(mut self, signature: Signature) -> Self {
        self.layers.push(Layer::ExcludeExact(signature));
        self
    }

    pub(crate) fn matches(&self, archetype: &Signature) -> bool {
        self.layers.iter().all(|layer| layer.matches(archetype))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::part::PartId;

    fn sig(ids: &[u32]) -> Signature {
        Signature::new(ids.iter().map(|&i| PartId(i)))
    }

    #[test]
    fn exactly_matches_only_identical_archetype() {
        let f = Filter::new().exactly(sig(&[1, 2]));
        assert!(f.matches(&sig(&[1, 2])));
        assert!(!f.matches(&sig(&[1, 2, 3])));
    }

    #[test]
    fn layers_conjoin() {
        let f = Filter::new()
            .include_exact(sig(&[1]))
            .exclude_any(sig(&[9]));
        assert!(f.matches(&sig(&[1, 2])));
        assert!(!f.matches(&sig(&[1, 9])));
        assert!(!f.matches(&sig(&[2])));
    }
}
