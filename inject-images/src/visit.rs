use serde_yaml::{Mapping, Sequence, Value, value::TaggedValue};

/// Mutable depth-first traversal of a YAML value.
///
/// Override a `visit_*` method to act on a node and call the matching `walk_*` method to
/// keep descending.
pub trait VisitorMut {
    fn visit_value(&mut self, node: &mut Value) {
        self.walk_value(node)
    }

    fn visit_mapping(&mut self, map: &mut Mapping) {
        self.walk_mapping(map)
    }

    fn visit_sequence(&mut self, seq: &mut Sequence) {
        self.walk_sequence(seq)
    }

    fn visit_tagged(&mut self, tagged: &mut TaggedValue) {
        self.visit_value(&mut tagged.value)
    }

    fn walk_mapping(&mut self, map: &mut Mapping) {
        for value in map.values_mut() {
            // No mutable reference to the key
            self.visit_value(value);
        }
    }

    fn walk_sequence(&mut self, seq: &mut Sequence) {
        for item in seq.iter_mut() {
            self.visit_value(item);
        }
    }

    fn walk_value(&mut self, node: &mut Value) {
        match node {
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
            Value::Sequence(seq) => self.visit_sequence(seq),
            Value::Mapping(map) => self.visit_mapping(map),
            Value::Tagged(tagged) => self.visit_tagged(tagged),
        }
    }
}

pub trait VisitMut {
    fn visit_with<V: VisitorMut>(&mut self, visitor: &mut V);
}

impl VisitMut for Value {
    fn visit_with<V: VisitorMut>(&mut self, visitor: &mut V) {
        visitor.visit_value(self)
    }
}
