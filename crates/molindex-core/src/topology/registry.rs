use crate::core::error::TopologyError;
use crate::core::level::Level;
use std::fmt;
use std::sync::Arc;

/// A named per-level attribute column owned by an external storage layer.
///
/// The topology never reads attribute values; it only needs the name to keep
/// registrations unique, the level to file the attribute under, and the
/// length to check it against the level size on request.
pub trait TopologyAttr: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;
    fn level(&self) -> Level;
    /// Number of entries held, expected to equal the size of [`Self::level`].
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Append-only attribute lists, one per level.
#[derive(Debug, Clone, Default)]
pub(crate) struct AttributeRegistry {
    by_level: [Vec<Arc<dyn TopologyAttr>>; 3],
}

impl AttributeRegistry {
    pub(crate) fn register(&mut self, attr: Arc<dyn TopologyAttr>) -> Result<(), TopologyError> {
        let level = attr.level();
        if self.get(level, attr.name()).is_some() {
            return Err(TopologyError::DuplicateAttribute {
                level,
                name: attr.name().to_string(),
            });
        }
        self.by_level[level.slot()].push(attr);
        Ok(())
    }

    pub(crate) fn list(&self, level: Level) -> &[Arc<dyn TopologyAttr>] {
        &self.by_level[level.slot()]
    }

    pub(crate) fn get(&self, level: Level, name: &str) -> Option<&Arc<dyn TopologyAttr>> {
        self.list(level).iter().find(|attr| attr.name() == name)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[derive(Debug)]
    pub(crate) struct DummyAttr {
        pub name: &'static str,
        pub level: Level,
        pub len: usize,
    }

    impl TopologyAttr for DummyAttr {
        fn name(&self) -> &str {
            self.name
        }
        fn level(&self) -> Level {
            self.level
        }
        fn len(&self) -> usize {
            self.len
        }
    }

    pub(crate) fn dummy(name: &'static str, level: Level, len: usize) -> Arc<dyn TopologyAttr> {
        Arc::new(DummyAttr { name, level, len })
    }

    #[test]
    fn register_files_attribute_under_its_level() {
        let mut registry = AttributeRegistry::default();
        registry.register(dummy("names", Level::Atom, 3)).unwrap();
        registry.register(dummy("resids", Level::Residue, 2)).unwrap();

        assert_eq!(registry.list(Level::Atom).len(), 1);
        assert_eq!(registry.list(Level::Residue).len(), 1);
        assert!(registry.list(Level::Segment).is_empty());
        assert!(registry.get(Level::Atom, "names").is_some());
        assert!(registry.get(Level::Residue, "names").is_none());
    }

    #[test]
    fn list_preserves_registration_order() {
        let mut registry = AttributeRegistry::default();
        registry.register(dummy("names", Level::Atom, 3)).unwrap();
        registry.register(dummy("charges", Level::Atom, 3)).unwrap();
        registry.register(dummy("masses", Level::Atom, 3)).unwrap();

        let names: Vec<&str> = registry.list(Level::Atom).iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["names", "charges", "masses"]);
    }

    #[test]
    fn duplicate_name_on_same_level_is_rejected() {
        let mut registry = AttributeRegistry::default();
        registry.register(dummy("ids", Level::Segment, 1)).unwrap();
        let result = registry.register(dummy("ids", Level::Segment, 1));

        assert_eq!(
            result,
            Err(TopologyError::DuplicateAttribute {
                level: Level::Segment,
                name: "ids".to_string(),
            })
        );
        assert_eq!(registry.list(Level::Segment).len(), 1);
    }

    #[test]
    fn same_name_on_different_levels_is_allowed() {
        let mut registry = AttributeRegistry::default();
        registry.register(dummy("ids", Level::Atom, 1)).unwrap();
        registry.register(dummy("ids", Level::Residue, 1)).unwrap();
        assert!(registry.get(Level::Atom, "ids").is_some());
        assert!(registry.get(Level::Residue, "ids").is_some());
    }

    #[test]
    fn default_is_empty_provided_by_trait() {
        assert!(dummy("x", Level::Atom, 0).is_empty());
        assert!(!dummy("x", Level::Atom, 2).is_empty());
    }
}
