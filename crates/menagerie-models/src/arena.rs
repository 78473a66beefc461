//! Empty world documents that robots and props are composed into

use menagerie_core::{DocumentError, ModelDocument};

use crate::constants::DEFAULT_ARENA_NAME;

/// A world with nothing in it yet
#[derive(Debug, Clone)]
pub struct Arena {
    document: ModelDocument,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            document: ModelDocument::new(DEFAULT_ARENA_NAME),
        }
    }
}

impl Arena {
    pub fn new(name: impl Into<String>) -> Result<Self, DocumentError> {
        let mut document = ModelDocument::default();
        document.set_model(name)?;
        Ok(Self { document })
    }

    pub fn name(&self) -> &str {
        self.document.model()
    }

    pub fn document(&self) -> &ModelDocument {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut ModelDocument {
        &mut self.document
    }

    pub fn into_document(self) -> ModelDocument {
        self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use menagerie_core::{Compiler, KinematicCompiler};

    #[test]
    fn test_new_arena_compiles() {
        let arena = Arena::new("stage").unwrap();
        assert_eq!(arena.name(), "stage");
        assert!(arena.document().is_empty());
        let model = KinematicCompiler::default().compile(arena.document()).unwrap();
        assert_eq!(model.nq(), 0);
    }

    #[test]
    fn test_invalid_name() {
        assert!(Arena::new("a/b").is_err());
        assert_eq!(Arena::default().name(), DEFAULT_ARENA_NAME);
    }
}
