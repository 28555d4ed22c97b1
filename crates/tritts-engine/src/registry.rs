use std::collections::HashMap;
use std::sync::Arc;
use tritts_audio::{Concatenate, CrossFade, Reconstruction};
use tritts_core::SynthesisError;

/// Builds a reconstruction strategy given the cross-fade window in samples.
pub type StrategyFactory = fn(usize) -> Arc<dyn Reconstruction>;

/// Maps model identifiers to the way their streamed chunks are stitched.
pub struct StrategyRegistry {
    factories: HashMap<String, StrategyFactory>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        // spark_tts emits overlapping chunks that must be cross-faded
        registry.register("spark_tts", |overlap| Arc::new(CrossFade::new(overlap)));
        registry.register("cosyvoice2", |_| Arc::new(Concatenate));
        registry.register("f5_tts", |_| Arc::new(Concatenate));
        registry
    }

    pub fn register(&mut self, model: &str, factory: StrategyFactory) {
        self.factories.insert(model.to_string(), factory);
    }

    pub fn create(
        &self,
        model: &str,
        overlap_samples: usize,
    ) -> Result<Arc<dyn Reconstruction>, SynthesisError> {
        self.factories
            .get(model)
            .map(|f| f(overlap_samples))
            .ok_or_else(|| SynthesisError::ModelNotFound(model.to_string()))
    }

    pub fn list_models(&self) -> Vec<&str> {
        let mut models: Vec<&str> = self.factories.keys().map(|s| s.as_str()).collect();
        models.sort_unstable();
        models
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_spark_tts_cross_fades() {
        let registry = StrategyRegistry::new();
        let strategy = registry.create("spark_tts", 1600).unwrap();
        assert_eq!(strategy.name(), "cross-fade");
    }

    #[test]
    fn test_registry_other_models_concatenate() {
        let registry = StrategyRegistry::new();
        for model in ["cosyvoice2", "f5_tts"] {
            assert_eq!(registry.create(model, 1600).unwrap().name(), "concatenate");
        }
    }

    #[test]
    fn test_registry_unknown_model_fails() {
        let registry = StrategyRegistry::new();
        match registry.create("nope", 0) {
            Err(SynthesisError::ModelNotFound(name)) => assert_eq!(name, "nope"),
            _ => panic!("expected ModelNotFound"),
        }
    }

    #[test]
    fn test_registry_register_overrides() {
        let mut registry = StrategyRegistry::new();
        registry.register("cosyvoice2", |overlap| Arc::new(CrossFade::new(overlap)));
        assert_eq!(registry.create("cosyvoice2", 10).unwrap().name(), "cross-fade");
    }

    #[test]
    fn test_registry_list_models_sorted() {
        let registry = StrategyRegistry::new();
        assert_eq!(registry.list_models(), vec!["cosyvoice2", "f5_tts", "spark_tts"]);
    }

    #[test]
    fn test_registry_factory_receives_overlap() {
        let registry = StrategyRegistry::new();
        let strategy = registry.create("spark_tts", 2).unwrap();
        let out = strategy.reconstruct(&[vec![1.0; 4], vec![1.0; 4]]);
        assert_eq!(out.len(), 6);
    }
}
