use libtts::providers::kokoro::{
    KokoroError, KokoroLoadRequest, KokoroModel, KokoroModelLoader, Result, SampleChunks,
};
use std::sync::{Mutex, PoisonError};

/// Stand-in for a Kokoro pipeline: one short ramp of samples per sentence.
#[derive(Debug)]
pub struct MockKokoroModel {
    pub request: KokoroLoadRequest,
}

impl KokoroModel for MockKokoroModel {
    fn generate<'a>(&'a self, text: &'a str, speed: f64) -> SampleChunks<'a> {
        let len = (2400.0 / speed.max(0.1)) as usize;
        Box::new(
            text.split_terminator(['.', '!', '?'])
                .filter(|sentence| !sentence.trim().is_empty())
                .map(move |_| Ok((0..len).map(|n| (n % 100) as f32 / 100.0).collect())),
        )
    }
}

/// Loader that records every request it serves.
#[derive(Debug, Default)]
pub struct MockKokoroLoader {
    requests: Mutex<Vec<KokoroLoadRequest>>,
    pub should_fail: bool,
}

impl MockKokoroLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failure(mut self, should_fail: bool) -> Self {
        self.should_fail = should_fail;
        self
    }

    pub fn requests(&self) -> Vec<KokoroLoadRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn load_count(&self) -> usize {
        self.requests().len()
    }
}

impl KokoroModelLoader for MockKokoroLoader {
    fn load(&self, request: &KokoroLoadRequest) -> Result<Box<dyn KokoroModel>> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        if self.should_fail {
            return Err(KokoroError::model_load("weights are corrupt", &request.repo_id));
        }
        Ok(Box::new(MockKokoroModel {
            request: request.clone(),
        }))
    }
}
