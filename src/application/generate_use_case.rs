// ============================================================
// Layer 2 — GenerateUseCase
// ============================================================
// Decodes answers for the test split with a trained checkpoint:
//
//   Step 1: Load params.json + vocab.json     (Layer 6 - infra)
//   Step 2: Rebuild the test split            (Layer 4 - data)
//   Step 3: Rebuild model, load weights       (Layer 5 + 6)
//   Step 4: Greedy decode, one line per tuple (Layer 5 - ml)
//
// Output: <run_dir>/generated_answers_<id>.txt, appended to if
// it already exists. Line i is the answer generated for test
// tuple i in build order.

use anyhow::Result;
use burn::data::dataloader::DataLoaderBuilder;
use std::path::PathBuf;

use crate::data::{
    batcher::Seq2SeqBatcher,
    builder::DatasetBuilder,
    dataset::Seq2SeqDataset,
    loader::JsonSplitLoader,
};
use crate::domain::{record::SplitKind, traits::RecordSource};
use crate::infra::{
    checkpoint::{CheckpointId, CheckpointManager},
    vocab_store::VocabStore,
};
use crate::ml::evaluator::generate_answers;

type InferBackend = burn::backend::Wgpu;

pub struct GenerateUseCase {
    run_dir:    PathBuf,
    checkpoint: CheckpointId,
    /// Overrides the data_dir saved in params.json
    data_dir:   Option<String>,
}

impl GenerateUseCase {
    pub fn new(run_dir: impl Into<PathBuf>, checkpoint: CheckpointId, data_dir: Option<String>) -> Self {
        Self { run_dir: run_dir.into(), checkpoint, data_dir }
    }

    /// Returns the path of the written file.
    pub fn execute(&self) -> Result<PathBuf> {
        // ── Step 1: Run metadata ──────────────────────────────────────────────
        let ckpt  = CheckpointManager::new(&self.run_dir)?;
        let cfg   = ckpt.load_config()?;
        let vocab = VocabStore::new(ckpt.dir()).load()?;
        let data_dir = self.data_dir.clone().unwrap_or_else(|| cfg.data_dir.clone());

        // ── Step 2: Test split with the saved vocabulary ──────────────────────
        let rows = JsonSplitLoader::new(&data_dir, &cfg.category).load_split(SplitKind::Test)?;
        let test = DatasetBuilder::new(cfg.builder_config()).build_split(&rows, &vocab)?;
        let dataset = Seq2SeqDataset::new(test);

        // ── Step 3: Model ─────────────────────────────────────────────────────
        let device = burn::backend::wgpu::WgpuDevice::default();
        let model = cfg.model_config(vocab.size()).init::<InferBackend>(&device)?;
        let model = ckpt.load_model(model, self.checkpoint, &device)?;

        // ── Step 4: Decode ────────────────────────────────────────────────────
        let loader = DataLoaderBuilder::new(Seq2SeqBatcher::<InferBackend>::new(device.clone(), cfg.mode))
            .batch_size(cfg.batch_size)
            .num_workers(1)
            .build(dataset);

        let path  = ckpt.output_file(self.checkpoint);
        let lines = generate_answers(&model, loader.iter(), &vocab, &path)?;
        tracing::info!("Wrote {} generated answers to '{}'", lines, path.display());
        Ok(path)
    }
}
