// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Epoch loop over Burn DataLoaders with Adam and global-norm
// gradient clipping.
//
// Order of one run:
//   1. validation pass before any training (fresh runs only);
//      its loss seeds the learning-rate controller and is the
//      baseline the first `best` checkpoint has to beat
//   2. per epoch:
//        train  — forward (teacher forcing decided per batch),
//                 masked CE, backward, clip, Adam step
//        val    — forward-only on the inner backend
//        decay  — lr ← lr · decay if val_loss rose
//        record — TrainerMetrics decides best-so-far
//        save   — periodic checkpoint every `save_model_every`
//                 epochs, `best` checkpoint on a new low
//        log    — one metrics.csv row
//
// Key Burn insight:
//   - Training uses MyBackend (Autodiff<Wgpu>) for gradients
//   - model.valid() returns the model on MyInnerBackend (Wgpu)
//   - the validation batcher must also use the inner backend
//
// Non-finite batch loss is handled per NonFinitePolicy:
//   propagate  — step anyway, NaN flows into the epoch mean
//   fail-fast  — abort with PipelineError::NonFiniteLoss
//   skip-batch — drop the batch, no optimizer step
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam
//            Pascanu et al. (2013) gradient clipping

use anyhow::Result;
use burn::{
    data::{dataloader::DataLoaderBuilder, dataset::Dataset},
    grad_clipping::GradientClippingConfig,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::{backend::AutodiffBackend, ElementConversion},
};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{Seq2SeqBatch, Seq2SeqBatcher},
    dataset::Seq2SeqDataset,
};
use crate::domain::{error::PipelineError, policy::NonFinitePolicy};
use crate::infra::{
    checkpoint::{CheckpointId, CheckpointManager, TrainerState},
    metrics::{EpochMetrics, MetricsLogger, TrainerMetrics},
};
use crate::ml::{
    evaluator::validation_loss,
    loss::{sequence_loss, LossAccumulator},
    model::Seq2Seq,
    schedule::LearningRateController,
};

type MyBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// What a finished run reports back to the use case.
#[derive(Debug, Clone)]
pub struct TrainSummary {
    pub epochs_run:    usize,
    pub best_val_loss: Option<f64>,
    pub final_lr:      f64,
}

pub fn run_training(
    cfg:           &TrainConfig,
    vocab_size:    usize,
    train_dataset: Seq2SeqDataset,
    val_dataset:   Option<Seq2SeqDataset>,
    ckpt_manager:  CheckpointManager,
) -> Result<TrainSummary> {
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);
    train_with_backend::<MyBackend>(cfg, vocab_size, train_dataset, val_dataset, ckpt_manager, device)
}

/// Build the model and Adam optimizer on `B`, resume if configured,
/// then run the epoch loop.
pub fn train_with_backend<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    vocab_size:    usize,
    train_dataset: Seq2SeqDataset,
    val_dataset:   Option<Seq2SeqDataset>,
    ckpt_manager:  CheckpointManager,
    device:        B::Device,
) -> Result<TrainSummary> {
    B::seed(cfg.seed);

    let model: Seq2Seq<B> = cfg.model_config(vocab_size).init(&device)?;
    ckpt_manager.save_architecture(&model.architecture())?;

    // m = β1*m + (1-β1)*g        (mean)
    // v = β2*v + (1-β2)*g²       (variance)
    // θ = θ - lr * m / (√v + ε)  (update)
    // with g rescaled first so that ‖g‖₂ ≤ global_norm_max
    let optim = AdamConfig::new()
        .with_grad_clipping(Some(GradientClippingConfig::Norm(cfg.global_norm_max as f32)))
        .init::<B, Seq2Seq<B>>();

    let mut trainer = Trainer::new(cfg.clone(), model, optim, ckpt_manager, device)?;
    if let Some(epoch) = cfg.resume_epoch {
        trainer = trainer.resume(epoch)?;
    }
    trainer.train(train_dataset, val_dataset)
}

// ─── Trainer ──────────────────────────────────────────────────────────────────
pub struct Trainer<B: AutodiffBackend, O: Optimizer<Seq2Seq<B>, B>> {
    cfg:         TrainConfig,
    model:       Seq2Seq<B>,
    optim:       O,
    lr:          LearningRateController,
    metrics:     TrainerMetrics,
    logger:      MetricsLogger,
    ckpt:        CheckpointManager,
    start_epoch: usize,
    rng:         StdRng,
    device:      B::Device,
}

impl<B, O> Trainer<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<Seq2Seq<B>, B>,
{
    pub fn new(
        cfg:    TrainConfig,
        model:  Seq2Seq<B>,
        optim:  O,
        ckpt:   CheckpointManager,
        device: B::Device,
    ) -> Result<Self> {
        let logger = MetricsLogger::new(ckpt.dir())?;
        tracing::info!("Epoch metrics → '{}'", logger.csv_path().display());
        Ok(Self {
            lr: LearningRateController::new(cfg.lr, cfg.lr_decay),
            metrics: TrainerMetrics::new(),
            logger,
            start_epoch: 0,
            rng: StdRng::seed_from_u64(cfg.seed),
            cfg,
            model,
            optim,
            ckpt,
            device,
        })
    }

    /// Restore model, optimizer and scalar state saved after `epoch`;
    /// training continues at `epoch + 1`.
    pub fn resume(mut self, epoch: usize) -> Result<Self> {
        let id = CheckpointId::Epoch(epoch);
        self.model = self.ckpt.load_model(self.model, id, &self.device)?;
        self.optim = self.ckpt.load_optimizer::<B, O>(self.optim, id, &self.device)?;

        let state = self.ckpt.load_state(id)?;
        self.lr.restore(state.lr, state.previous_val_loss);
        self.metrics.restore(state.best_val_loss);
        if let Some(factor) = self.cfg.resume_lr {
            self.lr.rescale(factor);
        }
        self.start_epoch = state.epoch + 1;

        tracing::info!(
            "Resumed from epoch {} (lr={:.6}, best val_loss={:?})",
            state.epoch, self.lr.lr(), self.metrics.best_loss(),
        );
        Ok(self)
    }

    pub fn train(
        &mut self,
        train_dataset: Seq2SeqDataset,
        val_dataset:   Option<Seq2SeqDataset>,
    ) -> Result<TrainSummary> {
        let val_dataset = val_dataset.ok_or(PipelineError::MissingLoader("val"))?;
        let mode = self.cfg.mode;
        tracing::info!(
            "Training on {} tuples, validating on {} tuples",
            train_dataset.len(),
            val_dataset.len(),
        );

        // ── Training data loader (AutodiffBackend) ────────────────────────────
        let train_loader = DataLoaderBuilder::new(Seq2SeqBatcher::<B>::new(self.device.clone(), mode))
            .batch_size(self.cfg.batch_size)
            .shuffle(self.cfg.seed)
            .num_workers(1)
            .build(train_dataset);

        // ── Validation data loader (InnerBackend — no autodiff overhead) ──────
        let val_loader =
            DataLoaderBuilder::new(Seq2SeqBatcher::<B::InnerBackend>::new(self.device.clone(), mode))
                .batch_size(self.cfg.batch_size)
                .num_workers(1)
                .build(val_dataset);

        if self.start_epoch == 0 {
            let baseline = validation_loss(&self.model.valid(), val_loader.iter())?;
            tracing::info!(
                "Before training | val_loss={:.4} | val_ppl={:.2}",
                baseline.epoch_loss(),
                baseline.epoch_perplexity(),
            );
            self.lr.observe(baseline.epoch_loss());
            self.metrics.record_baseline(baseline.epoch_loss());
        }

        let mut train_loss = LossAccumulator::new();
        for epoch in self.start_epoch..self.cfg.epochs {
            tracing::info!("--- Starting epoch {} ---", epoch);
            train_loss.reset();

            // ── Training phase ────────────────────────────────────────────────
            for (batch_idx, batch) in train_loader.iter().enumerate() {
                if !self.train_batch(batch, epoch, batch_idx, &mut train_loss)? {
                    continue;
                }
                if self.cfg.print_every > 0 && train_loss.batches() % self.cfg.print_every == 0 {
                    tracing::info!(
                        "Epoch {} | batch {} | loss={:.4} | ppl={:.2}",
                        epoch, batch_idx, train_loss.epoch_loss(), train_loss.epoch_perplexity(),
                    );
                }
            }

            // ── Validation phase ──────────────────────────────────────────────
            // model.valid() → Seq2Seq<InnerBackend>, dropout disabled
            let val_loss = validation_loss(&self.model.valid(), val_loader.iter())?;
            let (train_mean, val_mean) = (train_loss.epoch_loss(), val_loss.epoch_loss());

            if self.lr.observe(val_mean) {
                tracing::info!("Validation loss rose, learning rate decayed to {:.6}", self.lr.lr());
            }
            self.metrics.record(epoch, val_mean);

            println!(
                "Epoch {:>3}/{} | train_loss={:.4} | train_ppl={:.2} | val_loss={:.4} | val_ppl={:.2} | lr={:.6}",
                epoch, self.cfg.epochs, train_mean, train_loss.epoch_perplexity(),
                val_mean, val_loss.epoch_perplexity(), self.lr.lr(),
            );

            // ── Checkpoints ───────────────────────────────────────────────────
            if self.cfg.save_model_every > 0 && epoch % self.cfg.save_model_every == 0 {
                self.save_checkpoint(CheckpointId::Epoch(epoch), epoch, train_mean, val_mean)?;
            }
            if self.metrics.is_best_so_far() {
                self.save_checkpoint(CheckpointId::Best, epoch, train_mean, val_mean)?;
                tracing::info!("New best val_loss={:.4} at epoch {}", val_mean, epoch);
            }

            self.logger.log(&EpochMetrics::new(epoch, train_mean, val_mean, self.lr.lr()))?;
        }

        tracing::info!("Training complete!");
        Ok(TrainSummary {
            epochs_run:    self.metrics.history().len(),
            best_val_loss: self.metrics.best_loss(),
            final_lr:      self.lr.lr(),
        })
    }

    /// One optimizer step. `false` when the batch was skipped.
    fn train_batch(
        &mut self,
        batch:     Seq2SeqBatch<B>,
        epoch:     usize,
        batch_idx: usize,
        acc:       &mut LossAccumulator,
    ) -> Result<bool> {
        let teacher_forcing = self.rng.gen_bool(self.cfg.teacher_forcing_ratio.clamp(0.0, 1.0));
        let output = self.model.forward(&batch, teacher_forcing)?;
        let loss = sequence_loss(output.logits, batch.targets().clone());
        self.apply_loss(loss, epoch, batch_idx, acc)
    }

    /// Screen `loss` against the non-finite policy, then backprop and
    /// step. The loss reaches `acc` only when a step was taken.
    fn apply_loss(
        &mut self,
        loss:      Tensor<B, 1>,
        epoch:     usize,
        batch_idx: usize,
        acc:       &mut LossAccumulator,
    ) -> Result<bool> {
        let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();

        if !loss_val.is_finite() {
            match self.cfg.non_finite_loss {
                NonFinitePolicy::FailFast => {
                    return Err(PipelineError::NonFiniteLoss { epoch, batch: batch_idx, loss: loss_val }.into());
                }
                NonFinitePolicy::SkipBatch => {
                    tracing::warn!("Skipping batch {} of epoch {}: loss={}", batch_idx, epoch, loss_val);
                    return Ok(false);
                }
                NonFinitePolicy::Propagate => {
                    tracing::warn!("Non-finite loss {} at epoch {}, batch {}", loss_val, epoch, batch_idx);
                }
            }
        }

        // Backward pass + Adam update
        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.model);
        self.model = self.optim.step(self.lr.lr(), self.model.clone(), grads);
        acc.add(loss_val);
        Ok(true)
    }

    fn save_checkpoint(&self, id: CheckpointId, epoch: usize, train_loss: f64, val_loss: f64) -> Result<()> {
        self.ckpt.save_model(&self.model, id)?;
        self.ckpt.save_optimizer::<B, O>(&self.optim, id)?;
        self.ckpt.save_state(
            &TrainerState {
                epoch,
                lr: self.lr.lr(),
                train_loss: finite(train_loss),
                val_loss: finite(val_loss),
                previous_val_loss: self.lr.previous().and_then(finite),
                best_val_loss: self.metrics.best_loss(),
            },
            id,
        )?;
        tracing::info!("Checkpoint {} saved for epoch {}", id, epoch);
        Ok(())
    }
}

fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}
