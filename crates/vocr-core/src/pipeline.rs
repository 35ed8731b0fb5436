//! Image-to-record pipeline: normalize, recognize, extract, assemble.
//!
//! Images are processed strictly one after another in input order. Each image
//! either yields exactly one [`Record`] or, when its bytes cannot be decoded,
//! a [`BatchWarning`]; neither outcome affects the other images.

use std::ops::ControlFlow;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::models::config::VocrConfig;
use crate::models::record::{ImageOrigin, Record, ResultSet};
use crate::ocr::{ImageNormalizer, Language, OcrInput, RawImage, TextRecognizer};
use crate::voucher::{assemble, VoucherExtractor};

/// Undecoded image bytes handed to a batch.
#[derive(Debug, Clone)]
pub struct InputImage {
    pub name: String,
    pub origin: ImageOrigin,
    pub bytes: Vec<u8>,
}

impl InputImage {
    pub fn new(name: impl Into<String>, origin: ImageOrigin, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            origin,
            bytes,
        }
    }
}

/// An input that was skipped because it could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchWarning {
    pub source_name: String,
    pub message: String,
}

/// Reported to the batch observer after every input.
#[derive(Debug)]
pub enum BatchEvent<'a> {
    /// The input produced a record (success or error row).
    Processed {
        index: usize,
        total: usize,
        record: &'a Record,
    },
    /// The input could not be decoded and was left out of the results.
    Skipped {
        index: usize,
        total: usize,
        warning: &'a BatchWarning,
    },
}

/// Everything a batch produced.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// One record per decoded image, in input order.
    pub results: ResultSet,
    /// Decode failures, in input order.
    pub warnings: Vec<BatchWarning>,
    /// The observer stopped the batch before all inputs were seen.
    pub cancelled: bool,
}

/// The voucher pipeline over a given recognizer.
pub struct VoucherPipeline<R: TextRecognizer> {
    normalizer: ImageNormalizer,
    extractor: VoucherExtractor,
    recognizer: R,
    language: Language,
    min_digits: usize,
}

impl<R: TextRecognizer> VoucherPipeline<R> {
    /// Create a pipeline with default settings.
    pub fn new(recognizer: R) -> Self {
        Self::from_config(recognizer, &VocrConfig::default())
    }

    /// Create a pipeline using the extraction and language settings of `config`.
    pub fn from_config(recognizer: R, config: &VocrConfig) -> Self {
        Self {
            normalizer: ImageNormalizer::new(),
            extractor: VoucherExtractor::new(),
            recognizer,
            language: Language::from_code(&config.ocr.language).unwrap_or_default(),
            min_digits: config.extraction.effective_min_digits(),
        }
    }

    /// Set the minimum voucher digit count applied during assembly.
    pub fn with_min_digits(mut self, min_digits: usize) -> Self {
        self.min_digits = min_digits;
        self
    }

    /// Process one decoded image. Recognition failures become error records.
    pub fn process(&self, image: &RawImage) -> Record {
        let start = Instant::now();
        let normalized = self.normalizer.normalize(image);

        let input = match &normalized {
            Some(normalized) => OcrInput::Normalized(normalized),
            None => {
                warn!(
                    "Normalization produced no image for {}, recognizing the raw capture",
                    image.name()
                );
                OcrInput::Raw(image)
            }
        };

        let record = match self.recognizer.recognize(input, self.language) {
            Ok(recognized) => {
                if recognized.is_blank() {
                    debug!("No text recognized in {}", image.name());
                }
                let candidates = self.extractor.extract(&recognized.text);
                assemble(
                    image.name(),
                    image.origin(),
                    &recognized.text,
                    candidates,
                    self.min_digits,
                )
            }
            Err(e) => {
                warn!("OCR failed for {}: {}", image.name(), e);
                Record::failure(image.name(), image.origin(), &e.to_string())
            }
        };

        debug!(
            "Processed {} in {}ms",
            image.name(),
            start.elapsed().as_millis()
        );
        record
    }

    /// Decode and process every input, in order.
    pub fn process_batch(&self, inputs: Vec<InputImage>) -> BatchOutcome {
        self.process_batch_with(inputs, |_| ControlFlow::Continue(()))
    }

    /// Like [`process_batch`](Self::process_batch), reporting each input to
    /// `observer`. Returning `ControlFlow::Break` abandons the remaining inputs.
    pub fn process_batch_with<F>(&self, inputs: Vec<InputImage>, mut observer: F) -> BatchOutcome
    where
        F: FnMut(BatchEvent<'_>) -> ControlFlow<()>,
    {
        let total = inputs.len();
        let mut outcome = BatchOutcome::default();

        info!("Processing {} images with {}", total, self.recognizer.name());

        for (index, input) in inputs.into_iter().enumerate() {
            let flow = match RawImage::decode(input.name.as_str(), input.origin, &input.bytes) {
                Ok(image) => {
                    let record = self.process(&image);
                    outcome.results.push(record);
                    let record = &outcome.results.records()[outcome.results.len() - 1];
                    observer(BatchEvent::Processed { index, total, record })
                }
                Err(e) => {
                    warn!("Skipping {}: {}", input.name, e);
                    outcome.warnings.push(BatchWarning {
                        source_name: input.name,
                        message: e.to_string(),
                    });
                    let warning = &outcome.warnings[outcome.warnings.len() - 1];
                    observer(BatchEvent::Skipped { index, total, warning })
                }
            };

            if flow.is_break() {
                if index + 1 < total {
                    info!("Batch cancelled after {} of {} images", index + 1, total);
                    outcome.cancelled = true;
                }
                break;
            }
        }

        outcome
    }
}
