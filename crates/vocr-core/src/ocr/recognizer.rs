//! Recognizer abstraction over OCR engines.

use std::sync::Mutex;

use crate::error::OcrError;

use super::{InputKind, Language, OcrInput, RecognizedText};

/// Anything that turns a bitmap into text.
///
/// Implementations must not assume which preprocessing ran: they receive
/// either the normalized image or, on the degraded path, the raw capture.
pub trait TextRecognizer {
    /// Recognize the text in `image` with the given language model.
    fn recognize(&self, image: OcrInput<'_>, language: Language) -> Result<RecognizedText, OcrError>;

    /// Short engine description for logs and status output.
    fn name(&self) -> &str;
}

impl<R: TextRecognizer + ?Sized> TextRecognizer for &R {
    fn recognize(&self, image: OcrInput<'_>, language: Language) -> Result<RecognizedText, OcrError> {
        (**self).recognize(image, language)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<R: TextRecognizer + ?Sized> TextRecognizer for Box<R> {
    fn recognize(&self, image: OcrInput<'_>, language: Language) -> Result<RecognizedText, OcrError> {
        (**self).recognize(image, language)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Recognizer returning scripted responses, one per call.
///
/// Once the script is exhausted the last response repeats. Used to exercise
/// extraction and batch handling without an OCR engine installed.
pub struct StubRecognizer {
    responses: Mutex<Vec<Result<String, String>>>,
    last: Mutex<Option<Result<String, String>>>,
    seen: Mutex<Vec<InputKind>>,
}

impl StubRecognizer {
    /// Always return `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self::scripted(vec![Ok(text.into())])
    }

    /// Return the given responses in order; `Err` entries become engine failures.
    pub fn scripted(responses: Vec<Result<String, String>>) -> Self {
        let mut responses = responses;
        responses.reverse();
        Self {
            responses: Mutex::new(responses),
            last: Mutex::new(None),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Kind of every input received so far, in call order.
    pub fn inputs_seen(&self) -> Vec<InputKind> {
        self.seen.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn next_response(&self) -> Result<String, String> {
        let mut responses = self.responses.lock().unwrap_or_else(|e| e.into_inner());
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(response) = responses.pop() {
            *last = Some(response.clone());
            response
        } else {
            last.clone().unwrap_or_else(|| Ok(String::new()))
        }
    }
}

impl TextRecognizer for StubRecognizer {
    fn recognize(&self, image: OcrInput<'_>, language: Language) -> Result<RecognizedText, OcrError> {
        self.seen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(image.kind());

        match self.next_response() {
            Ok(text) => Ok(RecognizedText::new(text, language)),
            Err(stderr) => Err(OcrError::Engine { code: Some(1), stderr }),
        }
    }

    fn name(&self) -> &str {
        "stub"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::ImageOrigin;
    use crate::ocr::RawImage;
    use image::{DynamicImage, GrayImage};

    fn raw() -> RawImage {
        RawImage::new("x.png", ImageOrigin::Upload, DynamicImage::ImageLuma8(GrayImage::new(2, 2)))
    }

    #[test]
    fn test_stub_returns_preset_text() {
        let image = raw();
        let stub = StubRecognizer::new("Vale 123456");
        let text = stub.recognize(OcrInput::Raw(&image), Language::Portuguese).unwrap();
        assert_eq!(text.text, "Vale 123456");
        assert_eq!(text.language, Language::Portuguese);
    }

    #[test]
    fn test_stub_script_then_repeat() {
        let image = raw();
        let stub = StubRecognizer::scripted(vec![Ok("a".into()), Err("bad".into())]);

        assert!(stub.recognize(OcrInput::Raw(&image), Language::Portuguese).is_ok());
        assert!(stub.recognize(OcrInput::Raw(&image), Language::Portuguese).is_err());
        assert!(stub.recognize(OcrInput::Raw(&image), Language::Portuguese).is_err());
        assert_eq!(stub.inputs_seen(), vec![InputKind::Raw; 3]);
    }
}
