use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use digit::io::{decode_data_url, decode_grayscale, encode_png};
use digit::{
    Classification, Classifier, ClassifierError, Digit, DigitError, FixedClassifier, InputTensor,
    RecognitionService, RecognizeRequest, RecognizeResponse, RecognizerConfig,
};
use image::{GrayImage, Luma};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

fn distribution() -> Classification {
    let mut probabilities = [0.0; Digit::COUNT];
    probabilities[0] = 0.7;
    probabilities[1] = 0.2;
    probabilities[2] = 0.1;
    Classification::from_probabilities(probabilities)
}

fn fixed_service() -> RecognitionService<FixedClassifier> {
    let classifier = FixedClassifier::new(distribution());
    RecognitionService::start(classifier, RecognizerConfig::default()).unwrap()
}

fn create_drawing() -> GrayImage {
    let mut image = GrayImage::new(200, 200);
    draw_filled_rect_mut(&mut image, Rect::at(90, 40).of_size(14, 120), Luma([255u8]));
    image
}

#[derive(Debug)]
struct ModelOffline;

impl fmt::Display for ModelOffline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "model offline")
    }
}

impl std::error::Error for ModelOffline {}

struct FailingClassifier;

impl Classifier for FailingClassifier {
    fn classify(&self, _input: &InputTensor) -> Result<Classification, ClassifierError> {
        Err(Box::new(ModelOffline))
    }
}

/// Records what it was given and answers by the amount of ink it saw.
struct InkCounter {
    calls: AtomicUsize,
}

impl Classifier for InkCounter {
    fn classify(&self, input: &InputTensor) -> Result<Classification, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let values = input.values()?;
        let ink = values.iter().filter(|&&v| v > -1.0).count();
        let mut probabilities = [0.0; Digit::COUNT];
        probabilities[ink % Digit::COUNT] = 1.0;
        Ok(Classification::from_probabilities(probabilities))
    }
}

#[test]
fn top_three_from_fixed_distribution() {
    let service = fixed_service();

    let recognition = service.recognize_raster(&create_drawing()).unwrap();
    let top: Vec<(String, f64)> = recognition
        .top_scores
        .iter()
        .map(|s| (s.label.to_string(), s.probability))
        .collect();
    assert_eq!(
        top,
        vec![("0".to_string(), 0.7), ("1".to_string(), 0.2), ("2".to_string(), 0.1)]
    );
    assert_eq!(recognition.prediction().unwrap().label, Digit::Zero);
}

#[test]
fn request_to_response_json() {
    let service = fixed_service();
    let png = encode_png(&create_drawing()).unwrap();
    let request = RecognizeRequest {
        image_base64: format!("data:image/png;base64,{}", STANDARD.encode(&png)),
    };

    let response = service.recognize_request(&request).unwrap();
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["prediction"], "0");
    assert_eq!(json["topScores"][0]["label"], "0");
    assert_eq!(json["topScores"].as_array().unwrap().len(), 3);

    let image_url = json["normalizedImageBase64"].as_str().unwrap();
    let normalized = decode_grayscale(&decode_data_url(image_url).unwrap()).unwrap();
    assert_eq!(normalized.dimensions(), (28, 28));

    let parsed: RecognizeResponse = serde_json::from_value(json).unwrap();
    assert_eq!(parsed, response);
}

#[test]
fn classifier_failure_is_surfaced_unchanged() {
    let service =
        RecognitionService::start(FailingClassifier, RecognizerConfig::default()).unwrap();

    let err = service.recognize_raster(&create_drawing()).unwrap_err();
    match err {
        DigitError::Classifier(source) => {
            assert!(source.downcast_ref::<ModelOffline>().is_some());
            assert_eq!(source.to_string(), "model offline");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn malformed_requests_are_rejected() {
    let service = fixed_service();

    let empty = RecognizeRequest { image_base64: "data:image/png;base64,".into() };
    assert!(matches!(service.recognize_request(&empty), Err(DigitError::EmptyPayload)));

    let garbage = RecognizeRequest { image_base64: STANDARD.encode(b"definitely not a png") };
    assert!(matches!(service.recognize_request(&garbage), Err(DigitError::ImageLoad(_))));

    assert!(matches!(
        service.recognize_raster(&GrayImage::new(0, 12)),
        Err(DigitError::EmptyRaster { .. })
    ));
}

#[test]
fn concurrent_requests_share_one_classifier() {
    let classifier = InkCounter { calls: AtomicUsize::new(0) };
    let service = RecognitionService::start(classifier, RecognizerConfig::default()).unwrap();
    let drawing = Arc::new(create_drawing());

    let expected = service.recognize_raster(&drawing).unwrap().prediction().unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                let drawing = Arc::clone(&drawing);
                scope.spawn(move || {
                    service.recognize_raster(&drawing).unwrap().prediction().unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });

    let classifier = service.shutdown().expect("last handle returns the classifier");
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 9);
}
