use std::time::Instant;

use thiserror::Error;

use crate::io::domain::image_reader::ImageReader;
use crate::io::domain::image_writer::ImageWriter;
use crate::pipeline::anonymization_strategy::AnonymizationStrategy;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::anonymization_mode::AnonymizationMode;
use crate::shared::upload::{download_file_name, DownloadableImage, UploadError, UploadFormat, UploadedImage};

#[derive(Error, Debug)]
pub enum AnonymizeError {
    #[error(transparent)]
    UnsupportedFormat(#[from] UploadError),
    #[error("failed to decode image: {0}")]
    Decode(#[source] Box<dyn std::error::Error>),
    #[error("face detection failed: {0}")]
    Detection(#[source] Box<dyn std::error::Error>),
    #[error("failed to encode image: {0}")]
    Encode(#[source] Box<dyn std::error::Error>),
}

/// Single-upload pipeline: decode → detect → anonymize → encode.
pub struct AnonymizeImageUseCase {
    reader: Box<dyn ImageReader>,
    writer: Box<dyn ImageWriter>,
    strategy: AnonymizationStrategy,
    logger: Box<dyn PipelineLogger>,
}

impl AnonymizeImageUseCase {
    pub fn new(
        reader: Box<dyn ImageReader>,
        writer: Box<dyn ImageWriter>,
        strategy: AnonymizationStrategy,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            reader,
            writer,
            strategy,
            logger,
        }
    }

    pub fn mode(&self) -> AnonymizationMode {
        self.strategy.mode()
    }

    /// Anonymizes one upload and returns the file to offer for download.
    ///
    /// The output keeps the upload's container format. Nothing is detected
    /// or drawn unless the bytes decode.
    pub fn execute(&mut self, upload: &UploadedImage) -> Result<DownloadableImage, AnonymizeError> {
        let format = UploadFormat::from_file_name(&upload.file_name)?;
        let mode = self.strategy.mode();
        self.logger
            .info(&format!("Anonymizing {} ({mode})", upload.file_name));

        let t0 = Instant::now();
        let frame = self.reader.read(&upload.bytes).map_err(AnonymizeError::Decode)?;
        self.logger.timing("decode", elapsed_ms(t0));

        let t0 = Instant::now();
        let anonymized = self.strategy.apply(&frame).map_err(AnonymizeError::Detection)?;
        self.logger.timing("anonymize", elapsed_ms(t0));
        self.logger.metric("faces", anonymized.faces as f64);

        let t0 = Instant::now();
        let bytes = self
            .writer
            .write(&anonymized.frame, format)
            .map_err(AnonymizeError::Encode)?;
        self.logger.timing("encode", elapsed_ms(t0));

        self.logger.summary();

        Ok(DownloadableImage {
            file_name: download_file_name(&upload.file_name, mode, format),
            mime_type: format.mime_type(),
            bytes,
        })
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blurring::domain::frame_blurrer::FrameBlurrer;
    use crate::blurring::infrastructure::face_box_blurrer::FaceBoxBlurrer;
    use crate::detection::domain::eye_landmarks::EyeCornerIndices;
    use crate::detection::domain::face_detector::FaceDetector;
    use crate::detection::infrastructure::json_detections::JsonDetections;
    use crate::io::infrastructure::memory_image_reader::MemoryImageReader;
    use crate::io::infrastructure::memory_image_writer::MemoryImageWriter;
    use crate::occlusion::infrastructure::red_line_occluder::RedLineOccluder;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::shared::bounding_box::BoundingBox;
    use crate::shared::frame::Frame;
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    struct StubReader {
        frame: Frame,
    }

    impl ImageReader for StubReader {
        fn read(&self, _bytes: &[u8]) -> Result<Frame, Box<dyn std::error::Error>> {
            Ok(self.frame.clone())
        }
    }

    struct StubWriter {
        written: Arc<Mutex<Vec<(Frame, UploadFormat)>>>,
    }

    impl ImageWriter for StubWriter {
        fn write(
            &self,
            frame: &Frame,
            format: UploadFormat,
        ) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
            self.written.lock().unwrap().push((frame.clone(), format));
            Ok(vec![1, 2, 3])
        }
    }

    struct FailingWriter;

    impl ImageWriter for FailingWriter {
        fn write(&self, _frame: &Frame, _format: UploadFormat) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
            Err("disk full".into())
        }
    }

    struct CountingDetector {
        calls: Arc<Mutex<usize>>,
        result: Result<Vec<BoundingBox>, String>,
    }

    impl CountingDetector {
        fn new(boxes: Vec<BoundingBox>) -> Self {
            Self {
                calls: Arc::new(Mutex::new(0)),
                result: Ok(boxes),
            }
        }
    }

    impl FaceDetector for CountingDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
            *self.calls.lock().unwrap() += 1;
            self.result.clone().map_err(Into::into)
        }
    }

    struct PassthroughBlurrer;

    impl FrameBlurrer for PassthroughBlurrer {
        fn blur(&self, frame: &Frame, _boxes: &[BoundingBox]) -> Frame {
            frame.clone()
        }
    }

    // --- Helpers ---

    fn upload(name: &str, bytes: Vec<u8>) -> UploadedImage {
        UploadedImage {
            file_name: name.to_string(),
            bytes,
        }
    }

    fn png_bytes(frame: &Frame) -> Vec<u8> {
        MemoryImageWriter::default().write(frame, UploadFormat::Png).unwrap()
    }

    fn blur_use_case(detector: CountingDetector) -> AnonymizeImageUseCase {
        AnonymizeImageUseCase::new(
            Box::new(MemoryImageReader::new()),
            Box::new(MemoryImageWriter::default()),
            AnonymizationStrategy::face_blur(Box::new(detector), Box::new(PassthroughBlurrer)),
            Box::new(NullPipelineLogger),
        )
    }

    // --- Tests ---

    #[test]
    fn test_png_upload_yields_png_download() {
        let frame = Frame::filled(40, 30, [10, 20, 30]);
        let mut uc = blur_use_case(CountingDetector::new(vec![]));

        let out = uc.execute(&upload("Humans.png", png_bytes(&frame))).unwrap();
        assert_eq!(out.file_name, "Humans-Face-Blur.png");
        assert_eq!(out.mime_type, "image/png");
        let back = image::load_from_memory(&out.bytes).unwrap().to_rgb8();
        assert_eq!(Frame::from(back), frame);
    }

    #[test]
    fn test_jpeg_named_upload_is_encoded_as_jpeg() {
        let frame = Frame::filled(40, 30, [10, 20, 30]);
        let written = Arc::new(Mutex::new(Vec::new()));
        let mut uc = AnonymizeImageUseCase::new(
            Box::new(StubReader { frame: frame.clone() }),
            Box::new(StubWriter { written: written.clone() }),
            AnonymizationStrategy::face_blur(
                Box::new(CountingDetector::new(vec![])),
                Box::new(PassthroughBlurrer),
            ),
            Box::new(NullPipelineLogger),
        );

        let out = uc.execute(&upload("me.jpeg", vec![0xff])).unwrap();
        assert_eq!(out.file_name, "me-Face-Blur.jpg");
        assert_eq!(out.mime_type, "image/jpeg");
        assert_eq!(out.bytes, vec![1, 2, 3]);

        let written = written.lock().unwrap();
        assert_eq!(written[0].1, UploadFormat::Jpeg);
        assert_eq!((written[0].0.width(), written[0].0.height()), (40, 30));
    }

    #[test]
    fn test_unsupported_extension_fails_before_decoding() {
        let detector = CountingDetector::new(vec![]);
        let calls = detector.calls.clone();
        let mut uc = blur_use_case(detector);

        let err = uc.execute(&upload("anim.gif", vec![1, 2, 3])).unwrap_err();
        assert!(matches!(err, AnonymizeError::UnsupportedFormat(_)));
        assert_eq!(*calls.lock().unwrap(), 0);
    }

    #[test]
    fn test_undecodable_bytes_never_reach_detector() {
        let detector = CountingDetector::new(vec![BoundingBox::new(0, 0, 5, 5)]);
        let calls = detector.calls.clone();
        let mut uc = blur_use_case(detector);

        let err = uc.execute(&upload("broken.png", b"not a png".to_vec())).unwrap_err();
        assert!(matches!(err, AnonymizeError::Decode(_)));
        assert_eq!(*calls.lock().unwrap(), 0);
    }

    #[test]
    fn test_detector_failure_is_detection_error() {
        let detector = CountingDetector {
            calls: Arc::new(Mutex::new(0)),
            result: Err("no model".to_string()),
        };
        let mut uc = blur_use_case(detector);

        let frame = Frame::filled(8, 8, [0, 0, 0]);
        let err = uc.execute(&upload("a.png", png_bytes(&frame))).unwrap_err();
        assert!(matches!(err, AnonymizeError::Detection(_)));
        assert_eq!(err.to_string(), "face detection failed: no model");
    }

    #[test]
    fn test_encode_failure_is_encode_error() {
        let mut uc = AnonymizeImageUseCase::new(
            Box::new(StubReader {
                frame: Frame::filled(8, 8, [0, 0, 0]),
            }),
            Box::new(FailingWriter),
            AnonymizationStrategy::face_blur(
                Box::new(CountingDetector::new(vec![])),
                Box::new(PassthroughBlurrer),
            ),
            Box::new(NullPipelineLogger),
        );
        let err = uc.execute(&upload("a.png", vec![])).unwrap_err();
        assert!(matches!(err, AnonymizeError::Encode(_)));
    }

    #[test]
    fn test_face_blur_end_to_end_with_json_detections() {
        let mut frame = Frame::filled(200, 200, [0, 0, 0]);
        for row in 0..200 {
            for col in 0..200 {
                if (row + col) % 2 == 0 {
                    frame.set_pixel(row, col, [255, 255, 255]);
                }
            }
        }
        let detections = JsonDetections::from_json(
            r#"{"faces": [{"origin_x": 20, "origin_y": 28, "width": 60, "height": 60}]}"#,
            EyeCornerIndices::default(),
        )
        .unwrap();
        let mut uc = AnonymizeImageUseCase::new(
            Box::new(MemoryImageReader::new()),
            Box::new(MemoryImageWriter::default()),
            AnonymizationStrategy::face_blur(Box::new(detections), Box::new(FaceBoxBlurrer::default())),
            Box::new(NullPipelineLogger),
        );

        let out = uc.execute(&upload("grid.png", png_bytes(&frame))).unwrap();
        let result = Frame::from(image::load_from_memory(&out.bytes).unwrap().to_rgb8());

        // Inside the raised box the checkerboard is smoothed to mid-gray.
        let [r, _, _] = result.pixel(50, 50);
        assert!((100..=155).contains(&r));
        // Outside it is untouched.
        assert_eq!(result.pixel(150, 150), frame.pixel(150, 150));
        assert_eq!(result.pixel(150, 151), frame.pixel(150, 151));
    }

    #[test]
    fn test_cover_eyes_end_to_end_with_json_detections() {
        let frame = Frame::filled(1000, 1000, [128, 128, 128]);
        let detections = JsonDetections::from_json(
            r#"{"eyes": [{"left": {"x": 0.3, "y": 0.4}, "right": {"x": 0.6, "y": 0.4}}]}"#,
            EyeCornerIndices::default(),
        )
        .unwrap();
        let mut uc = AnonymizeImageUseCase::new(
            Box::new(MemoryImageReader::new()),
            Box::new(MemoryImageWriter::default()),
            AnonymizationStrategy::cover_eyes(
                Box::new(detections),
                Box::new(RedLineOccluder::default()),
                EyeCornerIndices::default(),
            ),
            Box::new(NullPipelineLogger),
        );
        assert_eq!(uc.mode(), AnonymizationMode::CoverEyes);

        let out = uc.execute(&upload("Humans.png", png_bytes(&frame))).unwrap();
        assert_eq!(out.file_name, "Humans-Cover-Eyes.png");
        let result = Frame::from(image::load_from_memory(&out.bytes).unwrap().to_rgb8());
        assert_eq!(result.pixel(400, 450), [255, 0, 0]);
        assert_eq!(result.pixel(700, 450), [128, 128, 128]);
    }
}
