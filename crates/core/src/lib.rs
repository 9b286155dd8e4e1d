//! Face anonymization for still images.
//!
//! Two pure transforms sit at the center: [`blurring`] Gaussian-blurs face
//! boxes and [`occlusion`] draws a bar across each face's eyes. Detection is
//! injected through the traits in [`detection::domain`]; [`pipeline`] wires a
//! decoded upload, a detector and a transform into a downloadable result.

pub mod blurring {
    pub mod domain {
        pub mod frame_blurrer;
    }
    pub mod infrastructure;
}

pub mod occlusion {
    pub mod domain {
        pub mod eye_line;
        pub mod eye_occluder;
    }
    pub mod infrastructure {
        pub mod red_line_occluder;
    }
}

pub mod detection {
    pub mod domain {
        pub mod eye_landmarks;
        pub mod face_detector;
        pub mod face_landmarker;
        pub mod face_mesh;
    }
    pub mod infrastructure;
}

pub mod io {
    pub mod domain {
        pub mod image_reader;
        pub mod image_writer;
    }
    pub mod infrastructure {
        pub mod memory_image_reader;
        pub mod memory_image_writer;
    }
}

pub mod pipeline {
    pub mod anonymization_strategy;
    pub mod anonymize_image_use_case;
    pub mod pipeline_logger;
}

pub mod shared {
    pub mod anonymization_mode;
    pub mod bounding_box;
    pub mod constants;
    pub mod frame;
    pub mod model_resolver;
    pub mod upload;
}
