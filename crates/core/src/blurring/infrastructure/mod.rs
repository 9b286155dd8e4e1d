pub mod face_box_blurrer;
mod gaussian;
