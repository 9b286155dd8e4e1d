use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// The two anonymization strategies a user can pick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnonymizationMode {
    FaceBlur,
    CoverEyes,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown anonymization mode '{0}' (expected 'face-blur' or 'cover-eyes')")]
pub struct ModeParseError(pub String);

impl AnonymizationMode {
    pub const ALL: [AnonymizationMode; 2] = [AnonymizationMode::FaceBlur, AnonymizationMode::CoverEyes];

    /// Display label, also used in download file names.
    pub fn label(self) -> &'static str {
        match self {
            AnonymizationMode::FaceBlur => "Face-Blur",
            AnonymizationMode::CoverEyes => "Cover-Eyes",
        }
    }
}

impl fmt::Display for AnonymizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AnonymizationMode {
    type Err = ModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnonymizationMode::ALL
            .into_iter()
            .find(|m| m.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ModeParseError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("face-blur", AnonymizationMode::FaceBlur)]
    #[case("Face-Blur", AnonymizationMode::FaceBlur)]
    #[case("cover-eyes", AnonymizationMode::CoverEyes)]
    #[case("COVER-EYES", AnonymizationMode::CoverEyes)]
    #[case(" Cover-Eyes ", AnonymizationMode::CoverEyes)]
    fn test_parse(#[case] text: &str, #[case] expected: AnonymizationMode) {
        assert_eq!(text.parse::<AnonymizationMode>().unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("blur")]
    #[case("Face Blur")]
    #[case("face_blur")]
    fn test_parse_unknown_is_error(#[case] text: &str) {
        let err = text.parse::<AnonymizationMode>().unwrap_err();
        assert_eq!(err, ModeParseError(text.to_string()));
    }

    #[test]
    fn test_label_round_trips() {
        for mode in AnonymizationMode::ALL {
            assert_eq!(mode.to_string().parse::<AnonymizationMode>().unwrap(), mode);
        }
    }
}
