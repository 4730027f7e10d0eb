//! Board codec: camera frame to canonical board.
//!
//! The camera looks at the board from the robot's side. Each of the nine
//! cell regions is cropped and handed to a cell classifier; a separate
//! region covering the whole board goes to a validity classifier that
//! rejects frames with a hand or arm in view. Cell reads below the
//! confidence threshold are forced to [`CellValue::Empty`] so an uncertain
//! read never invents a piece, and every cell is written through the 180°
//! transform into the human's orientation.

use super::{Board, CellValue, Position};
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

/// Pixel rectangle in camera coordinates; `right` and `bottom` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_new::new)]
pub struct Region {
    /// First column.
    pub left: usize,
    /// One past the last column.
    pub right: usize,
    /// First row.
    pub top: usize,
    /// One past the last row.
    pub bottom: usize,
}

impl Region {
    /// Width in pixels (zero if inverted).
    pub fn width(&self) -> usize {
        self.right.saturating_sub(self.left)
    }

    /// Height in pixels (zero if inverted).
    pub fn height(&self) -> usize {
        self.bottom.saturating_sub(self.top)
    }

    /// True if the rectangle covers no pixels.
    pub fn is_degenerate(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}..{}, {}..{}]",
            self.left, self.right, self.top, self.bottom
        )
    }
}

/// Errors constructing or slicing a [`Frame`].
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum FrameError {
    /// Pixel buffer length does not match the dimensions.
    #[display("Frame of {width}x{height} needs {expected} pixels, got {actual}")]
    SizeMismatch {
        /// Frame width.
        width: usize,
        /// Frame height.
        height: usize,
        /// `width * height`.
        expected: usize,
        /// Buffer length.
        actual: usize,
    },
    /// Region is empty or reaches outside the frame.
    #[display("Region {region} is outside the {width}x{height} frame")]
    RegionOutOfBounds {
        /// Requested region.
        #[error(not(source))]
        region: Region,
        /// Frame width.
        width: usize,
        /// Frame height.
        height: usize,
    },
}

/// Grayscale camera image, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Frame {
    /// Wraps a pixel buffer.
    pub fn new(width: usize, height: usize, pixels: Vec<u8>) -> Result<Self, FrameError> {
        let expected = width * height;
        if pixels.len() != expected {
            return Err(FrameError::SizeMismatch {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A frame with every pixel set to `fill`.
    pub fn filled(width: usize, height: usize, fill: u8) -> Self {
        Self {
            width,
            height,
            pixels: vec![fill; width * height],
        }
    }

    /// Frame width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Frame height.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw pixels.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Mean intensity, `0.0` for an empty frame.
    pub fn mean(&self) -> f32 {
        if self.pixels.is_empty() {
            return 0.0;
        }
        let sum: u64 = self.pixels.iter().map(|p| u64::from(*p)).sum();
        sum as f32 / self.pixels.len() as f32
    }

    fn check(&self, region: &Region) -> Result<(), FrameError> {
        if region.is_degenerate() || region.right > self.width || region.bottom > self.height {
            return Err(FrameError::RegionOutOfBounds {
                region: *region,
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    /// Copies out the pixels inside `region`.
    pub fn crop(&self, region: &Region) -> Result<Frame, FrameError> {
        self.check(region)?;
        let mut pixels = Vec::with_capacity(region.width() * region.height());
        for y in region.top..region.bottom {
            let start = y * self.width + region.left;
            pixels.extend_from_slice(&self.pixels[start..start + region.width()]);
        }
        Ok(Frame {
            width: region.width(),
            height: region.height(),
            pixels,
        })
    }

    /// Sets every pixel inside `region` to `value`.
    pub fn paint(&mut self, region: &Region, value: u8) -> Result<(), FrameError> {
        self.check(region)?;
        for y in region.top..region.bottom {
            let start = y * self.width + region.left;
            self.pixels[start..start + region.width()].fill(value);
        }
        Ok(())
    }
}

/// Whole-board validity label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Validity {
    /// The board is fully visible and unobstructed.
    Valid,
    /// Something is in the way.
    Invalid,
}

/// One candidate returned by a classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, derive_new::new)]
pub struct Classification<L> {
    /// Predicted label.
    pub label: L,
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
}

/// Classifies a cropped cell image.
///
/// Must return at least one candidate; an empty result breaks the contract.
pub trait CellClassifier: Send + Sync {
    /// Top-k candidates for the cell.
    fn classify_cell(&self, image: &Frame) -> Vec<Classification<CellValue>>;
}

/// Classifies the whole-board region.
pub trait ValidityClassifier: Send + Sync {
    /// Top-k candidates for the board region.
    fn classify_validity(&self, image: &Frame) -> Vec<Classification<Validity>>;
}

/// Errors from [`BoardCodec::decode`]. All of them are fatal.
#[derive(Debug, Clone, PartialEq, Display, Error)]
pub enum CodecError {
    /// A configured region does not fit the frame.
    #[display("Cannot crop frame: {source}")]
    Frame {
        /// Underlying frame error.
        source: FrameError,
    },
    /// A classifier returned nothing.
    #[display("{classifier} classifier returned no candidates")]
    NoCandidates {
        /// Which classifier.
        classifier: &'static str,
    },
    /// A classifier returned a confidence outside `[0, 1]`.
    #[display("{classifier} classifier returned confidence {confidence}")]
    InvalidConfidence {
        /// Which classifier.
        classifier: &'static str,
        /// The offending value.
        confidence: f32,
    },
}

impl From<FrameError> for CodecError {
    fn from(source: FrameError) -> Self {
        CodecError::Frame { source }
    }
}

fn default_cell_threshold() -> f32 {
    0.9
}

fn default_validity_threshold() -> f32 {
    0.65
}

fn default_cell_regions() -> [[Region; 3]; 3] {
    [
        [
            Region::new(120, 270, 180, 290),
            Region::new(270, 420, 180, 290),
            Region::new(420, 550, 180, 290),
        ],
        [
            Region::new(110, 280, 290, 430),
            Region::new(280, 420, 290, 430),
            Region::new(420, 570, 290, 430),
        ],
        [
            Region::new(100, 270, 430, 580),
            Region::new(270, 440, 430, 580),
            Region::new(440, 610, 430, 580),
        ],
    ]
}

fn default_board_region() -> Region {
    Region::new(100, 600, 180, 600)
}

/// Codec thresholds and camera-space layout.
#[derive(Debug, Clone, PartialEq, Getters, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Cell reads below this confidence become empty.
    #[serde(default = "default_cell_threshold")]
    cell_confidence_threshold: f32,

    /// The frame is sane only above this validity confidence.
    #[serde(default = "default_validity_threshold")]
    validity_confidence_threshold: f32,

    /// Cell rectangles indexed `[row][col]` as the camera sees them.
    #[serde(default = "default_cell_regions")]
    cell_regions: [[Region; 3]; 3],

    /// Rectangle handed to the validity classifier.
    #[serde(default = "default_board_region")]
    board_region: Region,
}

impl CodecConfig {
    /// Creates a configuration from explicit values.
    pub fn new(
        cell_confidence_threshold: f32,
        validity_confidence_threshold: f32,
        cell_regions: [[Region; 3]; 3],
        board_region: Region,
    ) -> Self {
        Self {
            cell_confidence_threshold,
            validity_confidence_threshold,
            cell_regions,
            board_region,
        }
    }

    /// Camera-space region for a canonical position.
    pub fn region_for(&self, pos: Position) -> Region {
        let camera = pos.mirrored();
        self.cell_regions[camera.row()][camera.col()]
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self::new(
            default_cell_threshold(),
            default_validity_threshold(),
            default_cell_regions(),
            default_board_region(),
        )
    }
}

/// Result of decoding one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DecodedFrame {
    /// Canonical board after thresholding and mirroring.
    pub board: Board,
    /// True when the frame may be treated as a board read.
    pub sane: bool,
    /// The validity classifier's top candidate.
    pub validity: Classification<Validity>,
}

/// Turns camera frames into canonical boards.
#[derive(Debug, Clone)]
pub struct BoardCodec<C, V> {
    cells: C,
    validity: V,
    config: CodecConfig,
}

impl<C: CellClassifier, V: ValidityClassifier> BoardCodec<C, V> {
    /// Creates a codec over the given classifiers.
    pub fn new(cells: C, validity: V, config: CodecConfig) -> Self {
        Self {
            cells,
            validity,
            config,
        }
    }

    /// The codec's configuration.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Decodes one frame. No retries: a pure per-frame function.
    #[instrument(skip_all, fields(width = frame.width(), height = frame.height()))]
    pub fn decode(&self, frame: &Frame) -> Result<DecodedFrame, CodecError> {
        let mut cells = [CellValue::Empty; 9];

        for (row, regions) in self.config.cell_regions.iter().enumerate() {
            for (col, region) in regions.iter().enumerate() {
                let crop = frame.crop(region)?;
                let top = best("cell", self.cells.classify_cell(&crop))?;
                let value = if top.confidence < self.config.cell_confidence_threshold {
                    CellValue::Empty
                } else {
                    top.label
                };
                cells[(2 - row) * 3 + (2 - col)] = value;
            }
        }

        let crop = frame.crop(&self.config.board_region)?;
        let validity = best("validity", self.validity.classify_validity(&crop))?;
        let sane = validity.label == Validity::Valid
            && validity.confidence > self.config.validity_confidence_threshold;

        let board = Board::from_cells(cells);
        debug!(
            board = %board,
            sane,
            validity = %validity.label,
            confidence = validity.confidence,
            "Board decoded"
        );

        Ok(DecodedFrame {
            board,
            sane,
            validity,
        })
    }
}

/// Highest-confidence candidate, enforcing the classifier contract.
fn best<L: Copy>(
    classifier: &'static str,
    candidates: Vec<Classification<L>>,
) -> Result<Classification<L>, CodecError> {
    let mut top: Option<Classification<L>> = None;
    for candidate in candidates {
        if !(0.0..=1.0).contains(&candidate.confidence) {
            error!(classifier, confidence = candidate.confidence, "Confidence out of range");
            return Err(CodecError::InvalidConfidence {
                classifier,
                confidence: candidate.confidence,
            });
        }
        if top.is_none_or(|t| candidate.confidence > t.confidence) {
            top = Some(candidate);
        }
    }
    top.ok_or_else(|| {
        error!(classifier, "Classifier returned no candidates");
        CodecError::NoCandidates { classifier }
    })
}
