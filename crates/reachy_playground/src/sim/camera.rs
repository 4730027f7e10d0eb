//! Simulated camera and the intensity classifiers that read its frames.

use super::SharedWorld;
use async_trait::async_trait;
use reachy_tictactoe::{
    Board, Camera, CellClassifier, CellValue, Classification, CodecConfig, CollaboratorError,
    Frame, FrameError, Position, Region, Validity, ValidityClassifier,
};
use tracing::trace;

const BACKGROUND: u8 = 20;
const HAND: u8 = 255;

/// Painted intensity for each cell value.
fn intensity(value: CellValue) -> u8 {
    match value {
        CellValue::Empty => 40,
        CellValue::Robot => 110,
        CellValue::Human => 200,
    }
}

/// Renders `board` as the robot's camera sees it.
///
/// Each canonical cell is painted into the camera region of its mirrored
/// position. With `hand` set, a bright stripe covers the middle of the
/// board region.
pub fn render(board: &Board, hand: bool, config: &CodecConfig) -> Result<Frame, FrameError> {
    let regions = config
        .cell_regions()
        .iter()
        .flatten()
        .chain(std::iter::once(config.board_region()));
    let width = regions.clone().map(|r| r.right).max().unwrap_or(0).max(640);
    let height = regions.map(|r| r.bottom).max().unwrap_or(0).max(640);

    let mut frame = Frame::filled(width, height, BACKGROUND);
    for position in Position::ALL {
        frame.paint(&config.region_for(position), intensity(board.get(position)))?;
    }
    if hand {
        frame.paint(&hand_stripe(config.board_region()), HAND)?;
    }
    Ok(frame)
}

fn hand_stripe(board: &Region) -> Region {
    let third = board.height() / 3;
    let stripe = Region::new(
        board.left,
        board.right,
        board.top + third,
        board.bottom - third,
    );
    if stripe.is_degenerate() { *board } else { stripe }
}

/// Camera looking at the shared world.
pub struct SimCamera {
    world: SharedWorld,
    config: CodecConfig,
}

impl SimCamera {
    /// Creates a camera that renders with `config`'s regions.
    pub fn new(world: SharedWorld, config: CodecConfig) -> Self {
        Self { world, config }
    }
}

#[async_trait]
impl Camera for SimCamera {
    async fn capture(&mut self) -> Result<Frame, CollaboratorError> {
        let mut world = self.world.lock();
        world.frames += 1;
        let hand = world.step_human();
        trace!(frame = world.frames, hand, board = %world.board, "Capture");
        render(&world.board, hand, &self.config)
            .map_err(|e| CollaboratorError::new(format!("Cannot render frame: {}", e)))
    }
}

/// Labels a cell crop by its mean intensity.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntensityCells;

impl CellClassifier for IntensityCells {
    fn classify_cell(&self, image: &Frame) -> Vec<Classification<CellValue>> {
        let mean = image.mean();
        let mut candidates: Vec<_> = [CellValue::Empty, CellValue::Robot, CellValue::Human]
            .into_iter()
            .map(|label| {
                let distance = (mean - f32::from(intensity(label))).abs();
                Classification::new(label, (1.0 - distance / 90.0).clamp(0.0, 1.0))
            })
            .collect();
        candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        candidates
    }
}

/// Reports a frame invalid when any hand pixels are visible.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntensityValidity;

impl ValidityClassifier for IntensityValidity {
    fn classify_validity(&self, image: &Frame) -> Vec<Classification<Validity>> {
        let pixels = image.pixels();
        let hand = pixels.iter().filter(|p| **p == HAND).count();
        let covered = hand as f32 / pixels.len().max(1) as f32;
        if covered > 0.01 {
            vec![
                Classification::new(Validity::Invalid, 0.97),
                Classification::new(Validity::Valid, 0.03),
            ]
        } else {
            vec![
                Classification::new(Validity::Valid, 0.97),
                Classification::new(Validity::Invalid, 0.03),
            ]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reachy_tictactoe::BoardCodec;

    fn codec() -> BoardCodec<IntensityCells, IntensityValidity> {
        BoardCodec::new(IntensityCells, IntensityValidity, CodecConfig::default())
    }

    #[test]
    fn test_rendered_board_decodes_to_itself() {
        let board: Board = "HR./.H./..R".parse().unwrap();
        let frame = render(&board, false, &CodecConfig::default()).unwrap();
        let decoded = codec().decode(&frame).unwrap();
        assert!(decoded.sane);
        assert_eq!(decoded.board, board);
    }

    #[test]
    fn test_hand_makes_frame_insane() {
        let frame = render(&Board::EMPTY, true, &CodecConfig::default()).unwrap();
        assert!(!codec().decode(&frame).unwrap().sane);
    }

    #[test]
    fn test_pieces_land_in_mirrored_camera_regions() {
        let config = CodecConfig::default();
        let board: Board = "..H/.../...".parse().unwrap();
        let frame = render(&board, false, &config).unwrap();
        // The human's far-right cell is the robot's near-left region.
        let near_left = frame.crop(&config.cell_regions()[2][0]).unwrap();
        assert_eq!(near_left.mean(), f32::from(intensity(CellValue::Human)));
    }
}
